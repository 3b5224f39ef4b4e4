//! Domain error types.

/// Top-level error type for candlescope.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid timeframe {input:?}: {reason}")]
    InvalidTimeframe { input: String, reason: String },

    #[error("candle fetch failed: {reason}")]
    Fetch { reason: String },

    #[error("malformed candle payload: {reason}")]
    Payload { reason: String },

    #[error("no instrument data available")]
    NoInstrument,

    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ChartError> for std::process::ExitCode {
    fn from(err: &ChartError) -> Self {
        let code: u8 = match err {
            ChartError::Io(_) | ChartError::Export { .. } => 1,
            ChartError::ConfigParse { .. }
            | ChartError::ConfigMissing { .. }
            | ChartError::ConfigInvalid { .. } => 2,
            ChartError::InvalidTimeframe { .. } => 3,
            ChartError::Fetch { .. } | ChartError::Payload { .. } => 4,
            ChartError::NoInstrument => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_error_message_quotes_input() {
        let err = ChartError::InvalidTimeframe {
            input: "abc".into(),
            reason: "not a number".into(),
        };
        assert_eq!(err.to_string(), "invalid timeframe \"abc\": not a number");
    }

    #[test]
    fn config_invalid_message() {
        let err = ChartError::ConfigInvalid {
            section: "chart".into(),
            key: "width".into(),
            reason: "width must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [chart] width: width must be positive"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ChartError = io.into();
        assert!(matches!(err, ChartError::Io(_)));
    }
}
