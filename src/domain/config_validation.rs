//! Configuration validation.
//!
//! Validates every chart and indicator value before a session is built.

use crate::domain::controls::{ChartType, Timeframe};
use crate::domain::error::ChartError;
use crate::domain::normalizer::DEFAULT_UTC_OFFSET_SECONDS;
use crate::ports::config_port::ConfigPort;

/// Largest display offset accepted, in seconds (UTC±14:00).
pub const MAX_UTC_OFFSET_SECONDS: i64 = 14 * 3600;

pub fn validate_chart_config(config: &dyn ConfigPort) -> Result<(), ChartError> {
    validate_timeframe(config)?;
    validate_chart_type(config)?;
    validate_dimensions(config)?;
    validate_utc_offset(config)?;
    validate_indicator_config(config)?;
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), ChartError> {
    for key in ["ma_period", "bollinger_period", "rsi_period", "macd_fast", "macd_slow", "macd_signal"] {
        require_positive_int(config, "indicators", key)?;
    }
    validate_bollinger_multiplier(config)?;
    validate_macd_periods(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ChartError {
    ChartError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), ChartError> {
    match config.get_string("chart", "timeframe") {
        None => Ok(()),
        Some(value) => Timeframe::parse_custom(&value)
            .map(|_| ())
            .map_err(|_| invalid("chart", "timeframe", "timeframe must be a positive integer")),
    }
}

fn validate_chart_type(config: &dyn ConfigPort) -> Result<(), ChartError> {
    match config.get_string("chart", "chart_type") {
        None => Ok(()),
        Some(value) => value
            .parse::<ChartType>()
            .map(|_| ())
            .map_err(|reason| invalid("chart", "chart_type", reason)),
    }
}

fn validate_dimensions(config: &dyn ConfigPort) -> Result<(), ChartError> {
    for key in ["width", "viewport_height"] {
        let value = read_int(config, "chart", key)?.unwrap_or(1);
        if value <= 0 || value > i64::from(u32::MAX) {
            return Err(invalid("chart", key, format!("{} must be a positive pixel count", key)));
        }
    }
    Ok(())
}

fn validate_utc_offset(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let value = read_int(config, "chart", "utc_offset_seconds")?
        .unwrap_or(i64::from(DEFAULT_UTC_OFFSET_SECONDS));
    if value.abs() > MAX_UTC_OFFSET_SECONDS {
        return Err(invalid(
            "chart",
            "utc_offset_seconds",
            "utc_offset_seconds must be within ±14 hours",
        ));
    }
    Ok(())
}

/// Integer under `key`, `None` when absent. A value that is present but not
/// an integer is rejected rather than replaced by a default.
fn read_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, ChartError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{}' is not an integer", raw.trim()))),
    }
}

fn require_positive_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ChartError> {
    let value = read_int(config, section, key)?.unwrap_or(1);
    if value <= 0 || value > i64::from(u32::MAX) {
        return Err(invalid(section, key, format!("{} must be a positive integer", key)));
    }
    Ok(())
}

/// Bollinger multiplier in hundredths, the form carried by the indicator
/// key. `None` unless the multiplier is a positive whole number of
/// hundredths.
pub fn bollinger_mult_x100(multiplier: f64) -> Option<u32> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return None;
    }
    let scaled = multiplier * 100.0;
    let rounded = scaled.round();
    if rounded < 1.0 || rounded > f64::from(u32::MAX) || (scaled - rounded).abs() > 1e-6 {
        return None;
    }
    Some(rounded as u32)
}

fn validate_bollinger_multiplier(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let key = "bollinger_multiplier";
    let Some(raw) = config.get_string("indicators", key) else {
        return Ok(());
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("indicators", key, format!("'{}' is not a number", raw.trim())))?;
    if bollinger_mult_x100(value).is_none() {
        return Err(invalid(
            "indicators",
            key,
            "bollinger_multiplier must be a positive multiple of 0.01",
        ));
    }
    Ok(())
}

fn validate_macd_periods(config: &dyn ConfigPort) -> Result<(), ChartError> {
    let fast = config.get_int("indicators", "macd_fast", 12);
    let slow = config.get_int("indicators", "macd_slow", 26);
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }
    Ok(())
}
