//! INI file configuration adapter.

use crate::domain::error::ChartError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ChartError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ChartError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ChartError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ChartError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[instrument]
id = 42
company_name = Acme Industries

[chart]
timeframe = 15
chart_type = line
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("instrument", "company_name"),
            Some("Acme Industries".to_string())
        );
        assert_eq!(adapter.get_string("chart", "chart_type"), Some("line".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[chart]\ntimeframe = 60\n").unwrap();
        assert_eq!(adapter.get_string("chart", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nma_period = 50\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "ma_period", 0), 50);
    }

    #[test]
    fn get_int_reads_negative_offset() {
        let adapter =
            FileConfigAdapter::from_string("[chart]\nutc_offset_seconds = -18000\n").unwrap();
        assert_eq!(adapter.get_int("chart", "utc_offset_seconds", 0), -18000);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[indicators]\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "rsi_period", 14), 14);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nrsi_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "rsi_period", 14), 14);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nbollinger_multiplier = 2.5\n").unwrap();
        assert_eq!(adapter.get_double("indicators", "bollinger_multiplier", 0.0), 2.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nbollinger_multiplier = wide\n").unwrap();
        assert_eq!(adapter.get_double("indicators", "bollinger_multiplier", 2.0), 2.0);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let content = "[indicators]\nma = true\nrsi = yes\nmacd = 1\n";
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert!(adapter.get_bool("indicators", "ma", false));
        assert!(adapter.get_bool("indicators", "rsi", false));
        assert!(adapter.get_bool("indicators", "macd", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[chart]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("chart", "a", true));
        assert!(!adapter.get_bool("chart", "b", true));
        assert!(!adapter.get_bool("chart", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[chart]\n").unwrap();
        assert!(adapter.get_bool("chart", "show_volume", true));
        assert!(!adapter.get_bool("indicators", "ma", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\ndir = /var/candles\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("/var/candles".to_string()));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(ChartError::ConfigParse { file, .. }) => {
                assert_eq!(file, "/nonexistent/path/config.ini")
            }
            _ => panic!("expected ConfigParse error"),
        }
    }
}
