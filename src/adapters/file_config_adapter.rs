//! INI file configuration adapter.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TraderError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TraderError::ConfigParse {
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
        self.config.get(section, key).filter(|v| !v.trim().is_empty())
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
[postgres]
connection_string = host=localhost dbname=trader

[market]
source = binance
quote_asset = USDT
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("postgres", "connection_string"),
            Some("host=localhost dbname=trader".to_string())
        );
        assert_eq!(
            adapter.get_string("market", "source"),
            Some("binance".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_or_blank() {
        let adapter =
            FileConfigAdapter::from_string("[market]\nsource = csv\ninterval =\n").unwrap();
        assert_eq!(adapter.get_string("market", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_string("market", "interval"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[sweep]\ninterval_secs = 60\nbad = abc\n").unwrap();
        assert_eq!(adapter.get_int("sweep", "interval_secs", 0), 60);
        assert_eq!(adapter.get_int("sweep", "missing", 42), 42);
        assert_eq!(adapter.get_int("sweep", "bad", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[evaluator]\nstake = 12.5\nbad = not_a_number\n")
                .unwrap();
        assert_eq!(adapter.get_double("evaluator", "stake", 0.0), 12.5);
        assert_eq!(adapter.get_double("evaluator", "missing", 99.9), 99.9);
        assert_eq!(adapter.get_double("evaluator", "bad", 99.9), 99.9);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[logging]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("logging", "a", false));
        assert!(adapter.get_bool("logging", "b", false));
        assert!(adapter.get_bool("logging", "c", false));
        assert!(!adapter.get_bool("logging", "d", true));
        assert!(!adapter.get_bool("logging", "e", true));
        assert!(!adapter.get_bool("logging", "f", true));
        assert!(adapter.get_bool("logging", "missing", true));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter = FileConfigAdapter::from_string(
            "[sweep]\nstrategies = rsi, ema_crossover ,,stochastic\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_list("sweep", "strategies"),
            vec!["rsi", "ema_crossover", "stochastic"]
        );
        assert!(adapter.get_list("sweep", "missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[sqlite]\npath = /var/lib/trader.db\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/trader.db".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TraderError::ConfigParse { .. })));
    }
}
