//! Domain error types.

/// Top-level error type for candletrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("market data transport error: {reason}")]
    Transport { reason: String },

    #[error("invalid kline for {symbol}: {reason}")]
    InvalidKline { symbol: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    /// Errors that only cost the current symbol its cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TraderError::Transport { .. } | TraderError::InvalidKline { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. }
            | TraderError::UnknownStrategy { .. } => 2,
            TraderError::Database { .. } | TraderError::DatabaseQuery { .. } => 3,
            TraderError::Transport { .. } | TraderError::InvalidKline { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_transient() {
        let err = TraderError::Transport {
            reason: "connection reset".into(),
        };
        assert!(err.is_transient());
        assert_eq!(
            err.to_string(),
            "market data transport error: connection reset"
        );
    }

    #[test]
    fn database_is_not_transient() {
        let err = TraderError::Database {
            reason: "locked".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn config_missing_message() {
        let err = TraderError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [sqlite] path");
    }
}
