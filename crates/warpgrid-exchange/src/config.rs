//! Exchange configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default bound on the buffered error payload of a non-2xx response (64 KB).
pub const DEFAULT_MAX_ERROR_PAYLOAD_BYTES: usize = 64 * 1024;

/// Tunables for a single exchange.
///
/// Usually loaded from the `[exchange]` table of a TOML file, or built
/// with [`ExchangeConfig::default()`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Upper bound on bytes retained for error-payload parsing. Chunks that
    /// would push the buffer past this bound are discarded and parsing stops.
    pub max_error_payload_bytes: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_error_payload_bytes: DEFAULT_MAX_ERROR_PAYLOAD_BYTES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    exchange: ExchangeConfig,
}

impl ExchangeConfig {
    /// Parse the `[exchange]` table out of a TOML document.
    ///
    /// A document without the table yields the defaults.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.exchange)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn with_max_error_payload_bytes(mut self, limit: usize) -> Self {
        self.max_error_payload_bytes = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExchangeConfig::default();
        assert_eq!(config.max_error_payload_bytes, 64 * 1024);
    }

    #[test]
    fn parse_exchange_table() {
        let config = ExchangeConfig::from_toml_str(
            r#"
[exchange]
max_error_payload_bytes = 1024
"#,
        )
        .unwrap();
        assert_eq!(config.max_error_payload_bytes, 1024);
    }

    #[test]
    fn missing_table_uses_defaults() {
        let config = ExchangeConfig::from_toml_str("[other]\nkey = 1\n").unwrap();
        assert_eq!(config, ExchangeConfig::default());

        let config = ExchangeConfig::from_toml_str("[exchange]\n").unwrap();
        assert_eq!(config, ExchangeConfig::default());
    }

    #[test]
    fn rejects_wrong_type() {
        let err = ExchangeConfig::from_toml_str("[exchange]\nmax_error_payload_bytes = \"big\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange.toml");
        std::fs::write(&path, "[exchange]\nmax_error_payload_bytes = 512\n").unwrap();

        let config = ExchangeConfig::from_file(&path).unwrap();
        assert_eq!(config.max_error_payload_bytes, 512);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ExchangeConfig::from_file(&dir.path().join("nope.toml")).is_err());
    }
}
