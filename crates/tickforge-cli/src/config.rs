//! Application configuration.
//!
//! Credentials and paths come from an external TOML file; each section is
//! an explicit struct handed to the component that needs it. The API key
//! can be overridden with `TICKFORGE_API_KEY` so the file can stay
//! key-free in checkouts.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use tickforge_core::QuoteApiClient;
use tickforge_warehouse::{WarehouseConfig, DEFAULT_BATCH_SIZE};

pub const DEFAULT_CONFIG_FILE: &str = "tickforge.toml";
const API_KEY_ENV: &str = "TICKFORGE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Unparsable {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk configuration shape. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api: ApiSection,
    warehouse: WarehouseSection,
    loader: LoaderSection,
}

/// Quote API endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
    pub base_url: String,
    pub api_key: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: String::from(QuoteApiClient::DEFAULT_BASE_URL),
            api_key: String::from("demo"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WarehouseSection {
    db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoaderSection {
    batch_size: usize,
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Resolved runtime configuration handed to the pipeline components.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiSection,
    pub warehouse: WarehouseConfig,
    pub batch_size: usize,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `--config` path must exist; the default path is used
    /// only when present. `TICKFORGE_API_KEY` overrides the file's key.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => read_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    read_file(default)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Ok(Self::from_file(file))
    }

    fn from_file(file: FileConfig) -> Self {
        let mut api = file.api;
        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.is_empty() {
                api.api_key = key;
            }
        }

        let mut warehouse = WarehouseConfig::default();
        if let Some(db_path) = file.warehouse.db_path {
            warehouse.db_path = db_path;
        }

        Self {
            api,
            warehouse,
            batch_size: file.loader.batch_size,
        }
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Unparsable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tickforge.toml");
        let mut file = fs::File::create(&path).expect("create config");
        write!(
            file,
            r#"
[api]
base_url = "https://quotes.example.test/query"
api_key = "file-key"

[warehouse]
db_path = "/tmp/tickforge-test/warehouse.duckdb"

[loader]
batch_size = 25
"#
        )
        .expect("write config");

        let config = AppConfig::load(Some(path.as_path())).expect("load config");
        assert_eq!(config.api.base_url, "https://quotes.example.test/query");
        assert_eq!(config.batch_size, 25);
        assert_eq!(
            config.warehouse.db_path,
            PathBuf::from("/tmp/tickforge-test/warehouse.duckdb")
        );
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/tickforge.toml")))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn sections_default_when_absent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tickforge.toml");
        fs::write(&path, "[loader]\nbatch_size = 7\n").expect("write config");

        let config = AppConfig::load(Some(path.as_path())).expect("load config");
        assert_eq!(config.api.base_url, QuoteApiClient::DEFAULT_BASE_URL);
        assert_eq!(config.batch_size, 7);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tickforge.toml");
        fs::write(&path, "[api]\napi_keey = \"oops\"\n").expect("write config");

        let err = AppConfig::load(Some(path.as_path())).expect_err("must fail");
        assert!(matches!(err, ConfigError::Unparsable { .. }));
    }
}
