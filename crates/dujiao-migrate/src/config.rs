//! Configuration for dujiao-migrate.
//!
//! A YAML file describes the legacy database, the new admin API and the
//! migration options; every field can also be supplied (or overridden) on
//! the command line.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main migration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Legacy database coordinates.
    #[serde(default)]
    pub old_db: DbConfig,
    /// New admin API coordinates.
    #[serde(default)]
    pub new_api: ApiConfig,
    /// Migration options.
    #[serde(default)]
    pub options: Options,
}

/// Legacy database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Database driver: `mysql`, `postgres` or `sqlite`.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Server host (ignored for sqlite).
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (ignored for sqlite).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username (ignored for sqlite).
    #[serde(default = "default_user")]
    pub user: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Database name, or the file path for sqlite.
    #[serde(default = "default_database")]
    pub database: String,
    /// Connection charset (mysql only).
    #[serde(default = "default_charset")]
    pub charset: String,
    /// SSL mode (postgres only): disable, require, verify-ca, verify-full.
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            charset: default_charset(),
            ssl_mode: default_ssl_mode(),
        }
    }
}

/// New admin API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the admin API, e.g. `http://127.0.0.1:8080/api/v1/admin`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Admin username.
    #[serde(default = "default_api_user")]
    pub username: String,
    /// Admin password.
    #[serde(default)]
    pub password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: default_api_user(),
            password: String::new(),
        }
    }
}

/// Migration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Attempts per remote call (the initial try included).
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,
    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    /// Skip entities whose slug already exists on the new side.
    #[serde(default = "default_true")]
    pub skip_existing: bool,
    /// Migrate card secrets after products.
    #[serde(default = "default_true")]
    pub migrate_cards: bool,
    /// Only migrate enabled rows.
    #[serde(default = "default_true")]
    pub only_active: bool,
    /// Card secrets per import batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Legacy site root on disk, for image relocation. Empty disables it.
    #[serde(default)]
    pub old_site_path: String,
    /// Price currency applied to every product.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            retry_times: default_retry_times(),
            retry_delay: default_retry_delay(),
            skip_existing: true,
            migrate_cards: true,
            only_active: true,
            batch_size: default_batch_size(),
            old_site_path: String::new(),
            currency: default_currency(),
        }
    }
}

fn default_driver() -> String {
    "mysql".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "dujiaoka".to_string()
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/api/v1/admin".to_string()
}

fn default_api_user() -> String {
    "admin".to_string()
}

fn default_retry_times() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1
}

fn default_batch_size() -> usize {
    500
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "CNY".to_string()
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Legacy database host.
    pub old_host: Option<String>,
    /// Legacy database port.
    pub old_port: Option<u16>,
    /// Legacy database user.
    pub old_user: Option<String>,
    /// Legacy database password.
    pub old_password: Option<String>,
    /// Legacy database name (file path for sqlite).
    pub old_database: Option<String>,
    /// Legacy database driver.
    pub old_driver: Option<String>,
    /// New API base URL.
    pub new_api: Option<String>,
    /// New API admin username.
    pub new_user: Option<String>,
    /// New API admin password.
    pub new_password: Option<String>,
    /// Disable skip-existing.
    pub no_skip: bool,
    /// Disable card-secret migration.
    pub no_cards: bool,
    /// Legacy site root for image relocation.
    pub old_site_path: Option<String>,
    /// Card batch size.
    pub batch_size: Option<usize>,
}

impl Config {
    /// Loads configuration from an optional YAML file, then applies
    /// command-line overrides field by field.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                serde_yaml::from_str(&content)?
            }
            None => Self::default(),
        };
        cfg.apply_overrides(overrides);
        Ok(cfg)
    }

    fn apply_overrides(&mut self, args: &CliOverrides) {
        if let Some(v) = &args.old_host {
            self.old_db.host = v.clone();
        }
        if let Some(v) = args.old_port {
            self.old_db.port = v;
        }
        if let Some(v) = &args.old_user {
            self.old_db.user = v.clone();
        }
        if let Some(v) = &args.old_password {
            self.old_db.password = v.clone();
        }
        if let Some(v) = &args.old_database {
            self.old_db.database = v.clone();
        }
        if let Some(v) = &args.old_driver {
            self.old_db.driver = v.clone();
        }
        if let Some(v) = &args.new_api {
            self.new_api.base_url = v.clone();
        }
        if let Some(v) = &args.new_user {
            self.new_api.username = v.clone();
        }
        if let Some(v) = &args.new_password {
            self.new_api.password = v.clone();
        }
        if args.no_skip {
            self.options.skip_existing = false;
        }
        if args.no_cards {
            self.options.migrate_cards = false;
        }
        if let Some(v) = &args.old_site_path {
            self.options.old_site_path = v.clone();
        }
        if let Some(v) = args.batch_size {
            self.options.batch_size = v;
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        match self.old_db.driver.as_str() {
            "mysql" | "postgres" | "sqlite" => {}
            other => {
                return Err(Error::Config(format!(
                    "unsupported database driver '{other}' (expected mysql, postgres or sqlite)"
                )));
            }
        }
        if self.old_db.database.is_empty() {
            return Err(Error::Config("database name cannot be empty".to_string()));
        }
        if !self.new_api.base_url.starts_with("http://")
            && !self.new_api.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "invalid API base URL: {}",
                self.new_api.base_url
            )));
        }
        if self.options.batch_size == 0 {
            return Err(Error::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.old_db.driver, "mysql");
        assert_eq!(cfg.old_db.port, 3306);
        assert_eq!(cfg.options.retry_times, 3);
        assert_eq!(cfg.options.batch_size, 500);
        assert!(cfg.options.skip_existing);
        assert!(cfg.options.migrate_cards);
        assert_eq!(cfg.options.currency, "CNY");
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r#"
old_db:
  driver: sqlite
  database: /data/dujiaoka.db
new_api:
  base_url: http://10.0.0.2:8080/api/v1/admin
  username: admin
  password: secret
options:
  batch_size: 200
  migrate_cards: false
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.old_db.driver, "sqlite");
        assert_eq!(cfg.old_db.database, "/data/dujiaoka.db");
        assert_eq!(cfg.options.batch_size, 200);
        assert!(!cfg.options.migrate_cards);
        // Unset fields keep their defaults.
        assert!(cfg.options.only_active);
        assert_eq!(cfg.options.retry_delay, 1);
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = CliOverrides {
            old_driver: Some("postgres".to_string()),
            old_port: Some(5432),
            new_api: Some("http://example.com/api".to_string()),
            no_skip: true,
            no_cards: true,
            batch_size: Some(100),
            ..Default::default()
        };
        let cfg = Config::load(None, &overrides).unwrap();
        assert_eq!(cfg.old_db.driver, "postgres");
        assert_eq!(cfg.old_db.port, 5432);
        assert_eq!(cfg.new_api.base_url, "http://example.com/api");
        assert!(!cfg.options.skip_existing);
        assert!(!cfg.options.migrate_cards);
        assert_eq!(cfg.options.batch_size, 100);
    }

    #[test]
    fn test_validate_rejects_unknown_driver() {
        let mut cfg = Config::default();
        cfg.old_db.driver = "oracle".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut cfg = Config::default();
        cfg.new_api.base_url = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut cfg = Config::default();
        cfg.options.batch_size = 0;
        assert!(cfg.validate().is_err());
    }
}
