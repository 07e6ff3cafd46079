use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pricing::models::{ActingUser, UserRole};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database path (default: "./data/lease-quote.db")
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// A sales partner or administrator allowed to call the API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub key: String,
    pub name: String,
    pub role: UserRole,
    /// Partner commission in percent of the hardware value (ignored for admins)
    #[serde(default)]
    pub commission_percentage: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl UserConfig {
    pub fn acting_user(&self) -> ActingUser {
        ActingUser {
            name: self.name.clone(),
            role: self.role,
            commission_percentage: self.commission_percentage,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_database_path() -> String {
    "./data/lease-quote.db".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Load configuration from a TOML file, overridable through `LEASE_QUOTE__*` variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("LEASE_QUOTE").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("Server port must be greater than 0");
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format '{}': expected 'text' or 'json'", other),
    }

    if !cfg.users.iter().any(|u| u.enabled) {
        anyhow::bail!("At least one enabled user must be configured");
    }

    let mut names = std::collections::HashSet::new();
    let mut keys = std::collections::HashSet::new();
    for user in &cfg.users {
        if user.name.is_empty() {
            anyhow::bail!("User name cannot be empty");
        }
        if user.key.is_empty() {
            anyhow::bail!("User '{}': key cannot be empty", user.name);
        }
        if !names.insert(user.name.as_str()) {
            anyhow::bail!("User name '{}' is duplicated", user.name);
        }
        if !keys.insert(user.key.as_str()) {
            anyhow::bail!("User '{}': key is duplicated", user.name);
        }
        if !(0.0..=100.0).contains(&user.commission_percentage) {
            anyhow::bail!(
                "User '{}': commission_percentage must be between 0 and 100",
                user.name
            );
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_config_requires_enabled_user() {
        let mut cfg = create_test_config();
        for user in &mut cfg.users {
            user.enabled = false;
        }

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("At least one enabled user"));
    }

    #[test]
    fn test_validate_unique_user_names() {
        let mut cfg = create_test_config();
        cfg.users.push(UserConfig {
            key: "pk-other".to_string(),
            name: "partner".to_string(),
            role: UserRole::Partner,
            commission_percentage: 0.0,
            enabled: true,
        });

        let result = validate_config(&cfg);
        assert!(result.unwrap_err().to_string().contains("duplicated"));
    }

    #[test]
    fn test_validate_commission_range() {
        let mut cfg = create_test_config();
        cfg.users[1].commission_percentage = 120.0;

        let result = validate_config(&cfg);
        assert!(result.unwrap_err().to_string().contains("commission_percentage"));
    }

    #[test]
    fn test_validate_log_format() {
        let mut cfg = create_test_config();
        cfg.server.log_format = "xml".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_load_config_from_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[[users]]
key = "pk-partner-001"
name = "acme-partner"
role = "Partner"
commission_percentage = 3.0
"#
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.path, "./data/lease-quote.db");
        assert_eq!(cfg.users.len(), 1);
        assert!(cfg.users[0].enabled);
        assert_eq!(cfg.users[0].role, UserRole::Partner);
        assert_eq!(cfg.users[0].acting_user().commission_percentage, 3.0);
    }

    pub(crate) fn create_test_config() -> Config {
        Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            users: vec![
                UserConfig {
                    key: "ak-admin-001".to_string(),
                    name: "admin".to_string(),
                    role: UserRole::Admin,
                    commission_percentage: 0.0,
                    enabled: true,
                },
                UserConfig {
                    key: "pk-partner-001".to_string(),
                    name: "partner".to_string(),
                    role: UserRole::Partner,
                    commission_percentage: 5.0,
                    enabled: true,
                },
            ],
        }
    }
}
