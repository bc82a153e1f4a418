use serde::Deserialize;
use std::{fs, path::Path};

pub const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tcp_socket_binding: String,
    pub tcp_socket_port: u16,
    pub database_path: String,
    pub static_dir: String,
    pub jwt_secret: String,
    pub jwt_expiration_in_minutes: u64,
    /// No save file, sample data, any credentials accepted.
    pub dev_mode: bool,
    pub default_admin_username: String,
    pub default_admin_email: String,
    pub default_admin_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tcp_socket_binding: "0.0.0.0".into(),
            tcp_socket_port: 5000,
            database_path: "taskwise.redb".into(),
            static_dir: "static".into(),
            jwt_secret: "change-me-in-production".into(),
            jwt_expiration_in_minutes: 60 * 24,
            dev_mode: false,
            default_admin_username: "admin".into(),
            default_admin_email: "admin@example.com".into(),
            default_admin_password: "admin".into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse JSON content from file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },
}

impl Settings {
    /// `settings.json` from the working directory (defaults if absent),
    /// then environment overrides.
    pub fn load() -> Result<Settings, ConfigError> {
        let mut settings = if Path::new(SETTINGS_FILENAME).exists() {
            Settings::load_from(SETTINGS_FILENAME)?
        } else {
            tracing::warn!("{SETTINGS_FILENAME} not found, using defaults");
            Settings::default()
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Overlay values from `lookup` (the process environment in production).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("TASKWISE_BIND") {
            self.tcp_socket_binding = bind;
        }
        if let Some(port) = lookup("TASKWISE_PORT") {
            self.tcp_socket_port = port.parse().map_err(|_| ConfigError::Env {
                key: "TASKWISE_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = path;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            self.static_dir = dir;
        }
        if let Some(flag) = lookup("SKIP_DB") {
            self.dev_mode = matches!(flag.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let path = format!("/tmp/taskwise_settings_{}.json", std::process::id());
        fs::write(&path, r#"{ "tcp_socket_port": 8080, "dev_mode": true }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.tcp_socket_port, 8080);
        assert!(settings.dev_mode);
        assert_eq!(settings.database_path, "taskwise.redb");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Settings::load_from("/tmp/definitely_not_here_taskwise.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TASKWISE_PORT", "9001"),
            ("DATABASE_PATH", "/var/lib/taskwise.redb"),
            ("SKIP_DB", "1"),
            ("JWT_SECRET", "s3cret"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.tcp_socket_port, 9001);
        assert_eq!(settings.database_path, "/var/lib/taskwise.redb");
        assert_eq!(settings.jwt_secret, "s3cret");
        assert!(settings.dev_mode);
        assert_eq!(settings.tcp_socket_binding, "0.0.0.0");
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(|key| (key == "TASKWISE_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "TASKWISE_PORT", .. }));
    }
}
