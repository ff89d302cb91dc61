//! Application configuration. User list, HTTP settings.
//!
//! Read from a config file (JSON by default) with `BUAA_REPORT_*` environment overrides.

use crate::adapters::portal::DEFAULT_PORTAL_BASE_URL;
use crate::domain::{DomainError, UserConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file used when BUAA_REPORT_CONFIG is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Per-request timeout applied to portal and push calls when unset.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Users to check in. Each entry is validated on load.
    pub users: Vec<UserConfig>,

    /// Per-request timeout in seconds. Read from BUAA_REPORT_HTTP_TIMEOUT_SECS.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    /// Portal origin override (e.g. a staging mirror). Read from BUAA_REPORT_PORTAL_BASE_URL.
    #[serde(default)]
    pub portal_base_url: Option<String>,
}

impl AppConfig {
    /// Path of the config file: BUAA_REPORT_CONFIG, else `./config.json`.
    pub fn path() -> PathBuf {
        std::env::var("BUAA_REPORT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load() -> Result<Self, DomainError> {
        dotenv::dotenv().ok();
        Self::load_from(&Self::path())
    }

    /// Load and validate. A missing file or any invalid user is an error.
    pub fn load_from(path: &Path) -> Result<Self, DomainError> {
        if !path.is_file() {
            return Err(DomainError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let c = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("BUAA_REPORT").try_parsing(true))
            .build()
            .map_err(|e| DomainError::Config(format!("read {}: {}", path.display(), e)))?;
        c.try_deserialize()
            .map_err(|e| DomainError::Config(format!("parse {}: {}", path.display(), e)))
    }

    /// Returns the request timeout. Defaults to DEFAULT_HTTP_TIMEOUT_SECS; 0 is treated as unset.
    pub fn http_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    /// Returns the portal origin. Defaults to https://app.buaa.edu.cn.
    pub fn portal_base_url_or_default(&self) -> String {
        self.portal_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PORTAL_BASE_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportType;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "buaa-report-{}-{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_users() {
        let path = write_temp(
            "ok",
            r#"{
                "users": [
                    {"username": "alice", "password": "pw", "cookie": null, "report_type": "inner",
                     "notice_info": {"notice_type": "bark", "notice_key": "KEY"}},
                    {"cookie": "eai-sess=abc", "report_type": "outer"}
                ],
                "http_timeout_secs": 10
            }"#,
        );
        let cfg = AppConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.users.len(), 2);
        assert_eq!(cfg.users[0].username.as_deref(), Some("alice"));
        assert_eq!(cfg.users[1].report_type, ReportType::Outer);
        assert_eq!(cfg.users[1].cookie.as_deref(), Some("eai-sess=abc"));
        assert_eq!(cfg.http_timeout_or_default(), Duration::from_secs(10));
        assert_eq!(cfg.portal_base_url_or_default(), "https://app.buaa.edu.cn");
    }

    #[test]
    fn test_user_without_credentials_is_fatal() {
        let path = write_temp(
            "nocreds",
            r#"{"users": [{"username": "alice", "report_type": "inner"}]}"#,
        );
        let err = AppConfig::load_from(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let path = std::env::temp_dir().join("buaa-report-does-not-exist.json");
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let path = write_temp("broken", "{\"users\": [");
        let err = AppConfig::load_from(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DomainError::Config(_)));
    }
}
