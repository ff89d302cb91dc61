//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP types here. Adapters map wire payloads into these.

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which save endpoint receives the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// On-campus report.
    Inner,
    /// Off-campus report.
    Outer,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Inner => write!(f, "inner"),
            ReportType::Outer => write!(f, "outer"),
        }
    }
}

/// Push settings as written in the config file. Both fields must be set for a push to happen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeConfig {
    #[serde(default)]
    pub notice_type: Option<String>,
    #[serde(default)]
    pub notice_key: Option<String>,
}

/// Supported push gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeProvider {
    Bark,
    ServerChan,
}

impl FromStr for NoticeProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bark" => Ok(NoticeProvider::Bark),
            "serverchan" => Ok(NoticeProvider::ServerChan),
            other => Err(DomainError::Notice(format!(
                "unknown/unsupported notice_type: {}",
                other
            ))),
        }
    }
}

/// One user record as it appears in the config file, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub cookie: Option<String>,
    pub report_type: ReportType,
    #[serde(default)]
    pub notice_info: Option<NoticeConfig>,
}

/// Validated user. Holds either a cookie or a full credential pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "UserEntry")]
pub struct UserConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub cookie: Option<String>,
    pub report_type: ReportType,
    pub notice: Option<NoticeConfig>,
}

impl UserConfig {
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        cookie: Option<String>,
        report_type: ReportType,
        notice: Option<NoticeConfig>,
    ) -> Result<Self, DomainError> {
        let username = non_empty(username);
        let password = non_empty(password);
        let cookie = non_empty(cookie);
        if cookie.is_none() && (username.is_none() || password.is_none()) {
            return Err(DomainError::Config(
                "each user needs either a cookie or both username and password".into(),
            ));
        }
        Ok(Self {
            username,
            password,
            cookie,
            report_type,
            notice,
        })
    }

    /// Credential pair, if both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

impl TryFrom<UserEntry> for UserConfig {
    type Error = DomainError;

    fn try_from(entry: UserEntry) -> Result<Self, Self::Error> {
        UserConfig::new(
            entry.username,
            entry.password,
            entry.cookie,
            entry.report_type,
            entry.notice_info,
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Session cookie for authenticated portal calls. Lives for one run only.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    /// Build a `Cookie` header value from raw `Set-Cookie` header values.
    /// Keeps only the `name=value` part of each. Returns `None` when nothing usable is left.
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .into_iter()
            .filter_map(|h| h.split(';').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(Self(pairs.join("; ")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session(<{} bytes>)", self.0.len())
    }
}

/// Final result of one user's run, as seen by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Success,
    Failure(String),
}

impl ReportOutcome {
    pub const SUCCESS_MESSAGE: &'static str = "打卡成功！";

    pub fn message(&self) -> &str {
        match self {
            ReportOutcome::Success => Self::SUCCESS_MESSAGE,
            ReportOutcome::Failure(msg) => msg,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReportOutcome::Success)
    }
}

/// Per-user pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStage {
    Init,
    Authenticating,
    FetchingForm,
    Submitting,
    Notifying,
    Done,
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStage::Init => "init",
            ReportStage::Authenticating => "authenticating",
            ReportStage::FetchingForm => "fetching_form",
            ReportStage::Submitting => "submitting",
            ReportStage::Notifying => "notifying",
            ReportStage::Done => "done",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_requires_cookie_or_credentials() {
        let err = UserConfig::new(Some("alice".into()), None, None, ReportType::Inner, None);
        assert!(matches!(err, Err(DomainError::Config(_))));

        let err = UserConfig::new(None, None, Some("  ".into()), ReportType::Inner, None);
        assert!(matches!(err, Err(DomainError::Config(_))));

        let ok = UserConfig::new(None, None, Some("eai-sess=abc".into()), ReportType::Outer, None);
        assert!(ok.is_ok());

        let ok = UserConfig::new(
            Some("alice".into()),
            Some("secret".into()),
            None,
            ReportType::Inner,
            None,
        )
        .unwrap();
        assert_eq!(ok.credentials(), Some(("alice", "secret")));
    }

    #[test]
    fn test_user_config_deserialize_validates() {
        let json = r#"{"username": "alice", "password": "", "cookie": null, "report_type": "inner"}"#;
        assert!(serde_json::from_str::<UserConfig>(json).is_err());

        let json = r#"{
            "username": "alice",
            "password": "secret",
            "report_type": "outer",
            "notice_info": {"notice_type": "ServerChan", "notice_key": "SCT123"}
        }"#;
        let user: UserConfig = serde_json::from_str(json).unwrap();
        assert_eq!(user.report_type, ReportType::Outer);
        assert_eq!(
            user.notice.unwrap().notice_type.as_deref(),
            Some("ServerChan")
        );
    }

    #[test]
    fn test_unknown_report_type_rejected() {
        let json = r#"{"cookie": "c=1", "report_type": "abroad"}"#;
        assert!(serde_json::from_str::<UserConfig>(json).is_err());
    }

    #[test]
    fn test_notice_provider_parse() {
        assert_eq!("bark".parse::<NoticeProvider>().unwrap(), NoticeProvider::Bark);
        assert_eq!(
            "ServerChan".parse::<NoticeProvider>().unwrap(),
            NoticeProvider::ServerChan
        );
        assert!("telegram".parse::<NoticeProvider>().is_err());
    }

    #[test]
    fn test_session_from_set_cookie() {
        let session = Session::from_set_cookie([
            "eai-sess=abc123; expires=Thu, 01-Jan-2099 00:00:00 GMT; path=/; HttpOnly",
            "UUkey=xyz; path=/",
        ])
        .unwrap();
        assert_eq!(session.as_str(), "eai-sess=abc123; UUkey=xyz");

        assert!(Session::from_set_cookie(Vec::<&str>::new()).is_none());
        assert!(!format!("{:?}", session).contains("abc123"));
    }

    #[test]
    fn test_outcome_message() {
        assert_eq!(ReportOutcome::Success.message(), "打卡成功！");
        assert_eq!(ReportOutcome::Failure("x".into()).message(), "x");
    }
}
