//! HTTP adapter for the check-in portal. Implements PortalGateway with reqwest.
//!
//! The portal answers with `{"e": <code>, "m": <message>, "d": <payload>}` and does not
//! always label its JSON with the right content type, so bodies are read as text first.

use crate::domain::{DomainError, FormRecord, PriorForms, ReportType, Session};
use crate::ports::PortalGateway;
use reqwest::header::{ACCEPT, COOKIE, REFERER, SET_COOKIE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_PORTAL_BASE_URL: &str = "https://app.buaa.edu.cn";

const LOGIN_PATH: &str = "/uc/wap/login/check";
const GET_INFO_PATH: &str = "/buaaxsncov/wap/default/get-info";
const INNER_SAVE_PATH: &str = "/buaaxsncov/wap/default/save";
const OUTER_SAVE_PATH: &str = "/ncov/wap/default/save";

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1";
const PORTAL_REFERER: &str = "https://app.buaa.edu.cn/site/buaaStudentNcov/index";
const JSON_ACCEPT: &str = "application/json, text/plain, */*";

/// Save endpoint path for a report type.
pub fn save_path(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::Inner => INNER_SAVE_PATH,
        ReportType::Outer => OUTER_SAVE_PATH,
    }
}

/// reqwest-backed portal client. One instance is shared by all user tasks.
pub struct HttpPortal {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPortal {
    /// Create a portal client.
    ///
    /// # Arguments
    /// * `base_url` - Portal origin without trailing slash (e.g. "https://app.buaa.edu.cn")
    /// * `timeout` - Per-request timeout applied to every call
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        builder
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .header(ACCEPT, JSON_ACCEPT)
            .header(REFERER, PORTAL_REFERER)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(COOKIE, session.as_str())
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, DomainError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DomainError::Transport(format!("{}: read body: {}", what, e)))?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(
                %status,
                body = %text.chars().take(200).collect::<String>(),
                "{} returned non-JSON body", what
            );
            DomainError::Parse(format!("{}: {}", what, e))
        })
    }
}

/// Login / save reply.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    e: i64,
    #[serde(default)]
    m: Option<String>,
}

impl StatusResponse {
    fn message(&self) -> String {
        self.m
            .clone()
            .unwrap_or_else(|| format!("unknown error (e={})", self.e))
    }
}

/// get-info reply. `d` holds the forms on success and the reason on failure.
#[derive(Debug, Deserialize)]
struct InfoResponse {
    e: i64,
    #[serde(default)]
    m: Option<String>,
    #[serde(default)]
    d: Option<InfoPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InfoPayload {
    Forms(InfoData),
    Message(String),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct InfoData {
    #[serde(rename = "oldInfo", default, deserialize_with = "record_or_none")]
    old_info: Option<FormRecord>,
    #[serde(default, deserialize_with = "record_or_none")]
    info: Option<FormRecord>,
}

/// Accepts an object; anything else (null, `[]`, `{}`) means no record.
fn record_or_none<'de, D>(deserializer: D) -> Result<Option<FormRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) if !map.is_empty() => Some(FormRecord::new(map)),
        _ => None,
    })
}

impl InfoResponse {
    fn into_prior_forms(self) -> Result<PriorForms, DomainError> {
        if self.e != 0 {
            let reason = match (self.d, self.m) {
                (Some(InfoPayload::Message(d)), _) => d,
                (_, Some(m)) => m,
                _ => format!("unknown error (e={})", self.e),
            };
            return Err(DomainError::Portal(reason));
        }
        match self.d {
            Some(InfoPayload::Forms(data)) => Ok(PriorForms {
                old_info: data.old_info,
                info: data.info,
            }),
            Some(InfoPayload::Other(v)) => {
                debug!(payload = %v, "get-info carried no form object");
                Ok(PriorForms::default())
            }
            Some(InfoPayload::Message(m)) => {
                debug!(message = %m, "get-info carried no form object");
                Ok(PriorForms::default())
            }
            None => Ok(PriorForms::default()),
        }
    }
}

#[async_trait::async_trait]
impl PortalGateway for HttpPortal {
    async fn login(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        debug!(username, "POST {}", LOGIN_PATH);
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("login request failed: {}", e)))?;

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let body: StatusResponse = Self::read_json(response, "login").await?;
        if body.e != 0 {
            return Err(DomainError::Auth(body.message()));
        }
        Session::from_set_cookie(set_cookies.iter().map(String::as_str))
            .ok_or_else(|| DomainError::Auth("login succeeded but no Set-Cookie was returned".into()))
    }

    async fn fetch_prior_forms(&self, session: &Session) -> Result<PriorForms, DomainError> {
        debug!("GET {}", GET_INFO_PATH);
        let response = self
            .authed(self.client.get(self.url(GET_INFO_PATH)), session)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("get-info request failed: {}", e)))?;

        let body: InfoResponse = Self::read_json(response, "get-info").await?;
        body.into_prior_forms()
    }

    async fn save_form(
        &self,
        session: &Session,
        report_type: ReportType,
        form: &FormRecord,
    ) -> Result<(), DomainError> {
        let path = save_path(report_type);
        debug!(%report_type, fields = form.len(), "POST {}", path);
        let response = self
            .authed(self.client.post(self.url(path)), session)
            .header("Accept-Language", "zh-cn")
            .form(&form.to_form_pairs())
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("save request failed: {}", e)))?;

        let body: StatusResponse = Self::read_json(response, "save").await?;
        if body.e != 0 {
            return Err(DomainError::Submission(body.message()));
        }
        Ok(())
    }
}
