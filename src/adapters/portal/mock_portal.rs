//! In-memory portal for tests. Implements PortalGateway without network calls.
//!
//! Replies are scripted up front; every call is recorded for later assertions.

use crate::adapters::portal::http_portal::save_path;
use crate::domain::{DomainError, FormRecord, PriorForms, ReportType, Session};
use crate::ports::PortalGateway;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// A call received by the mock portal.
#[derive(Debug, Clone, PartialEq)]
pub enum PortalCall {
    Login {
        username: String,
    },
    FetchPriorForms {
        cookie: String,
    },
    SaveForm {
        cookie: String,
        path: &'static str,
        form: FormRecord,
    },
}

/// Scripted portal.
///
/// Defaults: login succeeds with cookie `eai-sess=mock`, no prior forms, save succeeds.
pub struct MockPortal {
    login: Result<String, String>,
    prior: Result<PriorForms, String>,
    save: Result<(), String>,
    delay_ms: u64,
    calls: Mutex<Vec<PortalCall>>,
}

impl MockPortal {
    pub fn new() -> Self {
        Self {
            login: Ok("eai-sess=mock".to_string()),
            prior: Ok(PriorForms::default()),
            save: Ok(()),
            delay_ms: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_login_rejected(mut self, reason: &str) -> Self {
        self.login = Err(reason.to_string());
        self
    }

    pub fn with_prior_forms(mut self, forms: PriorForms) -> Self {
        self.prior = Ok(forms);
        self
    }

    /// get-info answers with a non-zero code and `d = reason`.
    pub fn with_prior_rejected(mut self, reason: &str) -> Self {
        self.prior = Err(reason.to_string());
        self
    }

    pub fn with_save_rejected(mut self, reason: &str) -> Self {
        self.save = Err(reason.to_string());
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Snapshot of all calls received so far.
    pub fn calls(&self) -> Vec<PortalCall> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn record(&self, call: PortalCall) {
        match self.calls.lock() {
            Ok(mut c) => c.push(call),
            Err(e) => e.into_inner().push(call),
        }
    }

    async fn simulate_latency(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }
}

impl Default for MockPortal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PortalGateway for MockPortal {
    async fn login(&self, username: &str, _password: &str) -> Result<Session, DomainError> {
        info!(username, "[MOCK] login");
        self.record(PortalCall::Login {
            username: username.to_string(),
        });
        self.simulate_latency().await;
        self.login
            .clone()
            .map(Session::new)
            .map_err(DomainError::Auth)
    }

    async fn fetch_prior_forms(&self, session: &Session) -> Result<PriorForms, DomainError> {
        info!("[MOCK] get-info");
        self.record(PortalCall::FetchPriorForms {
            cookie: session.as_str().to_string(),
        });
        self.simulate_latency().await;
        self.prior.clone().map_err(DomainError::Portal)
    }

    async fn save_form(
        &self,
        session: &Session,
        report_type: ReportType,
        form: &FormRecord,
    ) -> Result<(), DomainError> {
        info!(%report_type, "[MOCK] save");
        self.record(PortalCall::SaveForm {
            cookie: session.as_str().to_string(),
            path: save_path(report_type),
            form: form.clone(),
        });
        self.simulate_latency().await;
        self.save.clone().map_err(DomainError::Submission)
    }
}
