//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, FormRecord, PriorForms, ReportType, Session};

/// Check-in portal API. Login, fetch the prior submission, save today's.
#[async_trait::async_trait]
pub trait PortalGateway: Send + Sync {
    /// Log in with a credential pair.
    ///
    /// Returns `DomainError::Auth` with the server's reason when the portal refuses.
    async fn login(&self, username: &str, password: &str) -> Result<Session, DomainError>;

    /// Fetch the previously submitted forms.
    ///
    /// A non-zero response code maps to `DomainError::Portal` carrying the server message.
    async fn fetch_prior_forms(&self, session: &Session) -> Result<PriorForms, DomainError>;

    /// Submit a form to the save endpoint for `report_type`.
    ///
    /// A non-zero response code maps to `DomainError::Submission`.
    async fn save_form(
        &self,
        session: &Session,
        report_type: ReportType,
        form: &FormRecord,
    ) -> Result<(), DomainError>;
}

/// Push notification gateway. A single GET to a fully built URL.
#[async_trait::async_trait]
pub trait PushGateway: Send + Sync {
    /// Dispatch the push. The response body is not inspected.
    async fn push(&self, url: &str) -> Result<(), DomainError>;
}
