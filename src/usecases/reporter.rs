//! Per-user check-in pipeline: session -> prior form -> today's form -> save -> push.
//!
//! - Reuses the configured cookie, or logs in once and caches the session for the run
//! - Rebuilds today's form from the most recent prior submission
//! - Every failure ends this user's run; nothing is retried

use crate::domain::{
    DomainError, FormRecord, ReportOutcome, ReportStage, Session, UserConfig,
};
use crate::ports::PortalGateway;
use crate::usecases::notifier::Notifier;
use std::sync::Arc;
use tracing::{debug, error, info};

/// How one user's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Form saved; success pushed.
    Reported,
    /// Business failure; failure pushed.
    Failed,
    /// Auth, transport or parse failure; logged only.
    Aborted,
}

pub struct Reporter {
    label: String,
    user: UserConfig,
    portal: Arc<dyn PortalGateway>,
    notifier: Arc<Notifier>,
    session: Option<Session>,
    stage: ReportStage,
}

impl Reporter {
    pub fn new(
        label: impl Into<String>,
        user: UserConfig,
        portal: Arc<dyn PortalGateway>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            label: label.into(),
            user,
            portal,
            notifier,
            session: None,
            stage: ReportStage::Init,
        }
    }

    pub fn stage(&self) -> ReportStage {
        self.stage
    }

    fn enter(&mut self, stage: ReportStage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    /// Session for this run. The configured cookie wins; otherwise log in once and cache.
    pub async fn acquire_session(&mut self) -> Result<Session, DomainError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        if let Some(cookie) = &self.user.cookie {
            let session = Session::new(cookie.clone());
            self.session = Some(session.clone());
            return Ok(session);
        }

        self.enter(ReportStage::Authenticating);
        let (username, password) = self
            .user
            .credentials()
            .ok_or_else(|| DomainError::Config("no cookie and no credentials".into()))?;
        info!("logging in to obtain session cookie");
        let session = self.portal.login(username, password).await?;
        info!("session cookie obtained");
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Fetch the prior submission and turn it into today's form.
    pub async fn fetch_form(&mut self) -> Result<FormRecord, DomainError> {
        let session = self.acquire_session().await?;
        self.enter(ReportStage::FetchingForm);
        info!("fetching prior form");
        let prior = self.portal.fetch_prior_forms(&session).await?;
        let form = prior.select()?.into_today()?;
        info!(fields = form.len(), "today's form generated");
        Ok(form)
    }

    /// Save the form to the endpoint for this user's report type.
    pub async fn submit(&mut self, form: &FormRecord) -> Result<(), DomainError> {
        let session = self.acquire_session().await?;
        self.enter(ReportStage::Submitting);
        info!(report_type = %self.user.report_type, "submitting form");
        self.portal
            .save_form(&session, self.user.report_type, form)
            .await
    }

    async fn run_pipeline(&mut self) -> Result<(), DomainError> {
        let form = self.fetch_form().await?;
        self.submit(&form).await
    }

    /// Run the whole pipeline and push the outcome.
    pub async fn report(mut self) -> RunStatus {
        info!(report_type = %self.user.report_type, "starting check-in");
        let status = match self.run_pipeline().await {
            Ok(()) => {
                info!("check-in succeeded");
                self.push(ReportOutcome::Success).await;
                RunStatus::Reported
            }
            Err(e) => match e.notice_message() {
                Some(message) => {
                    error!(stage = %self.stage, error = %e, "check-in failed");
                    self.push(ReportOutcome::Failure(message)).await;
                    RunStatus::Failed
                }
                None => {
                    error!(stage = %self.stage, error = %e, "check-in aborted");
                    RunStatus::Aborted
                }
            },
        };
        self.enter(ReportStage::Done);
        status
    }

    async fn push(&mut self, outcome: ReportOutcome) {
        self.enter(ReportStage::Notifying);
        self.notifier
            .notify(&self.label, self.user.notice.as_ref(), &outcome)
            .await;
    }
}
