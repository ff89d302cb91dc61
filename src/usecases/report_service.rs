//! Fan-out: one reporter task per configured user, joined at the end.
//!
//! Tasks share only the read-only gateways; a failure in one never touches the others.

use crate::domain::UserConfig;
use crate::ports::PortalGateway;
use crate::usecases::notifier::Notifier;
use crate::usecases::reporter::{Reporter, RunStatus};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span};

pub struct ReportService {
    portal: Arc<dyn PortalGateway>,
    notifier: Arc<Notifier>,
}

impl ReportService {
    pub fn new(portal: Arc<dyn PortalGateway>, notifier: Arc<Notifier>) -> Self {
        Self { portal, notifier }
    }

    /// Run every user's check-in concurrently and wait for all of them.
    pub async fn run_all(&self, users: Vec<UserConfig>) -> RunSummary {
        let mut tasks = JoinSet::new();
        for (idx, user) in users.into_iter().enumerate() {
            let label = user_label(&user, idx);
            let span = info_span!("report", user = %label);
            let reporter = Reporter::new(
                label,
                user,
                Arc::clone(&self.portal),
                Arc::clone(&self.notifier),
            );
            tasks.spawn(reporter.report().instrument(span));
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(status) => summary.record(status),
                Err(e) => {
                    error!(error = %e, "report task did not complete");
                    summary.aborted += 1;
                }
            }
        }

        info!(
            reported = summary.reported,
            failed = summary.failed,
            aborted = summary.aborted,
            "all check-ins finished"
        );
        summary
    }
}

/// Name used in logs and push text: the username, or the user's 1-based position.
pub fn user_label(user: &UserConfig, idx: usize) -> String {
    user.username
        .clone()
        .unwrap_or_else(|| format!("user#{}", idx + 1))
}

/// Counts of how each user's run ended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reported: usize,
    pub failed: usize,
    pub aborted: usize,
}

impl RunSummary {
    fn record(&mut self, status: RunStatus) {
        match status {
            RunStatus::Reported => self.reported += 1,
            RunStatus::Failed => self.failed += 1,
            RunStatus::Aborted => self.aborted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.reported + self.failed + self.aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::portal::{MockPortal, PortalCall};
    use crate::adapters::push::RecordingPushGateway;
    use crate::domain::{FormRecord, PriorForms, ReportType};
    use serde_json::json;

    fn record() -> FormRecord {
        let geo = json!({
            "addressComponent": {"province": "河北省", "city": "保定市", "district": "莲池区"},
            "formattedAddress": "河北省保定市莲池区",
        });
        let value = json!({"geo_api_info": geo.to_string()});
        FormRecord::new(value.as_object().unwrap().clone())
    }

    fn cookie_user(cookie: &str) -> UserConfig {
        UserConfig::new(None, None, Some(cookie.into()), ReportType::Inner, None).unwrap()
    }

    #[test]
    fn test_user_label() {
        let named = UserConfig::new(
            Some("alice".into()),
            Some("pw".into()),
            None,
            ReportType::Inner,
            None,
        )
        .unwrap();
        assert_eq!(user_label(&named, 0), "alice");
        assert_eq!(user_label(&cookie_user("c=1"), 2), "user#3");
    }

    #[tokio::test]
    async fn test_run_all_users_independently() {
        let portal = Arc::new(
            MockPortal::new()
                .with_prior_forms(PriorForms {
                    old_info: Some(record()),
                    info: None,
                })
                .with_delay(5),
        );
        let notifier = Arc::new(Notifier::new(Arc::new(RecordingPushGateway::new())));
        let service = ReportService::new(portal.clone(), notifier);

        let users = vec![cookie_user("c=1"), cookie_user("c=2"), cookie_user("c=3")];
        let summary = service.run_all(users).await;
        assert_eq!(summary.reported, 3);
        assert_eq!(summary.total(), 3);

        let mut saved: Vec<String> = portal
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                PortalCall::SaveForm { cookie, .. } => Some(cookie),
                _ => None,
            })
            .collect();
        saved.sort();
        assert_eq!(saved, vec!["c=1", "c=2", "c=3"]);
    }

    #[tokio::test]
    async fn test_mixed_outcomes_are_counted() {
        let portal = Arc::new(MockPortal::new().with_login_rejected("账号或密码错误"));
        let notifier = Arc::new(Notifier::new(Arc::new(RecordingPushGateway::new())));
        let service = ReportService::new(portal, notifier);

        let password_user = UserConfig::new(
            Some("bob".into()),
            Some("wrong".into()),
            None,
            ReportType::Outer,
            None,
        )
        .unwrap();
        // cookie user gets past login but has no history
        let summary = service
            .run_all(vec![password_user, cookie_user("c=1")])
            .await;
        assert_eq!(
            summary,
            RunSummary {
                reported: 0,
                failed: 1,
                aborted: 1
            }
        );
    }

    #[tokio::test]
    async fn test_empty_user_list() {
        let service = ReportService::new(
            Arc::new(MockPortal::new()),
            Arc::new(Notifier::new(Arc::new(RecordingPushGateway::new()))),
        );
        assert_eq!(service.run_all(Vec::new()).await, RunSummary::default());
    }
}
