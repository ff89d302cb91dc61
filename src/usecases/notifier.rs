//! Push the outcome of a check-in to the user's configured gateway.
//!
//! Best effort: misconfiguration and gateway failures are logged and discarded,
//! never escalated to the caller.

use crate::domain::{DomainError, NoticeConfig, NoticeProvider, ReportOutcome};
use crate::ports::PushGateway;
use reqwest::Url;
use std::sync::Arc;
use tracing::{error, info, warn};

const BARK_BASE_URL: &str = "https://api.day.app";
const SERVERCHAN_BASE_URL: &str = "https://sctapi.ftqq.com";

pub struct Notifier {
    push: Arc<dyn PushGateway>,
}

impl Notifier {
    pub fn new(push: Arc<dyn PushGateway>) -> Self {
        Self { push }
    }

    /// Send the outcome for `label` if `notice` is complete and names a known provider.
    /// Returns true when a push was dispatched successfully.
    pub async fn notify(
        &self,
        label: &str,
        notice: Option<&NoticeConfig>,
        outcome: &ReportOutcome,
    ) -> bool {
        let Some(notice) = notice else {
            info!("no notice_info configured; skipping push");
            return false;
        };
        let (kind, key) = match (non_blank(&notice.notice_type), non_blank(&notice.notice_key)) {
            (Some(kind), Some(key)) => (kind, key),
            _ => {
                error!("notice_info is incomplete; need both notice_type and notice_key");
                return false;
            }
        };
        let url = match kind
            .parse::<NoticeProvider>()
            .and_then(|provider| build_url(provider, key, label, outcome))
        {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "cannot build push URL; skipping push");
                return false;
            }
        };

        match self.push.push(url.as_str()).await {
            Ok(()) => {
                info!(provider = kind, "push sent");
                true
            }
            Err(e) => {
                warn!(provider = kind, error = %e, "push failed; result discarded");
                false
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Gateway URL carrying the outcome text, percent-encoded.
pub fn build_url(
    provider: NoticeProvider,
    key: &str,
    label: &str,
    outcome: &ReportOutcome,
) -> Result<Url, DomainError> {
    let message = outcome.message();
    match provider {
        NoticeProvider::Bark => {
            let mut url = parse_base(BARK_BASE_URL)?;
            url.path_segments_mut()
                .map_err(|_| DomainError::Notice("bark base URL cannot be a base".into()))?
                .pop_if_empty()
                .push(key)
                .push(&format!("用户<{}>打卡通知：{}", label, message));
            Ok(url)
        }
        NoticeProvider::ServerChan => {
            let status = if outcome.is_success() {
                "本次打卡成功"
            } else {
                "本次打卡发生错误，详情请点击查看"
            };
            let mut url = parse_base(SERVERCHAN_BASE_URL)?;
            url.path_segments_mut()
                .map_err(|_| DomainError::Notice("serverchan base URL cannot be a base".into()))?
                .pop_if_empty()
                .push(&format!("{}.send", key));
            url.query_pairs_mut()
                .append_pair("title", &format!("用户<{}>{}", label, status))
                .append_pair("desp", message);
            Ok(url)
        }
    }
}

fn parse_base(base: &str) -> Result<Url, DomainError> {
    Url::parse(base).map_err(|e| DomainError::Notice(format!("invalid gateway URL {}: {}", base, e)))
}
