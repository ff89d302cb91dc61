//! Recording push gateway for tests. Stores every URL instead of sending it.

use crate::domain::DomainError;
use crate::ports::PushGateway;
use std::sync::Mutex;
use tracing::info;

#[derive(Default)]
pub struct RecordingPushGateway {
    urls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the URL, then reports a transport failure.
    pub fn failing() -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls
            .lock()
            .map(|u| u.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait::async_trait]
impl PushGateway for RecordingPushGateway {
    async fn push(&self, url: &str) -> Result<(), DomainError> {
        info!(url, "[MOCK] push");
        match self.urls.lock() {
            Ok(mut u) => u.push(url.to_string()),
            Err(e) => e.into_inner().push(url.to_string()),
        }
        if self.fail {
            return Err(DomainError::Notice("simulated gateway failure".into()));
        }
        Ok(())
    }
}
