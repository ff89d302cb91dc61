//! HTTP push adapter. Implements PushGateway for Bark and ServerChan (both plain GETs).

use crate::domain::DomainError;
use crate::ports::PushGateway;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub struct HttpPushGateway {
    client: Client,
}

impl HttpPushGateway {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PushGateway for HttpPushGateway {
    async fn push(&self, url: &str) -> Result<(), DomainError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::Notice(format!("Request failed: {}", e)))?;

        debug!(status = %res.status(), "push gateway answered");
        Ok(())
    }
}
