use crate::app::ports::DocumentFetcher;
use crate::config::PlazaConfig;
use crate::error::{FinalsError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &PlazaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for ReqwestFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FinalsError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        debug!("Fetched {} bytes", body.len());
        Ok(body)
    }
}
