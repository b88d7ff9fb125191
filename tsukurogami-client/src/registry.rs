//! Bot registry endpoints of the CI server
//!
//! - `GET    {base}/api/bots`
//! - `POST   {base}/api/bots/{id}/duplicate`
//! - `DELETE {base}/api/bots/{id}`
//! - `POST   {base}/api/bots/{id}/integrations`

use async_trait::async_trait;
use reqwest::Method;
use tsukurogami_core::domain::bot::Bot;
use tsukurogami_core::dto::bot::{BotList, IntegrationRequest};

use crate::error::{ClientError, Result};
use crate::transport::{self, AuthenticatedTransport};

/// Bot collection on the CI server
///
/// Implemented over HTTP by [`XcodeClient`]; the trait exists so the
/// reconciler can be exercised against an in-memory registry.
#[async_trait]
pub trait BotRegistry: Send + Sync {
    /// Lists every bot on the server
    async fn list_bots(&self) -> Result<Vec<Bot>>;

    /// Creates a new bot from `template_id`, replacing its document with `bot`
    async fn duplicate_bot(&self, template_id: &str, bot: &Bot) -> Result<()>;

    /// Deletes a bot
    async fn delete_bot(&self, id: &str) -> Result<()>;

    /// Queues an integration run that reuses the existing workspace
    async fn trigger_integration(&self, id: &str) -> Result<()>;
}

/// HTTP client for the CI server's bot API
#[derive(Debug, Clone)]
pub struct XcodeClient {
    /// Base URL of the CI server (e.g., "https://ci.local:20343")
    base_url: String,
    transport: AuthenticatedTransport,
}

impl XcodeClient {
    /// Create a new CI server client
    ///
    /// # Arguments
    /// * `base_url` - Server root; `/api/bots` is appended by each call
    /// * `transport` - Authenticated transport used for every request
    pub fn new(base_url: impl Into<String>, transport: AuthenticatedTransport) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Get the base URL of the CI server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bots_url(&self) -> String {
        format!("{}/api/bots", self.base_url)
    }

    fn bot_url(&self, id: &str, suffix: &str) -> String {
        format!("{}/api/bots/{}{}", self.base_url, id, suffix)
    }
}

/// Decodes a bot listing; an empty registry is treated as a broken response
pub fn parse_bot_list(body: &[u8]) -> Result<Vec<Bot>> {
    let list: BotList = serde_json::from_slice(body)
        .map_err(|e| ClientError::Protocol(format!("invalid bot list: {}", e)))?;

    if list.count == 0 {
        return Err(ClientError::Protocol("no bots".to_string()));
    }

    Ok(list.results)
}

#[async_trait]
impl BotRegistry for XcodeClient {
    async fn list_bots(&self) -> Result<Vec<Bot>> {
        let response = self
            .transport
            .request(Method::GET, &self.bots_url())
            .send()
            .await?;
        let response = transport::expect_success(response, "list bots").await?;
        let body = response.bytes().await?;

        let bots = parse_bot_list(&body)?;
        tracing::debug!("Listed {} bot(s)", bots.len());
        Ok(bots)
    }

    async fn duplicate_bot(&self, template_id: &str, bot: &Bot) -> Result<()> {
        let response = self
            .transport
            .request(Method::POST, &self.bot_url(template_id, "/duplicate"))
            .json(bot)
            .send()
            .await?;

        transport::expect_status(response, 201, "duplicate bot").await?;
        Ok(())
    }

    async fn delete_bot(&self, id: &str) -> Result<()> {
        let response = self
            .transport
            .request(Method::DELETE, &self.bot_url(id, ""))
            .send()
            .await?;

        transport::expect_status(response, 204, "delete bot").await?;
        Ok(())
    }

    async fn trigger_integration(&self, id: &str) -> Result<()> {
        let response = self
            .transport
            .request(Method::POST, &self.bot_url(id, "/integrations"))
            .json(&IntegrationRequest::incremental())
            .send()
            .await?;

        transport::expect_status(response, 201, "trigger integration").await?;
        Ok(())
    }
}
