//! Commit build-status endpoint of the source-control server
//!
//! `POST {base}/rest/build-status/1.0/commits/{commit}`

use async_trait::async_trait;
use reqwest::{Method, Url};
use tsukurogami_core::dto::status::BuildStatus;

use crate::error::{ClientError, Result};
use crate::transport::{self, AuthenticatedTransport};

/// Receiver of per-commit build statuses
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Records `status` against `commit`
    async fn post_build_status(&self, commit: &str, status: &BuildStatus) -> Result<()>;
}

/// HTTP client for the source-control server's build-status API
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    base_url: Url,
    transport: AuthenticatedTransport,
}

impl BitbucketClient {
    /// Create a new source-control server client
    ///
    /// # Arguments
    /// * `base_url` - Server root, possibly with a context path (e.g., "https://git.local/bitbucket")
    /// * `transport` - Authenticated transport used for every request
    pub fn new(base_url: &str, transport: AuthenticatedTransport) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            transport,
        })
    }

    /// Status URL for `commit`; the commit is escaped as a single path segment
    pub fn commit_url(&self, commit: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["rest", "build-status", "1.0", "commits", commit]);
        Ok(url)
    }
}

#[async_trait]
impl StatusNotifier for BitbucketClient {
    async fn post_build_status(&self, commit: &str, status: &BuildStatus) -> Result<()> {
        let url = self.commit_url(commit)?;
        let response = self
            .transport
            .request(Method::POST, url.as_str())
            .json(status)
            .send()
            .await?;

        transport::expect_success(response, "post build status").await?;
        tracing::debug!("Posted {} for {} on commit {}", status.state, status.key, commit);
        Ok(())
    }
}
