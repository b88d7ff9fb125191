//! Authenticated HTTP transport
//!
//! Both upstream servers are reached through the same wrapper: a reqwest
//! client with optional certificate verification and HTTP Basic credentials
//! attached to every request.

use reqwest::{Client, Method, RequestBuilder, Response};
use thiserror::Error;

use crate::error::{ClientError, Result};

/// `user:password` string that could not be split
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("credentials must be in the form user:password")]
pub struct CredentialsError;

/// HTTP Basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses `user:password`; the password may itself contain colons
    pub fn parse(raw: &str) -> std::result::Result<Self, CredentialsError> {
        match raw.split_once(':') {
            Some((user, password)) if !user.is_empty() => Ok(Self::new(user, password)),
            _ => Err(CredentialsError),
        }
    }
}

impl std::str::FromStr for Credentials {
    type Err = CredentialsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// reqwest client that signs every request with Basic credentials
#[derive(Debug, Clone)]
pub struct AuthenticatedTransport {
    client: Client,
    credentials: Credentials,
}

impl AuthenticatedTransport {
    /// Builds a transport
    ///
    /// # Arguments
    /// * `credentials` - Basic credentials sent with every request
    /// * `skip_verify` - Accept any server certificate, for self-signed CI hosts
    pub fn new(credentials: Credentials, skip_verify: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(skip_verify)
            .build()?;
        Ok(Self::with_client(client, credentials))
    }

    /// Wraps an already configured reqwest client
    pub fn with_client(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Starts an authenticated request
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }
}

/// Accepts the response only if its status is exactly `expected`
pub(crate) async fn expect_status(
    response: Response,
    expected: u16,
    operation: &'static str,
) -> Result<Response> {
    let status = response.status().as_u16();
    if status == expected {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ClientError::remote(operation, status, message))
}

/// Accepts any 2xx response
pub(crate) async fn expect_success(
    response: Response,
    operation: &'static str,
) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::remote(operation, status, message))
}
