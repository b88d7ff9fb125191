//! Tsukurogami HTTP Clients
//!
//! Typed clients for the two servers the bridge talks to:
//! - [`XcodeClient`]: the CI server's bot registry (list, duplicate, delete, integrate)
//! - [`BitbucketClient`]: the source-control server's commit build-status API
//!
//! Each client sits behind a trait ([`BotRegistry`], [`StatusNotifier`]) so
//! callers can swap in their own implementation.
//!
//! # Example
//!
//! ```no_run
//! use tsukurogami_client::{AuthenticatedTransport, BotRegistry, Credentials, XcodeClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = AuthenticatedTransport::new(Credentials::parse("ci:secret")?, true)?;
//!     let client = XcodeClient::new("https://ci.local:20343", transport);
//!
//!     for bot in client.list_bots().await? {
//!         println!("{}", bot.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod registry;
mod status;
mod transport;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use registry::{BotRegistry, XcodeClient, parse_bot_list};
pub use status::{BitbucketClient, StatusNotifier};
pub use transport::{AuthenticatedTransport, Credentials, CredentialsError};
