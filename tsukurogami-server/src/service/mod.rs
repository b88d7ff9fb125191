//! Service Module
//!
//! Business logic for the bridge. Services depend on the upstream clients
//! through their traits and hold no state between requests.

pub mod log_buffer;
pub mod reconciler;
pub mod relay;

#[cfg(test)]
pub(crate) mod testing;

pub use log_buffer::LogBuffer;
pub use reconciler::Reconciler;
pub use relay::IntegrationRelay;
