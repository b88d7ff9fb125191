//! Data Transfer Objects for upstream communication
//!
//! Request and response bodies exchanged with the CI server and the
//! source-control server that are not domain entities in their own right.

pub mod bot;
pub mod status;
