//! Core domain types
//!
//! Bots and their configuration as the CI server models them, plus the
//! event and status vocabularies exchanged with the source-control server.

pub mod bot;
pub mod event;
pub mod status;
pub mod trigger;
