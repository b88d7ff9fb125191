//! Tsukurogami Core
//!
//! Core types and pure logic shared by the Tsukurogami bridge.
//!
//! This crate contains:
//! - Domain types: bots, configurations and triggers as the CI server models them
//! - DTOs: bodies exchanged with the CI and source-control servers
//! - Tagging: which bots are templates, which belong to a pull-request branch
//! - Instance derivation: how a template becomes a pull-request bot

pub mod domain;
pub mod dto;
pub mod instance;
pub mod tagging;
