//! Integration test utilities for the community chat service
//!
//! This crate provides helpers for running end-to-end tests: a real
//! gateway on an ephemeral port, token minting, and client sessions
//! driven through the public engine API.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
