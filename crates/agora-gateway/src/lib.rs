//! # agora-gateway
//!
//! WebSocket gateway and REST surface for the community chat room: one
//! room, live fan-out, soft deletion, moderation bans and an optional
//! assistant that answers mentions.

pub mod assistant;
pub mod error;
pub mod extractors;
pub mod room;
pub mod routes;
pub mod server;
pub mod store;

pub use server::{create_app, create_gateway_state, run, GatewayState};
