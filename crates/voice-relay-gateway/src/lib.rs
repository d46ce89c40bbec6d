//! HTTP gateway for the voice chat relay.
//!
//! Hosts the chat endpoint that drives the voice pipeline, the direct
//! single-stage endpoints, file uploads, health, and the embedded UI.

pub mod chat;
pub mod direct;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod server;
pub mod state;
pub mod uploads;

pub use server::{router, start_gateway};
pub use state::AppState;
