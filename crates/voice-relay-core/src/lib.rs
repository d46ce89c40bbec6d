//! Core types, config, errors, and session store for voice-relay.

pub mod config;
pub mod error;
pub mod session;
pub mod session_store;
pub mod types;
