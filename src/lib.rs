//! callbench - load-testing client for the Loop call-signaling service
//!
//! Drives the service's HTTP API (registration, call URLs, call initiation,
//! rooms) and its WebSocket call-progress protocol to measure capacity and
//! correctness under synthetic load.

pub mod api;
pub mod auth;
pub mod config;
pub mod estimate;
pub mod models;
pub mod scenario;
pub mod signaling;
