//! HTTP API drivers for the call-signaling service

pub mod calls;
pub mod client;
pub mod rooms;

pub use client::LoopClient;
