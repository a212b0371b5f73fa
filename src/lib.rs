//! Growd - a small self-hosted controller for grow-room automation.
//!
//! Durable named device jobs (relay cycling, sensor polling) that survive
//! restarts, a bounded-retry climate-read protocol, and a local HTTP API.

pub mod build_info;
pub mod config;
pub mod device;
pub mod handlers;
pub mod job;
pub mod server;
