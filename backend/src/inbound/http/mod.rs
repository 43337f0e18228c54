//! HTTP inbound adapter: the command endpoint, health probes and the static
//! asset fallback.

pub mod cache_control;
pub mod dispatcher;
pub mod envelope;
pub mod health;
pub mod state;
pub mod static_files;
