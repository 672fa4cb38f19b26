//! # thrive
//!
//! Application layer for Thrive: the CLI, the local HTTP server and the
//! opt-in AI advisory client. All capital math, custody and plan gating
//! lives in `thrive-core`; this crate only wires it to terminals and
//! sockets.

pub mod advisor;
pub mod api;
pub mod cli;
pub mod config;
