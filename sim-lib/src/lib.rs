//! Library for diskio-sim containing the latency simulation engine.
//!
//! The server binary and the simbench load generator both build on it:
//! the server to make the decisions, simbench to decode what it gets back.

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod config;
pub mod sim;
pub mod utils;
pub mod wire;
