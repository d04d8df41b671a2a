//! Entrance access codes lookup by Russian street address.
//!
//! The library resolves free-text addresses and coordinates against an
//! address database and serves the results over HTTP ([`api`]) and a
//! Telegram bot ([`bot`]).

#![deny(missing_docs)]

/// HTTP API surface
pub mod api;
/// Telegram bot: conversation flow and platform glue
pub mod bot;
/// Address normalization, matching and aggregation
pub mod codes;
/// Settings of both processes
pub mod config;
/// Reverse geocoding
pub mod geocoding;
/// Address store and key-value cache
pub mod storage;
/// Logging setup
pub mod telemetry;
