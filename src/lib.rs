//! Ratchet - hardware-bound licensing for the Ratchet CMMS suite
//!
//! This library provides the core functionality for the Ratchet license
//! server: license key signing and verification, the activation ledger with
//! concurrency-safe limit enforcement, phone-home revalidation, tier-based
//! feature gating, and the HTTP API handlers.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod features;
pub mod handlers;
pub mod id;
pub mod keycodec;
pub mod middleware;
pub mod models;
pub mod util;
