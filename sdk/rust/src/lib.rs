//! # Ratchet SDK
//!
//! Official Rust SDK for the Ratchet license server - per-machine license
//! activation, periodic phone-home revalidation, and offline-tolerant
//! feature gating.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ratchet_sdk::{ClientOptions, LicenseClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(LicenseClient::new(
//!         "https://licenses.example.com",
//!         ClientOptions::default(),
//!     )?);
//!
//!     // Activate this machine with a license key
//!     let result = client.activate("BASE64PAYLOAD.BASE64SIG").await?;
//!     println!("Activated! Tier: {}", result.tier);
//!
//!     // Periodic revalidation (default every 24h, 30 day offline grace)
//!     let _loop = client.start_phone_home_loop();
//!
//!     // Feature gating from the cached license
//!     if client.has_feature("inventory") {
//!         println!("Inventory module enabled");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Offline Tolerance
//!
//! The SDK caches the last server verdict through a [`StorageAdapter`].
//! When the server is unreachable the cached verdict keeps working for a
//! grace window (default 30 days from the last successful phone-home),
//! degrading `Valid` → `GracePeriod` → blocked. Revocation and expiry
//! reported by the server block immediately.

pub mod cache;
pub mod client;
pub mod device;
pub mod error;
pub mod storage;
pub mod types;
pub mod verify;

// Main client
pub use client::{ClientOptions, LicenseClient};

// Error types
pub use error::{Result, SdkError};

// Storage
pub use storage::{FileStorage, MemoryStorage, StorageAdapter};

// Types
pub use cache::CachedLicense;
pub use types::{
    ActivateResponse, LicenseState, PhoneHomeResponse, UpdateInfo,
};

// Device utilities
pub use device::{generate_uuid, get_hardware_id};

// Key pre-validation
pub use verify::{decode_public_key, verify_key, KeyPayload};
