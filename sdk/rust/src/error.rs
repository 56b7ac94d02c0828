//! Error types for the Ratchet SDK

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    /// The server could not be reached or the request failed in transit.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("server rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    /// The license key failed local signature pre-validation.
    #[error("invalid license key")]
    InvalidKey,

    /// An operation that needs an activation was called before activate().
    #[error("no activation present; call activate() first")]
    NotActivated,

    /// A hardware id could not be determined for this machine.
    #[error("could not determine hardware id: {0}")]
    HardwareId(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;
