//! Errors from catalog configuration and decoding.

use std::error::Error;
use std::fmt;

use soundwalk_core::FetchError;

/// Errors produced while configuring endpoints or decoding responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// The JSON body did not match the expected shape.
    Decode {
        /// Description from the JSON parser, including line and column.
        reason: String,
    },
    /// [`ApiConfig`](crate::ApiConfig) failed validation.
    InvalidConfig {
        /// Description of which field was invalid.
        reason: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode { reason } => write!(f, "decode failed: {reason}"),
            Self::InvalidConfig { reason } => write!(f, "invalid api config: {reason}"),
        }
    }
}

impl Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode {
            reason: e.to_string(),
        }
    }
}

impl From<CatalogError> for FetchError {
    fn from(e: CatalogError) -> Self {
        FetchError::Decode {
            reason: e.to_string(),
        }
    }
}
