//! Error definitions for the mapping module

use crate::persistence::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    /// The backing configuration store rejected a read or write
    #[error("Mapping store error: {0}")]
    Store(#[from] StoreError),

    /// A stored record could not be decoded
    #[error("Invalid mapping record for {device}: {reason}")]
    InvalidRecord { device: String, reason: String },
}
