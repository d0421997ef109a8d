//! Error type shared by the skim engine

use crate::encoding::EncodingError;
use crate::read_pool::ReadId;
use thiserror::Error;

/// Errors raised by the skim engine
///
/// Every variant is fatal for a run: a corrupt read could silently corrupt
/// a shared partition index, so nothing is recovered partially.
#[derive(Error, Debug)]
pub enum SkimError {
    /// A read contains a byte that is not a sequence symbol
    #[error("Read {read_id}: {source}")]
    Encoding {
        /// Offending read
        read_id: ReadId,
        /// Underlying encoding failure
        source: EncodingError,
    },

    /// A read is longer than hash positions can address
    #[error("Read {read_id} has clipped length {length}, above the supported maximum of {max}")]
    ReadTooLong {
        /// Offending read
        read_id: ReadId,
        /// Its clipped length
        length: usize,
        /// Maximal supported clipped length
        max: usize,
    },

    /// A configuration parameter is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread pool could not be created
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),

    /// Writing results failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SkimError>;
