use std::io;
use thiserror::Error;

/// Failure while re-rooting an archive, tagged with the phase that failed.
#[derive(Error, Debug)]
pub enum RebaseError {
    #[error("failed to read entry header: {0}")]
    ReadHeader(#[source] io::Error),

    #[error("failed to write header for '{name}': {source}")]
    WriteHeader {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy payload of '{name}': {source}")]
    CopyPayload {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("payload of '{name}' is {copied} bytes but the header declares {declared}")]
    PayloadLength {
        name: String,
        declared: u64,
        copied: u64,
    },

    #[error("unsupported entry '{name}': {reason}")]
    Unsupported { name: String, reason: &'static str },

    #[error("failed to finalize archive: {0}")]
    Finalize(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, RebaseError>;
