//! Error taxonomy for the conversation store access layer
//!
//! Only three conditions are surfaced as errors: a conversation that no
//! candidate root contains, an I/O failure that survived all retries, and a
//! blown read deadline. Parse failures are not errors at this level; the
//! store degrades to an empty result after repair fails.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No candidate root contains the conversation. Absence is not
    /// transient, so this is never retried.
    #[error("no conversation found for id '{0}'")]
    TaskNotFound(String),

    /// An I/O error survived every retry attempt.
    #[error("failed to read {} after {attempts} attempts", path.display())]
    ReadFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// The read deadline expired. Surfaced distinctly so callers can
    /// suggest retrying; the serving path catches it and returns empty.
    #[error("timed out after {timeout_ms}ms reading {}", path.display())]
    Timeout { path: PathBuf, timeout_ms: u64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
