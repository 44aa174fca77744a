//! Error types for session guards.

use thiserror::Error;

/// Errors produced by the session guards.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No usable clipboard on this platform.
    #[error("clipboard is not available on this system")]
    ClipboardUnavailable,

    /// The platform clipboard rejected a read or write.
    #[error("{0}")]
    Clipboard(String),
}
