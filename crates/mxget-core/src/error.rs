//! Errors that fail a whole `get` call.
//!
//! Non-200 statuses, connection failures and callback cancellation are not
//! errors: they come back in [`crate::response::Response`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GetError {
    /// More than `limit` bytes buffered without finding the next boundary
    /// (or a single-shot body larger than `limit`). The transfer was aborted.
    #[error("part exceeded {limit} bytes without a boundary")]
    SizeLimit { limit: usize },

    /// The request could not be handed to the transport.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
