//! Result of one `get` call.

use crate::part::find_header;

/// How the transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The transport finished normally (server closed or body complete).
    Completed,
    /// The per-part callback returned `Stop`; the transfer was aborted on purpose.
    Cancelled,
    /// The final status was not 200; the body was not parsed.
    Discarded,
    /// The transport failed. With `status_code == 0` the server was never reached.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Response {
    /// Final HTTP status; 0 when the transport never connected.
    pub status_code: u32,
    pub content_type: Option<String>,
    /// Header lines of the final response in arrival order (status line excluded).
    pub headers: Vec<String>,
    pub parts_delivered: u64,
    /// Streamed parts dropped because their header block was unterminated.
    pub malformed_parts: u64,
    pub end: StreamEnd,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    /// True when no HTTP response was received at all.
    pub fn is_connection_failure(&self) -> bool {
        self.status_code == 0
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}
