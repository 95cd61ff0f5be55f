//! `multipart/x-mixed-replace` parsing.
//!
//! Body bytes arrive in chunks that need not line up with part boundaries.
//! [`MultipartSplitter`] accumulates them, finds `--<token>` delimiters and
//! hands each complete part (header lines + payload) to a callback.

pub mod content_type;
pub mod headers;
pub mod splitter;

pub use content_type::{boundary_marker, boundary_token, MIXED_REPLACE};
pub use headers::{parse_part_headers, HeaderError, ParsedHeaders};
pub use splitter::{Mode, MultipartSplitter, SplitError};
