//! HTTP client for cameras and similar sources that answer either with one
//! binary payload or with a `multipart/x-mixed-replace` stream of them.
//!
//! ```no_run
//! use mxget_core::{Flow, Request, StreamingClient};
//!
//! let mut client = StreamingClient::new();
//! let request = Request::new("http://10.0.0.22/stream").with_credentials("admin", "secret");
//! let response = client.get(&request, |part| {
//!     println!("frame {}: {} bytes", part.index, part.payload.len());
//!     Flow::from(part.index < 29)
//! })?;
//! println!("status {}", response.status_code);
//! # Ok::<(), mxget_core::GetError>(())
//! ```

pub mod config;
pub mod logging;

pub mod client;
pub mod error;
pub mod multipart;
pub mod part;
pub mod reader;
pub mod request;
pub mod response;
pub mod transport;

pub use client::StreamingClient;
pub use error::GetError;
pub use part::{Flow, OwnedPart, Part};
pub use reader::{ExitReason, FrameReader, ReaderExit};
pub use request::{Credentials, Request, DEFAULT_MAX_PART_BYTES};
pub use response::{Response, StreamEnd};
pub use transport::{CurlTransport, ScriptedResponse, ScriptedTransport, Transport};
