//! Transport seam: whatever performs the HTTP exchange and pushes events back.
//!
//! The client never talks to the network itself. A [`Transport`] configures
//! itself from the [`Request`], runs the exchange on the calling thread, and
//! reports every raw header line and body chunk to a [`TransferSink`]. A sink
//! returning [`Flow::Stop`] from `on_data` aborts the transfer.

mod libcurl;
pub mod scripted;

pub use libcurl::CurlTransport;
pub use scripted::{ScriptedResponse, ScriptedTransport, TransferRecord};

use thiserror::Error;

use crate::part::Flow;
use crate::request::Request;

/// Receives the events of one transfer, in order, on the thread that called `perform`.
pub trait TransferSink {
    /// One raw response header line, line ending included. Fired for the status
    /// line and headers of every response, including redirects and auth challenges.
    fn on_header(&mut self, line: &[u8]);

    /// One body chunk of the final response.
    fn on_data(&mut self, chunk: &[u8]) -> Flow;
}

pub trait Transport {
    /// Runs one request to completion, failure, or abort. Blocks the calling thread.
    fn perform(&mut self, request: &Request, sink: &mut dyn TransferSink) -> TransferReport;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn perform(&mut self, request: &Request, sink: &mut dyn TransferSink) -> TransferReport {
        (**self).perform(request, sink)
    }
}

/// Outcome of one transfer as seen by the transport.
#[derive(Debug)]
pub struct TransferReport {
    /// Final HTTP status; 0 when no response was received.
    pub status_code: u32,
    /// Content type of the final response, if the server sent one.
    pub content_type: Option<String>,
    pub error: Option<TransportError>,
}

impl TransferReport {
    pub fn failed(error: TransportError) -> Self {
        Self {
            status_code: 0,
            content_type: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The sink asked to stop.
    #[error("transfer aborted by receiver")]
    Aborted,
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("{0}")]
    Other(String),
}
