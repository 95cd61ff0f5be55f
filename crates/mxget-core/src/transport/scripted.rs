//! Deterministic transport that replays canned responses.
//!
//! Used by the test suites, and handy for feeding recorded camera streams
//! through the client without a network.

use std::collections::VecDeque;

use super::{TransferReport, TransferSink, Transport, TransportError};
use crate::part::find_header;
use crate::request::Request;

/// One canned response.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponse {
    /// Final status; 0 simulates a server that was never reached.
    pub status_code: u32,
    /// Raw lines of earlier responses (redirects, auth challenges), replayed first.
    pub interim_lines: Vec<String>,
    /// Header lines of the final response, without the status line.
    pub headers: Vec<String>,
    pub chunks: Vec<Vec<u8>>,
    /// Reported as a transport error after all chunks were accepted.
    pub failure: Option<String>,
}

impl ScriptedResponse {
    /// 200 response with the given content type and body chunks.
    pub fn ok<I, C>(content_type: &str, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            status_code: 200,
            headers: vec![format!("Content-Type: {}", content_type)],
            chunks: chunks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Response with `code` and a small text body.
    pub fn status(code: u32) -> Self {
        Self {
            status_code: code,
            headers: vec!["Content-Type: text/plain".to_string()],
            chunks: vec![format!("status {}", code).into_bytes()],
            ..Self::default()
        }
    }

    /// Connection that never reaches the server.
    pub fn unreachable() -> Self {
        Self {
            failure: Some("could not connect to server".to_string()),
            ..Self::default()
        }
    }

    /// Splits `body` into chunks of `size` bytes (last one shorter).
    pub fn chunked(content_type: &str, body: &[u8], size: usize) -> Self {
        Self::ok(content_type, body.chunks(size.max(1)).map(<[u8]>::to_vec))
    }

    pub fn with_header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    /// Prepends an earlier response (e.g. `"HTTP/1.1 302 Found"` plus its headers).
    pub fn after_interim<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interim_lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Ends the transfer with a transport error once the chunks are delivered.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

/// What the transport saw and did for one `perform`.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub uri: String,
    pub custom_headers: Vec<String>,
    pub authenticated: bool,
    /// Chunks the sink accepted with `Continue`.
    pub chunks_accepted: usize,
    /// The sink returned `Stop` and the transfer was cut short.
    pub aborted: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: VecDeque<ScriptedResponse>,
    records: Vec<TransferRecord>,
}

impl ScriptedTransport {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = ScriptedResponse>,
    {
        Self {
            responses: responses.into_iter().collect(),
            records: Vec::new(),
        }
    }

    /// One record per `perform`, oldest first.
    pub fn records(&self) -> &[TransferRecord] {
        &self.records
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl Transport for ScriptedTransport {
    fn perform(&mut self, request: &Request, sink: &mut dyn TransferSink) -> TransferReport {
        let mut record = TransferRecord {
            uri: request.uri.clone(),
            custom_headers: request.custom_headers.clone(),
            authenticated: request.credentials.is_some(),
            chunks_accepted: 0,
            aborted: false,
        };
        let Some(response) = self.responses.pop_front() else {
            self.records.push(record);
            return TransferReport::failed(TransportError::Other(
                "no scripted response left".to_string(),
            ));
        };

        if response.status_code == 0 {
            self.records.push(record);
            return TransferReport::failed(TransportError::Other(
                response
                    .failure
                    .unwrap_or_else(|| "no response".to_string()),
            ));
        }

        for line in &response.interim_lines {
            sink.on_header(format!("{}\r\n", line).as_bytes());
        }
        sink.on_header(
            format!(
                "HTTP/1.1 {} {}\r\n",
                response.status_code,
                reason_phrase(response.status_code)
            )
            .as_bytes(),
        );
        for line in &response.headers {
            sink.on_header(format!("{}\r\n", line).as_bytes());
        }
        sink.on_header(b"\r\n");

        for chunk in &response.chunks {
            if sink.on_data(chunk).is_stop() {
                record.aborted = true;
                break;
            }
            record.chunks_accepted += 1;
        }

        let error = if record.aborted {
            Some(TransportError::Aborted)
        } else {
            response.failure.map(TransportError::Other)
        };
        self.records.push(record);

        TransferReport {
            status_code: response.status_code,
            content_type: find_header(&response.headers, "content-type").map(str::to_string),
            error,
        }
    }
}

fn reason_phrase(code: u32) -> &'static str {
    match code {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
