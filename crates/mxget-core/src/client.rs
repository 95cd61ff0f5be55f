//! Blocking client: one `get` per call, single image or multipart stream.
//!
//! Runs the transport on the calling thread and feeds its events into a
//! [`MultipartSplitter`]. Parts reach the callback in arrival order on the
//! same thread. `get` takes `&mut self`, so one instance serves one call at a
//! time; use one client per concurrent stream.

use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::error::GetError;
use crate::multipart::{MultipartSplitter, SplitError};
use crate::part::{Flow, Part};
use crate::request::{Request, DEFAULT_MAX_PART_BYTES};
use crate::response::{Response, StreamEnd};
use crate::transport::{CurlTransport, TransferSink, Transport};

pub struct StreamingClient<T: Transport = CurlTransport> {
    transport: T,
    splitter: MultipartSplitter,
}

impl StreamingClient<CurlTransport> {
    /// libcurl-backed client with default transport options.
    pub fn new() -> Self {
        Self::with_transport(CurlTransport::default())
    }

    pub fn with_config(config: TransportConfig) -> Self {
        Self::with_transport(CurlTransport::new(config))
    }
}

impl Default for StreamingClient<CurlTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> StreamingClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            splitter: MultipartSplitter::new(DEFAULT_MAX_PART_BYTES),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }


    /// Fetches `request.uri` and calls `on_part` for every part received.
    ///
    /// A multipart/x-mixed-replace response yields one call per part as it
    /// arrives, until the server closes the connection or `on_part` returns
    /// [`Flow::Stop`]. Any other 200 response yields exactly one call with the
    /// body received once the transfer ends, even if the transport then failed
    /// (`Response::end` is `Failed` in that case).
    ///
    /// Non-200 statuses and connection failures are returned in the
    /// [`Response`]; only a part exceeding `max_part_bytes` (or an unusable
    /// request) is an error.
    pub fn get<F>(&mut self, request: &Request, mut on_part: F) -> Result<Response, GetError>
    where
        F: FnMut(&Part<'_>) -> Flow,
    {
        request.validate()?;
        self.splitter.reset(request.max_part_bytes);

        let mut sink = CallSink {
            splitter: &mut self.splitter,
            on_part: &mut on_part,
            headers: Vec::new(),
            status_code: 0,
            content_type: None,
            failure: None,
            discarded: false,
        };
        let report = self.transport.perform(request, &mut sink);
        let CallSink {
            headers,
            status_code: seen_status,
            content_type: seen_type,
            failure,
            discarded,
            ..
        } = sink;

        if let Some(err) = failure {
            return Err(err);
        }

        let status_code = if report.status_code != 0 {
            report.status_code
        } else {
            seen_status
        };
        let content_type = report.content_type.or(seen_type);

        let end = if self.splitter.is_cancelled() {
            StreamEnd::Cancelled
        } else if discarded {
            StreamEnd::Discarded
        } else if let Some(err) = report.error {
            StreamEnd::Failed(err.to_string())
        } else {
            StreamEnd::Completed
        };

        // A transport error after a 200 still delivers what arrived; `end` reports it.
        if status_code == 200 && !self.splitter.is_cancelled() && !discarded {
            self.splitter
                .finish(content_type.as_deref(), &headers, &mut on_part);
        }

        if status_code == 200 {
            debug!(
                uri = %request.uri,
                mode = ?self.splitter.mode(),
                parts = self.splitter.parts_delivered(),
                end = ?end,
                "get finished"
            );
        } else {
            info!(uri = %request.uri, status = status_code, end = ?end, "get returned non-200");
        }

        Ok(Response {
            status_code,
            content_type,
            headers,
            parts_delivered: self.splitter.parts_delivered(),
            malformed_parts: self.splitter.malformed_parts(),
            end,
        })
    }
}

/// Routes transport events for one call into the splitter.
struct CallSink<'a, F> {
    splitter: &'a mut MultipartSplitter,
    on_part: &'a mut F,
    /// Header lines of the latest response seen; cleared at each status line.
    headers: Vec<String>,
    status_code: u32,
    content_type: Option<String>,
    failure: Option<GetError>,
    discarded: bool,
}

impl<F> TransferSink for CallSink<'_, F>
where
    F: FnMut(&Part<'_>) -> Flow,
{
    fn on_header(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end();
        if text.starts_with("HTTP/") {
            // Redirects and auth challenges each start a new header block.
            self.headers.clear();
            self.content_type = None;
            self.status_code = parse_status_line(text).unwrap_or(0);
            return;
        }
        if text.is_empty() {
            return;
        }
        if let Some((name, value)) = text.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                self.content_type = Some(value.trim().to_string());
            }
        }
        self.headers.push(text.to_string());
    }

    fn on_data(&mut self, chunk: &[u8]) -> Flow {
        if self.discarded || self.failure.is_some() {
            return Flow::Stop;
        }
        if self.status_code != 200 {
            debug!(status = self.status_code, "not parsing body of non-200 response");
            self.discarded = true;
            return Flow::Stop;
        }
        match self
            .splitter
            .push(self.content_type.as_deref(), chunk, &mut *self.on_part)
        {
            Ok(flow) => flow,
            Err(SplitError::SizeLimit { limit }) => {
                self.failure = Some(GetError::SizeLimit { limit });
                Flow::Stop
            }
        }
    }
}

/// Status code from a line like `HTTP/1.1 200 OK` or `HTTP/2 404`.
fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
