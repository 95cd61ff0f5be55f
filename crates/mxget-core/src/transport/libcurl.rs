//! libcurl transport (curl crate, `Easy` handle reused across calls).
//!
//! Digest authentication, redirects, TLS and connection reuse all stay inside
//! libcurl; this file only passes configuration through and forwards events.

use std::cell::RefCell;
use std::time::Duration;

use curl::easy::{Auth, Easy, List};
use tracing::debug;

use super::{TransferReport, TransferSink, Transport, TransportError};
use crate::config::TransportConfig;
use crate::part::Flow;
use crate::request::Request;

pub struct CurlTransport {
    easy: Easy,
    config: TransportConfig,
}

impl CurlTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            easy: Easy::new(),
            config,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Applies all options for `request`. Options from a previous call
    /// (custom headers, credentials) are cleared first.
    fn configure(&mut self, request: &Request) -> Result<(), curl::Error> {
        let cfg = &self.config;
        let easy = &mut self.easy;
        easy.reset();
        easy.url(&request.uri)?;
        easy.follow_location(true)?;
        easy.max_redirections(cfg.max_redirections)?;
        easy.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))?;
        // No overall timeout: streams stay open indefinitely. Stalls are caught
        // by the low-speed check instead (limit 0 disables it).
        easy.low_speed_limit(cfg.low_speed_limit_bytes)?;
        easy.low_speed_time(Duration::from_secs(cfg.low_speed_time_secs))?;
        if let Some(ua) = &cfg.user_agent {
            easy.useragent(ua)?;
        }

        if let Some(creds) = &request.credentials {
            let mut auth = Auth::new();
            auth.digest(true);
            easy.http_auth(&auth)?;
            easy.username(&creds.user)?;
            easy.password(&creds.password)?;
        }

        if !request.custom_headers.is_empty() {
            let mut list = List::new();
            for line in &request.custom_headers {
                debug!("adding header: {}", line);
                list.append(line)?;
            }
            easy.http_headers(list)?;
        }
        Ok(())
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl Transport for CurlTransport {
    fn perform(&mut self, request: &Request, sink: &mut dyn TransferSink) -> TransferReport {
        if let Err(e) = self.configure(request) {
            return TransferReport::failed(TransportError::Curl(e));
        }

        let sink = RefCell::new(sink);
        let result = run_transfer(&mut self.easy, &sink);

        let status_code = self.easy.response_code().unwrap_or(0);
        let content_type = self
            .easy
            .content_type()
            .ok()
            .flatten()
            .map(str::to_string);
        let error = match result {
            Ok(()) => None,
            // A short write is how a sink's Stop reaches libcurl.
            Err(e) if e.is_write_error() => Some(TransportError::Aborted),
            Err(e) => {
                debug!("curl perform for {} failed: {}", request.uri, e);
                Some(TransportError::Curl(e))
            }
        };

        TransferReport {
            status_code,
            content_type,
            error,
        }
    }
}

fn run_transfer(easy: &mut Easy, sink: &RefCell<&mut dyn TransferSink>) -> Result<(), curl::Error> {
    let mut transfer = easy.transfer();
    transfer.header_function(|line| {
        sink.borrow_mut().on_header(line);
        true
    })?;
    transfer.write_function(|data| {
        Ok(match sink.borrow_mut().on_data(data) {
            Flow::Continue => data.len(),
            Flow::Stop => 0,
        })
    })?;
    transfer.perform()
}
