//! `mxget probe` – read a stream in the background and report the frame rate.

use anyhow::{bail, Context, Result};
use mxget_core::config::MxConfig;
use mxget_core::{CurlTransport, ExitReason, FrameReader, Request};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn run_probe(cfg: &MxConfig, request: Request, seconds: u64) -> Result<()> {
    let uri = request.uri.clone();
    let reader = FrameReader::spawn(
        CurlTransport::new(cfg.transport.clone()),
        request,
        cfg.reader.queue_depth,
    )
    .context("starting reader thread")?;

    let started = Instant::now();
    let deadline = started + Duration::from_secs(seconds.max(1));
    let mut frames = 0u64;
    let mut bytes = 0u64;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match reader.next_frame(left.min(POLL_INTERVAL)) {
            Some(frame) => {
                frames += 1;
                bytes += frame.payload.len() as u64;
            }
            None if reader.is_finished() => break,
            None => {}
        }
    }
    let elapsed = started.elapsed().as_secs_f64();
    let exit = reader.join();

    tracing::info!(
        uri = %uri,
        frames,
        calls = exit.calls,
        dropped = exit.dropped,
        "probe finished"
    );
    println!(
        "{} frames in {:.1}s ({:.2} fps), {} bytes, {} connection(s), {} dropped",
        frames,
        elapsed,
        frames as f64 / elapsed.max(f64::EPSILON),
        bytes,
        exit.calls,
        exit.dropped
    );

    match exit.reason {
        ExitReason::Shutdown | ExitReason::Disconnected => Ok(()),
        ExitReason::Status(0) => bail!("could not reach {}", uri),
        ExitReason::Status(code) => bail!("{} returned HTTP status {}", uri, code),
        ExitReason::Error(e) => Err(e).context(format!("reading {}", uri)),
        ExitReason::Panicked => bail!("reader thread panicked"),
    }
}
