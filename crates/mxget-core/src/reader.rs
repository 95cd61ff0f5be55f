//! Background reader: keeps a stream (or a still-image URL) open on its own
//! thread and queues owned frames for a consumer.
//!
//! The thread calls `get` again each time a call ends with status 200, until
//! the shutdown token is set. Any other status or a `GetError` ends the
//! thread. Frames that arrive while the queue is full are dropped; a live
//! camera should not stall because the consumer is slow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::StreamingClient;
use crate::error::GetError;
use crate::part::{Flow, OwnedPart};
use crate::request::Request;
use crate::transport::Transport;

/// Why the reader thread stopped.
#[derive(Debug)]
pub enum ExitReason {
    /// `stop()` was called (or the reader was dropped).
    Shutdown,
    /// The frame receiver was dropped.
    Disconnected,
    /// A call returned a status other than 200 (0 = never connected).
    Status(u32),
    Error(GetError),
    /// The reader thread panicked.
    Panicked,
}

#[derive(Debug)]
pub struct ReaderExit {
    pub reason: ExitReason,
    /// Number of `get` calls made.
    pub calls: u64,
    /// Frames handed to the queue.
    pub frames: u64,
    /// Frames dropped because the queue was full.
    pub dropped: u64,
}

pub struct FrameReader {
    shutdown: Arc<AtomicBool>,
    frames: Receiver<OwnedPart>,
    handle: Option<JoinHandle<ReaderExit>>,
}

impl FrameReader {
    /// Starts the reader thread. `queue_depth` is clamped to at least 1.
    pub fn spawn<T>(transport: T, request: Request, queue_depth: usize) -> std::io::Result<Self>
    where
        T: Transport + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::sync_channel(queue_depth.max(1));
        let token = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("mxget-reader".to_string())
            .spawn(move || read_loop(StreamingClient::with_transport(transport), request, tx, token))?;
        Ok(Self {
            shutdown,
            frames: rx,
            handle: Some(handle),
        })
    }

    pub fn frames(&self) -> &Receiver<OwnedPart> {
        &self.frames
    }

    /// Next frame, or `None` on timeout or once the reader has exited and the queue is empty.
    pub fn next_frame(&self, timeout: Duration) -> Option<OwnedPart> {
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Requests shutdown. Takes effect at the next part boundary or when the current call returns.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Waits for the thread to exit without requesting shutdown.
    pub fn wait(mut self) -> ReaderExit {
        self.join_thread()
    }

    /// Requests shutdown and waits for the thread.
    pub fn join(mut self) -> ReaderExit {
        self.stop();
        self.join_thread()
    }

    fn join_thread(&mut self) -> ReaderExit {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(ReaderExit {
                reason: ExitReason::Panicked,
                calls: 0,
                frames: 0,
                dropped: 0,
            }),
            None => ReaderExit {
                reason: ExitReason::Shutdown,
                calls: 0,
                frames: 0,
                dropped: 0,
            },
        }
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
            let _ = self.join_thread();
        }
    }
}

fn read_loop<T: Transport>(
    mut client: StreamingClient<T>,
    request: Request,
    tx: SyncSender<OwnedPart>,
    shutdown: Arc<AtomicBool>,
) -> ReaderExit {
    let mut calls = 0u64;
    let mut frames = 0u64;
    let mut dropped = 0u64;
    let mut disconnected = false;

    let reason = loop {
        if shutdown.load(Ordering::Relaxed) {
            break ExitReason::Shutdown;
        }
        calls += 1;
        let result = client.get(&request, |part| {
            if shutdown.load(Ordering::Relaxed) {
                return Flow::Stop;
            }
            if part.payload.is_empty() {
                debug!(index = part.index, "skipping empty frame");
                return Flow::Continue;
            }
            match tx.try_send(part.to_owned_part()) {
                Ok(()) => {
                    frames += 1;
                    Flow::Continue
                }
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    Flow::Continue
                }
                Err(TrySendError::Disconnected(_)) => {
                    disconnected = true;
                    Flow::Stop
                }
            }
        });

        match result {
            Ok(_) if disconnected => break ExitReason::Disconnected,
            Ok(resp) if resp.is_ok() => {
                debug!(calls, frames, end = ?resp.end, "reader call ended, reconnecting");
            }
            Ok(resp) => {
                warn!(
                    "failed to read from {}: status {}",
                    request.uri, resp.status_code
                );
                break ExitReason::Status(resp.status_code);
            }
            Err(e) => {
                warn!("failed to read from {}: {}", request.uri, e);
                break ExitReason::Error(e);
            }
        }
    };

    debug!(calls, frames, dropped, reason = ?reason, "reader thread exiting");
    ReaderExit {
        reason,
        calls,
        frames,
        dropped,
    }
}
