//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed routes: still images, finite or endless
//! `multipart/x-mixed-replace` streams, redirects, and bare status codes.
//! Every connection gets its own thread; bodies are sent without
//! Content-Length where the length is open-ended and the connection is
//! closed afterwards.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with Content-Length.
    Image { content_type: String, body: Vec<u8> },
    /// Multipart stream of `frames`, then `--boundary--` if `final_marker`, then close.
    Stream {
        boundary: String,
        frames: Vec<Vec<u8>>,
        final_marker: bool,
    },
    /// Multipart stream that repeats numbered frames until the client goes away.
    Endless { boundary: String },
    /// Multipart content type, then `len` bytes that never contain the boundary.
    NoBoundary { boundary: String, len: usize },
    /// 302 to another path.
    Redirect(String),
    Status(u16),
}

pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Raw request heads received so far, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, route)| (path.to_string(), route))
            .collect(),
    );
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log));
        }
    });
    TestServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

/// A URL on a port nobody listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

/// Builds one multipart frame as the server writes it.
pub fn frame_bytes(boundary: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        boundary,
        payload.len()
    )
    .into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n");
    out
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let head = match read_head(&mut stream) {
        Some(h) => h,
        None => return,
    };
    log.lock().unwrap().push(head.clone());
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    match routes.get(&path) {
        None => {
            let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nnot found");
        }
        Some(Route::Status(code)) => {
            let body = format!("status {}", code);
            let _ = stream.write_all(
                format!(
                    "HTTP/1.1 {} Status\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                    code,
                    body.len(),
                    body
                )
                .as_bytes(),
            );
        }
        Some(Route::Redirect(target)) => {
            let _ = stream.write_all(
                format!(
                    "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\n\r\n",
                    target
                )
                .as_bytes(),
            );
        }
        Some(Route::Image { content_type, body }) => {
            let _ = stream.write_all(
                format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
                    content_type,
                    body.len()
                )
                .as_bytes(),
            );
            let _ = stream.write_all(body);
        }
        Some(Route::Stream {
            boundary,
            frames,
            final_marker,
        }) => {
            if write_stream_head(&mut stream, boundary).is_err() {
                return;
            }
            for frame in frames {
                // Split writes so frames rarely line up with reads.
                let bytes = frame_bytes(boundary, frame);
                for piece in bytes.chunks(13) {
                    if stream.write_all(piece).is_err() {
                        return;
                    }
                }
                let _ = stream.flush();
            }
            if *final_marker {
                let _ = stream.write_all(format!("--{}--\r\n", boundary).as_bytes());
            }
        }
        Some(Route::Endless { boundary }) => {
            if write_stream_head(&mut stream, boundary).is_err() {
                return;
            }
            for seq in 0u64.. {
                let payload = format!("frame {}", seq);
                if stream
                    .write_all(&frame_bytes(boundary, payload.as_bytes()))
                    .is_err()
                {
                    return;
                }
                thread::sleep(Duration::from_millis(2));
            }
        }
        Some(Route::NoBoundary { boundary, len }) => {
            if write_stream_head(&mut stream, boundary).is_err() {
                return;
            }
            let junk = vec![b'x'; *len];
            let _ = stream.write_all(&junk);
        }
    }
}

fn write_stream_head(stream: &mut TcpStream, boundary: &str) -> std::io::Result<()> {
    stream.write_all(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary={}\r\nConnection: close\r\n\r\n",
            boundary
        )
        .as_bytes(),
    )
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(buf).ok()
}
