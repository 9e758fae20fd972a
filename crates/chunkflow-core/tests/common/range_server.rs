//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves one static body at every path. HEAD returns Content-Length (and
//! `Accept-Ranges: bytes` when ranges are enabled); GET with Range returns 206.
//! Paths under `/old/` answer 301 to the same path under `/new/`; range GETs
//! to them are still logged in [`RangeServer::range_paths`]. POST bodies
//! are read by Content-Length, recorded, and acknowledged with 200.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, GET ignores Range and HEAD omits `Accept-Ranges`.
    pub support_ranges: bool,
    /// Range GETs starting at one of these offsets answer 500.
    pub fail_range_starts: Vec<u64>,
    /// Range GETs starting at one of these offsets send half the body, then close.
    pub truncate_range_starts: Vec<u64>,
    /// Sent as `Content-Disposition` on HEAD and GET.
    pub content_disposition: Option<String>,
    /// Sent as `Content-Type` on HEAD and GET.
    pub content_type: Option<String>,
    /// What HEAD declares as `Content-Length`.
    pub head_length: HeadLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadLength {
    Actual,
    Zero,
    Missing,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            fail_range_starts: Vec::new(),
            truncate_range_starts: Vec::new(),
            content_disposition: None,
            content_type: None,
            head_length: HeadLength::Actual,
        }
    }
}

/// One POST the server received.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub content_range: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct RangeServer {
    pub base_url: String,
    range_hits: Arc<Mutex<HashMap<u64, usize>>>,
    range_paths: Arc<Mutex<Vec<String>>>,
    posts: Arc<Mutex<Vec<RecordedPost>>>,
}

impl RangeServer {
    /// URL of `path` on this server (`path` without leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Number of range GETs that started at `start`.
    pub fn range_hits(&self, start: u64) -> usize {
        self.range_hits
            .lock()
            .unwrap()
            .get(&start)
            .copied()
            .unwrap_or(0)
    }

    /// Request paths of every range GET, in arrival order.
    pub fn range_paths(&self) -> Vec<String> {
        self.range_paths.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().unwrap().clone()
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = RangeServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        range_hits: Arc::new(Mutex::new(HashMap::new())),
        range_paths: Arc::new(Mutex::new(Vec::new())),
        posts: Arc::new(Mutex::new(Vec::new())),
    };
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    let shared = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            let shared = shared.clone();
            thread::spawn(move || handle(stream, &body, &opts, &shared));
        }
    });
    server
}

struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// (start, end_inclusive) for `Range: bytes=X-Y`.
    fn range(&self) -> Option<(u64, u64)> {
        let value = self.header("range")?;
        let spec = value.strip_prefix("bytes=")?;
        let (a, b) = spec.split_once('-')?;
        let start = a.trim().parse().ok()?;
        let end = if b.trim().is_empty() {
            u64::MAX
        } else {
            b.trim().parse().ok()?
        };
        Some((start, end))
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };
    let head = std::str::from_utf8(&raw[..header_end]).ok()?;
    let mut lines = head.split("\r\n");
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let mut body = raw[header_end + 4..].to_vec();
    let len = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while body.len() < len {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some(Request {
        method,
        path,
        headers,
        body,
    })
}

fn extra_headers(opts: &RangeServerOptions) -> String {
    let mut out = String::new();
    if opts.support_ranges {
        out.push_str("Accept-Ranges: bytes\r\n");
    }
    if let Some(cd) = &opts.content_disposition {
        out.push_str(&format!("Content-Disposition: {}\r\n", cd));
    }
    if let Some(ct) = &opts.content_type {
        out.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    out
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &RangeServerOptions, server: &RangeServer) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };

    if let Some(rest) = req.path.strip_prefix("/old/") {
        if req.range().is_some() {
            server.range_paths.lock().unwrap().push(req.path.clone());
        }
        let response = format!(
            "HTTP/1.1 301 Moved Permanently\r\nLocation: /new/{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            rest
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let total = body.len() as u64;
    match req.method.as_str() {
        "HEAD" => {
            if !opts.head_allowed {
                let _ = stream.write_all(
                    b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                );
                return;
            }
            let length = match opts.head_length {
                HeadLength::Actual => format!("Content-Length: {}\r\n", total),
                HeadLength::Zero => "Content-Length: 0\r\n".to_string(),
                HeadLength::Missing => String::new(),
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\n{}{}Connection: close\r\n\r\n",
                length,
                extra_headers(opts)
            );
            let _ = stream.write_all(response.as_bytes());
        }
        "GET" => {
            let range = if opts.support_ranges { req.range() } else { None };
            let Some((start, end_incl)) = range else {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
                    total,
                    extra_headers(opts)
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.write_all(body);
                return;
            };
            *server.range_hits.lock().unwrap().entry(start).or_insert(0) += 1;
            server.range_paths.lock().unwrap().push(req.path.clone());

            if opts.fail_range_starts.contains(&start) {
                let _ = stream.write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                );
                return;
            }
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl {
                let response = format!(
                    "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    total
                );
                let _ = stream.write_all(response.as_bytes());
                return;
            }
            let slice = &body[start as usize..=end_incl as usize];
            let response = format!(
                "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\n{}Connection: close\r\n\r\n",
                slice.len(),
                start,
                end_incl,
                total,
                extra_headers(opts)
            );
            let _ = stream.write_all(response.as_bytes());
            if opts.truncate_range_starts.contains(&start) {
                let _ = stream.write_all(&slice[..slice.len() / 2]);
                let _ = stream.shutdown(std::net::Shutdown::Both);
                return;
            }
            let _ = stream.write_all(slice);
        }
        "POST" => {
            server.posts.lock().unwrap().push(RecordedPost {
                content_range: req.header("content-range").map(str::to_string),
                content_type: req.header("content-type").map(str::to_string),
                body: req.body,
            });
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
        }
        _ => {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}
