//! Local HTTP responders for exercising the blocking clients in tests.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// A canned HTTP response
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// A request captured by the stub server
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serves the given responses in order, one connection each.
pub struct StubServer {
    pub url: String,
    requests: Receiver<CapturedRequest>,
}

impl StubServer {
    pub fn start(responses: Vec<StubResponse>) -> Self {
        Self::start_with(|_| responses)
    }

    /// Like `start`, but the responses may embed the server's own URL.
    pub fn start_with<F>(build: F) -> Self
    where
        F: FnOnce(&str) -> Vec<StubResponse>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let responses = build(&url);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let request = read_request(&mut stream);
                write_response(&mut stream, &response);
                if tx.send(request).is_err() {
                    return;
                }
            }
        });

        Self { url, requests: rx }
    }

    /// Next request the server answered, in arrival order
    pub fn next_request(&self) -> CapturedRequest {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("stub server received no request")
    }

    /// Number of requests answered so far
    pub fn request_count(&self) -> usize {
        self.requests.try_iter().count()
    }
}

/// A URL nothing listens on
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break data.len();
        }
        data.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&data) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end.min(data.len())]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = (header_end + 4).min(data.len());
    while data.len() < body_start + content_length {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&data[body_start..]).to_string(),
    }
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn write_response(stream: &mut TcpStream, response: &StubResponse) {
    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.body.as_bytes());
    let _ = stream.flush();
}
