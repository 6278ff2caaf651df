//! Minimal HTTP/1.1 server that imitates the backup endpoints for integration tests.
//!
//! `POST` returns a fixed start response; `GET` replays a scripted list of
//! status responses (repeating the last one); `DELETE` returns 204. Every
//! request is counted per method.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One canned response: status code and JSON body.
pub type Reply = (u32, String);

pub fn json_status(id: &str, status: &str) -> Reply {
    (
        200,
        format!(r#"{{"id":"{id}","backend":"filesystem","path":"/tmp/backups/{id}","status":"{status}"}}"#),
    )
}

pub fn json_failed(id: &str, error: &str) -> Reply {
    (
        200,
        format!(r#"{{"id":"{id}","backend":"filesystem","status":"FAILED","error":"{error}"}}"#),
    )
}

pub fn error_reply(code: u32, message: &str) -> Reply {
    (code, format!(r#"{{"error":[{{"message":"{message}"}}]}}"#))
}

#[derive(Default)]
pub struct Counters {
    pub posts: AtomicUsize,
    pub gets: AtomicUsize,
    pub deletes: AtomicUsize,
    pub last_post_body: Mutex<String>,
    pub last_path: Mutex<String>,
}

impl Counters {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

pub struct BackupServer {
    pub url: String,
    pub counters: Arc<Counters>,
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(start_reply: Reply, status_script: Vec<Reply>) -> BackupServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let counters = Arc::new(Counters::default());
    let script = Arc::new(Mutex::new(VecDeque::from(status_script)));
    let start_reply = Arc::new(start_reply);
    {
        let counters = Arc::clone(&counters);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let counters = Arc::clone(&counters);
                let script = Arc::clone(&script);
                let start_reply = Arc::clone(&start_reply);
                thread::spawn(move || handle(stream, &start_reply, &script, &counters));
            }
        });
    }
    BackupServer {
        url: format!("http://127.0.0.1:{}", port),
        counters,
    }
}

fn handle(
    mut stream: TcpStream,
    start_reply: &Reply,
    script: &Mutex<VecDeque<Reply>>,
    counters: &Counters,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let (head, body) = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    let first_line = head.lines().next().unwrap_or("");
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("").to_string();
    *counters.last_path.lock().unwrap() = path;

    let (code, body) = match method {
        "POST" => {
            counters.posts.fetch_add(1, Ordering::SeqCst);
            *counters.last_post_body.lock().unwrap() = body;
            start_reply.clone()
        }
        "GET" => {
            counters.gets.fetch_add(1, Ordering::SeqCst);
            let mut q = script.lock().unwrap();
            if q.len() > 1 {
                q.pop_front().unwrap()
            } else {
                q.front().cloned().unwrap_or_else(|| (404, String::new()))
            }
        }
        "DELETE" => {
            counters.deletes.fetch_add(1, Ordering::SeqCst);
            (204, String::new())
        }
        _ => (405, String::new()),
    };

    let reason = match code {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        503 => "Service Unavailable",
        _ => "Error",
    };
    let response = if code == 204 {
        format!("HTTP/1.1 204 {reason}\r\nConnection: close\r\n\r\n")
    } else {
        format!(
            "HTTP/1.1 {code} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Reads the request head and, if `Content-Length` is set, the body.
fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < head_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let body = String::from_utf8_lossy(&data[head_end..]).to_string();
    Some((head, body))
}
