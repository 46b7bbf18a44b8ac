//! In-process mock of the face unlock daemon
//!
//! Binds a Unix socket in a temporary directory and serves every
//! connection on its own thread, the way the real daemon answers one JSON
//! object per connection. Tests choose the daemon's [`Behavior`] and
//! inspect what it received afterwards.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// Computes a reply from the requested user name.
pub type Responder = Arc<dyn Fn(&str) -> Vec<u8> + Send + Sync>;

/// How the mock daemon treats each connection
#[derive(Clone)]
#[allow(dead_code)]
pub enum Behavior {
    /// Write these bytes, then wait for the client to hang up
    Reply(Vec<u8>),
    /// Wait, then write a reply computed from the user
    PerUser(Responder, Duration),
    /// Read the request and never answer
    Silent,
    /// Close right after reading the request
    HangUp,
}

/// A running mock daemon
#[allow(dead_code)]
pub struct MockDaemon {
    _dir: TempDir,
    path: PathBuf,
    connections: Arc<AtomicUsize>,
    client_closes: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

#[allow(dead_code)]
impl MockDaemon {
    /// Bind a fresh socket and start serving with `behavior`.
    pub fn start(behavior: Behavior) -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let path = dir.path().join("faceunlock.sock");
        let listener = UnixListener::bind(&path).expect("failed to bind mock daemon socket");

        let connections = Arc::new(AtomicUsize::new(0));
        let client_closes = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = (
            Arc::clone(&connections),
            Arc::clone(&client_closes),
            Arc::clone(&requests),
        );
        thread::spawn(move || {
            let (connections, client_closes, requests) = state;
            for conn in listener.incoming() {
                let conn = match conn {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                connections.fetch_add(1, Ordering::SeqCst);

                let behavior = behavior.clone();
                let client_closes = Arc::clone(&client_closes);
                let requests = Arc::clone(&requests);
                thread::spawn(move || serve(conn, behavior, client_closes, requests));
            }
        });

        Self {
            _dir: dir,
            path,
            connections,
            client_closes,
            requests,
        }
    }

    /// Socket path the daemon listens on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Requests received so far, parsed as JSON.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until `expected` clients have closed their end, or `within`
    /// elapses, and return the number observed.
    pub fn wait_for_client_closes(&self, expected: usize, within: Duration) -> usize {
        let deadline = Instant::now() + within;
        while Instant::now() < deadline {
            let closes = self.client_closes.load(Ordering::SeqCst);
            if closes >= expected {
                return closes;
            }
            thread::sleep(Duration::from_millis(10));
        }
        self.client_closes.load(Ordering::SeqCst)
    }
}

/// A socket path with a socket file but nobody listening.
#[allow(dead_code)]
pub fn stale_socket() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let path = dir.path().join("stale.sock");
    drop(UnixListener::bind(&path).expect("failed to bind stale socket"));
    (dir, path)
}

fn serve(
    mut conn: UnixStream,
    behavior: Behavior,
    client_closes: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
) {
    let request = match read_request(&mut conn) {
        Some(request) => request,
        None => return,
    };
    let user = request["user"].as_str().unwrap_or_default().to_string();
    requests.lock().unwrap().push(request);

    match behavior {
        Behavior::Reply(bytes) => {
            let _ = conn.write_all(&bytes);
        }
        Behavior::PerUser(responder, delay) => {
            thread::sleep(delay);
            let _ = conn.write_all(&responder(&user));
        }
        Behavior::Silent => {}
        Behavior::HangUp => return,
    }

    if wait_for_eof(&mut conn) {
        client_closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn read_request(conn: &mut UnixStream) -> Option<serde_json::Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = conn.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Ok(value) = serde_json::from_slice(&buf) {
            return Some(value);
        }
    }
}

fn wait_for_eof(conn: &mut UnixStream) -> bool {
    let mut sink = [0u8; 64];
    loop {
        match conn.read(&mut sink) {
            Ok(0) => return true,
            Ok(_) => continue,
            Err(_) => return false,
        }
    }
}
