//! Shared test utilities
#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ghostreply::generator::ReplyGenerator;
use ghostreply::session::ReaderInput;
use ghostreply::sink::ReplySink;
use ghostreply::{
    Blocklist, Correspondent, Error, Message, MessageStore, SessionController, SessionState,
};
use rusqlite::Connection;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Fixed instant plus `secs`
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn msg(text: Option<&str>, secs: i64, is_from_me: bool) -> Message {
    Message {
        text: text.map(ToString::to_string),
        timestamp: at(secs),
        is_from_me,
    }
}

/// Store serving a fixed history and recording requested limits
#[derive(Clone, Default)]
pub struct MockStore {
    pub messages: Vec<Message>,
    pub limits: Arc<Mutex<Vec<u32>>>,
    pub fail: bool,
}

impl MockStore {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn limits(&self) -> Vec<u32> {
        self.limits.lock().await.clone()
    }
}

#[async_trait]
impl MessageStore for MockStore {
    async fn fetch(&self, _correspondent: &str, limit: u32) -> ghostreply::Result<Vec<Message>> {
        self.limits.lock().await.push(limit);
        if self.fail {
            return Err(Error::Store("database is locked".to_string()));
        }
        let limit = limit as usize;
        let skip = self.messages.len().saturating_sub(limit);
        Ok(self.messages[skip..].to_vec())
    }
}

/// One recorded completion request
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub prompt: String,
    pub model: String,
    pub stop: Vec<String>,
}

/// Generator answering `reply 1`, `reply 2`, ... and recording requests
#[derive(Clone, Default)]
pub struct MockGenerator {
    pub calls: Arc<Mutex<Vec<CompletionCall>>>,
    pub fail: bool,
}

impl MockGenerator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ReplyGenerator for MockGenerator {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        stop: &[&str],
    ) -> ghostreply::Result<String> {
        let mut calls = self.calls.lock().await;
        calls.push(CompletionCall {
            prompt: prompt.to_string(),
            model: model.to_string(),
            stop: stop.iter().map(ToString::to_string).collect(),
        });
        if self.fail {
            return Err(Error::Generator("429 Too Many Requests".to_string()));
        }
        Ok(format!("reply {}", calls.len()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Sink recording every attempted send
#[derive(Clone)]
pub struct MockSink {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub succeed: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            succeed: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            ..Self::new()
        }
    }

    pub async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ReplySink for MockSink {
    async fn send(&self, text: &str) -> bool {
        self.sent.lock().await.push(text.to_string());
        self.succeed
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Controller talking to "Sam" with depth 2 and "foo" blocked
pub fn controller(
    store: &MockStore,
    generator: &MockGenerator,
    sink: &MockSink,
) -> SessionController {
    SessionController::new(
        Correspondent {
            id: "5551234567".to_string(),
            name: "Sam".to_string(),
        },
        SessionState::new("gpt-test", 2, ""),
        Blocklist::from_words(["foo"]),
        Arc::new(store.clone()),
        Arc::new(generator.clone()),
        Arc::new(sink.clone()),
    )
}

/// Run a scripted session and return its result and output
pub async fn run_script(
    controller: &mut SessionController,
    script: &str,
) -> (ghostreply::Result<()>, String) {
    let mut input = ReaderInput::new(Cursor::new(script.to_string()));
    let mut out = Vec::new();
    let result = controller.run(&mut input, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

/// Create a minimal Messages database at `path`
pub fn create_chat_db(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE handle (
             ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
             id TEXT NOT NULL,
             service TEXT NOT NULL DEFAULT 'iMessage'
         );
         CREATE TABLE message (
             ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
             text TEXT,
             date INTEGER NOT NULL DEFAULT 0,
             is_from_me INTEGER NOT NULL DEFAULT 0,
             handle_id INTEGER NOT NULL DEFAULT 0,
             item_type INTEGER NOT NULL DEFAULT 0,
             associated_message_type INTEGER NOT NULL DEFAULT 0
         );",
    )
    .unwrap();
    conn
}

pub fn insert_handle(conn: &Connection, id: &str) -> i64 {
    conn.execute("INSERT INTO handle (id) VALUES (?1)", [id])
        .unwrap();
    conn.last_insert_rowid()
}

pub fn insert_message(
    conn: &Connection,
    handle_id: i64,
    text: Option<&str>,
    date: i64,
    is_from_me: bool,
    item_type: i64,
    associated_message_type: i64,
) {
    conn.execute(
        "INSERT INTO message (text, date, is_from_me, handle_id, item_type, associated_message_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![text, date, is_from_me, handle_id, item_type, associated_message_type],
    )
    .unwrap();
}

/// Serve one canned HTTP response; the handle yields the raw request
pub async fn serve_once(
    status: &'static str,
    body: String,
) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}/v1"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}
