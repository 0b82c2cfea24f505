//! Mock Bot API server for adapter tests
//!
//! A minimal HTTP/1.1 server on a local port that:
#![allow(dead_code)] // Test utility module - not all methods used in every test
//! - Records every method call with its JSON body
//! - Answers with scripted responses per method, `{"ok":true,"result":true}`
//!   otherwise
//! - Delays responses to exercise client timeouts

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    task::JoinHandle,
};

/// One request received by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    /// Everything after `/bot`, e.g. `123:abc/sendMessage`
    pub path: String,
    pub method: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl ScriptedResponse {
    pub fn ok(result: &Value) -> Self {
        Self {
            status: 200,
            body: serde_json::json!({ "ok": true, "result": result }).to_string(),
            delay: None,
        }
    }

    pub fn error(code: u16, description: &str) -> Self {
        Self {
            status: code,
            body: serde_json::json!({
                "ok": false,
                "error_code": code,
                "description": description,
            })
            .to_string(),
            delay: None,
        }
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ApiCall>,
    scripts: HashMap<String, VecDeque<ScriptedResponse>>,
}

pub struct MockBotApi {
    addr: SocketAddr,
    state: Arc<RwLock<State>>,
    task: JoinHandle<()>,
}

impl Drop for MockBotApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl MockBotApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(RwLock::new(State::default()));

        let task = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(err) = Self::handle(stream, state).await {
                            tracing::debug!("Mock Bot API connection failed: {err}");
                        }
                    });
                }
            }
        });

        Self { addr, state, task }
    }

    /// Base URL to put into `TelegramConfig::api_base`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer the next call of `method` with `response`
    pub async fn respond(&self, method: &str, response: ScriptedResponse) {
        self.state
            .write()
            .await
            .scripts
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn methods(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .map(|call| call.method)
            .collect()
    }

    async fn handle(
        stream: TcpStream,
        state: Arc<RwLock<State>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let path = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .trim_start_matches("/bot")
            .to_string();
        let method = path.rsplit('/').next().unwrap_or_default().to_string();

        let mut content_length = 0;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':')
                && name.trim().eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse()?;
            }
        }

        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).await?;
        let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

        let response = {
            let mut state = state.write().await;
            state.calls.push(ApiCall {
                path,
                method: method.clone(),
                body,
            });
            state
                .scripts
                .get_mut(&method)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| ScriptedResponse::ok(&Value::Bool(true)))
        };

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = format!(
            "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response.status,
            response.body.len(),
            response.body
        );

        let mut stream = reader.into_inner();
        stream.write_all(reply.as_bytes()).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        Ok(())
    }
}
