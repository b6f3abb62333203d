//! LSP client for a single language server process

use super::service::{symbols_from_response, Document, LanguageService, SymbolNode};
use super::transport::{read_message, write_message};
use super::LspError;
use crate::config::ServerConfig;
use async_trait::async_trait;
use lsp_types::{DocumentSymbolResponse, Location, Position, Url};
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, trace, warn};

/// How long `shutdown` may take and how long the server then has to exit
const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Parsed messages buffered between the reader task and the client
const CHANNEL_BUFFER_SIZE: usize = 64;

/// Client over the stdio pipes of a spawned server
pub type ProcessClient = LspClient<ChildStdin>;

/// LSP client speaking JSON-RPC over any reader/writer pair.
///
/// A background task owns the reader and forwards whole messages over a
/// channel, so a timed-out request never leaves a half-read frame behind.
/// Requests are strictly sequential: each call writes one request and
/// receives until the matching response arrives, answering
/// server-initiated requests and dropping notifications on the way.
pub struct LspClient<W> {
    incoming: mpsc::Receiver<Result<Value, LspError>>,
    reader_task: JoinHandle<()>,
    writer: W,
    next_id: i64,
    language_id: String,
    request_timeout: Option<Duration>,
    shutdown_timeout: Duration,
    child: Option<Child>,
}

impl ProcessClient {
    /// Start the configured server and run the `initialize` handshake
    pub async fn spawn(config: &ServerConfig, root: &Path) -> Result<Self, LspError> {
        let (command, args) = config.command.split_first().ok_or(LspError::EmptyCommand)?;

        debug!(command = %command, args = ?args, root = %root.display(), "Spawning language server");

        let mut child = Command::new(command)
            .args(args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LspError::Spawn {
                command: config.command.join(" "),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::Protocol("server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::Protocol("server stdout unavailable".to_string()))?;

        // Drain stderr so a chatty server never blocks on a full pipe
        if let Some(stderr) = child.stderr.take() {
            let server = command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %server, stderr = %line.trim(), "server stderr");
                }
            });
        }

        let mut client = LspClient::new(BufReader::new(stdout), stdin, config.language_id.clone())
            .with_request_timeout(config.request_timeout_secs.map(Duration::from_secs));
        client.child = Some(child);

        client
            .initialize(root, config.initialization_options.clone())
            .await?;

        info!("Language server initialized: {}", config.command.join(" "));
        Ok(client)
    }
}

impl<W> LspClient<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Must be called inside a tokio runtime; the reader task is spawned here
    pub fn new<R>(reader: R, writer: W, language_id: impl Into<String>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, incoming) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let reader_task = tokio::spawn(forward_messages(reader, tx));

        Self {
            incoming,
            reader_task,
            writer,
            next_id: 1,
            language_id: language_id.into(),
            request_timeout: None,
            shutdown_timeout: EXIT_GRACE_PERIOD,
            child: None,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Option<Duration>) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Bound on the `shutdown` request and on the wait for the process to exit
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// `initialize` request followed by the `initialized` notification
    pub async fn initialize(
        &mut self,
        root: &Path,
        initialization_options: Option<Value>,
    ) -> Result<Value, LspError> {
        let root_uri =
            Url::from_directory_path(root).map_err(|_| LspError::InvalidPath(root.to_path_buf()))?;
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "workspace".to_string());

        let mut params = json!({
            "processId": std::process::id(),
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            },
            "rootUri": root_uri,
            "workspaceFolders": [{ "uri": root_uri, "name": root_name }],
            "capabilities": {
                "textDocument": {
                    "synchronization": { "didSave": false },
                    "documentSymbol": { "hierarchicalDocumentSymbolSupport": true },
                    "references": { "dynamicRegistration": false }
                },
                "workspace": { "workspaceFolders": true, "configuration": true }
            }
        });

        if let (Some(options), Some(obj)) = (initialization_options, params.as_object_mut()) {
            obj.insert("initializationOptions".to_string(), options);
        }

        let result = self.request("initialize", params).await?;
        self.notify("initialized", json!({})).await?;
        Ok(result)
    }

    /// Send a request and wait for its response
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value, LspError> {
        self.request_within(method, params, self.request_timeout).await
    }

    async fn request_within(
        &mut self,
        method: &str,
        params: Value,
        limit: Option<Duration>,
    ) -> Result<Value, LspError> {
        let id = self.next_id;
        self.next_id += 1;

        debug!(lsp_method = %method, lsp_request_id = id, "Sending LSP request");
        write_message(
            &mut self.writer,
            &json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }),
        )
        .await?;

        match limit {
            Some(limit) => timeout(limit, self.await_response(id, method))
                .await
                .map_err(|_| LspError::Timeout(method.to_string()))?,
            None => self.await_response(id, method).await,
        }
    }

    /// Send a notification (no response expected)
    pub async fn notify(&mut self, method: &str, params: Value) -> Result<(), LspError> {
        debug!(lsp_method = %method, "Sending LSP notification");
        write_message(
            &mut self.writer,
            &json!({ "jsonrpc": "2.0", "method": method, "params": params }),
        )
        .await
    }

    async fn await_response(&mut self, id: i64, method: &str) -> Result<Value, LspError> {
        loop {
            let message = self.incoming.recv().await.ok_or(LspError::Closed)??;

            let incoming_method = message.get("method").and_then(Value::as_str);
            let incoming_id = message.get("id");

            match (incoming_method, incoming_id) {
                (Some(server_method), Some(server_id)) => {
                    let server_method = server_method.to_string();
                    let server_id = server_id.clone();
                    self.answer_server_request(server_id, &server_method, message.get("params"))
                        .await?;
                }
                (Some(notification), None) => {
                    if notification == "window/logMessage" || notification == "window/showMessage" {
                        let text = message
                            .pointer("/params/message")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        debug!(server_message = %text, "{}", notification);
                    } else {
                        trace!(lsp_method = %notification, "Ignoring server notification");
                    }
                }
                (None, Some(response_id)) if response_id.as_i64() == Some(id) => {
                    if let Some(error) = message.get("error") {
                        return Err(LspError::Server {
                            method: method.to_string(),
                            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                            message: error
                                .get("message")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        });
                    }
                    return Ok(message.get("result").cloned().unwrap_or(Value::Null));
                }
                (None, Some(stale)) => {
                    debug!(lsp_request_id = %stale, "Dropping response to an abandoned request");
                }
                (None, None) => {
                    return Err(LspError::Protocol(format!(
                        "message without id or method: {}",
                        message
                    )));
                }
            }
        }
    }

    /// Reply to a request the server sent us
    async fn answer_server_request(
        &mut self,
        id: Value,
        method: &str,
        params: Option<&Value>,
    ) -> Result<(), LspError> {
        let result = if method == "workspace/configuration" {
            let items = params
                .and_then(|p| p.get("items"))
                .and_then(Value::as_array)
                .map(|items| items.len())
                .unwrap_or(0);
            Value::Array(vec![Value::Null; items])
        } else {
            Value::Null
        };

        trace!(lsp_method = %method, "Answering server request");
        write_message(
            &mut self.writer,
            &json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        )
        .await
    }

    /// `shutdown` + `exit`, then reap the process if there is one.
    ///
    /// Both the `shutdown` request and the wait for the process are bounded,
    /// so an unresponsive server is killed rather than waited on.
    pub async fn shutdown(mut self) -> Result<(), LspError> {
        let grace = self.shutdown_timeout;
        let result = match self
            .request_within("shutdown", Value::Null, Some(grace))
            .await
        {
            Ok(_) => self.notify("exit", Value::Null).await,
            Err(e) => Err(e),
        };

        if let Some(mut child) = self.child.take() {
            let wait = if result.is_ok() { grace } else { Duration::ZERO };
            match timeout(wait, child.wait()).await {
                Ok(Ok(status)) => debug!(?status, "Language server exited"),
                Ok(Err(e)) => warn!("Failed to wait for language server: {}", e),
                Err(_) => {
                    warn!("Language server did not exit, killing it");
                    child.kill().await?;
                }
            }
        }
        result
    }
}

impl<W> Drop for LspClient<W> {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Reader task: forward whole messages until end of stream or a read error
async fn forward_messages<R>(mut reader: R, tx: mpsc::Sender<Result<Value, LspError>>)
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_message(&mut reader).await {
            Ok(Some(message)) => {
                if tx.send(Ok(message)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                trace!("Language server closed its output");
                break;
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
}

#[async_trait]
impl<W> LanguageService for LspClient<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn open_document(&mut self, path: &Path) -> Result<Document, LspError> {
        let document = Document::new(path)?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LspError::Load {
                path: path.to_path_buf(),
                source,
            })?;

        let params = json!({
            "textDocument": {
                "uri": document.uri,
                "languageId": self.language_id,
                "version": 1,
                "text": text
            }
        });
        self.notify("textDocument/didOpen", params).await?;
        Ok(document)
    }

    async fn document_symbols(
        &mut self,
        document: &Document,
    ) -> Result<Option<Vec<SymbolNode>>, LspError> {
        let result = self
            .request(
                "textDocument/documentSymbol",
                json!({ "textDocument": { "uri": document.uri } }),
            )
            .await?;

        let response: Option<DocumentSymbolResponse> = serde_json::from_value(result)?;
        Ok(response.map(symbols_from_response))
    }

    async fn references(
        &mut self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>, LspError> {
        let result = self
            .request(
                "textDocument/references",
                json!({
                    "textDocument": { "uri": document.uri },
                    "position": position,
                    "context": { "includeDeclaration": true }
                }),
            )
            .await?;

        Ok(serde_json::from_value(result)?)
    }

    async fn close_document(&mut self, document: &Document) -> Result<(), LspError> {
        self.notify(
            "textDocument/didClose",
            json!({ "textDocument": { "uri": document.uri } }),
        )
        .await
    }
}
