//! Stdio transport: newline-delimited JSON-RPC over stdin/stdout.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::dispatch::RequestContext;
use crate::protocol::ProtocolHandler;
use crate::types::McpResult;

const OUTBOUND_CAPACITY: usize = 256;

/// Serves one client over a pair of byte streams. The client gets its own
/// session, registered for the lifetime of the connection.
pub struct StdioTransport {
    handler: ProtocolHandler,
    session_id: String,
    shutdown: CancellationToken,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self {
            handler,
            session_id: uuid::Uuid::new_v4().to_string(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Token that cancels every in-flight request when fired.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn run(&self) -> McpResult<()> {
        let mut stdout = tokio::io::stdout();
        self.serve(tokio::io::stdin(), &mut stdout).await
    }

    /// Serve `reader`/`writer` until `reader` reaches EOF and every request
    /// read so far has been answered.
    ///
    /// Requests run concurrently; replies and notifications are written one
    /// line at a time in completion order.
    pub async fn serve<R, W>(&self, reader: R, writer: &mut W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let server = self.handler.server().clone();
        let mut notifications = server.register_session(&self.session_id).await?;
        tracing::info!(session_id = %self.session_id, "Stdio transport started");

        let ctx = RequestContext::for_session(&self.session_id)
            .with_cancellation(self.shutdown.child_token());
        let (out_tx, mut out_rx) = mpsc::channel::<Value>(OUTBOUND_CAPACITY);

        let forward_tx = out_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                let Ok(value) = serde_json::to_value(&notification) else {
                    continue;
                };
                if forward_tx.send(value).await.is_err() {
                    break;
                }
            }
        });

        let mut lines = BufReader::new(reader).lines();
        let mut tasks = JoinSet::new();
        let mut reading = true;

        let outcome: McpResult<()> = async {
            while reading || !tasks.is_empty() {
                tokio::select! {
                    line = lines.next_line(), if reading => match line? {
                        Some(line) if line.trim().is_empty() => {}
                        Some(line) => {
                            let handler = self.handler.clone();
                            let ctx = ctx.clone();
                            let tx = out_tx.clone();
                            tasks.spawn(async move {
                                if let Some(reply) = handler.handle_raw(&ctx, line.as_bytes()).await {
                                    let _ = tx.send(reply).await;
                                }
                            });
                        }
                        None => reading = false,
                    },
                    Some(value) = out_rx.recv() => write_line(writer, &value).await?,
                    Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                        if let Err(e) = joined {
                            tracing::error!(error = %e, "Request task failed");
                        }
                    }
                }
            }
            Ok(())
        }
        .await;

        self.shutdown.cancel();
        tasks.shutdown().await;
        if let Err(e) = server.unregister_session(&self.session_id).await {
            tracing::warn!(session_id = %self.session_id, error = %e, "Session already gone at shutdown");
        }

        // Ends once the forwarder sees the closed session channel.
        drop(out_tx);
        while let Some(value) = out_rx.recv().await {
            write_line(writer, &value).await?;
        }
        let _ = forwarder.await;

        tracing::info!(session_id = %self.session_id, "Stdio transport stopped");
        outcome
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, value: &Value) -> McpResult<()> {
    let line = serde_json::to_string(value)?;
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
