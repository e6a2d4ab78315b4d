//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! The whole process is one MCP session. Each request runs in its own task
//! so a slow warehouse poll never holds up other calls; a single writer task
//! owns the output so responses never interleave.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::{LogSearchError, Result};
use crate::mcp::McpServer;
use crate::session::{RequestContext, SessionId};

/// Serves the process's stdin and stdout until stdin closes.
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(server, SessionId::generate(), stdin, stdout).await?;
    Ok(())
}

/// Serves newline-delimited requests from `reader`, writing responses to `writer`.
///
/// At end of input, in-flight requests are allowed to finish before the
/// writer is returned. If the writer fails, in-flight requests are aborted.
pub async fn serve_lines<R, W>(
    server: Arc<McpServer>,
    session: SessionId,
    reader: R,
    writer: W,
) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    info!(session = %session, "Serving MCP over stdio");
    let ctx = RequestContext::for_session(session);

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let mut writer_task = tokio::spawn(write_responses(writer, rx));
    let mut requests = JoinSet::new();
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| {
                    LogSearchError::internal(format!("Failed to read stdin: {e}"))
                })?;
                let Some(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }

                let server = Arc::clone(&server);
                let ctx = ctx.clone();
                let tx = tx.clone();
                requests.spawn(async move {
                    let Some(response) = server.handle_message(&line, &ctx).await else {
                        return;
                    };
                    match serde_json::to_string(&response) {
                        Ok(text) => {
                            let _ = tx.send(text);
                        }
                        Err(e) => error!(error = %e, "Failed to serialize response"),
                    }
                });
            }
            Some(finished) = requests.join_next(), if !requests.is_empty() => {
                if let Err(e) = finished {
                    error!(error = %e, "Request task failed");
                }
            }
            written = &mut writer_task => {
                requests.shutdown().await;
                return match written {
                    Ok(Ok(_)) => Err(LogSearchError::internal("stdout writer stopped")),
                    Ok(Err(e)) => Err(LogSearchError::internal(format!("Failed to write stdout: {e}"))),
                    Err(e) => Err(LogSearchError::internal(format!("stdout writer panicked: {e}"))),
                };
            }
        }
    }

    debug!(in_flight = requests.len(), "Input closed; draining requests");
    while let Some(finished) = requests.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "Request task failed");
        }
    }
    drop(tx);

    let writer = writer_task
        .await
        .map_err(|e| LogSearchError::internal(format!("stdout writer panicked: {e}")))?
        .map_err(|e| LogSearchError::internal(format!("Failed to write stdout: {e}")))?;
    info!("stdio session closed");
    Ok(writer)
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(writer)
}
