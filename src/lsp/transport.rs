//! Content-Length framing for JSON-RPC over a byte stream

use super::LspError;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Largest message body accepted from the server
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// Write one framed message and flush
pub async fn write_message<W>(writer: &mut W, message: &Value) -> Result<(), LspError>
where
    W: AsyncWrite + Unpin,
{
    let content = serde_json::to_string(message)?;
    let frame = format!("Content-Length: {}\r\n\r\n{}", content.len(), content);
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    trace!(bytes = content.len(), "wrote message");
    Ok(())
}

/// Read one framed message. Returns `None` on a clean end of stream.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, LspError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return if content_length.is_none() {
                Ok(None)
            } else {
                Err(LspError::Closed)
            };
        }

        let header = line.trim();
        if header.is_empty() {
            if content_length.is_some() {
                break;
            }
            // Stray blank line between messages
            continue;
        }

        content_length = parse_content_length(header).or(content_length);
    }

    let length = content_length
        .ok_or_else(|| LspError::Protocol("missing Content-Length header".to_string()))?;
    if length > MAX_CONTENT_LENGTH {
        return Err(LspError::Protocol(format!(
            "Content-Length {} exceeds the {} byte limit",
            length, MAX_CONTENT_LENGTH
        )));
    }
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    trace!(bytes = length, "read message");

    Ok(Some(serde_json::from_slice(&body)?))
}

/// Parse a `Content-Length: N` header line (name is case-insensitive)
fn parse_content_length(header: &str) -> Option<usize> {
    let (name, value) = header.split_once(':')?;
    if name.trim().eq_ignore_ascii_case("content-length") {
        value.trim().parse().ok()
    } else {
        None
    }
}
