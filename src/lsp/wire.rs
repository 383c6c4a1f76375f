//! JSON-RPC 2.0 framing: `Content-Length: N\r\n\r\n{JSON}` over a pipe.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// A framed inbound message: either a response/error (carries `id`) or a
/// notification (no `id`, carries `method`).
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
struct OutboundRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Serialize)]
struct OutboundNotification<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
}

/// Serialize and frame a request, writing it to `writer`.
pub async fn write_request(
    writer: &mut (impl AsyncWrite + Unpin),
    id: u64,
    method: &str,
    params: Value,
) -> std::io::Result<()> {
    let body = OutboundRequest {
        jsonrpc: "2.0",
        id,
        method,
        params,
    };
    write_framed(writer, &body).await
}

/// Serialize and frame a notification (no `id`, no response expected).
pub async fn write_notification(
    writer: &mut (impl AsyncWrite + Unpin),
    method: &str,
    params: Value,
) -> std::io::Result<()> {
    let body = OutboundNotification {
        jsonrpc: "2.0",
        method,
        params,
    };
    write_framed(writer, &body).await
}

async fn write_framed(
    writer: &mut (impl AsyncWrite + Unpin),
    body: &impl Serialize,
) -> std::io::Result<()> {
    let payload = serde_json::to_vec(body)?;
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await
}

/// Read one framed message: header lines until a blank line, then exactly
/// `Content-Length` bytes of JSON. Returns `Ok(None)` on clean EOF before
/// any header bytes are read (the server has exited).
pub async fn read_message(
    reader: &mut (impl AsyncBufRead + Unpin),
) -> std::io::Result<Option<InboundMessage>> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if content_length.is_none() {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream ended mid-header",
            ));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse().map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("bad Content-Length: {e}"))
            })?);
        }
    }

    let len = content_length.ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "missing Content-Length header")
    })?;
    let mut buf = vec![0u8; len];
    tokio::io::AsyncReadExt::read_exact(reader, &mut buf).await?;
    let msg: InboundMessage = serde_json::from_slice(&buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("malformed JSON-RPC frame: {e}")))?;
    Ok(Some(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn round_trips_a_request() {
        let mut buf: Vec<u8> = Vec::new();
        write_request(&mut buf, 7, "textDocument/definition", serde_json::json!({"a": 1}))
            .await
            .expect("write");
        let mut reader = BufReader::new(buf.as_slice());
        let msg = read_message(&mut reader).await.expect("read").expect("some");
        assert_eq!(msg.id, Some(serde_json::json!(7)));
        assert_eq!(msg.method.as_deref(), Some("textDocument/definition"));
    }

    #[tokio::test]
    async fn returns_none_on_clean_eof() {
        let mut reader = BufReader::new(&b""[..]);
        let msg = read_message(&mut reader).await.expect("read");
        assert!(msg.is_none());
    }
}
