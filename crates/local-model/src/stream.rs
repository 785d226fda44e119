use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::types::GenerateResponse;
use crate::{LocalModelError, Result};

// ─── LineDecoder ──────────────────────────────────────────────────────────

/// Splits a chunked byte body into newline-delimited lines.
///
/// Network chunks do not respect line boundaries, so bytes are buffered until
/// a `\n` arrives. Blank lines are dropped.
#[derive(Debug, Default)]
pub(crate) struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1])
                .trim()
                .to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Flush whatever is left after the body ends without a trailing newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        (!rest.is_empty()).then_some(rest)
    }
}

pub(crate) fn parse_line(line: &str) -> Result<GenerateResponse> {
    serde_json::from_str(line).map_err(|source| LocalModelError::Parse {
        line: line.to_string(),
        source,
    })
}

// ─── GenerateStream ───────────────────────────────────────────────────────

/// An async stream of [`GenerateResponse`] chunks from a streamed
/// `/api/generate` call.
///
/// A background task reads the HTTP body, decodes it line by line and
/// forwards each chunk over an mpsc channel. A line that fails to parse is
/// forwarded as an `Err` item and the task keeps reading; the stream ends
/// after the chunk with `done = true`, after a server-side `error`, or when
/// the body ends. Dropping the stream stops the task on its next send.
pub struct GenerateStream {
    rx: mpsc::Receiver<Result<GenerateResponse>>,
}

enum Flow {
    Continue,
    Stop,
}

impl GenerateStream {
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut decoder = LineDecoder::default();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx.send(Err(LocalModelError::Request(e))).await;
                        return;
                    }
                };
                for line in decoder.push(&bytes) {
                    if let Flow::Stop = forward(&tx, &line).await {
                        return;
                    }
                }
            }

            if let Some(line) = decoder.finish() {
                forward(&tx, &line).await;
            }
        });

        GenerateStream { rx }
    }

    /// Wrap a raw receiver. Used by tests to inject chunk sequences.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<GenerateResponse>>) -> Self {
        Self { rx }
    }
}

async fn forward(tx: &mpsc::Sender<Result<GenerateResponse>>, line: &str) -> Flow {
    let item = match parse_line(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed stream line");
            return match tx.send(Err(e)).await {
                Ok(()) => Flow::Continue,
                Err(_) => Flow::Stop,
            };
        }
    };

    if let Some(message) = item.error.clone() {
        let _ = tx.send(Err(LocalModelError::Api(message))).await;
        return Flow::Stop;
    }

    let done = item.done;
    if tx.send(Ok(item)).await.is_err() || done {
        Flow::Stop
    } else {
        Flow::Continue
    }
}

impl Stream for GenerateStream {
    type Item = Result<GenerateResponse>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
