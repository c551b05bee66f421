//! Cancellable conversion of a byte stream into line-delimited log entries.

use supervisor_core::LogKind;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot};

/// One decoded line, not yet timestamped or appended to a process's ring —
/// that happens once it reaches the lifecycle controller, which owns the
/// clock and the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLine {
    pub kind: LogKind,
    pub content: String,
}

/// Read `reader` until it closes or `cancel` fires, sending one
/// [`StreamLine`] per complete line. Blank lines are dropped entirely.
/// Invalid UTF-8 is replaced with the replacement character. A partial
/// final line is flushed on clean stream close but discarded on
/// cancellation.
pub async fn run_stream_reader<R>(
    mut reader: R,
    kind: LogKind,
    lines_tx: mpsc::Sender<StreamLine>,
    mut cancel: oneshot::Receiver<()>,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut raw: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        tokio::select! {
            read = reader.read(&mut buf) => {
                match read {
                    Ok(0) => {
                        flush_partial(&raw, kind, &lines_tx).await;
                        break;
                    }
                    Ok(n) => {
                        raw.extend_from_slice(&buf[..n]);
                        drain_lines(&mut raw, kind, &lines_tx).await;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "stream reader i/o error");
                        let _ = lines_tx
                            .send(StreamLine {
                                kind: LogKind::System,
                                content: format!("stream read error: {err}"),
                            })
                            .await;
                        break;
                    }
                }
            }
            _ = &mut cancel => {
                break;
            }
        }
    }
}

async fn drain_lines(raw: &mut Vec<u8>, kind: LogKind, tx: &mpsc::Sender<StreamLine>) {
    while let Some(pos) = raw.iter().position(|&b| b == b'\n') {
        let mut line: Vec<u8> = raw.drain(..=pos).collect();
        line.pop(); // trailing '\n'
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let content = String::from_utf8_lossy(&line).into_owned();
        if content.is_empty() {
            continue;
        }
        let _ = tx.send(StreamLine { kind, content }).await;
    }
}

async fn flush_partial(raw: &[u8], kind: LogKind, tx: &mpsc::Sender<StreamLine>) {
    if raw.is_empty() {
        return;
    }
    let mut bytes = raw.to_vec();
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    let content = String::from_utf8_lossy(&bytes).into_owned();
    if !content.is_empty() {
        let _ = tx.send(StreamLine { kind, content }).await;
    }
}

#[cfg(test)]
#[path = "stream_reader_tests.rs"]
mod tests;
