use super::*;
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn splits_lines_and_strips_trailing_cr() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let (tx, mut rx) = mpsc::channel(16);
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    let handle = tokio::spawn(run_stream_reader(reader, LogKind::Stdout, tx, cancel_rx));
    writer.write_all(b"hello\r\nworld\n").await.unwrap();
    writer.shutdown().await.unwrap();
    drop(writer);

    let first = rx.recv().await.unwrap();
    assert_eq!(first.content, "hello");
    let second = rx.recv().await.unwrap();
    assert_eq!(second.content, "world");
    assert!(rx.recv().await.is_none());
    handle.await.unwrap();
}

#[tokio::test]
async fn blank_lines_are_dropped() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let (tx, mut rx) = mpsc::channel(16);
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    tokio::spawn(run_stream_reader(reader, LogKind::Stdout, tx, cancel_rx));
    writer.write_all(b"a\n\n\nb\n").await.unwrap();
    writer.shutdown().await.unwrap();
    drop(writer);

    let first = rx.recv().await.unwrap();
    assert_eq!(first.content, "a");
    let second = rx.recv().await.unwrap();
    assert_eq!(second.content, "b");
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn partial_final_line_flushed_on_close() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let (tx, mut rx) = mpsc::channel(16);
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    tokio::spawn(run_stream_reader(reader, LogKind::Stderr, tx, cancel_rx));
    writer.write_all(b"no newline here").await.unwrap();
    writer.shutdown().await.unwrap();
    drop(writer);

    let only = rx.recv().await.unwrap();
    assert_eq!(only.content, "no newline here");
    assert_eq!(only.kind, LogKind::Stderr);
}

#[tokio::test]
async fn cancellation_discards_residual_buffer() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let (tx, mut rx) = mpsc::channel(16);
    let (cancel_tx, cancel_rx) = oneshot::channel();

    let handle = tokio::spawn(run_stream_reader(reader, LogKind::Stdout, tx, cancel_rx));
    writer.write_all(b"partial, no newline").await.unwrap();
    // Give the reader a chance to buffer the partial write before cancelling.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let _ = cancel_tx.send(());
    handle.await.unwrap();

    assert!(rx.recv().await.is_none());
    drop(writer);
}
