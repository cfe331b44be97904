use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::connection_manager::ConnectionHandle;
use crate::metrics::WsConnectionMetrics;
use crate::server::AppState;

/// WebSocket upgrade handler
#[tracing::instrument(name = "ws.upgrade", skip(ws, state))]
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_start = std::time::Instant::now();
    let ws_config = &state.settings.websocket;

    // Outbound queue drained by the writer task below
    let (tx, rx) = mpsc::channel::<Arc<str>>(ws_config.channel_buffer.max(1));

    let handle = Arc::new(ConnectionHandle::new(tx, ws_config.send_timeout()));
    let connection_id = state.connection_manager.connect(handle.clone());
    WsConnectionMetrics::record_opened();

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let (ws_sender, mut ws_receiver) = socket.split();

    // Task for sending messages from the queue to the WebSocket
    let mut send_task = tokio::spawn(write_loop(ws_sender, rx, handle.clone()));

    // Task for draining client frames; only close and errors matter
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(msg) => {
                    if !process_message(msg, connection_id) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete, then stop the other
    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task completed");
            send_task.abort();
        }
    }

    // No-op if a failed broadcast already evicted this connection
    state.connection_manager.disconnect(connection_id);
    WsConnectionMetrics::record_closed();

    tracing::info!(
        connection_id = %connection_id,
        duration_secs = connection_start.elapsed().as_secs_f64(),
        "WebSocket connection closed"
    );
}

/// Drain the connection's queue into the socket until the queue closes, a
/// write fails, or the handle is closed by eviction.
///
/// A write to a client that stopped reading can stall indefinitely, so each
/// write is raced against the close signal as well.
async fn write_loop<S>(mut sink: S, mut rx: mpsc::Receiver<Arc<str>>, handle: Arc<ConnectionHandle>)
where
    S: Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            _ = handle.closed() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            msg = rx.recv() => {
                let Some(text) = msg else { break };
                tokio::select! {
                    _ = handle.closed() => {
                        tracing::debug!(connection_id = %handle.id, "Closed while a write was pending");
                        break;
                    }
                    sent = sink.send(Message::Text(text.to_string().into())) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Process a received WebSocket frame.
/// Returns false if the connection should be closed.
fn process_message(msg: Message, connection_id: uuid::Uuid) -> bool {
    match msg {
        Message::Text(text) => {
            tracing::trace!(connection_id = %connection_id, len = text.as_str().len(), "Ignoring client text frame");
            true
        }
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Received close frame");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_manager::Subscriber;
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;

    #[test]
    fn test_close_frame_ends_connection() {
        assert!(!process_message(Message::Close(None), Uuid::new_v4()));
    }

    #[test]
    fn test_client_frames_are_ignored() {
        let id = Uuid::new_v4();
        assert!(process_message(Message::Text("hello".into()), id));
        assert!(process_message(Message::Binary(vec![1, 2, 3].into()), id));
        assert!(process_message(Message::Ping(Vec::new().into()), id));
    }

    #[tokio::test]
    async fn test_writer_forwards_text_then_sends_close() {
        let (sink, mut frames) = futures::channel::mpsc::channel::<Message>(8);
        let (tx, rx) = mpsc::channel(4);
        let handle = Arc::new(ConnectionHandle::new(tx, Duration::from_secs(1)));
        let writer = tokio::spawn(write_loop(sink, rx, handle.clone()));

        handle.send(Arc::from(r#"{"event":"INSERT"}"#)).await.unwrap();
        match frames.next().await {
            Some(Message::Text(text)) => assert_eq!(text.as_str(), r#"{"event":"INSERT"}"#),
            other => panic!("expected text frame, got {:?}", other),
        }

        handle.close().await;
        assert!(matches!(frames.next().await, Some(Message::Close(None))));
        timeout(Duration::from_secs(1), writer).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_writer_exits_on_close_while_write_is_stalled() {
        // Capacity one and never drained: the second write blocks forever
        let (sink, _stalled) = futures::channel::mpsc::channel::<Message>(0);
        let (tx, rx) = mpsc::channel(4);
        let handle = Arc::new(ConnectionHandle::new(tx, Duration::from_secs(1)));
        let writer = tokio::spawn(write_loop(sink, rx, handle.clone()));

        handle.send(Arc::from("first")).await.unwrap();
        handle.send(Arc::from("second")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!writer.is_finished());

        handle.close().await;
        timeout(Duration::from_secs(1), writer)
            .await
            .expect("writer must stop once the handle is closed")
            .unwrap();
    }
}
