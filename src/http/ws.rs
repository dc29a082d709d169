//! WebSocket subscriber sessions.
//!
//! Each connection gets a bounded queue registered with the hub, a writer
//! task that drains it with a per-write timeout, and a reader loop that only
//! watches for the remote side going away.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;

use crate::context::AppContext;
use crate::error::log_hub_error;
use crate::hub::QueueSink;

pub async fn ws_handler(ws: WebSocketUpgrade, State(context): State<AppContext>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, context))
}

async fn run_session(socket: WebSocket, context: AppContext) {
    let hub = Arc::clone(context.hub());
    let server = &context.config().server;
    let write_timeout = server.write_timeout();

    let id = hub.next_subscriber_id();
    let (sink, mut queue) = QueueSink::channel(server.subscriber_queue);
    if let Err(err) = hub.subscribe(id, Arc::new(sink)) {
        log_hub_error(&err, "ws::run_session");
        return;
    }
    tracing::debug!(subscriber = %id, "websocket subscriber connected");

    let (mut sender, mut receiver) = socket.split();

    let mut writer: JoinHandle<Result<(), String>> = tokio::spawn(async move {
        while let Some(payload) = queue.recv().await {
            let write = sender.send(Message::Text(payload.to_string()));
            match tokio::time::timeout(write_timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(format!("write failed: {err}")),
                Err(_) => return Err(format!("write timed out after {write_timeout:?}")),
            }
        }
        // Queue closed: the hub pruned this subscriber
        let _ = tokio::time::timeout(write_timeout, sender.send(Message::Close(None))).await;
        Err("dropped by hub".to_string())
    });

    let mut reader: JoinHandle<Result<(), String>> = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Close(_)) => return Ok(()),
                Ok(_) => {}
                Err(err) => return Err(format!("read failed: {err}")),
            }
        }
        Ok(())
    });

    let outcome = tokio::select! {
        result = &mut writer => {
            reader.abort();
            result
        }
        result = &mut reader => {
            writer.abort();
            result
        }
    };

    if let Err(err) = hub.unsubscribe(id) {
        log_hub_error(&err, "ws::run_session");
    }

    match outcome {
        Ok(Ok(())) => tracing::debug!(subscriber = %id, "websocket subscriber closed"),
        Ok(Err(reason)) => tracing::debug!(subscriber = %id, "websocket session ended: {reason}"),
        Err(err) => tracing::warn!(subscriber = %id, "websocket task failed: {err}"),
    }
}
