// WebSocket subscriber stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::publisher::Subscription;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

const BANNER: &str = "portpulse: port statistics relay";

/// `/` streams statistics to WebSocket clients and answers plain GETs with a banner.
pub(super) async fn root(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    state: State<AppState>,
) -> Response {
    match ws {
        Ok(ws) => ws_statistics(ws, state).await.into_response(),
        Err(_) => BANNER.into_response(),
    }
}

pub(super) async fn ws_statistics(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let publisher = state.publisher.clone();
    ws.on_upgrade(move |socket| async move {
        stream_statistics(socket, publisher.subscribe()).await;
    })
}

/// Sends `msg` within `WS_SEND_TIMEOUT`. False means the subscriber is gone or too slow.
async fn send_bounded(socket: &mut WebSocket, msg: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(msg)).await, Ok(Ok(())))
}

async fn stream_statistics(mut socket: WebSocket, mut subscription: Subscription) {
    tracing::info!("Client connected to statistics stream");

    let mut initial = subscription.latest.take();
    if let Some(payload) = &initial
        && !send_bounded(&mut socket, Message::Text(payload.to_string().into())).await
    {
        return;
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick completes immediately.
    ping_interval.tick().await;
    loop {
        tokio::select! {
            result = subscription.rx.recv() => {
                match result {
                    Ok(payload) => {
                        // Published between subscribe and the latest read: already sent.
                        if initial.take().is_some_and(|sent| Arc::ptr_eq(&sent, &payload)) {
                            continue;
                        }
                        if !send_bounded(&mut socket, Message::Text(payload.to_string().into())).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket client lagged, skipped {} payloads", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            inbound = socket.recv() => {
                // Inbound messages are ignored; only a close or error ends the stream.
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                if !send_bounded(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from statistics stream");
}
