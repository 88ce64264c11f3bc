//! Order feed WebSocket endpoint
//!
//! GET /api/orders/feed
//!
//! Protocol (server to client only):
//! - `ready { epoch }` on connect: a changed epoch means the server
//!   restarted and the client must do a full re-fetch
//! - `event { ... }` for each order event: a prompt to re-fetch, not state
//! - `resync` when this subscriber lagged and events were dropped: the
//!   client re-fetches everything it displays
//!
//! Multiple kitchen displays converge because every message funnels them to
//! the same authoritative reads.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use shared::order::OrderEvent;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::state::AppState;

/// Keepalive ping interval
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Messages pushed to feed subscribers
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedMessage {
    Ready { epoch: String },
    Event { event: OrderEvent },
    Resync,
}

/// GET /api/orders/feed
pub async fn order_feed(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| feed_session(socket, state))
}

async fn feed_session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.feed.subscribe();

    tracing::info!("Feed subscriber connected");

    let ready = FeedMessage::Ready {
        epoch: state.feed.epoch().to_string(),
    };
    if send_message(&mut sink, &ready).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if send_message(&mut sink, &FeedMessage::Event { event }).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "Feed subscriber lagged, prompting resync");
                        if send_message(&mut sink, &FeedMessage::Resync).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Pongs and any client chatter are ignored; the feed is one-way
                    _ => {}
                }
            }
        }
    }

    tracing::info!("Feed subscriber disconnected");
}

async fn send_message(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    message: &FeedMessage,
) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!(%e, "Failed to serialize feed message");
            return Err(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
