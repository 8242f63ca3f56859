//! WebSocket 订阅会话
//!
//! 协议:
//! - Server → Client: `{"topic": "orderUpdated", "order": {...}}` (每个事件一条文本帧)
//! - Client → Server: 无业务消息，仅 Close / Pong

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::AppError;
use shared::message::{OrderEvent, Topic};
use tokio::time::Duration;

use crate::auth::context::bearer_token;
use crate::core::ServerState;
use crate::message::Subscription;
use crate::security_log;

/// 心跳间隔
const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

/// GET /api/subscriptions/{topic}
pub async fn subscribe(
    State(state): State<ServerState>,
    Path(topic): Path<String>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let topic: Topic = topic
        .parse()
        .map_err(|e: String| AppError::invalid_field("topic", e))?;

    let header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header)
        .or_else(|| query.token.as_deref().map(str::trim).filter(|t| !t.is_empty()))
        .ok_or_else(|| {
            security_log!("WARN", "auth_missing", uri = "/api/subscriptions");
            AppError::not_authenticated()
        })?;

    let ctx = state.resolver().resolve_token(token).inspect_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.message.as_str(),
            uri = "/api/subscriptions"
        );
    })?;
    let user_id = ctx.require_identity()?.id.clone();

    // 升级前订阅，握手期间提交的事件也不会错过
    let subscription = state.broadcaster.subscribe(topic);
    Ok(ws.on_upgrade(move |socket| subscription_session(socket, subscription, user_id)))
}

async fn subscription_session(socket: WebSocket, mut subscription: Subscription, user_id: String) {
    let (mut sink, mut stream) = socket.split();
    let topic = subscription.topic();

    tracing::info!(user_id = %user_id, topic = %topic, "Subscription WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = subscription.next() => {
                match event {
                    Some(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(user_id = %user_id, topic = %topic, "Subscription WS disconnected");
}

async fn send_event<S>(sink: &mut S, event: &OrderEvent) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|e| {
        tracing::error!("Failed to serialize order event: {e}");
    })?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
