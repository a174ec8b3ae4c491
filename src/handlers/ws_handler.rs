use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::config::AppState;
use crate::dto::ClientEvent;
use crate::interceptors::AppError;
use crate::services::SubscriptionService;
use crate::utils::validate_request;

/// Upgrade to the job status socket.
///
/// Clients send `join` / `leave` frames naming a (queue, job) pair and receive
/// `job_status` frames for every pair they have joined.
pub async fn job_status_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.subscriptions))
}

async fn handle_socket(socket: WebSocket, subscriptions: SubscriptionService) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = subscriptions.hub().register(conn_id.clone()).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => handle_frame(&subscriptions, &conn_id, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    subscriptions.disconnect(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn handle_frame(subscriptions: &SubscriptionService, conn_id: &str, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            let error = AppError::BadRequest(format!("Unrecognised frame: {}", e));
            subscriptions.notify_error(conn_id, &error).await;
            return;
        }
    };

    let result = match event {
        ClientEvent::Join(request) => match validate_request(&request) {
            Ok(()) => {
                subscriptions
                    .join(conn_id, &request.queue_id, &request.job_id)
                    .await
            }
            Err(e) => Err(e),
        },
        ClientEvent::Leave(request) => {
            subscriptions
                .leave(conn_id, &request.queue_id, &request.job_id)
                .await;
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(conn_id = %conn_id, "Frame rejected: {}", e);
        subscriptions.notify_error(conn_id, &e).await;
    }
}
