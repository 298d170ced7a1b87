use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopscout_core::SearchFilters;
use shopscout_crawler::Recommender;
use shopscout_llm::{run_tool_loop, ChatMessage, SearchToolArgs};

use crate::api::AppState;

const SYSTEM_PROMPT: &str = "You are a helpful shopping assistant. When the user wants to buy \
something, call the search_product tool and summarize the results: name, price, rating, and \
where each product comes from. Keep answers short and conversational.";

#[derive(Debug, Deserialize)]
pub(super) struct WsParams {
    conversation_id: Option<String>,
}

/// One websocket frame, in either direction.
#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    data: String,
}

impl Frame {
    fn response(data: String) -> Self {
        Self {
            kind: "response".to_owned(),
            data,
        }
    }

    fn error(data: impl Into<String>) -> Self {
        Self {
            kind: "error".to_owned(),
            data: data.into(),
        }
    }
}

pub(super) async fn conversation_ws(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let conversation_id = params
        .conversation_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    ws.on_upgrade(move |socket| handle_socket(state, conversation_id, socket))
}

async fn handle_socket(state: AppState, conversation_id: String, mut socket: WebSocket) {
    tracing::info!(conversation_id, "conversation connected");
    // History lives with the connection; there is no persistence layer.
    let mut history = vec![ChatMessage::system(SYSTEM_PROMPT)];

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let frame: Frame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                send_frame(&mut socket, &Frame::error(format!("malformed frame: {e}"))).await;
                continue;
            }
        };
        if frame.kind != "query" {
            send_frame(
                &mut socket,
                &Frame::error(format!("unsupported frame type: {}", frame.kind)),
            )
            .await;
            continue;
        }

        let Some(llm) = state.llm.clone() else {
            send_frame(&mut socket, &Frame::error("no LLM backend configured")).await;
            continue;
        };

        // One in-flight query per conversation; released when the turn ends.
        let _guard = state.gate.acquire(&conversation_id).await;

        history.push(ChatMessage::user(frame.data));
        let recommender = Arc::clone(&state.recommender);
        let reply = run_tool_loop(&llm, &mut history, move |args| {
            let recommender = Arc::clone(&recommender);
            async move { run_search_tool(&recommender, args).await }
        })
        .await;

        match reply {
            Ok(answer) => send_frame(&mut socket, &Frame::response(answer)).await,
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "conversation turn failed");
                send_frame(
                    &mut socket,
                    &Frame::error("the assistant could not answer; try again"),
                )
                .await;
            }
        }
    }

    tracing::info!(conversation_id, "conversation disconnected");
}

/// Executes the `search_product` tool call; the output is inserted into the
/// conversation as a tool-result message, so it is rendered as text.
async fn run_search_tool(recommender: &Recommender, args: SearchToolArgs) -> String {
    let filters = SearchFilters {
        sort_by: args.sort_key(),
        ..SearchFilters::default()
    };
    match recommender.search(&args.query, &filters).await {
        Ok(products) if products.is_empty() => {
            "No products found matching the search query.".to_owned()
        }
        Ok(products) => serde_json::to_string(&products)
            .unwrap_or_else(|e| format!("failed to serialize products: {e}")),
        Err(e) => format!("search failed: {e}"),
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) {
    let Ok(payload) = serde_json::to_string(frame) else {
        return;
    };
    if let Err(e) = socket.send(Message::Text(payload.into())).await {
        tracing::debug!(error = %e, "websocket send failed");
    }
}
