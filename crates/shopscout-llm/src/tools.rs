//! The `search_product` tool surface and the chat tool-call loop.

use std::future::Future;

use serde::Deserialize;

use shopscout_core::SortKey;

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::types::{ChatMessage, FunctionDef, ToolDef};

/// Upper bound on chat rounds in one tool loop. The model normally answers
/// after a single tool result; the guard stops a model that keeps calling
/// the tool from looping forever.
const MAX_TOOL_ROUNDS: usize = 4;

/// Tool definition for product search, as advertised to the model.
#[must_use]
pub fn search_product_tool() -> ToolDef {
    ToolDef {
        kind: "function",
        function: FunctionDef {
            name: "search_product",
            description: "Search eCommerce sites for products matching a given query.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The product name or keyword to search for."
                    },
                    "sort_by": {
                        "type": ["string", "null"],
                        "enum": ["price_asc", "price_desc", "popularity", "rating"],
                        "description": "How to sort the product results. Pass null if not needed."
                    }
                },
                "required": ["query", "sort_by"],
                "additionalProperties": false
            }),
        },
    }
}

/// Arguments the model passes to `search_product`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchToolArgs {
    pub query: String,
    #[serde(default)]
    pub sort_by: Option<String>,
}

impl SearchToolArgs {
    /// Maps the tool-schema sort value onto a [`SortKey`]. Unknown values
    /// fall back to relevance rather than failing the call.
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        match self.sort_by.as_deref() {
            None => SortKey::Relevance,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(sort_by = raw, "unrecognized sort_by from model; using relevance");
                SortKey::Relevance
            }),
        }
    }
}

/// Drives one user turn through the tool-call loop.
///
/// Sends `history` with the `search_product` tool attached; when the model
/// answers with content the loop ends, and when it answers with a tool call
/// the provided `search` function runs and its output is appended as a tool
/// result for the next round. The assistant's messages (including tool-call
/// messages) are appended to `history` as the loop progresses.
///
/// # Errors
///
/// Propagates [`LlmClient::chat`] errors; a reply with neither content nor
/// tool calls is [`LlmError::EmptyResponse`]; more than `MAX_TOOL_ROUNDS`
/// rounds is [`LlmError::ToolLoopExceeded`].
pub async fn run_tool_loop<F, Fut>(
    client: &LlmClient,
    history: &mut Vec<ChatMessage>,
    search: F,
) -> Result<String, LlmError>
where
    F: Fn(SearchToolArgs) -> Fut,
    Fut: Future<Output = String>,
{
    let tools = [search_product_tool()];

    for round in 0..MAX_TOOL_ROUNDS {
        let reply = client.chat(history, Some(&tools)).await?;

        if let Some(text) = reply.text() {
            let text = text.to_owned();
            history.push(reply);
            return Ok(text);
        }

        let Some(calls) = reply.tool_calls.clone() else {
            return Err(LlmError::EmptyResponse);
        };
        history.push(reply);

        for call in calls {
            let output = if call.function.name == "search_product" {
                match serde_json::from_str::<SearchToolArgs>(&call.function.arguments) {
                    Ok(args) => {
                        tracing::debug!(round, query = %args.query, "executing search_product tool call");
                        search(args).await
                    }
                    Err(e) => format!("invalid search_product arguments: {e}"),
                }
            } else {
                format!("unknown tool: {}", call.function.name)
            };
            history.push(ChatMessage::tool_result(call.id, output));
        }
    }

    Err(LlmError::ToolLoopExceeded {
        rounds: MAX_TOOL_ROUNDS,
    })
}
