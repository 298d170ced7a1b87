pub mod client;
pub mod error;
pub mod extract;
pub mod guard;
pub mod tools;
pub mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use extract::ExtractedProduct;
pub use guard::ConversationGate;
pub use tools::{run_tool_loop, search_product_tool, SearchToolArgs};
pub use types::{ChatMessage, Role, ToolCall, ToolDef};
