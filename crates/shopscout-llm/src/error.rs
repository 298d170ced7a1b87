use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("LLM response contained no choices")]
    EmptyResponse,

    #[error("tool call carried unusable arguments: {0}")]
    BadToolArguments(String),

    #[error("tool loop did not converge within {rounds} rounds")]
    ToolLoopExceeded { rounds: usize },
}
