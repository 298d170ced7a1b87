use thiserror::Error;

/// Crawl-side failures. Only `CallerInput` ever crosses the
/// [`crate::Recommender`] boundary; fetch and stage failures are recovered
/// where they occur and degrade to fewer records.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("LLM extraction error: {0}")]
    Llm(#[from] shopscout_llm::LlmError),

    #[error("configured selector does not parse: {selector}")]
    InvalidSelector { selector: String },

    #[error("invalid search input: {0}")]
    CallerInput(String),
}
