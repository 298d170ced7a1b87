//! Structured product extraction over the chat endpoint.
//!
//! The model is asked for a bare JSON array; [`parse_products_json`] also
//! tolerates a fenced code block, since smaller local models wrap output in
//! markdown no matter what the instructions say.

use serde::{Deserialize, Serialize};

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::types::ChatMessage;

/// One product as returned by the structured-extraction prompt. All fields
/// are optional — the caller applies its own keep/discard rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedProduct {
    #[serde(default, alias = "name", alias = "title")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default, alias = "review_count")]
    pub reviews: Option<String>,
    #[serde(default, alias = "link")]
    pub url: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
}

/// Fixed instruction describing the desired fields, parameterized only by
/// the site name.
fn extraction_instructions(site_name: &str) -> String {
    format!(
        "Extract product listings from the {site_name} search results page below. \
         For each product, extract:\n\
         - product_name (text)\n\
         - price (with currency)\n\
         - rating (out of 5 if available)\n\
         - reviews (count if available)\n\
         - url (product page)\n\
         - seller (if available)\n\
         Respond with a JSON array only, no prose."
    )
}

impl LlmClient {
    /// Asks the model to extract product listings from `content` (a reduced
    /// form of the rendered search page).
    ///
    /// # Errors
    ///
    /// Propagates transport/API errors from [`LlmClient::chat`]; a response
    /// that is not a JSON array of products is [`LlmError::Deserialize`].
    pub async fn extract_products(
        &self,
        content: &str,
        site_name: &str,
    ) -> Result<Vec<ExtractedProduct>, LlmError> {
        let messages = [
            ChatMessage::system(extraction_instructions(site_name)),
            ChatMessage::user(content),
        ];
        let reply = self.chat(&messages, None).await?;
        let Some(text) = reply.text() else {
            return Err(LlmError::EmptyResponse);
        };
        parse_products_json(text)
    }
}

/// Parse the model's output as a JSON array of products, stripping a
/// surrounding markdown fence if present. Also accepts the common
/// `{"products": [...]}` wrapper shape.
pub(crate) fn parse_products_json(text: &str) -> Result<Vec<ExtractedProduct>, LlmError> {
    let stripped = strip_code_fence(text);

    #[derive(Deserialize)]
    struct Wrapper {
        products: Vec<ExtractedProduct>,
    }

    serde_json::from_str::<Vec<ExtractedProduct>>(stripped)
        .or_else(|first_err| {
            serde_json::from_str::<Wrapper>(stripped)
                .map(|w| w.products)
                .map_err(|_| first_err)
        })
        .map_err(|e| LlmError::Deserialize {
            context: "structured extraction output".to_string(),
            source: e,
        })
}

/// Strip a leading/trailing ``` fence (with an optional language tag).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_array() {
        let out = parse_products_json(
            r#"[{"product_name": "Mouse", "price": "$9.99", "url": "https://x.com/p/1"}]"#,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product_name.as_deref(), Some("Mouse"));
        assert_eq!(out[0].price.as_deref(), Some("$9.99"));
    }

    #[test]
    fn parses_fenced_array() {
        let out = parse_products_json(
            "```json\n[{\"product_name\": \"Keyboard\", \"price\": \"$49\"}]\n```",
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product_name.as_deref(), Some("Keyboard"));
    }

    #[test]
    fn parses_products_wrapper_object() {
        let out =
            parse_products_json(r#"{"products": [{"name": "Desk Lamp", "price": "$15"}]}"#)
                .unwrap();
        assert_eq!(out.len(), 1);
        // "name" alias maps onto product_name.
        assert_eq!(out[0].product_name.as_deref(), Some("Desk Lamp"));
    }

    #[test]
    fn rejects_non_json_output() {
        let err = parse_products_json("Sure! Here are the products I found:").unwrap_err();
        assert!(matches!(err, LlmError::Deserialize { .. }));
    }

    #[test]
    fn empty_array_is_ok_and_empty() {
        let out = parse_products_json("[]").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn instructions_mention_site_and_fields() {
        let text = extraction_instructions("Amazon");
        assert!(text.contains("Amazon"));
        for field in ["product_name", "price", "rating", "reviews", "url", "seller"] {
            assert!(text.contains(field), "missing field {field}");
        }
    }
}
