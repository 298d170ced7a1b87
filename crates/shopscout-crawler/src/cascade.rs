//! The extraction cascade: structured-LLM → selector schema → heuristic.
//!
//! Tries the strategies in priority order and returns the first non-empty
//! result. A stage succeeds only when it returns at least one record
//! without erroring; stage errors are recorded and the cascade advances —
//! nothing propagates to the caller. The heuristic stage is always
//! available and may legitimately return nothing.

use shopscout_core::{ExtractionMethod, SearchEngineConfig};
use shopscout_llm::LlmClient;

use crate::error::CrawlerError;
use crate::parse::parser_for;
use crate::schema::extract_with_schema;
use crate::types::RawProduct;

/// Cap on the content handed to the structured-extraction model.
const LLM_CONTENT_MAX_CHARS: usize = 30_000;

/// One stage's outcome, kept for logging and tests; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeAttempt {
    pub stage: ExtractionMethod,
    pub succeeded: bool,
    pub record_count: usize,
}

/// Result of running the cascade over one page.
#[derive(Debug)]
pub struct CascadeOutcome {
    pub records: Vec<RawProduct>,
    /// Stage that produced `records`; `Heuristic` when everything came up
    /// empty (then `records` is empty too).
    pub method: ExtractionMethod,
    /// Stages tried, in order.
    pub attempts: Vec<CascadeAttempt>,
}

pub struct Cascade<'a> {
    llm: Option<&'a LlmClient>,
    max_items: usize,
}

impl<'a> Cascade<'a> {
    /// A cascade without an LLM client starts at the schema stage; order
    /// and fallback semantics of the remaining stages are unchanged.
    #[must_use]
    pub fn new(llm: Option<&'a LlmClient>, max_items: usize) -> Self {
        Self { llm, max_items }
    }

    /// Runs the cascade over one fetched page.
    pub async fn extract(&self, html: &str, site: &SearchEngineConfig) -> CascadeOutcome {
        let mut attempts = Vec::new();

        if let Some(llm) = self.llm {
            match llm_stage(llm, html, site).await {
                Ok(records) if !records.is_empty() => {
                    let attempt = log_attempt(site, ExtractionMethod::Llm, true, records.len());
                    attempts.push(attempt);
                    return CascadeOutcome {
                        records,
                        method: ExtractionMethod::Llm,
                        attempts,
                    };
                }
                Ok(_) => {
                    attempts.push(log_attempt(site, ExtractionMethod::Llm, false, 0));
                }
                Err(e) => {
                    tracing::warn!(site = %site.name, error = %e, "LLM extraction stage failed");
                    attempts.push(log_attempt(site, ExtractionMethod::Llm, false, 0));
                }
            }
        }

        match extract_with_schema(html, site, self.max_items) {
            Ok(records) if !records.is_empty() => {
                let attempt = log_attempt(site, ExtractionMethod::Schema, true, records.len());
                attempts.push(attempt);
                return CascadeOutcome {
                    records,
                    method: ExtractionMethod::Schema,
                    attempts,
                };
            }
            Ok(_) => {
                attempts.push(log_attempt(site, ExtractionMethod::Schema, false, 0));
            }
            Err(e) => {
                tracing::warn!(site = %site.name, error = %e, "schema extraction stage failed");
                attempts.push(log_attempt(site, ExtractionMethod::Schema, false, 0));
            }
        }

        // Last resort; must not fail even on malformed markup.
        let records = parser_for(site.id).parse(html, site, self.max_items);
        let attempt = log_attempt(
            site,
            ExtractionMethod::Heuristic,
            !records.is_empty(),
            records.len(),
        );
        attempts.push(attempt);
        CascadeOutcome {
            records,
            method: ExtractionMethod::Heuristic,
            attempts,
        }
    }
}

async fn llm_stage(
    llm: &LlmClient,
    html: &str,
    site: &SearchEngineConfig,
) -> Result<Vec<RawProduct>, CrawlerError> {
    let content = reduce_for_llm(html);
    let products = llm.extract_products(&content, &site.name).await?;
    Ok(products
        .into_iter()
        .map(RawProduct::from)
        .filter(|p| !p.is_discardable())
        .collect())
}

fn log_attempt(
    site: &SearchEngineConfig,
    stage: ExtractionMethod,
    succeeded: bool,
    record_count: usize,
) -> CascadeAttempt {
    if succeeded {
        tracing::info!(site = %site.name, stage = %stage, records = record_count, "extraction stage succeeded");
    } else {
        tracing::debug!(site = %site.name, stage = %stage, "extraction stage produced nothing");
    }
    CascadeAttempt {
        stage,
        succeeded,
        record_count,
    }
}

/// Reduces a rendered page for the model: script and style blocks are
/// dropped and the remainder truncated. Markup is otherwise kept — the
/// model needs hrefs and attribute context to extract URLs.
fn reduce_for_llm(html: &str) -> String {
    let mut out = String::with_capacity(html.len().min(LLM_CONTENT_MAX_CHARS));
    let mut rest = html;
    while let Some((before, tag, after_open)) = find_blocked_tag(rest) {
        out.push_str(before);
        let close = format!("</{tag}>");
        rest = match find_ascii_ci(after_open, &close) {
            Some(pos) => &after_open[pos + close.len()..],
            None => "",
        };
    }
    out.push_str(rest);

    let mut end = out.len().min(LLM_CONTENT_MAX_CHARS);
    while end < out.len() && !out.is_char_boundary(end) {
        end += 1;
    }
    out.truncate(end);
    out
}

/// Finds the next `<script` or `<style` opening; returns the text before
/// it, the tag name, and the remainder starting at the `<tag`.
fn find_blocked_tag(s: &str) -> Option<(&str, &'static str, &str)> {
    let script = find_ascii_ci(s, "<script");
    let style = find_ascii_ci(s, "<style");
    let (pos, tag) = match (script, style) {
        (Some(a), Some(b)) if a < b => (a, "script"),
        (Some(a), None) => (a, "script"),
        (_, Some(b)) => (b, "style"),
        (None, None) => return None,
    };
    Some((&s[..pos], tag, &s[pos..]))
}

/// ASCII case-insensitive substring search. The needle is ASCII, so every
/// match position is a char boundary of the haystack.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
#[path = "cascade_test.rs"]
mod tests;
