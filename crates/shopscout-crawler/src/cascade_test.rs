use shopscout_core::SitesFile;
use shopscout_llm::LlmClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn amazon_site() -> SearchEngineConfig {
    SitesFile::default_sites().sites.remove(0)
}

fn llm_client(base_url: &str) -> LlmClient {
    LlmClient::new(base_url, None, "test-model", 30).expect("client construction")
}

/// A completion whose assistant content is the given extraction output.
fn extraction_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

const AMAZON_PAGE: &str = "<html><body>\
    <div class='s-result-item' data-component-type='s-search-result'>\
      <h2><a class='a-link-normal' href='/dp/B1'><span class='a-text-normal'>Earbuds</span></a></h2>\
      <span class='a-price'><span class='a-offscreen'>$19.99</span></span>\
    </div>\
    <div class='s-result-item' data-component-type='s-search-result'>\
      <h2><a class='a-link-normal' href='/dp/B2'><span class='a-text-normal'>Headphones</span></a></h2>\
      <span class='a-price'><span class='a-offscreen'>$49.99</span></span>\
    </div>\
    <div class='s-result-item' data-component-type='s-search-result'>\
      <h2><a class='a-link-normal' href='/dp/B3'><span class='a-text-normal'>Speaker</span></a></h2>\
      <span class='a-price'><span class='a-offscreen'>$29.99</span></span>\
    </div>\
    </body></html>";

#[tokio::test]
async fn llm_success_short_circuits_later_stages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response(
            r#"[{"product_name": "Earbuds", "price": "$19.99", "url": "https://www.amazon.com/dp/B1"},
                {"product_name": "Headphones", "price": "$49.99", "url": "https://www.amazon.com/dp/B2"}]"#,
        )))
        .mount(&server)
        .await;

    let client = llm_client(&server.uri());
    let cascade = Cascade::new(Some(&client), 10);
    let outcome = cascade.extract(AMAZON_PAGE, &amazon_site()).await;

    assert_eq!(outcome.method, ExtractionMethod::Llm);
    assert_eq!(outcome.records.len(), 2);
    // Schema and heuristic must not have been attempted at all.
    assert_eq!(outcome.attempts.len(), 1);
    assert!(outcome.attempts[0].succeeded);
    assert_eq!(outcome.attempts[0].stage, ExtractionMethod::Llm);
}

#[tokio::test]
async fn llm_empty_falls_back_to_schema() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response("[]")))
        .mount(&server)
        .await;

    let client = llm_client(&server.uri());
    let cascade = Cascade::new(Some(&client), 10);
    let outcome = cascade.extract(AMAZON_PAGE, &amazon_site()).await;

    assert_eq!(outcome.method, ExtractionMethod::Schema);
    assert_eq!(outcome.records.len(), 3);
    let stages: Vec<_> = outcome.attempts.iter().map(|a| a.stage).collect();
    assert_eq!(stages, vec![ExtractionMethod::Llm, ExtractionMethod::Schema]);
    assert!(!outcome.attempts[0].succeeded);
    assert!(outcome.attempts[1].succeeded);
}

#[tokio::test]
async fn llm_parse_failure_is_stage_failure_not_crawl_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response(
            "Sure! Here are the products I found on Amazon:",
        )))
        .mount(&server)
        .await;

    let client = llm_client(&server.uri());
    let cascade = Cascade::new(Some(&client), 10);
    let outcome = cascade.extract(AMAZON_PAGE, &amazon_site()).await;

    // The unparsable model output degrades to the schema stage's result.
    assert_eq!(outcome.method, ExtractionMethod::Schema);
    assert_eq!(outcome.records.len(), 3);
}

#[tokio::test]
async fn llm_api_error_advances_the_cascade() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let client = llm_client(&server.uri());
    let cascade = Cascade::new(Some(&client), 10);
    let outcome = cascade.extract(AMAZON_PAGE, &amazon_site()).await;

    assert_eq!(outcome.method, ExtractionMethod::Schema);
    assert_eq!(outcome.records.len(), 3);
}

#[tokio::test]
async fn without_llm_client_cascade_starts_at_schema() {
    let cascade = Cascade::new(None, 10);
    let outcome = cascade.extract(AMAZON_PAGE, &amazon_site()).await;

    assert_eq!(outcome.method, ExtractionMethod::Schema);
    assert_eq!(outcome.attempts[0].stage, ExtractionMethod::Schema);
}

#[tokio::test]
async fn all_stages_empty_ends_with_empty_heuristic() {
    let cascade = Cascade::new(None, 10);
    let outcome = cascade
        .extract("<html><body><p>nothing here</p></body></html>", &amazon_site())
        .await;

    assert_eq!(outcome.method, ExtractionMethod::Heuristic);
    assert!(outcome.records.is_empty());
    let stages: Vec<_> = outcome.attempts.iter().map(|a| a.stage).collect();
    assert_eq!(
        stages,
        vec![ExtractionMethod::Schema, ExtractionMethod::Heuristic]
    );
}

#[tokio::test]
async fn heuristic_catches_what_schema_misses() {
    // No canonical title selector matches, but the heuristic h2 fallback does.
    let html = "<html><body>\
        <div class='s-result-item' data-component-type='s-search-result'>\
          <h2><span>Plain Title</span></h2>\
          <a class='a-link-normal s-no-outline' href='/dp/B9'>go</a>\
        </div>\
        </body></html>";
    let cascade = Cascade::new(None, 10);
    let outcome = cascade.extract(html, &amazon_site()).await;

    assert_eq!(outcome.method, ExtractionMethod::Heuristic);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].product_name.as_deref(), Some("Plain Title"));
}

#[test]
fn reduce_for_llm_strips_scripts_and_styles() {
    let html = "<html><head><STYLE>body { color: red }</STYLE></head>\
        <body><script type='text/javascript'>var x = 1;</script><p>content</p></body></html>";
    let reduced = reduce_for_llm(html);
    assert!(!reduced.contains("color: red"));
    assert!(!reduced.contains("var x = 1"));
    assert!(reduced.contains("<p>content</p>"));
}

#[test]
fn reduce_for_llm_handles_unclosed_script() {
    let html = "<body><p>kept</p><script>var x = 1;";
    let reduced = reduce_for_llm(html);
    assert_eq!(reduced, "<body><p>kept</p>");
}

#[test]
fn reduce_for_llm_truncates_long_pages() {
    let html = format!("<body>{}</body>", "x".repeat(LLM_CONTENT_MAX_CHARS * 2));
    let reduced = reduce_for_llm(&html);
    assert_eq!(reduced.len(), LLM_CONTENT_MAX_CHARS);
}
