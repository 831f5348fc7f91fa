//! End-to-end tests for the session loop against a scripted renderer and a
//! mock submission server.

use async_trait::async_trait;
use quizchain::fetch::HttpClient;
use quizchain::renderer::RenderContext;
use quizchain::session::{Runner, Session};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// {"answer": 42}
const ANSWER_42_B64: &str = "eyJhbnN3ZXIiOiA0Mn0=";

/// Renderer test double serving canned markup per URL.
struct ScriptedContext {
    pages: HashMap<String, String>,
    current: Option<String>,
    visits: Vec<String>,
}

impl ScriptedContext {
    fn new(pages: Vec<(String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            current: None,
            visits: Vec::new(),
        }
    }
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> anyhow::Result<()> {
        anyhow::ensure!(self.pages.contains_key(url), "unknown page {url}");
        self.visits.push(url.to_string());
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn html(&self) -> anyhow::Result<String> {
        let url = self.current.as_ref().expect("navigate first");
        Ok(self.pages[url].clone())
    }

    async fn attr_all(&self, _selector: &str, _attr: &str) -> anyhow::Result<Vec<Option<String>>> {
        Ok(Vec::new())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}

fn session(start_url: &str, budget: Duration) -> Session {
    Session::new(
        "solver@example.com".to_string(),
        "hunter2".to_string(),
        start_url.to_string(),
        budget,
    )
}

#[tokio::test]
async fn follows_chain_until_no_next_url() {
    let server = MockServer::start().await;
    let page1 = format!("{}/page1", server.uri());
    let page2 = format!("{}/page2", server.uri());
    let submit = format!("{}/submit", server.uri());

    // Page 1 answers via embedded payload, page 2 via the last number.
    let mut ctx = ScriptedContext::new(vec![
        (
            page1.clone(),
            format!(r#"<script>fetch("{submit}"); atob('{ANSWER_42_B64}')</script>"#),
        ),
        (
            page2.clone(),
            format!(r#"<script>fetch("{submit}")</script><p>total is 17.5 today</p>"#),
        ),
    ]);

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": page1, "answer": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": page2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": page2, "answer": 17.5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"correct": true})))
        .expect(1)
        .mount(&server)
        .await;

    let runner = Runner::new(HttpClient::new());
    let result = runner
        .solve(&mut ctx, &session(&page1, Duration::from_secs(170)))
        .await
        .expect("solve failed");

    assert_eq!(ctx.visits, vec![page1.clone(), page2.clone()]);

    assert_eq!(result.first.url, page1);
    assert_eq!(result.first.submit_url, Some(submit.clone()));
    assert_eq!(result.first.answer, Some(json!(42)));
    assert_eq!(
        result.first.submit_response,
        Some(json!({"url": page2.clone()}))
    );

    assert_eq!(result.submissions.len(), 1);
    assert_eq!(result.submissions[0].url, page2);
    assert_eq!(result.submissions[0].answer, Some(json!(17.5)));
    assert_eq!(
        result.submissions[0].submit_response,
        Some(json!({"correct": true}))
    );
}

#[tokio::test]
async fn stops_when_budget_exhausted_despite_next_url() {
    let server = MockServer::start().await;
    let page1 = format!("{}/page1", server.uri());
    let submit = format!("{}/submit", server.uri());

    let mut ctx = ScriptedContext::new(vec![(
        page1.clone(),
        format!(r#"<script>fetch("{submit}")</script><p>the answer is 7</p>"#),
    )]);

    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://x/never-visited"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let runner = Runner::new(HttpClient::new());
    let result = runner
        .solve(&mut ctx, &session(&page1, Duration::ZERO))
        .await
        .expect("solve failed");

    // The first page is always processed; the chain is not followed.
    assert_eq!(ctx.visits, vec![page1]);
    assert!(result.submissions.is_empty());
    assert_eq!(
        result.first.submit_response,
        Some(json!({"url": "https://x/never-visited"}))
    );
}

#[tokio::test]
async fn page_without_endpoint_skips_submission() {
    let page1 = "https://quiz.example/page1".to_string();
    let mut ctx = ScriptedContext::new(vec![(
        page1.clone(),
        "<p>nothing to post, value 31</p>".to_string(),
    )]);

    let runner = Runner::new(HttpClient::new());
    let result = runner
        .solve(&mut ctx, &session(&page1, Duration::from_secs(170)))
        .await
        .expect("solve failed");

    assert_eq!(result.first.submit_url, None);
    assert_eq!(result.first.answer, Some(json!(31)));
    assert_eq!(result.first.submit_response, None);
    assert!(result.submissions.is_empty());
}

#[tokio::test]
async fn page_with_endpoint_but_no_answer_still_submits() {
    // An endpoint is present but no heuristic yields a value: the markup has
    // no payloads, no linked files and no digits at all.
    let page1 = "https://quiz.example/page1".to_string();
    let mut ctx = ScriptedContext::new(vec![(
        page1.clone(),
        r#"<script>fetch("https://quiz.invalid/submit")</script><p>entirely numberless</p>"#
            .to_string(),
    )]);

    let runner = Runner::new(HttpClient::new());
    let result = runner
        .solve(&mut ctx, &session(&page1, Duration::from_secs(170)))
        .await
        .expect("solve failed");

    assert_eq!(result.first.answer, None);
    assert_eq!(
        result.first.submit_url,
        Some("https://quiz.invalid/submit".to_string())
    );
    // The POST was still attempted; .invalid never resolves, so the record
    // carries the captured transport error.
    let resp = result.first.submit_response.expect("submission attempted");
    assert!(resp.get("error").is_some());
    assert!(result.submissions.is_empty());
}

#[tokio::test]
async fn transport_failure_is_captured_and_ends_the_loop() {
    // Endpoint nobody listens on.
    let page1 = "https://quiz.example/page1".to_string();
    let mut ctx = ScriptedContext::new(vec![(
        page1.clone(),
        r#"<script>fetch("http://127.0.0.1:1/submit")</script><p>answer 3</p>"#.to_string(),
    )]);

    let runner = Runner::new(HttpClient::new());
    let result = runner
        .solve(&mut ctx, &session(&page1, Duration::from_secs(170)))
        .await
        .expect("solve must absorb submit transport failures");

    let resp = result.first.submit_response.expect("captured error value");
    assert!(resp.get("error").is_some());
    assert!(result.submissions.is_empty());
}

#[tokio::test]
async fn non_json_response_is_captured_as_status_and_text() {
    let server = MockServer::start().await;
    let page1 = format!("{}/page1", server.uri());
    let submit = format!("{}/submit", server.uri());

    let mut ctx = ScriptedContext::new(vec![(
        page1.clone(),
        format!(r#"<script>fetch("{submit}")</script><p>answer 3</p>"#),
    )]);

    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server broke"))
        .mount(&server)
        .await;

    let runner = Runner::new(HttpClient::new());
    let result = runner
        .solve(&mut ctx, &session(&page1, Duration::from_secs(170)))
        .await
        .expect("solve failed");

    assert_eq!(
        result.first.submit_response,
        Some(json!({"status_code": 500, "text": "server broke"}))
    );
}
