//! Session runner: the render → extract → submit → follow loop.
//!
//! A session is a state machine with two states, RUNNING and DONE, advanced
//! once per page visit. Continuation is externally driven — the submit
//! response may carry the next page's URL — and gated by a wall-clock budget
//! checked once per iteration.

use crate::extract::{Extractor, PageSnapshot};
use crate::fetch::HttpClient;
use crate::renderer::RenderContext;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Page render timeout per navigation.
pub const RENDER_TIMEOUT_MS: u64 = 120_000;

/// Timeout for the submission POST.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Identity and budget for one solve request. Created per incoming request,
/// discarded with the response — nothing is persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub secret: String,
    pub start_url: String,
    started: Instant,
    budget: Duration,
}

impl Session {
    pub fn new(email: String, secret: String, start_url: String, budget: Duration) -> Self {
        Self {
            email,
            secret,
            start_url,
            started: Instant::now(),
            budget,
        }
    }

    /// True once elapsed time since session start reaches the budget.
    pub fn over_budget(&self) -> bool {
        self.started.elapsed() >= self.budget
    }
}

/// One page visit: what was asked, what was answered, what came back.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub url: String,
    /// Discovered endpoint; reported on the first record only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_url: Option<String>,
    pub answer: Option<Value>,
    /// Parsed JSON response, `{status_code, text}` for non-JSON bodies,
    /// `{error}` on transport failure; absent when no endpoint was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_response: Option<Value>,
}

/// Terminal output of a session: the first page's record plus the ordered
/// records of every follow-up page.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub first: SubmissionRecord,
    pub submissions: Vec<SubmissionRecord>,
}

enum State {
    Running(String),
    Done,
}

/// Drives sessions to completion.
pub struct Runner {
    extractor: Extractor,
    client: HttpClient,
}

impl Runner {
    pub fn new(client: HttpClient) -> Self {
        Self {
            extractor: Extractor::new(client.clone()),
            client,
        }
    }

    /// Run one session: at most one extraction and one submission per page
    /// visit, looping while the server supplies a next URL and the budget
    /// holds. Render failures propagate — the HTTP boundary converts them
    /// into a structured error response.
    pub async fn solve(
        &self,
        ctx: &mut dyn RenderContext,
        session: &Session,
    ) -> Result<SessionResult> {
        let mut first: Option<SubmissionRecord> = None;
        let mut submissions = Vec::new();
        let mut state = State::Running(session.start_url.clone());

        while let State::Running(url) = state {
            info!(url = %url, "visiting page");
            ctx.navigate(&url, RENDER_TIMEOUT_MS).await?;

            let page = PageSnapshot {
                html: ctx.html().await?,
                anchor_hrefs: ctx
                    .attr_all("a", "href")
                    .await?
                    .into_iter()
                    .flatten()
                    .collect(),
            };

            let extraction = self.extractor.extract(&page).await;
            debug!(
                submit_url = ?extraction.submit_url,
                has_answer = extraction.answer.is_some(),
                "extraction complete"
            );

            let payload = submission_payload(session, &url, extraction.answer.as_ref());

            let submit_response = match &extraction.submit_url {
                Some(endpoint) => Some(self.submit(endpoint, &payload).await),
                None => None,
            };

            state = match next_url(submit_response.as_ref(), session.over_budget()) {
                Some(next) => State::Running(next),
                None => State::Done,
            };

            let record = SubmissionRecord {
                url,
                submit_url: if first.is_none() {
                    extraction.submit_url
                } else {
                    None
                },
                answer: extraction.answer,
                submit_response,
            };
            if first.is_none() {
                first = Some(record);
            } else {
                submissions.push(record);
            }
        }

        // The loop always runs at least once for the start URL.
        let first = first.context("session produced no record")?;
        Ok(SessionResult { first, submissions })
    }

    /// POST the payload; every outcome becomes a value. JSON bodies pass
    /// through as-is, non-JSON bodies become `{status_code, text}`, and
    /// transport failures become `{error}` — the loop then ends naturally
    /// because none of those carry a next URL.
    async fn submit(&self, endpoint: &str, payload: &Value) -> Value {
        match self.client.post_json(endpoint, payload, SUBMIT_TIMEOUT).await {
            Ok((status, text)) => serde_json::from_str(&text)
                .unwrap_or_else(|_| json!({ "status_code": status, "text": text })),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }
}

/// Body of one submission POST. A page where no heuristic produced a value
/// still submits, with an explicit `null` answer.
pub fn submission_payload(session: &Session, url: &str, answer: Option<&Value>) -> Value {
    json!({
        "email": session.email,
        "secret": session.secret,
        "url": url,
        "answer": answer,
    })
}

/// RUNNING → RUNNING only when the response carries a string `url` and the
/// budget has not run out; everything else transitions to DONE.
pub fn next_url(response: Option<&Value>, over_budget: bool) -> Option<String> {
    if over_budget {
        return None;
    }
    response?.get("url")?.as_str().map(|s| s.to_string())
}
