//! Grading endpoint client
//!
//! Submits ranked candidate lists for scoring. Unlike the language-model
//! paths, grading failures are surfaced to the caller after retries are
//! exhausted; a lost submission is an error, not a degraded result.

use crate::backend::{check_status, BackendError, BackendResult};
use crate::config::{GradingApiConfig, RetryConfig};
use crate::retry::{retry_with_backoff, BackoffPolicy};
use crate::types::{CandidateId, EvaluationReport, SubmissionPayload};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// The evaluation endpoint scores at most this many ids per category
pub const MAX_IDS_PER_EVALUATION: usize = 10;

/// Client for the external grading service
#[derive(Debug)]
pub struct GradingClient {
    client: reqwest::Client,
    grade_url: String,
    evaluate_url: String,
    policy: BackoffPolicy,
}

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    config_path: &'a str,
    object_ids: &'a [CandidateId],
}

/// Loosely-typed response from `/grade`; the service reports a numeric
/// score per category and/or an aggregate average, with a shape that has
/// drifted over time, so parse defensively.
#[derive(Debug, Clone)]
pub struct GradeReport {
    pub average: Option<f64>,
    pub per_category: BTreeMap<String, f64>,
    pub raw: serde_json::Value,
}

impl GradeReport {
    fn from_value(raw: serde_json::Value) -> Self {
        let average = raw
            .get("average_final_score")
            .or_else(|| raw.get("average"))
            .or_else(|| raw.get("overallScore"))
            .and_then(serde_json::Value::as_f64);

        let per_category = raw
            .get("scores")
            .or_else(|| raw.get("category_scores"))
            .and_then(serde_json::Value::as_object)
            .map(|scores| {
                scores
                    .iter()
                    .filter_map(|(k, v)| v.as_f64().map(|s| (k.clone(), s)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            average,
            per_category,
            raw,
        }
    }
}

impl GradingClient {
    /// Build the client. Fails fast when no submitter email can be
    /// resolved: submitting anonymously is a configuration error, not
    /// something to discover after a full retrieval run.
    pub fn new(config: &GradingApiConfig, retry: &RetryConfig) -> BackendResult<Self> {
        let email = config.resolve_email().ok_or_else(|| {
            BackendError::Config(
                "no submitter email configured (set grading.submitter_email or SUBMITTER_EMAIL)"
                    .to_string(),
            )
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&email)
                .map_err(|e| BackendError::Config(format!("Invalid submitter email: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let base = config.endpoint.trim_end_matches('/');
        Ok(Self {
            client,
            grade_url: format!("{}/grade", base),
            evaluate_url: format!("{}/evaluate", base),
            policy: retry.policy(),
        })
    }

    /// Submit a full payload to `POST /grade`.
    pub async fn grade(&self, payload: &SubmissionPayload) -> BackendResult<GradeReport> {
        info!(
            "Submitting {} categories ({} candidates) for grading",
            payload.config_candidates.len(),
            payload.total_candidates()
        );

        let raw = retry_with_backoff(&self.policy, "grade submission", || async {
            let response = self.client.post(&self.grade_url).json(payload).send().await?;
            let response = check_status(response).await?;
            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| BackendError::Malformed(format!("grade response: {}", e)))
        })
        .await?;

        debug!("Grade response: {}", raw);
        Ok(GradeReport::from_value(raw))
    }

    /// Score one category's candidate list via `POST /evaluate`. Ids past
    /// the endpoint's cap are dropped before sending.
    pub async fn evaluate(
        &self,
        config_name: &str,
        ids: &[CandidateId],
    ) -> BackendResult<EvaluationReport> {
        let ids = &ids[..ids.len().min(MAX_IDS_PER_EVALUATION)];
        let request = EvaluateRequest {
            config_path: config_name,
            object_ids: ids,
        };

        let report = retry_with_backoff(&self.policy, "evaluation", || async {
            let response = self
                .client
                .post(&self.evaluate_url)
                .json(&request)
                .send()
                .await?;
            let response = check_status(response).await?;
            response
                .json::<EvaluationReport>()
                .await
                .map_err(|e| BackendError::Malformed(format!("evaluate response: {}", e)))
        })
        .await?;

        info!(
            "Evaluation for {}: {:.2}",
            config_name, report.average_final_score
        );
        Ok(report)
    }
}
