//! Submission fan-out: best-effort delivery of a completed quiz to every
//! configured downstream sink.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::config::Config;
use super::quiz_engine::AnswerMap;
use super::scoring::{RiskLevel, ScaleLevel, ScoreResult};

const SINK_TIMEOUT: Duration = Duration::from_secs(10);
const EMAIL_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
}

/// Request metadata captured alongside the answers
#[derive(Debug, Clone, Default)]
pub struct SubmissionMeta {
    pub source: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// The full flattened record handed to every sink
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub first_name: String,
    pub email: String,
    pub score: f64,
    pub estimated_testosterone: f64,
    pub testosterone_level: ScaleLevel,
    pub risk_level: RiskLevel,
    pub recommended_tier: String,
    pub answers: AnswerMap,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(answers: AnswerMap, result: &ScoreResult, meta: SubmissionMeta) -> Self {
        let first_name = contact_field(&answers, "first_name");
        let email = contact_field(&answers, "email");
        Self {
            first_name,
            email,
            score: result.total_score,
            estimated_testosterone: result.estimated_testosterone.value,
            testosterone_level: result.estimated_testosterone.level,
            risk_level: result.level,
            recommended_tier: result.recommended_tier.clone(),
            answers,
            source: meta.source,
            user_agent: meta.user_agent,
            referrer: meta.referrer,
            submitted_at: Utc::now(),
        }
    }
}

fn contact_field(answers: &AnswerMap, id: &str) -> String {
    answers
        .get(id)
        .and_then(|value| value.as_text())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// A single downstream delivery target
#[async_trait]
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), SinkError>;
}

/// REST insert into the hosted result store
pub struct ResultStoreSink {
    http: Client,
    url: String,
    api_key: String,
}

#[async_trait]
impl ResultSink for ResultStoreSink {
    fn name(&self) -> &'static str {
        "result-store"
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), SinkError> {
        let res = self
            .http
            .post(&self.url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(res).await
    }
}

/// Transactional result email
pub struct ResultEmailSink {
    http: Client,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct EmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

#[async_trait]
impl ResultSink for ResultEmailSink {
    fn name(&self) -> &'static str {
        "result-email"
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), SinkError> {
        let request = EmailRequest {
            from: self.from.clone(),
            to: vec![record.email.clone()],
            subject: "Your testosterone index results".to_string(),
            html: render_result_email(record),
        };
        let res = self
            .http
            .post(EMAIL_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(res).await
    }
}

/// Plain JSON POST mirroring the payload to the legacy endpoint
pub struct LegacyWebhookSink {
    http: Client,
    url: String,
}

#[async_trait]
impl ResultSink for LegacyWebhookSink {
    fn name(&self) -> &'static str {
        "legacy-webhook"
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), SinkError> {
        let res = self
            .http
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(res).await
    }
}

fn render_result_email(record: &SubmissionRecord) -> String {
    let name = if record.first_name.is_empty() {
        "there"
    } else {
        &record.first_name
    };
    format!(
        r#"<div style="font-family:Arial,Helvetica,sans-serif;max-width:560px;margin:0 auto;color:#1a1a1a">
  <h2>Hi {name}, your results are in</h2>
  <p>Your testosterone index: <strong>{score:.0}/100</strong></p>
  <p>Estimated testosterone: <strong>{testosterone:.0} ng/dL</strong> ({testosterone_level})</p>
  <p>Risk level: <strong>{risk}</strong></p>
  <p>Recommended program: <strong>{tier}</strong></p>
  <p>Open the app to see your full breakdown and start your 30-day plan.</p>
</div>"#,
        name = name,
        score = record.score,
        testosterone = record.estimated_testosterone,
        testosterone_level = record.testosterone_level,
        risk = record.risk_level,
        tier = record.recommended_tier,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Invokes every configured sink concurrently, each inside its own fault
/// boundary: failures are logged and swallowed so submission never blocks
/// the user-visible flow.
pub struct SubmissionDispatcher {
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl SubmissionDispatcher {
    pub fn new(sinks: Vec<Arc<dyn ResultSink>>) -> Self {
        Self { sinks }
    }

    /// Build the dispatcher from whichever sinks the environment configures
    pub fn from_config(config: &Config) -> Self {
        let http = Client::builder()
            .timeout(SINK_TIMEOUT)
            .build()
            .unwrap_or_default();
        let mut sinks: Vec<Arc<dyn ResultSink>> = Vec::new();

        if let (Some(url), Some(api_key)) = (
            config.result_store_url.clone(),
            config.result_store_key.clone(),
        ) {
            sinks.push(Arc::new(ResultStoreSink {
                http: http.clone(),
                url,
                api_key,
            }));
        }
        if let Some(api_key) = config.email_api_key.clone() {
            sinks.push(Arc::new(ResultEmailSink {
                http: http.clone(),
                api_key,
                from: config.email_from.clone(),
            }));
        }
        if let Some(url) = config.legacy_webhook_url.clone() {
            sinks.push(Arc::new(LegacyWebhookSink { http, url }));
        }

        info!(sink_count = sinks.len(), "submission dispatcher configured");
        Self { sinks }
    }

    pub async fn dispatch_all(&self, record: &SubmissionRecord) -> DeliverySummary {
        let outcomes = join_all(self.sinks.iter().map(|sink| async move {
            match sink.deliver(record).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(sink = sink.name(), error = %e, "result delivery failed");
                    false
                }
            }
        }))
        .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let summary = DeliverySummary {
            delivered,
            failed: outcomes.len() - delivered,
        };
        info!(
            delivered = summary.delivered,
            failed = summary.failed,
            email = %record.email,
            "quiz submission dispatched"
        );
        summary
    }
}

/// Query string for the result view; the result page depends on these
/// parameter names verbatim.
pub fn result_query(result: &ScoreResult, first_name: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("score", &format!("{:.0}", result.total_score))
        .append_pair(
            "testosterone",
            &format!("{:.0}", result.estimated_testosterone.value),
        )
        .append_pair("level", &result.level.to_string())
        .append_pair("name", first_name)
        .finish()
}

fn map_reqwest_error(e: reqwest::Error) -> SinkError {
    SinkError::Transport(e.to_string())
}

async fn check_status(res: reqwest::Response) -> Result<(), SinkError> {
    let status = res.status();
    if status.is_success() {
        return Ok(());
    }
    let body = res.text().await.unwrap_or_default();
    Err(SinkError::Http {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::services::quiz_engine::AnswerValue;
    use crate::services::scoring::{calculate_score, NormalizedQuizData};

    struct RecordingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl ResultSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, _record: &SubmissionRecord) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SinkError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn sample_record() -> SubmissionRecord {
        let mut answers = AnswerMap::new();
        answers.insert(
            "first_name".to_string(),
            AnswerValue::Text("Jan".to_string()),
        );
        answers.insert(
            "email".to_string(),
            AnswerValue::Text("jan@example.com".to_string()),
        );
        answers.insert("age".to_string(), AnswerValue::Number(34.0));
        let result = calculate_score(&NormalizedQuizData::from_answers(&answers));
        SubmissionRecord::new(
            answers,
            &result,
            SubmissionMeta {
                source: "quiz".to_string(),
                user_agent: Some("test-agent".to_string()),
                referrer: None,
            },
        )
    }

    #[tokio::test]
    async fn a_failing_sink_does_not_stop_the_others() {
        let failing = RecordingSink::new(true);
        let ok_a = RecordingSink::new(false);
        let ok_b = RecordingSink::new(false);
        let dispatcher = SubmissionDispatcher::new(vec![
            failing.clone(),
            ok_a.clone(),
            ok_b.clone(),
        ]);

        let summary = dispatcher.dispatch_all(&sample_record()).await;

        assert_eq!(summary, DeliverySummary { delivered: 2, failed: 1 });
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ok_a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ok_b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_dispatcher_is_a_no_op() {
        let dispatcher = SubmissionDispatcher::new(vec![]);
        let summary = dispatcher.dispatch_all(&sample_record()).await;
        assert_eq!(summary, DeliverySummary { delivered: 0, failed: 0 });
    }

    #[test]
    fn record_lifts_contact_fields_from_answers() {
        let record = sample_record();
        assert_eq!(record.first_name, "Jan");
        assert_eq!(record.email, "jan@example.com");
        assert_eq!(record.source, "quiz");
    }

    #[test]
    fn result_query_carries_the_result_page_contract() {
        let mut answers = AnswerMap::new();
        answers.insert("age".to_string(), AnswerValue::Number(25.0));
        let result = calculate_score(&NormalizedQuizData::from_answers(&answers));
        let query = result_query(&result, "Jan Müller");

        assert!(query.contains(&format!("score={:.0}", result.total_score)));
        assert!(query.contains(&format!(
            "testosterone={:.0}",
            result.estimated_testosterone.value
        )));
        assert!(query.contains(&format!("level={}", result.level)));
        assert!(query.contains("name=Jan+M%C3%BCller"));
    }

    #[test]
    fn email_template_mentions_the_key_numbers() {
        let record = sample_record();
        let html = render_result_email(&record);
        assert!(html.contains("Jan"));
        assert!(html.contains(&format!("{:.0}/100", record.score)));
        assert!(html.contains("ng/dL"));
    }
}
