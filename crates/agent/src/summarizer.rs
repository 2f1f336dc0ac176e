use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use velocity_core::domain::analysis::{AnalysisDraft, MAX_HIGHLIGHTS};
use velocity_core::errors::AnalysisError;
use velocity_core::ports::{ReviewSummarizer, SummaryRequest};

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompt::{render_summary_prompt, summary_schema};

const INVALID_KEY_MARKERS: &[&str] = &["API_KEY_INVALID", "API key not valid", "PERMISSION_DENIED"];
const QUOTA_MARKERS: &[&str] = &["RESOURCE_EXHAUSTED", "quota"];

/// [`ReviewSummarizer`] backed by any [`LlmClient`].
pub struct GeminiSummarizer<L> {
    llm: L,
}

impl<L> GeminiSummarizer<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    summary: Option<String>,
    services: Option<Vec<String>>,
    loves: Option<Vec<String>>,
}

#[async_trait]
impl<L: LlmClient> ReviewSummarizer for GeminiSummarizer<L> {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<AnalysisDraft, AnalysisError> {
        if request.reviews.is_empty() {
            return Err(AnalysisError::NoReviews);
        }

        let sample_size = request.tier.review_sample_size().min(request.reviews.len());
        let sample = &request.reviews[..sample_size];
        let prompt = render_summary_prompt(request.business_name, sample, request.known_services)
            .map_err(AnalysisError::Failed)?;
        debug!(
            business = request.business_name,
            tier = request.tier.as_str(),
            sample_size,
            "requesting review summary"
        );

        let completion = CompletionRequest { prompt, response_schema: Some(summary_schema()) };
        let text = self.llm.complete(&completion).await.map_err(|error| {
            let normalized = normalize_error(&error);
            warn!(
                event_name = "agent.summary.provider_failed",
                error_class = normalized.error_class(),
                error = %error,
                "summarization provider call failed"
            );
            normalized
        })?;

        parse_draft(&text)
    }
}

/// Fold a provider failure into the fixed user-facing taxonomy.
pub fn normalize_error(error: &LlmError) -> AnalysisError {
    let detail = error.to_string();
    match error {
        LlmError::MissingApiKey => return AnalysisError::InvalidApiKey(detail),
        LlmError::Status { status: 401 | 403, .. } => return AnalysisError::InvalidApiKey(detail),
        LlmError::Status { status: 429, .. } => return AnalysisError::QuotaExceeded(detail),
        _ => {}
    }

    let lowered = detail.to_ascii_lowercase();
    if INVALID_KEY_MARKERS.iter().any(|marker| lowered.contains(&marker.to_ascii_lowercase())) {
        AnalysisError::InvalidApiKey(detail)
    } else if QUOTA_MARKERS.iter().any(|marker| lowered.contains(&marker.to_ascii_lowercase())) {
        AnalysisError::QuotaExceeded(detail)
    } else {
        AnalysisError::Failed(detail)
    }
}

/// Pull the JSON object out of a reply that may carry prose or code fences.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Parse provider text into a draft, capping both lists.
pub fn parse_draft(raw: &str) -> Result<AnalysisDraft, AnalysisError> {
    let parsed = extract_json_object(raw)
        .and_then(|candidate| serde_json::from_str::<RawAnalysis>(candidate).ok())
        .map(Ok)
        .unwrap_or_else(|| serde_json::from_str::<RawAnalysis>(strip_fences(raw)))
        .map_err(|error| AnalysisError::Failed(format!("unparseable analysis JSON: {error}")))?;

    let summary = parsed
        .summary
        .filter(|summary| !summary.trim().is_empty())
        .ok_or_else(|| AnalysisError::Failed("analysis JSON is missing `summary`".to_string()))?;

    let mut services = parsed.services.unwrap_or_default();
    let mut loves = parsed.loves.unwrap_or_default();
    services.truncate(MAX_HIGHLIGHTS);
    loves.truncate(MAX_HIGHLIGHTS);

    Ok(AnalysisDraft { summary, services, loves })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use velocity_core::clock::{Clock, SystemClock};
    use velocity_core::domain::tier::Tier;
    use velocity_core::errors::AnalysisError;
    use velocity_core::ports::{ReviewSummarizer, SummaryRequest};
    use velocity_core::synth::ReviewSynthesizer;

    use super::{extract_json_object, normalize_error, parse_draft, GeminiSummarizer};
    use crate::llm::{CompletionRequest, LlmClient, LlmError};

    struct ScriptedLlm {
        reply: Result<String, fn() -> LlmError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), prompts: Mutex::new(Vec::new()) }
        }

        fn failing(error: fn() -> LlmError) -> Self {
            Self { reply: Err(error), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.prompts.lock().expect("prompts lock").push(request.prompt.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn zero_reviews_is_rejected_before_calling_the_provider() {
        let llm = ScriptedLlm::replying("{}");
        let summarizer = GeminiSummarizer::new(llm);

        let error = summarizer
            .summarize(SummaryRequest {
                business_name: "Apex",
                reviews: &[],
                known_services: &[],
                tier: Tier::Prospect,
            })
            .await
            .expect_err("empty reviews must fail");

        assert_eq!(error, AnalysisError::NoReviews);
        assert!(summarizer.llm.prompts.lock().expect("prompts lock").is_empty());
    }

    #[tokio::test]
    async fn sample_size_depends_on_tier() {
        let record =
            ReviewSynthesizer::new().synthesize_record("b1", Tier::Client, SystemClock.now());
        let reply = r#"{"summary":"Loved","services":["Cold Brew"],"loves":["Cozy"]}"#;

        for (tier, expected) in [(Tier::Prospect, 5), (Tier::Client, 25)] {
            let summarizer = GeminiSummarizer::new(ScriptedLlm::replying(reply));
            summarizer
                .summarize(SummaryRequest {
                    business_name: &record.name,
                    reviews: &record.reviews,
                    known_services: &record.known_products_or_services,
                    tier,
                })
                .await
                .expect("summary");

            let prompts = summarizer.llm.prompts.lock().expect("prompts lock");
            let needle = format!("Analyze the following {expected} recent reviews");
            assert!(prompts[0].contains(&needle), "{tier} should sample {expected} reviews");
            assert_eq!(prompts[0].matches("\"stars\"").count(), expected);
        }
    }

    #[tokio::test]
    async fn provider_failures_are_normalized() {
        let record =
            ReviewSynthesizer::new().synthesize_record("b2", Tier::Prospect, SystemClock.now());
        let request = SummaryRequest {
            business_name: &record.name,
            reviews: &record.reviews,
            known_services: &record.known_products_or_services,
            tier: Tier::Prospect,
        };

        let quota = GeminiSummarizer::new(ScriptedLlm::failing(|| LlmError::Status {
            status: 429,
            body: "RESOURCE_EXHAUSTED".to_string(),
        }));
        let garbage = GeminiSummarizer::new(ScriptedLlm::replying("I cannot help with that."));

        let quota_error = quota.summarize(request).await.expect_err("quota");
        let garbage_error = garbage.summarize(request).await.expect_err("garbage");

        assert!(matches!(quota_error, AnalysisError::QuotaExceeded(_)));
        assert!(matches!(garbage_error, AnalysisError::Failed(_)));
        assert_eq!(garbage_error.user_message(), "Failed to generate AI analysis.");
    }

    #[test]
    fn error_normalization_recognizes_key_and_quota_signals() {
        let cases = [
            (LlmError::MissingApiKey, "invalid_api_key"),
            (LlmError::Status { status: 403, body: String::new() }, "invalid_api_key"),
            (
                LlmError::Status { status: 400, body: "API key not valid. Pass a valid key".into() },
                "invalid_api_key",
            ),
            (LlmError::Status { status: 400, body: "PERMISSION_DENIED".into() }, "invalid_api_key"),
            (LlmError::Status { status: 429, body: String::new() }, "quota_exceeded"),
            (LlmError::Transport("daily quota reached".into()), "quota_exceeded"),
            (LlmError::EmptyResponse, "analysis_failed"),
            (LlmError::Status { status: 500, body: "internal".into() }, "analysis_failed"),
        ];

        for (error, expected) in cases {
            assert_eq!(normalize_error(&error).error_class(), expected, "{error}");
        }
    }

    #[test]
    fn json_is_extracted_from_prose_and_fences() {
        let wrapped = "Sure! Here you go:\n```json\n{\"summary\":\"Great\",\"services\":[],\"loves\":[]}\n```";
        assert_eq!(
            extract_json_object(wrapped),
            Some("{\"summary\":\"Great\",\"services\":[],\"loves\":[]}")
        );
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} backwards {"), None);

        let draft = parse_draft(wrapped).expect("draft");
        assert_eq!(draft.summary, "Great");
    }

    #[test]
    fn parse_caps_lists_and_tolerates_missing_arrays() {
        let many = r#"{"summary":"s","services":["a","b","c","d","e","f","g"],"loves":["x","y","z","w","v","u"]}"#;
        let draft = parse_draft(many).expect("draft");
        assert_eq!(draft.services.len(), 5);
        assert_eq!(draft.loves.len(), 5);
        assert_eq!(draft.services[4], "e");

        let sparse = parse_draft(r#"{"summary":"only summary"}"#).expect("draft");
        assert!(sparse.services.is_empty());
        assert!(sparse.loves.is_empty());

        let missing = parse_draft(r#"{"services":["a"]}"#).expect_err("summary required");
        assert!(matches!(missing, AnalysisError::Failed(_)));
    }
}
