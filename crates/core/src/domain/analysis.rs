use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum entries kept in each of `services` and `loves`.
pub const MAX_HIGHLIGHTS: usize = 5;

/// Summarizer output before it is stamped with a generation time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDraft {
    pub summary: String,
    pub services: Vec<String>,
    pub loves: Vec<String>,
}

/// AI-derived commentary over a business's reviews.
///
/// `services` holds tangible offerings and `loves` abstract qualities; the
/// split is the producing adapter's contract and is not checked here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub services: Vec<String>,
    pub loves: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn from_draft(draft: AnalysisDraft, generated_at: DateTime<Utc>) -> Self {
        let AnalysisDraft { summary, mut services, mut loves } = draft;
        services.truncate(MAX_HIGHLIGHTS);
        loves.truncate(MAX_HIGHLIGHTS);
        Self { summary, services, loves, last_updated: generated_at }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{AnalysisDraft, AnalysisResult, MAX_HIGHLIGHTS};

    #[test]
    fn from_draft_caps_highlights_and_stamps_generation_time() {
        let generated_at =
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid timestamp");
        let draft = AnalysisDraft {
            summary: "Busy and loved.".to_string(),
            services: (0..8).map(|index| format!("Service {index}")).collect(),
            loves: vec!["Friendly".to_string()],
        };

        let analysis = AnalysisResult::from_draft(draft, generated_at);

        assert_eq!(analysis.services.len(), MAX_HIGHLIGHTS);
        assert_eq!(analysis.services[4], "Service 4");
        assert_eq!(analysis.loves, vec!["Friendly".to_string()]);
        assert_eq!(analysis.last_updated, generated_at);
    }

    #[test]
    fn last_updated_serializes_as_epoch_milliseconds() {
        let generated_at =
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid timestamp");
        let analysis = AnalysisResult::from_draft(AnalysisDraft::default(), generated_at);

        let value = serde_json::to_value(&analysis).expect("serialize analysis");
        assert_eq!(value["last_updated"], generated_at.timestamp_millis());
    }
}
