use thiserror::Error;

/// Failure of the key-value store backing both cache lanes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("store codec failure: {0}")]
    Codec(String),
}

/// Normalized summarization failures.
///
/// Provider exceptions never cross this boundary raw; they are folded into
/// one of these variants, each with a fixed user-facing message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no reviews provided for analysis")]
    NoReviews,
    #[error("summarization provider rejected the API key: {0}")]
    InvalidApiKey(String),
    #[error("summarization provider quota exhausted: {0}")]
    QuotaExceeded(String),
    #[error("summarization failed: {0}")]
    Failed(String),
}

impl AnalysisError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoReviews => "No reviews provided for analysis.",
            Self::InvalidApiKey(_) => {
                "Invalid API key. Check the AI provider key in your configuration."
            }
            Self::QuotaExceeded(_) => "API quota exceeded. Please try again later.",
            Self::Failed(_) => "Failed to generate AI analysis.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NoReviews => "no_reviews",
            Self::InvalidApiKey(_) => "invalid_api_key",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::Failed(_) => "analysis_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::AnalysisError;

    #[test]
    fn analysis_errors_expose_distinct_user_messages() {
        let key = AnalysisError::InvalidApiKey("API_KEY_INVALID".to_owned());
        let quota = AnalysisError::QuotaExceeded("RESOURCE_EXHAUSTED".to_owned());
        let generic = AnalysisError::Failed("bad json".to_owned());

        assert!(key.user_message().starts_with("Invalid API key"));
        assert!(quota.user_message().starts_with("API quota exceeded"));
        assert_eq!(generic.user_message(), "Failed to generate AI analysis.");
        assert_ne!(key.error_class(), quota.error_class());
    }

    #[test]
    fn user_messages_do_not_leak_provider_detail() {
        let error = AnalysisError::Failed("upstream said: secret-key-123 rejected".to_owned());
        assert!(!error.user_message().contains("secret-key-123"));
    }
}
