//! Contracts for the external collaborators the pipeline calls out to.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::analysis::AnalysisDraft;
use crate::domain::business::BusinessRecord;
use crate::domain::review::Review;
use crate::domain::tier::Tier;
use crate::errors::AnalysisError;

/// Resolves a business against a live places provider.
///
/// Ordinary failures (missing credentials, transport errors, non-success
/// status, zero results, malformed payloads) are reported as `None`.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn resolve_identifier(&self, query: &str, credentials: Option<&str>) -> Option<String>;

    /// `now` anchors review dates the provider leaves out.
    async fn fetch_details(
        &self,
        resource_name: &str,
        credentials: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<BusinessRecord>;
}

#[derive(Clone, Copy, Debug)]
pub struct SummaryRequest<'a> {
    pub business_name: &'a str,
    /// Most recent first; the adapter samples a tier-sized prefix.
    pub reviews: &'a [Review],
    pub known_services: &'a [String],
    pub tier: Tier,
}

#[async_trait]
pub trait ReviewSummarizer: Send + Sync {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<AnalysisDraft, AnalysisError>;
}

#[async_trait]
impl<L: PlaceLookup + ?Sized> PlaceLookup for Arc<L> {
    async fn resolve_identifier(&self, query: &str, credentials: Option<&str>) -> Option<String> {
        (**self).resolve_identifier(query, credentials).await
    }

    async fn fetch_details(
        &self,
        resource_name: &str,
        credentials: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<BusinessRecord> {
        (**self).fetch_details(resource_name, credentials, now).await
    }
}

#[async_trait]
impl<A: ReviewSummarizer + ?Sized> ReviewSummarizer for Arc<A> {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<AnalysisDraft, AnalysisError> {
        (**self).summarize(request).await
    }
}
