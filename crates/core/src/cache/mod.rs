//! Cache lanes shared by business metrics and AI analysis.
//!
//! Both lanes store a [`CacheEntry`] envelope in the same flat key-value
//! store; they differ only in key derivation and freshness window.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::tier::Tier;
use crate::errors::StoreError;

pub use memory::InMemoryCacheStore;

pub const METRICS_KEY_PREFIX: &str = "rv_business_data";
pub const ANALYSIS_KEY_PREFIX: &str = "rv_ai_analysis";
pub const SESSION_KEY: &str = "rv_session";

/// Opaque serialized value plus its write time, as held by a [`CacheStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub body: String,
    pub written_at: DateTime<Utc>,
}

/// Flat string-keyed blob storage. Writes to one key are atomic; concurrent
/// writers to the same key resolve last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, StoreError>;
    async fn put(&self, key: &str, blob: StoredBlob) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Discard every key.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, StoreError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, blob: StoredBlob) -> Result<(), StoreError> {
        (**self).put(key, blob).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLane {
    Metrics,
    Analysis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub metrics_window: Duration,
    pub analysis_window: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self { metrics_window: Duration::hours(24), analysis_window: Duration::days(7) }
    }
}

impl FreshnessPolicy {
    pub fn from_secs(metrics_ttl_secs: u64, analysis_ttl_secs: u64) -> Self {
        Self { metrics_window: ttl(metrics_ttl_secs), analysis_window: ttl(analysis_ttl_secs) }
    }

    pub fn window(&self, lane: CacheLane) -> Duration {
        match lane {
            CacheLane::Metrics => self.metrics_window,
            CacheLane::Analysis => self.analysis_window,
        }
    }

    /// Fresh iff `now - written_at < window`. Future timestamps count as fresh.
    pub fn is_fresh(&self, lane: CacheLane, written_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(written_at) < self.window(lane)
    }
}

/// TTLs past chrono's range saturate instead of panicking.
fn ttl(secs: u64) -> Duration {
    i64::try_from(secs).ok().and_then(Duration::try_seconds).unwrap_or(Duration::MAX)
}

/// Payload plus the time it was written.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<T> {
    pub written_at: DateTime<Utc>,
    pub data: T,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, written_at: DateTime<Utc>) -> Self {
        Self { written_at, data }
    }
}

impl<T: Serialize> CacheEntry<T> {
    pub fn encode(&self) -> Result<StoredBlob, StoreError> {
        let body =
            serde_json::to_string(&self.data).map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(StoredBlob { body, written_at: self.written_at })
    }
}

impl<T: DeserializeOwned> CacheEntry<T> {
    pub fn decode(blob: StoredBlob) -> Result<Self, StoreError> {
        let data =
            serde_json::from_str(&blob.body).map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(Self { written_at: blob.written_at, data })
    }
}

/// Metrics-lane key. The free-text query is part of the key so different
/// searches under one business id never share an entry.
pub fn metrics_key(business_id: &str, query: &str) -> String {
    format!(
        "{METRICS_KEY_PREFIX}:{}:{}",
        escape_component(business_id),
        escape_component(query.trim())
    )
}

/// Analysis-lane key. Tier is part of the key because client analysis uses a
/// larger review sample.
pub fn analysis_key(business_id: &str, tier: Tier) -> String {
    format!("{ANALYSIS_KEY_PREFIX}:{}:{}", escape_component(business_id), tier.as_str())
}

fn escape_component(raw: &str) -> String {
    raw.replace('%', "%25").replace(':', "%3A")
}
