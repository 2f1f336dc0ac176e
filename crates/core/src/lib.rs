pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod identifier;
pub mod pipeline;
pub mod ports;
pub mod schema;
pub mod synth;

pub use cache::{CacheEntry, CacheLane, CacheStore, FreshnessPolicy, InMemoryCacheStore, StoredBlob};
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::analysis::{AnalysisDraft, AnalysisResult};
pub use domain::business::BusinessRecord;
pub use domain::review::{Platform, Review};
pub use domain::tier::Tier;
pub use errors::{AnalysisError, StoreError};
pub use pipeline::{SessionState, WidgetData, WidgetDataService, WidgetRequest};
pub use ports::{PlaceLookup, ReviewSummarizer, SummaryRequest};
pub use synth::ReviewSynthesizer;
