use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::review::Review;

/// Window used for the review velocity metric.
pub const VELOCITY_WINDOW_DAYS: i64 = 30;

/// Acquired state of one business at one point in time.
///
/// Records are never mutated after construction; a new fetch produces a new
/// record. `average_rating` is what the provider reported, not an average of
/// `reviews`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub total_reviews: u32,
    pub average_rating: f64,
    /// Most recent first by convention.
    pub reviews: Vec<Review>,
    pub last_review_date: DateTime<Utc>,
    pub known_products_or_services: Vec<String>,
    pub is_mock: bool,
}

impl BusinessRecord {
    /// Reviews dated strictly inside the trailing 30-day window ending at `now`.
    pub fn velocity(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(VELOCITY_WINDOW_DAYS);
        self.reviews.iter().filter(|review| review.date > cutoff).count()
    }

    pub fn provenance(&self) -> &'static str {
        if self.is_mock {
            "mock"
        } else {
            "live"
        }
    }
}
