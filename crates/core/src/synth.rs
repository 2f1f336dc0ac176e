//! Review Synthesizer: deterministic review sets for the mock data source.
//!
//! Output depends only on its inputs plus the `today` anchor. The spacing
//! between consecutive review dates is chosen by the caller, so a small
//! spacing simulates a high-velocity business and a large one sparse flow.

use chrono::{DateTime, Duration, Utc};

use crate::catalog;
use crate::domain::business::BusinessRecord;
use crate::domain::review::{Platform, Review};
use crate::domain::tier::Tier;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

struct Template {
    text: &'static str,
    rating: u8,
}

const NAME_PLACEHOLDER: &str = "{name}";

const TEMPLATES: [Template; 10] = [
    Template { text: "Absolutely love {name}! The team is fantastic.", rating: 5 },
    Template { text: "Great experience, but the wait time was a bit long.", rating: 4 },
    Template { text: "Best service in town. Highly recommend to everyone.", rating: 5 },
    Template { text: "Professional and clean. Will come again.", rating: 5 },
    Template { text: "A bit pricey, but worth it for the quality.", rating: 4 },
    Template { text: "Exceptional attention to detail.", rating: 5 },
    Template { text: "Friendly staff made my day.", rating: 5 },
    Template { text: "Not what I expected, could be improved.", rating: 3 },
    Template { text: "Incredible value!", rating: 5 },
    Template { text: "Just okay.", rating: 3 },
];

#[derive(Clone, Copy, Debug, Default)]
pub struct ReviewSynthesizer;

impl ReviewSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Produce `count` reviews, newest first, the i-th dated
    /// `today - i * spacing_days`.
    pub fn generate(
        &self,
        count: usize,
        business_name: &str,
        spacing_days: f64,
        today: DateTime<Utc>,
    ) -> Vec<Review> {
        (0..count)
            .map(|index| {
                let template = &TEMPLATES[index % TEMPLATES.len()];
                Review {
                    id: format!("rev-{index}"),
                    author: format!("Customer {}", index + 1),
                    rating: template.rating,
                    text: template.text.replace(NAME_PLACEHOLDER, business_name),
                    date: review_date(today, index, spacing_days),
                    platform: Platform::Google,
                }
            })
            .collect()
    }

    /// Full mock record for `business_id`, shaped by the tier's mock profile.
    pub fn synthesize_record(
        &self,
        business_id: &str,
        tier: Tier,
        now: DateTime<Utc>,
    ) -> BusinessRecord {
        let demo = catalog::resolve(business_id);
        let profile = tier.mock_profile();

        BusinessRecord {
            id: business_id.to_string(),
            name: demo.name.to_string(),
            address: demo.address.to_string(),
            total_reviews: profile.total_reviews,
            average_rating: demo.average_rating,
            reviews: self.generate(profile.review_count, demo.name, profile.spacing_days, now),
            last_review_date: now,
            known_products_or_services: demo.products.iter().map(|p| p.to_string()).collect(),
            is_mock: true,
        }
    }
}

/// Whole-millisecond offset, never fewer than `index` ms, so dates strictly
/// decrease for any positive spacing. Dates past chrono's range pin to its minimum.
fn review_date(today: DateTime<Utc>, index: usize, spacing_days: f64) -> DateTime<Utc> {
    let offset_ms = (index as f64 * spacing_days * MILLIS_PER_DAY).round() as i64;
    let offset_ms = offset_ms.max(i64::try_from(index).unwrap_or(i64::MAX));
    Duration::try_milliseconds(offset_ms)
        .and_then(|offset| today.checked_sub_signed(offset))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
