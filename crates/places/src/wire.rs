//! Provider payload shapes and their mapping into domain records.
//!
//! Every field is optional on the wire; defaults are applied here so loose
//! provider JSON never reaches the pipeline.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use velocity_core::domain::business::BusinessRecord;
use velocity_core::domain::review::{clamp_rating, Platform, Review};
use velocity_core::identifier::RESOURCE_PREFIX;

pub const SEARCH_FIELD_MASK: &str = "places.name,places.id,places.formattedAddress";
pub const DETAILS_FIELD_MASK: &str = "id,displayName,formattedAddress,rating,userRatingCount,reviews";

const UNKNOWN_BUSINESS: &str = "Unknown Business";
const ANONYMOUS_AUTHOR: &str = "Google User";

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub places: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub name: Option<String>,
}

impl SearchResponse {
    /// Resource name of the first hit, e.g. `places/ChIJ...`.
    pub fn first_resource_name(self) -> Option<String> {
        self.places
            .into_iter()
            .next()
            .and_then(|hit| hit.name)
            .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub id: Option<String>,
    pub display_name: Option<LocalizedText>,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub user_rating_count: Option<u32>,
    #[serde(default)]
    pub reviews: Vec<PlaceReview>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalizedText {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceReview {
    pub rating: Option<f64>,
    pub text: Option<LocalizedText>,
    pub original_text: Option<LocalizedText>,
    pub publish_time: Option<String>,
    pub author_attribution: Option<AuthorAttribution>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAttribution {
    pub display_name: Option<String>,
}

fn non_empty(text: Option<&LocalizedText>) -> Option<&str> {
    text.and_then(|text| text.text.as_deref()).filter(|text| !text.is_empty())
}

impl PlaceReview {
    fn into_review(self, index: usize, now: DateTime<Utc>) -> Review {
        let text = non_empty(self.text.as_ref())
            .or_else(|| non_empty(self.original_text.as_ref()))
            .unwrap_or_default()
            .to_string();
        let author = self
            .author_attribution
            .and_then(|author| author.display_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());
        let date = self
            .publish_time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|date| date.with_timezone(&Utc))
            .unwrap_or(now);

        Review {
            id: format!("g-rev-{index}"),
            author,
            rating: clamp_rating(self.rating.unwrap_or(f64::NAN)),
            text,
            date,
            platform: Platform::Google,
        }
    }
}

impl PlaceDetails {
    /// Map into a live record. `resource_name` supplies the id when the
    /// payload omits one.
    pub fn into_record(self, resource_name: &str, now: DateTime<Utc>) -> BusinessRecord {
        let reviews: Vec<Review> = self
            .reviews
            .into_iter()
            .enumerate()
            .map(|(index, review)| review.into_review(index, now))
            .collect();
        let last_review_date = reviews.first().map(|review| review.date).unwrap_or(now);
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| resource_name.trim_start_matches(RESOURCE_PREFIX).to_string());
        let average_rating = match self.rating {
            Some(rating) if rating.is_finite() => rating.clamp(0.0, 5.0),
            _ => 0.0,
        };

        BusinessRecord {
            id,
            name: self
                .display_name
                .and_then(|name| name.text)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_BUSINESS.to_string()),
            address: self.formatted_address.unwrap_or_default(),
            total_reviews: self.user_rating_count.unwrap_or(0),
            average_rating,
            reviews,
            last_review_date,
            known_products_or_services: Vec::new(),
            is_mock: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{PlaceDetails, SearchResponse};

    #[test]
    fn details_mapping_applies_fallbacks() {
        let now = Utc.with_ymd_and_hms(2026, 7, 4, 15, 0, 0).single().expect("valid date");
        let details: PlaceDetails = serde_json::from_value(json!({
            "rating": 7.5,
            "reviews": [
                {
                    "rating": 4,
                    "originalText": { "text": "Muy bueno" },
                    "publishTime": "2026-07-01T10:00:00Z",
                    "authorAttribution": { "displayName": "Ana" }
                },
                { "rating": 9, "text": { "text": "" } }
            ]
        }))
        .expect("decode details");

        let record = details.into_record("places/ChIJabc", now);

        assert_eq!(record.id, "ChIJabc");
        assert_eq!(record.name, "Unknown Business");
        assert_eq!(record.address, "");
        assert_eq!(record.total_reviews, 0);
        assert_eq!(record.average_rating, 5.0);
        assert!(!record.is_mock);
        assert_eq!(record.reviews[0].text, "Muy bueno");
        assert_eq!(record.reviews[0].author, "Ana");
        assert_eq!(record.last_review_date, record.reviews[0].date);
        assert_eq!(record.reviews[1].id, "g-rev-1");
        assert_eq!(record.reviews[1].author, "Google User");
        assert_eq!(record.reviews[1].rating, 5);
        assert_eq!(record.reviews[1].text, "");
        assert_eq!(record.reviews[1].date, now);
    }

    #[test]
    fn empty_search_yields_no_resource() {
        let empty: SearchResponse = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(empty.first_resource_name(), None);

        let hits: SearchResponse = serde_json::from_value(json!({
            "places": [{ "name": "places/ChIJfirst" }, { "name": "places/ChIJsecond" }]
        }))
        .expect("decode");
        assert_eq!(hits.first_resource_name(), Some("places/ChIJfirst".to_string()));
    }
}
