//! schema.org JSON-LD for crawlers that read the embedded widget.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::domain::analysis::AnalysisResult;
use crate::domain::business::BusinessRecord;

pub const PENDING_SUMMARY: &str =
    "Analyzing recent customer reviews to generate reputation summary...";

/// Build the `LocalBusiness` object for `record`.
///
/// `dateModified` follows the analysis when present, otherwise `now`.
pub fn structured_data(
    record: &BusinessRecord,
    analysis: Option<&AnalysisResult>,
    now: DateTime<Utc>,
) -> Value {
    let recent = record.velocity(now);
    let modified = analysis.map(|analysis| analysis.last_updated).unwrap_or(now);
    let summary = analysis.map(|analysis| analysis.summary.as_str()).unwrap_or(PENDING_SUMMARY);
    let services: &[String] = analysis.map(|analysis| analysis.services.as_slice()).unwrap_or(&[]);
    let loves: &[String] = analysis.map(|analysis| analysis.loves.as_slice()).unwrap_or(&[]);

    let offers: Vec<Value> = services
        .iter()
        .map(|service| {
            json!({
                "@type": "Offer",
                "itemOffered": { "@type": "Service", "name": service },
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "LocalBusiness",
        "name": record.name,
        "address": record.address,
        "dateModified": modified.to_rfc3339_opts(SecondsFormat::Millis, true),
        "aggregateRating": {
            "@type": "AggregateRating",
            "ratingValue": record.average_rating,
            "reviewCount": record.total_reviews,
            "bestRating": "5",
            "worstRating": "1",
        },
        "description": format!(
            "Live Business Intelligence: {} is currently trending with {} new reviews in the last 30 days. Rated {}/5 stars. Sentiment: {}.",
            record.name, recent, record.average_rating, summary
        ),
        "makesOffer": offers,
        "reviewAspect": loves,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{structured_data, PENDING_SUMMARY};
    use crate::domain::analysis::AnalysisResult;
    use crate::domain::tier::Tier;
    use crate::synth::ReviewSynthesizer;

    #[test]
    fn pending_analysis_uses_placeholder_and_empty_lists() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).single().expect("valid date");
        let record = ReviewSynthesizer::new().synthesize_record("b1", Tier::Prospect, now);

        let value = structured_data(&record, None, now);

        assert_eq!(value["@type"], "LocalBusiness");
        assert_eq!(value["name"], "Apex Coffee Roasters");
        assert_eq!(value["aggregateRating"]["bestRating"], "5");
        assert_eq!(value["dateModified"], "2026-05-01T12:00:00.000Z");
        assert_eq!(value["makesOffer"].as_array().map(Vec::len), Some(0));
        let description = value["description"].as_str().unwrap_or_default();
        assert!(description.contains(PENDING_SUMMARY));
        // prospect mock reviews are 4 days apart: days 0..=28 fall inside the window
        assert!(description.contains("trending with 8 new reviews"));
        assert!(description.contains("Rated 4.8/5 stars"));
    }

    #[test]
    fn analysis_drives_offers_aspects_and_date() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).single().expect("valid date");
        let record = ReviewSynthesizer::new().synthesize_record("b2", Tier::Client, now);
        let analysis = AnalysisResult {
            summary: "Patients praise gentle care".to_string(),
            services: vec!["Invisalign".to_string(), "Veneers".to_string()],
            loves: vec!["Gentle".to_string()],
            last_updated: now - Duration::hours(1),
        };

        let value = structured_data(&record, Some(&analysis), now);

        assert_eq!(value["makesOffer"][1]["itemOffered"]["name"], "Veneers");
        assert_eq!(value["reviewAspect"][0], "Gentle");
        assert_eq!(value["dateModified"], "2026-05-01T11:00:00.000Z");
        assert!(value["description"]
            .as_str()
            .unwrap_or_default()
            .ends_with("Sentiment: Patients praise gentle care."));
    }
}
