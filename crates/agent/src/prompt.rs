use serde::Serialize;
use serde_json::{json, Value};
use tera::{Context, Tera};

use velocity_core::domain::review::Review;

const SUMMARY_TEMPLATE: &str = r#"You are an expert Reputation Manager AI for 'ReviewVelocity'.
Analyze the following {{ sample_size }} recent reviews for the business "{{ business_name }}".

CONTEXT - OFFICIAL SERVICE MENU (FROM GBP):
{{ known_services }}

REVIEWS DATA:
{{ reviews }}

YOUR MISSION:
Extract intelligence for a widget. You must differentiate between TANGIBLE PRODUCTS/SERVICES and ABSTRACT QUALITIES.

RULES:
1. 'services': MUST be tangible items that customers buy or book (e.g., "Espresso", "Implants", "Oil Change", "Pizza").
   - NEGATIVE CONSTRAINT: Do NOT use abstract words like "Service", "Quality", "Experience", "Professionalism", "Staff", "Dentistry" here.
   - LOGIC: Match the reviews against the "Official Service Menu". If the reviews are vague, choose the most likely representatives from the "Official Service Menu".
   - QUANTITY: Aim for 5 items. If the data only strongly supports 2 or 3, return ONLY 2 or 3. Do not invent weak items just to hit the number 5.

2. 'loves': Abstract qualities and vibes belong here (e.g., "Friendly Staff", "Clean Atmosphere", "Great Vibe", "Fast Service", "Honest").
   - QUANTITY: Aim for 5 items. If 5 are not clearly present, return fewer.

3. 'summary': A concise, professional 2-3 sentence summary of the overall sentiment.

Return ONLY valid JSON matching the schema."#;

#[derive(Serialize)]
struct ReviewSample<'a> {
    stars: u8,
    text: &'a str,
    date: String,
}

/// Render the summarization prompt for an already-sampled review slice.
pub fn render_summary_prompt(
    business_name: &str,
    sample: &[Review],
    known_services: &[String],
) -> Result<String, String> {
    let reviews: Vec<ReviewSample<'_>> = sample
        .iter()
        .map(|review| ReviewSample {
            stars: review.rating,
            text: &review.text,
            date: review.date.to_rfc3339(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("business_name", business_name);
    context.insert("sample_size", &sample.len());
    context.insert(
        "known_services",
        &serde_json::to_string(known_services).map_err(|error| error.to_string())?,
    );
    context.insert("reviews", &serde_json::to_string(&reviews).map_err(|error| error.to_string())?);

    Tera::one_off(SUMMARY_TEMPLATE, &context, false).map_err(|error| error.to_string())
}

/// Structured-output schema for `{summary, services, loves}`.
pub fn summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "2-3 sentence sentiment summary",
            },
            "services": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Top 2-5 TANGIBLE services/products. Return fewer if data is weak.",
            },
            "loves": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Top 2-5 attributes/vibes. Return fewer if data is weak.",
            },
        },
        "required": ["summary", "services", "loves"],
    })
}
