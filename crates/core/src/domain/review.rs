use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Google,
    Yelp,
    Facebook,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    /// Star rating in `1..=5`.
    pub rating: u8,
    pub text: String,
    pub date: DateTime<Utc>,
    pub platform: Platform,
}

/// Clamp a provider-reported star count into the `1..=5` range.
pub fn clamp_rating(raw: f64) -> u8 {
    if raw.is_nan() {
        return 1;
    }
    raw.round().clamp(1.0, 5.0) as u8
}

#[cfg(test)]
mod tests {
    use super::clamp_rating;

    #[test]
    fn clamp_rating_keeps_values_in_star_range() {
        assert_eq!(clamp_rating(0.0), 1);
        assert_eq!(clamp_rating(4.4), 4);
        assert_eq!(clamp_rating(4.6), 5);
        assert_eq!(clamp_rating(9.0), 5);
        assert_eq!(clamp_rating(f64::NAN), 1);
    }
}
