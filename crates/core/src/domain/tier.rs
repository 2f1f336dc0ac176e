use std::fmt;

use serde::{Deserialize, Serialize};

/// Access level a widget is generated for.
///
/// `Prospect` is the public, unauthenticated preview; `Client` is the
/// OAuth-connected owner view with a deeper review history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Prospect,
    Client,
}

/// Shape of the synthesized review set used when no live source answers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MockProfile {
    pub review_count: usize,
    pub spacing_days: f64,
    pub total_reviews: u32,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prospect => "PROSPECT",
            Self::Client => "CLIENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prospect" => Some(Self::Prospect),
            "client" => Some(Self::Client),
            _ => None,
        }
    }

    /// Number of most-recent reviews handed to the summarizer.
    pub fn review_sample_size(&self) -> usize {
        match self {
            Self::Prospect => 5,
            Self::Client => 25,
        }
    }

    pub fn mock_profile(&self) -> MockProfile {
        match self {
            Self::Prospect => MockProfile { review_count: 10, spacing_days: 4.0, total_reviews: 45 },
            Self::Client => MockProfile { review_count: 50, spacing_days: 0.5, total_reviews: 124 },
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| format!("unsupported tier `{value}` (expected prospect|client)"))
    }
}
