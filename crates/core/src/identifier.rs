/// Literal prefix of a provider place identifier.
pub const PLACE_ID_PREFIX: &str = "ChIJ";
/// Namespace prefix of a provider resource name.
pub const RESOURCE_PREFIX: &str = "places/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Already a resource name (or a place id wrapped into one); no search needed.
    Resolved(String),
    /// Free text that has to go through text search.
    FreeText(String),
}

/// Classify a lookup query without touching the network.
///
/// Resource names pass through unchanged; bare place ids (recognized prefix,
/// no whitespace) are wrapped into the resource namespace.
pub fn classify(query: &str) -> QueryKind {
    let trimmed = query.trim();
    if trimmed.starts_with(RESOURCE_PREFIX) {
        return QueryKind::Resolved(trimmed.to_string());
    }
    if is_place_id(trimmed) {
        return QueryKind::Resolved(format!("{RESOURCE_PREFIX}{trimmed}"));
    }
    QueryKind::FreeText(trimmed.to_string())
}

pub fn is_place_id(value: &str) -> bool {
    value.starts_with(PLACE_ID_PREFIX)
        && value.len() > PLACE_ID_PREFIX.len()
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::{classify, is_place_id, QueryKind};

    #[test]
    fn place_ids_are_wrapped_into_resource_names() {
        assert_eq!(
            classify("ChIJUQvj6h-vK4cRVPaPZQIQOl0"),
            QueryKind::Resolved("places/ChIJUQvj6h-vK4cRVPaPZQIQOl0".to_string())
        );
    }

    #[test]
    fn resource_names_pass_through_unchanged() {
        assert_eq!(
            classify("places/ChIJabc"),
            QueryKind::Resolved("places/ChIJabc".to_string())
        );
    }

    #[test]
    fn text_with_whitespace_is_free_text_even_with_prefix() {
        assert_eq!(classify("ChIJ pizza"), QueryKind::FreeText("ChIJ pizza".to_string()));
        assert_eq!(
            classify("Joe's Pizza NYC"),
            QueryKind::FreeText("Joe's Pizza NYC".to_string())
        );
        assert!(!is_place_id("ChIJ"));
    }
}
