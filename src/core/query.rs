use crate::core::parsing::format_gbp;
use crate::models::{ComposedQuery, FilterSet, PreferenceSchema};

/// Location used when the buyer names no area
pub const DEFAULT_LOCATION: &str = "London";

/// Turns a preference schema into a search sentence plus hard filters
///
/// The sentence is built in a fixed field order: property type, areas,
/// bedrooms/bathrooms, outdoor space, budget, must-have features, community
/// type, transport, amenities. Identical preferences always produce the
/// identical string, which is what the embedding cache keys on.
#[derive(Debug, Clone)]
pub struct QueryComposer {
    default_location: String,
}

impl QueryComposer {
    pub fn new(default_location: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
        }
    }

    /// Compose the query text and filter set. Never fails.
    pub fn compose(&self, prefs: &PreferenceSchema) -> ComposedQuery {
        let subject = if prefs.property_type.is_empty() {
            "property".to_string()
        } else {
            join_natural(&prefs.property_type.iter().cloned().collect::<Vec<_>>(), "or")
        };

        let location = if prefs.preferred_areas.is_empty() {
            self.default_location.clone()
        } else {
            join_natural(&prefs.preferred_areas, "or")
        };

        let mut clauses = Vec::new();

        let bedrooms = describe_count(prefs.bedrooms_min, prefs.bedrooms_max, "bedroom");
        let bathrooms = describe_count(prefs.bathrooms_min, prefs.bathrooms_max, "bathroom");
        match (bedrooms, bathrooms) {
            (Some(bed), Some(bath)) => clauses.push(format!("with {} and {}", bed, bath)),
            (Some(rooms), None) | (None, Some(rooms)) => clauses.push(format!("with {}", rooms)),
            (None, None) => {}
        }

        if let Some(outdoor) = &prefs.outdoor_space {
            clauses.push(format!("outdoor space: {}", normalize_text(outdoor)));
        }

        if prefs.budget_min.is_some() || prefs.budget_max.is_some() {
            clauses.push(format!("priced {}", describe_budget(prefs.budget_min, prefs.budget_max)));
        }

        if !prefs.must_have_features.is_empty() {
            let features: Vec<String> = prefs.must_have_features.iter().cloned().collect();
            clauses.push(format!("featuring {}", join_natural(&features, "and")));
        }

        if let Some(community) = &prefs.community_type {
            clauses.push(format!("suited to {}", normalize_text(community)));
        }

        if let Some(transport) = &prefs.transport_preference {
            clauses.push(format!("transport: {}", normalize_text(transport)));
        }
        match (&prefs.commute_destination, prefs.commute_max_minutes) {
            (Some(dest), Some(minutes)) => {
                clauses.push(format!("commuting to {} within {} minutes", dest.trim(), minutes))
            }
            (Some(dest), None) => clauses.push(format!("commuting to {}", dest.trim())),
            (None, Some(minutes)) => clauses.push(format!("commute under {} minutes", minutes)),
            (None, None) => {}
        }

        if !prefs.amenities.is_empty() {
            let amenities: Vec<String> = prefs.amenities.iter().cloned().collect();
            clauses.push(format!("close to {}", join_natural(&amenities, "and")));
        }

        let mut query_text = format!("{} in {}", subject, location);
        for clause in clauses {
            query_text.push_str(", ");
            query_text.push_str(&clause);
        }

        let filters = build_filters(prefs);

        tracing::debug!("Composed query: {}", query_text);

        ComposedQuery { query_text, filters }
    }
}

impl Default for QueryComposer {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION)
    }
}

/// Compose with the default location
pub fn compose(prefs: &PreferenceSchema) -> ComposedQuery {
    QueryComposer::default().compose(prefs)
}

impl ComposedQuery {
    /// Key under which the query embedding is cached
    pub fn cache_key(&self) -> String {
        format!("query:{}", self.query_text)
    }
}

/// Extract the constraints that semantic search alone cannot guarantee
pub fn build_filters(prefs: &PreferenceSchema) -> FilterSet {
    FilterSet {
        budget_min: prefs.budget_min,
        budget_max: prefs.budget_max,
        bedrooms_min: prefs.bedrooms_min,
        bedrooms_max: prefs.bedrooms_max,
        bathrooms_min: prefs.bathrooms_min,
        bathrooms_max: prefs.bathrooms_max,
        excluded_areas: prefs.excluded_areas.iter().map(|a| a.to_lowercase()).collect(),
        property_types: prefs.property_type.iter().map(|t| t.to_lowercase()).collect(),
    }
}

/// "£400,000 to £650,000", "under £500,000", "from £300,000"
pub fn describe_budget(min: Option<u64>, max: Option<u64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min == max => format!("around {}", format_gbp(min)),
        (Some(min), Some(max)) => format!("{} to {}", format_gbp(min), format_gbp(max)),
        (Some(min), None) => format!("from {}", format_gbp(min)),
        (None, Some(max)) => format!("under {}", format_gbp(max)),
        (None, None) => "any budget".to_string(),
    }
}

/// "2-3 bedrooms", "at least 3 bedrooms", "1 bathroom", "studio"
pub fn describe_count(min: Option<u8>, max: Option<u8>, unit: &str) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) if min == max => Some(count_phrase(min, unit)),
        (Some(0), Some(max)) if unit == "bedroom" => Some(format!("studio to {}", count_phrase(max, unit))),
        (Some(min), Some(max)) => Some(format!("{}-{} {}s", min, max, unit)),
        (Some(min), None) => Some(format!("at least {}", count_phrase(min, unit))),
        (None, Some(max)) => Some(format!("up to {}", count_phrase(max, unit))),
        (None, None) => None,
    }
}

pub(crate) fn count_phrase(n: u8, unit: &str) -> String {
    match n {
        0 if unit == "bedroom" => "studio".to_string(),
        1 => format!("1 {}", unit),
        n => format!("{} {}s", n, unit),
    }
}

/// "a", "a or b", "a, b or c"
fn join_natural(items: &[String], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} {} {}", init.join(", "), conjunction, last),
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '!'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_preferences_give_generic_query() {
        let composed = compose(&PreferenceSchema::default());
        assert_eq!(composed.query_text, "property in London");
        assert!(composed.filters.is_empty());
    }

    #[test]
    fn test_field_order() {
        let prefs = PreferenceSchema {
            property_type: set(&["flat"]),
            budget_min: Some(500_000),
            budget_max: Some(600_000),
            bedrooms_min: Some(2),
            preferred_areas: vec!["Clapham".to_string(), "Brixton".to_string()],
            amenities: set(&["cafes", "gyms"]),
            transport_preference: Some("Tube access".to_string()),
            ..Default::default()
        };

        let composed = compose(&prefs);
        assert_eq!(
            composed.query_text,
            "flat in Clapham or Brixton, with at least 2 bedrooms, priced £500,000 to £600,000, \
             transport: tube access, close to cafes and gyms"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let prefs = PreferenceSchema {
            property_type: set(&["terraced house", "semi-detached house"]),
            must_have_features: set(&["parking", "period features", "garden"]),
            community_type: Some("Established family neighbourhoods".to_string()),
            ..Default::default()
        };

        let first = compose(&prefs);
        let second = compose(&prefs.clone());
        assert_eq!(first.query_text, second.query_text);
        assert_eq!(first.cache_key(), second.cache_key());
    }

    #[test]
    fn test_filters_carry_hard_constraints() {
        let prefs = PreferenceSchema {
            property_type: set(&["Flat"]),
            budget_max: Some(450_000),
            bathrooms_min: Some(1),
            excluded_areas: set(&["croydon"]),
            amenities: set(&["parks"]),
            ..Default::default()
        };

        let filters = compose(&prefs).filters;
        assert_eq!(filters.budget_max, Some(450_000));
        assert_eq!(filters.bathrooms_min, Some(1));
        assert!(filters.excluded_areas.contains("croydon"));
        assert!(filters.property_types.contains("flat"));
    }

    #[test]
    fn test_custom_default_location() {
        let composer = QueryComposer::new("Manchester");
        assert_eq!(composer.compose(&PreferenceSchema::default()).query_text, "property in Manchester");
    }

    #[test]
    fn test_describe_count() {
        assert_eq!(describe_count(Some(0), Some(1), "bedroom").as_deref(), Some("studio to 1 bedroom"));
        assert_eq!(describe_count(Some(2), Some(3), "bathroom").as_deref(), Some("2-3 bathrooms"));
        assert_eq!(describe_count(None, Some(2), "bedroom").as_deref(), Some("up to 2 bedrooms"));
        assert_eq!(describe_count(None, None, "bedroom"), None);
    }
}
