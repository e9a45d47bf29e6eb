use crate::core::parsing::{contains_word, format_gbp, phrases_match, tokens};
use crate::core::query::count_phrase;
use crate::models::{Listing, PreferenceField, PreferenceSchema};

/// Most labels returned for one listing unless configured otherwise
pub const DEFAULT_MAX_LABELS: usize = 5;

/// Most items named inside a single label ("Nearby: cafes, parks, gyms")
const MAX_ITEMS_PER_LABEL: usize = 3;

pub(crate) const OUTDOOR_KEYWORDS: &[&str] = &[
    "roof terrace", "garden", "balcony", "terrace", "patio", "courtyard", "outdoor space",
];

pub(crate) const TRANSPORT_KEYWORDS: &[&str] = &[
    "tube", "underground", "overground", "elizabeth line", "dlr", "rail", "station", "bus", "tram",
];

/// Keywords that tie a free-text priority to a preference field, checked in
/// this order so that "outdoor space" lands on outdoor space, not bedrooms
const PRIORITY_KEYWORDS: &[(PreferenceField, &[&str])] = &[
    (
        PreferenceField::Transport,
        &["transport", "tube", "commute", "commuting", "rail", "station", "link", "connection",
          "overground", "dlr", "bus", "underground"],
    ),
    (
        PreferenceField::Budget,
        &["budget", "price", "value", "affordability", "affordable", "cost", "money"],
    ),
    (
        PreferenceField::OutdoorSpace,
        &["garden", "outdoor", "balcony", "terrace", "patio", "courtyard"],
    ),
    (PreferenceField::Bedrooms, &["bedroom", "room", "space", "size"]),
    (PreferenceField::Bathrooms, &["bathroom", "en-suite", "ensuite"]),
    (
        PreferenceField::Amenities,
        &["amenities", "amenity", "school", "shop", "shopping", "restaurant", "cafe", "nightlife",
          "park", "gym", "pub", "market", "cultural", "attraction"],
    ),
    (
        PreferenceField::Community,
        &["community", "neighbourhood", "neighborhood", "family", "trendy", "quiet", "vibe", "safe"],
    ),
    (
        PreferenceField::Features,
        &["feature", "parking", "kitchen", "finishes", "period", "character", "ceiling", "luxury",
          "modern", "secure", "security", "architectural"],
    ),
    (PreferenceField::Area, &["location", "area", "postcode", "central"]),
    (PreferenceField::PropertyType, &["type", "house", "flat", "apartment", "property"]),
];

/// Words too generic to show that a community description fits
pub(crate) const COMMUNITY_STOPWORDS: &[&str] = &[
    "area", "location", "place", "with", "prefer", "neighbourhood", "neighborhood", "somewhere",
    "for", "and",
];

/// Builds short "why this matches" labels from structured attributes
///
/// Rules run in the same field order as the query composer. Labels for
/// fields named in the buyer's top priorities are emitted first, in
/// priority order, and the output is capped at `max_labels`.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationBuilder {
    max_labels: usize,
}

impl ExplanationBuilder {
    pub fn new(max_labels: usize) -> Self {
        Self { max_labels }
    }

    /// Explain why a listing fits. Never fails; may be empty.
    pub fn explain(&self, prefs: &PreferenceSchema, listing: &Listing) -> Vec<String> {
        self.explain_fields(prefs, listing)
            .into_iter()
            .map(|(_, label)| label)
            .collect()
    }

    /// Labels together with the preference field each one satisfies
    pub fn explain_fields(&self, prefs: &PreferenceSchema, listing: &Listing) -> Vec<(PreferenceField, String)> {
        let priorities = priority_fields(prefs);

        let mut labels: Vec<(PreferenceField, String)> = PreferenceField::ORDERED
            .iter()
            .filter_map(|&field| {
                let requested = priorities.contains(&field);
                evaluate(field, prefs, listing, requested).map(|label| (field, label))
            })
            .collect();

        let mut ordered = Vec::with_capacity(labels.len());
        for field in &priorities {
            if let Some(idx) = labels.iter().position(|(f, _)| f == field) {
                ordered.push(labels.remove(idx));
            }
        }
        ordered.extend(labels);
        ordered.truncate(self.max_labels);
        ordered
    }
}

impl Default for ExplanationBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LABELS)
    }
}

/// Explain with the default label cap
pub fn explain(prefs: &PreferenceSchema, listing: &Listing) -> Vec<String> {
    ExplanationBuilder::default().explain(prefs, listing)
}

/// Map free-text priorities onto preference fields, first mention wins
pub fn priority_fields(prefs: &PreferenceSchema) -> Vec<PreferenceField> {
    let mut fields = Vec::new();
    for priority in &prefs.top_priorities {
        let field = PRIORITY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| contains_word(priority, k)))
            .map(|(field, _)| *field);

        if let Some(field) = field {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    fields
}

fn evaluate(
    field: PreferenceField,
    prefs: &PreferenceSchema,
    listing: &Listing,
    requested: bool,
) -> Option<String> {
    match field {
        PreferenceField::PropertyType => prefs
            .property_type
            .iter()
            .any(|wanted| phrases_match(wanted, &listing.property_type))
            .then(|| format!("Property type: {}", listing.property_type)),

        PreferenceField::Area => prefs
            .preferred_areas
            .iter()
            .any(|area| area.trim().eq_ignore_ascii_case(listing.area.trim()))
            .then(|| format!("In preferred area: {}", listing.area)),

        PreferenceField::Bedrooms => {
            within(listing.bedrooms, prefs.bedrooms_min, prefs.bedrooms_max)
                .then(|| count_phrase(listing.bedrooms, "bedroom"))
        }

        PreferenceField::Bathrooms => {
            within(listing.bathrooms, prefs.bathrooms_min, prefs.bathrooms_max)
                .then(|| count_phrase(listing.bathrooms, "bathroom"))
        }

        PreferenceField::OutdoorSpace => {
            if prefs.outdoor_space.is_none() && !requested {
                return None;
            }
            let wanted = prefs.outdoor_space.as_deref().unwrap_or_default().to_lowercase();
            let text = listing_text(listing);
            let available: Vec<&str> = OUTDOOR_KEYWORDS
                .iter()
                .copied()
                .filter(|k| text.contains(k))
                .collect();
            available
                .iter()
                .find(|k| wanted.contains(*k))
                .or_else(|| available.first())
                .map(|k| format!("Outdoor space: {}", k))
        }

        PreferenceField::Budget => {
            if prefs.budget_min.is_none() && prefs.budget_max.is_none() {
                return None;
            }
            let fits = prefs.budget_min.map_or(true, |min| listing.price >= min)
                && prefs.budget_max.map_or(true, |max| listing.price <= max);
            fits.then(|| format!("Within budget at {}", format_gbp(listing.price)))
        }

        PreferenceField::Features => {
            let text = listing_text(listing);
            let found: Vec<&str> = prefs
                .must_have_features
                .iter()
                .filter(|wanted| {
                    listing.structured_features.iter().any(|f| phrases_match(wanted, f))
                        || text.contains(wanted.as_str())
                })
                .map(String::as_str)
                .take(MAX_ITEMS_PER_LABEL)
                .collect();
            (!found.is_empty()).then(|| format!("Features: {}", found.join(", ")))
        }

        PreferenceField::Community => {
            let community = prefs.community_type.as_deref()?;
            let description = &listing.area_description;
            tokens(community)
                .iter()
                .filter(|t| t.len() > 3 && !COMMUNITY_STOPWORDS.contains(&t.as_str()))
                .any(|t| contains_word(description, t))
                .then(|| format!("Community: {}", community.trim().to_lowercase()))
        }

        PreferenceField::Transport => {
            let wants_transport = requested
                || prefs.transport_preference.is_some()
                || prefs.commute_destination.is_some();
            if !wants_transport {
                return None;
            }
            let wanted = prefs.transport_preference.as_deref().unwrap_or_default();
            let text = listing_text(listing);
            let available: Vec<&str> = TRANSPORT_KEYWORDS
                .iter()
                .copied()
                .filter(|k| contains_word(&text, k) || (k.contains(' ') && text.contains(k)))
                .collect();
            available
                .iter()
                .find(|k| contains_word(wanted, k))
                .or_else(|| available.first())
                .map(|k| format!("Transport links: {}", k))
        }

        PreferenceField::Amenities => {
            let found: Vec<&str> = listing
                .structured_amenities
                .iter()
                .filter(|amenity| prefs.amenities.iter().any(|wanted| phrases_match(wanted, amenity)))
                .map(String::as_str)
                .take(MAX_ITEMS_PER_LABEL)
                .collect();
            (!found.is_empty()).then(|| format!("Nearby: {}", found.join(", ")))
        }
    }
}

/// Value inside the bounds that are present; false when no bound is set
fn within(value: u8, min: Option<u8>, max: Option<u8>) -> bool {
    (min.is_some() || max.is_some())
        && min.map_or(true, |m| value >= m)
        && max.map_or(true, |m| value <= m)
}

/// Lower-cased structured attributes and free text of a listing
fn listing_text(listing: &Listing) -> String {
    let mut text = String::new();
    for item in listing.structured_features.iter().chain(&listing.structured_amenities) {
        text.push_str(item);
        text.push_str(". ");
    }
    text.push_str(&listing.description);
    text.push(' ');
    text.push_str(&listing.area_description);
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn create_listing() -> Listing {
        Listing {
            id: "peckham_1".to_string(),
            area: "Peckham".to_string(),
            postcode: "SE15 4QL".to_string(),
            price: 525_000,
            bedrooms: 2,
            bathrooms: 1,
            size_sqft: Some(820),
            property_type: "Victorian conversion".to_string(),
            description: "Bright split-level flat with a private garden and original fireplaces.".to_string(),
            area_description: "A creative, up-and-coming neighbourhood with a thriving arts scene.".to_string(),
            structured_amenities: set(&["Peckham Rye station", "cafes", "Bellenden Road market"]),
            structured_features: set(&["period features", "garden"]),
            category: Some("up_and_coming".to_string()),
        }
    }

    #[test]
    fn test_priority_label_first() {
        let prefs = PreferenceSchema {
            preferred_areas: vec!["Peckham".to_string()],
            top_priorities: vec!["transport".to_string()],
            ..Default::default()
        };

        let labels = explain(&prefs, &create_listing());
        assert_eq!(labels, vec!["Transport links: station", "In preferred area: Peckham"]);
    }

    #[test]
    fn test_field_order_without_priorities() {
        let prefs = PreferenceSchema {
            bedrooms_min: Some(2),
            bedrooms_max: Some(3),
            budget_max: Some(550_000),
            preferred_areas: vec!["peckham".to_string()],
            amenities: set(&["cafes", "gyms"]),
            ..Default::default()
        };

        let labels = explain(&prefs, &create_listing());
        assert_eq!(
            labels,
            vec![
                "In preferred area: Peckham",
                "2 bedrooms",
                "Within budget at £525,000",
                "Nearby: cafes",
            ]
        );
    }

    #[test]
    fn test_outdoor_space_prefers_buyer_wording() {
        let prefs = PreferenceSchema {
            outdoor_space: Some("Small garden or courtyard would be great".to_string()),
            ..Default::default()
        };
        assert_eq!(explain(&prefs, &create_listing()), vec!["Outdoor space: garden"]);
    }

    #[test]
    fn test_community_and_features() {
        let prefs = PreferenceSchema {
            community_type: Some("Creative areas with unique character".to_string()),
            must_have_features: set(&["period features", "parking"]),
            ..Default::default()
        };

        let labels = explain(&prefs, &create_listing());
        assert_eq!(
            labels,
            vec!["Features: period features", "Community: creative areas with unique character"]
        );
    }

    #[test]
    fn test_label_cap() {
        let prefs = PreferenceSchema {
            property_type: set(&["conversion"]),
            preferred_areas: vec!["Peckham".to_string()],
            bedrooms_min: Some(2),
            bathrooms_min: Some(1),
            outdoor_space: Some("garden".to_string()),
            budget_max: Some(600_000),
            amenities: set(&["cafes"]),
            ..Default::default()
        };

        let builder = ExplanationBuilder::new(3);
        let labels = builder.explain(&prefs, &create_listing());
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], "Property type: Victorian conversion");
    }

    #[test]
    fn test_nothing_satisfied() {
        let prefs = PreferenceSchema {
            preferred_areas: vec!["Chelsea".to_string()],
            budget_max: Some(100_000),
            ..Default::default()
        };
        assert!(explain(&prefs, &create_listing()).is_empty());
    }

    #[test]
    fn test_priority_fields_mapping() {
        let prefs = PreferenceSchema {
            top_priorities: vec![
                "good schools".to_string(),
                "garden".to_string(),
                "transport links".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(
            priority_fields(&prefs),
            vec![PreferenceField::Amenities, PreferenceField::OutdoorSpace, PreferenceField::Transport]
        );
    }
}
