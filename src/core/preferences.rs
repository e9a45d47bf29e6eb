use crate::core::parsing::{parse_minutes, parse_range, split_list, strip_filler, ParsedRange, RangeKind};
use crate::models::PreferenceSchema;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Most priorities a buyer may name
pub const MAX_PRIORITIES: usize = 3;

/// Errors raised while validating buyer answers
///
/// Recoverable by asking the buyer the offending question again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: minimum {min} is greater than maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: u64,
        max: u64,
    },

    #[error("{field}: value {value} is out of range")]
    OutOfRange { field: &'static str, value: u64 },
}

impl ValidationError {
    /// Answer key the buyer should be asked again
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvertedRange { field, .. } | ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

/// One step of the preference dialogue
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub field: &'static str,
    pub prompt: &'static str,
}

/// The fixed question script, in the order the buyer is asked
pub const QUESTIONS: &[Question] = &[
    Question {
        field: "property_type",
        prompt: "What type of property are you looking for? Options include terraced house, \
                 semi-detached house, flat, studio flat, new build apartment, loft apartment or period house.",
    },
    Question { field: "budget", prompt: "What's your budget range?" },
    Question { field: "bedrooms", prompt: "How many bedrooms do you need? Any flexibility on this?" },
    Question { field: "bathrooms", prompt: "Any preference on bathrooms? Is an en-suite important?" },
    Question { field: "outdoor_space", prompt: "Do you need outdoor space? Garden, balcony, or roof terrace?" },
    Question {
        field: "preferred_areas",
        prompt: "Are there specific areas in London you're interested in or want to avoid?",
    },
    Question {
        field: "commute",
        prompt: "Where do you need to commute to for work? And what's your acceptable commute time?",
    },
    Question {
        field: "transport",
        prompt: "Do you prefer tube, bus, rail, or are you flexible with transport?",
    },
    Question {
        field: "amenities",
        prompt: "What's important to have nearby: shops, restaurants, parks, gyms, schools?",
    },
    Question {
        field: "community_type",
        prompt: "Do you prefer established family neighbourhoods, trendy up-and-coming areas, or central locations?",
    },
    Question {
        field: "must_have_features",
        prompt: "Any must-have features such as parking, period features or a modern kitchen?",
    },
    Question { field: "deal_breakers", prompt: "Anything that would rule a property out for you?" },
    Question {
        field: "top_priorities",
        prompt: "If you had to choose, what are your top 3 most important factors?",
    },
];

/// Markers that switch an area answer from wanted to unwanted areas
const EXCLUSION_MARKERS: &[&str] = &["but not ", "avoiding ", "avoid ", "except ", "not "];

/// Build a validated preference schema from raw question answers
///
/// Unknown keys are ignored and blank answers leave their field unset.
/// Fails when a parsed range has its minimum above its maximum; nothing is
/// corrected automatically.
pub fn validate(raw_answers: &HashMap<String, String>) -> Result<PreferenceSchema, ValidationError> {
    let mut prefs = PreferenceSchema::default();

    // Sorted so that dedicated keys ("budget_max") land after the combined
    // question ("budget") and override it
    let mut keys: Vec<&String> = raw_answers.keys().collect();
    keys.sort();

    for key in keys {
        let answer = raw_answers[key].trim();
        if answer.is_empty() {
            continue;
        }

        match key.as_str() {
            "property_type" => {
                prefs.property_type = lowercase_set(answer);
            }
            "budget" => {
                let range = checked_range("budget", parse_range(answer, RangeKind::Currency))?;
                prefs.budget_min = range.min;
                prefs.budget_max = range.max;
            }
            "bedrooms" => {
                let range = checked_range("bedrooms", parse_range(answer, RangeKind::Count))?;
                prefs.bedrooms_min = to_count("bedrooms", range.min)?;
                prefs.bedrooms_max = to_count("bedrooms", range.max)?;
            }
            "bathrooms" => {
                let range = checked_range("bathrooms", parse_range(answer, RangeKind::Count))?;
                prefs.bathrooms_min = to_count("bathrooms", range.min)?;
                prefs.bathrooms_max = to_count("bathrooms", range.max)?;
            }
            "budget_min" => prefs.budget_min = single_bound(answer, RangeKind::Currency),
            "budget_max" => prefs.budget_max = single_bound(answer, RangeKind::Currency),
            "bedrooms_min" => prefs.bedrooms_min = to_count("bedrooms", single_bound(answer, RangeKind::Count))?,
            "bedrooms_max" => prefs.bedrooms_max = to_count("bedrooms", single_bound(answer, RangeKind::Count))?,
            "bathrooms_min" => prefs.bathrooms_min = to_count("bathrooms", single_bound(answer, RangeKind::Count))?,
            "bathrooms_max" => prefs.bathrooms_max = to_count("bathrooms", single_bound(answer, RangeKind::Count))?,
            "outdoor_space" => {
                if !is_negative_answer(answer) {
                    prefs.outdoor_space = Some(answer.to_string());
                }
            }
            "preferred_areas" => {
                let (wanted, unwanted) = parse_areas(answer);
                prefs.preferred_areas = wanted;
                prefs.excluded_areas.extend(unwanted);
            }
            "excluded_areas" => {
                prefs
                    .excluded_areas
                    .extend(split_list(answer).into_iter().map(|a| a.to_lowercase()));
            }
            "commute" => {
                let (destination, minutes) = parse_commute(answer);
                prefs.commute_destination = destination;
                prefs.commute_max_minutes = minutes;
            }
            "commute_destination" => {
                prefs.commute_destination = Some(answer.to_string());
            }
            "commute_max_minutes" => {
                prefs.commute_max_minutes = parse_minutes(answer);
            }
            "transport" | "transport_preference" => {
                prefs.transport_preference = Some(answer.to_string());
            }
            "amenities" => {
                prefs.amenities = lowercase_set(answer);
            }
            "community_type" => {
                prefs.community_type = Some(answer.to_string());
            }
            "must_have_features" => {
                prefs.must_have_features = lowercase_set(answer);
            }
            "deal_breakers" => {
                prefs.deal_breakers = lowercase_set(answer);
            }
            "top_priorities" => {
                prefs.top_priorities = split_list(answer).into_iter().map(|p| p.to_lowercase()).collect();
            }
            other => {
                tracing::warn!("Ignoring answer for unknown question: {}", other);
            }
        }
    }

    check_preferences(prefs)
}

/// Enforce the schema rules on preferences that did not come from answers
///
/// Preferences posted as JSON skip `validate`, so they are held to the same
/// range invariants here and their priorities are cut to the first three.
pub fn check_preferences(mut prefs: PreferenceSchema) -> Result<PreferenceSchema, ValidationError> {
    if prefs.top_priorities.len() > MAX_PRIORITIES {
        tracing::debug!("Keeping first {} of {} priorities", MAX_PRIORITIES, prefs.top_priorities.len());
        prefs.top_priorities.truncate(MAX_PRIORITIES);
    }
    check_schema(&prefs)?;
    Ok(prefs)
}

/// Re-check the range invariants of a schema built elsewhere
pub fn check_schema(prefs: &PreferenceSchema) -> Result<(), ValidationError> {
    check_bounds("budget", prefs.budget_min, prefs.budget_max)?;
    check_bounds(
        "bedrooms",
        prefs.bedrooms_min.map(u64::from),
        prefs.bedrooms_max.map(u64::from),
    )?;
    check_bounds(
        "bathrooms",
        prefs.bathrooms_min.map(u64::from),
        prefs.bathrooms_max.map(u64::from),
    )
}

fn check_bounds(field: &'static str, min: Option<u64>, max: Option<u64>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::InvertedRange { field, min, max }),
        _ => Ok(()),
    }
}

fn checked_range(field: &'static str, range: ParsedRange) -> Result<ParsedRange, ValidationError> {
    check_bounds(field, range.min, range.max)?;
    Ok(range)
}

fn single_bound(answer: &str, kind: RangeKind) -> Option<u64> {
    let range = parse_range(answer, kind);
    range.min.or(range.max)
}

fn to_count(field: &'static str, value: Option<u64>) -> Result<Option<u8>, ValidationError> {
    value
        .map(|v| u8::try_from(v).map_err(|_| ValidationError::OutOfRange { field, value: v }))
        .transpose()
}

fn lowercase_set(answer: &str) -> BTreeSet<String> {
    split_list(answer).into_iter().map(|item| item.to_lowercase()).collect()
}

fn is_negative_answer(answer: &str) -> bool {
    let lower = answer.to_ascii_lowercase();
    let lower = lower.trim_end_matches(['.', '!']);
    matches!(lower, "no" | "none" | "nope" | "not needed" | "not required" | "n/a")
        || lower.starts_with("no need")
        || lower.starts_with("don't need")
}

/// Split an areas answer into wanted and unwanted areas
///
/// Only capitalised segments are treated as place names unless the buyer
/// wrote everything in lower case.
fn parse_areas(answer: &str) -> (Vec<String>, Vec<String>) {
    let lower = answer.to_ascii_lowercase();
    let split_at = EXCLUSION_MARKERS
        .iter()
        .filter_map(|marker| {
            lower
                .match_indices(marker)
                .find(|(idx, _)| *idx == 0 || !lower.as_bytes()[idx - 1].is_ascii_alphanumeric())
                .map(|(idx, m)| (idx, idx + m.len()))
        })
        .min();

    let (wanted_text, unwanted_text) = match split_at {
        Some((start, end)) => (&answer[..start], &answer[end..]),
        None => (answer, ""),
    };

    let wanted = place_names(wanted_text);
    let unwanted = place_names(unwanted_text).into_iter().map(|a| a.to_lowercase()).collect();
    (wanted, unwanted)
}

fn place_names(text: &str) -> Vec<String> {
    let segments = split_list(text);
    let capitalised: Vec<String> = segments
        .iter()
        .filter(|s| s.chars().next().is_some_and(char::is_uppercase))
        .cloned()
        .collect();

    let mut names = if capitalised.is_empty() { segments } else { capitalised };
    let mut seen = BTreeSet::new();
    names.retain(|n| seen.insert(n.to_lowercase()));
    names
}

/// Read "Central London, about 45 minutes" as destination and time limit
fn parse_commute(answer: &str) -> (Option<String>, Option<u16>) {
    let minutes = parse_minutes(answer);
    let destination = answer
        .split([',', ';'])
        .next()
        .map(|d| strip_filler(d.trim()))
        .filter(|d| !d.is_empty() && !d.chars().any(|c| c.is_ascii_digit()));
    (destination, minutes)
}

impl PreferenceSchema {
    /// One confirmation line per populated field, in question order
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.property_type.is_empty() {
            lines.push(format!("Property type: {}", join(&self.property_type)));
        }
        if self.budget_min.is_some() || self.budget_max.is_some() {
            lines.push(format!("Budget: {}", crate::core::query::describe_budget(self.budget_min, self.budget_max)));
        }
        if let Some(rooms) = crate::core::query::describe_count(self.bedrooms_min, self.bedrooms_max, "bedroom") {
            lines.push(format!("Bedrooms: {}", rooms));
        }
        if let Some(rooms) = crate::core::query::describe_count(self.bathrooms_min, self.bathrooms_max, "bathroom") {
            lines.push(format!("Bathrooms: {}", rooms));
        }
        if let Some(outdoor) = &self.outdoor_space {
            lines.push(format!("Outdoor space: {}", outdoor));
        }
        if !self.preferred_areas.is_empty() {
            lines.push(format!("Preferred areas: {}", self.preferred_areas.join(", ")));
        }
        if !self.excluded_areas.is_empty() {
            lines.push(format!("Areas to avoid: {}", join(&self.excluded_areas)));
        }
        match (&self.commute_destination, self.commute_max_minutes) {
            (Some(dest), Some(minutes)) => lines.push(format!("Commute: {} within {} minutes", dest, minutes)),
            (Some(dest), None) => lines.push(format!("Commute: {}", dest)),
            (None, Some(minutes)) => lines.push(format!("Commute: within {} minutes", minutes)),
            (None, None) => {}
        }
        if let Some(transport) = &self.transport_preference {
            lines.push(format!("Transport: {}", transport));
        }
        if !self.amenities.is_empty() {
            lines.push(format!("Amenities: {}", join(&self.amenities)));
        }
        if let Some(community) = &self.community_type {
            lines.push(format!("Community type: {}", community));
        }
        if !self.must_have_features.is_empty() {
            lines.push(format!("Features: {}", join(&self.must_have_features)));
        }
        if !self.deal_breakers.is_empty() {
            lines.push(format!("Deal-breakers: {}", join(&self.deal_breakers)));
        }
        if !self.top_priorities.is_empty() {
            lines.push(format!("Top priorities: {}", self.top_priorities.join(", ")));
        }

        lines
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_validate_young_professional() {
        let prefs = validate(&answers(&[
            ("property_type", "modern flat"),
            ("budget", "£450,000 to £550,000"),
            ("bedrooms", "1 bedroom, maybe 2 if budget allows"),
            ("bathrooms", "1 bathroom is fine"),
            ("preferred_areas", "Clapham, Islington, or Shoreditch"),
            ("commute", "Central London, ideally under 30 minutes"),
            ("top_priorities", "Transport links, nightlife, modern amenities"),
        ]))
        .unwrap();

        assert!(prefs.property_type.contains("modern flat"));
        assert_eq!(prefs.budget_min, Some(450_000));
        assert_eq!(prefs.budget_max, Some(550_000));
        assert_eq!(prefs.bedrooms_min, Some(1));
        assert_eq!(prefs.bedrooms_max, Some(2));
        assert_eq!(prefs.bathrooms_min, Some(1));
        assert_eq!(prefs.preferred_areas, vec!["Clapham", "Islington", "Shoreditch"]);
        assert_eq!(prefs.commute_destination.as_deref(), Some("Central London"));
        assert_eq!(prefs.commute_max_minutes, Some(30));
        assert_eq!(prefs.top_priorities.len(), 3);
    }

    #[test]
    fn test_inverted_budget_rejected() {
        let err = validate(&answers(&[("budget", "£650,000 to £400,000")])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvertedRange { field: "budget", min: 650_000, max: 400_000 }
        );

        let err = validate(&answers(&[("budget_min", "£600k"), ("budget_max", "£500k")])).unwrap_err();
        assert_eq!(err.field(), "budget");
    }

    #[test]
    fn test_inverted_bedrooms_rejected() {
        let err = validate(&answers(&[("bedrooms_min", "4"), ("bedrooms_max", "2")])).unwrap_err();
        assert_eq!(err, ValidationError::InvertedRange { field: "bedrooms", min: 4, max: 2 });
    }

    #[test]
    fn test_one_sided_budget() {
        let prefs = validate(&answers(&[("budget", "up to £350,000")])).unwrap();
        assert_eq!(prefs.budget_min, None);
        assert_eq!(prefs.budget_max, Some(350_000));
    }

    #[test]
    fn test_priorities_truncated() {
        let prefs = validate(&answers(&[("top_priorities", "price, garden, schools, transport")])).unwrap();
        assert_eq!(prefs.top_priorities, vec!["price", "garden", "schools"]);
    }

    #[test]
    fn test_posted_schema_held_to_invariants() {
        let posted: PreferenceSchema = serde_json::from_str(
            r#"{"budgetMin":600000,"budgetMax":500000,"bedroomsMin":4,"bedroomsMax":2}"#,
        )
        .unwrap();
        assert_eq!(
            check_preferences(posted).unwrap_err(),
            ValidationError::InvertedRange { field: "budget", min: 600_000, max: 500_000 }
        );

        let posted: PreferenceSchema = serde_json::from_str(
            r#"{"bedroomsMin":4,"bedroomsMax":2}"#,
        )
        .unwrap();
        assert_eq!(check_preferences(posted).unwrap_err().field(), "bedrooms");
    }

    #[test]
    fn test_posted_priorities_truncated() {
        let posted = PreferenceSchema {
            top_priorities: vec!["price".into(), "garden".into(), "schools".into(), "transport".into()],
            budget_max: Some(500_000),
            ..Default::default()
        };
        let checked = check_preferences(posted).unwrap();
        assert_eq!(checked.top_priorities, vec!["price", "garden", "schools"]);
        assert_eq!(checked.budget_max, Some(500_000));
    }

    #[test]
    fn test_areas_with_exclusions() {
        let prefs = validate(&answers(&[(
            "preferred_areas",
            "Richmond or Wimbledon, somewhere family-friendly, but not Croydon",
        )]))
        .unwrap();

        assert_eq!(prefs.preferred_areas, vec!["Richmond", "Wimbledon"]);
        assert!(prefs.excluded_areas.contains("croydon"));
    }

    #[test]
    fn test_negative_outdoor_space_left_unset() {
        let prefs = validate(&answers(&[("outdoor_space", "No")])).unwrap();
        assert!(prefs.outdoor_space.is_none());
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_unknown_and_blank_answers_ignored() {
        let prefs = validate(&answers(&[("favourite_colour", "blue"), ("budget", "   ")])).unwrap();
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_summary_follows_question_order() {
        let prefs = validate(&answers(&[
            ("top_priorities", "garden"),
            ("property_type", "terraced house"),
            ("budget", "under £900k"),
        ]))
        .unwrap();

        let summary = prefs.summary();
        assert_eq!(summary[0], "Property type: terraced house");
        assert_eq!(summary[1], "Budget: under £900,000");
        assert_eq!(summary[2], "Top priorities: garden");
    }

    #[test]
    fn test_question_script_order() {
        assert_eq!(QUESTIONS.first().map(|q| q.field), Some("property_type"));
        assert_eq!(QUESTIONS.last().map(|q| q.field), Some("top_priorities"));
    }
}
