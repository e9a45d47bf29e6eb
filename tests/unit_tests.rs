// Unit tests for Homematch

use homematch::core::{
    filters::{matches_filters, within_budget},
    parsing::{parse_range, RangeKind},
    query::{describe_budget, describe_count},
    scoring::normalize_scores,
    validate, ValidationError,
};
use homematch::models::{FilterSet, Listing, PreferenceSchema, SimilarityMetric};
use std::collections::{BTreeSet, HashMap};

fn create_test_listing(id: &str, price: u64, bedrooms: u8) -> Listing {
    Listing {
        id: id.to_string(),
        area: "Hackney".to_string(),
        postcode: "E8 1AA".to_string(),
        price,
        bedrooms,
        bathrooms: 1,
        size_sqft: Some(700),
        property_type: "flat".to_string(),
        description: String::new(),
        area_description: String::new(),
        structured_amenities: BTreeSet::new(),
        structured_features: BTreeSet::new(),
        category: None,
    }
}

fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_validate_rejects_inverted_budget() {
    let result = validate(&answers(&[("budget", "£700,000 to £500,000")]));
    assert!(matches!(
        result,
        Err(ValidationError::InvertedRange { field: "budget", .. })
    ));
}

#[test]
fn test_validate_rejects_inverted_bedrooms() {
    let result = validate(&answers(&[("bedrooms", "4 to 2 bedrooms")]));
    assert!(matches!(
        result,
        Err(ValidationError::InvertedRange { field: "bedrooms", min: 4, max: 2 })
    ));
}

#[test]
fn test_validate_accepts_single_value_budget() {
    let prefs = validate(&answers(&[("budget", "£500k")])).unwrap();
    assert_eq!(prefs.budget_min, Some(500_000));
    assert_eq!(prefs.budget_max, Some(500_000));
}

#[test]
fn test_validate_empty_answers() {
    let prefs = validate(&HashMap::new()).unwrap();
    assert_eq!(prefs, PreferenceSchema::default());
}

#[test]
fn test_parse_range_strips_currency_and_separators() {
    let range = parse_range("between £1,250,000 and £1,500,000", RangeKind::Currency);
    assert_eq!(range.min, Some(1_250_000));
    assert_eq!(range.max, Some(1_500_000));
}

#[test]
fn test_parse_range_max_only() {
    let range = parse_range("no more than £425k", RangeKind::Currency);
    assert_eq!(range.min, None);
    assert_eq!(range.max, Some(425_000));
}

#[test]
fn test_describe_budget() {
    assert_eq!(describe_budget(Some(400_000), Some(650_000)), "£400,000 to £650,000");
    assert_eq!(describe_budget(None, Some(350_000)), "under £350,000");
    assert_eq!(describe_budget(Some(1_000_000), None), "from £1,000,000");
    assert_eq!(describe_budget(Some(500_000), Some(500_000)), "around £500,000");
}

#[test]
fn test_describe_count() {
    assert_eq!(describe_count(Some(3), None, "bedroom").as_deref(), Some("at least 3 bedrooms"));
    assert_eq!(describe_count(Some(1), Some(1), "bathroom").as_deref(), Some("1 bathroom"));
    assert_eq!(describe_count(Some(0), Some(0), "bedroom").as_deref(), Some("studio"));
}

#[test]
fn test_filters_budget_inclusive() {
    let filters = FilterSet {
        budget_min: Some(300_000),
        budget_max: Some(400_000),
        ..Default::default()
    };

    assert!(within_budget(&create_test_listing("a", 300_000, 1), &filters));
    assert!(within_budget(&create_test_listing("b", 400_000, 1), &filters));
    assert!(!within_budget(&create_test_listing("c", 299_999, 1), &filters));
    assert!(!within_budget(&create_test_listing("d", 400_001, 1), &filters));
}

#[test]
fn test_filters_excluded_area_case_insensitive() {
    let mut filters = FilterSet::default();
    filters.excluded_areas.insert("hackney".to_string());

    assert!(!matches_filters(&create_test_listing("a", 500_000, 2), &filters));
}

#[test]
fn test_empty_filters_pass_everything() {
    assert!(matches_filters(&create_test_listing("a", 5_000_000, 0), &FilterSet::default()));
}

#[test]
fn test_normalize_scores_metrics() {
    assert_eq!(
        normalize_scores(&[0.9, 1.2, -0.1], SimilarityMetric::Similarity),
        vec![0.9, 1.0, 0.0]
    );
    assert_eq!(
        normalize_scores(&[0.5], SimilarityMetric::CosineDistance),
        vec![0.75]
    );
    assert_eq!(
        normalize_scores(&[2.0, 2.0], SimilarityMetric::L2Distance),
        vec![1.0, 1.0]
    );
}
