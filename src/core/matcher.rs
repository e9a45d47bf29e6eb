use crate::core::{
    explain::ExplanationBuilder,
    personalize::personalize_description,
    query::QueryComposer,
    ranker::ListingRanker,
};
use crate::models::{ComposedQuery, Listing, MatchedListing, PreferenceSchema};

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<MatchedListing>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Query composition (text for the embedding backend, hard filters)
/// 2. Filtering, normalization and ranking of externally scored listings
/// 3. Explanation of each surviving listing
/// 4. A description reordered around what was explained
#[derive(Debug, Clone)]
pub struct Matcher {
    composer: QueryComposer,
    ranker: ListingRanker,
    explainer: ExplanationBuilder,
}

impl Matcher {
    pub fn new(composer: QueryComposer, ranker: ListingRanker, explainer: ExplanationBuilder) -> Self {
        Self {
            composer,
            ranker,
            explainer,
        }
    }

    pub fn compose(&self, preferences: &PreferenceSchema) -> ComposedQuery {
        self.composer.compose(preferences)
    }

    /// Find matches for a buyer
    ///
    /// # Arguments
    /// * `preferences` - The buyer's validated preferences
    /// * `query` - The composed query the candidates were scored against
    /// * `candidates` - Listings paired with their raw backend scores
    /// * `limit` - Maximum number of matches to return
    ///
    /// # Returns
    /// MatchResult containing ranked and explained matches
    pub fn find_matches(
        &self,
        preferences: &PreferenceSchema,
        query: &ComposedQuery,
        candidates: Vec<(Listing, f64)>,
        limit: usize,
    ) -> MatchResult {
        let total_candidates = candidates.len();

        let matches = self
            .ranker
            .rank_listings(candidates, &query.filters, limit)
            .into_iter()
            .map(|ranked| {
                let (fields, labels): (Vec<_>, Vec<_>) = self
                    .explainer
                    .explain_fields(preferences, &ranked.listing)
                    .into_iter()
                    .unzip();
                let personalized_description = personalize_description(preferences, &ranked.listing, &fields);
                MatchedListing {
                    result: ranked.to_result(labels),
                    listing: ranked.listing,
                    personalized_description,
                }
            })
            .collect();

        MatchResult {
            matches,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(
            QueryComposer::default(),
            ListingRanker::default(),
            ExplanationBuilder::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn create_candidate(id: &str, area: &str, price: u64, bedrooms: u8) -> Listing {
        Listing {
            id: id.to_string(),
            area: area.to_string(),
            postcode: "N1 2AB".to_string(),
            price,
            bedrooms,
            bathrooms: 1,
            size_sqft: None,
            property_type: "flat".to_string(),
            description: "Modern flat with a balcony.".to_string(),
            area_description: String::new(),
            structured_amenities: ["Angel tube station".to_string()].into_iter().collect(),
            structured_features: BTreeSet::new(),
            category: None,
        }
    }

    fn create_preferences() -> PreferenceSchema {
        PreferenceSchema {
            property_type: ["flat".to_string()].into_iter().collect(),
            budget_min: Some(400_000),
            budget_max: Some(600_000),
            bedrooms_min: Some(2),
            preferred_areas: vec!["Islington".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_find_matches_basic() {
        let matcher = Matcher::default();
        let preferences = create_preferences();
        let query = matcher.compose(&preferences);

        let candidates = vec![
            (create_candidate("1", "Islington", 550_000, 2), 0.8),
            (create_candidate("2", "Islington", 700_000, 2), 0.9), // Over budget
            (create_candidate("3", "Islington", 500_000, 1), 0.9), // Too few bedrooms
        ];

        let result = matcher.find_matches(&preferences, &query, candidates, 10);

        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].result.listing_id, "1");
        assert_eq!(result.matches[0].result.rank, 1);
    }

    #[test]
    fn test_matches_carry_explanations() {
        let matcher = Matcher::default();
        let preferences = create_preferences();
        let query = matcher.compose(&preferences);

        let result = matcher.find_matches(
            &preferences,
            &query,
            vec![(create_candidate("1", "Islington", 550_000, 2), 0.8)],
            5,
        );

        assert_eq!(
            result.matches[0].result.matched_attributes,
            vec![
                "Property type: flat",
                "In preferred area: Islington",
                "2 bedrooms",
                "Within budget at £550,000",
            ]
        );
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::default();
        let preferences = create_preferences();
        let query = matcher.compose(&preferences);

        let candidates: Vec<(Listing, f64)> = (0..20)
            .map(|i| (create_candidate(&i.to_string(), "Islington", 450_000 + i * 1_000, 2), 0.5))
            .collect();

        let result = matcher.find_matches(&preferences, &query, candidates, 5);

        assert_eq!(result.matches.len(), 5);
        assert_eq!(result.matches[0].listing.price, 450_000);
    }

    #[test]
    fn test_matches_carry_personalized_description() {
        let matcher = Matcher::default();
        let mut preferences = create_preferences();
        preferences.top_priorities = vec!["transport".to_string()];
        let query = matcher.compose(&preferences);

        let mut candidate = create_candidate("1", "Islington", 550_000, 2);
        candidate.description = "Modern flat with a balcony. Ten minutes from Angel tube station.".to_string();

        let result = matcher.find_matches(&preferences, &query, vec![(candidate, 0.8)], 5);

        assert_eq!(
            result.matches[0].personalized_description,
            "Ten minutes from Angel tube station. Modern flat with a balcony."
        );
    }
}
