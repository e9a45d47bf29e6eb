use crate::core::{filters::matches_filters, scoring::normalize_scores};
use crate::models::{FilterSet, Listing, RankedResult, SimilarityMetric};
use std::cmp::Ordering;

/// Number of results returned when the caller does not ask for a size
pub const DEFAULT_TOP_K: usize = 5;

/// A surviving listing with its normalized score and 1-based rank
#[derive(Debug, Clone, PartialEq)]
pub struct RankedListing {
    pub listing: Listing,
    pub score: f64,
    pub rank: usize,
}

impl RankedListing {
    pub fn to_result(&self, matched_attributes: Vec<String>) -> RankedResult {
        RankedResult {
            listing_id: self.listing.id.clone(),
            similarity_score: self.score,
            rank: self.rank,
            price: self.listing.price,
            matched_attributes,
        }
    }
}

/// Orders externally scored listings
///
/// # Pipeline Stages
/// 1. Hard filtering against the FilterSet
/// 2. Score normalization into [0, 1]
/// 3. Ordering: score descending, then price ascending, then id ascending
/// 4. Truncation to top_k, never padded with filtered-out listings
#[derive(Debug, Clone, Copy)]
pub struct ListingRanker {
    metric: SimilarityMetric,
}

impl ListingRanker {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self { metric }
    }

    /// Rank scored listings into results with empty explanations
    pub fn rank(
        &self,
        scored: Vec<(Listing, f64)>,
        filters: &FilterSet,
        top_k: usize,
    ) -> Vec<RankedResult> {
        self.rank_listings(scored, filters, top_k)
            .iter()
            .map(|ranked| ranked.to_result(Vec::new()))
            .collect()
    }

    /// Rank scored listings, keeping the listings themselves
    ///
    /// An empty input is a valid "no matches" outcome and yields an empty
    /// vector.
    pub fn rank_listings(
        &self,
        scored: Vec<(Listing, f64)>,
        filters: &FilterSet,
        top_k: usize,
    ) -> Vec<RankedListing> {
        let total = scored.len();

        // Stage 1: hard filters
        let (survivors, raw_scores): (Vec<Listing>, Vec<f64>) = scored
            .into_iter()
            .filter(|(listing, _)| matches_filters(listing, filters))
            .unzip();

        tracing::debug!("{} of {} candidates passed filters", survivors.len(), total);

        // Stage 2: normalization
        let scores = normalize_scores(&raw_scores, self.metric);

        let mut ranked: Vec<RankedListing> = survivors
            .into_iter()
            .zip(scores)
            .map(|(listing, score)| RankedListing { listing, score, rank: 0 })
            .collect();

        // Stage 3: deterministic ordering
        ranked.sort_by(compare_ranked);

        // Stage 4: truncate
        ranked.truncate(top_k);
        for (idx, entry) in ranked.iter_mut().enumerate() {
            entry.rank = idx + 1;
        }

        ranked
    }
}

impl Default for ListingRanker {
    fn default() -> Self {
        Self::new(SimilarityMetric::default())
    }
}

/// Rank with the default metric (raw values are similarities)
pub fn rank(scored: Vec<(Listing, f64)>, filters: &FilterSet, top_k: usize) -> Vec<RankedResult> {
    ListingRanker::default().rank(scored, filters, top_k)
}

fn compare_ranked(a: &RankedListing, b: &RankedListing) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.listing.price.cmp(&b.listing.price))
        .then_with(|| a.listing.id.cmp(&b.listing.id))
}
