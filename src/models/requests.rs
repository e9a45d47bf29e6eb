use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;
use crate::models::domain::{FilterSet, Listing, PreferenceSchema, SimilarityMetric};

/// Request to turn raw question answers into a preference schema
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidatePreferencesRequest {
    #[validate(length(max = 64))]
    pub answers: HashMap<String, String>,
}

/// Request to compose a search query from confirmed preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeQueryRequest {
    pub preferences: PreferenceSchema,
}

/// A listing paired with the raw similarity reported by a search backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub listing: Listing,
    pub similarity: f64,
}

/// Request to rank candidates that were scored outside this service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankListingsRequest {
    #[serde(default)]
    pub candidates: Vec<ScoredCandidate>,
    #[serde(default)]
    pub filters: FilterSet,
    /// When present, each result carries explanation labels
    #[serde(default)]
    pub preferences: Option<PreferenceSchema>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default, alias = "top_k", rename = "topK")]
    pub top_k: Option<u16>,
    #[serde(default)]
    pub metric: Option<SimilarityMetric>,
}

/// Request to run the full pipeline against stored listings
///
/// Either confirmed `preferences` or raw `answers` must be supplied;
/// preferences win when both are present.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[serde(default)]
    pub preferences: Option<PreferenceSchema>,
    #[serde(default)]
    pub answers: HashMap<String, String>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default, alias = "top_k", rename = "topK")]
    pub top_k: Option<u16>,
}

/// Request to add listings to the store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestListingsRequest {
    #[validate(length(min = 1, max = 100))]
    pub listings: Vec<Listing>,
}

/// Paging for the listing index
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListListingsQuery {
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_page_size() -> usize { 20 }
