use serde::{Deserialize, Serialize};
use crate::models::domain::{FilterSet, Listing, PreferenceSchema, RankedResult};

/// Validated preferences plus the confirmation summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePreferencesResponse {
    pub preferences: PreferenceSchema,
    pub summary: Vec<String>,
}

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankListingsResponse {
    pub results: Vec<RankedResult>,
    pub total_candidates: usize,
}

/// A ranked result together with the listing it refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedListing {
    #[serde(flatten)]
    pub result: RankedResult,
    pub listing: Listing,
    /// Listing description with the sentences that match the buyer first
    pub personalized_description: String,
}

/// Response for the find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub search_id: String,
    pub query_text: String,
    pub filters: FilterSet,
    pub matches: Vec<MatchedListing>,
    pub total_candidates: usize,
}

/// Response for listing ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestListingsResponse {
    pub ingested: usize,
}

/// One page of stored listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListListingsResponse {
    pub listings: Vec<Listing>,
    pub total: i64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub listings: Option<i64>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
