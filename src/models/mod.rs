// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ComposedQuery, FilterSet, Listing, PreferenceField, PreferenceSchema, RankedResult,
    SimilarityMetric,
};
pub use requests::{
    ComposeQueryRequest, FindMatchesRequest, IngestListingsRequest, ListListingsQuery,
    RankListingsRequest, ScoredCandidate, ValidatePreferencesRequest,
};
pub use responses::{
    ErrorResponse, FindMatchesResponse, HealthResponse, IngestListingsResponse, ListListingsResponse,
    MatchedListing, RankListingsResponse, ValidatePreferencesResponse,
};
