use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structured buyer requirements collected during one session
///
/// Every field is optional. Sets are ordered so that anything derived from
/// the schema (query text, filters, explanations) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSchema {
    #[serde(default)]
    pub property_type: BTreeSet<String>,
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
    pub bedrooms_min: Option<u8>,
    pub bedrooms_max: Option<u8>,
    pub bathrooms_min: Option<u8>,
    pub bathrooms_max: Option<u8>,
    pub outdoor_space: Option<String>,
    #[serde(default)]
    pub preferred_areas: Vec<String>,
    #[serde(default)]
    pub excluded_areas: BTreeSet<String>,
    pub commute_destination: Option<String>,
    pub commute_max_minutes: Option<u16>,
    pub transport_preference: Option<String>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    pub community_type: Option<String>,
    #[serde(default)]
    pub must_have_features: BTreeSet<String>,
    #[serde(default)]
    pub deal_breakers: BTreeSet<String>,
    #[serde(default)]
    pub top_priorities: Vec<String>,
}

impl PreferenceSchema {
    /// True when no field has been populated
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A property record as held by the listing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub area: String,
    #[serde(default)]
    pub postcode: String,
    pub price: u64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    #[serde(default)]
    pub size_sqft: Option<u32>,
    pub property_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub area_description: String,
    #[serde(default)]
    pub structured_amenities: BTreeSet<String>,
    #[serde(default)]
    pub structured_features: BTreeSet<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Listing {
    /// Text handed to the embedding provider for this listing
    pub fn search_text(&self) -> String {
        format!(
            "{} in {} {}. {} bedrooms, {} bathrooms, £{}. {} {}",
            self.property_type,
            self.area,
            self.postcode,
            self.bedrooms,
            self.bathrooms,
            self.price,
            self.description,
            self.area_description,
        )
    }

    /// Outward code of the postcode, e.g. "SE15" for "SE15 4QL"
    pub fn postcode_district(&self) -> Option<&str> {
        self.postcode.split_whitespace().next()
    }
}

/// Hard constraints extracted from preferences
///
/// Applied as strict pass/fail filters around semantic search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
    pub bedrooms_min: Option<u8>,
    pub bedrooms_max: Option<u8>,
    pub bathrooms_min: Option<u8>,
    pub bathrooms_max: Option<u8>,
    #[serde(default)]
    pub excluded_areas: BTreeSet<String>,
    #[serde(default)]
    pub property_types: BTreeSet<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Output of the query composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedQuery {
    pub query_text: String,
    pub filters: FilterSet,
}

/// Ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub listing_id: String,
    pub similarity_score: f64,
    pub rank: usize,
    pub price: u64,
    #[serde(default)]
    pub matched_attributes: Vec<String>,
}

/// How raw similarity values from the search backend should be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Already a similarity in [0, 1], higher is better
    #[default]
    Similarity,
    /// Cosine distance in [0, 2], lower is better
    CosineDistance,
    /// Unbounded euclidean distance, lower is better
    L2Distance,
}

/// Preference fields in the fixed order used by the composer and explainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceField {
    PropertyType,
    Area,
    Bedrooms,
    Bathrooms,
    OutdoorSpace,
    Budget,
    Features,
    Community,
    Transport,
    Amenities,
}

impl PreferenceField {
    pub const ORDERED: [PreferenceField; 10] = [
        PreferenceField::PropertyType,
        PreferenceField::Area,
        PreferenceField::Bedrooms,
        PreferenceField::Bathrooms,
        PreferenceField::OutdoorSpace,
        PreferenceField::Budget,
        PreferenceField::Features,
        PreferenceField::Community,
        PreferenceField::Transport,
        PreferenceField::Amenities,
    ];
}
