//! Homematch - Preference matching service for personalized real-estate listings
//!
//! This library turns a buyer's free-text questionnaire answers into a
//! validated preference schema, composes a deterministic search query from it,
//! ranks externally scored listings against hard constraints and explains why
//! each listing matched.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{compose, explain, rank, validate, Matcher, ValidationError};
pub use models::{ComposedQuery, FilterSet, Listing, PreferenceSchema, RankedResult, FindMatchesRequest, FindMatchesResponse};
