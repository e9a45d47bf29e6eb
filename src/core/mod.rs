// Core algorithm exports
pub mod explain;
pub mod filters;
pub mod matcher;
pub mod parsing;
pub mod personalize;
pub mod preferences;
pub mod query;
pub mod ranker;
pub mod scoring;

pub use explain::{explain, ExplanationBuilder};
pub use filters::matches_filters;
pub use matcher::{Matcher, MatchResult};
pub use personalize::personalize_description;
pub use preferences::{check_preferences, validate, Question, ValidationError, QUESTIONS};
pub use query::{compose, QueryComposer};
pub use ranker::{rank, ListingRanker, RankedListing};
pub use scoring::normalize_scores;
