// Service exports
pub mod cache;
pub mod catalog;
pub mod chat;
pub mod embedding;
pub mod postgres;

pub use cache::{CacheManager, CacheKey, CacheError};
pub use catalog::{ListingCatalog, CatalogError};
pub use chat::{ChatClient, ChatError};
pub use embedding::{cosine_similarity, EmbeddingClient, EmbeddingError};
pub use postgres::{PostgresClient, PostgresError};
