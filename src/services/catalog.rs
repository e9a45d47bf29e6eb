use crate::models::Listing;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while building a listing catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate listing id: {0}")]
    DuplicateId(String),

    #[error("Failed to read listings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse listings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// In-memory listing collection keyed by id
///
/// Used to seed the store from a JSON file and to check ingestion batches.
/// Ids are unique; iteration is in id order.
#[derive(Debug, Clone, Default)]
pub struct ListingCatalog {
    listings: BTreeMap<String, Listing>,
}

impl ListingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_listings(listings: Vec<Listing>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for listing in listings {
            catalog.insert(listing)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of listings
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let listings: Vec<Listing> = serde_json::from_str(json)?;
        Self::from_listings(listings)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, listing: Listing) -> Result<(), CatalogError> {
        if self.listings.contains_key(&listing.id) {
            return Err(CatalogError::DuplicateId(listing.id));
        }
        self.listings.insert(listing.id.clone(), listing);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.get(id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    pub fn into_listings(self) -> Vec<Listing> {
        self.listings.into_values().collect()
    }
}
