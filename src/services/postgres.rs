use crate::models::Listing;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// PostgreSQL-backed listing store
///
/// Each listing is stored together with the embedding of its search text,
/// so a match request only needs one embedding call for the query.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Insert or replace a listing and its embedding
    pub async fn upsert_listing(
        &self,
        listing: &Listing,
        embedding: Option<&[f32]>,
    ) -> Result<(), PostgresError> {
        let price = i64::try_from(listing.price)
            .map_err(|_| PostgresError::InvalidInput(format!("price out of range for {}", listing.id)))?;
        let size_sqft = listing
            .size_sqft
            .map(i32::try_from)
            .transpose()
            .map_err(|_| PostgresError::InvalidInput(format!("size out of range for {}", listing.id)))?;

        let query = r#"
            INSERT INTO listings (
                id, area, postcode, price, bedrooms, bathrooms, size_sqft, property_type,
                description, area_description, amenities, features, category, embedding
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id)
            DO UPDATE SET
                area = EXCLUDED.area,
                postcode = EXCLUDED.postcode,
                price = EXCLUDED.price,
                bedrooms = EXCLUDED.bedrooms,
                bathrooms = EXCLUDED.bathrooms,
                size_sqft = EXCLUDED.size_sqft,
                property_type = EXCLUDED.property_type,
                description = EXCLUDED.description,
                area_description = EXCLUDED.area_description,
                amenities = EXCLUDED.amenities,
                features = EXCLUDED.features,
                category = EXCLUDED.category,
                embedding = COALESCE(EXCLUDED.embedding, listings.embedding),
                updated_at = NOW()
        "#;

        sqlx::query(query)
            .bind(&listing.id)
            .bind(&listing.area)
            .bind(&listing.postcode)
            .bind(price)
            .bind(i16::from(listing.bedrooms))
            .bind(i16::from(listing.bathrooms))
            .bind(size_sqft)
            .bind(&listing.property_type)
            .bind(&listing.description)
            .bind(&listing.area_description)
            .bind(listing.structured_amenities.iter().cloned().collect::<Vec<String>>())
            .bind(listing.structured_features.iter().cloned().collect::<Vec<String>>())
            .bind(&listing.category)
            .bind(embedding.map(<[f32]>::to_vec))
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted listing {}", listing.id);

        Ok(())
    }

    /// Fetch one listing by id
    pub async fn get_listing(&self, id: &str) -> Result<Listing, PostgresError> {
        let query = r#"
            SELECT id, area, postcode, price, bedrooms, bathrooms, size_sqft, property_type,
                   description, area_description, amenities, features, category
            FROM listings
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Listing {}", id)))?;

        listing_from_row(&row)
    }

    /// List stored listings ordered by id, with pagination
    pub async fn list_listings(&self, limit: usize, offset: usize) -> Result<Vec<Listing>, PostgresError> {
        let query = r#"
            SELECT id, area, postcode, price, bedrooms, bathrooms, size_sqft, property_type,
                   description, area_description, amenities, features, category
            FROM listings
            ORDER BY id
            LIMIT $1 OFFSET $2
        "#;

        let rows = sqlx::query(query)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(listing_from_row).collect()
    }

    /// Every listing that has an embedding, paired with it
    pub async fn list_embedded_listings(&self) -> Result<Vec<(Listing, Vec<f32>)>, PostgresError> {
        let query = r#"
            SELECT id, area, postcode, price, bedrooms, bathrooms, size_sqft, property_type,
                   description, area_description, amenities, features, category, embedding
            FROM listings
            WHERE embedding IS NOT NULL
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let listings = rows
            .iter()
            .map(|row| Ok((listing_from_row(row)?, row.try_get::<Vec<f32>, _>("embedding")?)))
            .collect::<Result<Vec<_>, PostgresError>>()?;

        tracing::debug!("Loaded {} embedded listings", listings.len());

        Ok(listings)
    }

    /// Number of stored listings
    pub async fn count_listings(&self) -> Result<i64, PostgresError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM listings")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("total")?)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn listing_from_row(row: &PgRow) -> Result<Listing, PostgresError> {
    let id: String = row.try_get("id")?;
    let out_of_range = |field: &str| PostgresError::InvalidInput(format!("{} out of range for {}", field, id));

    let price = u64::try_from(row.try_get::<i64, _>("price")?).map_err(|_| out_of_range("price"))?;
    let bedrooms = u8::try_from(row.try_get::<i16, _>("bedrooms")?).map_err(|_| out_of_range("bedrooms"))?;
    let bathrooms = u8::try_from(row.try_get::<i16, _>("bathrooms")?).map_err(|_| out_of_range("bathrooms"))?;
    let size_sqft = row
        .try_get::<Option<i32>, _>("size_sqft")?
        .map(u32::try_from)
        .transpose()
        .map_err(|_| out_of_range("size_sqft"))?;

    Ok(Listing {
        area: row.try_get("area")?,
        postcode: row.try_get("postcode")?,
        price,
        bedrooms,
        bathrooms,
        size_sqft,
        property_type: row.try_get("property_type")?,
        description: row.try_get("description")?,
        area_description: row.try_get("area_description")?,
        structured_amenities: row.try_get::<Vec<String>, _>("amenities")?.into_iter().collect(),
        structured_features: row.try_get::<Vec<String>, _>("features")?.into_iter().collect(),
        category: row.try_get("category")?,
        id,
    })
}
