use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::RankingSettings;
use crate::core::{check_preferences, ExplanationBuilder, ListingRanker};
use crate::models::{
    ErrorResponse, IngestListingsRequest, IngestListingsResponse, ListListingsQuery, ListListingsResponse,
    Listing, RankListingsRequest, RankListingsResponse,
};
use crate::routes::matches::AppState;
use crate::services::{EmbeddingError, ListingCatalog, PostgresError};
use thiserror::Error;

/// Errors that can occur while storing listings
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Storage failed: {0}")]
    Storage(#[from] PostgresError),
}

/// Configure listing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/listings", web::get().to(list_listings))
        .route("/listings", web::post().to(ingest_listings))
        .route("/listings/rank", web::post().to(rank_listings))
        .route("/listings/{id}", web::get().to(get_listing));
}

/// Ingest listings endpoint
///
/// POST /api/v1/listings
///
/// Embeds each listing's search text and upserts it into the store. Ids
/// must be unique within the batch.
async fn ingest_listings(
    state: web::Data<AppState>,
    req: web::Json<IngestListingsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let catalog = match ListingCatalog::from_listings(req.into_inner().listings) {
        Ok(catalog) => catalog,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid listings".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    let listings = catalog.into_listings();
    match store_listings(&state, &listings).await {
        Ok(ingested) => {
            tracing::info!("Ingested {} listings", ingested);
            HttpResponse::Ok().json(IngestListingsResponse { ingested })
        }
        Err(e) => {
            tracing::error!("Failed to ingest listings: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to ingest listings".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Embed and upsert listings, returning how many were stored
pub async fn store_listings(state: &AppState, listings: &[Listing]) -> Result<usize, IngestError> {
    let texts: Vec<String> = listings.iter().map(Listing::search_text).collect();
    let embeddings = state.embedder.embed(&texts).await?;

    for (listing, embedding) in listings.iter().zip(&embeddings) {
        state
            .postgres
            .upsert_listing(listing, Some(embedding.as_slice()))
            .await?;

        state.cache.evict_listing(&listing.id).await;
    }

    Ok(listings.len())
}

/// List stored listings in id order
///
/// GET /api/v1/listings?limit=20&offset=0
async fn list_listings(state: web::Data<AppState>, query: web::Query<ListListingsQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let listed = state.postgres.list_listings(query.limit, query.offset).await;
    let counted = state.postgres.count_listings().await;

    match listed.and_then(|listings| counted.map(|total| (listings, total))) {
        Ok((listings, total)) => HttpResponse::Ok().json(ListListingsResponse { listings, total }),
        Err(e) => {
            tracing::error!("Failed to list listings: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to list listings".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Get listing endpoint
///
/// GET /api/v1/listings/{id}
async fn get_listing(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    if let Some(listing) = state.cache.listing(&id).await {
        return HttpResponse::Ok().json(listing);
    }

    match state.postgres.get_listing(&id).await {
        Ok(listing) => {
            state.cache.store_listing(&listing).await;
            HttpResponse::Ok().json(listing)
        }
        Err(PostgresError::NotFound(message)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Listing not found".to_string(),
            message,
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch listing {}: {}", id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch listing".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Rank caller-scored listings
///
/// POST /api/v1/listings/rank
///
/// Request body:
/// ```json
/// {
///   "candidates": [{ "listing": { ... }, "similarity": 0.82 }],
///   "filters": { "budgetMax": 550000 },
///   "preferences": { ... },
///   "topK": 5,
///   "metric": "l2_distance"
/// }
/// ```
async fn rank_listings(
    ranking: web::Data<RankingSettings>,
    req: web::Json<RankListingsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let mut req = req.into_inner();
    if let Some(preferences) = req.preferences.take() {
        match check_preferences(preferences) {
            Ok(preferences) => req.preferences = Some(preferences),
            Err(e) => {
                tracing::info!("Rejected preferences on field {}: {}", e.field(), e);
                return HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Invalid preferences".to_string(),
                    message: e.to_string(),
                    status_code: 400,
                });
            }
        }
    }

    let total_candidates = req.candidates.len();
    let top_k = ranking.resolve_top_k(req.top_k);
    let ranker = ListingRanker::new(req.metric.unwrap_or(ranking.similarity_metric));
    let explainer = ExplanationBuilder::new(ranking.max_explanations);

    let scored = req
        .candidates
        .into_iter()
        .map(|candidate| (candidate.listing, candidate.similarity))
        .collect();

    let results = ranker
        .rank_listings(scored, &req.filters, top_k)
        .iter()
        .map(|ranked| {
            let labels = req
                .preferences
                .as_ref()
                .map(|prefs| explainer.explain(prefs, &ranked.listing))
                .unwrap_or_default();
            ranked.to_result(labels)
        })
        .collect();

    HttpResponse::Ok().json(RankListingsResponse {
        results,
        total_candidates,
    })
}
