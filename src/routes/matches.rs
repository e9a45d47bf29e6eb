use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::RankingSettings;
use crate::core::{check_preferences, validate, Matcher};
use crate::models::{
    ComposedQuery, ErrorResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse, MatchedListing,
    PreferenceSchema,
};
use crate::services::{
    cosine_similarity, CacheManager, ChatClient, EmbeddingClient, EmbeddingError, PostgresClient,
};
use std::sync::Arc;

/// Backends shared across all handlers
///
/// The matcher and ranking settings are registered as their own app data so
/// routes that only need them run without any backend.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheManager>,
    pub postgres: Arc<PostgresClient>,
    pub embedder: Arc<EmbeddingClient>,
    /// Set when personalized descriptions are polished by a chat model
    pub rewriter: Option<Arc<ChatClient>>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);
    let listings = if pg_healthy {
        state.postgres.count_listings().await.ok()
    } else {
        None
    };

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        listings,
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "preferences": { "preferredAreas": ["Peckham"], "budgetMax": 550000 },
///   "answers": { "budget": "up to £550k" },
///   "topK": 5
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    matcher: web::Data<Matcher>,
    ranking: web::Data<RankingSettings>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let checked = match req.preferences {
        Some(preferences) => check_preferences(preferences),
        None => validate(&req.answers),
    };
    let preferences = match checked {
        Ok(preferences) => preferences,
        Err(e) => {
            tracing::info!("Rejected preferences on field {}: {}", e.field(), e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid preferences".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    let top_k = ranking.resolve_top_k(req.top_k);
    let search_id = uuid::Uuid::new_v4().to_string();
    let query = matcher.compose(&preferences);

    tracing::info!("Search {}: \"{}\" (top_k: {})", search_id, query.query_text, top_k);

    let query_embedding = match embed_query(&state, &query).await {
        Ok(embedding) => embedding,
        Err(e) => {
            tracing::error!("Failed to embed query for search {}: {}", search_id, e);
            return HttpResponse::BadGateway().json(ErrorResponse {
                error: "Failed to embed query".to_string(),
                message: e.to_string(),
                status_code: 502,
            });
        }
    };

    let listings = match state.postgres.list_embedded_listings().await {
        Ok(listings) => listings,
        Err(e) => {
            tracing::error!("Failed to load listings for search {}: {}", search_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load listings".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let candidates = listings
        .into_iter()
        .map(|(listing, embedding)| {
            let similarity = cosine_similarity(&query_embedding, &embedding);
            (listing, similarity)
        })
        .collect();

    let mut result = matcher.find_matches(&preferences, &query, candidates, top_k);

    if let Some(rewriter) = &state.rewriter {
        polish_descriptions(rewriter, &preferences, &mut result.matches).await;
    }

    tracing::info!(
        "Returning {} matches for search {} (from {} candidates)",
        result.matches.len(),
        search_id,
        result.total_candidates
    );

    HttpResponse::Ok().json(FindMatchesResponse {
        search_id,
        query_text: query.query_text,
        filters: query.filters,
        matches: result.matches,
        total_candidates: result.total_candidates,
    })
}

/// Embedding of the composed query, served from cache when possible
async fn embed_query(state: &AppState, query: &ComposedQuery) -> Result<Vec<f32>, EmbeddingError> {
    if let Some(embedding) = state.cache.query_embedding(query).await {
        tracing::debug!("Query embedding served from cache");
        return Ok(embedding);
    }

    let embedding = state.embedder.embed_one(&query.query_text).await?;
    state.cache.store_query_embedding(query, &embedding).await;

    Ok(embedding)
}

/// Replace personalized descriptions with chat-model rewrites, keeping the
/// deterministic text for any listing the model fails on
async fn polish_descriptions(rewriter: &ChatClient, preferences: &PreferenceSchema, matches: &mut [MatchedListing]) {
    for matched in matches.iter_mut() {
        match rewriter
            .rewrite_description(preferences, &matched.listing, &matched.personalized_description)
            .await
        {
            Ok(text) => matched.personalized_description = text,
            Err(e) => tracing::warn!("Keeping deterministic description for {}: {}", matched.listing.id, e),
        }
    }
}
