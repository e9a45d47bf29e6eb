use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use homematch::config::Settings;
use homematch::core::{ExplanationBuilder, ListingRanker, Matcher, QueryComposer};
use homematch::models::SimilarityMetric;
use homematch::routes::{self, listings::store_listings, matches::AppState};
use homematch::services::{CacheManager, ChatClient, EmbeddingClient, ListingCatalog, PostgresClient};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging; LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.json().init(),
    }

    info!("Starting Homematch preference matching service...");

    let embedder = Arc::new(
        EmbeddingClient::from_settings(&settings.embedding)
            .map_err(|e| io_error("Failed to create embedding client", e))?,
    );

    info!("Embedding client initialized (model: {})", settings.embedding.model);

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(3600);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = Arc::new(
        CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl)
            .await
            .map_err(|e| io_error("Failed to connect to Redis", e))?,
    );

    info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);

    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            Some(db_max_conn),
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| io_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    // Stored listings are scored by cosine similarity against the query
    // embedding, so the pipeline ranks similarities. The configured metric
    // applies to caller-scored candidates on /listings/rank.
    let matcher = Matcher::new(
        QueryComposer::new(settings.ranking.default_location.clone()),
        ListingRanker::new(SimilarityMetric::Similarity),
        ExplanationBuilder::new(settings.ranking.max_explanations),
    );

    info!("Matcher initialized with ranking settings: {:?}", settings.ranking);

    let rewriter = if settings.personalization.rewrite_with_llm {
        let client = ChatClient::from_settings(&settings.embedding, &settings.personalization)
            .map_err(|e| io_error("Failed to create chat client", e))?;
        info!("Description rewriting enabled (model: {})", settings.personalization.model);
        Some(Arc::new(client))
    } else {
        None
    };

    let app_state = AppState {
        cache,
        postgres,
        embedder,
        rewriter,
    };
    let matcher = web::Data::new(matcher);
    let ranking = web::Data::new(settings.ranking.clone());

    if let Some(path) = &settings.catalog.seed_path {
        match ListingCatalog::from_json_file(path) {
            Ok(catalog) => {
                let listings = catalog.into_listings();
                let seeded = store_listings(&app_state, &listings)
                    .await
                    .map_err(|e| io_error("Failed to seed listings", e))?;
                info!("Seeded {} listings from {}", seeded, path);
            }
            Err(e) => warn!("Skipping listing seed from {}: {}", path, e),
        }
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(matcher.clone())
            .app_data(ranking.clone())
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
