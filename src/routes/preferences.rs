use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{check_preferences, validate, Matcher, QUESTIONS};
use crate::models::{ComposeQueryRequest, ErrorResponse, ValidatePreferencesRequest, ValidatePreferencesResponse};

/// Configure preference collection routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/questions", web::get().to(list_questions))
        .route("/preferences/validate", web::post().to(validate_preferences))
        .route("/query/compose", web::post().to(compose_query));
}

/// Questionnaire in asking order
///
/// GET /api/v1/questions
async fn list_questions() -> impl Responder {
    HttpResponse::Ok().json(QUESTIONS)
}

/// Validate raw answers into a preference schema
///
/// POST /api/v1/preferences/validate
///
/// Request body:
/// ```json
/// { "answers": { "budget": "£400,000 to £650,000", "bedrooms": "2-3" } }
/// ```
async fn validate_preferences(req: web::Json<ValidatePreferencesRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match validate(&req.answers) {
        Ok(preferences) => {
            let summary = preferences.summary();
            HttpResponse::Ok().json(ValidatePreferencesResponse { preferences, summary })
        }
        Err(e) => {
            tracing::info!("Rejected answers on field {}: {}", e.field(), e);
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid preferences".to_string(),
                message: e.to_string(),
                status_code: 400,
            })
        }
    }
}

/// Compose the search query and filters for confirmed preferences
///
/// POST /api/v1/query/compose
///
/// Posted preferences are held to the same invariants as validated ones.
async fn compose_query(
    matcher: web::Data<Matcher>,
    req: web::Json<ComposeQueryRequest>,
) -> impl Responder {
    match check_preferences(req.into_inner().preferences) {
        Ok(preferences) => HttpResponse::Ok().json(matcher.compose(&preferences)),
        Err(e) => {
            tracing::info!("Rejected preferences on field {}: {}", e.field(), e);
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid preferences".to_string(),
                message: e.to_string(),
                status_code: 400,
            })
        }
    }
}
