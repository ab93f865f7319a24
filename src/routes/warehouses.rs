use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::RankingEngine;
use crate::models::{ErrorResponse, HealthResponse, NearbyRequest, ResponseModel};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: RankingEngine,
}

/// Configure all warehouse-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/warehouses", web::get().to(list_warehouses))
        .route("/nearby_warehouses", web::post().to(nearby_warehouses));
}

/// Health check endpoint, with fan-out and cache counters
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        stats: state.engine.stats(),
    })
}

/// Catalog listing endpoint
///
/// GET /api/v1/warehouses
async fn list_warehouses(state: web::Data<AppState>) -> impl Responder {
    match state.engine.catalog().await {
        Ok(snapshot) => HttpResponse::Ok().json(ResponseModel::success(snapshot.as_slice())),
        Err(e) => {
            tracing::error!("Failed to fetch catalog: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Failed to fetch warehouses".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}

/// Nearby warehouse search endpoint
///
/// POST /api/v1/nearby_warehouses
///
/// Request body:
/// ```json
/// {
///   "zip_code": "string",
///   "radius_miles": 50
/// }
/// ```
///
/// `radius_miles` is optional and defaults to `matching.default_radius_miles`.
async fn nearby_warehouses(
    state: web::Data<AppState>,
    req: web::Json<NearbyRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for nearby_warehouses request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let radius_miles = req
        .radius_miles
        .unwrap_or(state.engine.options().default_radius_miles);

    tracing::info!(
        "Finding warehouses within {} miles of {}",
        radius_miles,
        req.zip_code
    );

    match state.engine.find_nearby(&req.zip_code, radius_miles).await {
        Ok(result) => HttpResponse::Ok().json(ResponseModel::success(result)),
        Err(e) if e.is_user_error() => {
            tracing::info!("Rejected search: {}", e);
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "invalid postal code".to_string(),
                message: e.to_string(),
                status_code: 400,
            })
        }
        Err(e) => {
            tracing::error!("Nearby search for {} failed: {}", req.zip_code, e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Upstream provider failure".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}
