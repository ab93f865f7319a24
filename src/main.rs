use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warehouse_finder::config::{GeocodingBackend, Settings};
use warehouse_finder::core::{Geocoder, RankingEngine, Router};
use warehouse_finder::routes::{self, AppState};
use warehouse_finder::services::{
    AirtableCatalog, GeminiSummarizer, GeocodingProvider, MapboxDirections, MapboxGeocoder,
    NominatimGeocoder, ProviderError, TtlCache,
};

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

fn build_engine(settings: &Settings) -> Result<RankingEngine, ProviderError> {
    let matching = &settings.matching;
    let cache = &settings.cache;

    let geocoding: Arc<dyn GeocodingProvider> = match settings.geocoding.provider {
        GeocodingBackend::Nominatim => Arc::new(NominatimGeocoder::new(
            settings.geocoding.nominatim_url.clone(),
            settings.geocoding.user_agent.clone(),
            matching.geocode_timeout(),
        )?),
        GeocodingBackend::Mapbox => Arc::new(MapboxGeocoder::new(
            settings.geocoding.mapbox_url.clone(),
            settings.geocoding.mapbox_token.clone(),
            matching.geocode_timeout(),
        )?),
    };

    let directions = Arc::new(MapboxDirections::new(
        settings.directions.base_url.clone(),
        settings.directions.access_token.clone(),
        matching.route_timeout(),
    )?);

    let catalog = Arc::new(AirtableCatalog::new(
        settings.catalog.base_url.clone(),
        settings.catalog.api_token.clone(),
        settings.catalog.base_id.clone(),
        settings.catalog.table_name.clone(),
        settings.catalog.view.clone(),
        Duration::from_secs(matching.catalog_timeout_secs),
    )?);

    let summarizer = Arc::new(GeminiSummarizer::new(
        settings.summary.base_url.clone(),
        settings.summary.api_key.clone(),
        settings.summary.model.clone(),
        Duration::from_secs(matching.summary_timeout_secs),
    )?);

    let geocoder = Geocoder::new(
        geocoding,
        TtlCache::with_capacity(cache.max_entries, Duration::from_secs(cache.coordinate_ttl_secs)),
        matching.geocode_timeout(),
    );

    let router = Router::new(
        directions,
        TtlCache::with_capacity(cache.max_entries, Duration::from_secs(cache.route_ttl_secs)),
        matching.route_timeout(),
    );

    Ok(RankingEngine::new(
        geocoder,
        router,
        catalog,
        summarizer,
        settings.engine_options(),
    ))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration, from an explicit file when WAREHOUSE_CONFIG names one
    let loaded = match std::env::var("WAREHOUSE_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting warehouse finder service...");

    let engine = match build_engine(&settings) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to initialize providers: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    info!(
        "Ranking engine initialized (geocoding: {:?}, prefilter buffer: {}x, concurrency: {}/{})",
        settings.geocoding.provider,
        settings.matching.prefilter_buffer,
        settings.matching.geocode_concurrency,
        settings.matching.route_concurrency
    );

    let app_state = AppState { engine };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
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
