use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::{EngineOptions, FilterSchema};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub directions: DirectionsSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub summary: SummarySettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodingBackend {
    Nominatim,
    Mapbox,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_backend")]
    pub provider: GeocodingBackend,
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_mapbox_url")]
    pub mapbox_url: String,
    #[serde(default)]
    pub mapbox_token: String,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            provider: default_geocoding_backend(),
            nominatim_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            mapbox_url: default_mapbox_url(),
            mapbox_token: String::new(),
        }
    }
}

fn default_geocoding_backend() -> GeocodingBackend { GeocodingBackend::Nominatim }
fn default_nominatim_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { concat!("warehouse-finder/", env!("CARGO_PKG_VERSION")).to_string() }
fn default_mapbox_url() -> String { "https://api.mapbox.com".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsSettings {
    #[serde(default = "default_mapbox_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
}

impl Default for DirectionsSettings {
    fn default() -> Self {
        Self {
            base_url: default_mapbox_url(),
            access_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_airtable_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub base_id: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_view")]
    pub view: Option<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: default_airtable_url(),
            api_token: String::new(),
            base_id: String::new(),
            table_name: default_table_name(),
            view: default_view(),
        }
    }
}

fn default_airtable_url() -> String { "https://api.airtable.com".to_string() }
fn default_table_name() -> String { "Imported table".to_string() }
fn default_view() -> Option<String> { Some("warehouse".to_string()) }

#[derive(Debug, Clone, Deserialize)]
pub struct SummarySettings {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

fn default_gemini_url() -> String { "https://generativelanguage.googleapis.com".to_string() }
fn default_model() -> String { "gemini-1.5-flash".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_coordinate_ttl")]
    pub coordinate_ttl_secs: u64,
    #[serde(default = "default_route_ttl")]
    pub route_ttl_secs: u64,
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            coordinate_ttl_secs: default_coordinate_ttl(),
            route_ttl_secs: default_route_ttl(),
            catalog_ttl_secs: default_catalog_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_coordinate_ttl() -> u64 { 24 * 60 * 60 }
fn default_route_ttl() -> u64 { 24 * 60 * 60 }
fn default_catalog_ttl() -> u64 { 60 * 60 }
fn default_max_entries() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_prefilter_buffer")]
    pub prefilter_buffer: f64,
    #[serde(default = "default_geocode_concurrency")]
    pub geocode_concurrency: usize,
    #[serde(default = "default_route_concurrency")]
    pub route_concurrency: usize,
    #[serde(default = "default_radius_miles")]
    pub default_radius_miles: f64,
    #[serde(default = "default_geocode_timeout")]
    pub geocode_timeout_secs: u64,
    #[serde(default = "default_route_timeout")]
    pub route_timeout_secs: u64,
    #[serde(default = "default_catalog_timeout")]
    pub catalog_timeout_secs: u64,
    #[serde(default = "default_summary_timeout")]
    pub summary_timeout_secs: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            prefilter_buffer: default_prefilter_buffer(),
            geocode_concurrency: default_geocode_concurrency(),
            route_concurrency: default_route_concurrency(),
            default_radius_miles: default_radius_miles(),
            geocode_timeout_secs: default_geocode_timeout(),
            route_timeout_secs: default_route_timeout(),
            catalog_timeout_secs: default_catalog_timeout(),
            summary_timeout_secs: default_summary_timeout(),
        }
    }
}

fn default_prefilter_buffer() -> f64 { 2.0 }
fn default_geocode_concurrency() -> usize { 10 }
fn default_route_concurrency() -> usize { 5 }
fn default_radius_miles() -> f64 { 50.0 }
fn default_geocode_timeout() -> u64 { 10 }
fn default_route_timeout() -> u64 { 10 }
fn default_catalog_timeout() -> u64 { 30 }
fn default_summary_timeout() -> u64 { 20 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl MatchingSettings {
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_secs)
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with WAREHOUSE__)
    /// 5. Conventional provider credentials (MAPBOX_TOKEN, AIRTABLE_TOKEN, ...)
    pub fn load() -> Result<Self, ConfigError> {
        Self::finish(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        )
    }

    /// Load configuration from a custom path
    ///
    /// Environment overrides and credential fallbacks apply as in [`Settings::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::finish(Config::builder().add_source(File::from(path.as_ref())))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings = builder
            // e.g., WAREHOUSE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("WAREHOUSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Ranking pipeline options derived from the matching and cache sections
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            prefilter_buffer: self.matching.prefilter_buffer,
            geocode_concurrency: self.matching.geocode_concurrency,
            route_concurrency: self.matching.route_concurrency,
            catalog_ttl: Duration::from_secs(self.cache.catalog_ttl_secs),
            catalog_timeout: Duration::from_secs(self.matching.catalog_timeout_secs),
            summary_timeout: Duration::from_secs(self.matching.summary_timeout_secs),
            default_radius_miles: self.matching.default_radius_miles,
            schema: FilterSchema::default(),
        }
    }
}

/// Fill provider credentials from their conventional environment variables
/// when the prefixed settings leave them unset
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let fallbacks = [
        ("MAPBOX_TOKEN", "geocoding.mapbox_token"),
        ("MAPBOX_TOKEN", "directions.access_token"),
        ("AIRTABLE_TOKEN", "catalog.api_token"),
        ("BASE_ID", "catalog.base_id"),
        ("GEMINI_API_KEY", "summary.api_key"),
    ];

    let mut builder = Config::builder().add_source(settings.clone());

    for (var, key) in fallbacks {
        let already_set = settings
            .get_string(key)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        if already_set {
            continue;
        }
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
