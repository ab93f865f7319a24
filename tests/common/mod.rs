// Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warehouse_finder::core::{EngineOptions, Geocoder, RankingEngine, Router};
use warehouse_finder::models::{CandidateFacility, Coordinate, DistanceResult, RankedCandidate};
use warehouse_finder::services::{
    CatalogSource, DirectionsProvider, GeocodingProvider, ProviderError, SummaryGenerator, TtlCache,
};
use warehouse_finder::haversine;

pub const ORIGIN_ZIP: &str = "10001";

/// Routed distance is this multiple of the straight-line distance
pub const ROAD_FACTOR: f64 = 1.3;

pub fn known_zips() -> HashMap<String, Coordinate> {
    [
        ("10001", 40.7506, -73.9972), // Manhattan
        ("07102", 40.7357, -74.1724), // Newark
        ("07302", 40.7178, -74.0431), // Jersey City
        ("10701", 40.9312, -73.8987), // Yonkers
        ("11201", 40.6943, -73.9903), // Brooklyn
        ("19103", 39.9526, -75.1652), // Philadelphia
        ("06901", 41.0534, -73.5387), // Stamford
        ("08540", 40.3573, -74.6672), // Princeton
    ]
    .into_iter()
    .map(|(zip, lat, lon)| (zip.to_string(), Coordinate::new(lat, lon)))
    .collect()
}

pub fn facility(id: &str, zip: Option<&str>, tier: Option<&str>) -> CandidateFacility {
    let mut fields = json!({ "City": "Somewhere", "State": "NY", "Status": "Active" });
    if let Some(zip) = zip {
        fields["Zip"] = json!(zip);
    }
    if let Some(tier) = tier {
        fields["Tier"] = json!(tier);
    }
    serde_json::from_value(json!({ "id": id, "fields": fields })).unwrap()
}

pub fn standard_catalog() -> Vec<CandidateFacility> {
    vec![
        facility("rec-gold-newark", Some("07102"), Some("Gold")),
        facility("rec-silver-jc", Some("07302"), Some("silver ")),
        facility("rec-bronze-yonkers", Some("10701"), Some("Bronze")),
        facility("rec-none-brooklyn", Some("11201"), None),
        facility("rec-dup-gold", Some("07102"), Some("GOLD")),
        facility("rec-far-philly", Some("19103"), Some("Gold")),
        facility("rec-nozip", None, Some("Gold")),
        facility("rec-unknown-zip", Some("99999"), Some("Gold")),
        facility("rec-failing-stamford", Some("06901"), Some("Gold")),
        facility("rec-outside-princeton", Some("08540"), Some("Gold")),
    ]
}

pub struct FakeGeocoder {
    zips: HashMap<String, Coordinate>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            zips: known_zips(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls_for(&self, zip: &str) -> usize {
        self.calls.lock().unwrap().get(zip).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn geocode(&self, text: &str) -> Result<Option<Coordinate>, ProviderError> {
        *self.calls.lock().unwrap().entry(text.to_string()).or_default() += 1;
        Ok(self.zips.get(text).copied())
    }
}

pub struct FakeDirections {
    failing: HashSet<String>,
    slow: HashSet<String>,
    zip_by_coord: HashMap<[u64; 2], String>,
    routed: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeDirections {
    pub fn new() -> Self {
        let zip_by_coord = known_zips()
            .into_iter()
            .map(|(zip, c)| ([c.latitude.to_bits(), c.longitude.to_bits()], zip))
            .collect();

        Self {
            failing: HashSet::from(["06901".to_string()]),
            slow: HashSet::new(),
            zip_by_coord,
            routed: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_slow(mut self, zip: &str) -> Self {
        self.slow.insert(zip.to_string());
        self
    }

    /// Destination zips routed so far
    pub fn routed(&self) -> Vec<String> {
        self.routed.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionsProvider for FakeDirections {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<DistanceResult>, ProviderError> {
        let zip = self
            .zip_by_coord
            .get(&[destination.latitude.to_bits(), destination.longitude.to_bits()])
            .cloned()
            .unwrap_or_default();
        self.routed.lock().unwrap().push(zip.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.slow.contains(&zip) {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&zip) {
            return Err(ProviderError::ApiError("502 Bad Gateway".into()));
        }

        let distance_miles = haversine(origin, destination) * ROAD_FACTOR;
        Ok(Some(DistanceResult {
            distance_miles,
            duration_minutes: distance_miles * 1.5,
        }))
    }
}

pub struct FakeCatalog {
    records: Vec<CandidateFacility>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(records: Vec<CandidateFacility>) -> Self {
        Self {
            records,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_all(&self) -> Result<Vec<CandidateFacility>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::ApiError("500 Internal Server Error".into()));
        }
        Ok(self.records.clone())
    }
}

pub struct FakeSummarizer {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeSummarizer {
    pub fn ok() -> Self {
        Self { fail: false, calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { fail: true, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryGenerator for FakeSummarizer {
    async fn summarize(&self, ranked: &[RankedCandidate]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::ApiError("quota exceeded".into()));
        }
        Ok(format!("{} warehouses ranked by tier, then driving time.", ranked.len()))
    }
}

pub struct Harness {
    pub engine: RankingEngine,
    pub geocoding: Arc<FakeGeocoder>,
    pub directions: Arc<FakeDirections>,
    pub catalog: Arc<FakeCatalog>,
    pub summarizer: Arc<FakeSummarizer>,
}

pub struct HarnessBuilder {
    directions: FakeDirections,
    catalog: FakeCatalog,
    summarizer: FakeSummarizer,
    options: EngineOptions,
    route_timeout: Duration,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            directions: FakeDirections::new(),
            catalog: FakeCatalog::new(standard_catalog()),
            summarizer: FakeSummarizer::ok(),
            options: EngineOptions::default(),
            route_timeout: Duration::from_secs(1),
        }
    }

    pub fn directions(mut self, directions: FakeDirections) -> Self {
        self.directions = directions;
        self
    }

    pub fn catalog(mut self, catalog: FakeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn summarizer(mut self, summarizer: FakeSummarizer) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn route_timeout(mut self, timeout: Duration) -> Self {
        self.route_timeout = timeout;
        self
    }

    pub fn build(self) -> Harness {
        let geocoding = Arc::new(FakeGeocoder::new());
        let directions = Arc::new(self.directions);
        let catalog = Arc::new(self.catalog);
        let summarizer = Arc::new(self.summarizer);

        let geocoder = Geocoder::new(
            geocoding.clone(),
            TtlCache::new(Duration::from_secs(60)),
            Duration::from_secs(1),
        );
        let router = Router::new(
            directions.clone(),
            TtlCache::new(Duration::from_secs(60)),
            self.route_timeout,
        );

        let engine = RankingEngine::new(
            geocoder,
            router,
            catalog.clone(),
            summarizer.clone(),
            self.options,
        );

        Harness {
            engine,
            geocoding,
            directions,
            catalog,
            summarizer,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::new().build()
}
