use crate::core::{
    audit::{audit, FilterSchema},
    batch::{BatchController, BatchStats, DEFAULT_GEOCODE_CONCURRENCY, DEFAULT_ROUTE_CONCURRENCY},
    distance::{passes_prefilter, DEFAULT_PREFILTER_BUFFER},
    geocoder::Geocoder,
    router::{RouteRequest, Router},
    tier::tier_rank,
};
use crate::models::{CandidateFacility, Coordinate, DistanceResult, NearbyResult, RankedCandidate};
use crate::services::{
    with_timeout, CacheStats, CatalogSource, ProviderError, SummaryGenerator, TtlCache, CATALOG_TTL,
    FALLBACK_SUMMARY,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const CATALOG_KEY: &str = "catalog";

/// Errors returned by [`RankingEngine::find_nearby`]
#[derive(Debug, Error)]
pub enum FindNearbyError {
    /// The origin postal code did not resolve; a caller input error
    #[error("invalid postal code: {0}")]
    InvalidPostalCode(String),

    #[error("origin geocoding failed: {0}")]
    Origin(#[source] ProviderError),

    #[error("catalog unavailable: {0}")]
    Catalog(#[source] ProviderError),
}

impl FindNearbyError {
    pub fn is_user_error(&self) -> bool {
        matches!(self, FindNearbyError::InvalidPostalCode(_))
    }
}

/// Tunables for the ranking pipeline
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Straight-line cutoff is `radius_miles * prefilter_buffer`
    pub prefilter_buffer: f64,
    pub geocode_concurrency: usize,
    pub route_concurrency: usize,
    pub catalog_ttl: Duration,
    pub catalog_timeout: Duration,
    pub summary_timeout: Duration,
    /// Radius applied when a request does not name one
    pub default_radius_miles: f64,
    pub schema: FilterSchema,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            prefilter_buffer: DEFAULT_PREFILTER_BUFFER,
            geocode_concurrency: DEFAULT_GEOCODE_CONCURRENCY,
            route_concurrency: DEFAULT_ROUTE_CONCURRENCY,
            catalog_ttl: CATALOG_TTL,
            catalog_timeout: Duration::from_secs(30),
            summary_timeout: Duration::from_secs(20),
            default_radius_miles: 50.0,
            schema: FilterSchema::default(),
        }
    }
}

/// Lifetime fan-out counters and cache sizes
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub geocode_batch: BatchStats,
    pub route_batch: BatchStats,
    pub coordinate_cache: CacheStats,
    pub route_cache: CacheStats,
}

/// Nearby facility search orchestrator
///
/// # Pipeline Stages
/// 1. Resolve the origin postal code
/// 2. Load the catalog snapshot (cached)
/// 3. Geocode distinct candidate postal codes (bounded fan-out)
/// 4. Great-circle prefilter
/// 5. Routed distance for survivors (bounded fan-out)
/// 6. Radius filter, tier ranking and completeness audit
/// 7. Sort and attach the narrative summary
#[derive(Clone)]
pub struct RankingEngine {
    geocoder: Geocoder,
    router: Router,
    catalog: Arc<dyn CatalogSource>,
    summarizer: Arc<dyn SummaryGenerator>,
    catalog_cache: TtlCache<&'static str, Arc<Vec<CandidateFacility>>>,
    geocode_batch: BatchController,
    route_batch: BatchController,
    options: EngineOptions,
}

impl RankingEngine {
    pub fn new(
        geocoder: Geocoder,
        router: Router,
        catalog: Arc<dyn CatalogSource>,
        summarizer: Arc<dyn SummaryGenerator>,
        options: EngineOptions,
    ) -> Self {
        Self {
            geocoder,
            router,
            catalog,
            summarizer,
            catalog_cache: TtlCache::with_capacity(1, options.catalog_ttl),
            geocode_batch: BatchController::new("geocode", options.geocode_concurrency),
            route_batch: BatchController::new("route", options.route_concurrency),
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            geocode_batch: self.geocode_batch.stats(),
            route_batch: self.route_batch.stats(),
            coordinate_cache: self.geocoder.cache_stats(),
            route_cache: self.router.cache_stats(),
        }
    }

    /// Current catalog snapshot, fetched at most once per catalog TTL
    pub async fn catalog(&self) -> Result<Arc<Vec<CandidateFacility>>, ProviderError> {
        if let Some(snapshot) = self.catalog_cache.get(&CATALOG_KEY).await {
            return Ok(snapshot);
        }

        let records = with_timeout(self.options.catalog_timeout, self.catalog.fetch_all()).await?;
        tracing::info!("Fetched catalog snapshot: {} facilities", records.len());

        let snapshot = Arc::new(records);
        self.catalog_cache
            .set(CATALOG_KEY, snapshot.clone(), self.options.catalog_ttl)
            .await;
        Ok(snapshot)
    }

    /// Find and rank facilities within `radius_miles` driving distance of a postal code
    pub async fn find_nearby(
        &self,
        origin_zip: &str,
        radius_miles: f64,
    ) -> Result<NearbyResult, FindNearbyError> {
        let origin_zip = origin_zip.trim();

        let origin = match self.geocoder.resolve(origin_zip).await {
            Ok(Some(coord)) => coord,
            Ok(None) => return Err(FindNearbyError::InvalidPostalCode(origin_zip.to_string())),
            Err(e) => return Err(FindNearbyError::Origin(e)),
        };

        let catalog = self.catalog().await.map_err(FindNearbyError::Catalog)?;

        // Stage 3: geocode each distinct postal code once
        let candidates: Vec<&CandidateFacility> =
            catalog.iter().filter(|f| f.postal_code().is_some()).collect();
        let distinct_zips: Vec<String> = candidates
            .iter()
            .filter_map(|f| f.postal_code())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let coordinates = self.geocode_all(distinct_zips).await;

        // Stage 4: great-circle prefilter
        let route_requests: Vec<RouteRequest> = coordinates
            .iter()
            .filter(|(_, coord)| {
                passes_prefilter(origin, **coord, radius_miles, self.options.prefilter_buffer)
            })
            .map(|(zip, coord)| RouteRequest {
                origin_zip: origin_zip.to_string(),
                origin,
                destination_zip: zip.clone(),
                destination: *coord,
            })
            .collect();

        tracing::debug!(
            "{} of {} geocoded postal codes pass the prefilter",
            route_requests.len(),
            coordinates.len()
        );

        // Stage 5: routed distance
        let distances = self.route_all(route_requests).await;

        // Stage 6: radius filter, rank and audit
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter_map(|facility| {
                let zip = facility.postal_code()?;
                let routed = distances.get(zip)?;
                if routed.distance_miles <= radius_miles {
                    Some(self.rank_candidate(facility, *routed))
                } else {
                    None
                }
            })
            .collect();

        // Stage 7: order and summarize
        sort_ranked(&mut ranked);
        let ai_analysis = self.summarize(&ranked, origin_zip, radius_miles).await;

        tracing::info!(
            "Returning {} warehouses within {} miles of {} (from {} catalog entries)",
            ranked.len(),
            radius_miles,
            origin_zip,
            catalog.len()
        );
        let stats = self.stats();
        tracing::debug!(
            "Fan-out totals: geocode {} dispatched / {} failed, route {} dispatched / {} failed; cached coordinates {}, routes {}",
            stats.geocode_batch.dispatched,
            stats.geocode_batch.failed,
            stats.route_batch.dispatched,
            stats.route_batch.failed,
            stats.coordinate_cache.entry_count,
            stats.route_cache.entry_count
        );

        Ok(NearbyResult {
            origin_zip: origin_zip.to_string(),
            warehouses: ranked,
            ai_analysis,
        })
    }

    async fn geocode_all(&self, zips: Vec<String>) -> HashMap<String, Coordinate> {
        let geocoder = &self.geocoder;

        self.geocode_batch
            .map_concurrently(zips, |zip| async move { geocoder.resolve(&zip).await })
            .await
            .into_iter()
            .filter_map(|(zip, result)| match result {
                Ok(Some(coord)) => Some((zip, coord)),
                Ok(None) => {
                    tracing::debug!("Dropping candidates with unresolvable zip {}", zip);
                    None
                }
                Err(e) => {
                    tracing::warn!("Geocoding {} failed, dropping its candidates: {}", zip, e);
                    None
                }
            })
            .collect()
    }

    async fn route_all(&self, requests: Vec<RouteRequest>) -> HashMap<String, DistanceResult> {
        let router = &self.router;

        self.route_batch
            .map_concurrently(requests, |req| async move { router.route(&req).await })
            .await
            .into_iter()
            .filter_map(|(req, result)| match result {
                Ok(Some(distance)) => Some((req.destination_zip, distance)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!("Routing to {} failed, dropping its candidates: {}", req.destination_zip, e);
                    None
                }
            })
            .collect()
    }

    fn rank_candidate(&self, facility: &CandidateFacility, routed: DistanceResult) -> RankedCandidate {
        let missing_fields = audit(&facility.fields.to_attribute_map(), &self.options.schema);

        RankedCandidate {
            id: facility.id.clone(),
            fields: facility.fields.clone(),
            created_time: facility.created_time,
            distance_miles: routed.distance_miles,
            duration_minutes: routed.duration_minutes,
            tier_rank: tier_rank(facility.fields.tier.as_deref()),
            has_missing_fields: !missing_fields.is_empty(),
            missing_fields,
        }
    }

    async fn summarize(&self, ranked: &[RankedCandidate], origin_zip: &str, radius_miles: f64) -> String {
        if ranked.is_empty() {
            return format!(
                "No warehouses were found within {} miles of {}.",
                radius_miles, origin_zip
            );
        }

        match with_timeout(self.options.summary_timeout, self.summarizer.summarize(ranked)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Summary generation failed, using fallback: {}", e);
                FALLBACK_SUMMARY.to_string()
            }
        }
    }
}

/// Order by tier, then driving time, then driving distance
///
/// The facility id breaks any remaining tie so output is deterministic.
pub fn sort_ranked(ranked: &mut [RankedCandidate]) {
    ranked.sort_by(compare_ranked);
}

fn compare_ranked(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    a.tier_rank
        .cmp(&b.tier_rank)
        .then_with(|| a.duration_minutes.total_cmp(&b.duration_minutes))
        .then_with(|| a.distance_miles.total_cmp(&b.distance_miles))
        .then_with(|| a.id.cmp(&b.id))
}
