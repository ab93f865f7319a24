use crate::models::{Coordinate, DistanceResult};
use crate::services::{with_timeout, CacheStats, DirectionsProvider, ProviderError, TtlCache};
use std::sync::Arc;
use std::time::Duration;

/// Cache key for a routed lookup
///
/// Includes the postal codes as well as the coordinates so two distinct
/// zip pairs that geocode to the same point never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin_zip: String,
    destination_zip: String,
    origin: [u64; 2],
    destination: [u64; 2],
}

impl RouteKey {
    pub fn new(origin_zip: &str, origin: Coordinate, destination_zip: &str, destination: Coordinate) -> Self {
        Self {
            origin_zip: origin_zip.to_string(),
            destination_zip: destination_zip.to_string(),
            origin: [origin.latitude.to_bits(), origin.longitude.to_bits()],
            destination: [destination.latitude.to_bits(), destination.longitude.to_bits()],
        }
    }
}

/// One leg to resolve
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub origin_zip: String,
    pub origin: Coordinate,
    pub destination_zip: String,
    pub destination: Coordinate,
}

impl RouteRequest {
    fn key(&self) -> RouteKey {
        RouteKey::new(&self.origin_zip, self.origin, &self.destination_zip, self.destination)
    }
}

/// Cache-backed driving distance resolver
#[derive(Clone)]
pub struct Router {
    provider: Arc<dyn DirectionsProvider>,
    cache: TtlCache<RouteKey, DistanceResult>,
    timeout: Duration,
}

impl Router {
    pub fn new(
        provider: Arc<dyn DirectionsProvider>,
        cache: TtlCache<RouteKey, DistanceResult>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            timeout,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolve driving distance and duration for one leg
    pub async fn route(&self, request: &RouteRequest) -> Result<Option<DistanceResult>, ProviderError> {
        let key = request.key();

        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Some(hit));
        }

        let routed = with_timeout(
            self.timeout,
            self.provider.directions(request.origin, request.destination),
        )
        .await?;

        if let Some(result) = routed {
            self.cache.insert(key, result).await;
        } else {
            tracing::debug!(
                "No route from {} to {}",
                request.origin_zip,
                request.destination_zip
            );
        }

        Ok(routed)
    }
}
