use crate::models::Coordinate;
use crate::services::{with_timeout, CacheStats, GeocodingProvider, ProviderError, TtlCache};
use std::sync::Arc;
use std::time::Duration;

/// Cache-backed postal code resolver
///
/// Only successful matches are cached; "no match" and provider failures
/// fall through to the provider again on the next request.
#[derive(Clone)]
pub struct Geocoder {
    provider: Arc<dyn GeocodingProvider>,
    cache: TtlCache<String, Coordinate>,
    timeout: Duration,
}

impl Geocoder {
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        cache: TtlCache<String, Coordinate>,
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

    /// Resolve a postal code to a coordinate
    pub async fn resolve(&self, postal_code: &str) -> Result<Option<Coordinate>, ProviderError> {
        let key = postal_code.trim().to_string();

        if let Some(coord) = self.cache.get(&key).await {
            tracing::trace!("Geocode cache hit: {}", key);
            return Ok(Some(coord));
        }

        let resolved = with_timeout(self.timeout, self.provider.geocode(&key)).await?;

        match resolved {
            Some(coord) => {
                self.cache.insert(key, coord).await;
                Ok(Some(coord))
            }
            None => {
                tracing::debug!("No geocoding match for {}", key);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        result: Option<Coordinate>,
        delay: Duration,
    }

    #[async_trait]
    impl GeocodingProvider for CountingProvider {
        async fn geocode(&self, _text: &str) -> Result<Option<Coordinate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.result)
        }
    }

    fn geocoder(provider: Arc<CountingProvider>, timeout: Duration) -> Geocoder {
        Geocoder::new(provider, TtlCache::new(Duration::from_secs(60)), timeout)
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            result: Some(Coordinate::new(40.75, -73.99)),
            delay: Duration::ZERO,
        });
        let geocoder = geocoder(provider.clone(), Duration::from_secs(1));

        let first = geocoder.resolve("10001").await.unwrap();
        let second = geocoder.resolve(" 10001 ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            result: None,
            delay: Duration::ZERO,
        });
        let geocoder = geocoder(provider.clone(), Duration::from_secs(1));

        assert!(geocoder.resolve("not-a-zip").await.unwrap().is_none());
        assert!(geocoder.resolve("not-a-zip").await.unwrap().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            result: Some(Coordinate::new(0.0, 0.0)),
            delay: Duration::from_millis(500),
        });
        let geocoder = geocoder(provider, Duration::from_millis(20));

        assert!(matches!(
            geocoder.resolve("10001").await,
            Err(ProviderError::Timeout(_))
        ));
    }
}
