use crate::models::Coordinate;
use crate::services::{http_client, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Resolves free text (a postal code) to a coordinate
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// `Ok(None)` when the provider has no match
    async fn geocode(&self, text: &str) -> Result<Option<Coordinate>, ProviderError>;
}

/// OpenStreetMap Nominatim geocoder, restricted to the USA
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, user_agent: String, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url,
            user_agent,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl GeocodingProvider for NominatimGeocoder {
    async fn geocode(&self, text: &str) -> Result<Option<Coordinate>, ProviderError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        tracing::debug!("Geocoding {} via Nominatim", text);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("postalcode", text), ("country", "USA"), ("format", "json")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Nominatim geocoding failed: {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await?;

        let Some(place) = places.first() else {
            return Ok(None);
        };

        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|e| ProviderError::InvalidResponse(format!("Bad latitude {}: {}", place.lat, e)))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|e| ProviderError::InvalidResponse(format!("Bad longitude {}: {}", place.lon, e)))?;

        Ok(Some(Coordinate::new(latitude, longitude)))
    }
}

/// Mapbox forward geocoder, restricted to the US
pub struct MapboxGeocoder {
    base_url: String,
    access_token: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodeResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    /// `[lon, lat]`
    center: [f64; 2],
}

impl MapboxGeocoder {
    pub fn new(base_url: String, access_token: String, timeout: Duration) -> Result<Self, ProviderError> {
        if access_token.is_empty() {
            return Err(ProviderError::MissingCredentials("Mapbox access token".into()));
        }

        Ok(Self {
            base_url,
            access_token,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl GeocodingProvider for MapboxGeocoder {
    async fn geocode(&self, text: &str) -> Result<Option<Coordinate>, ProviderError> {
        let url = format!(
            "{}/geocoding/v5/mapbox.places/{}.json",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(text)
        );

        tracing::debug!("Geocoding {} via Mapbox", text);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("country", "US"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Mapbox geocoding failed: {}",
                response.status()
            )));
        }

        let body: MapboxGeocodeResponse = response.json().await?;

        Ok(body
            .features
            .first()
            .map(|feature| Coordinate::new(feature.center[1], feature.center[0])))
    }
}
