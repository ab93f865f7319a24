use crate::models::{Coordinate, DistanceResult};
use crate::services::{http_client, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const MILES_PER_METER: f64 = 0.000621371;

/// Resolves a driving route between two coordinates
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// `Ok(None)` when no drivable route exists
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<DistanceResult>, ProviderError>;
}

/// Mapbox Directions API, driving profile
pub struct MapboxDirections {
    base_url: String,
    access_token: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    /// meters
    distance: f64,
    /// seconds
    duration: f64,
}

impl MapboxDirections {
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
impl DirectionsProvider for MapboxDirections {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<DistanceResult>, ProviderError> {
        // Mapbox wants lon,lat pairs
        let url = format!(
            "{}/directions/v5/mapbox/driving/{},{};{},{}",
            self.base_url.trim_end_matches('/'),
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("overview", "simplified"),
                ("geometries", "geojson"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Mapbox directions failed: {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response.json().await?;

        Ok(body.routes.first().map(|route| DistanceResult {
            distance_miles: route.distance * MILES_PER_METER,
            duration_minutes: route.duration / 60.0,
        }))
    }
}
