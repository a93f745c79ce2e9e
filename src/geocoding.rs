use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::Point;

const MAPBOX_PLACES_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// GeocodeError
///
/// Geocoding failures are always surfaced to the caller; there is no default location.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("no match for location {0:?}")]
    NoMatch(String),
    #[error("geocoding request failed: {0}")]
    Request(String),
}

/// Geocoder
///
/// Translates a free-text location into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, query: &str) -> Result<Point, GeocodeError>;
}

pub type GeocoderState = Arc<dyn Geocoder>;

// Minimal slice of the Mapbox forward-geocoding response.
#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: (f64, f64),
}

/// MapboxGeocoder
///
/// Calls the Mapbox Places API and takes the best (first) match.
#[derive(Clone)]
pub struct MapboxGeocoder {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl MapboxGeocoder {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, MAPBOX_PLACES_URL)
    }

    /// Points the client at a different endpoint (self-hosted proxy, test server).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    fn request_url(&self, query: &str) -> Result<reqwest::Url, GeocodeError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Request(format!("cannot-be-a-base url {}", self.base_url)))?
            .push(&format!("{}.json", query));
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward(&self, query: &str) -> Result<Point, GeocodeError> {
        let url = self.request_url(query)?;

        let response = self
            .http
            .get(url)
            .query(&[("access_token", self.token.as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Request(format!(
                "provider answered {}",
                response.status()
            )));
        }

        let collection = response
            .json::<FeatureCollection>()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let (longitude, latitude) = collection
            .features
            .into_iter()
            .next()
            .map(|feature| feature.geometry.coordinates)
            .ok_or_else(|| GeocodeError::NoMatch(query.to_string()))?;

        Ok(Point {
            longitude,
            latitude,
        })
    }
}

/// MockGeocoder
///
/// Deterministic geocoder for tests and token-less local runs. Every query resolves to
/// `point`, except the ones listed in `unknown`, which report `NoMatch`.
#[derive(Clone, Debug)]
pub struct MockGeocoder {
    pub point: Point,
    pub unknown: Vec<String>,
}

impl Default for MockGeocoder {
    fn default() -> Self {
        // Denver, CO.
        Self {
            point: Point {
                longitude: -104.9903,
                latitude: 39.7392,
            },
            unknown: Vec::new(),
        }
    }
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(query: &str) -> Self {
        Self {
            unknown: vec![query.to_string()],
            ..Self::default()
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn forward(&self, query: &str) -> Result<Point, GeocodeError> {
        if self.unknown.iter().any(|q| q == query) {
            return Err(GeocodeError::NoMatch(query.to_string()));
        }
        Ok(self.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_encodes_query_as_single_segment() {
        let geocoder = MapboxGeocoder::with_base_url("tok", "https://geo.example.com/places");
        let url = geocoder.request_url("Moab, UT/Arches").unwrap();
        assert_eq!(
            url.as_str(),
            "https://geo.example.com/places/Moab,%20UT%2FArches.json"
        );
    }

    #[test]
    fn feature_collection_takes_longitude_first() {
        let body = r#"{"features":[{"geometry":{"type":"Point","coordinates":[-105.27,40.01]}}]}"#;
        let parsed: FeatureCollection = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.features[0].geometry.coordinates, (-105.27, 40.01));
    }

    #[tokio::test]
    async fn mock_geocoder_rejects_listed_queries() {
        let geocoder = MockGeocoder::rejecting("Atlantis");
        assert!(matches!(
            geocoder.forward("Atlantis").await,
            Err(GeocodeError::NoMatch(_))
        ));
        assert!(geocoder.forward("Denver, CO").await.is_ok());
    }
}
