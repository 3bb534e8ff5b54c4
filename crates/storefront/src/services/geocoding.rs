//! Address geocoding.
//!
//! Orders carry the latitude and longitude of the pickup address so drivers
//! can be routed. [`GoogleGeocoder`] resolves addresses through the Google
//! Geocoding API; anything implementing [`Geocoder`] can stand in for it.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

/// Google Geocoding API endpoint.
const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Errors from a geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// HTTP request failed. The request URL, which carries the API key, is
    /// stripped before the error is stored.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Provider answered with a non-OK status.
    #[error("Geocoding failed: {status}")]
    Status { status: String },

    /// Provider answered OK but without results.
    #[error("No results for address")]
    NoResults,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

/// Resolves a free-text address to coordinates.
pub trait Geocoder {
    /// Geocode `address`.
    fn geocode(&self, address: &str)
    -> impl Future<Output = Result<Coordinates, GeocodingError>> + Send;
}

/// Google Geocoding API client.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl std::fmt::Debug for GoogleGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleGeocoder")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GoogleGeocoder {
    /// Create a new geocoding client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api_key: SecretString) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder().build().map_err(redacted)?;
        Ok(Self {
            client,
            api_key,
            endpoint: GOOGLE_GEOCODE_URL.to_owned(),
        })
    }

    /// Point the client at a different Geocoding API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodingError> {
        let url = url::Url::parse_with_params(
            &self.endpoint,
            &[("address", address), ("key", self.api_key.expose_secret())],
        )
        .map_err(|e| GeocodingError::Parse(e.to_string()))?;

        let response = self.client.get(url).send().await.map_err(redacted)?;

        let body = response
            .error_for_status()
            .map_err(redacted)?
            .text()
            .await
            .map_err(redacted)?;
        parse_response(&body)
    }
}

fn redacted(error: reqwest::Error) -> GeocodingError {
    GeocodingError::Http(error.without_url())
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: Coordinates,
}

/// Extract the first result's location from a Geocoding API response body.
fn parse_response(body: &str) -> Result<Coordinates, GeocodingError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodingError::Parse(e.to_string()))?;

    match response.status.as_str() {
        "OK" => response
            .results
            .into_iter()
            .next()
            .map(|result| result.geometry.location)
            .ok_or(GeocodingError::NoResults),
        "ZERO_RESULTS" => Err(GeocodingError::NoResults),
        _ => Err(GeocodingError::Status {
            status: response.status,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_result() {
        let body = r#"{
            "status": "OK",
            "results": [
                { "geometry": { "location": { "lat": 52.3676, "lng": 4.9041 } } },
                { "geometry": { "location": { "lat": 0.0, "lng": 0.0 } } }
            ]
        }"#;
        let coordinates = parse_response(body).unwrap();
        assert!((coordinates.latitude - 52.3676).abs() < f64::EPSILON);
        assert!((coordinates.longitude - 4.9041).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_zero_results() {
        let body = r#"{ "status": "ZERO_RESULTS", "results": [] }"#;
        assert!(matches!(parse_response(body), Err(GeocodingError::NoResults)));
    }

    #[test]
    fn test_parse_denied() {
        let body = r#"{ "status": "REQUEST_DENIED", "error_message": "bad key" }"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, GeocodingError::Status { ref status } if status == "REQUEST_DENIED"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_response("<html>"),
            Err(GeocodingError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_http_error_omits_key() {
        let geocoder = GoogleGeocoder::new(SecretString::from("AIzaSyD-very-secret"))
            .unwrap()
            .with_endpoint("http://127.0.0.1:1/geocode");

        let err = geocoder.geocode("Damrak 1, Amsterdam").await.unwrap_err();
        assert!(matches!(err, GeocodingError::Http(_)));
        assert!(!err.to_string().contains("very-secret"));
        assert!(!format!("{err:?}").contains("very-secret"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let geocoder = GoogleGeocoder::new(SecretString::from("AIzaSyD-very-secret")).unwrap();
        assert!(!format!("{geocoder:?}").contains("very-secret"));
    }
}
