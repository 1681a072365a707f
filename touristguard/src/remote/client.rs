//! HTTP client for the remote collector and dashboard.
//!
//! One [`ApiClient`] serves all three endpoints. It holds a reusable
//! `reqwest::Client` with connection pooling and a per-request timeout.
//!
//! | Port | Endpoint |
//! |------|----------|
//! | [`IdentityValidator`] | `GET /tourists/{id}` |
//! | [`LocationUplink`] | `PATCH /tourists/{id}/location` |
//! | [`GeofenceFetcher`] | `GET /dashboard/geofences` |

use reqwest::Url;
use serde_json::Value;

use super::config::ApiConfig;
use super::error::RemoteError;
use super::wire::{classify_status, decode_geofences, parse_profile, LocationReport, StatusClass};
use crate::activation::{IdentityValidator, TouristProfile, ValidationError};
use crate::delivery::{DeliveryError, LocationUplink};
use crate::geofence::{FetchError, Geofence, GeofenceFetcher};
use crate::identity::IdentityToken;
use crate::location::LocationSample;

/// Client for the tourist-safety REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for `config.base_url`.
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let invalid = |reason: String| RemoteError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };

        let base_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid("expected an absolute http(s) URL".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// The API root requests are made against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn tourist_url(&self, token: &IdentityToken) -> Url {
        self.endpoint(&["tourists", token.as_str()])
    }

    fn location_url(&self, token: &IdentityToken) -> Url {
        self.endpoint(&["tourists", token.as_str(), "location"])
    }

    fn geofences_url(&self) -> Url {
        self.endpoint(&["dashboard", "geofences"])
    }
}

impl IdentityValidator for ApiClient {
    async fn validate(&self, token: &IdentityToken) -> Result<TouristProfile, ValidationError> {
        let url = self.tourist_url(token);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ValidationError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ValidationError::Unknown);
        }
        if classify_status(status) != StatusClass::Success {
            return Err(ValidationError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ValidationError::Unavailable(e.to_string()))?;

        tracing::debug!(identity = %token, status, "Identity lookup succeeded");
        Ok(parse_profile(&body))
    }
}

impl LocationUplink for ApiClient {
    async fn send_location(
        &self,
        identity: &IdentityToken,
        sample: &LocationSample,
    ) -> Result<(), DeliveryError> {
        let report = LocationReport::from(sample);
        let response = self
            .http
            .patch(self.location_url(identity))
            .json(&report)
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(e.to_string()))?;

        let status = response.status().as_u16();
        match classify_status(status) {
            StatusClass::Success => {
                tracing::debug!(
                    identity = %identity,
                    timestamp = %report.timestamp,
                    "Location update sent"
                );
                Ok(())
            }
            StatusClass::Transient => Err(DeliveryError::Transient(format!("HTTP {}", status))),
            StatusClass::Permanent => {
                let message = response.text().await.unwrap_or_default();
                Err(DeliveryError::Permanent {
                    status,
                    message: truncate(message, 200),
                })
            }
        }
    }
}

impl GeofenceFetcher for ApiClient {
    async fn fetch_geofences(&self) -> Result<Vec<Geofence>, FetchError> {
        let response = self
            .http
            .get(self.geofences_url())
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if classify_status(status) != StatusClass::Success {
            return Err(FetchError::Status(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let records: Vec<Value> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(decode_geofences(records))
    }
}

fn truncate(mut message: String, max_chars: usize) -> String {
    if let Some((index, _)) = message.char_indices().nth(max_chars) {
        message.truncate(index);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(base)).unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client("http://localhost:4000/api");
        let token = IdentityToken::parse("TID-7").unwrap();

        assert_eq!(
            client.tourist_url(&token).as_str(),
            "http://localhost:4000/api/tourists/TID-7"
        );
        assert_eq!(
            client.location_url(&token).as_str(),
            "http://localhost:4000/api/tourists/TID-7/location"
        );
        assert_eq!(
            client.geofences_url().as_str(),
            "http://localhost:4000/api/dashboard/geofences"
        );
    }

    #[test]
    fn test_trailing_slash_base() {
        let client = client("https://safety.example.org/api/");
        assert_eq!(
            client.geofences_url().as_str(),
            "https://safety.example.org/api/dashboard/geofences"
        );
    }

    #[test]
    fn test_identity_is_percent_encoded() {
        let client = client("http://localhost:4000/api");
        let token = IdentityToken::parse("a/b c").unwrap();
        assert_eq!(
            client.location_url(&token).as_str(),
            "http://localhost:4000/api/tourists/a%2Fb%20c/location"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new(&ApiConfig::new("not a url")),
            Err(RemoteError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new(&ApiConfig::new("ftp://example.org/api")),
            Err(RemoteError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello".to_string(), 3), "hel");
        assert_eq!(truncate("hi".to_string(), 3), "hi");
    }
}
