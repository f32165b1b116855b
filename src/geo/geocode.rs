//! Mapping-service requests: widget load and reverse geocoding.

use crate::domain::error::ModeratorError;
use crate::domain::{GeoPoint, PostId};
use crate::gateway::messages::CONTEXT_KIND;
use crate::gateway::{HttpMethod, HttpReply, HttpRequest};
use crate::Secret;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Value of [`CONTEXT_KIND`] for mapping-service requests.
pub const KIND_MAP: &str = "map";

/// Handle generation; a result is applied only to the generation that asked.
pub type Generation = u64;

/// A request for the mapping service.
#[derive(Debug, Clone, PartialEq)]
pub enum MapRequest {
    /// One-time load of the mapping widget.
    LoadWidget,

    /// Reverse geocode on behalf of one map handle.
    ReverseGeocode {
        post_id: PostId,
        generation: Generation,
        point: GeoPoint,
    },
}

/// Outcome of a [`MapRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapResponse {
    WidgetLoaded,
    WidgetFailed {
        message: String,
    },
    Geocoded {
        post_id: PostId,
        generation: Generation,
        address: String,
    },
    GeocodeFailed {
        post_id: PostId,
        generation: Generation,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct GeocodeReply {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

/// Builds mapping-service requests and decodes their replies.
#[derive(Debug, Clone)]
pub struct MapsClient {
    widget_url: String,
    geocode_url: String,
    api_key: Secret,
}

impl MapsClient {
    #[must_use]
    pub fn new(widget_url: impl Into<String>, geocode_url: impl Into<String>, api_key: Secret) -> Self {
        Self {
            widget_url: widget_url.into(),
            geocode_url: geocode_url.into(),
            api_key,
        }
    }

    /// Builds the web request for `request`, tagged so its reply can be routed back.
    #[must_use]
    pub fn prepare(&self, request: &MapRequest) -> HttpRequest {
        let key = urlencoding::encode(self.api_key.expose());
        let mut context = BTreeMap::new();
        context.insert(CONTEXT_KIND.to_string(), KIND_MAP.to_string());

        let url = match request {
            MapRequest::LoadWidget => {
                context.insert("map_op".to_string(), "widget".to_string());
                format!("{}?key={key}", self.widget_url)
            }
            MapRequest::ReverseGeocode {
                post_id,
                generation,
                point,
            } => {
                context.insert("map_op".to_string(), "geocode".to_string());
                context.insert("post_id".to_string(), post_id.clone());
                context.insert("generation".to_string(), generation.to_string());
                format!(
                    "{}?latlng={},{}&key={key}",
                    self.geocode_url, point.latitude, point.longitude
                )
            }
        };

        let mut http = HttpRequest::new(HttpMethod::Get, url);
        http.context = context;
        http
    }

    /// Decodes a reply; `None` when `context` does not belong to a map request.
    #[must_use]
    pub fn interpret(context: &BTreeMap<String, String>, reply: &HttpReply) -> Option<MapResponse> {
        if context.get(CONTEXT_KIND).map(String::as_str) != Some(KIND_MAP) {
            return None;
        }

        match context.get("map_op").map(String::as_str)? {
            "widget" if reply.is_success() => Some(MapResponse::WidgetLoaded),
            "widget" => Some(MapResponse::WidgetFailed {
                message: format!("HTTP {}", reply.status),
            }),
            "geocode" => {
                let post_id = context.get("post_id")?.clone();
                let generation = context.get("generation")?.parse().ok()?;
                Some(match parse_geocode(reply) {
                    Ok(address) => MapResponse::Geocoded {
                        post_id,
                        generation,
                        address,
                    },
                    Err(e) => MapResponse::GeocodeFailed {
                        post_id,
                        generation,
                        message: e.to_string(),
                    },
                })
            }
            _ => None,
        }
    }
}

/// Extracts the first formatted address from a reverse-geocode reply.
///
/// # Errors
///
/// Returns [`ModeratorError::Geocode`] for a non-2xx status, an undecodable
/// body, a status other than `OK`, or an empty result list.
pub fn parse_geocode(reply: &HttpReply) -> Result<String, ModeratorError> {
    if !reply.is_success() {
        return Err(ModeratorError::Geocode(format!("HTTP {}", reply.status)));
    }
    let decoded: GeocodeReply = serde_json::from_slice(&reply.body)
        .map_err(|e| ModeratorError::Geocode(format!("invalid reply: {e}")))?;

    if decoded.status != "OK" {
        let detail = decoded.error_message.unwrap_or_default();
        return Err(ModeratorError::Geocode(
            format!("{} {detail}", decoded.status).trim_end().to_string(),
        ));
    }
    decoded
        .results
        .into_iter()
        .next()
        .map(|r| r.formatted_address)
        .ok_or_else(|| ModeratorError::Geocode("no results".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MapsClient {
        MapsClient::new(
            "https://maps.example/js",
            "https://maps.example/geocode/json",
            Secret::new("k3y"),
        )
    }

    fn reply(status: u16, body: &str) -> HttpReply {
        HttpReply { status, body: body.as_bytes().to_vec() }
    }

    #[test]
    fn geocode_request_carries_coordinates_and_handle() {
        let point = GeoPoint::new(14.5, 121.25).unwrap();
        let http = client().prepare(&MapRequest::ReverseGeocode {
            post_id: "p1".into(),
            generation: 3,
            point,
        });
        assert_eq!(http.url, "https://maps.example/geocode/json?latlng=14.5,121.25&key=k3y");
        assert_eq!(http.context.get("generation").map(String::as_str), Some("3"));
    }

    #[test]
    fn geocode_reply_round_trips_through_context() {
        let point = GeoPoint::new(1.0, 2.0).unwrap();
        let http = client().prepare(&MapRequest::ReverseGeocode {
            post_id: "p1".into(),
            generation: 3,
            point,
        });
        let ok = reply(200, r#"{"status":"OK","results":[{"formatted_address":"Rizal Ave, Manila"}]}"#);
        assert_eq!(
            MapsClient::interpret(&http.context, &ok),
            Some(MapResponse::Geocoded {
                post_id: "p1".into(),
                generation: 3,
                address: "Rizal Ave, Manila".into(),
            })
        );
    }

    #[test]
    fn zero_results_is_a_failure() {
        let err = parse_geocode(&reply(200, r#"{"status":"ZERO_RESULTS","results":[]}"#)).unwrap_err();
        assert!(err.to_string().contains("ZERO_RESULTS"));
        assert!(parse_geocode(&reply(200, r#"{"status":"OK","results":[]}"#)).is_err());
        assert!(parse_geocode(&reply(500, "")).is_err());
    }

    #[test]
    fn widget_reply_status_decides_outcome() {
        let http = client().prepare(&MapRequest::LoadWidget);
        assert_eq!(http.url, "https://maps.example/js?key=k3y");
        assert_eq!(MapsClient::interpret(&http.context, &reply(200, "")), Some(MapResponse::WidgetLoaded));
        assert!(matches!(
            MapsClient::interpret(&http.context, &reply(403, "")),
            Some(MapResponse::WidgetFailed { .. })
        ));
    }

    #[test]
    fn gateway_context_is_not_a_map_reply() {
        let mut context = BTreeMap::new();
        context.insert(CONTEXT_KIND.to_string(), "gateway".to_string());
        assert!(MapsClient::interpret(&context, &reply(200, "")).is_none());
    }
}
