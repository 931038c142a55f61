//! Routing contract and the OSRM wire codec.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::geo;
use crate::models::{Coordinate, Route, TravelMode};

pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub source: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Transport(String),

    #[error("routing service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("unreadable routing response: {0}")]
    Decode(String),

    #[error("no route found")]
    NoRoutes,

    #[error("current location is unknown")]
    NoCurrentLocation,
}

/// Anything that can turn a request into best-first candidate routes.
///
/// The returned future resolves exactly once; the caller applies the result
/// on its own execution context.
pub trait RoutingService {
    fn route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Vec<Route>, RoutingError>>;
}

/// `GET` URL for the OSRM route endpoint. OSRM wants `lng,lat` pairs.
pub fn osrm_route_url(base_url: &str, request: &RouteRequest) -> String {
    format!(
        "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson&alternatives=true",
        base_url.trim_end_matches('/'),
        request.mode.osrm_profile(),
        request.source.longitude,
        request.source.latitude,
        request.destination.longitude,
        request.destination.latitude,
    )
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Decode an OSRM route response body, best route first.
///
/// `NoRoute` is a valid answer and yields an empty list; routes without any
/// geometry are dropped.
pub fn parse_osrm_response(body: &str) -> Result<Vec<Route>, RoutingError> {
    let resp: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::Decode(e.to_string()))?;

    match resp.code.as_str() {
        "Ok" => {}
        "NoRoute" => return Ok(Vec::new()),
        _ => {
            return Err(RoutingError::Service {
                code: resp.code,
                message: resp.message.unwrap_or_default(),
            })
        }
    }

    let routes = resp
        .routes
        .into_iter()
        .filter_map(|r| {
            let path: Vec<Coordinate> = r
                .geometry
                .coordinates
                .iter()
                .map(|[lng, lat]| Coordinate::new(*lat, *lng))
                .collect();
            let bounds = geo::bounding_region(&path)?;
            Some(Route {
                path,
                bounds,
                distance_m: r.distance,
                duration_s: r.duration,
            })
        })
        .collect();
    Ok(routes)
}
