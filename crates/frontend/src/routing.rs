use pinmap_shared::models::Route;
use pinmap_shared::routing::{
    osrm_route_url, parse_osrm_response, RouteRequest, RoutingError, RoutingService,
};

/// Routing over the OSRM HTTP API.
#[derive(Clone)]
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(base_url: impl Into<String>) -> Self {
        OsrmRouter {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl RoutingService for OsrmRouter {
    async fn route(&self, request: &RouteRequest) -> Result<Vec<Route>, RoutingError> {
        let url = osrm_route_url(&self.base_url, request);
        tracing::debug!(%url, "Requesting route");

        // OSRM answers "no route" with a 400 and a JSON body, so the status
        // code is left to the body parser.
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        let body = resp
            .text()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;

        parse_osrm_response(&body)
    }
}
