use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::i18n::Locale;
use crate::models::{Coordinate, TravelMode};
use crate::routing::DEFAULT_OSRM_BASE_URL;
use crate::store::DEFAULT_STORAGE_KEY;

/// Settings for the map screen. Every field has a working default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub storage_key: String,
    /// Camera center when the device location is unknown.
    pub default_center: Coordinate,
    /// North-south and east-west extent of the initial camera, in meters.
    pub initial_span_m: f64,
    pub long_press_ms: u64,
    pub routing_base_url: String,
    pub travel_mode: TravelMode,
    /// Extra room around a route when the camera is fitted to it.
    pub route_padding: f64,
    pub locale: Locale,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_center: Coordinate::new(0.0, 0.0),
            initial_span_m: 1000.0,
            long_press_ms: 2000,
            routing_base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            travel_mode: TravelMode::Automobile,
            route_padding: 0.2,
            locale: Locale::English,
        }
    }
}

impl MapConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}
