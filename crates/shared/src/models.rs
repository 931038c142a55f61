use serde::{Deserialize, Serialize};

use crate::geo;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside geographic bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A user-dropped marker as it is persisted.
///
/// The field names on the wire (`lat`, `lng`, `title`) are the storage format
/// and must not change without a migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    pub title: String,
}

impl PinRecord {
    pub fn new(coordinate: Coordinate, title: impl Into<String>) -> Self {
        PinRecord {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            title: title.into(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// On-screen representation of a pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub coordinate: Coordinate,
    pub title: String,
}

impl From<&PinRecord> for Annotation {
    fn from(record: &PinRecord) -> Self {
        Annotation {
            coordinate: record.coordinate(),
            title: record.title.clone(),
        }
    }
}

impl From<&Annotation> for PinRecord {
    fn from(annotation: &Annotation) -> Self {
        PinRecord::new(annotation.coordinate, annotation.title.clone())
    }
}

/// Camera region: a center plus the angular extent shown around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    /// Region spanning `lat_meters` north-south and `lng_meters` east-west.
    pub fn from_meters(center: Coordinate, lat_meters: f64, lng_meters: f64) -> Self {
        Region {
            center,
            latitude_delta: geo::meters_to_latitude_degrees(lat_meters),
            longitude_delta: geo::meters_to_longitude_degrees(lng_meters, center.latitude),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TravelMode {
    Automobile,
}

impl TravelMode {
    /// OSRM profile segment for this mode.
    pub fn osrm_profile(&self) -> &'static str {
        match self {
            TravelMode::Automobile => "driving",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TravelMode::Automobile => write!(f, "Automobile"),
        }
    }
}

/// A candidate path returned by the routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub bounds: Region,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_record_wire_keys() {
        let record = PinRecord::new(Coordinate::new(42.0, 18.0), "Beach");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"lat": 42.0, "lng": 18.0, "title": "Beach"})
        );
    }

    #[test]
    fn test_pin_record_rejects_missing_title() {
        let parsed: Result<PinRecord, _> = serde_json::from_str(r#"{"lat": 1.0, "lng": 2.0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_annotation_record_conversion() {
        let record = PinRecord::new(Coordinate::new(10.5, -3.25), "Cafe");
        let annotation = Annotation::from(&record);
        assert_eq!(annotation.coordinate, Coordinate::new(10.5, -3.25));
        assert_eq!(PinRecord::from(&annotation), record);
    }

    #[test]
    fn test_region_from_meters_at_equator() {
        let region = Region::from_meters(Coordinate::new(0.0, 0.0), 1000.0, 1000.0);
        // ~0.009 degrees per kilometre at the equator
        assert!((region.latitude_delta - 0.008993).abs() < 1e-5);
        assert!((region.longitude_delta - 0.008993).abs() < 1e-5);
    }

    #[test]
    fn test_travel_mode_profile() {
        assert_eq!(TravelMode::Automobile.osrm_profile(), "driving");
        assert_eq!(TravelMode::Automobile.to_string(), "Automobile");
    }
}
