//! Geographic helpers and Web Mercator math for the slippy-map surface.
//!
//! World pixel coordinates follow the usual tile convention: at zoom `z` the
//! whole world is a square of `TILE_SIZE * 2^z` pixels, origin at the
//! north-west corner, X east, Y south.

use std::f64::consts::PI;

use crate::models::{Coordinate, Region};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// WGS84 equatorial radius, the sphere Web Mercator tiles are drawn on.
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * PI / 180.0;

pub const TILE_SIZE: f64 = 256.0;

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Latitude at which the Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

pub fn meters_to_latitude_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Degrees of longitude covering `meters` at the given latitude.
pub fn meters_to_longitude_degrees(meters: f64, latitude: f64) -> f64 {
    let cos = latitude.to_radians().cos();
    if cos < 1e-6 {
        return 360.0;
    }
    (meters / (METERS_PER_DEGREE * cos)).min(360.0)
}

/// Ground resolution of one screen pixel.
pub fn meters_per_pixel(latitude: f64, zoom: f64) -> f64 {
    let latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    2.0 * PI * WEB_MERCATOR_RADIUS_M * latitude.to_radians().cos() / world_size(zoom)
}

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Coordinate to world pixels at `zoom`.
pub fn project(coordinate: Coordinate, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = coordinate.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (coordinate.longitude + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// World pixels at `zoom` back to a coordinate. Longitude is wrapped into
/// [-180, 180); latitude is clamped to the Mercator square.
pub fn unproject(x: f64, y: f64, zoom: f64) -> Coordinate {
    let size = world_size(zoom);
    let longitude = wrap_longitude(x / size * 360.0 - 180.0);
    let n = PI - 2.0 * PI * y / size;
    let latitude = n.sinh().atan().to_degrees().clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Coordinate::new(latitude, longitude)
}

pub fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Smallest region enclosing every coordinate of `path`.
pub fn bounding_region(path: &[Coordinate]) -> Option<Region> {
    let first = path.first()?;
    let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
    let (mut min_lng, mut max_lng) = (first.longitude, first.longitude);
    for c in &path[1..] {
        min_lat = min_lat.min(c.latitude);
        max_lat = max_lat.max(c.latitude);
        min_lng = min_lng.min(c.longitude);
        max_lng = max_lng.max(c.longitude);
    }
    Some(Region {
        center: Coordinate::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0),
        latitude_delta: max_lat - min_lat,
        longitude_delta: max_lng - min_lng,
    })
}

/// Grow a region by `factor` (0.2 = 20% wider and taller).
pub fn pad_region(region: Region, factor: f64) -> Region {
    Region {
        center: region.center,
        latitude_delta: (region.latitude_delta * (1.0 + factor)).min(180.0),
        longitude_delta: (region.longitude_delta * (1.0 + factor)).min(360.0),
    }
}

/// A visible map tile and where its top-left corner lands on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub screen_x: f64,
    pub screen_y: f64,
    pub size: f64,
}

/// What the map surface is currently showing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, width: f64, height: f64) -> Self {
        Viewport {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Viewport of the given size showing `region` in full.
    pub fn fitting(region: Region, width: f64, height: f64) -> Self {
        Viewport::new(region.center, zoom_for_region(region, width, height), width, height)
    }

    pub fn screen_to_coordinate(&self, screen_x: f64, screen_y: f64) -> Coordinate {
        let (cx, cy) = project(self.center, self.zoom);
        unproject(
            cx + screen_x - self.width / 2.0,
            cy + screen_y - self.height / 2.0,
            self.zoom,
        )
    }

    pub fn coordinate_to_screen(&self, coordinate: Coordinate) -> (f64, f64) {
        let (cx, cy) = project(self.center, self.zoom);
        let (x, y) = project(coordinate, self.zoom);
        let size = world_size(self.zoom);
        // Pick the world copy nearest to the center so markers survive the antimeridian.
        let mut dx = x - cx;
        if dx > size / 2.0 {
            dx -= size;
        } else if dx < -size / 2.0 {
            dx += size;
        }
        (dx + self.width / 2.0, y - cy + self.height / 2.0)
    }

    /// Move the content by a screen delta (drag direction).
    pub fn panned(&self, dx: f64, dy: f64) -> Viewport {
        let (cx, cy) = project(self.center, self.zoom);
        Viewport {
            center: unproject(cx - dx, cy - dy, self.zoom),
            ..*self
        }
    }

    /// Change zoom keeping the coordinate under the cursor fixed on screen.
    pub fn zoomed_at(&self, screen_x: f64, screen_y: f64, new_zoom: f64) -> Viewport {
        let new_zoom = new_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor = self.screen_to_coordinate(screen_x, screen_y);
        let (ax, ay) = project(anchor, new_zoom);
        let center = unproject(
            ax - (screen_x - self.width / 2.0),
            ay - (screen_y - self.height / 2.0),
            new_zoom,
        );
        Viewport {
            center,
            zoom: new_zoom,
            ..*self
        }
    }

    pub fn resized(&self, width: f64, height: f64) -> Viewport {
        Viewport {
            width,
            height,
            ..*self
        }
    }

    /// Region currently on screen.
    pub fn region(&self) -> Region {
        let nw = self.screen_to_coordinate(0.0, 0.0);
        let se = self.screen_to_coordinate(self.width, self.height);
        let lng_delta = if self.width >= world_size(self.zoom) {
            360.0
        } else {
            (se.longitude - nw.longitude).rem_euclid(360.0)
        };
        Region {
            center: self.center,
            latitude_delta: nw.latitude - se.latitude,
            longitude_delta: lng_delta,
        }
    }

    /// Tiles covering the viewport, rendered from the integer zoom level
    /// below the current fractional zoom.
    pub fn tiles(&self) -> Vec<TilePlacement> {
        let z = self.zoom.floor();
        let scale = 2f64.powf(self.zoom - z);
        let n = 2f64.powf(z);
        let (cx, cy) = project(self.center, z);
        let left = cx - self.width / 2.0 / scale;
        let top = cy - self.height / 2.0 / scale;
        let right = left + self.width / scale;
        let bottom = top + self.height / scale;

        let x0 = (left / TILE_SIZE).floor() as i64;
        let x1 = (right / TILE_SIZE).floor() as i64;
        let y0 = ((top / TILE_SIZE).floor() as i64).max(0);
        let y1 = ((bottom / TILE_SIZE).floor() as i64).min(n as i64 - 1);

        let mut tiles = Vec::new();
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                tiles.push(TilePlacement {
                    x: tx.rem_euclid(n as i64) as u32,
                    y: ty as u32,
                    z: z as u32,
                    screen_x: (tx as f64 * TILE_SIZE - left) * scale,
                    screen_y: (ty as f64 * TILE_SIZE - top) * scale,
                    size: TILE_SIZE * scale,
                });
            }
        }
        tiles
    }
}

/// Largest zoom at which `region` fits inside a `width` x `height` surface.
pub fn zoom_for_region(region: Region, width: f64, height: f64) -> f64 {
    if width <= 0.0 || height <= 0.0 {
        return MIN_ZOOM;
    }
    let half_lat = region.latitude_delta / 2.0;
    let half_lng = region.longitude_delta / 2.0;
    let nw = Coordinate::new(region.center.latitude + half_lat, region.center.longitude - half_lng);
    let se = Coordinate::new(region.center.latitude - half_lat, region.center.longitude + half_lng);
    let (x0, y0) = project(nw, 0.0);
    let (x1, y1) = project(se, 0.0);
    let span_x = (x1 - x0).abs();
    let span_y = (y1 - y0).abs();
    if span_x < 1e-12 && span_y < 1e-12 {
        return MAX_ZOOM;
    }
    let zoom_x = if span_x < 1e-12 { MAX_ZOOM } else { (width / span_x).log2() };
    let zoom_y = if span_y < 1e-12 { MAX_ZOOM } else { (height / span_y).log2() };
    zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM)
}
