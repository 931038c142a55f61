use pinmap_shared::geo::{self, Viewport};
use pinmap_shared::models::{Annotation, Coordinate};

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Bounding client rect of the element with the given id.
pub fn element_rect(element_id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(element_id)?;
    Some(element.get_bounding_client_rect())
}

/// Container-relative position of a client point inside `container_id`.
pub fn client_to_element(client_x: f64, client_y: f64, container_id: &str) -> Option<(f64, f64)> {
    let rect = element_rect(container_id)?;
    Some(client_to_container(client_x, client_y, rect.left(), rect.top()))
}

/// Index of the annotation drawn closest to `point` (container pixels),
/// if any lies within `threshold` pixels.
pub fn find_nearest_annotation(
    viewport: &Viewport,
    annotations: &[Annotation],
    point: (f64, f64),
    threshold: f64,
) -> Option<usize> {
    let mut best_idx = None;
    let mut best_dist = threshold;
    for (i, a) in annotations.iter().enumerate() {
        let (x, y) = viewport.coordinate_to_screen(a.coordinate);
        // Markers are drawn as pins whose head sits above the coordinate
        let dist = point_distance((x, y - MARKER_HEAD_OFFSET), point)
            .min(point_distance((x, y), point));
        if dist < best_dist {
            best_dist = dist;
            best_idx = Some(i);
        }
    }
    best_idx
}

/// Vertical distance from a pin's tip to the center of its head.
pub const MARKER_HEAD_OFFSET: f64 = 22.0;

/// Distance between two screen points.
pub fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Pick a round scale-bar length no wider than `max_px` at the viewport
/// center. Returns the bar width in pixels and its label.
pub fn scale_bar(viewport: &Viewport, max_px: f64) -> (f64, String) {
    let mpp = geo::meters_per_pixel(viewport.center.latitude, viewport.zoom);
    if !(mpp > 0.0 && mpp.is_finite()) {
        return (0.0, String::new());
    }
    let max_m = mpp * max_px;
    let magnitude = 10f64.powf(max_m.log10().floor());
    let nice = [5.0, 2.0, 1.0]
        .into_iter()
        .map(|f| f * magnitude)
        .find(|m| *m <= max_m)
        .unwrap_or(magnitude);
    let label = if nice >= 1000.0 {
        format!("{} km", nice / 1000.0)
    } else {
        format!("{} m", nice)
    };
    (nice / mpp, label)
}

/// Format a coordinate for display, e.g. "42.00000° N, 18.00000° E".
pub fn format_coordinate(c: Coordinate) -> String {
    let ns = if c.latitude >= 0.0 { 'N' } else { 'S' };
    let ew = if c.longitude >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.5}° {}, {:.5}° {}",
        c.latitude.abs(),
        ns,
        c.longitude.abs(),
        ew
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(Coordinate::new(42.0, 18.0), 14.0, 800.0, 600.0)
    }

    fn annotation(c: Coordinate, title: &str) -> Annotation {
        Annotation {
            coordinate: c,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_client_to_container_offset() {
        let (x, y) = client_to_container(450.0, 350.0, 320.0, 50.0);
        assert!((x - 130.0).abs() < 1e-9);
        assert!((y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_nearest_annotation_hits_marker_head() {
        let vp = viewport();
        let annotations = vec![annotation(Coordinate::new(42.0, 18.0), "center")];
        // Tip is at the viewport center (400, 300); head is above it
        assert_eq!(
            find_nearest_annotation(&vp, &annotations, (400.0, 300.0 - MARKER_HEAD_OFFSET), 20.0),
            Some(0)
        );
        assert_eq!(
            find_nearest_annotation(&vp, &annotations, (400.0, 300.0), 20.0),
            Some(0)
        );
        assert_eq!(
            find_nearest_annotation(&vp, &annotations, (500.0, 300.0), 20.0),
            None
        );
    }

    #[test]
    fn test_find_nearest_annotation_picks_closest() {
        let vp = viewport();
        let a = vp.screen_to_coordinate(400.0, 300.0);
        let b = vp.screen_to_coordinate(410.0, 300.0);
        let annotations = vec![annotation(a, "a"), annotation(b, "b")];
        assert_eq!(
            find_nearest_annotation(&vp, &annotations, (409.0, 300.0), 30.0),
            Some(1)
        );
        assert_eq!(
            find_nearest_annotation(&vp, &annotations, (401.0, 300.0), 30.0),
            Some(0)
        );
    }

    #[test]
    fn test_find_nearest_annotation_empty() {
        assert_eq!(find_nearest_annotation(&viewport(), &[], (0.0, 0.0), 30.0), None);
    }

    #[test]
    fn test_scale_bar_fits_and_is_round() {
        let vp = viewport();
        let (px, label) = scale_bar(&vp, 120.0);
        assert!(px > 0.0 && px <= 120.0);
        let digits: String = label.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
        let first = digits.trim_start_matches('0').chars().next().unwrap();
        assert!(matches!(first, '1' | '2' | '5'), "label {label}");
    }

    #[test]
    fn test_scale_bar_uses_km_when_zoomed_out() {
        let vp = Viewport::new(Coordinate::new(0.0, 0.0), 5.0, 800.0, 600.0);
        let (_, label) = scale_bar(&vp, 120.0);
        assert!(label.ends_with(" km"), "label {label}");
    }

    #[test]
    fn test_scale_bar_at_pole_is_finite() {
        let vp = Viewport::new(Coordinate::new(90.0, 0.0), 12.0, 800.0, 600.0);
        let (px, label) = scale_bar(&vp, 120.0);
        assert!(px.is_finite() && px > 0.0 && px <= 120.0, "width {px}");
        assert!(!label.is_empty());
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(
            format_coordinate(Coordinate::new(-33.8688, 151.2093)),
            "33.86880° S, 151.20930° E"
        );
    }
}
