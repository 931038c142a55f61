use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use pinmap_shared::geo::{TilePlacement, Viewport};
use pinmap_shared::models::{Annotation, Coordinate, Route};

use crate::coords;

pub const MAP_CONTAINER_ID: &str = "pin-map-container";

/// Drag threshold in pixels. Movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Touch drag threshold, larger than the mouse one.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

/// Zoom levels per wheel notch.
const ZOOM_STEP: f64 = 0.25;

/// Maximum distance in pixels between a tap and a pin for the pin to be hit.
const TAP_THRESHOLD: f64 = 24.0;

const TILE_SERVER: &str = "https://tile.openstreetmap.org";

pub const DUSTY_TEAL: &str = "#4f8a8b";
const ROUTE_WIDTH: f64 = 5.0;
const PIN_RADIUS: f64 = 12.0;

/// A pointer that went down on the map and has not been released yet.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    id: u64,
    /// Container-relative position where the press started.
    start: (f64, f64),
    /// Viewport at press time; panning is applied relative to it.
    anchor: Viewport,
    moved: bool,
    /// The long-press timer already fired for this press.
    fired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    start_distance: f64,
    midpoint: (f64, f64),
    anchor: Viewport,
}

// ---------------------------------------------------------------------------
// Gesture math (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

fn wheel_zoom(zoom: f64, delta_y: f64) -> f64 {
    if delta_y < 0.0 {
        zoom + ZOOM_STEP
    } else {
        zoom - ZOOM_STEP
    }
}

/// Zoom after a pinch that changed finger distance from `start` to `current`.
fn pinch_zoom(start_zoom: f64, start: f64, current: f64) -> f64 {
    start_zoom + (current / start).log2()
}

fn exceeds(start: (f64, f64), current: (f64, f64), threshold: f64) -> bool {
    coords::point_distance(start, current) > threshold
}

fn tile_url(tile: &TilePlacement) -> String {
    format!("{TILE_SERVER}/{}/{}/{}.png", tile.z, tile.x, tile.y)
}

// ---------------------------------------------------------------------------
// SVG overlay
// ---------------------------------------------------------------------------

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render routes, pins, the selection ring and the user-location dot for
/// `viewport` as one SVG document.
pub fn build_overlay_svg(
    viewport: &Viewport,
    annotations: &[Annotation],
    overlays: &[Route],
    selected: Option<usize>,
    user_location: Option<Coordinate>,
) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="position:absolute;top:0;left:0;pointer-events:none;">"#,
        w = viewport.width,
        h = viewport.height
    );
    for route in overlays {
        build_route(&mut svg, viewport, route);
    }
    if let Some(location) = user_location {
        build_user_location(&mut svg, viewport, location);
    }
    for (i, annotation) in annotations.iter().enumerate() {
        build_pin(&mut svg, viewport, annotation, selected == Some(i));
    }
    svg.push_str("</svg>");
    svg
}

fn build_route(svg: &mut String, viewport: &Viewport, route: &Route) {
    if route.path.len() < 2 {
        return;
    }
    let points: Vec<String> = route
        .path
        .iter()
        .map(|c| {
            let (x, y) = viewport.coordinate_to_screen(*c);
            format!("{x:.1},{y:.1}")
        })
        .collect();
    svg.push_str(&format!(
        r#"<polyline points="{}" fill="none" stroke="{DUSTY_TEAL}" stroke-width="{ROUTE_WIDTH}" stroke-linecap="round" stroke-linejoin="round"/>"#,
        points.join(" ")
    ));
}

fn build_user_location(svg: &mut String, viewport: &Viewport, location: Coordinate) {
    let (x, y) = viewport.coordinate_to_screen(location);
    svg.push_str(&format!(
        r##"<circle class="user-location" cx="{x:.1}" cy="{y:.1}" r="14" fill="rgba(0,122,255,0.2)"/><circle cx="{x:.1}" cy="{y:.1}" r="7" fill="#007aff" stroke="white" stroke-width="2.5"/>"##
    ));
}

/// A teardrop marker whose tip sits on the coordinate.
fn build_pin(svg: &mut String, viewport: &Viewport, annotation: &Annotation, selected: bool) {
    let (x, y) = viewport.coordinate_to_screen(annotation.coordinate);
    if x < -PIN_RADIUS
        || y < 0.0
        || x > viewport.width + PIN_RADIUS
        || y > viewport.height + coords::MARKER_HEAD_OFFSET + PIN_RADIUS
    {
        return;
    }
    let head = y - coords::MARKER_HEAD_OFFSET;
    let r = PIN_RADIUS;
    let title = xml_escape(&annotation.title);
    svg.push_str(&format!(r#"<g class="pin" role="img"><title>{title}</title>"#));
    svg.push_str(&format!(
        r#"<path d="M {x:.1} {y:.1} C {l1:.1} {c1:.1} {l2:.1} {c2:.1} {l2:.1} {head:.1} A {r} {r} 0 1 1 {r2:.1} {head:.1} C {r2:.1} {c2:.1} {r1:.1} {c1:.1} {x:.1} {y:.1} Z" fill="{DUSTY_TEAL}" stroke="white" stroke-width="2"/>"#,
        l1 = x - 4.0,
        l2 = x - r,
        r1 = x + 4.0,
        r2 = x + r,
        c1 = y - 8.0,
        c2 = y - 14.0,
    ));
    svg.push_str(&format!(
        r#"<circle cx="{x:.1}" cy="{head:.1}" r="4.5" fill="white"/>"#
    ));
    if selected {
        build_selection_ring(svg, x, head);
    }
    let ty = head - r - 6.0;
    svg.push_str(&format!(
        r#"<text x="{x:.1}" y="{ty:.1}" fill="white" font-size="13" font-family="sans-serif" font-weight="600" text-anchor="middle" stroke="rgba(0,0,0,0.7)" stroke-width="3" paint-order="stroke">{title}</text>"#
    ));
    svg.push_str("</g>");
}

/// Emit an animated dashed selection ring around a pin head.
fn build_selection_ring(svg: &mut String, cx: f64, cy: f64) {
    svg.push_str(&format!(
        r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="20" fill="none" stroke="white" stroke-width="3" stroke-dasharray="6 4" opacity="0.9"><animate attributeName="opacity" values="0.5;1;0.5" dur="1.2s" repeatCount="indefinite"/></circle>"#
    ));
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    viewport: Signal<Viewport>,
    annotations: Vec<Annotation>,
    overlays: Vec<Route>,
    selected: Option<usize>,
    user_location: Option<Coordinate>,
    pin_count_label: String,
    long_press_ms: u32,
    on_resize: EventHandler<(f64, f64)>,
    on_long_press: EventHandler<Coordinate>,
    on_select: EventHandler<usize>,
) -> Element {
    let mut press = use_signal(|| None::<Press>);
    let mut press_counter = use_signal(|| 0u64);
    let mut pinch = use_signal(|| None::<Pinch>);

    // Arms the long-press timer for a new press at container point `at`.
    let mut begin_press = move |at: (f64, f64)| {
        let id = *press_counter.peek() + 1;
        press_counter.set(id);
        press.set(Some(Press {
            id,
            start: at,
            anchor: *viewport.peek(),
            moved: false,
            fired: false,
        }));
        spawn(async move {
            TimeoutFuture::new(long_press_ms).await;
            let current = *press.peek();
            let Some(p) = current else { return };
            if p.id != id || p.moved {
                return;
            }
            press.set(Some(Press { fired: true, ..p }));
            let coordinate = viewport.peek().screen_to_coordinate(p.start.0, p.start.1);
            on_long_press.call(coordinate);
        });
    };

    let mut drag_to = move |at: (f64, f64), threshold: f64| {
        let Some(p) = *press.peek() else { return };
        if p.fired {
            return;
        }
        if !p.moved && !exceeds(p.start, at, threshold) {
            return;
        }
        if !p.moved {
            press.set(Some(Press { moved: true, ..p }));
        }
        viewport.set(p.anchor.panned(at.0 - p.start.0, at.1 - p.start.1));
    };

    // Releases the current press; a short, still press is a tap.
    let tap_targets = annotations.clone();
    let mut end_press = move || {
        let current = *press.peek();
        press.set(None);
        let Some(p) = current else { return };
        if p.moved || p.fired {
            return;
        }
        let vp = *viewport.peek();
        if let Some(index) = coords::find_nearest_annotation(&vp, &tap_targets, p.start, TAP_THRESHOLD) {
            on_select.call(index);
        }
    };
    let mut end_touch = end_press.clone();

    let vp = *viewport.read();
    let svg_html = build_overlay_svg(&vp, &annotations, &overlays, selected, user_location);
    let tiles: Vec<(String, TilePlacement)> = vp.tiles().into_iter().map(|t| (tile_url(&t), t)).collect();
    let (scale_px, scale_label) = coords::scale_bar(&vp, 100.0);
    let container_class = match *press.read() {
        Some(p) if p.moved => "map-container dragging",
        _ => "map-container",
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onmounted: move |_| {
                if let Some(rect) = coords::element_rect(MAP_CONTAINER_ID) {
                    on_resize.call((rect.width(), rect.height()));
                }
            },

            onresize: move |evt: Event<ResizeData>| {
                if let Ok(size) = evt.data().get_border_box_size() {
                    on_resize.call((size.width, size.height));
                }
            },

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let Some(rect) = coords::element_rect(MAP_CONTAINER_ID) else { return };
                let client = evt.data().client_coordinates();
                let (cx, cy) = coords::client_to_container(client.x, client.y, rect.left(), rect.top());
                let delta_y = wheel_delta_y(evt.data().delta());
                let current = *viewport.peek();
                viewport.set(current.zoomed_at(cx, cy, wheel_zoom(current.zoom, delta_y)));
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                if let Some(at) = coords::client_to_element(client.x, client.y, MAP_CONTAINER_ID) {
                    begin_press(at);
                }
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                if let Some(at) = coords::client_to_element(client.x, client.y, MAP_CONTAINER_ID) {
                    drag_to(at, DRAG_THRESHOLD);
                }
            },

            onmouseup: move |_| end_press(),

            onmouseleave: move |_| {
                press.set(None);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                let client = evt.client_coordinates();
                if let Some((cx, cy)) = coords::client_to_element(client.x, client.y, MAP_CONTAINER_ID) {
                    let current = *viewport.peek();
                    viewport.set(current.zoomed_at(cx, cy, current.zoom + 1.0));
                }
            },

            oncontextmenu: move |evt: Event<MouseData>| evt.prevent_default(),

            // --- Touch event handlers ---

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let c = touches[0].client_coordinates();
                    if let Some(at) = coords::client_to_element(c.x, c.y, MAP_CONTAINER_ID) {
                        begin_press(at);
                    }
                } else if touches.len() >= 2 {
                    let c0 = touches[0].client_coordinates();
                    let c1 = touches[1].client_coordinates();
                    let p0 = (c0.x, c0.y);
                    let p1 = (c1.x, c1.y);
                    let Some(rect) = coords::element_rect(MAP_CONTAINER_ID) else { return };
                    let midpoint = coords::client_to_container(
                        (p0.0 + p1.0) / 2.0,
                        (p0.1 + p1.1) / 2.0,
                        rect.left(),
                        rect.top(),
                    );
                    // A second finger cancels any pending tap or long press
                    press.set(None);
                    pinch.set(Some(Pinch {
                        start_distance: coords::point_distance(p0, p1),
                        midpoint,
                        anchor: *viewport.peek(),
                    }));
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if let Some(pn) = *pinch.peek() {
                    if touches.len() < 2 || pn.start_distance < 1.0 {
                        return;
                    }
                    let c0 = touches[0].client_coordinates();
                    let c1 = touches[1].client_coordinates();
                    let d = coords::point_distance((c0.x, c0.y), (c1.x, c1.y));
                    let new_zoom = pinch_zoom(pn.anchor.zoom, pn.start_distance, d);
                    viewport.set(pn.anchor.zoomed_at(pn.midpoint.0, pn.midpoint.1, new_zoom));
                } else if touches.len() == 1 {
                    let c = touches[0].client_coordinates();
                    if let Some(at) = coords::client_to_element(c.x, c.y, MAP_CONTAINER_ID) {
                        drag_to(at, TOUCH_DRAG_THRESHOLD);
                    }
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let remaining = evt.data().touches().len();
                if pinch.peek().is_some() {
                    // Wait for all fingers to lift before resetting pinch state
                    if remaining == 0 {
                        pinch.set(None);
                    }
                    return;
                }
                if remaining == 0 {
                    end_touch();
                }
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                press.set(None);
                pinch.set(None);
            },

            div { class: "map-tiles",
                for (url, tile) in tiles {
                    img {
                        key: "{tile.z}-{tile.x}-{tile.y}-{tile.screen_x}",
                        src: "{url}",
                        draggable: "false",
                        style: "left:{tile.screen_x}px;top:{tile.screen_y}px;width:{tile.size}px;height:{tile.size}px;",
                    }
                }
            }

            div {
                class: "map-overlay",
                dangerous_inner_html: "{svg_html}",
            }

            div { class: "pin-count", "{pin_count_label}" }

            div { class: "scale-bar",
                div { class: "scale-bar-line", style: "width:{scale_px}px;" }
                span { "{scale_label}" }
            }

            div { class: "map-attribution",
                "© "
                a { href: "https://www.openstreetmap.org/copyright", target: "_blank", "OpenStreetMap" }
                " contributors"
            }
        }
    }
}
