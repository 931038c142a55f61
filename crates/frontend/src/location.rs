//! Browser geolocation and permission plumbing.
//!
//! Platform callbacks never touch UI state directly; they push
//! [`LocationEvent`]s into a channel drained by the map screen.

use futures::channel::mpsc::UnboundedSender;
use js_sys::{Object, Promise, Reflect};
use pinmap_shared::models::Coordinate;
use pinmap_shared::permission::PermissionState;
use thiserror::Error;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Permission(PermissionState),
    Position(Coordinate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("geolocation is not available")]
    Unavailable,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out waiting for a position")]
    Timeout,
}

impl LocationError {
    /// Classify a `GeolocationPositionError` by its numeric code.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::PositionUnavailable,
            3 => LocationError::Timeout,
            _ => LocationError::Unavailable,
        }
    }

    fn from_js(err: &JsValue) -> Self {
        Reflect::get(err, &JsValue::from_str("code"))
            .ok()
            .and_then(|c| c.as_f64())
            .map(|c| LocationError::from_code(c as u16))
            .unwrap_or(LocationError::Unavailable)
    }
}

fn position_options() -> web_sys::PositionOptions {
    let options = web_sys::PositionOptions::new();
    options.set_maximum_age(60_000);
    options.set_timeout(15_000);
    options
}

fn to_coordinate(position: &web_sys::Position) -> Coordinate {
    let coords = position.coords();
    Coordinate::new(coords.latitude(), coords.longitude())
}

/// The `PermissionStatus` for geolocation, or `None` where the Permissions
/// API is missing.
pub async fn permission_status() -> Option<web_sys::PermissionStatus> {
    let permissions = web_sys::window()?.navigator().permissions().ok()?;
    let descriptor = Object::new();
    Reflect::set(
        &descriptor,
        &JsValue::from_str("name"),
        &JsValue::from_str("geolocation"),
    )
    .ok()?;
    let promise = permissions.query(&descriptor).ok()?;
    let status = JsFuture::from(promise).await.ok()?;
    Some(status.unchecked_into())
}

pub fn permission_state(status: &web_sys::PermissionStatus) -> PermissionState {
    let name = match status.state() {
        web_sys::PermissionState::Granted => "granted",
        web_sys::PermissionState::Prompt => "prompt",
        web_sys::PermissionState::Denied => "denied",
        _ => "unknown",
    };
    PermissionState::from_platform(name)
}

/// Forward every later change of `status` into `tx`.
pub fn watch_permission(status: &web_sys::PermissionStatus, tx: UnboundedSender<LocationEvent>) {
    let watched = status.clone();
    let on_change = Closure::<dyn FnMut()>::new(move || {
        let _ = tx.unbounded_send(LocationEvent::Permission(permission_state(&watched)));
    });
    status.set_onchange(Some(on_change.as_ref().unchecked_ref()));
    // Lives as long as the page
    on_change.forget();
}

/// One-shot position fix. Shows the browser's permission prompt if needed.
pub async fn request_position() -> Result<Coordinate, LocationError> {
    let geolocation = web_sys::window()
        .ok_or(LocationError::Unavailable)?
        .navigator()
        .geolocation()
        .map_err(|_| LocationError::Unavailable)?;

    let promise = Promise::new(&mut |resolve: js_sys::Function, reject: js_sys::Function| {
        let fail = reject.clone();
        let on_success = Closure::once_into_js(move |pos: JsValue| {
            let _ = resolve.call1(&JsValue::NULL, &pos);
        });
        let on_error = Closure::once_into_js(move |err: JsValue| {
            let _ = reject.call1(&JsValue::NULL, &err);
        });
        if let Err(e) = geolocation.get_current_position_with_error_callback_and_options(
            on_success.unchecked_ref(),
            Some(on_error.unchecked_ref()),
            &position_options(),
        ) {
            let _ = fail.call1(&JsValue::NULL, &e);
        }
    });

    match JsFuture::from(promise).await {
        Ok(pos) => Ok(to_coordinate(&pos.unchecked_into())),
        Err(err) => Err(LocationError::from_js(&err)),
    }
}

/// Stream position updates into `tx` until the page goes away. A permission
/// error from the platform is reported as a `Denied` transition.
pub fn watch_position(tx: UnboundedSender<LocationEvent>) -> Option<i32> {
    let geolocation = web_sys::window()?.navigator().geolocation().ok()?;

    let update_tx = tx.clone();
    let on_update = Closure::<dyn FnMut(JsValue)>::new(move |pos: JsValue| {
        let pos: web_sys::Position = pos.unchecked_into();
        let _ = update_tx.unbounded_send(LocationEvent::Position(to_coordinate(&pos)));
    });
    let on_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
        match LocationError::from_js(&err) {
            LocationError::PermissionDenied => {
                let _ = tx.unbounded_send(LocationEvent::Permission(PermissionState::Denied));
            }
            other => tracing::debug!(error = %other, "Position update failed"),
        }
    });

    let id = geolocation
        .watch_position_with_error_callback_and_options(
            on_update.as_ref().unchecked_ref(),
            Some(on_error.as_ref().unchecked_ref()),
            &position_options(),
        )
        .ok()?;
    on_update.forget();
    on_error.forget();
    Some(id)
}
