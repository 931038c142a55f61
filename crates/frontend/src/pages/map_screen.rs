use dioxus::prelude::*;
use futures::StreamExt;
use pinmap_shared::config::MapConfig;
use pinmap_shared::controller::{Dialog, MapScreen};
use pinmap_shared::geo::{self, Viewport};
use pinmap_shared::i18n::Locale;
use pinmap_shared::models::Coordinate;
use pinmap_shared::permission::{PermissionAction, PermissionState};
use pinmap_shared::routing::RoutingService;

use crate::components::dialogs::{PermissionAlert, PinPrompt, RouteConfirm};
use crate::components::map_view::MapView;
use crate::components::nav_bar::NavBar;
use crate::location::{self, LocationError, LocationEvent};
use crate::routing::OsrmRouter;
use crate::storage::LocalStorageSlot;

/// Locale matching the browser's preferred language.
fn browser_locale() -> Locale {
    web_sys::window()
        .and_then(|w| w.navigator().language())
        .map(|tag| Locale::from_language_tag(&tag))
        .unwrap_or_default()
}

#[component]
pub fn PinMap() -> Element {
    let mut screen = use_signal(|| {
        let config = MapConfig {
            locale: browser_locale(),
            ..MapConfig::default()
        };
        let mut screen = MapScreen::new(config, LocalStorageSlot::open());
        screen.launch(None);
        screen
    });
    // Zero-sized until the map container reports its size
    let mut viewport =
        use_signal(|| Viewport::new(Coordinate::new(0.0, 0.0), geo::MIN_ZOOM, 0.0, 0.0));
    let mut user_location = use_signal(|| None::<Coordinate>);
    let mut centered_on_user = use_signal(|| false);
    let router = use_hook(|| OsrmRouter::new(screen.peek().config().routing_base_url.clone()));

    // Permission and position updates from the browser, applied in arrival order
    use_future(move || async move {
        let (tx, mut rx) = futures::channel::mpsc::unbounded();

        let status = location::permission_status().await;
        let initial = status
            .as_ref()
            .map(location::permission_state)
            .unwrap_or(PermissionState::Undetermined);
        if let Some(status) = &status {
            location::watch_permission(status, tx.clone());
        }
        let _ = tx.unbounded_send(LocationEvent::Permission(initial));

        let mut watch_id = None;
        while let Some(event) = rx.next().await {
            match event {
                LocationEvent::Permission(state) => {
                    let action = screen.write().on_authorization_changed(state);
                    match action {
                        PermissionAction::RequestPermission => {
                            let tx = tx.clone();
                            spawn(async move {
                                let event = match location::request_position().await {
                                    Ok(coordinate) => {
                                        let _ = tx.unbounded_send(LocationEvent::Position(coordinate));
                                        LocationEvent::Permission(PermissionState::Authorized)
                                    }
                                    Err(LocationError::PermissionDenied) => {
                                        LocationEvent::Permission(PermissionState::Denied)
                                    }
                                    Err(e) => {
                                        tracing::warn!(error = %e, "Could not get a position");
                                        return;
                                    }
                                };
                                let _ = tx.unbounded_send(event);
                            });
                        }
                        PermissionAction::StartUpdatingLocation => {
                            if watch_id.is_none() {
                                watch_id = location::watch_position(tx.clone());
                            }
                        }
                        PermissionAction::Nothing => {}
                    }
                }
                LocationEvent::Position(coordinate) => {
                    user_location.set(Some(coordinate));
                    if !*centered_on_user.peek() {
                        centered_on_user.set(true);
                        screen.write().center_on(coordinate);
                    }
                }
            }
        }
    });

    // Refit the camera only when the screen itself moved it, not on every pin change
    let region_revision = use_memo(move || screen.read().region_revision());
    use_effect(move || {
        let _ = *region_revision.read();
        let region = screen.peek().region();
        let current = *viewport.peek();
        viewport.set(Viewport::fitting(region, current.width, current.height));
    });

    let state = screen.read();
    let locale = state.config().locale;
    let long_press_ms = u32::try_from(state.config().long_press_ms).unwrap_or(u32::MAX);
    let annotations = state.annotations().to_vec();
    let overlays = state.overlays().to_vec();
    let selected = state.selected();
    let pin_count_label = state.pin_count_label();
    let dot = if state.shows_user_location() {
        *user_location.read()
    } else {
        None
    };
    let dialog = state.dialog().cloned();
    drop(state);

    rsx! {
        div { class: "app",
            NavBar {
                locale,
                on_remove_all: move |_| screen.write().remove_all(),
            }

            MapView {
                viewport,
                annotations,
                overlays,
                selected,
                user_location: dot,
                pin_count_label,
                long_press_ms,
                on_resize: move |(w, h): (f64, f64)| {
                    let current = *viewport.peek();
                    if current.width <= 0.0 || current.height <= 0.0 {
                        let region = screen.peek().region();
                        viewport.set(Viewport::fitting(region, w, h));
                    } else if current.width != w || current.height != h {
                        viewport.set(current.resized(w, h));
                    }
                },
                on_long_press: move |coordinate: Coordinate| screen.write().on_long_press(coordinate),
                on_select: move |index: usize| screen.write().select_annotation(index),
            }

            {match dialog {
                Some(Dialog::AddPin { coordinate }) => rsx! {
                    PinPrompt {
                        key: "{coordinate.latitude},{coordinate.longitude}",
                        locale,
                        coordinate,
                        on_confirm: move |title: String| {
                            screen.write().confirm_add_pin(&title);
                        },
                        on_cancel: move |_| screen.write().dismiss_dialog(),
                    }
                },
                Some(Dialog::ConfirmRoute { title, .. }) => rsx! {
                    RouteConfirm {
                        locale,
                        title,
                        on_confirm: move |_| {
                            let request = screen.write().confirm_route(*user_location.peek());
                            let Some(request) = request else { return };
                            let router = router.clone();
                            spawn(async move {
                                let result = router.route(&request).await;
                                screen.write().apply_route_result(result);
                            });
                        },
                        on_cancel: move |_| screen.write().dismiss_dialog(),
                    }
                },
                Some(Dialog::PermissionDenied) => rsx! {
                    PermissionAlert {
                        locale,
                        on_dismiss: move |_| screen.write().dismiss_dialog(),
                    }
                },
                None => rsx! {},
            }}
        }
    }
}
