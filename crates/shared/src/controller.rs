//! The map screen as a UI-independent state machine.
//!
//! The host renders [`MapScreen`]'s state (camera, annotations, overlays,
//! the front dialog) and forwards user and platform events back as method
//! calls. Nothing here blocks or spawns; the one asynchronous step, routing,
//! is handed to the host as a [`RouteRequest`] and its outcome comes back
//! through [`MapScreen::apply_route_result`].

use std::collections::VecDeque;

use crate::config::MapConfig;
use crate::geo;
use crate::models::{Annotation, Coordinate, PinRecord, Region, Route};
use crate::permission::{PermissionAction, PermissionState};
use crate::routing::{RouteRequest, RoutingError};
use crate::store::{KeyValueSlot, PinStore};

/// Modal dialogs the screen can ask the host to present.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    /// Text prompt for the title of a pin about to be dropped.
    AddPin { coordinate: Coordinate },
    /// "Build a route to this place?"
    ConfirmRoute { destination: Coordinate, title: String },
    /// Location access is denied; informational only.
    PermissionDenied,
}

pub struct MapScreen<S> {
    config: MapConfig,
    store: PinStore<S>,
    region: Region,
    region_revision: u64,
    annotations: Vec<Annotation>,
    overlays: Vec<Route>,
    selected: Option<usize>,
    shows_user_location: bool,
    permission: Option<PermissionState>,
    dialogs: VecDeque<Dialog>,
}

impl<S: KeyValueSlot> MapScreen<S> {
    pub fn new(config: MapConfig, slot: S) -> Self {
        let store = PinStore::with_key(slot, config.storage_key.clone());
        let region = Region::from_meters(
            config.default_center,
            config.initial_span_m,
            config.initial_span_m,
        );
        MapScreen {
            config,
            store,
            region,
            region_revision: 0,
            annotations: Vec::new(),
            overlays: Vec::new(),
            selected: None,
            shows_user_location: false,
            permission: None,
            dialogs: VecDeque::new(),
        }
    }

    /// Center the camera and show every stored pin.
    pub fn launch(&mut self, last_known_location: Option<Coordinate>) {
        let center = last_known_location
            .filter(Coordinate::is_valid)
            .unwrap_or(self.config.default_center);
        let span = self.config.initial_span_m;
        self.set_region(Region::from_meters(center, span, span));

        let records = self.store.load_or_empty();
        self.annotations = records.iter().map(Annotation::from).collect();
        tracing::info!(pins = self.annotations.len(), "Loaded stored pins");
    }

    /// Move the camera to `coordinate` with the initial span, e.g. on the
    /// first location fix after launch. Invalid coordinates are ignored.
    pub fn center_on(&mut self, coordinate: Coordinate) {
        if !coordinate.is_valid() {
            return;
        }
        let span = self.config.initial_span_m;
        self.set_region(Region::from_meters(coordinate, span, span));
    }

    /// Re-evaluate after the platform reported an authorization state.
    ///
    /// Repeating the current state is not a transition and changes nothing.
    pub fn on_authorization_changed(&mut self, state: PermissionState) -> PermissionAction {
        if self.permission == Some(state) {
            return PermissionAction::Nothing;
        }
        tracing::info!(from = ?self.permission, to = %state, "Location permission changed");
        self.permission = Some(state);

        match state {
            PermissionState::Undetermined => {
                self.shows_user_location = false;
                PermissionAction::RequestPermission
            }
            PermissionState::Authorized => {
                self.shows_user_location = true;
                PermissionAction::StartUpdatingLocation
            }
            PermissionState::Denied => {
                self.shows_user_location = false;
                self.dialogs.push_back(Dialog::PermissionDenied);
                PermissionAction::Nothing
            }
        }
    }

    /// Long-press at `coordinate`: ask for a title.
    pub fn on_long_press(&mut self, coordinate: Coordinate) {
        if !coordinate.is_valid() {
            tracing::warn!(?coordinate, "Ignoring long-press outside the map");
            return;
        }
        self.dialogs.push_back(Dialog::AddPin { coordinate });
    }

    /// Confirm the add-pin prompt. Returns the new annotation, or `None` when
    /// no prompt was open or the title was blank.
    pub fn confirm_add_pin(&mut self, title: &str) -> Option<&Annotation> {
        let Some(Dialog::AddPin { coordinate }) = self.dialogs.front().cloned() else {
            tracing::debug!("No add-pin prompt to confirm");
            return None;
        };
        self.dialogs.pop_front();

        let title = title.trim();
        if title.is_empty() {
            tracing::info!("Pin not added: empty title");
            return None;
        }

        let annotation = Annotation {
            coordinate,
            title: title.to_string(),
        };
        if let Err(e) = self.store.append(PinRecord::from(&annotation)) {
            tracing::warn!(error = %e, "Pin shown but not saved");
        }
        self.annotations.push(annotation);
        self.annotations.last()
    }

    /// Close the front dialog without acting on it.
    pub fn dismiss_dialog(&mut self) {
        match self.dialogs.pop_front() {
            Some(Dialog::AddPin { .. }) => tracing::info!("Pin not added: prompt cancelled"),
            Some(Dialog::ConfirmRoute { .. }) => self.selected = None,
            Some(Dialog::PermissionDenied) | None => {}
        }
    }

    /// Remove every pin and route, on screen and in storage.
    pub fn remove_all(&mut self) {
        self.annotations.clear();
        self.overlays.clear();
        self.selected = None;
        self.dialogs
            .retain(|d| !matches!(d, Dialog::ConfirmRoute { .. }));
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored pins");
        }
    }

    /// The user tapped the annotation at `index`: offer a route to it.
    pub fn select_annotation(&mut self, index: usize) {
        let Some(annotation) = self.annotations.get(index) else {
            return;
        };
        self.selected = Some(index);
        self.dialogs.push_back(Dialog::ConfirmRoute {
            destination: annotation.coordinate,
            title: annotation.title.clone(),
        });
    }

    /// Accept the route prompt. Returns the request the host should send to
    /// the routing service, or `None` if there is nothing to route.
    pub fn confirm_route(&mut self, current_location: Option<Coordinate>) -> Option<RouteRequest> {
        let Some(Dialog::ConfirmRoute { destination, .. }) = self.dialogs.front().cloned() else {
            return None;
        };
        self.dialogs.pop_front();
        self.selected = None;

        let Some(source) = current_location.filter(Coordinate::is_valid) else {
            tracing::warn!(error = %RoutingError::NoCurrentLocation, "Route not requested");
            return None;
        };
        Some(RouteRequest {
            source,
            destination,
            mode: self.config.travel_mode,
        })
    }

    /// Deliver the routing outcome. The best route is drawn and the camera
    /// fitted to it; failures are logged and leave the map as it was.
    /// Returns whether an overlay was added.
    pub fn apply_route_result(&mut self, result: Result<Vec<Route>, RoutingError>) -> bool {
        let route = match result {
            Ok(routes) => match routes.into_iter().next() {
                Some(route) => route,
                None => {
                    tracing::warn!(error = %RoutingError::NoRoutes, "Route not drawn");
                    return false;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Route not drawn");
                return false;
            }
        };

        tracing::info!(
            distance_m = route.distance_m,
            duration_s = route.duration_s,
            points = route.path.len(),
            "Drawing route"
        );
        self.set_region(geo::pad_region(route.bounds, self.config.route_padding));
        self.overlays.push(route);
        true
    }

    fn set_region(&mut self, region: Region) {
        self.region = region;
        self.region_revision += 1;
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Camera region last requested by the screen itself.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Bumped every time the screen moves the camera, so a host can tell
    /// programmatic camera changes from user panning.
    pub fn region_revision(&self) -> u64 {
        self.region_revision
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn overlays(&self) -> &[Route] {
        &self.overlays
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn shows_user_location(&self) -> bool {
        self.shows_user_location
    }

    pub fn permission(&self) -> Option<PermissionState> {
        self.permission
    }

    /// Dialog the host should present now, if any.
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialogs.front()
    }

    pub fn pin_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn pin_count_label(&self) -> String {
        self.config.locale.pins_count(self.pin_count())
    }

    pub fn store(&self) -> &PinStore<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TravelMode;
    use crate::routing::RoutingService;
    use crate::store::{MemorySlot, DEFAULT_STORAGE_KEY};

    fn screen() -> MapScreen<MemorySlot> {
        let mut screen = MapScreen::new(MapConfig::default(), MemorySlot::new());
        screen.launch(None);
        screen
    }

    fn add_pin(screen: &mut MapScreen<MemorySlot>, lat: f64, lng: f64, title: &str) {
        screen.on_long_press(Coordinate::new(lat, lng));
        screen.confirm_add_pin(title);
    }

    fn route_to(lat: f64, lng: f64) -> Route {
        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(lat, lng)];
        Route {
            bounds: geo::bounding_region(&path).unwrap(),
            path,
            distance_m: 1000.0,
            duration_s: 60.0,
        }
    }

    struct FixedRouter(Result<Vec<Route>, RoutingError>);

    impl RoutingService for FixedRouter {
        async fn route(&self, _request: &RouteRequest) -> Result<Vec<Route>, RoutingError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_add_pin_to_empty_store() {
        let mut screen = screen();
        add_pin(&mut screen, 42.0, 18.0, "Beach");

        let stored = screen.store().load().unwrap();
        assert_eq!(stored, vec![PinRecord::new(Coordinate::new(42.0, 18.0), "Beach")]);
        assert_eq!(screen.annotations().len(), 1);
        assert!(screen.dialog().is_none());
    }

    #[test]
    fn test_pins_kept_in_insertion_order() {
        let mut screen = screen();
        add_pin(&mut screen, 1.0, 1.0, "A");
        add_pin(&mut screen, 2.0, 2.0, "B");

        let titles: Vec<String> = screen.store().load().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(screen.pin_count_label(), "2 pins");
    }

    #[test]
    fn test_remove_all_clears_map_and_store() {
        let mut screen = screen();
        add_pin(&mut screen, 1.0, 1.0, "A");
        add_pin(&mut screen, 2.0, 2.0, "B");
        screen.apply_route_result(Ok(vec![route_to(1.0, 1.0)]));

        screen.remove_all();
        assert!(screen.annotations().is_empty());
        assert!(screen.overlays().is_empty());
        assert!(screen.store().load().unwrap().is_empty());
        assert_eq!(screen.pin_count_label(), "0 pins");
    }

    #[test]
    fn test_blank_title_adds_nothing() {
        let mut screen = screen();
        add_pin(&mut screen, 1.0, 1.0, "   ");
        assert!(screen.annotations().is_empty());
        assert!(screen.store().load().unwrap().is_empty());
        assert!(screen.dialog().is_none());
    }

    #[test]
    fn test_cancel_prompt_adds_nothing() {
        let mut screen = screen();
        screen.on_long_press(Coordinate::new(1.0, 1.0));
        assert_eq!(
            screen.dialog(),
            Some(&Dialog::AddPin { coordinate: Coordinate::new(1.0, 1.0) })
        );
        screen.dismiss_dialog();
        assert!(screen.dialog().is_none());
        assert!(screen.annotations().is_empty());
        // Confirming afterwards is a no-op
        assert!(screen.confirm_add_pin("late").is_none());
    }

    #[test]
    fn test_title_is_trimmed() {
        let mut screen = screen();
        add_pin(&mut screen, 1.0, 1.0, "  Home \n");
        assert_eq!(screen.annotations()[0].title, "Home");
    }

    #[test]
    fn test_long_press_outside_map_ignored() {
        let mut screen = screen();
        screen.on_long_press(Coordinate::new(95.0, 0.0));
        assert!(screen.dialog().is_none());
    }

    #[test]
    fn test_launch_renders_stored_pins() {
        let mut slot = MemorySlot::new();
        slot.set(
            DEFAULT_STORAGE_KEY,
            r#"[{"lat": 42.0, "lng": 18.0, "title": "Beach"}, {"lat": 43.0, "lng": 19.0, "title": "Hill"}]"#,
        )
        .unwrap();
        let mut screen = MapScreen::new(MapConfig::default(), slot);
        screen.launch(Some(Coordinate::new(42.5, 18.5)));

        assert_eq!(screen.annotations().len(), 2);
        assert_eq!(screen.annotations()[1].title, "Hill");
        assert_eq!(screen.region().center, Coordinate::new(42.5, 18.5));
        assert_eq!(screen.pin_count_label(), "2 pins");
    }

    #[test]
    fn test_launch_with_corrupt_store_shows_nothing() {
        let mut slot = MemorySlot::new();
        slot.set(DEFAULT_STORAGE_KEY, r#"{"lat": 1}"#).unwrap();
        let mut screen = MapScreen::new(MapConfig::default(), slot);
        screen.launch(None);

        assert!(screen.annotations().is_empty());
        assert_eq!(screen.region().center, Coordinate::new(0.0, 0.0));
    }

    #[test]
    fn test_pin_added_over_corrupt_store_survives_relaunch() {
        let mut slot = MemorySlot::new();
        slot.set(DEFAULT_STORAGE_KEY, "{broken").unwrap();
        let mut screen = MapScreen::new(MapConfig::default(), slot);
        screen.launch(None);
        add_pin(&mut screen, 42.0, 18.0, "Beach");
        assert_eq!(screen.annotations().len(), 1);

        let mut relaunched = MapScreen::new(MapConfig::default(), screen.store().slot().clone());
        relaunched.launch(None);
        assert_eq!(relaunched.pin_count(), 1);
        assert_eq!(relaunched.annotations()[0].title, "Beach");
    }

    #[test]
    fn test_center_on_moves_camera() {
        let mut screen = screen();
        let before = screen.region_revision();
        screen.center_on(Coordinate::new(55.75, 37.62));
        assert_eq!(screen.region().center, Coordinate::new(55.75, 37.62));
        assert_eq!(screen.region_revision(), before + 1);

        screen.center_on(Coordinate::new(f64::NAN, 0.0));
        assert_eq!(screen.region_revision(), before + 1);
    }

    #[test]
    fn test_denied_transition_shows_dialog_once() {
        let mut screen = screen();
        assert_eq!(
            screen.on_authorization_changed(PermissionState::Undetermined),
            PermissionAction::RequestPermission
        );
        assert!(!screen.shows_user_location());

        assert_eq!(
            screen.on_authorization_changed(PermissionState::Denied),
            PermissionAction::Nothing
        );
        assert!(!screen.shows_user_location());
        assert_eq!(screen.dialog(), Some(&Dialog::PermissionDenied));

        // Same state reported again is not a transition
        screen.on_authorization_changed(PermissionState::Denied);
        screen.dismiss_dialog();
        assert!(screen.dialog().is_none());
        assert!(!screen.shows_user_location());
    }

    #[test]
    fn test_each_denial_transition_shows_dialog() {
        let mut screen = screen();
        screen.on_authorization_changed(PermissionState::Denied);
        screen.dismiss_dialog();
        assert_eq!(
            screen.on_authorization_changed(PermissionState::Authorized),
            PermissionAction::StartUpdatingLocation
        );
        assert!(screen.shows_user_location());

        screen.on_authorization_changed(PermissionState::Denied);
        assert_eq!(screen.dialog(), Some(&Dialog::PermissionDenied));
        assert!(!screen.shows_user_location());
    }

    #[test]
    fn test_select_then_confirm_builds_request() {
        let mut screen = screen();
        add_pin(&mut screen, 42.0, 18.0, "Beach");
        screen.select_annotation(0);
        assert_eq!(screen.selected(), Some(0));
        assert_eq!(
            screen.dialog(),
            Some(&Dialog::ConfirmRoute {
                destination: Coordinate::new(42.0, 18.0),
                title: "Beach".to_string(),
            })
        );

        let request = screen.confirm_route(Some(Coordinate::new(42.43, 19.26))).unwrap();
        assert_eq!(request.source, Coordinate::new(42.43, 19.26));
        assert_eq!(request.destination, Coordinate::new(42.0, 18.0));
        assert_eq!(request.mode, TravelMode::Automobile);
        assert!(screen.dialog().is_none());
        assert_eq!(screen.selected(), None);
    }

    #[test]
    fn test_declined_route_requests_nothing() {
        let mut screen = screen();
        add_pin(&mut screen, 42.0, 18.0, "Beach");
        screen.select_annotation(0);
        screen.dismiss_dialog();
        assert_eq!(screen.selected(), None);
        assert!(screen.confirm_route(Some(Coordinate::new(1.0, 1.0))).is_none());
    }

    #[test]
    fn test_route_without_location_is_skipped() {
        let mut screen = screen();
        add_pin(&mut screen, 42.0, 18.0, "Beach");
        screen.select_annotation(0);
        assert!(screen.confirm_route(None).is_none());
        assert!(screen.dialog().is_none());
    }

    #[test]
    fn test_select_out_of_range_is_ignored() {
        let mut screen = screen();
        screen.select_annotation(3);
        assert!(screen.dialog().is_none());
        assert_eq!(screen.selected(), None);
    }

    #[test]
    fn test_zero_routes_adds_no_overlay() {
        let mut screen = screen();
        let revision = screen.region_revision();
        assert!(!screen.apply_route_result(Ok(vec![])));
        assert!(screen.overlays().is_empty());
        assert_eq!(screen.region_revision(), revision);
    }

    #[test]
    fn test_routing_error_leaves_map_unchanged() {
        let mut screen = screen();
        let region = screen.region();
        assert!(!screen.apply_route_result(Err(RoutingError::Transport("offline".into()))));
        assert!(screen.overlays().is_empty());
        assert_eq!(screen.region(), region);
    }

    #[test]
    fn test_first_route_drawn_and_camera_fitted() {
        let mut screen = screen();
        let revision = screen.region_revision();
        let best = route_to(2.0, 4.0);
        let worse = route_to(3.0, 5.0);

        assert!(screen.apply_route_result(Ok(vec![best.clone(), worse])));
        assert_eq!(screen.overlays(), &[best.clone()]);
        assert_eq!(screen.region().center, best.bounds.center);
        assert!((screen.region().latitude_delta - 2.4).abs() < 1e-9);
        assert!(screen.region_revision() > revision);
    }

    #[test]
    fn test_dialogs_queue_in_order() {
        let mut screen = screen();
        screen.on_long_press(Coordinate::new(1.0, 1.0));
        screen.on_authorization_changed(PermissionState::Denied);
        assert!(matches!(screen.dialog(), Some(Dialog::AddPin { .. })));
        screen.confirm_add_pin("A");
        assert_eq!(screen.dialog(), Some(&Dialog::PermissionDenied));
    }

    #[tokio::test]
    async fn test_route_round_trip_through_service() {
        let mut screen = screen();
        add_pin(&mut screen, 42.0, 18.0, "Beach");
        screen.select_annotation(0);
        let request = screen.confirm_route(Some(Coordinate::new(0.0, 0.0))).unwrap();

        let router = FixedRouter(Ok(vec![route_to(42.0, 18.0)]));
        let result = router.route(&request).await;
        assert!(screen.apply_route_result(result));
        assert_eq!(screen.overlays().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_service_answer_is_harmless() {
        let mut screen = screen();
        let router = FixedRouter(Ok(vec![]));
        let request = RouteRequest {
            source: Coordinate::new(0.0, 0.0),
            destination: Coordinate::new(1.0, 1.0),
            mode: TravelMode::Automobile,
        };
        let result = router.route(&request).await;
        assert!(!screen.apply_route_result(result));
        assert!(screen.overlays().is_empty());
    }
}
