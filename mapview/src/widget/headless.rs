//! In-memory widget that does not render anything.
//!
//! [`HeadlessWidget`] keeps the markers, subscriptions and controls in memory and allows to
//! produce the events a real widget would report through its [`HeadlessSurface`] handle. The
//! handle is shared with the widget and stays valid after the widget is destroyed, so the state
//! left after a teardown can be inspected.
//!
//! It is used for testing and for running the view without a browser.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::GeolocateOptions;
use crate::control::{ClickTarget, RawMapEvent};
use crate::error::MapViewError;
use crate::geo::{GeolocationError, LngLat, LocationFix};
use crate::widget::{
    ControlId, EventKind, ListenerId, MapWidget, MarkerId, MarkerKind, MarkerOptions,
    WidgetOptions, WidgetProvider,
};

/// Marker attached to a [`HeadlessWidget`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    /// Position of the marker.
    pub position: LngLat,
    /// Options the marker was created with. Rotation is updated by the widget.
    pub options: MarkerOptions,
}

/// Number of handles that were still attached when the widget was destroyed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Leftovers {
    /// Markers.
    pub markers: usize,
    /// Event subscriptions.
    pub listeners: usize,
    /// Controls.
    pub controls: usize,
}

#[derive(Debug)]
struct SurfaceState {
    container: String,
    options: WidgetOptions,
    markers: BTreeMap<MarkerId, HeadlessMarker>,
    listeners: BTreeMap<ListenerId, EventKind>,
    controls: BTreeMap<ControlId, GeolocateOptions>,
    tracking: Option<ControlId>,
    destroyed: Option<Leftovers>,
    next_id: u64,
}

impl SurfaceState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn is_subscribed(&self, kind: EventKind) -> bool {
        self.listeners.values().any(|k| *k == kind)
    }
}

/// Shared handle to the state of a [`HeadlessWidget`].
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    fn new(container: String, options: WidgetOptions) -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                container,
                options,
                markers: BTreeMap::new(),
                listeners: BTreeMap::new(),
                controls: BTreeMap::new(),
                tracking: None,
                destroyed: None,
                next_id: 0,
            })),
        }
    }

    /// Container the widget was created in.
    pub fn container(&self) -> String {
        self.state.borrow().container.clone()
    }

    /// Options the widget was created with.
    pub fn options(&self) -> WidgetOptions {
        self.state.borrow().options.clone()
    }

    /// Number of attached markers of all kinds.
    pub fn marker_count(&self) -> usize {
        self.state.borrow().markers.len()
    }

    /// Returns true if the marker is attached.
    pub fn has_marker(&self, marker: MarkerId) -> bool {
        self.state.borrow().markers.contains_key(&marker)
    }

    /// Returns the attached marker.
    pub fn marker(&self, marker: MarkerId) -> Option<HeadlessMarker> {
        self.state.borrow().markers.get(&marker).cloned()
    }

    /// Returns all attached markers of the given kind.
    pub fn markers_of_kind(&self, kind: MarkerKind) -> Vec<(MarkerId, HeadlessMarker)> {
        self.state
            .borrow()
            .markers
            .iter()
            .filter(|(_, marker)| marker.options.kind == kind)
            .map(|(id, marker)| (*id, marker.clone()))
            .collect()
    }

    /// Number of active event subscriptions.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Number of controls on the map.
    pub fn control_count(&self) -> usize {
        self.state.borrow().controls.len()
    }

    /// Returns true if the location-tracking control was triggered.
    pub fn is_tracking(&self) -> bool {
        self.state.borrow().tracking.is_some()
    }

    /// Returns true if the widget was destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed.is_some()
    }

    /// Handles that were still attached at the moment the widget was destroyed. `None` if the
    /// widget is not destroyed.
    pub fn leftovers(&self) -> Option<Leftovers> {
        self.state.borrow().destroyed
    }

    /// Click on the map surface at the given position.
    pub fn click(&self, position: LngLat) -> Option<RawMapEvent> {
        let state = self.state.borrow();
        if state.destroyed.is_some() || !state.is_subscribed(EventKind::Click) {
            return None;
        }

        Some(RawMapEvent::Click {
            position,
            target: ClickTarget::Map,
        })
    }

    /// Click on a marker. Only pins are clickable; a click on any other marker falls through to
    /// the map.
    pub fn click_marker(&self, marker: MarkerId) -> Option<RawMapEvent> {
        let state = self.state.borrow();
        if state.destroyed.is_some() || !state.is_subscribed(EventKind::Click) {
            return None;
        }

        let attached = state.markers.get(&marker)?;
        let target = match attached.options.kind {
            MarkerKind::Pin => ClickTarget::Marker(marker),
            _ => ClickTarget::Map,
        };

        Some(RawMapEvent::Click {
            position: attached.position,
            target,
        })
    }

    /// Map style finished loading.
    pub fn load(&self) -> Option<RawMapEvent> {
        let state = self.state.borrow();
        if state.destroyed.is_some() || !state.is_subscribed(EventKind::Load) {
            return None;
        }

        Some(RawMapEvent::Load)
    }

    /// The platform reported a new fix. Events are only produced while the location-tracking
    /// control is tracking.
    pub fn fix(&self, fix: LocationFix) -> Option<RawMapEvent> {
        let state = self.state.borrow();
        if state.destroyed.is_some()
            || state.tracking.is_none()
            || !state.is_subscribed(EventKind::Geolocate)
        {
            return None;
        }

        Some(RawMapEvent::Geolocate(fix))
    }

    /// The platform failed to produce a fix.
    pub fn geolocate_error(&self, error: GeolocationError) -> Option<RawMapEvent> {
        let state = self.state.borrow();
        if state.destroyed.is_some()
            || state.tracking.is_none()
            || !state.is_subscribed(EventKind::GeolocateError)
        {
            return None;
        }

        Some(RawMapEvent::GeolocateError(error))
    }
}

/// Widget keeping its state in memory.
#[derive(Debug)]
pub struct HeadlessWidget {
    surface: HeadlessSurface,
}

impl HeadlessWidget {
    /// Creates a new widget.
    pub fn new(container: impl Into<String>, options: WidgetOptions) -> Self {
        Self {
            surface: HeadlessSurface::new(container.into(), options),
        }
    }

    /// Returns the handle to the widget state.
    pub fn surface(&self) -> HeadlessSurface {
        self.surface.clone()
    }

    fn with_state<T>(&mut self, f: impl FnOnce(&mut SurfaceState) -> T) -> T {
        f(&mut self.surface.state.borrow_mut())
    }

    fn with_live_state<T>(
        &mut self,
        f: impl FnOnce(&mut SurfaceState) -> Result<T, MapViewError>,
    ) -> Result<T, MapViewError> {
        self.with_state(|state| {
            if state.destroyed.is_some() {
                return Err(MapViewError::WidgetDestroyed);
            }

            f(state)
        })
    }
}

impl Default for HeadlessWidget {
    fn default() -> Self {
        let config = crate::config::MapConfig::new("headless");
        Self::new("map", WidgetOptions::from(&config))
    }
}

impl MapWidget for HeadlessWidget {
    fn add_marker(
        &mut self,
        position: LngLat,
        options: &MarkerOptions,
    ) -> Result<MarkerId, MapViewError> {
        self.with_live_state(|state| {
            let id = MarkerId::new(state.next_id());
            state.markers.insert(
                id,
                HeadlessMarker {
                    position,
                    options: options.clone(),
                },
            );
            Ok(id)
        })
    }

    fn set_marker_position(&mut self, marker: MarkerId, position: LngLat) {
        self.with_state(|state| {
            if let Some(m) = state.markers.get_mut(&marker) {
                m.position = position;
            }
        })
    }

    fn set_marker_rotation(&mut self, marker: MarkerId, rotation: f64) {
        self.with_state(|state| {
            if let Some(m) = state.markers.get_mut(&marker) {
                m.options.rotation = rotation;
            }
        })
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.with_state(|state| {
            state.markers.remove(&marker);
        })
    }

    fn subscribe(&mut self, kind: EventKind) -> Result<ListenerId, MapViewError> {
        self.with_live_state(|state| {
            let id = ListenerId::new(state.next_id());
            state.listeners.insert(id, kind);
            Ok(id)
        })
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        self.with_state(|state| {
            state.listeners.remove(&listener);
        })
    }

    fn add_geolocate_control(
        &mut self,
        options: &GeolocateOptions,
    ) -> Result<ControlId, MapViewError> {
        self.with_live_state(|state| {
            let id = ControlId::new(state.next_id());
            state.controls.insert(id, *options);
            Ok(id)
        })
    }

    fn trigger_geolocate(&mut self, control: ControlId) -> Result<(), MapViewError> {
        self.with_live_state(|state| {
            if !state.controls.contains_key(&control) {
                return Err(MapViewError::Widget(format!(
                    "control {control:?} is not on the map"
                )));
            }

            state.tracking = Some(control);
            Ok(())
        })
    }

    fn remove_control(&mut self, control: ControlId) {
        self.with_state(|state| {
            state.controls.remove(&control);
            if state.tracking == Some(control) {
                state.tracking = None;
            }
        })
    }

    fn destroy(&mut self) {
        self.with_state(|state| {
            if state.destroyed.is_some() {
                return;
            }

            state.destroyed = Some(Leftovers {
                markers: state.markers.len(),
                listeners: state.listeners.len(),
                controls: state.controls.len(),
            });
            state.markers.clear();
            state.listeners.clear();
            state.controls.clear();
            state.tracking = None;
        })
    }
}

/// Provider of [`HeadlessWidget`]s. Containers are identified by name.
///
/// Handles to the surfaces of all created widgets are kept by the provider.
#[derive(Debug, Default)]
pub struct HeadlessProvider {
    surfaces: Vec<HeadlessSurface>,
}

impl HeadlessProvider {
    /// Creates a new provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces of all widgets created by the provider, in the order of creation.
    pub fn surfaces(&self) -> &[HeadlessSurface] {
        &self.surfaces
    }

    /// Surface of the last created widget.
    pub fn last_surface(&self) -> Option<&HeadlessSurface> {
        self.surfaces.last()
    }
}

impl WidgetProvider for HeadlessProvider {
    type Container = String;
    type Widget = HeadlessWidget;

    fn create_widget(
        &mut self,
        container: Self::Container,
        options: &WidgetOptions,
    ) -> Result<Self::Widget, MapViewError> {
        if container.trim().is_empty() {
            return Err(MapViewError::ContainerNotFound(container));
        }

        if options.access_token.is_empty() {
            return Err(MapViewError::MissingAccessToken);
        }

        let widget = HeadlessWidget::new(container, options.clone());
        self.surfaces.push(widget.surface());
        Ok(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lnglat;
    use crate::widget::MarkerIcon;
    use assert_matches::assert_matches;

    #[test]
    fn events_require_subscription() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();

        assert!(surface.click(lnglat!(0.0, 0.0)).is_none());

        let listener = widget.subscribe(EventKind::Click).expect("subscribe");
        assert_matches!(
            surface.click(lnglat!(1.0, 2.0)),
            Some(RawMapEvent::Click {
                target: ClickTarget::Map,
                ..
            })
        );

        widget.unsubscribe(listener);
        assert!(surface.click(lnglat!(1.0, 2.0)).is_none());
    }

    #[test]
    fn fixes_require_tracking() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let fix = LocationFix::new(lnglat!(1.0, 2.0), None);

        widget.subscribe(EventKind::Geolocate).expect("subscribe");
        let control = widget
            .add_geolocate_control(&GeolocateOptions::default())
            .expect("add control");
        assert!(surface.fix(fix).is_none());

        widget.trigger_geolocate(control).expect("trigger");
        assert_matches!(surface.fix(fix), Some(RawMapEvent::Geolocate(_)));

        widget.remove_control(control);
        assert!(surface.fix(fix).is_none());
    }

    #[test]
    fn pin_clicks_target_marker() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        widget.subscribe(EventKind::Click).expect("subscribe");

        let pin = widget
            .add_marker(
                lnglat!(3.0, 4.0),
                &MarkerOptions::new(MarkerKind::Pin, MarkerIcon::default()),
            )
            .expect("add marker");
        let location = widget
            .add_marker(
                lnglat!(5.0, 6.0),
                &MarkerOptions::new(MarkerKind::Location, MarkerIcon::default()),
            )
            .expect("add marker");

        assert_matches!(
            surface.click_marker(pin),
            Some(RawMapEvent::Click { target: ClickTarget::Marker(id), .. }) if id == pin
        );
        assert_matches!(
            surface.click_marker(location),
            Some(RawMapEvent::Click {
                target: ClickTarget::Map,
                ..
            })
        );
        assert!(surface.click_marker(MarkerId::new(999)).is_none());
    }

    #[test]
    fn destroy_records_leftovers() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        widget.subscribe(EventKind::Click).expect("subscribe");
        widget
            .add_marker(
                lnglat!(0.0, 0.0),
                &MarkerOptions::new(MarkerKind::Pin, MarkerIcon::default()),
            )
            .expect("add marker");

        widget.destroy();

        assert_eq!(
            surface.leftovers(),
            Some(Leftovers {
                markers: 1,
                listeners: 1,
                controls: 0
            })
        );
        assert_eq!(surface.marker_count(), 0);
        assert_matches!(
            widget.subscribe(EventKind::Click),
            Err(MapViewError::WidgetDestroyed)
        );
        assert!(surface.click(lnglat!(0.0, 0.0)).is_none());
    }

    #[test]
    fn provider_checks_container() {
        let mut provider = HeadlessProvider::new();
        let options = WidgetOptions::from(&crate::config::MapConfig::new("pk.test"));

        assert_matches!(
            provider.create_widget(String::new(), &options),
            Err(MapViewError::ContainerNotFound(_))
        );
        assert!(provider.create_widget("map".into(), &options).is_ok());
        assert_eq!(provider.surfaces().len(), 1);
    }
}
