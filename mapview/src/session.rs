use crate::config::{GeolocateOptions, MapConfig, MarkerIcons};
use crate::error::MapViewError;
use crate::geo::{GeolocationError, LngLat, LocationFix};
use crate::marker::MarkerRegistry;
use crate::tracker::GeolocationTracker;
use crate::widget::{ControlId, EventKind, ListenerId, MapWidget, MarkerId};

/// State of a mounted map: the widget together with everything the view attached to it.
///
/// A session is created by [`MapHost::mount`](crate::MapHost::mount) and lives until
/// [`MapHost::unmount`](crate::MapHost::unmount). It owns the widget exclusively; all markers,
/// subscriptions and controls it creates are released by [`MapSession::teardown`].
pub struct MapSession<W: MapWidget> {
    widget: W,
    pins: MarkerRegistry,
    tracker: GeolocationTracker,
    icons: MarkerIcons,
    geolocate: GeolocateOptions,
    listeners: Vec<ListenerId>,
    geolocate_control: Option<ControlId>,
}

impl<W: MapWidget> MapSession<W> {
    /// Attaches the view to the widget: subscribes to the widget events and adds the
    /// location-tracking control.
    ///
    /// If any step fails, whatever was already attached is released and the widget is destroyed.
    pub fn start(widget: W, config: &MapConfig) -> Result<Self, MapViewError> {
        let mut session = Self {
            widget,
            pins: MarkerRegistry::new(),
            tracker: GeolocationTracker::new(),
            icons: config.icons().clone(),
            geolocate: *config.geolocate(),
            listeners: vec![],
            geolocate_control: None,
        };

        if let Err(err) = session.attach() {
            log::error!("Failed to attach map view to the widget: {err}");
            session.teardown();
            return Err(err);
        }

        Ok(session)
    }

    fn attach(&mut self) -> Result<(), MapViewError> {
        self.listen(EventKind::Click)?;

        if self.geolocate.enabled {
            // Location events are emitted by the control, so it goes first.
            self.geolocate_control = Some(self.widget.add_geolocate_control(&self.geolocate)?);
            self.listen(EventKind::Load)?;
            self.listen(EventKind::Geolocate)?;
            self.listen(EventKind::GeolocateError)?;
        }

        log::debug!(
            "Map session started with {} listeners, geolocation {}",
            self.listeners.len(),
            if self.geolocate.enabled { "on" } else { "off" }
        );

        Ok(())
    }

    fn listen(&mut self, kind: EventKind) -> Result<(), MapViewError> {
        let listener = self.widget.subscribe(kind)?;
        self.listeners.push(listener);
        Ok(())
    }

    /// Releases the widget and everything the session attached to it.
    ///
    /// Subscriptions are detached first, so no event can reach the session while markers and
    /// controls are being removed.
    pub fn teardown(mut self) {
        for listener in self.listeners.drain(..) {
            self.widget.unsubscribe(listener);
        }

        if let Some(control) = self.geolocate_control.take() {
            self.widget.remove_control(control);
        }

        let pins = self.pins.clear(&mut self.widget);
        self.tracker.clear(&mut self.widget);
        self.widget.destroy();

        log::debug!("Map session torn down, {pins} pins released");
    }

    /// Returns the context handlers operate on.
    pub fn context(&mut self) -> SessionContext<'_> {
        SessionContext {
            widget: &mut self.widget,
            pins: &mut self.pins,
            tracker: &mut self.tracker,
            icons: &self.icons,
            geolocate_control: self.geolocate_control,
            trigger_on_load: self.geolocate.trigger_on_load,
        }
    }

    /// Removes all pins. Returns the number of removed pins.
    pub fn clear_pins(&mut self) -> usize {
        self.pins.clear(&mut self.widget)
    }

    /// User-placed pins.
    pub fn pins(&self) -> &MarkerRegistry {
        &self.pins
    }

    /// Location and heading markers.
    pub fn tracker(&self) -> &GeolocationTracker {
        &self.tracker
    }

    /// The widget.
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Number of active subscriptions created by the session.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Part of the session state given to the [`MapEventHandler`](crate::control::MapEventHandler)s.
///
/// The fields are public so that a handler can borrow several of them at once, e.g. the widget and
/// the registry.
pub struct SessionContext<'a> {
    /// The widget.
    pub widget: &'a mut dyn MapWidget,
    /// User-placed pins.
    pub pins: &'a mut MarkerRegistry,
    /// Location and heading markers.
    pub tracker: &'a mut GeolocationTracker,
    /// Icons for new markers.
    pub icons: &'a MarkerIcons,
    /// The location-tracking control, if geolocation is enabled.
    pub geolocate_control: Option<ControlId>,
    /// Start tracking once the map is loaded.
    pub trigger_on_load: bool,
}

impl SessionContext<'_> {
    /// Places a new pin.
    pub fn place_pin(&mut self, position: LngLat) -> Result<MarkerId, MapViewError> {
        self.pins.place(&mut *self.widget, position, &self.icons.pin)
    }

    /// Removes a pin. Returns true if the pin existed.
    pub fn remove_pin(&mut self, pin: MarkerId) -> bool {
        self.pins.remove(&mut *self.widget, pin).is_some()
    }

    /// Applies a location fix to the tracker markers.
    pub fn apply_fix(&mut self, fix: &LocationFix) -> Result<(), MapViewError> {
        self.tracker.apply_fix(&mut *self.widget, self.icons, fix)
    }

    /// Reports a location-tracking failure to the tracker.
    pub fn geolocate_failed(&mut self, error: &GeolocationError) {
        self.tracker.handle_error(error)
    }

    /// Starts location tracking.
    pub fn trigger_geolocate(&mut self) -> Result<(), MapViewError> {
        match self.geolocate_control {
            Some(control) => self.widget.trigger_geolocate(control),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lnglat;
    use crate::widget::headless::{HeadlessWidget, Leftovers};

    #[test]
    fn start_subscribes() {
        let widget = HeadlessWidget::default();
        let surface = widget.surface();

        let session = MapSession::start(widget, &MapConfig::new("pk.test")).expect("start");
        assert_eq!(session.listener_count(), 4);
        assert_eq!(surface.listener_count(), 4);
        assert_eq!(session.widget().surface().control_count(), 1);
        assert_eq!(surface.control_count(), 1);
    }

    #[test]
    fn start_without_geolocation() {
        let widget = HeadlessWidget::default();
        let surface = widget.surface();
        let config = MapConfig::new("pk.test").with_geolocate(GeolocateOptions {
            enabled: false,
            ..Default::default()
        });

        let session = MapSession::start(widget, &config).expect("start");
        assert_eq!(session.listener_count(), 1);
        assert_eq!(surface.control_count(), 0);
    }

    #[test]
    fn failed_start_releases_widget() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        widget.destroy();

        assert!(MapSession::start(widget, &MapConfig::new("pk.test")).is_err());
        assert!(surface.is_destroyed());
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn teardown_releases_everything() {
        let widget = HeadlessWidget::default();
        let surface = widget.surface();
        let mut session = MapSession::start(widget, &MapConfig::new("pk.test")).expect("start");

        {
            let mut ctx = session.context();
            ctx.place_pin(lnglat!(1.0, 1.0)).expect("place");
            ctx.place_pin(lnglat!(2.0, 2.0)).expect("place");
            ctx.apply_fix(&LocationFix::new(lnglat!(3.0, 3.0), Some(10.0)))
                .expect("fix");
        }
        assert_eq!(surface.marker_count(), 4);

        session.teardown();

        assert!(surface.is_destroyed());
        assert_eq!(surface.leftovers(), Some(Leftovers::default()));
        assert_eq!(surface.marker_count(), 0);
        assert_eq!(surface.listener_count(), 0);
    }
}
