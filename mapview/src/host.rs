use crate::config::MapConfig;
use crate::control::{ClickToPin, EventProcessor, GeolocateHandler, MapEventHandler, RawMapEvent};
use crate::error::MapViewError;
use crate::session::MapSession;
use crate::widget::{WidgetOptions, WidgetProvider};

/// Map view component: owns the widget while mounted and routes widget events to the handlers.
///
/// ```
/// use mapview::{lnglat, MapConfig, MapHost};
/// use mapview::widget::headless::HeadlessProvider;
///
/// let mut host = MapHost::new(HeadlessProvider::new(), MapConfig::new("pk.test"));
/// host.mount("map".to_string()).unwrap();
///
/// let surface = host.provider().last_surface().unwrap().clone();
/// host.dispatch(surface.click(lnglat!(-104.0, 39.5)).unwrap());
/// assert_eq!(host.session().unwrap().pins().len(), 1);
///
/// host.unmount();
/// assert!(surface.is_destroyed());
/// ```
pub struct MapHost<P: WidgetProvider> {
    provider: P,
    config: MapConfig,
    event_processor: EventProcessor,
    session: Option<MapSession<P::Widget>>,
}

impl<P: WidgetProvider> MapHost<P> {
    /// Creates an unmounted host with the default handlers.
    pub fn new(provider: P, config: MapConfig) -> Self {
        let mut event_processor = EventProcessor::default();
        event_processor.add_handler(ClickToPin::default());
        event_processor.add_handler(GeolocateHandler::default());

        Self {
            provider,
            config,
            event_processor,
            session: None,
        }
    }

    /// Adds a handler after the default ones. Handlers survive remounting.
    pub fn add_handler(&mut self, handler: impl MapEventHandler + 'static) {
        self.event_processor.add_handler(handler);
    }

    /// Creates the widget in the container and starts a new session.
    ///
    /// If the host is already mounted, the previous session is torn down first.
    pub fn mount(&mut self, container: P::Container) -> Result<(), MapViewError> {
        if self.session.is_some() {
            log::debug!("Map is already mounted, tearing down the previous session");
            self.unmount();
        }

        self.config.validate()?;

        let options = WidgetOptions::from(&self.config);
        let widget = self.provider.create_widget(container, &options)?;
        self.session = Some(MapSession::start(widget, &self.config)?);

        log::info!(
            "Map mounted at {:?}, zoom {}",
            self.config.center(),
            self.config.zoom()
        );
        Ok(())
    }

    /// Tears down the session. Does nothing if the host is not mounted.
    pub fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown();
            log::info!("Map unmounted");
        }
    }

    /// Processes an event reported by the widget.
    ///
    /// Events that arrive when the host is not mounted are dropped.
    pub fn dispatch(&mut self, event: RawMapEvent) {
        let Some(session) = &mut self.session else {
            log::warn!("Map is not mounted, dropping event {event:?}");
            return;
        };

        self.event_processor.handle(event, &mut session.context());
    }

    /// Removes all user-placed pins. Returns the number of removed pins.
    pub fn clear_pins(&mut self) -> usize {
        self.session
            .as_mut()
            .map(|session| session.clear_pins())
            .unwrap_or_default()
    }

    /// Returns true if the host has a live session.
    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    /// Current session.
    pub fn session(&self) -> Option<&MapSession<P::Widget>> {
        self.session.as_ref()
    }

    /// Widget provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Configuration the widgets are created with.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }
}

impl<P: WidgetProvider> Drop for MapHost<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}
