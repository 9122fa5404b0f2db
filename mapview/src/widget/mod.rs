//! Interface of the third-party map widget the view is built on.
//!
//! The map view never talks to a concrete mapping library. Instead, a [`WidgetProvider`] creates
//! a [`MapWidget`] bound to a container, and the widget exposes the small set of operations the
//! view needs: marker management, event subscriptions and the location-tracking control.
//!
//! Events are not delivered through the widget trait. A widget implementation converts events of
//! the underlying library into [`RawMapEvent`](crate::control::RawMapEvent)s and hands them to
//! the owner of the [`MapHost`](crate::MapHost), which processes them one by one in the order of
//! arrival.

use serde::{Deserialize, Serialize};

use crate::config::{AccessToken, GeolocateOptions, MapConfig};
use crate::error::MapViewError;
use crate::geo::LngLat;

pub mod headless;

/// Handle of a marker attached to a widget.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

impl MarkerId {
    /// Creates an id from the raw value assigned by the widget.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of the id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Handle of an event subscription on a widget.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates an id from the raw value assigned by the widget.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of the id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Handle of a control (e.g. the location-tracking button) added to a widget.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(u64);

impl ControlId {
    /// Creates an id from the raw value assigned by the widget.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of the id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Kinds of widget events the view subscribes to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Click on the map surface or on a marker.
    Click,
    /// Map style finished loading.
    Load,
    /// New fix from the location-tracking control.
    Geolocate,
    /// Failure of the location-tracking control.
    GeolocateError,
}

/// Visual element of a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MarkerIcon {
    /// Built-in marker of the widget.
    Default {
        /// CSS color of the marker. The widget's default color is used if not set.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Image served by the asset host.
    Image {
        /// Static path or URL of the image.
        url: String,
        /// Width of the icon in pixels.
        width: u32,
        /// Height of the icon in pixels.
        height: u32,
    },
}

impl MarkerIcon {
    /// Image icon.
    pub fn image(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self::Image {
            url: url.into(),
            width,
            height,
        }
    }
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self::Default { color: None }
    }
}

/// Role of a marker. Widgets use it to decide how the marker reacts to the pointer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// User-placed pin. Clicks on it are reported as marker clicks and must not reach the map.
    Pin,
    /// Current position of the user.
    Location,
    /// Direction of travel of the user. Rotated with the map.
    Heading,
}

/// Parameters of a new marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    /// Role of the marker.
    pub kind: MarkerKind,
    /// Visual element.
    pub icon: MarkerIcon,
    /// Rotation in degrees clockwise.
    pub rotation: f64,
}

impl MarkerOptions {
    /// Options of a non-rotated marker.
    pub fn new(kind: MarkerKind, icon: MarkerIcon) -> Self {
        Self {
            kind,
            icon,
            rotation: 0.0,
        }
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Parameters the widget is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOptions {
    /// Token of the widget provider.
    pub access_token: AccessToken,
    /// Map style identifier.
    pub style: String,
    /// Initial center.
    pub center: LngLat,
    /// Initial zoom level.
    pub zoom: f64,
}

impl From<&MapConfig> for WidgetOptions {
    fn from(config: &MapConfig) -> Self {
        Self {
            access_token: config.access_token().clone(),
            style: config.style().to_string(),
            center: config.center(),
            zoom: config.zoom(),
        }
    }
}

/// Creates widgets scoped to containers.
pub trait WidgetProvider {
    /// Handle of the place the widget renders into.
    type Container;
    /// Widget type created by the provider.
    type Widget: MapWidget;

    /// Creates a new widget inside the container.
    fn create_widget(
        &mut self,
        container: Self::Container,
        options: &WidgetOptions,
    ) -> Result<Self::Widget, MapViewError>;
}

/// Live instance of a map widget.
///
/// Removing handles that the widget does not know (already removed or never created) must be a
/// no-op.
pub trait MapWidget {
    /// Creates a marker and attaches it to the map at the given position.
    fn add_marker(
        &mut self,
        position: LngLat,
        options: &MarkerOptions,
    ) -> Result<MarkerId, MapViewError>;

    /// Moves an existing marker.
    fn set_marker_position(&mut self, marker: MarkerId, position: LngLat);

    /// Rotates an existing marker.
    fn set_marker_rotation(&mut self, marker: MarkerId, rotation: f64);

    /// Detaches the marker from the map and releases its visual element.
    fn remove_marker(&mut self, marker: MarkerId);

    /// Starts delivering events of the given kind.
    fn subscribe(&mut self, kind: EventKind) -> Result<ListenerId, MapViewError>;

    /// Stops delivering events for the subscription.
    fn unsubscribe(&mut self, listener: ListenerId);

    /// Adds the location-tracking control.
    fn add_geolocate_control(
        &mut self,
        options: &GeolocateOptions,
    ) -> Result<ControlId, MapViewError>;

    /// Starts tracking the location with the control, as if the user pressed its button.
    fn trigger_geolocate(&mut self, control: ControlId) -> Result<(), MapViewError>;

    /// Removes a control from the map.
    fn remove_control(&mut self, control: ControlId);

    /// Releases the widget and everything attached to it.
    ///
    /// The widget must not be used after this call.
    fn destroy(&mut self);
}
