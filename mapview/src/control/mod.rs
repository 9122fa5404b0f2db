//! This module contains traits and structs that make the map view react to the widget events.
//!
//! Event handling is done in several steps:
//! 1. The widget converts events of the underlying mapping library into [`RawMapEvent`]s and
//!    gives them to the [`MapHost`](crate::MapHost).
//! 2. The host gives every raw event to the [`EventProcessor`], which turns it into one or more
//!    [`MapEvent`]s. For example, a click on a pin becomes a [`MapEvent::MarkerClick`], followed by
//!    a [`MapEvent::Click`] on the map below it, unless a handler stops it.
//! 3. `EventProcessor` has a list of [`MapEventHandler`]s, which change the state of the session
//!    through the [`SessionContext`].
//!
//! Default handlers ([`ClickToPin`] and [`GeolocateHandler`]) are added by the host. Custom logic
//! can be added with [`MapHost::add_handler`](crate::MapHost::add_handler).

use crate::geo::{GeolocationError, LngLat, LocationFix};
use crate::session::SessionContext;
use crate::widget::MarkerId;

mod event_processor;
mod geolocate;
mod pins;

pub use event_processor::EventProcessor;
pub use geolocate::GeolocateHandler;
pub use pins::ClickToPin;

/// Map event handler.
pub trait MapEventHandler {
    /// Handle the event.
    fn handle(&mut self, event: &MapEvent, ctx: &mut SessionContext<'_>) -> EventPropagation;
}

impl<T> MapEventHandler for T
where
    T: FnMut(&MapEvent, &mut SessionContext<'_>) -> EventPropagation,
{
    fn handle(&mut self, event: &MapEvent, ctx: &mut SessionContext<'_>) -> EventPropagation {
        self(event, ctx)
    }
}

/// Element a click landed on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// Map surface.
    Map,
    /// Marker placed on the map.
    Marker(MarkerId),
}

/// Event as reported by the widget. Converted into [`MapEvent`]s by the [`EventProcessor`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawMapEvent {
    /// Pointer click.
    Click {
        /// Geographic position of the click. For marker clicks this is the position of the marker.
        position: LngLat,
        /// Element that received the click.
        target: ClickTarget,
    },
    /// Map style finished loading.
    Load,
    /// New fix from the location-tracking control.
    Geolocate(LocationFix),
    /// Location-tracking control failed.
    GeolocateError(GeolocationError),
}

/// Map event. This is the main type that the handlers work with.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map surface was clicked at the given position.
    Click(LngLat),
    /// A marker was clicked. If no handler stops this event, it is followed by
    /// [`MapEvent::Click`] at the marker position.
    MarkerClick(MarkerId, LngLat),
    /// Map style finished loading.
    Load,
    /// New fix from the location-tracking control.
    Geolocate(LocationFix),
    /// Location-tracking control failed.
    GeolocateError(GeolocationError),
}

/// Value returned by a [`MapEventHandler`] to indicate the status of the event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventPropagation {
    /// Event should be propagated to the next handler.
    Propagate,
    /// Event should not be propagated to the next handler. A stopped marker click also does not
    /// reach the map.
    Stop,
}
