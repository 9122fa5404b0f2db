//! Markers placed by the map view.
//!
//! There are two families of markers:
//! * [`PinMarker`]s are placed and removed by the user. They are kept in the [`MarkerRegistry`].
//! * [`LocationMarker`] and [`HeadingMarker`] show the live location of the user. There is at
//!   most one of each per session, and they are owned by the
//!   [`GeolocationTracker`](crate::tracker::GeolocationTracker).

use crate::geo::LngLat;
use crate::widget::MarkerId;

mod registry;

pub use registry::MarkerRegistry;

/// Marker placed by the user with a click on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinMarker {
    id: MarkerId,
    position: LngLat,
}

impl PinMarker {
    pub(crate) fn new(id: MarkerId, position: LngLat) -> Self {
        Self { id, position }
    }

    /// Handle of the visual element of the pin.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Coordinate the pin is anchored at.
    pub fn position(&self) -> LngLat {
        self.position
    }
}

/// Marker showing the last known position of the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationMarker {
    pub(crate) id: MarkerId,
    pub(crate) position: LngLat,
}

impl LocationMarker {
    /// Handle of the visual element.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Last known position.
    pub fn position(&self) -> LngLat {
        self.position
    }
}

/// Marker showing the direction of travel of the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingMarker {
    pub(crate) id: MarkerId,
    pub(crate) position: LngLat,
    pub(crate) rotation: f64,
}

impl HeadingMarker {
    /// Handle of the visual element.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Last known position.
    pub fn position(&self) -> LngLat {
        self.position
    }

    /// Last known heading in degrees clockwise from north.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}
