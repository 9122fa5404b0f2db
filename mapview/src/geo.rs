//! Geographic primitives exchanged with the map widget.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees, longitude first (the order used by web map widgets).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct LngLat {
    lng: f64,
    lat: f64,
}

impl LngLat {
    /// Creates a new coordinate from longitude and latitude values (in degrees).
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns true if both values are finite and the latitude is inside `[-90, 90]`.
    ///
    /// Longitude is not range-checked: widgets wrap it around the antimeridian.
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self::new(lng, lat)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}

impl AbsDiffEq for LngLat {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.lng.abs_diff_eq(&other.lng, epsilon) && self.lat.abs_diff_eq(&other.lat, epsilon)
    }
}

/// Creates a new [`LngLat`] from longitude and latitude values (in degrees).
///
/// ```
/// use mapview::lnglat;
///
/// let denver = lnglat!(-104.9903, 39.7392);
/// assert_eq!(denver.lat(), 39.7392);
/// ```
#[macro_export]
macro_rules! lnglat {
    ($lng:expr, $lat:expr) => {
        $crate::geo::LngLat::new($lng, $lat)
    };
}

/// One geolocation sample reported by the location-tracking control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    position: LngLat,
    heading: Option<f64>,
}

impl LocationFix {
    /// Creates a new fix.
    ///
    /// Browsers report `NaN` heading when the device is stationary, so any non-finite heading is
    /// stored as no heading. Finite headings are normalized into `[0, 360)`.
    pub fn new(position: LngLat, heading: Option<f64>) -> Self {
        let heading = heading
            .filter(|h| h.is_finite())
            .map(|h| h.rem_euclid(360.0));
        Self { position, heading }
    }

    /// Reported position.
    pub fn position(&self) -> LngLat {
        self.position
    }

    /// Direction of travel in degrees clockwise from true north, if the platform reported one.
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }
}

/// Failure reported by the location-tracking control instead of a fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeolocationError {
    /// Kind of the failure.
    pub code: GeolocationErrorCode,
    /// Human-readable message from the platform.
    pub message: String,
}

/// Codes of the platform geolocation API.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GeolocationErrorCode {
    /// User refused to share the location.
    PermissionDenied,
    /// Position could not be determined.
    PositionUnavailable,
    /// No fix arrived in time.
    Timeout,
    /// Code not known to this crate.
    Unknown,
}

impl From<u16> for GeolocationErrorCode {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}
