//! Mapview is a map view component: an interactive map on which the user can drop and remove pins,
//! and which follows the live location and heading of the user with custom markers.
//!
//! # Quick start
//!
//! ```no_run
//! use mapview::{lnglat, MapConfig, MapHost};
//! use mapview::widget::headless::HeadlessProvider;
//!
//! let config = MapConfig::from_env()
//!     .expect("MAPBOX_API_KEY is not set")
//!     .with_center(lnglat!(-104.9903, 39.7392))
//!     .with_zoom(10.0);
//!
//! let mut host = MapHost::new(HeadlessProvider::new(), config);
//! host.mount("map".to_string()).expect("failed to mount");
//! ```
//!
//! # Main components
//!
//! The view does not render the map itself. It is built on top of a third-party map widget,
//! abstracted by the [`MapWidget`](widget::MapWidget) and [`WidgetProvider`](widget::WidgetProvider)
//! traits. On top of the widget there are:
//!
//! * [`MapHost`], which creates the widget when mounted into a container and releases it with
//!   everything attached to it when unmounted. While mounted, it owns a [`MapSession`].
//! * [`MarkerRegistry`], the ordered list of pins the user placed, and
//! * [`GeolocationTracker`], which keeps at most one location marker and one heading marker in sync
//!   with the fixes of the location-tracking control.
//!
//! The widget reports what happens on the map as [`RawMapEvent`](control::RawMapEvent)s. The host
//! processes them strictly one by one, giving them to a chain of
//! [`handlers`](control::MapEventHandler).

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod config;
pub mod control;
pub mod error;
pub mod geo;
mod host;
pub mod marker;
mod session;
pub mod tracker;
pub mod widget;

pub use config::{AccessToken, GeolocateOptions, MapConfig, MarkerIcons, ACCESS_TOKEN_ENV};
pub use error::MapViewError;
pub use geo::{LngLat, LocationFix};
pub use host::MapHost;
pub use marker::{MarkerRegistry, PinMarker};
pub use session::{MapSession, SessionContext};
pub use tracker::GeolocationTracker;
