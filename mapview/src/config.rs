//! Configuration of the map view.

use serde::{Deserialize, Serialize};

use crate::error::MapViewError;
use crate::geo::LngLat;
use crate::lnglat;
use crate::widget::MarkerIcon;

/// Environment variable [`MapConfig::from_env`] reads the access token from.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_API_KEY";

const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v11";
// Denver, CO
const DEFAULT_CENTER: LngLat = lnglat!(-104.9903, 39.7392);
const DEFAULT_ZOOM: f64 = 10.0;
const MAX_ZOOM: f64 = 22.0;

/// Secret token the widget provider requires to load map styles and tiles.
///
/// The value is opaque to this crate. `Debug` output never contains it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps the token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token value to hand over to the widget provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if no token was given.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "AccessToken(<empty>)")
        } else {
            write!(f, "AccessToken(<redacted>)")
        }
    }
}

/// Icons used for the markers the map view places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerIcons {
    /// Icon of the user-placed pins.
    pub pin: MarkerIcon,
    /// Icon of the current position marker.
    pub location: MarkerIcon,
    /// Icon of the heading marker. It is rotated to the reported heading.
    pub heading: MarkerIcon,
}

impl Default for MarkerIcons {
    fn default() -> Self {
        Self {
            pin: MarkerIcon::default(),
            location: MarkerIcon::image("/icons/location.png", 24, 24),
            heading: MarkerIcon::image("/icons/heading.png", 48, 48),
        }
    }
}

/// Options of the location-tracking control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeolocateOptions {
    /// Add the control and track the location at all.
    pub enabled: bool,
    /// Ask the platform for a high accuracy position.
    pub high_accuracy: bool,
    /// Keep reporting fixes while the user moves instead of a single fix.
    pub track_user_location: bool,
    /// Let the widget control draw its own location dot and heading cone in addition to the
    /// markers of the view.
    pub show_widget_marker: bool,
    /// Start tracking as soon as the map finished loading, without waiting for the user to press
    /// the control button.
    pub trigger_on_load: bool,
}

impl Default for GeolocateOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            high_accuracy: true,
            track_user_location: true,
            show_widget_marker: false,
            trigger_on_load: true,
        }
    }
}

/// Configuration of a [`MapHost`](crate::MapHost).
///
/// ```
/// use mapview::{lnglat, MapConfig};
///
/// let config = MapConfig::new("pk.test")
///     .with_center(lnglat!(-104.0, 39.5))
///     .with_zoom(12.0);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default)]
    access_token: AccessToken,
    #[serde(default = "default_style")]
    style: String,
    #[serde(default = "default_center")]
    center: LngLat,
    #[serde(default = "default_zoom")]
    zoom: f64,
    #[serde(default)]
    icons: MarkerIcons,
    #[serde(default)]
    geolocate: GeolocateOptions,
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_center() -> LngLat {
    DEFAULT_CENTER
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

impl MapConfig {
    /// Creates a configuration with the given access token and default values for everything else.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            style: default_style(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            icons: MarkerIcons::default(),
            geolocate: GeolocateOptions::default(),
        }
    }

    /// Creates a configuration with the access token taken from the [`ACCESS_TOKEN_ENV`]
    /// environment variable.
    pub fn from_env() -> Result<Self, MapViewError> {
        let token =
            std::env::var(ACCESS_TOKEN_ENV).map_err(|_| MapViewError::MissingAccessToken)?;
        let config = Self::new(token);
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration. Missing fields get their default values.
    pub fn from_json(json: &str) -> Result<Self, MapViewError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can be used to create a widget.
    pub fn validate(&self) -> Result<(), MapViewError> {
        if self.access_token.is_empty() {
            return Err(MapViewError::MissingAccessToken);
        }

        if self.style.trim().is_empty() {
            return Err(MapViewError::InvalidConfig("map style is empty".into()));
        }

        if !self.center.is_valid() {
            return Err(MapViewError::InvalidConfig(format!(
                "invalid map center {:?}",
                self.center
            )));
        }

        if !(0.0..=MAX_ZOOM).contains(&self.zoom) {
            return Err(MapViewError::InvalidConfig(format!(
                "zoom {} is out of range [0, {MAX_ZOOM}]",
                self.zoom
            )));
        }

        Ok(())
    }

    /// Replaces the access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = AccessToken::new(access_token);
        self
    }

    /// Sets the map style identifier.
    ///
    /// Defaults to `mapbox://styles/mapbox/streets-v11`.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Sets the initial center of the map.
    ///
    /// Defaults to Denver, CO.
    pub fn with_center(mut self, center: LngLat) -> Self {
        self.center = center;
        self
    }

    /// Sets the initial zoom level. Defaults to `10`.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Sets the marker icons.
    pub fn with_icons(mut self, icons: MarkerIcons) -> Self {
        self.icons = icons;
        self
    }

    /// Sets the options of the location-tracking control.
    pub fn with_geolocate(mut self, geolocate: GeolocateOptions) -> Self {
        self.geolocate = geolocate;
        self
    }

    /// Access token.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Map style identifier.
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Initial center of the map.
    pub fn center(&self) -> LngLat {
        self.center
    }

    /// Initial zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Marker icons.
    pub fn icons(&self) -> &MarkerIcons {
        &self.icons
    }

    /// Options of the location-tracking control.
    pub fn geolocate(&self) -> &GeolocateOptions {
        &self.geolocate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let config = MapConfig::new("pk.test");
        assert_eq!(config.style(), DEFAULT_STYLE);
        assert_abs_diff_eq!(config.center(), lnglat!(-104.9903, 39.7392));
        assert_eq!(config.zoom(), 10.0);
        assert!(config.geolocate().enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_token() {
        assert_matches!(
            MapConfig::new("").validate(),
            Err(MapViewError::MissingAccessToken)
        );
        assert_matches!(
            MapConfig::new("   ").validate(),
            Err(MapViewError::MissingAccessToken)
        );
        assert_matches!(
            MapConfig::from_json("{}"),
            Err(MapViewError::MissingAccessToken)
        );
    }

    #[test]
    fn invalid_values() {
        assert_matches!(
            MapConfig::new("pk.test").with_zoom(23.0).validate(),
            Err(MapViewError::InvalidConfig(_))
        );
        assert_matches!(
            MapConfig::new("pk.test")
                .with_center(lnglat!(0.0, 100.0))
                .validate(),
            Err(MapViewError::InvalidConfig(_))
        );
        assert_matches!(
            MapConfig::new("pk.test").with_style("").validate(),
            Err(MapViewError::InvalidConfig(_))
        );
    }

    #[test]
    fn from_json() {
        let config = MapConfig::from_json(
            r#"{
                "accessToken": "pk.test",
                "center": { "lng": 13.4, "lat": 52.5 },
                "zoom": 14,
                "geolocate": { "triggerOnLoad": false }
            }"#,
        )
        .expect("failed to parse");

        assert_eq!(config.access_token().as_str(), "pk.test");
        assert_abs_diff_eq!(config.center(), lnglat!(13.4, 52.5));
        assert_eq!(config.zoom(), 14.0);
        assert_eq!(config.style(), DEFAULT_STYLE);
        assert!(!config.geolocate().trigger_on_load);
        assert!(config.geolocate().high_accuracy);
        assert_eq!(config.icons(), &MarkerIcons::default());

        assert_matches!(
            MapConfig::from_json("not json"),
            Err(MapViewError::ConfigParse(_))
        );
    }

    #[test]
    fn token_is_not_printed() {
        let config = MapConfig::new("pk.secret-value");
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-value"));
    }
}
