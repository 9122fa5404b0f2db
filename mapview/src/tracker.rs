//! Live location of the user on the map.

use crate::config::MarkerIcons;
use crate::error::MapViewError;
use crate::geo::{GeolocationError, LocationFix};
use crate::marker::{HeadingMarker, LocationMarker};
use crate::widget::{MapWidget, MarkerKind, MarkerOptions};

/// Keeps the location and heading markers in sync with the fixes reported by the
/// location-tracking control.
///
/// Both markers are created lazily and then updated in place:
/// * the location marker appears with the first fix and follows every later fix;
/// * the heading marker appears with the first fix that has a heading. Later fixes always move it,
///   but rotate it only if they have a heading themselves.
#[derive(Debug, Default)]
pub struct GeolocationTracker {
    location: Option<LocationMarker>,
    heading: Option<HeadingMarker>,
    fix_count: u64,
    error_count: u64,
}

impl GeolocationTracker {
    /// Creates a tracker with no markers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a new fix to the markers.
    pub fn apply_fix(
        &mut self,
        widget: &mut dyn MapWidget,
        icons: &MarkerIcons,
        fix: &LocationFix,
    ) -> Result<(), MapViewError> {
        let position = fix.position();
        self.fix_count += 1;

        if let Some(marker) = &mut self.location {
            marker.position = position;
            widget.set_marker_position(marker.id, position);
        } else {
            let options = MarkerOptions::new(MarkerKind::Location, icons.location.clone());
            let id = widget.add_marker(position, &options)?;
            log::debug!("Location marker {id:?} created at {position:?}");
            self.location = Some(LocationMarker { id, position });
        }

        if let Some(marker) = &mut self.heading {
            marker.position = position;
            widget.set_marker_position(marker.id, position);

            if let Some(rotation) = fix.heading() {
                marker.rotation = rotation;
                widget.set_marker_rotation(marker.id, rotation);
            }
        } else if let Some(rotation) = fix.heading() {
            let options = MarkerOptions::new(MarkerKind::Heading, icons.heading.clone())
                .with_rotation(rotation);
            let id = widget.add_marker(position, &options)?;
            log::debug!("Heading marker {id:?} created at {position:?}, rotation {rotation}");
            self.heading = Some(HeadingMarker {
                id,
                position,
                rotation,
            });
        }

        Ok(())
    }

    /// Handles a failure of the location-tracking control.
    ///
    /// Markers keep showing the last known location.
    pub fn handle_error(&mut self, error: &GeolocationError) {
        self.error_count += 1;
        log::warn!("Geolocation failed: {error}");
    }

    /// Removes both markers from the widget.
    pub fn clear(&mut self, widget: &mut dyn MapWidget) {
        if let Some(marker) = self.location.take() {
            widget.remove_marker(marker.id);
        }

        if let Some(marker) = self.heading.take() {
            widget.remove_marker(marker.id);
        }
    }

    /// Marker of the current position, if any fix was received.
    pub fn location(&self) -> Option<&LocationMarker> {
        self.location.as_ref()
    }

    /// Marker of the current heading, if any fix with heading was received.
    pub fn heading(&self) -> Option<&HeadingMarker> {
        self.heading.as_ref()
    }

    /// Number of fixes applied.
    pub fn fix_count(&self) -> u64 {
        self.fix_count
    }

    /// Number of failures reported by the location-tracking control.
    pub fn error_count(&self) -> u64 {
        self.error_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeolocationErrorCode;
    use crate::lnglat;
    use crate::widget::headless::HeadlessWidget;
    use approx::assert_abs_diff_eq;

    #[test]
    fn markers_are_updated_in_place() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let icons = MarkerIcons::default();
        let mut tracker = GeolocationTracker::new();

        tracker
            .apply_fix(&mut widget, &icons, &LocationFix::new(lnglat!(1.0, 1.0), None))
            .expect("apply");
        assert!(tracker.heading().is_none());
        assert_eq!(surface.markers_of_kind(MarkerKind::Location).len(), 1);
        assert!(surface.markers_of_kind(MarkerKind::Heading).is_empty());
        let location_id = tracker.location().expect("no location").id();

        tracker
            .apply_fix(
                &mut widget,
                &icons,
                &LocationFix::new(lnglat!(2.0, 2.0), Some(45.0)),
            )
            .expect("apply");
        let heading_id = tracker.heading().expect("no heading").id();
        assert_eq!(surface.markers_of_kind(MarkerKind::Heading).len(), 1);

        tracker
            .apply_fix(&mut widget, &icons, &LocationFix::new(lnglat!(3.0, 3.0), None))
            .expect("apply");

        let location = tracker.location().expect("no location");
        assert_eq!(location.id(), location_id);
        assert_abs_diff_eq!(location.position(), lnglat!(3.0, 3.0));

        let heading = tracker.heading().expect("no heading");
        assert_eq!(heading.id(), heading_id);
        assert_abs_diff_eq!(heading.position(), lnglat!(3.0, 3.0));
        assert_abs_diff_eq!(heading.rotation(), 45.0);

        let drawn = surface.marker(heading_id).expect("not drawn");
        assert_abs_diff_eq!(drawn.position, lnglat!(3.0, 3.0));
        assert_abs_diff_eq!(drawn.options.rotation, 45.0);
        assert_eq!(surface.markers_of_kind(MarkerKind::Location).len(), 1);
        assert_eq!(surface.markers_of_kind(MarkerKind::Heading).len(), 1);
        assert_eq!(tracker.fix_count(), 3);
    }

    #[test]
    fn heading_is_rotated_by_later_fixes() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let icons = MarkerIcons::default();
        let mut tracker = GeolocationTracker::new();

        for heading in [10.0, 20.0, 370.0] {
            tracker
                .apply_fix(
                    &mut widget,
                    &icons,
                    &LocationFix::new(lnglat!(0.0, 0.0), Some(heading)),
                )
                .expect("apply");
        }

        let heading = tracker.heading().expect("no heading");
        assert_abs_diff_eq!(heading.rotation(), 10.0, epsilon = 1e-9);
        let drawn = surface.marker(heading.id()).expect("not drawn");
        assert_abs_diff_eq!(drawn.options.rotation, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn error_keeps_markers() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let mut tracker = GeolocationTracker::new();

        tracker
            .apply_fix(
                &mut widget,
                &MarkerIcons::default(),
                &LocationFix::new(lnglat!(1.0, 1.0), Some(90.0)),
            )
            .expect("apply");
        tracker.handle_error(&GeolocationError {
            code: GeolocationErrorCode::PositionUnavailable,
            message: "no signal".into(),
        });

        assert!(tracker.location().is_some());
        assert!(tracker.heading().is_some());
        assert_eq!(surface.marker_count(), 2);
        assert_eq!(tracker.error_count(), 1);
    }

    #[test]
    fn clear_removes_both_markers() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let mut tracker = GeolocationTracker::new();

        tracker
            .apply_fix(
                &mut widget,
                &MarkerIcons::default(),
                &LocationFix::new(lnglat!(1.0, 1.0), Some(90.0)),
            )
            .expect("apply");
        tracker.clear(&mut widget);

        assert!(tracker.location().is_none());
        assert!(tracker.heading().is_none());
        assert_eq!(surface.marker_count(), 0);

        tracker.clear(&mut widget);
        assert_eq!(surface.marker_count(), 0);
    }
}
