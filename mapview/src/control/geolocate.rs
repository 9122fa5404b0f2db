use crate::control::{EventPropagation, MapEvent, MapEventHandler};
use crate::session::SessionContext;

/// Feeds the location-tracking events into the [`GeolocationTracker`](crate::GeolocationTracker)
/// and starts tracking once the map is loaded.
#[derive(Debug, Default)]
pub struct GeolocateHandler {}

impl MapEventHandler for GeolocateHandler {
    fn handle(&mut self, event: &MapEvent, ctx: &mut SessionContext<'_>) -> EventPropagation {
        match event {
            MapEvent::Load => {
                if ctx.trigger_on_load {
                    if let Err(err) = ctx.trigger_geolocate() {
                        log::error!("Failed to start location tracking: {err}");
                    }
                }

                EventPropagation::Propagate
            }
            MapEvent::Geolocate(fix) => {
                if !fix.position().is_valid() {
                    log::warn!("Ignoring fix at invalid position {:?}", fix.position());
                    return EventPropagation::Stop;
                }

                if let Err(err) = ctx.apply_fix(fix) {
                    log::error!("Failed to show location {:?}: {err}", fix.position());
                }

                EventPropagation::Stop
            }
            MapEvent::GeolocateError(error) => {
                ctx.geolocate_failed(error);
                EventPropagation::Stop
            }
            _ => EventPropagation::Propagate,
        }
    }
}
