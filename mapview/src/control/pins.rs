use crate::control::{EventPropagation, MapEvent, MapEventHandler};
use crate::session::SessionContext;

/// Places a pin at every map click and removes a pin when it is clicked.
///
/// Marker clicks are always stopped, so a click on a pin does not reach the map and does not place
/// a new pin at the same position.
#[derive(Debug, Default)]
pub struct ClickToPin {}

impl MapEventHandler for ClickToPin {
    fn handle(&mut self, event: &MapEvent, ctx: &mut SessionContext<'_>) -> EventPropagation {
        match event {
            MapEvent::MarkerClick(marker, _) => {
                if !ctx.remove_pin(*marker) {
                    log::debug!("Click on marker {marker:?} which is not a pin");
                }

                EventPropagation::Stop
            }
            MapEvent::Click(position) => {
                if !position.is_valid() {
                    log::warn!("Ignoring click at invalid position {position:?}");
                    return EventPropagation::Stop;
                }

                if let Err(err) = ctx.place_pin(*position) {
                    log::error!("Failed to place a pin at {position:?}: {err}");
                }

                EventPropagation::Stop
            }
            _ => EventPropagation::Propagate,
        }
    }
}
