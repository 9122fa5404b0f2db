use crate::control::{ClickTarget, EventPropagation, MapEvent, MapEventHandler, RawMapEvent};
use crate::session::SessionContext;

/// Converts [`RawMapEvent`]s into [`MapEvent`]s and gives them to the handlers in the order the
/// handlers were added.
#[derive(Default)]
pub struct EventProcessor {
    handlers: Vec<Box<dyn MapEventHandler>>,
}

impl EventProcessor {
    /// Adds a handler to the end of the handler list.
    pub fn add_handler(&mut self, handler: impl MapEventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Number of handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Processes one raw event.
    pub fn handle(&mut self, event: RawMapEvent, ctx: &mut SessionContext<'_>) {
        match event {
            RawMapEvent::Click {
                position,
                target: ClickTarget::Marker(marker),
            } => {
                if self.dispatch(&MapEvent::MarkerClick(marker, position), ctx)
                    == EventPropagation::Stop
                {
                    return;
                }

                // Not stopped: bubbles up to the map below the marker.
                self.dispatch(&MapEvent::Click(position), ctx);
            }
            RawMapEvent::Click {
                position,
                target: ClickTarget::Map,
            } => {
                self.dispatch(&MapEvent::Click(position), ctx);
            }
            RawMapEvent::Load => {
                self.dispatch(&MapEvent::Load, ctx);
            }
            RawMapEvent::Geolocate(fix) => {
                self.dispatch(&MapEvent::Geolocate(fix), ctx);
            }
            RawMapEvent::GeolocateError(error) => {
                self.dispatch(&MapEvent::GeolocateError(error), ctx);
            }
        }
    }

    fn dispatch(&mut self, event: &MapEvent, ctx: &mut SessionContext<'_>) -> EventPropagation {
        for handler in self.handlers.iter_mut() {
            if handler.handle(event, ctx) == EventPropagation::Stop {
                return EventPropagation::Stop;
            }
        }

        EventPropagation::Propagate
    }
}
