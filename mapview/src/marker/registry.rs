use crate::error::MapViewError;
use crate::geo::LngLat;
use crate::marker::PinMarker;
use crate::widget::{MapWidget, MarkerIcon, MarkerId, MarkerKind, MarkerOptions};

/// Ordered collection of the pins currently displayed on the map.
///
/// Every operation changes the registry and the widget together, so after any call the registry
/// contains exactly the pins that have a visual element on the map.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    pins: Vec<PinMarker>,
}

impl MarkerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new pin to the widget and registers it.
    ///
    /// If the widget fails to create the marker, the registry is not changed.
    pub fn place(
        &mut self,
        widget: &mut dyn MapWidget,
        position: LngLat,
        icon: &MarkerIcon,
    ) -> Result<MarkerId, MapViewError> {
        let id = widget.add_marker(position, &MarkerOptions::new(MarkerKind::Pin, icon.clone()))?;
        self.pins.push(PinMarker::new(id, position));

        log::debug!("Placed pin {id:?} at {position:?}");
        Ok(id)
    }

    /// Removes the pin from the widget and from the registry.
    ///
    /// Returns `None` and does nothing if the pin is not in the registry.
    pub fn remove(&mut self, widget: &mut dyn MapWidget, id: MarkerId) -> Option<PinMarker> {
        let index = self.pins.iter().position(|pin| pin.id() == id)?;
        let pin = self.pins.remove(index);
        widget.remove_marker(id);

        log::debug!("Removed pin {id:?} at {:?}", pin.position());
        Some(pin)
    }

    /// Removes all pins from the widget and empties the registry. Returns the number of removed
    /// pins.
    pub fn clear(&mut self, widget: &mut dyn MapWidget) -> usize {
        let count = self.pins.len();
        for pin in self.pins.drain(..) {
            widget.remove_marker(pin.id());
        }

        if count > 0 {
            log::debug!("Cleared {count} pins");
        }

        count
    }

    /// Returns true if the pin is registered.
    pub fn contains(&self, id: MarkerId) -> bool {
        self.pins.iter().any(|pin| pin.id() == id)
    }

    /// Returns the pin with the given id.
    pub fn get(&self, id: MarkerId) -> Option<&PinMarker> {
        self.pins.iter().find(|pin| pin.id() == id)
    }

    /// Iterates over the pins in the order they were placed.
    pub fn iter(&self) -> impl Iterator<Item = &PinMarker> {
        self.pins.iter()
    }

    /// Number of pins.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Returns true if there are no pins.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lnglat;
    use crate::widget::headless::HeadlessWidget;

    fn positions(registry: &MarkerRegistry) -> Vec<LngLat> {
        registry.iter().map(|pin| pin.position()).collect()
    }

    #[test]
    fn place_and_remove() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let mut registry = MarkerRegistry::new();
        let icon = MarkerIcon::default();

        let first = registry
            .place(&mut widget, lnglat!(1.0, 1.0), &icon)
            .expect("failed to place");
        let second = registry
            .place(&mut widget, lnglat!(2.0, 2.0), &icon)
            .expect("failed to place");
        let third = registry
            .place(&mut widget, lnglat!(3.0, 3.0), &icon)
            .expect("failed to place");

        assert_eq!(registry.len(), 3);
        assert_eq!(surface.marker_count(), 3);

        let removed = registry.remove(&mut widget, second).expect("not removed");
        assert_eq!(removed.position(), lnglat!(2.0, 2.0));
        assert_eq!(positions(&registry), [lnglat!(1.0, 1.0), lnglat!(3.0, 3.0)]);
        assert!(!surface.has_marker(second));
        assert!(surface.has_marker(first));
        assert!(surface.has_marker(third));

        assert!(!registry.contains(second));
        assert!(registry.get(second).is_none());
        assert!(registry.contains(third));
        assert_eq!(
            registry.get(third).map(|pin| pin.position()),
            Some(lnglat!(3.0, 3.0))
        );
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let mut registry = MarkerRegistry::new();

        let id = registry
            .place(&mut widget, lnglat!(1.0, 1.0), &MarkerIcon::default())
            .expect("failed to place");

        assert!(registry.remove(&mut widget, MarkerId::new(1000)).is_none());
        assert!(registry.remove(&mut widget, id).is_some());
        assert!(registry.remove(&mut widget, id).is_none());
        assert!(registry.is_empty());
        assert_eq!(surface.marker_count(), 0);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut widget = HeadlessWidget::default();
        let surface = widget.surface();
        let mut registry = MarkerRegistry::new();

        for i in 0..5 {
            registry
                .place(&mut widget, lnglat!(i as f64, 0.0), &MarkerIcon::default())
                .expect("failed to place");
        }

        assert_eq!(registry.clear(&mut widget), 5);
        assert!(registry.is_empty());
        assert_eq!(surface.marker_count(), 0);

        assert_eq!(registry.clear(&mut widget), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_placement_does_not_register() {
        let mut widget = HeadlessWidget::default();
        let mut registry = MarkerRegistry::new();
        widget.destroy();

        assert!(registry
            .place(&mut widget, lnglat!(1.0, 1.0), &MarkerIcon::default())
            .is_err());
        assert!(registry.is_empty());
    }
}
