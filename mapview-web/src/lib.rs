//! Browser map view with click-to-pin markers and live location tracking, built on `mapbox-gl`.
//!
//! The crate exports the [`MapView`] class to JavaScript:
//!
//! ```js
//! import init, { MapView } from "./pkg/mapview_web.js";
//!
//! await init();
//! const view = new MapView({ accessToken: "pk...." });
//! view.mountById("map");
//! // ...
//! view.resetPins();
//! view.unmount();
//! ```
//!
//! If no access token is given in the options, the one from the `MAPBOX_API_KEY` environment
//! variable at build time is used.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use mapview::{MapConfig, MapViewError};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

mod mapbox;
pub mod widget;

pub use widget::{create_host, EventSink, MapboxProvider, MapboxWidget, WebMapHost};

const BUILD_ACCESS_TOKEN: Option<&str> = option_env!("MAPBOX_API_KEY");

/// Installs the panic hook and the console logger.
#[wasm_bindgen(start)]
pub fn init() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("Logger is already initialized");
    }
}

/// Map view component.
///
/// Every instance owns its own map. Dropping the instance (`free()` on the JavaScript side)
/// unmounts the map.
#[wasm_bindgen]
pub struct MapView {
    host: Rc<RefCell<WebMapHost>>,
    sink: EventSink,
}

#[derive(Serialize)]
struct PinInfo {
    id: u64,
    lng: f64,
    lat: f64,
}

#[wasm_bindgen]
impl MapView {
    /// Creates an unmounted view. `options` are deserialized into a [`MapConfig`]; pass
    /// `undefined` to use the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<MapView, JsError> {
        let (host, sink) = widget::create_host(config_from_js(options)?);
        Ok(Self { host, sink })
    }

    /// Creates the map inside the given element. A mounted map is removed first.
    pub fn mount(&self, container: HtmlElement) -> Result<(), JsError> {
        self.sink.pump();
        let result = self.host.borrow_mut().mount(container);
        // Whatever was queued during the call belongs to the removed map.
        self.sink.discard();
        Ok(result?)
    }

    /// Creates the map inside the element with the given id.
    #[wasm_bindgen(js_name = mountById)]
    pub fn mount_by_id(&self, id: &str) -> Result<(), JsError> {
        let container = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(id))
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| MapViewError::ContainerNotFound(id.to_string()))?;

        self.mount(container)
    }

    /// Removes the map with all its markers and listeners.
    pub fn unmount(&self) {
        self.host.borrow_mut().unmount();
        self.sink.discard();
    }

    /// Whether the map is currently mounted.
    #[wasm_bindgen(getter, js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.host.borrow().is_mounted()
    }

    /// Removes all pins placed by the user. Returns the number of removed pins.
    #[wasm_bindgen(js_name = resetPins)]
    pub fn reset_pins(&self) -> usize {
        let removed = self.host.borrow_mut().clear_pins();
        self.sink.pump();
        removed
    }

    /// Number of pins on the map.
    #[wasm_bindgen(getter, js_name = pinCount)]
    pub fn pin_count(&self) -> usize {
        self.host
            .borrow()
            .session()
            .map(|session| session.pins().len())
            .unwrap_or(0)
    }

    /// Pins on the map as an array of `{ id, lng, lat }` objects, in placement order.
    pub fn pins(&self) -> Result<JsValue, JsError> {
        let pins: Vec<PinInfo> = self
            .host
            .borrow()
            .session()
            .map(|session| {
                session
                    .pins()
                    .iter()
                    .map(|pin| PinInfo {
                        id: pin.id().get(),
                        lng: pin.position().lng(),
                        lat: pin.position().lat(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(serde_wasm_bindgen::to_value(&pins)?)
    }
}

fn config_from_js(options: JsValue) -> Result<MapConfig, MapViewError> {
    let config = if options.is_undefined() || options.is_null() {
        MapConfig::new("")
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|err| MapViewError::InvalidConfig(err.to_string()))?
    };

    Ok(with_build_token(config, BUILD_ACCESS_TOKEN))
}

fn with_build_token(config: MapConfig, build_token: Option<&str>) -> MapConfig {
    match build_token {
        Some(token) if config.access_token().is_empty() => config.with_access_token(token),
        _ => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_token_fills_missing_token() {
        let config = with_build_token(MapConfig::new(""), Some("pk.build"));
        assert_eq!(config.access_token().as_str(), "pk.build");
    }

    #[test]
    fn explicit_token_wins() {
        let config = with_build_token(MapConfig::new("pk.explicit"), Some("pk.build"));
        assert_eq!(config.access_token().as_str(), "pk.explicit");

        let config = with_build_token(MapConfig::new(""), None);
        assert!(config.access_token().is_empty());
    }
}
