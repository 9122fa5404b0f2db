//! Bindings to the parts of the `mapbox-gl` JavaScript library the widget uses.
//!
//! The library must be loaded into the page before the map is mounted, making the `mapboxgl`
//! global available.

use js_sys::{Function, Object};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_namespace = mapboxgl)]
extern "C" {
    /// `mapboxgl.Map`.
    #[wasm_bindgen(js_name = Map)]
    pub type MapboxMap;

    #[wasm_bindgen(constructor, js_class = "Map", catch)]
    pub fn new(options: &Object) -> Result<MapboxMap, JsValue>;

    #[wasm_bindgen(method, js_class = "Map")]
    pub fn on(this: &MapboxMap, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_class = "Map")]
    pub fn off(this: &MapboxMap, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_class = "Map", js_name = addControl)]
    pub fn add_control(this: &MapboxMap, control: &GeolocateControl);

    #[wasm_bindgen(method, js_class = "Map", js_name = removeControl)]
    pub fn remove_control(this: &MapboxMap, control: &GeolocateControl);

    #[wasm_bindgen(method, js_class = "Map")]
    pub fn remove(this: &MapboxMap);

    /// `mapboxgl.Marker`.
    pub type Marker;

    #[wasm_bindgen(constructor)]
    pub fn new(options: &Object) -> Marker;

    #[wasm_bindgen(method, js_name = setLngLat)]
    pub fn set_lng_lat(this: &Marker, lng_lat: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = setRotation)]
    pub fn set_rotation(this: &Marker, rotation: f64) -> Marker;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Marker, map: &MapboxMap) -> Marker;

    #[wasm_bindgen(method, js_name = getElement)]
    pub fn get_element(this: &Marker) -> web_sys::HtmlElement;

    #[wasm_bindgen(method)]
    pub fn remove(this: &Marker) -> Marker;

    /// `mapboxgl.GeolocateControl`.
    pub type GeolocateControl;

    #[wasm_bindgen(constructor)]
    pub fn new(options: &JsValue) -> GeolocateControl;

    #[wasm_bindgen(method)]
    pub fn trigger(this: &GeolocateControl) -> bool;

    #[wasm_bindgen(method)]
    pub fn on(this: &GeolocateControl, event: &str, listener: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &GeolocateControl, event: &str, listener: &Function);
}
