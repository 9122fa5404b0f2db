//! [`MapWidget`] implementation backed by `mapbox-gl`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Object, Reflect};
use mapview::control::{ClickTarget, RawMapEvent};
use mapview::geo::{GeolocationError, LocationFix};
use mapview::widget::{
    ControlId, EventKind, ListenerId, MapWidget, MarkerIcon, MarkerId, MarkerKind, MarkerOptions,
    WidgetOptions, WidgetProvider,
};
use mapview::{lnglat, GeolocateOptions, LngLat, MapConfig, MapHost, MapViewError};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::mapbox::{GeolocateControl, MapboxMap, Marker};

type JsListener = Closure<dyn FnMut(JsValue)>;

/// Host of the browser map view.
pub type WebMapHost = MapHost<MapboxProvider>;

/// Queue between the `mapbox-gl` callbacks and the [`WebMapHost`].
///
/// Callbacks only push events into the queue. The queue is then drained into the host, one event
/// at a time, unless the host is already busy; in that case the events stay in the queue until the
/// current call into the host finishes and calls [`EventSink::pump`].
#[derive(Clone)]
pub struct EventSink {
    queue: Rc<RefCell<VecDeque<RawMapEvent>>>,
    host: Weak<RefCell<WebMapHost>>,
}

impl EventSink {
    /// Creates a sink delivering events to the given host.
    pub fn new(host: Weak<RefCell<WebMapHost>>) -> Self {
        Self {
            queue: Rc::default(),
            host,
        }
    }

    /// Enqueues the event and delivers everything queued if the host is free.
    pub fn push(&self, event: RawMapEvent) {
        self.queue.borrow_mut().push_back(event);
        self.pump();
    }

    /// Delivers queued events in the order they arrived.
    pub fn pump(&self) {
        let Some(host) = self.host.upgrade() else {
            self.queue.borrow_mut().clear();
            return;
        };

        let Ok(mut host) = host.try_borrow_mut() else {
            return;
        };

        loop {
            let Some(event) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            host.dispatch(event);
        }
    }

    /// Drops all queued events without delivering them.
    pub fn discard(&self) {
        self.queue.borrow_mut().clear();
    }

    /// Number of events waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

/// Creates [`MapboxWidget`]s inside DOM elements.
pub struct MapboxProvider {
    sink: EventSink,
}

impl MapboxProvider {
    /// Creates a provider whose widgets report events into the sink.
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    /// Sink the widget callbacks push events into.
    pub fn sink(&self) -> &EventSink {
        &self.sink
    }
}

/// Creates an unmounted host together with the sink its widgets report events into.
pub fn create_host(config: MapConfig) -> (Rc<RefCell<WebMapHost>>, EventSink) {
    let host = Rc::new_cyclic(|host| {
        RefCell::new(WebMapHost::new(
            MapboxProvider::new(EventSink::new(host.clone())),
            config,
        ))
    });
    let sink = host.borrow().provider().sink().clone();

    (host, sink)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions<'a> {
    access_token: &'a str,
    style: &'a str,
    center: [f64; 2],
    zoom: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct PositionOptions {
    enable_high_accuracy: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GeolocateControlOptions {
    position_options: PositionOptions,
    track_user_location: bool,
    show_user_location: bool,
    show_user_heading: bool,
}

impl From<&GeolocateOptions> for GeolocateControlOptions {
    fn from(options: &GeolocateOptions) -> Self {
        Self {
            position_options: PositionOptions {
                enable_high_accuracy: options.high_accuracy,
            },
            track_user_location: options.track_user_location,
            show_user_location: options.show_widget_marker,
            show_user_heading: options.show_widget_marker,
        }
    }
}

impl WidgetProvider for MapboxProvider {
    type Container = HtmlElement;
    type Widget = MapboxWidget;

    fn create_widget(
        &mut self,
        container: Self::Container,
        options: &WidgetOptions,
    ) -> Result<Self::Widget, MapViewError> {
        let map_options = MapOptions {
            access_token: options.access_token.as_str(),
            style: &options.style,
            center: options.center.into(),
            zoom: options.zoom,
        };
        let map_options: Object = serde_wasm_bindgen::to_value(&map_options)
            .map_err(|err| MapViewError::Widget(err.to_string()))?
            .unchecked_into();
        Reflect::set(&map_options, &"container".into(), &container).map_err(js_error)?;

        let map = MapboxMap::new(&map_options).map_err(js_error)?;
        log::debug!("Mapbox map created");

        Ok(MapboxWidget {
            map,
            sink: self.sink.clone(),
            markers: HashMap::new(),
            listeners: HashMap::new(),
            controls: HashMap::new(),
            next_id: 0,
            destroyed: false,
        })
    }
}

struct AttachedMarker {
    marker: Marker,
    _on_click: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

enum ListenerTarget {
    Map,
    Control(ControlId),
}

struct Listener {
    target: ListenerTarget,
    event: &'static str,
    callback: JsListener,
}

/// Live `mapboxgl.Map` with the markers, listeners and controls attached to it by the view.
pub struct MapboxWidget {
    map: MapboxMap,
    sink: EventSink,
    markers: HashMap<MarkerId, AttachedMarker>,
    listeners: HashMap<ListenerId, Listener>,
    controls: HashMap<ControlId, GeolocateControl>,
    next_id: u64,
    destroyed: bool,
}

impl MapboxWidget {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_alive(&self) -> Result<(), MapViewError> {
        if self.destroyed {
            Err(MapViewError::WidgetDestroyed)
        } else {
            Ok(())
        }
    }

    fn geolocate_control(&self) -> Result<(ControlId, &GeolocateControl), MapViewError> {
        self.controls
            .iter()
            .next()
            .map(|(id, control)| (*id, control))
            .ok_or_else(|| MapViewError::Widget("geolocate control is not added".into()))
    }

    fn callback(&self, kind: EventKind) -> JsListener {
        let sink = self.sink.clone();
        let handler: Box<dyn FnMut(JsValue)> = match kind {
            EventKind::Click => Box::new(move |event| match parse_click(&event) {
                Some(position) => sink.push(RawMapEvent::Click {
                    position,
                    target: ClickTarget::Map,
                }),
                None => log::warn!("Click event without position: {event:?}"),
            }),
            EventKind::Load => Box::new(move |_| sink.push(RawMapEvent::Load)),
            EventKind::Geolocate => Box::new(move |event| match parse_fix(&event) {
                Some(fix) => sink.push(RawMapEvent::Geolocate(fix)),
                None => log::warn!("Geolocate event without coordinates: {event:?}"),
            }),
            EventKind::GeolocateError => Box::new(move |event| {
                sink.push(RawMapEvent::GeolocateError(parse_geolocation_error(&event)))
            }),
        };

        Closure::wrap(handler)
    }

    fn create_marker(&self, options: &MarkerOptions) -> Result<Marker, MapViewError> {
        let marker_options = Object::new();
        match &options.icon {
            MarkerIcon::Default { color } => {
                if let Some(color) = color {
                    Reflect::set(&marker_options, &"color".into(), &color.into())
                        .map_err(js_error)?;
                }
            }
            MarkerIcon::Image { url, width, height } => {
                let element = create_icon_element(url, *width, *height)?;
                Reflect::set(&marker_options, &"element".into(), &element).map_err(js_error)?;
            }
        }

        if options.kind == MarkerKind::Heading {
            Reflect::set(
                &marker_options,
                &"rotationAlignment".into(),
                &"map".into(),
            )
            .map_err(js_error)?;
        }
        Reflect::set(
            &marker_options,
            &"rotation".into(),
            &options.rotation.into(),
        )
        .map_err(js_error)?;

        Ok(Marker::new(&marker_options))
    }

    fn pin_click_listener(
        &self,
        marker: &Marker,
        id: MarkerId,
        position: LngLat,
    ) -> Result<Closure<dyn FnMut(web_sys::Event)>, MapViewError> {
        let sink = self.sink.clone();
        let on_click = Closure::wrap(Box::new(move |event: web_sys::Event| {
            // The map below the pin must not see this click.
            event.stop_propagation();
            sink.push(RawMapEvent::Click {
                position,
                target: ClickTarget::Marker(id),
            });
        }) as Box<dyn FnMut(web_sys::Event)>);

        let element = marker.get_element();
        element
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(js_error)?;
        element
            .style()
            .set_property("cursor", "pointer")
            .map_err(js_error)?;

        Ok(on_click)
    }
}

impl MapWidget for MapboxWidget {
    fn add_marker(
        &mut self,
        position: LngLat,
        options: &MarkerOptions,
    ) -> Result<MarkerId, MapViewError> {
        self.check_alive()?;

        let marker = self.create_marker(options)?;
        let id = MarkerId::new(self.next_id());
        let on_click = match options.kind {
            MarkerKind::Pin => Some(self.pin_click_listener(&marker, id, position)?),
            _ => None,
        };

        marker.set_lng_lat(&lng_lat(position)).add_to(&self.map);
        self.markers.insert(
            id,
            AttachedMarker {
                marker,
                _on_click: on_click,
            },
        );

        Ok(id)
    }

    fn set_marker_position(&mut self, marker: MarkerId, position: LngLat) {
        if let Some(attached) = self.markers.get(&marker) {
            attached.marker.set_lng_lat(&lng_lat(position));
        }
    }

    fn set_marker_rotation(&mut self, marker: MarkerId, rotation: f64) {
        if let Some(attached) = self.markers.get(&marker) {
            attached.marker.set_rotation(rotation);
        }
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        if let Some(attached) = self.markers.remove(&marker) {
            attached.marker.remove();
        }
    }

    fn subscribe(&mut self, kind: EventKind) -> Result<ListenerId, MapViewError> {
        self.check_alive()?;

        let callback = self.callback(kind);
        let (target, event) = match kind {
            EventKind::Click => (ListenerTarget::Map, "click"),
            EventKind::Load => (ListenerTarget::Map, "load"),
            EventKind::Geolocate => (
                ListenerTarget::Control(self.geolocate_control()?.0),
                "geolocate",
            ),
            EventKind::GeolocateError => (
                ListenerTarget::Control(self.geolocate_control()?.0),
                "error",
            ),
        };

        let function: &Function = callback.as_ref().unchecked_ref();
        match &target {
            ListenerTarget::Map => self.map.on(event, function),
            ListenerTarget::Control(control) => {
                if let Some(control) = self.controls.get(control) {
                    control.on(event, function);
                }
            }
        }

        let id = ListenerId::new(self.next_id());
        self.listeners.insert(
            id,
            Listener {
                target,
                event,
                callback,
            },
        );

        Ok(id)
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        let Some(listener) = self.listeners.remove(&listener) else {
            return;
        };

        let function: &Function = listener.callback.as_ref().unchecked_ref();
        match listener.target {
            ListenerTarget::Map => self.map.off(listener.event, function),
            ListenerTarget::Control(control) => {
                if let Some(control) = self.controls.get(&control) {
                    control.off(listener.event, function);
                }
            }
        }
    }

    fn add_geolocate_control(
        &mut self,
        options: &GeolocateOptions,
    ) -> Result<ControlId, MapViewError> {
        self.check_alive()?;

        let control_options =
            serde_wasm_bindgen::to_value(&GeolocateControlOptions::from(options))
                .map_err(|err| MapViewError::Widget(err.to_string()))?;
        let control = GeolocateControl::new(&control_options);
        self.map.add_control(&control);

        let id = ControlId::new(self.next_id());
        self.controls.insert(id, control);
        Ok(id)
    }

    fn trigger_geolocate(&mut self, control: ControlId) -> Result<(), MapViewError> {
        self.check_alive()?;

        let control = self
            .controls
            .get(&control)
            .ok_or_else(|| MapViewError::Widget(format!("control {control:?} is not on the map")))?;
        if !control.trigger() {
            log::warn!("Location tracking could not be started");
        }

        Ok(())
    }

    fn remove_control(&mut self, control: ControlId) {
        if let Some(control) = self.controls.remove(&control) {
            self.map.remove_control(&control);
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        let listeners: Vec<_> = self.listeners.keys().copied().collect();
        for listener in listeners {
            self.unsubscribe(listener);
        }
        for (_, attached) in self.markers.drain() {
            attached.marker.remove();
        }
        for (_, control) in self.controls.drain() {
            self.map.remove_control(&control);
        }

        self.map.remove();
        self.destroyed = true;
        log::debug!("Mapbox map removed");
    }
}

impl Drop for MapboxWidget {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn js_error(value: JsValue) -> MapViewError {
    MapViewError::Wasm(Some(format!("{value:?}")))
}

fn lng_lat(position: LngLat) -> JsValue {
    Array::of2(&position.lng().into(), &position.lat().into()).into()
}

fn create_icon_element(url: &str, width: u32, height: u32) -> Result<JsValue, MapViewError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| MapViewError::Wasm(Some("document is not available".into())))?;

    let image: web_sys::HtmlImageElement = document
        .create_element("img")
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| MapViewError::Wasm(Some("failed to create image element".into())))?;
    image.set_src(url);
    image.set_width(width);
    image.set_height(height);

    Ok(image.into())
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &key.into())
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn get_f64(target: &JsValue, key: &str) -> Option<f64> {
    get(target, key).and_then(|value| value.as_f64())
}

fn parse_click(event: &JsValue) -> Option<LngLat> {
    let lng_lat = get(event, "lngLat")?;
    Some(lnglat!(get_f64(&lng_lat, "lng")?, get_f64(&lng_lat, "lat")?))
}

fn parse_fix(event: &JsValue) -> Option<LocationFix> {
    let coords = get(event, "coords")?;
    let position = Some(lnglat!(
        get_f64(&coords, "longitude")?,
        get_f64(&coords, "latitude")?
    ))
    .filter(LngLat::is_valid)?;

    Some(LocationFix::new(position, get_f64(&coords, "heading")))
}

fn parse_geolocation_error(event: &JsValue) -> GeolocationError {
    let code = get_f64(event, "code").unwrap_or_default() as u16;
    let message = get(event, "message")
        .and_then(|value| value.as_string())
        .unwrap_or_default();

    GeolocationError {
        code: code.into(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_options() {
        let options = GeolocateControlOptions::from(&GeolocateOptions {
            high_accuracy: false,
            show_widget_marker: true,
            ..Default::default()
        });

        assert_eq!(
            options,
            GeolocateControlOptions {
                position_options: PositionOptions {
                    enable_high_accuracy: false
                },
                track_user_location: true,
                show_user_location: true,
                show_user_heading: true,
            }
        );
    }

    #[test]
    fn events_without_host_are_discarded() {
        let sink = EventSink::new(Weak::new());
        sink.push(RawMapEvent::Load);
        assert_eq!(sink.pending(), 0);
    }

    #[test]
    fn events_wait_while_host_is_busy() {
        let (host, sink) = create_host(MapConfig::new("pk.test"));

        {
            let busy = host.borrow_mut();
            busy.provider().sink().push(RawMapEvent::Load);
            assert_eq!(busy.provider().sink().pending(), 1);
        }

        sink.pump();
        assert_eq!(host.borrow().provider().sink().pending(), 0);
        assert!(!host.borrow().is_mounted());
    }

    #[test]
    fn discarded_events_are_not_delivered() {
        let (host, sink) = create_host(MapConfig::new("pk.test"));

        {
            let busy = host.borrow_mut();
            busy.provider().sink().push(RawMapEvent::Load);
        }

        sink.discard();
        assert_eq!(host.borrow().provider().sink().pending(), 0);
    }
}
