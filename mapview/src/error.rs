//! Error types used by the crate.

use thiserror::Error;

/// Mapview error type.
#[derive(Debug, Error)]
pub enum MapViewError {
    /// Access token for the widget provider is not set or is empty.
    #[error("map access token is not set")]
    MissingAccessToken,
    /// Configuration value is out of the allowed range.
    #[error("invalid map configuration: {0}")]
    InvalidConfig(String),
    /// Configuration could not be parsed.
    #[error("failed to parse map configuration")]
    ConfigParse(#[from] serde_json::Error),
    /// Container element to mount the map into does not exist.
    #[error("map container '{0}' not found")]
    ContainerNotFound(String),
    /// Widget provider rejected the operation.
    #[error("map widget error: {0}")]
    Widget(String),
    /// Operation was called on a widget that was already removed.
    #[error("map widget is already destroyed")]
    WidgetDestroyed,
    /// Error interacting with WASM runtime.
    #[error("wasm error: {0:?}")]
    Wasm(Option<String>),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for MapViewError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        MapViewError::Wasm(Some(format!("{value:?}")))
    }
}
