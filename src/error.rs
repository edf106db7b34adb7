//! Error types for the extension contexts.
//!
//! None of these reach a caller across a listener boundary: the router and
//! content handler turn them into fallback replies. Only the send helper
//! hands [`SendError`] back to its caller.

use thiserror::Error;

/// Failure of the send helper
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The message type was empty; nothing was sent.
    #[error("message type must not be empty")]
    EmptyType,

    /// The runtime could not deliver the message or returned an error.
    #[error("message could not be delivered: {0}")]
    Transport(String),

    /// The message could not be converted for the transport.
    #[error("message could not be encoded: {0}")]
    Encode(String),
}

/// An inbound message that cannot be read at all
#[derive(Error, Debug)]
pub enum MessageError {
    /// No message object was delivered.
    #[error("message is missing")]
    Missing,

    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

/// Failure while talking to a tab
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabsError {
    #[error("tab query failed: {0}")]
    Query(String),

    #[error("failed to send message to tab {tab_id}: {message}")]
    Send { tab_id: i32, message: String },
}

/// Failure while reading the page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("no document available")]
    NoDocument,

    #[error("{0}")]
    Dom(String),
}

/// Render a `JsValue` error the way the console would
pub(crate) fn js_error_message(value: &wasm_bindgen::JsValue) -> String {
    if let Some(message) = js_sys::Reflect::get(value, &"message".into())
        .ok()
        .and_then(|m| m.as_string())
    {
        return message;
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
