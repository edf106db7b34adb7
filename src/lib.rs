/// Link Scraper - browser extension core
/// Built with Rust + WASM
///
/// The background router, the content script and the send helper all live
/// here; `extension.js` only forwards calls to `chrome.*`.

pub mod bridge;
pub mod config;
pub mod content;
pub mod error;
pub mod messaging;
pub mod protocol;
pub mod router;

use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::bridge::Listener;
use crate::content::{ContentHandler, DocumentPage};
use crate::messaging::RuntimeTransport;
use crate::protocol::{Source, Target};
use crate::router::{ChromeTabs, Router};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Keeps a context's message listener registered.
///
/// Hold on to it for the life of the context; `free()` unregisters.
#[wasm_bindgen]
pub struct ContextHandle {
    _listener: Listener,
}

/// Register the background router. Call once from the service worker.
#[wasm_bindgen]
pub fn start_background() -> ContextHandle {
    let router = Rc::new(Router::new(ChromeTabs));

    let listener = Listener::register(move |message, _sender| {
        let router = Rc::clone(&router);
        async move { router.handle_js(message).await }
    });

    log::info!("Background router started");
    ContextHandle { _listener: listener }
}

/// Register the content handler. Call once the page is idle.
#[wasm_bindgen]
pub fn start_content() -> ContextHandle {
    let handler = Rc::new(ContentHandler::new(DocumentPage));

    let listener = Listener::register(move |message, sender| {
        let handler = Rc::clone(&handler);
        async move { handler.handle_js(message, sender) }
    });

    log::info!("Content script started");
    ContextHandle { _listener: listener }
}

/// Send a message to the background router and resolve with its reply
#[wasm_bindgen]
pub async fn send_message(
    source: String,
    target: String,
    kind: String,
    content: JsValue,
) -> Result<JsValue, JsValue> {
    let source: Source = serde_json::from_value(Value::String(source))
        .map_err(|e| JsError::new(&format!("invalid source: {}", e)))?;
    let target: Target = serde_json::from_value(Value::String(target))
        .map_err(|e| JsError::new(&format!("invalid target: {}", e)))?;
    let content: Value = bridge::from_js(content).map_err(|e| JsError::new(&e.to_string()))?;

    let reply = messaging::send(&RuntimeTransport, source, target, &kind, content)
        .await
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(bridge::to_js(&reply)?)
}
