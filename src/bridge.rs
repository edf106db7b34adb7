/// Glue between Rust and the `chrome.*` APIs in `extension.js`
use std::future::Future;

use js_sys::Promise;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

// Import JS bridge functions
#[wasm_bindgen(module = "/extension.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryActiveTabId() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendTabMessage(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    fn addMessageListener(callback: &js_sys::Function) -> u32;

    fn removeMessageListener(token: u32);
}

pub(crate) async fn send_runtime_message(message: JsValue) -> Result<JsValue, JsValue> {
    sendRuntimeMessage(message).await
}

/// Id of the active tab in the current window, if there is one
pub(crate) async fn query_active_tab_id() -> Result<Option<i32>, JsValue> {
    let id = queryActiveTabId().await?;
    Ok(id.as_f64().map(|id| id as i32))
}

pub(crate) async fn send_tab_message(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue> {
    sendTabMessage(tab_id, message).await
}

/// Convert to a plain JS object (no `Map`s) so `chrome.runtime` can clone it
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, serde_wasm_bindgen::Error> {
    serde_wasm_bindgen::from_value(value)
}

/// A registered `runtime.onMessage` listener.
///
/// The listener stays registered for as long as this value lives and is
/// removed when it is dropped.
pub struct Listener {
    token: u32,
    _callback: Closure<dyn FnMut(JsValue, JsValue) -> Promise>,
}

impl Listener {
    /// Register `handler` for every `(message, sender)` pair. Its output is
    /// passed to `sendResponse`; the channel is always held open until then.
    pub fn register<F, Fut>(handler: F) -> Listener
    where
        F: Fn(JsValue, JsValue) -> Fut + 'static,
        Fut: Future<Output = JsValue> + 'static,
    {
        let callback = Closure::wrap(Box::new(move |message: JsValue, sender: JsValue| {
            let reply = handler(message, sender);
            future_to_promise(async move { Ok(reply.await) })
        }) as Box<dyn FnMut(JsValue, JsValue) -> Promise>);

        let token = addMessageListener(callback.as_ref().unchecked_ref());
        log::debug!("Registered message listener {}", token);

        Listener {
            token,
            _callback: callback,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        removeMessageListener(self.token);
        log::debug!("Removed message listener {}", self.token);
    }
}
