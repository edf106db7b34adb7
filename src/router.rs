/// Background message router
///
/// Every inbound message gets exactly one reply. Dispatch looks at `source`
/// first and only then at `type`:
/// 1. from a content script → content acknowledgment
/// 2. from the popup → popup acknowledgment
/// 3. `get_table_data` → ask the active tab's content script to extract
///    links and relay its reply
/// 4. anything else → popup acknowledgment, with a warning
///
/// Failures never reach the sender; they turn into the popup acknowledgment.
use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::bridge;
use crate::config::{EXTRACT_TABLE_DATA, GET_TABLE_DATA};
use crate::error::{TabsError, js_error_message};
use crate::protocol::{Envelope, Message, Reply, Source, Target};

/// Which branch of the dispatch rule a message takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    AckContent,
    AckPopup,
    RelayTableData,
    Unknown,
}

pub fn route(message: &Message) -> Route {
    match message.source {
        Some(Source::Content) => Route::AckContent,
        Some(Source::Popup) => Route::AckPopup,
        _ if message.kind == GET_TABLE_DATA => Route::RelayTableData,
        _ => Route::Unknown,
    }
}

/// Access to browser tabs
#[allow(async_fn_in_trait)]
pub trait Tabs {
    /// The active tab in the current window
    async fn active_tab_id(&self) -> Result<Option<i32>, TabsError>;

    async fn send_to_tab(&self, tab_id: i32, message: &Message) -> Result<Value, TabsError>;
}

/// `chrome.tabs`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

impl Tabs for ChromeTabs {
    async fn active_tab_id(&self) -> Result<Option<i32>, TabsError> {
        bridge::query_active_tab_id()
            .await
            .map_err(|e| TabsError::Query(js_error_message(&e)))
    }

    async fn send_to_tab(&self, tab_id: i32, message: &Message) -> Result<Value, TabsError> {
        let send_error = |message: String| TabsError::Send { tab_id, message };

        let message_js = bridge::to_js(message).map_err(|e| send_error(e.to_string()))?;
        let response = bridge::send_tab_message(tab_id, message_js)
            .await
            .map_err(|e| send_error(js_error_message(&e)))?;

        bridge::from_js(response).map_err(|e| send_error(e.to_string()))
    }
}

pub struct Router<T> {
    tabs: T,
}

impl<T: Tabs> Router<T> {
    pub fn new(tabs: T) -> Router<T> {
        Router { tabs }
    }

    pub async fn handle(&self, message: &Message) -> Reply {
        match route(message) {
            Route::AckContent => {
                log::info!("Background received content message: {}", message.content_text());
                Envelope::ack(Target::Content).into()
            }
            Route::AckPopup => {
                log::info!("Background received popup message: {}", message.content_text());
                Envelope::ack(Target::Popup).into()
            }
            Route::RelayTableData => match self.relay_table_data().await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    log::info!("No active tab to extract table data from");
                    Envelope::ack(Target::Popup).into()
                }
                Err(e) => {
                    log::error!("Failed to send message to content script: {}", e);
                    Envelope::ack(Target::Popup).into()
                }
            },
            Route::Unknown => {
                log::warn!("Unknown message type: {:?}", message.kind);
                Envelope::ack(Target::Popup).into()
            }
        }
    }

    /// Decode a raw inbound message and dispatch it
    pub async fn handle_value(&self, raw: Value) -> Reply {
        match Message::from_value(raw) {
            Ok(message) => self.handle(&message).await,
            Err(e) => {
                log::error!("Error in background script: {}", e);
                Envelope::ack(Target::Popup).into()
            }
        }
    }

    /// Listener entry point: JS in, JS out, never fails
    pub async fn handle_js(&self, message: JsValue) -> JsValue {
        let reply = match bridge::from_js::<Value>(message) {
            Ok(raw) => self.handle_value(raw).await,
            Err(e) => {
                log::error!("Error in background script: {}", e);
                Envelope::ack(Target::Popup).into()
            }
        };

        bridge::to_js(&reply).unwrap_or_else(|e| {
            log::error!("Failed to encode background reply: {}", e);
            JsValue::UNDEFINED
        })
    }

    /// `Ok(None)` when there is no active tab to ask
    async fn relay_table_data(&self) -> Result<Option<Reply>, TabsError> {
        let Some(tab_id) = self.tabs.active_tab_id().await? else {
            return Ok(None);
        };

        let response = self
            .tabs
            .send_to_tab(tab_id, &Message::of_type(EXTRACT_TABLE_DATA))
            .await?;

        Ok(Some(Reply::from_value(response)))
    }
}
