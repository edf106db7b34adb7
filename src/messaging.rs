/// Send helper: issue one message to the background router and wait for
/// its reply
use serde_json::Value;
use uuid::Uuid;

use crate::bridge;
use crate::error::{SendError, js_error_message};
use crate::protocol::{Message, Reply, Source, Target};

/// One-shot request/response channel to the background context
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, message: &Message) -> Result<Value, SendError>;
}

/// `chrome.runtime.sendMessage`
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeTransport;

impl Transport for RuntimeTransport {
    async fn send(&self, message: &Message) -> Result<Value, SendError> {
        let message_js = bridge::to_js(message).map_err(|e| SendError::Encode(e.to_string()))?;

        let response = bridge::send_runtime_message(message_js)
            .await
            .map_err(|e| SendError::Transport(js_error_message(&e)))?;

        bridge::from_js(response).map_err(|e| SendError::Transport(format!("unreadable response: {}", e)))
    }
}

/// Send `{source, target, type, content}` and resolve with whatever the
/// router replied.
///
/// An empty `kind` fails before the transport is touched. There is no
/// timeout or retry; a transport failure is returned as is.
pub async fn send<T>(
    transport: &T,
    source: Source,
    target: Target,
    kind: &str,
    content: Value,
) -> Result<Reply, SendError>
where
    T: Transport,
{
    if kind.is_empty() {
        log::error!("Message type must not be empty");
        return Err(SendError::EmptyType);
    }

    let request_id = Uuid::new_v4();
    let message = Message::new(source, target, kind, content);
    log::debug!("[{}] sending {:?}", request_id, message);

    let response = transport.send(&message).await.map_err(|e| {
        log::error!("[{}] Message send failed: {}", request_id, e);
        e
    })?;

    log::debug!("[{}] Background response: {}", request_id, response);
    Ok(Reply::from_value(response))
}
