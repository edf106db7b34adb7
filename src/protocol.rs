/// Wire model shared by the popup, background and content contexts
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::{ACK_CONTENT, RESPONSE_TYPE};
use crate::error::MessageError;

/// Which context sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Popup,
    Content,
    Background,
}

/// Which context a message or envelope is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Popup,
    Content,
}

/// A request travelling between contexts.
///
/// Inbound messages are decoded leniently: a bare `{type: "get_table_data"}`
/// has no source or target, an unrecognised source is treated as absent and
/// a non-string type reads as `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub content: Value,
}

impl Message {
    /// Decode an inbound message.
    ///
    /// Only a missing (`null`) message is an error. Any other non-object,
    /// such as a bare string or an array, has no fields and decodes to an
    /// empty message.
    pub fn from_value(raw: Value) -> Result<Message, MessageError> {
        match raw {
            Value::Null => Err(MessageError::Missing),
            Value::Object(_) => Ok(serde_json::from_value(raw)?),
            _ => Ok(Message::default()),
        }
    }

    pub fn new(source: Source, target: Target, kind: impl Into<String>, content: Value) -> Message {
        Message {
            source: Some(source),
            target: Some(target),
            kind: kind.into(),
            content,
        }
    }

    /// A message carrying only a type, as forwarded to content scripts
    pub fn of_type(kind: impl Into<String>) -> Message {
        Message {
            kind: kind.into(),
            ..Message::default()
        }
    }

    /// Content as display text: strings verbatim, anything else as compact JSON
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Fixed-shape acknowledgment sent by the background router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: Source,
    pub target: Target,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Value,
}

impl Envelope {
    /// The acknowledgment envelope addressed to `target`
    pub fn ack(target: Target) -> Envelope {
        Envelope {
            source: Source::Background,
            target,
            kind: RESPONSE_TYPE.to_string(),
            content: Value::String(ACK_CONTENT.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// One scraped anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

impl Link {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Link {
        Link {
            text: text.into(),
            href: href.into(),
        }
    }
}

/// Reply produced by the content script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Link>>,
}

impl ContentReply {
    pub fn success(message: impl Into<String>) -> ContentReply {
        ContentReply {
            status: Status::Success,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ContentReply {
        ContentReply {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Vec<Link>) -> ContentReply {
        self.data = Some(data);
        self
    }
}

/// Anything that can come back over the transport.
///
/// Decoding tries the router envelope first, then a content reply, and
/// otherwise keeps the raw JSON. A typed variant is only used when it
/// encodes back to exactly the value that arrived, so relaying a reply never
/// drops or rewrites fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Envelope(Envelope),
    Content(ContentReply),
    Other(Value),
}

impl Reply {
    pub fn from_value(value: Value) -> Reply {
        match serde_json::from_value::<Reply>(value.clone()) {
            Ok(reply) if serde_json::to_value(&reply).ok().as_ref() == Some(&value) => reply,
            _ => Reply::Other(value),
        }
    }
}

impl From<Envelope> for Reply {
    fn from(envelope: Envelope) -> Reply {
        Reply::Envelope(envelope)
    }
}

impl From<ContentReply> for Reply {
    fn from(reply: ContentReply) -> Reply {
        Reply::Content(reply)
    }
}
