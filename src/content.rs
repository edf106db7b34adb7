/// Content script: answers extraction and echo requests inside the page
use serde_json::Value;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::bridge;
use crate::config::{ANCHOR_SELECTOR, EXTRACT_TABLE_DATA, EXTRACTED_MESSAGE, POPUP_MESSAGE, UNKNOWN_TYPE_MESSAGE};
use crate::error::{PageError, js_error_message};
use crate::protocol::{ContentReply, Link, Message};

/// An anchor as it appears in the page, before resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    /// Rendered text (`innerText`), untrimmed
    pub text: Option<String>,
    /// `href` attribute as written
    pub href: Option<String>,
}

impl Anchor {
    pub fn new(text: Option<&str>, href: Option<&str>) -> Anchor {
        Anchor {
            text: text.map(str::to_string),
            href: href.map(str::to_string),
        }
    }
}

/// Read-only view of the hosting page
pub trait Page {
    /// URL relative hrefs resolve against
    fn base_url(&self) -> Result<Url, PageError>;

    /// All anchors in document order
    fn anchors(&self) -> Result<Vec<Anchor>, PageError>;
}

/// The live `window.document`
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentPage;

impl DocumentPage {
    fn document(&self) -> Result<Document, PageError> {
        web_sys::window()
            .and_then(|window| window.document())
            .ok_or(PageError::NoDocument)
    }
}

impl Page for DocumentPage {
    fn base_url(&self) -> Result<Url, PageError> {
        let document = self.document()?;

        let base = match document.base_uri() {
            Ok(Some(base)) => base,
            _ => document.url().map_err(|e| PageError::Dom(js_error_message(&e)))?,
        };

        Url::parse(&base).map_err(|e| PageError::Dom(format!("invalid base URL {:?}: {}", base, e)))
    }

    fn anchors(&self) -> Result<Vec<Anchor>, PageError> {
        let nodes = self
            .document()?
            .query_selector_all(ANCHOR_SELECTOR)
            .map_err(|e| PageError::Dom(js_error_message(&e)))?;

        let anchors = (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .map(|node| {
                let href = node
                    .dyn_ref::<Element>()
                    .and_then(|element| element.get_attribute("href"));
                // SVG anchors have no innerText
                let text = match node.dyn_ref::<HtmlElement>() {
                    Some(element) => Some(element.inner_text()),
                    None => node.text_content(),
                };
                Anchor { text, href }
            })
            .collect();

        Ok(anchors)
    }
}

/// Turn raw anchors into links, in order and without deduplication.
///
/// Text is trimmed. A missing href becomes `""`; one that does not resolve
/// against `base` is kept as written.
pub fn resolve_links(base: &Url, anchors: Vec<Anchor>) -> Vec<Link> {
    anchors
        .into_iter()
        .map(|anchor| {
            let text = anchor.text.as_deref().map(str::trim).unwrap_or_default();
            let href = match anchor.href {
                Some(raw) => base.join(raw.trim()).map(String::from).unwrap_or(raw),
                None => String::new(),
            };
            Link::new(text, href)
        })
        .collect()
}

/// Scrape every anchor on the page. A page that cannot be read yields an
/// empty list.
pub fn extract_links<P: Page + ?Sized>(page: &P, base: &Url) -> Vec<Link> {
    log::debug!("Extracting table data...");

    match page.anchors() {
        Ok(anchors) => resolve_links(base, anchors),
        Err(e) => {
            log::error!("Error extracting table data: {}", e);
            Vec::new()
        }
    }
}

pub struct ContentHandler<P> {
    page: P,
}

impl<P: Page> ContentHandler<P> {
    pub fn new(page: P) -> ContentHandler<P> {
        ContentHandler { page }
    }

    pub fn handle(&self, message: &Message) -> ContentReply {
        match message.kind.as_str() {
            EXTRACT_TABLE_DATA => self.handle_extract(),
            POPUP_MESSAGE => {
                let content = message.content_text();
                log::info!("Content received popup message: {}", content);
                ContentReply::success(format!("Content received: {}", content))
            }
            _ => ContentReply::success(UNKNOWN_TYPE_MESSAGE),
        }
    }

    /// Decode a raw inbound message and handle it
    pub fn handle_value(&self, raw: Value) -> ContentReply {
        log::debug!("Content script received message: {}", raw);

        match Message::from_value(raw) {
            Ok(message) => self.handle(&message),
            Err(e) => {
                log::error!("Error in content script: {}", e);
                ContentReply::error(format!("Content script error: {}", e))
            }
        }
    }

    /// Listener entry point: JS in, JS out, never fails
    pub fn handle_js(&self, message: JsValue, sender: JsValue) -> JsValue {
        if let Ok(sender) = bridge::from_js::<Value>(sender) {
            log::debug!("Sender: {}", sender);
        }

        let reply = match bridge::from_js::<Value>(message) {
            Ok(raw) => self.handle_value(raw),
            Err(e) => {
                log::error!("Error in content script: {}", e);
                ContentReply::error(format!("Content script error: {}", e))
            }
        };

        bridge::to_js(&reply).unwrap_or_else(|e| {
            log::error!("Failed to encode content reply: {}", e);
            JsValue::UNDEFINED
        })
    }

    fn handle_extract(&self) -> ContentReply {
        match self.page.base_url() {
            Ok(base) => {
                let links = extract_links(&self.page, &base);
                ContentReply::success(EXTRACTED_MESSAGE).with_data(links)
            }
            Err(e) => {
                log::error!("Error in content script: {}", e);
                ContentReply::error(format!("Error extracting table data: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Source, Status, Target};
    use serde_json::json;

    struct FakePage {
        base: &'static str,
        anchors: Result<Vec<Anchor>, PageError>,
    }

    impl FakePage {
        fn with_anchors(anchors: Vec<Anchor>) -> FakePage {
            FakePage {
                base: "https://example.com/docs/index.html",
                anchors: Ok(anchors),
            }
        }
    }

    impl Page for FakePage {
        fn base_url(&self) -> Result<Url, PageError> {
            Url::parse(self.base).map_err(|e| PageError::Dom(e.to_string()))
        }

        fn anchors(&self) -> Result<Vec<Anchor>, PageError> {
            self.anchors.clone()
        }
    }

    fn base() -> Url {
        Url::parse("https://example.com/docs/index.html").unwrap()
    }

    #[test]
    fn test_extract_single_anchor() {
        let handler = ContentHandler::new(FakePage::with_anchors(vec![Anchor::new(
            Some("Hi"),
            Some("https://x.com"),
        )]));

        let reply = handler.handle_value(json!({"type": "extract_table_data"}));

        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "status": "success",
                "message": "Table data extracted",
                "data": [{"text": "Hi", "href": "https://x.com/"}]
            })
        );
    }

    #[test]
    fn test_resolve_links_keeps_order_and_duplicates() {
        let anchors = vec![
            Anchor::new(Some("  First \n"), Some("/a")),
            Anchor::new(Some("Second"), Some("b.html")),
            Anchor::new(Some("First"), Some("/a")),
            Anchor::new(Some("Top"), Some("#top")),
        ];

        let links = resolve_links(&base(), anchors);

        assert_eq!(
            links,
            vec![
                Link::new("First", "https://example.com/a"),
                Link::new("Second", "https://example.com/docs/b.html"),
                Link::new("First", "https://example.com/a"),
                Link::new("Top", "https://example.com/docs/index.html#top"),
            ]
        );
    }

    #[test]
    fn test_resolve_links_missing_text_and_href() {
        let anchors = vec![
            Anchor::new(None, Some("https://rust-lang.org")),
            Anchor::new(Some("   "), None),
        ];

        let links = resolve_links(&base(), anchors);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0], Link::new("", "https://rust-lang.org/"));
        assert_eq!(links[1], Link::new("", ""));
    }

    #[test]
    fn test_resolve_links_unresolvable_href_kept() {
        let links = resolve_links(&base(), vec![Anchor::new(Some("Bad"), Some("http://[::1"))]);

        assert_eq!(links, vec![Link::new("Bad", "http://[::1")]);
    }

    #[test]
    fn test_extract_links_page_failure_is_empty() {
        let page = FakePage {
            base: "https://example.com/",
            anchors: Err(PageError::Dom("detached".to_string())),
        };

        assert!(extract_links(&page, &base()).is_empty());

        let reply = ContentHandler::new(page).handle(&Message::of_type(EXTRACT_TABLE_DATA));
        assert_eq!(reply.status, Status::Success);
        assert_eq!(reply.data, Some(Vec::new()));
    }

    #[test]
    fn test_extract_base_url_failure_is_error_reply() {
        let handler = ContentHandler::new(FakePage {
            base: "not a url",
            anchors: Ok(Vec::new()),
        });

        let reply = handler.handle(&Message::of_type(EXTRACT_TABLE_DATA));

        assert_eq!(reply.status, Status::Error);
        assert!(reply.message.unwrap().starts_with("Error extracting table data: "));
        assert_eq!(reply.data, None);
    }

    #[test]
    fn test_popup_message_echo() {
        let handler = ContentHandler::new(FakePage::with_anchors(Vec::new()));

        let text = Message::new(Source::Popup, Target::Content, POPUP_MESSAGE, json!("hello"));
        assert_eq!(handler.handle(&text), ContentReply::success("Content received: hello"));

        let object = Message::new(Source::Popup, Target::Content, POPUP_MESSAGE, json!({"n": 1}));
        assert_eq!(handler.handle(&object), ContentReply::success(r#"Content received: {"n":1}"#));
    }

    #[test]
    fn test_unknown_type() {
        let handler = ContentHandler::new(FakePage::with_anchors(Vec::new()));

        let reply = handler.handle_value(json!({"type": "unknown_type"}));

        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"status": "success", "message": "Content is working from anywhere"})
        );
    }

    #[test]
    fn test_legacy_get_table_is_not_an_extraction() {
        let handler = ContentHandler::new(FakePage::with_anchors(vec![Anchor::new(Some("Hi"), Some("/"))]));

        let reply = handler.handle(&Message::of_type("getTable"));

        assert_eq!(reply, ContentReply::success(UNKNOWN_TYPE_MESSAGE));
    }

    #[test]
    fn test_shapeless_message_gets_unknown_type_reply() {
        let handler = ContentHandler::new(FakePage::with_anchors(Vec::new()));

        for raw in [json!("ping"), json!(["not", "a", "message"]), json!({"type": null})] {
            assert_eq!(handler.handle_value(raw), ContentReply::success(UNKNOWN_TYPE_MESSAGE));
        }
    }

    #[test]
    fn test_missing_message_is_error_reply() {
        let handler = ContentHandler::new(FakePage::with_anchors(Vec::new()));

        let reply = handler.handle_value(Value::Null);

        assert_eq!(reply, ContentReply::error("Content script error: message is missing"));
    }
}
