/// Fixed names and strings shared by the three extension contexts.
///
/// These mirror `manifest.json`; keep the two in sync.

/// Pages the content script is injected into
pub const CONTENT_MATCHES: &[&str] = &["*://*/*"];

/// Content script waits for the page to go idle before registering
pub const CONTENT_RUN_AT: &str = "document_idle";

/// Message types
pub const GET_TABLE_DATA: &str = "get_table_data";
pub const EXTRACT_TABLE_DATA: &str = "extract_table_data";
pub const POPUP_MESSAGE: &str = "popup-message";
pub const RESPONSE_TYPE: &str = "response";

/// Body of every acknowledgment envelope
pub const ACK_CONTENT: &str = "Message received";

/// Content handler reply messages
pub const EXTRACTED_MESSAGE: &str = "Table data extracted";
pub const UNKNOWN_TYPE_MESSAGE: &str = "Content is working from anywhere";

/// Selector for the scrape
pub const ANCHOR_SELECTOR: &str = "a";
