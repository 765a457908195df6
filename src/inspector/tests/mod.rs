mod media_tests;
mod motion_tests;

use super::dom::{Document, PageSnapshot};

/// Parses `html` as if it had been served from `https://example.com/`
pub(super) fn doc(html: &str) -> Document {
    Document::parse(&PageSnapshot::new("https://example.com/", html))
}
