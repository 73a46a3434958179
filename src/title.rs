//! HTML title extraction.

use scraper::{Html, Selector};

/// Return the trimmed text of the document's first `<title>` element.
///
/// `None` when there is no title element or it holds only whitespace.
pub fn extract_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);

    let element = document.select(&selector).next()?;
    let text: String = element.text().collect();
    let trimmed = text.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
