//! Server-rendered HTML.
//!
//! The page is plain HTML driven by HTMX: option buttons `hx-post` to
//! `/ui/options/{id}`, and the conversation panel is swapped in place from the
//! `/ui/events` SSE feed every time the conversation changes.
//!
//! # Structure
//!
//! - [`page`]: the document shell and the chat page
//! - [`render`]: the conversation fragment (messages, loading, options)

pub mod page;
pub mod render;

pub use page::index_page;
pub use render::conversation_fragment;

/// Escape text for HTML element and attribute content.
///
/// Carriage returns are dropped: the fragment is also sent as SSE data,
/// which cannot carry them.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b onclick=\"x\">Tom & 'Jerry'</b>\r\n"),
            "&lt;b onclick=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;\n"
        );
    }
}
