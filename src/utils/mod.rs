// Utility functions

pub mod logger;

pub use logger::*;

/// Escape `&`, `<`, `>` and quotes for HTML text and attribute values
pub fn escape_html(input: &str) -> String {
    escape(input, true)
}

/// Escape `&`, `<` and `>` only, for text placed between tags
pub fn escape_text(input: &str) -> String {
    escape(input, false)
}

fn escape(input: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            '\'' if quotes => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
