//! Shared utility functions for the Signpost application.

/// Escape a string for inclusion in an HTML fragment.
///
/// Marker info-windows interpolate user-entered organisation fields into
/// markup handed to the client-side map widget, so everything goes through
/// this first.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
