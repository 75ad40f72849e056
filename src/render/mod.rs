pub mod markdown;

use serde::Serialize;

use crate::console::format::ReturnFormat;

pub use markdown::markdown_to_markup;

/// Display form of a result: an HTML fragment ready to drop into the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub format: ReturnFormat,
    pub html: String,
}

/// Render result text for the page. Never fails; bad input degrades to raw text.
pub fn render(text: &str, format: ReturnFormat) -> Rendered {
    let html = match format {
        ReturnFormat::Json => format!(
            r#"<pre class="json-result">{}</pre>"#,
            escape_html(&format_json(text))
        ),
        ReturnFormat::Markdown => format!(
            r#"<div class="markdown-content">{}</div>"#,
            markdown_to_markup(text)
        ),
        ReturnFormat::Html => format!(r#"<div class="html-result">{text}</div>"#),
        ReturnFormat::Text => format!(
            r#"<pre class="text-result">{}</pre>"#,
            escape_html(text)
        ),
    };
    Rendered { format, html }
}

/// Terminal form of a result: pretty JSON for `json`, the raw text otherwise.
pub fn render_plain(text: &str, format: ReturnFormat) -> String {
    match format {
        ReturnFormat::Json => format_json(text),
        _ => text.to_string(),
    }
}

/// Pretty-print with 2-space indentation, or return the input unchanged if it is not JSON.
pub fn format_json(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string())
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_pretty_printed_with_two_spaces() {
        assert_eq!(format_json(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn json_keeps_source_key_order() {
        assert_eq!(
            format_json(r#"{"z":1,"a":[true,null]}"#),
            "{\n  \"z\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}"
        );
    }

    #[test]
    fn bad_json_is_returned_unchanged() {
        assert_eq!(format_json("{bad json"), "{bad json");
    }

    #[test]
    fn json_render_escapes_into_pre() {
        let rendered = render(r#"{"tag":"<b>"}"#, ReturnFormat::Json);
        assert_eq!(
            rendered.html,
            "<pre class=\"json-result\">{\n  &quot;tag&quot;: &quot;&lt;b&gt;&quot;\n}</pre>"
        );
    }

    #[test]
    fn bad_json_render_shows_raw_text() {
        let rendered = render("{bad json", ReturnFormat::Json);
        assert_eq!(rendered.html, "<pre class=\"json-result\">{bad json</pre>");
    }

    #[test]
    fn markdown_render_wraps_emphasis() {
        let rendered = render("**bold** and _em_", ReturnFormat::Markdown);
        assert!(rendered.html.contains("<strong>bold</strong>"));
        assert!(rendered.html.contains("<em>em</em>"));
    }

    #[test]
    fn html_is_injected_unescaped() {
        let rendered = render("<p>hi</p>", ReturnFormat::Html);
        assert_eq!(rendered.html, "<div class=\"html-result\"><p>hi</p></div>");
    }

    #[test]
    fn text_is_preformatted_and_escaped() {
        let rendered = render("a < b\n  indented", ReturnFormat::Text);
        assert_eq!(
            rendered.html,
            "<pre class=\"text-result\">a &lt; b\n  indented</pre>"
        );
    }

    #[test]
    fn plain_render_only_touches_json() {
        assert_eq!(render_plain(r#"{"a":1}"#, ReturnFormat::Json), "{\n  \"a\": 1\n}");
        assert_eq!(render_plain("**x**", ReturnFormat::Markdown), "**x**");
    }
}
