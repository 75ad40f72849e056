// ---------------------------------------------------------------------------
// Markdown → markup (lightweight substitutions, not a full parser)
// ---------------------------------------------------------------------------

/// Convert result text into markup: `#` headings, `**bold**`, `_em_`,
/// `` `code` `` and line breaks. Content is not escaped.
pub fn markdown_to_markup(text: &str) -> String {
    text.split('\n')
        .map(convert_line)
        .collect::<Vec<_>>()
        .join("<br>")
}

fn convert_line(line: &str) -> String {
    match heading(line) {
        Some((level, content)) => format!("<h{level}>{}</h{level}>", convert_inline(content)),
        None => convert_inline(line),
    }
}

/// `#`..`######` at the start of a line, one optional space, then non-empty text.
fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    let content = rest.strip_prefix(' ').unwrap_or(rest);
    if content.trim().is_empty() {
        return None;
    }
    Some((level, content))
}

fn convert_inline(text: &str) -> String {
    let text = wrap_delimited(text, "**", "strong");
    let text = wrap_delimited(&text, "_", "em");
    wrap_delimited(&text, "`", "code")
}

/// Replace each `delim x delim` (x non-empty, shortest match) with `<tag>x</tag>`.
fn wrap_delimited(text: &str, delim: &str, tag: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(delim) {
        let after_open = &rest[start + delim.len()..];
        // Content must be at least one character long.
        let Some(first) = after_open.chars().next() else {
            break;
        };
        let search_from = first.len_utf8();
        let Some(end) = after_open[search_from..].find(delim).map(|i| i + search_from) else {
            break;
        };

        out.push_str(&rest[..start]);
        out.push_str(&format!("<{tag}>{}</{tag}>", &after_open[..end]));
        rest = &after_open[end + delim.len()..];
    }

    out.push_str(rest);
    out
}
