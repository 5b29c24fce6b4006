//! HTML document with a mount anchor.
//!
//! # Responsibilities
//! - Locate the element whose `id` names the mount anchor
//! - Splice rendered content into that element
//!
//! # Design Decisions
//! - Plain text scan, no DOM: the page is ours and small
//! - Anchor lookup happens once at mount; rendering reuses the offsets

use std::ops::Range;

/// Why a document cannot host the application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    #[error("mount anchor `#{0}` not found in document")]
    MissingAnchor(String),

    #[error("mount anchor `#{0}` has no closing tag")]
    UnclosedAnchor(String),
}

/// An HTML page the shell mounts into.
#[derive(Debug, Clone)]
pub struct Document {
    html: String,
}

impl Document {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// The built-in page: a title, the anchor element and session controls.
    pub fn builtin(title: &str, anchor: &str) -> Self {
        Self::new(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
.error {{ padding: 1rem; border-radius: 4px; }}
.error.network {{ background: #fff4e5; }}
.error.application {{ background: #fdecea; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div id="{anchor}"></div>
<section id="mqtt">
<button class="mqtt-control" onclick="mqtt('start')">Start stream</button>
<button class="mqtt-control" onclick="mqtt('stop')">Stop stream</button>
<span id="mqtt-status"></span>
</section>
<script>
let pending = null;
function setControls(disabled) {{
  document.querySelectorAll('.mqtt-control').forEach(b => {{ b.disabled = disabled; }});
}}
async function mqtt(action) {{
  if (pending) return;
  setControls(true);
  pending = fetch('/mqtt/' + action, {{ method: 'POST' }});
  try {{
    const res = await pending;
    const body = await res.json();
    document.getElementById('mqtt-status').textContent = body.status || body.error;
  }} catch (e) {{
    document.getElementById('mqtt-status').textContent = 'backend unreachable';
  }} finally {{
    pending = null;
    setControls(false);
  }}
}}
fetch('/mqtt/status').then(r => r.json()).then(s => {{
  document.getElementById('mqtt-status').textContent = s.state;
}}).catch(() => {{}});
</script>
</body>
</html>
"#,
            title = escape_html(title),
            anchor = escape_html(anchor),
        ))
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Byte range of the anchor element's inner content.
    pub fn anchor_range(&self, anchor: &str) -> Result<Range<usize>, MountError> {
        let html = self.html.as_str();
        // Ids are matched as written in the markup, entity-escaped.
        let id = escape_html(anchor);
        let attr_pos = [format!("id=\"{id}\""), format!("id='{id}'")]
            .iter()
            .filter_map(|needle| find_attribute(html, needle))
            .min()
            .ok_or_else(|| MountError::MissingAnchor(anchor.to_string()))?;

        let unclosed = || MountError::UnclosedAnchor(anchor.to_string());

        let tag_start = html[..attr_pos].rfind('<').ok_or_else(unclosed)?;
        let tag_name: String = html[tag_start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let open_end = attr_pos + html[attr_pos..].find('>').ok_or_else(unclosed)?;
        if tag_name.is_empty() || html[..open_end].ends_with('/') {
            return Err(unclosed());
        }

        let inner_start = open_end + 1;
        let inner_end = find_matching_close(html, inner_start, &tag_name).ok_or_else(unclosed)?;
        Ok(inner_start..inner_end)
    }

    /// Copy of the document with `content` as the anchor's only child.
    pub fn with_content(&self, range: &Range<usize>, content: &str) -> String {
        let mut out = String::with_capacity(self.html.len() + content.len());
        out.push_str(&self.html[..range.start]);
        out.push_str(content);
        out.push_str(&self.html[range.end..]);
        out
    }
}

/// Position of `needle` where it is a whole attribute, not a suffix of one
/// such as `data-id="app"`.
fn find_attribute(html: &str, needle: &str) -> Option<usize> {
    html.match_indices(needle)
        .map(|(pos, _)| pos)
        .find(|&pos| pos > 0 && html[..pos].ends_with(|c: char| c.is_ascii_whitespace()))
}

/// Offset of the `</tag>` that closes an element whose content starts at `from`.
fn find_matching_close(html: &str, from: usize, tag: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut depth = 1usize;
    let mut cursor = from;

    loop {
        let next_close = lower[cursor..].find(&close)? + cursor;
        let next_open = lower[cursor..]
            .match_indices(&open)
            .map(|(pos, _)| pos + cursor)
            .find(|&pos| {
                lower[pos + open.len()..]
                    .chars()
                    .next()
                    .map(|c| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(false)
            });

        match next_open {
            Some(pos) if pos < next_close => {
                depth += 1;
                cursor = pos + open.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(next_close);
                }
                cursor = next_close + close.len();
            }
        }
    }
}

/// Escape text for use in HTML content and attribute values.
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
