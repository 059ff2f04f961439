//! Turns a free-form markdown reply into a PR title and body.
//!
//! Parsing never fails. Replies are searched for the `**Title:**` marker the
//! current prompt asks for, then for a bare `title:` line as older replies used,
//! and otherwise fall back to [`DEFAULT_TITLE`] with the whole reply as body.

pub const DEFAULT_TITLE: &str = "feat: Default AI Generated Title";

const TITLE_MARKER: &str = "**Title:**";
const LEGACY_TITLE_MARKER: &str = "title:";
const FENCE: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPr {
    pub title: String,
    pub body: String,
}

pub fn parse(raw: &str) -> ParsedPr {
    let lines: Vec<&str> = raw.lines().collect();

    let found = find_marker(&lines, TITLE_MARKER).or_else(|| {
        log::debug!("No {TITLE_MARKER} line in response, trying legacy marker");
        find_marker(&lines, LEGACY_TITLE_MARKER)
    });

    let (title, body_start) = match found {
        Some((idx, title)) => (title, idx + 1),
        None => {
            log::warn!("No title found in AI response, using default title");
            (String::new(), 0)
        }
    };

    let title = if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    };

    let body = lines.get(body_start..).unwrap_or_default().join("\n");

    ParsedPr {
        title,
        body: strip_fences(body.trim()).to_string(),
    }
}

/// First line starting with `marker` (ASCII case-insensitive), with the title text after it.
fn find_marker(lines: &[&str], marker: &str) -> Option<(usize, String)> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        let line = line.trim_start();
        let head = line.get(..marker.len())?;
        if head.eq_ignore_ascii_case(marker) {
            Some((idx, line[marker.len()..].trim().to_string()))
        } else {
            None
        }
    })
}

fn strip_fences(body: &str) -> &str {
    let mut body = body;

    if let Some(rest) = body.strip_prefix(FENCE) {
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
            body = rest;
        }
    }

    if let Some(rest) = body.strip_suffix(FENCE) {
        if rest.is_empty() || rest.ends_with('\n') {
            body = rest;
        }
    }

    body.trim()
}
