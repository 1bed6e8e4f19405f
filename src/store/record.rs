// src/store/record.rs — On-disk article record format
//
// Current format: an HTML comment header with `Key: value` lines, a blank
// line, then the raw body. Older records used a Markdown `# Title` line and
// `**Provider**:` / `**AI Score**:` lines near the top; those still parse.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Legacy metadata is only looked for in this many leading lines.
const LEGACY_SCAN_LINES: usize = 15;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub title: Option<String>,
    pub score: Option<u8>,
    pub provider: Option<String>,
    pub time: Option<String>,
    pub cover: Option<String>,
}

/// Serialize a record: header comment, blank line, body.
pub fn render_record(
    title: &str,
    score: u8,
    provider: &str,
    created_at: &DateTime<Local>,
    cover: Option<&str>,
    body: &str,
) -> String {
    let mut out = String::with_capacity(body.len() + 160);
    out.push_str("<!--\n");
    out.push_str(&format!("Title: {}\n", single_line(title)));
    out.push_str(&format!("AI Score: {}%\n", score));
    out.push_str(&format!("Provider: {}\n", single_line(provider)));
    out.push_str(&format!("Time: {}\n", created_at.format(TIME_FORMAT)));
    if let Some(cover) = cover {
        out.push_str(&format!("Cover: {}\n", single_line(cover)));
    }
    out.push_str("-->\n\n");
    out.push_str(body);
    out
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

/// Parse whatever metadata a record carries. Missing fields stay `None`.
///
/// A record that opens with a header comment is described by that comment
/// alone; the body is never scanned.
pub fn parse_header(text: &str) -> RecordHeader {
    if text.trim_start().starts_with("<!--") {
        parse_comment_header(text)
    } else {
        parse_legacy_header(text)
    }
}

fn parse_comment_header(text: &str) -> RecordHeader {
    let mut header = RecordHeader::default();
    for line in text.trim_start().lines().skip(1) {
        let line = line.trim();
        if line == "-->" {
            break;
        }
        if let Some(v) = value_after(line, "Title:") {
            header.title = Some(v);
        } else if let Some(v) = value_after(line, "Provider:") {
            header.provider = Some(v);
        } else if let Some(v) = value_after(line, "AI Score:") {
            header.score = parse_percent(&v);
        } else if let Some(v) = value_after(line, "Time:") {
            header.time = Some(v);
        } else if let Some(v) = value_after(line, "Cover:") {
            header.cover = Some(v);
        }
    }
    header
}

fn parse_legacy_header(text: &str) -> RecordHeader {
    let mut header = RecordHeader::default();
    for line in text.lines().take(LEGACY_SCAN_LINES) {
        let trimmed = line.trim();
        if header.title.is_none() && trimmed.starts_with("# ") {
            header.title = Some(trimmed[2..].trim().to_string());
        } else if let Some(v) = legacy_value(trimmed, "Provider") {
            header.provider = Some(v);
        } else if let Some(v) = legacy_value(trimmed, "AI Score") {
            header.score = parse_percent(&v);
        }
    }
    header
}

/// Record body with the header comment removed.
pub fn body(text: &str) -> &str {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("<!--") {
        return text;
    }
    match trimmed.find("-->") {
        Some(end) => trimmed[end + 3..].trim_start_matches(['\r', '\n']),
        None => text,
    }
}

/// `Key: value` with the key at the start of the line.
fn value_after(line: &str, key: &str) -> Option<String> {
    line.trim_start()
        .strip_prefix(key)
        .map(|v| v.trim().to_string())
}

/// `**Key**: value` or `**Key:** value`.
fn legacy_value(line: &str, key: &str) -> Option<String> {
    let rest = line
        .strip_prefix(&format!("**{}**:", key))
        .or_else(|| line.strip_prefix(&format!("**{}:**", key)))?;
    Some(rest.trim().to_string())
}

fn parse_percent(s: &str) -> Option<u8> {
    s.trim().trim_end_matches('%').trim().parse::<u8>().ok()
}

/// Short provider name for listings.
pub fn short_provider(label: &str) -> String {
    // More specific labels first
    if label.contains("Gemini 3 Pro") || label.contains("Gemini API") {
        "Gemini API".into()
    } else if label.contains("Gemini Web + DeepSeek") {
        "Gemini Web + DeepSeek".into()
    } else if label.contains("Gemini Web") {
        "Gemini Web".into()
    } else if label.contains("Zhipu GLM") {
        "智谱 GLM".into()
    } else {
        label.to_string()
    }
}
