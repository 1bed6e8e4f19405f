// src/core/extract.rs — Scraping titles, outlines and scores out of model replies
//
// All parsers are total: malformed input yields a documented default,
// never an error.

/// Title used when a topic reply carries no `《…》` title.
pub const FALLBACK_TITLE: &str = "AI时代的思考";

/// Score assumed when a scorer reply contains no integer.
pub const DEFAULT_SCORE: u8 = 50;

/// Initial best score; any real score ties or beats it.
pub const WORST_SCORE: u8 = 100;

const TITLE_OPEN: char = '《';
const TITLE_CLOSE: char = '》';

/// First `《…》`-delimited title, without delimiters. Empty titles count as absent.
pub fn extract_title(text: &str) -> Option<String> {
    let start = text.find(TITLE_OPEN)? + TITLE_OPEN.len_utf8();
    let len = text[start..].find(TITLE_CLOSE)?;
    let title = text[start..start + len].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Text after the first `大纲：` / `大纲:` marker, or empty.
pub fn extract_outline(text: &str) -> String {
    let markers = ["大纲：", "大纲:"];
    markers
        .iter()
        .filter_map(|m| text.find(m).map(|i| i + m.len()))
        .min()
        .map(|start| text[start..].trim().to_string())
        .unwrap_or_default()
}

/// First integer in `text`, optionally preceded by `-`. Saturates instead of overflowing.
pub fn first_integer(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let negative = start > 0 && bytes[start - 1] == b'-';

    let mut value: i64 = 0;
    for b in bytes[start..].iter().take_while(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    Some(if negative { -value } else { value })
}

/// Clamp any integer into the [0, 100] score range.
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Score from a scorer reply: first integer, clamped; `None` when there is none.
pub fn parse_score(text: &str) -> Option<u8> {
    first_integer(text).map(clamp_score)
}

/// Like [`parse_score`] but substitutes [`DEFAULT_SCORE`].
pub fn parse_score_or_default(text: &str) -> u8 {
    parse_score(text).unwrap_or(DEFAULT_SCORE)
}
