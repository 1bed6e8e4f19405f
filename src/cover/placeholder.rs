// src/cover/placeholder.rs — Offline SVG cover from the style palette

use async_trait::async_trait;
use chrono::Local;
use std::path::PathBuf;

use super::{CoverGenerator, CoverImage, CoverStyle};
use crate::infra::errors::DraftError;
use crate::util::preview;

const WIDTH: u32 = 1080;
const HEIGHT: u32 = 460;
const TITLE_CHARS: usize = 15;

pub struct PlaceholderCover {
    out_dir: PathBuf,
}

impl PlaceholderCover {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the cover: accent bar on the left, a disc top right, title and date.
pub fn render_svg(title: &str, style: CoverStyle, subtitle: &str) -> String {
    let p = style.palette();
    let title = escape_xml(&preview(title, TITLE_CHARS));
    let subtitle = escape_xml(subtitle);
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <rect x="0" y="0" width="{w}" height="{h}" fill="{bg}"/>
  <rect x="50" y="50" width="150" height="360" fill="{accent}"/>
  <ellipse cx="{cx}" cy="125" rx="100" ry="75" fill="{accent}"/>
  <g font-family="Microsoft YaHei, PingFang SC, Noto Sans CJK SC, sans-serif" fill="{text}">
    <text x="250" y="228" font-size="48">{title}</text>
    <text x="250" y="264" font-size="24">{subtitle}</text>
  </g>
</svg>
"#,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH - 150,
        bg = p.bg,
        accent = p.accent,
        text = p.text,
        title = title,
        subtitle = subtitle,
    )
}

#[async_trait]
impl CoverGenerator for PlaceholderCover {
    fn method(&self) -> &str {
        "placeholder"
    }

    async fn generate(
        &self,
        title: &str,
        _text: &str,
        style: CoverStyle,
    ) -> Result<Option<CoverImage>, DraftError> {
        let now = Local::now();
        let svg = render_svg(title, style, &now.format("%Y年%m月%d日").to_string());

        tokio::fs::create_dir_all(&self.out_dir).await?;
        let file_name = format!("cover_{}.svg", now.format("%Y%m%d_%H%M%S"));
        let path = self.out_dir.join(&file_name);
        tokio::fs::write(&path, svg).await?;

        Ok(Some(CoverImage {
            file_name,
            path,
            method: self.method().to_string(),
        }))
    }
}
