// src/cover/style.rs — Cover styles and palettes

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::infra::errors::DraftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverStyle {
    Elegant,
    Tech,
    Warm,
    Bold,
    Minimal,
    Playful,
    Nature,
    Retro,
}

/// Background, accent and text colours for the placeholder cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
}

impl CoverStyle {
    pub const ALL: [CoverStyle; 8] = [
        CoverStyle::Elegant,
        CoverStyle::Tech,
        CoverStyle::Warm,
        CoverStyle::Bold,
        CoverStyle::Minimal,
        CoverStyle::Playful,
        CoverStyle::Nature,
        CoverStyle::Retro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverStyle::Elegant => "elegant",
            CoverStyle::Tech => "tech",
            CoverStyle::Warm => "warm",
            CoverStyle::Bold => "bold",
            CoverStyle::Minimal => "minimal",
            CoverStyle::Playful => "playful",
            CoverStyle::Nature => "nature",
            CoverStyle::Retro => "retro",
        }
    }

    pub fn palette(&self) -> Palette {
        let (bg, accent, text) = match self {
            CoverStyle::Elegant => ("#F5F0E6", "#5B8A8A", "#2D3748"),
            CoverStyle::Tech => ("#1A202C", "#00D4FF", "#FFFFFF"),
            CoverStyle::Warm => ("#FFFAF0", "#ED8936", "#2D3748"),
            CoverStyle::Bold => ("#000000", "#F6E05E", "#FFFFFF"),
            CoverStyle::Minimal => ("#FFFFFF", "#000000", "#000000"),
            CoverStyle::Playful => ("#FFFBEB", "#9F7AEA", "#2D3748"),
            CoverStyle::Nature => ("#F5E6D3", "#276749", "#2D3748"),
            CoverStyle::Retro => ("#F5E6D3", "#C05621", "#2D3748"),
        };
        Palette { bg, accent, text }
    }

    /// Art direction handed to the image model.
    pub fn image_prompt(&self) -> &'static str {
        match self {
            CoverStyle::Elegant => {
                "elegant, sophisticated, minimalist, soft gradient colors, clean composition"
            }
            CoverStyle::Tech => {
                "modern, futuristic, geometric shapes, circuit patterns, glowing effects, tech style"
            }
            CoverStyle::Warm => "friendly, warm colors, rounded shapes, sunshine, inviting atmosphere",
            CoverStyle::Bold => "high contrast, vibrant colors, dramatic, eye-catching, bold typography",
            CoverStyle::Minimal => {
                "ultra-clean, zen-like, black and white with one accent color, lots of whitespace"
            }
            CoverStyle::Playful => "fun, pastel colors, doodles, cute elements, whimsical style",
            CoverStyle::Nature => "organic, earthy tones, plant motifs, natural textures, calming",
            CoverStyle::Retro => "vintage, muted colors, nostalgic, classic illustration style",
        }
    }

    /// Pick a style from the article text.
    pub fn auto_select(text: &str) -> CoverStyle {
        let lower = text.to_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has_any(&["ai", "科技", "技术", "数字", "算法"]) {
            CoverStyle::Tech
        } else if has_any(&["情感", "成长", "生活", "人生"]) {
            CoverStyle::Warm
        } else if has_any(&["自然", "环保", "健康"]) {
            CoverStyle::Nature
        } else {
            CoverStyle::Elegant
        }
    }
}

impl std::fmt::Display for CoverStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverStyle {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        CoverStyle::ALL
            .iter()
            .copied()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| DraftError::Config(format!("Unknown cover style '{}'", s)))
    }
}

/// Configured style: fixed, or chosen per article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreference {
    Auto,
    Fixed(CoverStyle),
}

impl StylePreference {
    pub fn resolve(&self, text: &str) -> CoverStyle {
        match self {
            StylePreference::Auto => CoverStyle::auto_select(text),
            StylePreference::Fixed(style) => *style,
        }
    }
}

impl FromStr for StylePreference {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(StylePreference::Auto)
        } else {
            s.parse().map(StylePreference::Fixed)
        }
    }
}
