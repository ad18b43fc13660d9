//! Locale detection for incoming questions.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

const BENGALI_BLOCK: RangeInclusive<char> = '\u{0980}'..='\u{09FF}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "bn")]
    Bengali,
    #[default]
    #[serde(rename = "en")]
    English,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::Bengali => "bn",
            Locale::English => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Any character from the Bengali Unicode block makes the text Bengali.
pub fn detect_language(text: &str) -> Locale {
    if text.chars().any(|c| BENGALI_BLOCK.contains(&c)) {
        Locale::Bengali
    } else {
        Locale::default()
    }
}
