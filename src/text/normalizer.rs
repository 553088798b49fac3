//! Transcript normalization
//!
//! Turns raw transcript text into the symbol string that gets tokenized,
//! either as literal characters or through numeric-tone pinyin.

use lazy_static::lazy_static;
use pinyin::ToPinyin;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::is_chinese_char;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// How transcript text is turned into symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    /// Hanzi become tone-numbered pinyin syllables, one space between units
    #[default]
    Pinyin,
    /// Characters are used as-is
    Literal,
}

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    mode: TextMode,
}

impl TextNormalizer {
    pub fn new(mode: TextMode) -> Self {
        Self { mode }
    }

    /// Normalize transcript text into its symbol string
    pub fn normalize(&self, text: &str) -> String {
        let text = text.trim();
        match self.mode {
            TextMode::Literal => text.to_string(),
            TextMode::Pinyin => to_pinyin_numeric(text),
        }
    }

    /// Normalize and split into single-character symbols
    pub fn symbols(&self, text: &str) -> Vec<String> {
        self.normalize(text).chars().map(String::from).collect()
    }
}

/// Remove every run of whitespace
pub fn strip_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, "").into_owned()
}

/// Transliterate hanzi to pinyin with trailing tone digits
///
/// Each character becomes one unit (a syllable such as `zhong1`, or the
/// character itself when it has no reading) and units are joined by a single
/// space.
pub fn to_pinyin_numeric(text: &str) -> String {
    let units: Vec<String> = text
        .chars()
        .map(|ch| {
            if is_chinese_char(ch) {
                if let Some(reading) = ch.to_pinyin() {
                    return reading.with_tone_num_end().to_string();
                }
            }
            ch.to_string()
        })
        .collect();
    units.join(" ")
}
