//! Text processing module for melprep
//!
//! Provides transcript normalization (literal or pinyin) and the symbol
//! vocabulary used to turn transcripts into index sequences.

mod normalizer;
mod vocab;

pub use normalizer::{strip_whitespace, to_pinyin_numeric, TextMode, TextNormalizer};
pub use vocab::{Vocabulary, VocabularyBuilder, PAD_ID, PAD_TOKEN, UNK_ID, UNK_TOKEN};

/// Normalize a transcript and encode it, growing the vocabulary if allowed
pub fn process_text(
    text: &str,
    normalizer: &TextNormalizer,
    vocab: &mut VocabularyBuilder,
) -> Vec<i64> {
    let symbols = normalizer.symbols(text);
    vocab.encode(symbols.iter().map(String::as_str))
}

/// Check if character is Chinese
pub fn is_chinese_char(ch: char) -> bool {
    matches!(ch as u32,
        0x4E00..=0x9FFF |     // CJK Unified Ideographs
        0x3400..=0x4DBF |     // CJK Unified Ideographs Extension A
        0x20000..=0x2A6DF |   // CJK Unified Ideographs Extension B
        0x2A700..=0x2B73F |   // CJK Unified Ideographs Extension C
        0x2B740..=0x2B81F |   // CJK Unified Ideographs Extension D
        0xF900..=0xFAFF |     // CJK Compatibility Ideographs
        0x2F800..=0x2FA1F     // CJK Compatibility Ideographs Supplement
    )
}
