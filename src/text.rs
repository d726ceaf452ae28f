//! Grapheme and character-class helpers used by the resolvers.

use unicode_segmentation::UnicodeSegmentation;

/// Splits a line into extended grapheme clusters.
pub fn graphemes(s: &str) -> Vec<&str> {
    s.graphemes(true).collect()
}

pub fn grapheme_count(s: &str) -> u32 {
    s.graphemes(true).count() as u32
}

/// Byte offset of grapheme column `col`, clamped to the end of the string.
pub fn byte_offset(s: &str, col: u32) -> usize {
    s.grapheme_indices(true)
        .nth(col as usize)
        .map_or(s.len(), |(i, _)| i)
}

/// Grapheme column of byte offset `byte`.
pub fn col_of_byte(s: &str, byte: usize) -> u32 {
    s.grapheme_indices(true).take_while(|(i, _)| *i < byte).count() as u32
}

/// Position after inserting `text` at `(line, col)`.
pub fn end_after_insert(line: u32, col: u32, text: &str) -> (u32, u32) {
    match text.rfind('\n') {
        None => (line, col + grapheme_count(text)),
        Some(idx) => {
            let breaks = text.matches('\n').count() as u32;
            (line + breaks, grapheme_count(&text[idx + 1..]))
        }
    }
}

/// Character classes that delimit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Word,
    Punctuation,
    /// An empty line, which word motions treat as a word of its own.
    EmptyLine,
}

/// Classifies a grapheme. With `big` set, only blanks separate WORDs.
pub fn char_class(grapheme: &str, big: bool) -> CharClass {
    let Some(c) = grapheme.chars().next() else {
        return CharClass::EmptyLine;
    };
    if c.is_whitespace() {
        CharClass::Blank
    } else if big || c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

pub fn is_blank_line(line: &str) -> bool {
    line.chars().all(char::is_whitespace)
}
