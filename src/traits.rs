use crate::text::{byte_offset, grapheme_count, graphemes};
use crate::types::{Position, Range};

/// The host editor's text buffer, as seen by the mode handler.
///
/// Only the three required methods touch host storage; everything else has a
/// default built on them. Positions are grapheme columns; a range ending at
/// column 0 of the next line includes the line break.
pub trait TextBuffer {
    fn line_count(&self) -> u32;
    /// Text of `line` without its line ending; empty when out of range.
    fn line_text(&self, line: u32) -> String;
    fn replace_range(&mut self, range: Range, text: &str);

    fn text(&self) -> String {
        (0..self.line_count())
            .map(|line| self.line_text(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // Undo timeline. Groups nest; only the outermost end closes an undo step,
    // and only when the text changed inside the group.
    fn begin_undo_group(&mut self) {}
    fn end_undo_group(&mut self) {}
    /// Undoes one step. Returns false when there was nothing to undo.
    fn undo(&mut self) -> bool {
        false
    }
    fn redo(&mut self) -> bool {
        false
    }

    fn line_len(&self, line: u32) -> u32 {
        grapheme_count(&self.line_text(line))
    }

    fn last_line(&self) -> u32 {
        self.line_count().saturating_sub(1)
    }

    fn line_start(&self, line: u32) -> Position {
        Position {
            line: line.min(self.last_line()),
            col: 0,
        }
    }

    /// Last character of the line (before the newline, if any).
    fn line_end(&self, line: u32) -> Position {
        let line = line.min(self.last_line());
        let len = self.line_len(line);
        Position {
            line,
            col: len.saturating_sub(1),
        }
    }

    /// Clamps allowing the column just past the last character.
    fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        let col = pos.col.min(self.line_len(line));
        Position { line, col }
    }

    /// Clamps onto an existing character, as Normal mode requires.
    fn clamp_normal(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        let col = pos.col.min(self.line_len(line).saturating_sub(1));
        Position { line, col }
    }

    /// The position just past the last character of the buffer.
    fn end_of_buffer(&self) -> Position {
        let line = self.last_line();
        Position {
            line,
            col: self.line_len(line),
        }
    }

    fn grapheme_at(&self, pos: Position) -> Option<String> {
        let text = self.line_text(pos.line);
        graphemes(&text).get(pos.col as usize).map(|g| g.to_string())
    }

    // Extract text from a range for yanking
    fn slice_to_string(&self, range: Range) -> String {
        let Range { start, end } = range;
        if start >= end {
            return String::new();
        }
        let mut out = String::new();
        for line in start.line..=end.line.min(self.last_line()) {
            let text = self.line_text(line);
            let from = if line == start.line {
                byte_offset(&text, start.col)
            } else {
                0
            };
            let to = if line == end.line {
                byte_offset(&text, end.col)
            } else {
                text.len()
            };
            out.push_str(&text[from.min(to)..to]);
            if line < end.line {
                out.push('\n');
            }
        }
        out
    }
}

/// Storage behind the `+` and `*` registers.
pub trait Clipboard {
    fn get(&mut self) -> Option<String>;
    fn set(&mut self, text: String);
}

/// System clipboard backed by `arboard`.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, arboard::Error> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn get(&mut self) -> Option<String> {
        match self.inner.get_text() {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!("failed to read system clipboard: {err}");
                None
            }
        }
    }

    fn set(&mut self, text: String) {
        if let Err(err) = self.inner.set_text(text) {
            tracing::warn!("failed to write system clipboard: {err}");
        }
    }
}
