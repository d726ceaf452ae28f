//! Batched buffer edits.
//!
//! A command produces one [`Edit`] per cursor. [`apply_edits`] validates the
//! whole batch, applies it bottom-to-top inside a single undo group and
//! reports where each replacement landed, so cursors can be re-synchronised
//! without re-reading the buffer.

use thiserror::Error;

use crate::text::end_after_insert;
use crate::traits::TextBuffer;
use crate::types::{Position, Range};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit {second} overlaps edit {first}")]
    Conflict { first: Range, second: Range },
    #[error("edit range {range} is out of bounds")]
    OutOfBounds { range: Range },
}

pub type Result<T> = std::result::Result<T, EditError>;

/// Replace `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::replace(Range::point(at), text)
    }

    pub fn delete(range: Range) -> Self {
        Self::replace(range, String::new())
    }

    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.text.is_empty()
    }
}

/// Where an edit's replacement text sits after the whole batch was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedEdit {
    pub start: Position,
    pub end: Position,
}

/// Result of [`apply_edits`].
#[derive(Debug, Clone, Default)]
pub struct Applied {
    /// One entry per input edit, in input order.
    edits: Vec<AppliedEdit>,
    /// Original range and new placement, sorted by position.
    sorted: Vec<(Range, AppliedEdit)>,
}

impl Applied {
    pub fn edit(&self, index: usize) -> AppliedEdit {
        self.edits.get(index).copied().unwrap_or_default()
    }

    pub fn edits(&self) -> &[AppliedEdit] {
        &self.edits
    }

    /// Maps a pre-edit position into the edited buffer. Positions inside a
    /// replaced range collapse to the start of the replacement.
    pub fn map(&self, pos: Position) -> Position {
        let idx = self.sorted.partition_point(|(range, _)| range.start <= pos);
        let Some((range, applied)) = idx.checked_sub(1).and_then(|i| self.sorted.get(i)) else {
            return pos;
        };
        if pos < range.end {
            return applied.start;
        }
        shift(pos, range.end, applied.end)
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Translates `pos`, which lies at or after `orig_end`, once the text ending
/// at `orig_end` now ends at `new_end`.
fn shift(pos: Position, orig_end: Position, new_end: Position) -> Position {
    if pos.line == orig_end.line {
        Position::new(new_end.line, new_end.col + pos.col.saturating_sub(orig_end.col))
    } else {
        Position::new(new_end.line + (pos.line - orig_end.line), pos.col)
    }
}

fn check_bounds<B: TextBuffer + ?Sized>(buf: &B, range: Range) -> Result<()> {
    let in_bounds = |p: Position| p.line <= buf.last_line() && p.col <= buf.line_len(p.line);
    if range.start > range.end || !in_bounds(range.start) || !in_bounds(range.end) {
        return Err(EditError::OutOfBounds { range });
    }
    Ok(())
}

/// Applies a batch of edits as one undo step.
///
/// Edits may be given in any order; they are applied from the bottom of the
/// buffer upwards so that no edit shifts a range that is still pending. The
/// buffer is left untouched when any edit is out of bounds or two edits
/// overlap.
pub fn apply_edits<B: TextBuffer + ?Sized>(buf: &mut B, edits: &[Edit]) -> Result<Applied> {
    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by_key(|&i| (edits[i].range.start, edits[i].range.end));

    for &i in &order {
        check_bounds(buf, edits[i].range)?;
    }
    for pair in order.windows(2) {
        let (first, second) = (edits[pair[0]].range, edits[pair[1]].range);
        if first.end > second.start {
            return Err(EditError::Conflict { first, second });
        }
    }

    let mut applied = Applied {
        edits: vec![AppliedEdit::default(); edits.len()],
        sorted: Vec::with_capacity(edits.len()),
    };
    let mut last: Option<(Position, Position)> = None;
    for &i in &order {
        let edit = &edits[i];
        let start = match last {
            Some((orig_end, new_end)) => shift(edit.range.start, orig_end, new_end),
            None => edit.range.start,
        };
        let (line, col) = end_after_insert(start.line, start.col, &edit.text);
        let placed = AppliedEdit {
            start,
            end: Position::new(line, col),
        };
        applied.edits[i] = placed;
        applied.sorted.push((edit.range, placed));
        last = Some((edit.range.end, placed.end));
    }

    buf.begin_undo_group();
    for &i in order.iter().rev() {
        let edit = &edits[i];
        if edit.is_noop() {
            continue;
        }
        tracing::trace!(range = %edit.range, text = ?edit.text, "replace range");
        buf.replace_range(edit.range, &edit.text);
    }
    buf.end_undo_group();

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::byte_offset;

    struct Lines(Vec<String>);

    impl Lines {
        fn new(text: &str) -> Self {
            Self(text.split('\n').map(str::to_string).collect())
        }
    }

    impl TextBuffer for Lines {
        fn line_count(&self) -> u32 {
            self.0.len() as u32
        }

        fn line_text(&self, line: u32) -> String {
            self.0.get(line as usize).cloned().unwrap_or_default()
        }

        fn replace_range(&mut self, range: Range, text: &str) {
            let mut flat = self.0.join("\n");
            let offset = |p: Position, lines: &[String]| {
                let before: usize = lines[..p.line as usize].iter().map(|l| l.len() + 1).sum();
                before + byte_offset(&lines[p.line as usize], p.col)
            };
            let from = offset(range.start, &self.0);
            let to = offset(range.end, &self.0);
            flat.replace_range(from..to, text);
            *self = Lines::new(&flat);
        }
    }

    #[test]
    fn applies_bottom_up_and_reports_placements() {
        let mut buf = Lines::new("ab\ncd\nef");
        let edits = vec![
            Edit::insert(Position::new(0, 1), "X\nY"),
            Edit::insert(Position::new(2, 0), "Z"),
            Edit::delete(Range::new(Position::new(1, 0), Position::new(1, 1))),
        ];
        let applied = apply_edits(&mut buf, &edits).unwrap();

        assert_eq!(buf.text(), "aX\nYb\nd\nZef");
        assert_eq!(applied.edit(0).end, Position::new(1, 1));
        assert_eq!(applied.edit(2).start, Position::new(2, 0));
        assert_eq!(applied.edit(1).start, Position::new(3, 0));
        assert_eq!(applied.edit(1).end, Position::new(3, 1));
    }

    #[test]
    fn maps_positions_through_same_line_edits() {
        let mut buf = Lines::new("hello world");
        let edits = vec![
            Edit::insert(Position::new(0, 0), ">>"),
            Edit::delete(Range::new(Position::new(0, 5), Position::new(0, 6))),
        ];
        let applied = apply_edits(&mut buf, &edits).unwrap();

        assert_eq!(buf.text(), ">>helloworld");
        assert_eq!(applied.map(Position::new(0, 8)), Position::new(0, 9));
        assert_eq!(applied.map(Position::new(0, 5)), Position::new(0, 7));
    }

    #[test]
    fn overlapping_edits_leave_buffer_untouched() {
        let mut buf = Lines::new("abcdef");
        let edits = vec![
            Edit::delete(Range::new(Position::new(0, 0), Position::new(0, 3))),
            Edit::delete(Range::new(Position::new(0, 2), Position::new(0, 4))),
        ];
        let err = apply_edits(&mut buf, &edits).unwrap_err();
        assert!(matches!(err, EditError::Conflict { .. }));
        assert_eq!(buf.text(), "abcdef");
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut buf = Lines::new("ab");
        let edits = vec![Edit::insert(Position::new(3, 0), "x")];
        assert!(matches!(
            apply_edits(&mut buf, &edits),
            Err(EditError::OutOfBounds { .. })
        ));
    }
}
