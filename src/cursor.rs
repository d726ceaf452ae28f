use crate::traits::TextBuffer;
use crate::types::{Position, Selection, VisualKind};

/// One independent cursor.
///
/// The anchor is only present while a visual mode is active. The preferred
/// column remembers where vertical motions should land on long lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub position: Position,
    pub anchor: Option<Position>,
    pub preferred_col: Option<u32>,
}

impl Cursor {
    pub const fn new(position: Position) -> Self {
        Self {
            position,
            anchor: None,
            preferred_col: None,
        }
    }

    /// Moves the cursor, forgetting the preferred column.
    pub fn move_to(&mut self, position: Position) {
        self.position = position;
        self.preferred_col = None;
    }

    pub fn selection(&self, kind: VisualKind) -> Option<Selection> {
        self.anchor.map(|anchor| Selection {
            anchor,
            head: self.position,
            kind,
        })
    }
}

impl From<Position> for Cursor {
    fn from(position: Position) -> Self {
        Self::new(position)
    }
}

/// Ordered set of cursors. The first cursor is the primary one and the set is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::single(Position::ZERO)
    }
}

impl CursorSet {
    pub fn single(position: Position) -> Self {
        Self {
            cursors: vec![Cursor::new(position)],
        }
    }

    /// Builds a set from `cursors`, falling back to a single cursor at the
    /// origin when the input is empty.
    pub fn from_cursors(cursors: Vec<Cursor>) -> Self {
        let mut set = if cursors.is_empty() {
            Self::default()
        } else {
            Self { cursors }
        };
        set.dedup();
        set
    }

    pub fn primary(&self) -> &Cursor {
        &self.cursors[0]
    }

    pub fn primary_mut(&mut self) -> &mut Cursor {
        &mut self.cursors[0]
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cursor> {
        self.cursors.iter_mut()
    }

    pub fn as_slice(&self) -> &[Cursor] {
        &self.cursors
    }

    pub fn positions(&self) -> Vec<Position> {
        self.cursors.iter().map(|c| c.position).collect()
    }

    /// Adds a cursor unless one already sits at the same position.
    pub fn push(&mut self, cursor: Cursor) {
        if self.cursors.iter().all(|c| c.position != cursor.position) {
            self.cursors.push(cursor);
        }
    }

    /// Drops every cursor but the primary.
    pub fn collapse(&mut self) {
        self.cursors.truncate(1);
    }

    /// Keeps the first `len` cursors.
    pub fn truncate(&mut self, len: usize) {
        self.cursors.truncate(len.max(1));
    }

    /// Removes cursors that landed on the same position as an earlier one.
    pub fn dedup(&mut self) {
        let mut seen: Vec<Position> = Vec::with_capacity(self.cursors.len());
        self.cursors.retain(|c| {
            if seen.contains(&c.position) {
                false
            } else {
                seen.push(c.position);
                true
            }
        });
    }

    pub fn set_anchors(&mut self) {
        for cursor in &mut self.cursors {
            cursor.anchor = Some(cursor.position);
        }
    }

    pub fn clear_anchors(&mut self) {
        for cursor in &mut self.cursors {
            cursor.anchor = None;
        }
    }

    /// Clamps every cursor to the buffer. `normal` keeps cursors on a
    /// character rather than past the end of the line.
    pub fn clamp<B: TextBuffer + ?Sized>(&mut self, buf: &B, normal: bool) {
        for cursor in &mut self.cursors {
            cursor.position = if normal {
                buf.clamp_normal(cursor.position)
            } else {
                buf.clamp(cursor.position)
            };
            if let Some(anchor) = cursor.anchor {
                cursor.anchor = Some(buf.clamp(anchor));
            }
        }
        self.dedup();
    }

    /// Replaces the whole set, keeping at least one cursor.
    pub fn replace(&mut self, cursors: Vec<Cursor>) {
        *self = Self::from_cursors(cursors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_ignores_duplicates_and_keeps_primary_first() {
        let mut set = CursorSet::single(Position::new(1, 0));
        set.push(Cursor::new(Position::new(0, 0)));
        set.push(Cursor::new(Position::new(1, 0)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.primary().position, Position::new(1, 0));

        set.collapse();
        assert_eq!(set.positions(), vec![Position::new(1, 0)]);
    }

    #[test]
    fn empty_input_falls_back_to_origin() {
        let set = CursorSet::from_cursors(Vec::new());
        assert_eq!(set.positions(), vec![Position::ZERO]);
    }

    #[test]
    fn anchors_follow_visual_lifecycle() {
        let mut set = CursorSet::single(Position::new(0, 3));
        set.set_anchors();
        set.primary_mut().position = Position::new(0, 5);
        let sel = set.primary().selection(VisualKind::CharWise).unwrap();
        assert_eq!(sel.start(), Position::new(0, 3));
        assert_eq!(sel.end(), Position::new(0, 5));

        set.clear_anchors();
        assert!(set.primary().selection(VisualKind::CharWise).is_none());
    }
}
