use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;
use vim_modal::traits::TextBuffer;
use vim_modal::types::{Position, Range};

/// Rope-backed buffer with a snapshot undo timeline.
///
/// Undo groups nest; only the outermost `end_undo_group` records a step, and
/// only when the text changed inside it.
pub struct MockBuffer {
    rope: Rope,
    depth: u32,
    group_start: Option<Rope>,
    undo_stack: Vec<Rope>,
    redo_stack: Vec<Rope>,
    /// Edits applied outside of any undo group.
    pub ungrouped_edits: u32,
}

impl MockBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            depth: 0,
            group_start: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            ungrouped_edits: 0,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count()).map(|l| self.line_text(l)).collect()
    }

    /// Number of recorded undo steps.
    pub fn undo_steps(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn open_groups(&self) -> u32 {
        self.depth
    }

    fn char_index(&self, pos: Position) -> usize {
        let line = pos.line as usize;
        let text = self.line_text(pos.line);
        let byte = text
            .grapheme_indices(true)
            .nth(pos.col as usize)
            .map_or(text.len(), |(i, _)| i);
        self.rope.line_to_char(line) + text[..byte].chars().count()
    }
}

impl TextBuffer for MockBuffer {
    fn line_count(&self) -> u32 {
        self.rope.len_lines() as u32
    }

    fn line_text(&self, line: u32) -> String {
        if line as usize >= self.rope.len_lines() {
            return String::new();
        }
        let mut s = self.rope.line(line as usize).to_string();
        // Remove trailing newline if present
        if s.ends_with('\n') {
            s.pop();
        }
        s
    }

    fn replace_range(&mut self, range: Range, text: &str) {
        if self.depth == 0 {
            self.ungrouped_edits += 1;
        }
        let start = self.char_index(range.start);
        let end = self.char_index(range.end);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
    }

    fn begin_undo_group(&mut self) {
        if self.depth == 0 {
            self.group_start = Some(self.rope.clone());
        }
        self.depth += 1;
    }

    fn end_undo_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return;
        }
        if let Some(before) = self.group_start.take()
            && before != self.rope
        {
            self.undo_stack.push(before);
            self.redo_stack.clear();
        }
    }

    fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(before) => {
                let current = std::mem::replace(&mut self.rope, before);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(after) => {
                let current = std::mem::replace(&mut self.rope, after);
                self.undo_stack.push(current);
                true
            }
            None => false,
        }
    }
}
