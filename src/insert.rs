//! Insert and Replace mode.
//!
//! Entering either mode starts an [`InsertSession`]. The session lives until
//! Escape and records what was typed, so that a count (`3ia<Esc>`) and `.`
//! can replay it. The undo group opened by the entering command stays open
//! for the whole session.

use crate::command::InsertKind;
use crate::cursor::Cursor;
use crate::edit::{Applied, Edit};
use crate::handler::{KeyOutcome, LastChange, ModeHandler};
use crate::indent::{display_width, leading_whitespace};
use crate::key::{KeyCode, KeyEvent, Modifiers};
use crate::motion::first_non_blank;
use crate::operator::{Region, selection_region};
use crate::text::{CharClass, byte_offset, char_class, grapheme_count, graphemes, is_blank_line};
use crate::traits::TextBuffer;
use crate::types::{Mode, Position, Range};

#[derive(Debug, Clone, Default)]
pub(crate) struct InsertSession {
    replace: bool,
    count: u32,
    typed: Vec<KeyEvent>,
    /// Text typed at the primary cursor, for the `.` register.
    text: String,
    /// The cursors sit right after an indent nobody typed.
    pub(crate) fresh_indent: bool,
    /// Replace mode: what each typed character overwrote, per cursor.
    /// `None` marks a character appended past the end of the line.
    replaced: Vec<Vec<Option<String>>>,
    /// Cursors to keep when the session ends.
    pub(crate) keep: Option<usize>,
    /// The command that started the session, completed with `typed` on exit.
    pub(crate) change: Option<LastChange>,
}

/// What one cursor does for a key.
enum Step {
    Edit(Edit),
    Move(Position),
    Stay,
}

impl InsertSession {
    pub(crate) fn new(replace: bool, count: u32) -> Self {
        Self {
            replace,
            count: count.max(1),
            ..Self::default()
        }
    }
}

/// Start of the word before `col` for `<C-w>`.
fn word_start_before(text: &str, col: u32) -> u32 {
    let gs = graphemes(text);
    let mut start = (col as usize).min(gs.len());
    while start > 0 && char_class(gs[start - 1], false) == CharClass::Blank {
        start -= 1;
    }
    if let Some(class) = start.checked_sub(1).map(|i| char_class(gs[i], false)) {
        while start > 0 && char_class(gs[start - 1], false) == class {
            start -= 1;
        }
    }
    start as u32
}

impl ModeHandler {
    pub(crate) fn begin_session(&mut self, mut session: InsertSession) {
        if session.replace {
            session.replaced = vec![Vec::new(); self.cursors.len()];
        }
        let mode = if session.replace { Mode::Replace } else { Mode::Insert };
        self.session = Some(session);
        self.set_mode(mode);
    }

    pub(crate) fn start_insert<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, kind: InsertKind, count: u32) {
        match kind {
            InsertKind::OpenBelow | InsertKind::OpenAbove => {
                self.open_lines(buf, kind == InsertKind::OpenBelow, count);
                return;
            }
            _ => {}
        }
        for cursor in self.cursors.iter_mut() {
            let Position { line, col } = cursor.position;
            let target = match kind {
                InsertKind::After => buf.clamp(Position::new(line, col + 1)),
                InsertKind::LineStart => Position::new(line, first_non_blank(buf, line)),
                InsertKind::LineEnd => Position::new(line, buf.line_len(line)),
                _ => cursor.position,
            };
            cursor.move_to(target);
        }
        self.begin_session(InsertSession::new(false, count));
    }

    /// `o`/`O`: opens `count` lines per cursor, each starting with the
    /// cursor line's indentation, and puts a cursor on every new line.
    fn open_lines<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, below: bool, count: u32) {
        let mut lines: Vec<u32> = Vec::with_capacity(self.cursors.len());
        for cursor in self.cursors.iter() {
            if !lines.contains(&cursor.position.line) {
                lines.push(cursor.position.line);
            }
        }

        let count = count.max(1);
        let mut edits = Vec::with_capacity(lines.len());
        let mut indents = Vec::with_capacity(lines.len());
        for &line in &lines {
            let text = buf.line_text(line);
            let indent = leading_whitespace(&text).to_string();
            let edit = if below {
                let at = Position::new(line, grapheme_count(&text));
                Edit::insert(at, format!("\n{indent}").repeat(count as usize))
            } else {
                Edit::insert(Position::new(line, 0), format!("{indent}\n").repeat(count as usize))
            };
            edits.push(edit);
            indents.push(grapheme_count(&indent));
        }
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };

        let mut cursors = Vec::with_capacity(lines.len() * count as usize);
        for offset in 0..count {
            for (i, &col) in indents.iter().enumerate() {
                let start = applied.edit(i).start.line;
                let line = if below { start + 1 + offset } else { start + offset };
                cursors.push(Cursor::new(Position::new(line, col)));
            }
        }
        self.cursors.replace(cursors);

        let mut session = InsertSession::new(false, 1);
        session.keep = Some(lines.len());
        session.fresh_indent = indents.iter().any(|&col| col > 0);
        self.begin_session(session);
    }

    pub(crate) fn start_replace(&mut self, count: u32) {
        self.begin_session(InsertSession::new(true, count));
    }

    /// `I`/`A` in Visual mode. In a block selection every selected line gets
    /// its own cursor.
    pub(crate) fn block_insert<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, append: bool) {
        let Some(kind) = self.mode.visual_kind() else {
            return;
        };
        let originals = self.cursors.len();
        let mut rows: Vec<Vec<Position>> = Vec::with_capacity(originals);
        for cursor in self.cursors.iter() {
            let Some(selection) = cursor.selection(kind) else {
                continue;
            };
            let (start, end) = (selection.start(), selection.end());
            let positions = match selection_region(buf, cursor, kind, false) {
                Some(Region::Block {
                    first,
                    last,
                    left,
                    right,
                }) => (first..=last)
                    .filter_map(|line| {
                        let len = buf.line_len(line);
                        if append {
                            Some(Position::new(line, (right + 1).min(len)))
                        } else if len >= left || left == 0 {
                            Some(Position::new(line, left))
                        } else {
                            None
                        }
                    })
                    .collect(),
                _ if append => vec![buf.clamp(Position::new(end.line, end.col + 1))],
                _ => vec![start],
            };
            rows.push(positions);
        }

        let depth = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cursors = (0..depth)
            .flat_map(|row| rows.iter().filter_map(move |positions| positions.get(row)))
            .map(|&position| Cursor::new(position))
            .collect();
        self.cursors.replace(cursors);

        let mut session = InsertSession::new(false, 1);
        session.keep = Some(originals);
        self.begin_session(session);
    }

    /// A key typed in Insert or Replace mode.
    pub(crate) fn handle_text_entry<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, key: KeyEvent) -> KeyOutcome {
        let revision = self.revision;
        if key.is_esc() || key == KeyEvent::ctrl('[') || key == KeyEvent::ctrl('c') {
            self.finish_text_entry(buf);
        } else {
            if let Some(session) = self.session.as_mut() {
                session.typed.push(key);
            }
            self.text_entry_key(buf, key);
        }
        if self.revision != revision {
            KeyOutcome::TextChanged
        } else {
            KeyOutcome::Handled
        }
    }

    fn text_entry_key<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, key: KeyEvent) {
        if key.mods.contains(Modifiers::CTRL) {
            match key.code {
                KeyCode::Char('w') => self.delete_word_before(buf),
                KeyCode::Char('u') => self.delete_to_line_start(buf),
                KeyCode::Char('h') => self.backspace(buf),
                KeyCode::Char('j') | KeyCode::Char('m') => self.newline(buf),
                _ => tracing::trace!(key = %key, "ignored in insert mode"),
            }
            return;
        }
        match key.code {
            KeyCode::Char(c) => self.type_text(buf, &c.to_string()),
            KeyCode::Tab => self.type_tab(buf),
            KeyCode::Enter => self.newline(buf),
            KeyCode::Backspace => self.backspace(buf),
            KeyCode::Delete => self.delete_forward(buf),
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Home | KeyCode::End => {
                self.move_in_insert(buf, key.code);
            }
            KeyCode::Esc => {}
        }
    }

    fn session_mut(&mut self) -> Option<&mut InsertSession> {
        self.session.as_mut()
    }

    /// Applies one step per cursor. Edited cursors move to where their edit
    /// ended, or started when `to_start` is set; the others follow the text.
    fn edit_each<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, steps: Vec<Step>, to_start: bool) {
        let mut batch = Vec::new();
        let mut owners = Vec::new();
        for (idx, step) in steps.iter().enumerate() {
            if let Step::Edit(edit) = step {
                owners.push((idx, batch.len()));
                batch.push(edit.clone());
            }
        }
        let applied = if batch.is_empty() {
            Applied::default()
        } else {
            match self.apply(buf, &batch) {
                Some(applied) => applied,
                None => return,
            }
        };

        let mut cursors: Vec<Cursor> = self
            .cursors
            .iter()
            .zip(&steps)
            .map(|(cursor, step)| match step {
                Step::Move(to) => Cursor::new(applied.map(*to)),
                _ => Cursor::new(applied.map(cursor.position)),
            })
            .collect();
        for (idx, edit) in owners {
            let placed = applied.edit(edit);
            cursors[idx] = Cursor::new(if to_start { placed.start } else { placed.end });
        }
        self.cursors.replace(cursors);
    }

    fn type_text<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, text: &str) {
        let replace = self.mode == Mode::Replace;
        let mut overwritten = Vec::with_capacity(self.cursors.len());
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                let old = replace.then(|| buf.grapheme_at(pos)).flatten();
                let edit = match &old {
                    Some(_) => Edit::replace(Range::new(pos, Position::new(pos.line, pos.col + 1)), text),
                    None => Edit::insert(pos, text),
                };
                overwritten.push(old);
                Step::Edit(edit)
            })
            .collect();
        self.edit_each(buf, edits, false);
        if let Some(session) = self.session_mut() {
            session.text.push_str(text);
            session.fresh_indent = false;
            if replace {
                session.replaced.resize(overwritten.len(), Vec::new());
                for (stack, old) in session.replaced.iter_mut().zip(overwritten) {
                    stack.push(old);
                }
            }
        }
    }

    fn type_tab<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let tab_width = self.config.tab_width();
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                let text = buf.line_text(pos.line);
                let col = display_width(&text[..byte_offset(&text, pos.col)], tab_width);
                Step::Edit(Edit::insert(pos, self.config.tab_text(col)))
            })
            .collect();
        self.edit_each(buf, edits, false);
        if let Some(session) = self.session_mut() {
            session.text.push('\t');
            session.fresh_indent = false;
        }
    }

    /// Enter: breaks the line and carries its indentation. An untouched
    /// auto-indent on the line being left is dropped.
    fn newline<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let fresh = self.session.as_ref().is_some_and(|s| s.fresh_indent);
        let mut carried = false;
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                let text = buf.line_text(pos.line);
                let indent = leading_whitespace(&text);
                let len = grapheme_count(&text);
                carried |= !indent.is_empty();
                if fresh && !text.is_empty() && is_blank_line(&text) && pos.col == len {
                    let range = Range::new(Position::new(pos.line, 0), pos);
                    return Step::Edit(Edit::replace(range, format!("\n{indent}")));
                }
                // Whitespace after the cursor gives way to the carried indent.
                let rest = &text[byte_offset(&text, pos.col)..];
                let skip = grapheme_count(leading_whitespace(rest));
                let range = Range::new(pos, Position::new(pos.line, pos.col + skip));
                Step::Edit(Edit::replace(range, format!("\n{indent}")))
            })
            .collect();
        self.edit_each(buf, edits, false);
        if let Some(session) = self.session_mut() {
            session.text.push('\n');
            session.fresh_indent = carried;
        }
    }

    fn backspace<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        if self.mode == Mode::Replace {
            self.replace_backspace(buf);
            return;
        }
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                if pos.col > 0 {
                    Step::Edit(Edit::delete(Range::new(Position::new(pos.line, pos.col - 1), pos)))
                } else if pos.line > 0 {
                    let prev = Position::new(pos.line - 1, buf.line_len(pos.line - 1));
                    Step::Edit(Edit::delete(Range::new(prev, pos)))
                } else {
                    Step::Stay
                }
            })
            .collect();
        self.edit_each(buf, edits, true);
        if let Some(session) = self.session_mut() {
            session.text.pop();
        }
    }

    /// Backspace in Replace mode puts back what the last typed character
    /// overwrote, or just moves left over text that was not typed.
    fn replace_backspace<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let restored: Vec<Option<Option<String>>> = match self.session.as_mut() {
            Some(session) => {
                session.replaced.resize(self.cursors.len(), Vec::new());
                session.replaced.iter_mut().map(Vec::pop).collect()
            }
            None => vec![None; self.cursors.len()],
        };
        let edits = self
            .cursors
            .iter()
            .zip(restored)
            .map(|(cursor, restored)| {
                let pos = cursor.position;
                if pos.col == 0 {
                    return Step::Stay;
                }
                let prev = Position::new(pos.line, pos.col - 1);
                let range = Range::new(prev, pos);
                match restored {
                    Some(Some(old)) => Step::Edit(Edit::replace(range, old)),
                    Some(None) => Step::Edit(Edit::delete(range)),
                    None => Step::Move(prev),
                }
            })
            .collect();
        self.edit_each(buf, edits, true);
        if let Some(session) = self.session_mut() {
            session.text.pop();
        }
    }

    fn delete_forward<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                let len = buf.line_len(pos.line);
                if pos.col < len {
                    Step::Edit(Edit::delete(Range::new(pos, Position::new(pos.line, pos.col + 1))))
                } else if pos.line < buf.last_line() {
                    Step::Edit(Edit::delete(Range::new(pos, Position::new(pos.line + 1, 0))))
                } else {
                    Step::Stay
                }
            })
            .collect();
        self.edit_each(buf, edits, true);
    }

    fn delete_word_before<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                if pos.col == 0 {
                    return Step::Stay;
                }
                let start = word_start_before(&buf.line_text(pos.line), pos.col);
                Step::Edit(Edit::delete(Range::new(Position::new(pos.line, start), pos)))
            })
            .collect();
        self.edit_each(buf, edits, true);
    }

    /// `<C-u>`: deletes back to the indentation, or to column 0 when already
    /// there.
    fn delete_to_line_start<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let edits = self
            .cursors
            .iter()
            .map(|cursor| {
                let pos = cursor.position;
                if pos.col == 0 {
                    return Step::Stay;
                }
                let indent = first_non_blank(buf, pos.line);
                let start = if pos.col > indent { indent } else { 0 };
                Step::Edit(Edit::delete(Range::new(Position::new(pos.line, start), pos)))
            })
            .collect();
        self.edit_each(buf, edits, true);
    }

    fn move_in_insert<B: TextBuffer + ?Sized>(&mut self, buf: &B, code: KeyCode) {
        for cursor in self.cursors.iter_mut() {
            let Position { line, col } = cursor.position;
            let target = match code {
                KeyCode::Left => Position::new(line, col.saturating_sub(1)),
                KeyCode::Right => Position::new(line, col + 1),
                KeyCode::Up => Position::new(line.saturating_sub(1), col),
                KeyCode::Down => Position::new(line + 1, col),
                KeyCode::Home => Position::new(line, 0),
                _ => Position::new(line, buf.line_len(line)),
            };
            cursor.move_to(buf.clamp(target));
        }
        self.cursors.dedup();
        if let Some(session) = self.session_mut() {
            session.fresh_indent = false;
        }
    }

    /// Escape from Insert or Replace mode.
    pub(crate) fn finish_text_entry<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let Some(session) = self.session.as_ref() else {
            self.set_mode(Mode::Normal);
            return;
        };
        let typed = session.typed.clone();
        let text = session.text.clone();
        for _ in 1..session.count {
            for &key in &typed {
                self.text_entry_key(buf, key);
            }
        }

        let Some(session) = self.session.take() else {
            return;
        };
        if session.fresh_indent {
            let mut lines: Vec<u32> = self
                .cursors
                .iter()
                .map(|cursor| cursor.position.line)
                .filter(|&line| {
                    let text = buf.line_text(line);
                    !text.is_empty() && is_blank_line(&text)
                })
                .collect();
            lines.sort_unstable();
            lines.dedup();
            let edits: Vec<Edit> = lines
                .iter()
                .map(|&line| {
                    let end = Position::new(line, buf.line_len(line));
                    Edit::delete(Range::new(Position::new(line, 0), end))
                })
                .collect();
            if self.apply(buf, &edits).is_some() {
                for cursor in self.cursors.iter_mut() {
                    if lines.contains(&cursor.position.line) {
                        cursor.move_to(Position::new(cursor.position.line, 0));
                    }
                }
            }
        }

        self.registers.set_last_insert(text);
        if !self.replaying
            && let Some(mut change) = session.change
        {
            change.typed = typed;
            self.last_change = Some(change);
        }
        self.close_group(buf);

        if let Some(keep) = session.keep {
            self.cursors.truncate(keep);
        }
        for cursor in self.cursors.iter_mut() {
            let Position { line, col } = cursor.position;
            cursor.move_to(Position::new(line, col.saturating_sub(1)));
        }
        self.cursors.clamp(buf, true);
        self.set_mode(Mode::Normal);
    }
}
