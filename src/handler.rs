//! The mode handler.
//!
//! [`ModeHandler`] owns everything a Vim session remembers between keys: the
//! mode, the cursor set, the half-typed command, registers and the record of
//! the last change. Hosts feed it keys together with their buffer; it parses
//! the keys into commands and applies them to every cursor at once.

use crate::command::{Action, Command, PendingInput};
use crate::config::Config;
use crate::cursor::{Cursor, CursorSet};
use crate::edit::{Applied, Edit, apply_edits};
use crate::insert::InsertSession;
use crate::key::{KeyError, KeyEvent, parse_keys};
use crate::motion::{Motion, find_in_line, word_under_cursor};
use crate::parser::CommandParser;
use crate::registers::Registers;
use crate::textobject::TextObject;
use crate::traits::{Clipboard, TextBuffer};
use crate::types::{Mode, Position, Selection, VisualKind};

/// What a key did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was buffered as part of an incomplete command.
    Pending,
    /// A command ran without changing the text.
    Handled,
    /// The buffer changed.
    TextChanged,
    /// The key sequence was not a valid command and was discarded.
    Ignored,
}

impl KeyOutcome {
    fn merge(self, next: KeyOutcome) -> KeyOutcome {
        if self == KeyOutcome::TextChanged {
            self
        } else {
            next
        }
    }
}

/// Read-only view of the handler state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSnapshot {
    pub mode: Mode,
    pub cursors: Vec<Cursor>,
    /// One selection per cursor while a visual mode is active.
    pub selections: Vec<Selection>,
    pub pending: PendingInput,
}

/// The shape of a visual selection, replayed relative to the cursor by `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VisualExtent {
    kind: VisualKind,
    lines: u32,
    /// Column span on a single line, or the end column on the last line.
    cols: u32,
}

/// The last buffer-changing command, for `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LastChange {
    pub(crate) command: Command,
    pub(crate) visual: Option<VisualExtent>,
    /// Keys typed in Insert or Replace mode after the command.
    pub(crate) typed: Vec<KeyEvent>,
}

#[derive(Debug, Clone)]
pub(crate) struct UndoGroup {
    depth: u32,
    cursors_before: Vec<Cursor>,
    text_before: String,
    changed: bool,
}

#[derive(Default)]
pub struct ModeHandlerBuilder {
    config: Config,
    cursors: Vec<Position>,
    clipboard: Option<Box<dyn Clipboard>>,
}

impl ModeHandlerBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Initial cursor position. Repeated calls add cursors.
    pub fn cursor(mut self, position: Position) -> Self {
        self.cursors.push(position);
        self
    }

    pub fn clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn build(self) -> ModeHandler {
        let cursors = self.cursors.into_iter().map(Cursor::new).collect();
        let registers = match self.clipboard {
            Some(clipboard) => Registers::with_clipboard(clipboard),
            None => Registers::new(),
        };
        ModeHandler {
            mode: Mode::Normal,
            cursors: CursorSet::from_cursors(cursors),
            parser: CommandParser::new(),
            registers,
            config: self.config,
            last_change: None,
            last_find: None,
            last_search: None,
            session: None,
            group: None,
            undo_cursors: Vec::new(),
            redo_cursors: Vec::new(),
            replaying: false,
            revision: 0,
        }
    }
}

#[derive(Debug)]
pub struct ModeHandler {
    pub(crate) mode: Mode,
    pub(crate) cursors: CursorSet,
    parser: CommandParser,
    pub(crate) registers: Registers,
    pub(crate) config: Config,
    pub(crate) last_change: Option<LastChange>,
    /// Character, direction and till flag of the last `f`/`t`.
    last_find: Option<(char, bool, bool)>,
    /// Pattern and direction of the last `*`/`#`.
    last_search: Option<(String, bool)>,
    pub(crate) session: Option<InsertSession>,
    group: Option<UndoGroup>,
    undo_cursors: Vec<Vec<Cursor>>,
    redo_cursors: Vec<Vec<Cursor>>,
    pub(crate) replaying: bool,
    pub(crate) revision: u64,
}

impl Default for ModeHandler {
    fn default() -> Self {
        ModeHandlerBuilder::default().build()
    }
}

impl ModeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ModeHandlerBuilder {
        ModeHandlerBuilder::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub fn cursor(&self) -> Position {
        self.cursors.primary().position
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn pending(&self) -> PendingInput {
        self.parser.pending()
    }

    pub fn snapshot(&self) -> HandlerSnapshot {
        let selections = match self.mode.visual_kind() {
            Some(kind) => self.cursors.iter().filter_map(|c| c.selection(kind)).collect(),
            None => Vec::new(),
        };
        HandlerSnapshot {
            mode: self.mode,
            cursors: self.cursors.as_slice().to_vec(),
            selections,
            pending: self.parser.pending(),
        }
    }

    /// Adds a cursor. Positions are clamped to the buffer on the next key.
    pub fn add_cursor(&mut self, position: Position) {
        let mut cursor = Cursor::new(position);
        if self.mode.is_visual() {
            cursor.anchor = Some(position);
        }
        self.cursors.push(cursor);
    }

    /// Replaces the cursor set. The first position becomes the primary cursor.
    pub fn set_cursors(&mut self, positions: impl IntoIterator<Item = Position>) {
        let visual = self.mode.is_visual();
        let cursors = positions
            .into_iter()
            .map(|p| Cursor {
                anchor: visual.then_some(p),
                ..Cursor::new(p)
            })
            .collect();
        self.cursors.replace(cursors);
    }

    /// Feeds one key.
    pub fn handle_key<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, key: KeyEvent) -> KeyOutcome {
        tracing::trace!(key = %key, mode = %self.mode, "handle key");
        self.cursors.clamp(buf, !self.mode.is_text_entry());

        if self.mode.is_text_entry() {
            return self.handle_text_entry(buf, key);
        }

        let had_pending = self.parser.is_pending();
        match self.parser.feed(key, self.mode) {
            Ok(None) => KeyOutcome::Pending,
            Ok(Some(command)) => self.execute(buf, command, had_pending),
            Err(err) => {
                tracing::trace!("{err}");
                KeyOutcome::Ignored
            }
        }
    }

    /// Feeds keys in order. Equivalent to calling [`handle_key`] for each.
    ///
    /// [`handle_key`]: ModeHandler::handle_key
    pub fn handle_keys<B, I>(&mut self, buf: &mut B, keys: I) -> KeyOutcome
    where
        B: TextBuffer + ?Sized,
        I: IntoIterator<Item = KeyEvent>,
    {
        keys.into_iter()
            .fold(KeyOutcome::Handled, |outcome, key| {
                outcome.merge(self.handle_key(buf, key))
            })
    }

    /// Feeds a key string such as `"2dw"` or `"ifoo<Esc>"`.
    pub fn handle_key_names<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &mut B,
        names: &str,
    ) -> Result<KeyOutcome, KeyError> {
        let keys = parse_keys(names).inspect_err(|err| {
            tracing::warn!("cannot parse key names {names:?}: {err}");
        })?;
        Ok(self.handle_keys(buf, keys))
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(from = %self.mode, to = %mode, "mode change");
            self.mode = mode;
        }
    }

    fn execute<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &mut B,
        command: Command,
        had_pending: bool,
    ) -> KeyOutcome {
        let revision = self.revision;
        let record = command.is_repeatable() && !self.replaying;
        let change = record.then(|| LastChange {
            command: command.clone(),
            visual: self.visual_extent(),
            typed: Vec::new(),
        });
        let grouped = command.is_repeatable();
        if grouped {
            self.open_group(buf);
        }

        let count = command.count();
        match &command.action {
            Action::Escape => match self.mode {
                Mode::Visual(_) => self.exit_visual(buf),
                _ if !had_pending => self.cursors.collapse(),
                _ => {}
            },
            Action::Move(motion) => self.move_cursors(buf, motion, &command),
            Action::Operate { op, target } => self.operate(buf, &command, *op, target),
            Action::SelectObject(object) => self.select_object(buf, object, count),
            Action::Insert(kind) => self.start_insert(buf, *kind, count),
            Action::EnterVisual(kind) => self.toggle_visual(buf, *kind),
            Action::EnterReplace => self.start_replace(count),
            Action::ReplaceChar(ch) => self.replace_char(buf, *ch, count),
            Action::Put { before } => self.put(buf, &command, *before),
            Action::Join => self.join(buf, count),
            Action::ToggleCaseChar => self.toggle_case_chars(buf, count),
            Action::Undo => self.undo(buf, count),
            Action::Redo => self.redo(buf, count),
            Action::Repeat => self.repeat(buf, command.count),
            Action::SwapAnchor => {
                for cursor in self.cursors.iter_mut() {
                    if let Some(anchor) = cursor.anchor.replace(cursor.position) {
                        cursor.move_to(anchor);
                    }
                }
            }
            Action::BlockInsert { append } => self.block_insert(buf, *append),
        }

        if let Some(change) = change {
            match self.session.as_mut() {
                Some(session) => session.change = Some(change),
                None if self.revision != revision => self.last_change = Some(change),
                None => {}
            }
        }
        if grouped && self.session.is_none() {
            self.close_group(buf);
        }

        if self.revision != revision {
            KeyOutcome::TextChanged
        } else {
            KeyOutcome::Handled
        }
    }

    /// Applies one batch of edits. Failures are logged and leave the buffer
    /// untouched.
    pub(crate) fn apply<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, edits: &[Edit]) -> Option<Applied> {
        match apply_edits(buf, edits) {
            Ok(applied) => {
                if edits.iter().any(|e| !e.is_noop()) {
                    self.revision += 1;
                    if let Some(group) = self.group.as_mut() {
                        group.changed = true;
                    }
                }
                Some(applied)
            }
            Err(err) => {
                tracing::error!("command aborted: {err}");
                None
            }
        }
    }

    pub(crate) fn open_group<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        match self.group.as_mut() {
            Some(group) => group.depth += 1,
            None => {
                buf.begin_undo_group();
                self.group = Some(UndoGroup {
                    depth: 1,
                    cursors_before: self.cursors.as_slice().to_vec(),
                    text_before: buf.text(),
                    changed: false,
                });
            }
        }
    }

    pub(crate) fn close_group<B: TextBuffer + ?Sized>(&mut self, buf: &mut B) {
        let Some(group) = self.group.as_mut() else {
            return;
        };
        group.depth -= 1;
        if group.depth > 0 {
            return;
        }
        buf.end_undo_group();
        // The host records a step only when the text differs from the
        // start of the group; edits that cancel out leave no step.
        if let Some(group) = self.group.take()
            && group.changed
            && buf.text() != group.text_before
        {
            self.undo_cursors.push(group.cursors_before);
            self.redo_cursors.clear();
        }
    }

    fn undo<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, count: u32) {
        for _ in 0..count {
            if !buf.undo() {
                break;
            }
            self.revision += 1;
            tracing::debug!("undo");
            if let Some(cursors) = self.undo_cursors.pop() {
                self.redo_cursors.push(cursors.clone());
                self.cursors.replace(cursors);
            }
        }
        self.cursors.clear_anchors();
        self.cursors.clamp(buf, true);
    }

    fn redo<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, count: u32) {
        for _ in 0..count {
            if !buf.redo() {
                break;
            }
            self.revision += 1;
            tracing::debug!("redo");
            if let Some(cursors) = self.redo_cursors.pop() {
                self.undo_cursors.push(cursors.clone());
                self.cursors.replace(cursors);
            }
        }
        self.cursors.clear_anchors();
        self.cursors.clamp(buf, true);
    }

    fn repeat<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, count: Option<u32>) {
        let Some(change) = self.last_change.clone() else {
            return;
        };
        let mut command = change.command;
        if count.is_some() {
            command.count = count;
        }
        tracing::debug!(command = ?command.action, "repeat last change");

        self.replaying = true;
        self.open_group(buf);
        if let Some(extent) = change.visual {
            self.select_extent(buf, extent);
        }
        self.execute(buf, command, false);
        if self.mode.is_text_entry() {
            for key in change.typed {
                self.handle_text_entry(buf, key);
            }
            self.finish_text_entry(buf);
        }
        self.close_group(buf);
        self.replaying = false;
    }

    /// Resolves handler-bound motions into concrete ones. `None` when there
    /// is nothing to repeat.
    pub(crate) fn bind_motion<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &B,
        motion: &Motion,
    ) -> Option<Motion> {
        match motion {
            Motion::FindChar { ch, forward, till } => {
                self.last_find = Some((*ch, *forward, *till));
                Some(motion.clone())
            }
            Motion::RepeatFind { reverse } => {
                let (ch, forward, till) = self.last_find?;
                Some(Motion::FindChar {
                    ch,
                    forward: forward != *reverse,
                    till,
                })
            }
            Motion::SearchWord { forward } => {
                let (_, word) = word_under_cursor(buf, self.cursor())?;
                self.last_search = Some((word.clone(), *forward));
                Some(Motion::Search {
                    pattern: word,
                    forward: *forward,
                    whole_word: true,
                })
            }
            Motion::RepeatSearch { reverse } => {
                let (pattern, forward) = self.last_search.clone()?;
                Some(Motion::Search {
                    pattern,
                    forward: forward != *reverse,
                    whole_word: true,
                })
            }
            _ => Some(motion.clone()),
        }
    }

    /// The count handed to a motion resolver.
    pub(crate) fn motion_count(motion: &Motion, command: &Command) -> u32 {
        if motion.count_is_absolute() {
            command.count.unwrap_or(0)
        } else {
            command.count()
        }
    }

    fn move_cursors<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, motion: &Motion, command: &Command) {
        let Some(bound) = self.bind_motion(buf, motion) else {
            return;
        };
        let count = Self::motion_count(&bound, command);
        let repeat_till = matches!(motion, Motion::RepeatFind { .. });

        for cursor in self.cursors.iter_mut() {
            let from = cursor.position;
            let target = match &bound {
                // `;` after `t` must not stop right before the same match.
                Motion::FindChar { ch, forward, till: true } if repeat_till => {
                    find_in_line(buf, from, *ch, *forward, true, count.max(1), true).unwrap_or(from)
                }
                Motion::SearchWord { .. } | Motion::Search { .. } => {
                    let start = match motion {
                        Motion::SearchWord { .. } => {
                            word_under_cursor(buf, from).map_or(from, |(start, _)| start)
                        }
                        _ => from,
                    };
                    let target = bound.resolve(buf, start, count);
                    if target == start { from } else { target }
                }
                m if m.is_vertical() => {
                    let preferred = cursor.preferred_col.unwrap_or(from.col);
                    let target = m.resolve_with(buf, from, count, Some(preferred));
                    cursor.position = buf.clamp_normal(target);
                    cursor.preferred_col = Some(preferred);
                    continue;
                }
                m => m.resolve(buf, from, count),
            };
            cursor.move_to(buf.clamp_normal(target));
            if matches!(bound, Motion::LineEnd) {
                cursor.preferred_col = Some(u32::MAX);
            }
        }
        self.cursors.dedup();
    }

    pub(crate) fn visual_extent(&self) -> Option<VisualExtent> {
        let kind = self.mode.visual_kind()?;
        let selection = self.cursors.primary().selection(kind)?;
        let (start, end) = (selection.start(), selection.end());
        let lines = end.line - start.line;
        let cols = if lines == 0 { end.col - start.col } else { end.col };
        Some(VisualExtent { kind, lines, cols })
    }

    fn select_extent<B: TextBuffer + ?Sized>(&mut self, buf: &B, extent: VisualExtent) {
        for cursor in self.cursors.iter_mut() {
            let start = cursor.position;
            let col = if extent.lines == 0 {
                start.col + extent.cols
            } else {
                extent.cols
            };
            cursor.anchor = Some(start);
            cursor.position = buf.clamp_normal(Position::new(start.line + extent.lines, col));
        }
        self.set_mode(Mode::Visual(extent.kind));
    }

    fn toggle_visual<B: TextBuffer + ?Sized>(&mut self, buf: &B, kind: VisualKind) {
        match self.mode {
            Mode::Visual(current) if current == kind => self.exit_visual(buf),
            Mode::Visual(_) => self.set_mode(Mode::Visual(kind)),
            _ => {
                self.cursors.set_anchors();
                self.set_mode(Mode::Visual(kind));
            }
        }
    }

    pub(crate) fn exit_visual<B: TextBuffer + ?Sized>(&mut self, buf: &B) {
        self.cursors.clear_anchors();
        self.cursors.clamp(buf, true);
        self.set_mode(Mode::Normal);
    }

    fn select_object<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &B,
        object: &TextObject,
        count: u32,
    ) {
        let mut linewise = false;
        for cursor in self.cursors.iter_mut() {
            let Some(found) = object.resolve(buf, cursor.position, count) else {
                continue;
            };
            let range = found.range;
            if range.is_empty() {
                continue;
            }
            linewise |= found.linewise;
            let last = if range.end.col > 0 {
                Position::new(range.end.line, range.end.col - 1)
            } else if range.end.line > range.start.line {
                buf.line_end(range.end.line - 1)
            } else {
                range.start
            };
            if cursor.anchor.is_none_or(|a| a == cursor.position) {
                cursor.anchor = Some(range.start);
            }
            cursor.move_to(buf.clamp_normal(last));
        }
        if linewise && self.mode == Mode::Visual(VisualKind::CharWise) {
            self.set_mode(Mode::Visual(VisualKind::LineWise));
        }
    }
}
