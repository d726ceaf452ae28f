//! Operators and the other buffer-changing Normal and Visual commands.
//!
//! Every command here follows the same shape: compute one region or edit per
//! cursor from the current cursor set, apply the whole batch with
//! [`ModeHandler::apply`], then place each cursor from where its edit landed.

use crate::command::{Command, Operator, Target};
use crate::cursor::Cursor;
use crate::edit::Edit;
use crate::handler::ModeHandler;
use crate::indent::{leading_whitespace, shift_line};
use crate::insert::InsertSession;
use crate::motion::{Motion, first_non_blank};
use crate::registers::{RegisterKind, RegisterValue};
use crate::text::{CharClass, char_class, grapheme_count, graphemes};
use crate::traits::TextBuffer;
use crate::types::{Mode, Position, Range, VisualKind};

/// The text an operator acts on for one cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    /// Half-open character range.
    Chars(Range),
    /// Whole lines, inclusive.
    Lines { first: u32, last: u32 },
    /// Rectangle, all bounds inclusive. Columns are clipped per line.
    Block { first: u32, last: u32, left: u32, right: u32 },
}

impl Region {
    fn start(&self) -> Position {
        match *self {
            Region::Chars(range) => range.start,
            Region::Lines { first, .. } => Position::new(first, 0),
            Region::Block { first, left, .. } => Position::new(first, left),
        }
    }

    fn kind(&self) -> RegisterKind {
        match self {
            Region::Chars(_) => RegisterKind::Charwise,
            Region::Lines { .. } => RegisterKind::Linewise,
            Region::Block { .. } => RegisterKind::Blockwise,
        }
    }

    /// The text of the region as stored in a register.
    fn text<B: TextBuffer + ?Sized>(&self, buf: &B) -> String {
        match *self {
            Region::Chars(range) => buf.slice_to_string(range),
            Region::Lines { first, last } => (first..=last)
                .map(|line| buf.line_text(line))
                .collect::<Vec<_>>()
                .join("\n"),
            Region::Block { .. } => self
                .pieces(buf)
                .into_iter()
                .map(|range| buf.slice_to_string(range))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Per-line ranges covering the region's characters, without line breaks
    /// between whole lines.
    fn pieces<B: TextBuffer + ?Sized>(&self, buf: &B) -> Vec<Range> {
        match *self {
            Region::Chars(range) => vec![range],
            Region::Lines { first, last } => vec![Range::new(
                Position::new(first, 0),
                Position::new(last, buf.line_len(last)),
            )],
            Region::Block {
                first,
                last,
                left,
                right,
            } => (first..=last)
                .map(|line| {
                    let len = buf.line_len(line);
                    Range::new(
                        Position::new(line, left.min(len)),
                        Position::new(line, right.saturating_add(1).min(len)),
                    )
                })
                .collect(),
        }
    }

    /// Ranges removed by a delete. Deleting whole lines takes one line break
    /// with them.
    fn delete_ranges<B: TextBuffer + ?Sized>(&self, buf: &B) -> Vec<Range> {
        match *self {
            Region::Lines { first, last } => {
                let range = if last < buf.last_line() {
                    Range::new(Position::new(first, 0), Position::new(last + 1, 0))
                } else if first > 0 {
                    Range::new(
                        Position::new(first - 1, buf.line_len(first - 1)),
                        Position::new(last, buf.line_len(last)),
                    )
                } else {
                    Range::new(Position::ZERO, Position::new(last, buf.line_len(last)))
                };
                vec![range]
            }
            _ => self.pieces(buf),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Region::Chars(range) if range.is_empty())
    }

    fn overlaps(&self, other: &Region) -> bool {
        match (self, other) {
            (Region::Lines { first, last }, Region::Lines { first: f2, last: l2 }) => {
                first <= l2 && f2 <= last
            }
            (Region::Chars(a), Region::Chars(b)) => a.start < b.end && b.start < a.end,
            _ => false,
        }
    }

    fn union(&self, other: &Region) -> Region {
        match (*self, *other) {
            (Region::Lines { first, last }, Region::Lines { first: f2, last: l2 }) => Region::Lines {
                first: first.min(f2),
                last: last.max(l2),
            },
            (Region::Chars(a), Region::Chars(b)) => {
                Region::Chars(Range::new(a.start.min(b.start), a.end.max(b.end)))
            }
            (region, _) => region,
        }
    }
}

/// The region covered by a visual selection.
pub(crate) fn selection_region<B: TextBuffer + ?Sized>(
    buf: &B,
    cursor: &Cursor,
    kind: VisualKind,
    force_lines: bool,
) -> Option<Region> {
    let selection = cursor.selection(kind)?;
    let (start, end) = (selection.start(), selection.end());
    let region = match kind {
        _ if force_lines => Region::Lines {
            first: start.line,
            last: end.line,
        },
        VisualKind::LineWise => Region::Lines {
            first: start.line,
            last: end.line,
        },
        VisualKind::CharWise => {
            let len = buf.line_len(end.line);
            let end = if end.col < len {
                Position::new(end.line, end.col + 1)
            } else if end.line < buf.last_line() {
                Position::new(end.line + 1, 0)
            } else {
                Position::new(end.line, len)
            };
            Region::Chars(Range::new(start, end))
        }
        VisualKind::Block => Region::Block {
            first: start.line,
            last: end.line,
            left: selection.anchor.col.min(selection.head.col),
            right: selection.anchor.col.max(selection.head.col),
        },
    };
    Some(region)
}

/// Merges overlapping regions so that one batch never edits the same text
/// twice. The first cursor owning a merged region keeps it.
fn merge_regions(mut regions: Vec<(usize, Region)>) -> Vec<(usize, Region)> {
    regions.sort_by_key(|(_, region)| region.start());
    let mut merged: Vec<(usize, Region)> = Vec::with_capacity(regions.len());
    for (idx, region) in regions {
        match merged.last_mut() {
            Some((owner, last)) if last.overlaps(&region) && *last != region => {
                *last = last.union(&region);
                *owner = (*owner).min(idx);
            }
            Some((owner, last)) if *last == region => *owner = (*owner).min(idx),
            _ => merged.push((idx, region)),
        }
    }
    merged.sort_by_key(|(idx, _)| *idx);
    merged
}

fn toggle_case(text: &str) -> String {
    text.chars()
        .flat_map(|c| {
            if c.is_lowercase() {
                c.to_uppercase().collect::<Vec<_>>()
            } else {
                c.to_lowercase().collect::<Vec<_>>()
            }
        })
        .collect()
}

fn case_op(op: Operator, text: &str) -> String {
    match op {
        Operator::Lowercase => text.to_lowercase(),
        Operator::Uppercase => text.to_uppercase(),
        _ => toggle_case(text),
    }
}

/// True when `pos` is on the last character of a word (`cw` then changes
/// only up to it).
fn at_word_end<B: TextBuffer + ?Sized>(buf: &B, pos: Position, big: bool) -> bool {
    let text = buf.line_text(pos.line);
    let gs = graphemes(&text);
    let Some(current) = gs.get(pos.col as usize) else {
        return true;
    };
    gs.get(pos.col as usize + 1)
        .is_none_or(|next| char_class(next, big) != char_class(current, big))
}

impl ModeHandler {
    /// `cw` on a non-blank acts like `ce`, but stays inside a one-letter word.
    fn change_word_span<B: TextBuffer + ?Sized>(
        buf: &B,
        from: Position,
        count: u32,
        big: bool,
    ) -> Option<Region> {
        let here = buf.grapheme_at(from)?;
        if char_class(&here, big) == CharClass::Blank {
            return None;
        }
        let (count, from_end) = if at_word_end(buf, from, big) {
            (count - 1, true)
        } else {
            (count, false)
        };
        let end = if count == 0 {
            from
        } else {
            let target = Motion::WordEnd { big }.resolve(buf, from, count);
            if from_end && target == from {
                return None;
            }
            target
        };
        let end = Position::new(end.line, end.col + 1);
        Some(Region::Chars(Range::new(from, buf.clamp(end))))
    }

    fn regions<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &B,
        command: &Command,
        op: Operator,
        target: &Target,
    ) -> Vec<(usize, Region)> {
        let count = command.count();
        let mut regions = Vec::with_capacity(self.cursors.len());
        match target {
            Target::Motion(motion) => {
                let Some(bound) = self.bind_motion(buf, motion) else {
                    return regions;
                };
                let motion_count = Self::motion_count(&bound, command);
                for (idx, cursor) in self.cursors.iter().enumerate() {
                    let from = cursor.position;
                    if op == Operator::Change
                        && let Motion::WordForward { big } = bound
                        && let Some(region) = Self::change_word_span(buf, from, count, big)
                    {
                        regions.push((idx, region));
                        continue;
                    }
                    let Some(span) = bound.span(buf, from, motion_count) else {
                        continue;
                    };
                    let region = if span.linewise {
                        Region::Lines {
                            first: span.range.start.line,
                            last: span.range.end.line,
                        }
                    } else {
                        Region::Chars(span.range)
                    };
                    regions.push((idx, region));
                }
            }
            Target::Object(object) => {
                for (idx, cursor) in self.cursors.iter().enumerate() {
                    let Some(found) = object.resolve(buf, cursor.position, count) else {
                        continue;
                    };
                    let region = if found.linewise {
                        Region::Lines {
                            first: found.range.start.line,
                            last: found.range.end.line,
                        }
                    } else {
                        Region::Chars(found.range)
                    };
                    regions.push((idx, region));
                }
            }
            Target::Line => {
                for (idx, cursor) in self.cursors.iter().enumerate() {
                    let first = cursor.position.line;
                    let last = first.saturating_add(count - 1).min(buf.last_line());
                    regions.push((idx, Region::Lines { first, last }));
                }
            }
            Target::Selection { linewise } => {
                let Some(kind) = self.mode.visual_kind() else {
                    return regions;
                };
                for (idx, cursor) in self.cursors.iter().enumerate() {
                    if let Some(region) = selection_region(buf, cursor, kind, *linewise) {
                        regions.push((idx, region));
                    }
                }
            }
        }
        regions.retain(|(_, region)| op == Operator::Change || !region.is_empty());
        merge_regions(regions)
    }

    pub(crate) fn operate<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &mut B,
        command: &Command,
        op: Operator,
        target: &Target,
    ) {
        let regions = self.regions(buf, command, op, target);
        let visual = self.mode.is_visual();
        if visual {
            self.cursors.clear_anchors();
            self.set_mode(Mode::Normal);
        }
        if regions.is_empty() {
            return;
        }

        match op {
            Operator::Delete | Operator::Yank | Operator::Change => {
                let value = RegisterValue::new(
                    regions.iter().map(|(_, region)| region.text(buf)).collect(),
                    regions[0].1.kind(),
                );
                if op == Operator::Yank {
                    self.registers.yank(command.register, value);
                } else {
                    self.registers.delete(command.register, value);
                }
            }
            _ => {}
        }

        match op {
            Operator::Delete => self.delete_regions(buf, &regions),
            Operator::Yank => self.yank_cursors(&regions, visual),
            Operator::Change => self.change_regions(buf, &regions),
            Operator::ShiftRight | Operator::ShiftLeft => {
                let levels = match target {
                    Target::Selection { .. } => command.count() as i32,
                    _ => 1,
                };
                let levels = if op == Operator::ShiftLeft { -levels } else { levels };
                self.shift_regions(buf, &regions, levels);
            }
            Operator::ToggleCase | Operator::Lowercase | Operator::Uppercase => {
                self.case_regions(buf, &regions, op);
            }
        }
    }

    fn delete_regions<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, regions: &[(usize, Region)]) {
        // Deleting the last lines takes the line break before them, which
        // would collide with a line region ending right above.
        let mut regions = regions.to_vec();
        regions.sort_by_key(|(_, region)| region.start());
        let mut joined: Vec<(usize, Region)> = Vec::with_capacity(regions.len());
        for (idx, region) in regions {
            if let Some((owner, Region::Lines { last: prev_last, .. })) = joined.last_mut()
                && let Region::Lines { first, last } = region
                && last == buf.last_line()
                && *prev_last + 1 == first
            {
                *prev_last = last;
                *owner = (*owner).min(idx);
                continue;
            }
            joined.push((idx, region));
        }
        joined.sort_by_key(|(idx, _)| *idx);

        let mut edits = Vec::new();
        let mut owners = Vec::new();
        for (idx, region) in &joined {
            owners.push((*idx, *region, edits.len()));
            edits.extend(region.delete_ranges(buf).into_iter().map(Edit::delete));
        }
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };

        let cursors = owners
            .into_iter()
            .map(|(_, region, edit)| {
                let start = applied.edit(edit).start;
                let position = match region {
                    Region::Lines { .. } => Position::new(start.line, first_non_blank(buf, start.line)),
                    _ => start,
                };
                Cursor::new(buf.clamp_normal(position))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    fn yank_cursors(&mut self, regions: &[(usize, Region)], visual: bool) {
        let positions: Vec<(usize, Position)> = regions
            .iter()
            .map(|(idx, region)| {
                let cursor = self.cursors.as_slice()[*idx].position;
                let position = match region {
                    Region::Lines { first, .. } if !visual => {
                        Position::new(*first, if *first == cursor.line { cursor.col } else { 0 })
                    }
                    _ => region.start(),
                };
                (*idx, position)
            })
            .collect();
        for (idx, position) in positions {
            if let Some(cursor) = self.cursors.iter_mut().nth(idx) {
                cursor.move_to(position);
            }
        }
    }

    fn change_regions<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, regions: &[(usize, Region)]) {
        let mut edits = Vec::new();
        // (edit index, column offset of the cursor inside the replacement)
        let mut anchors = Vec::new();
        let mut fresh_indent = false;
        for (_, region) in regions {
            match *region {
                Region::Lines { first, last } => {
                    let indent = leading_whitespace(&buf.line_text(first)).to_string();
                    let range = Range::new(
                        Position::new(first, 0),
                        Position::new(last, buf.line_len(last)),
                    );
                    anchors.push((edits.len(), grapheme_count(&indent)));
                    fresh_indent |= !indent.is_empty();
                    edits.push(Edit::replace(range, indent));
                }
                Region::Chars(range) => {
                    anchors.push((edits.len(), 0));
                    edits.push(Edit::delete(range));
                }
                Region::Block { .. } => {
                    for range in region.pieces(buf) {
                        anchors.push((edits.len(), 0));
                        edits.push(Edit::delete(range));
                    }
                }
            }
        }
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };
        let keep = regions.len();
        let cursors = anchors
            .into_iter()
            .map(|(edit, offset)| {
                let start = applied.edit(edit).start;
                Cursor::new(buf.clamp(Position::new(start.line, start.col + offset)))
            })
            .collect();
        self.cursors.replace(cursors);

        let mut session = InsertSession::new(false, 1);
        session.keep = Some(keep);
        session.fresh_indent = fresh_indent;
        self.begin_session(session);
    }

    fn shift_regions<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &mut B,
        regions: &[(usize, Region)],
        levels: i32,
    ) {
        let mut lines: Vec<u32> = regions
            .iter()
            .flat_map(|(_, region)| {
                let (first, last) = match *region {
                    Region::Lines { first, last } | Region::Block { first, last, .. } => (first, last),
                    Region::Chars(range) if range.end.col == 0 && range.end.line > range.start.line => {
                        (range.start.line, range.end.line - 1)
                    }
                    Region::Chars(range) => (range.start.line, range.end.line),
                };
                first..=last
            })
            .collect();
        lines.sort_unstable();
        lines.dedup();

        let edits: Vec<Edit> = lines
            .iter()
            .filter_map(|&line| {
                let text = buf.line_text(line);
                let shifted = shift_line(&text, levels, &self.config)?;
                let range = Range::new(Position::new(line, 0), Position::new(line, grapheme_count(&text)));
                Some(Edit::replace(range, shifted))
            })
            .collect();
        if self.apply(buf, &edits).is_none() {
            return;
        }

        let cursors = regions
            .iter()
            .map(|(_, region)| {
                let line = region.start().line;
                Cursor::new(buf.clamp_normal(Position::new(line, first_non_blank(buf, line))))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    fn case_regions<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &mut B,
        regions: &[(usize, Region)],
        op: Operator,
    ) {
        let edits: Vec<Edit> = regions
            .iter()
            .flat_map(|(_, region)| region.pieces(buf))
            .map(|range| Edit::replace(range, case_op(op, &buf.slice_to_string(range))))
            .collect();
        if self.apply(buf, &edits).is_none() {
            return;
        }
        let cursors = regions
            .iter()
            .map(|(idx, region)| {
                let position = match region {
                    Region::Lines { first, .. } => {
                        let col = self.cursors.as_slice()[*idx].position.col;
                        Position::new(*first, col)
                    }
                    _ => region.start(),
                };
                Cursor::new(buf.clamp_normal(position))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    /// `p` and `P`, or replacing the selection in Visual mode.
    pub(crate) fn put<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, command: &Command, before: bool) {
        let Some(value) = self.registers.get(command.register) else {
            return;
        };
        if value.values.is_empty() {
            return;
        }
        let distribute = value.values.len() == self.cursors.len();
        let joined = value.joined();
        let texts: Vec<String> = (0..self.cursors.len())
            .map(|i| match distribute {
                true => value.values[i].clone(),
                false => joined.clone(),
            })
            .collect();
        let count = command.count() as usize;

        if let Some(kind) = self.mode.visual_kind() {
            self.put_over_selection(buf, kind, &texts, value.kind, count);
            return;
        }
        match value.kind {
            RegisterKind::Charwise => self.put_chars(buf, &texts, before, count),
            RegisterKind::Linewise => self.put_lines(buf, &texts, before, count),
            RegisterKind::Blockwise => self.put_block(buf, &texts, before, count),
        }
    }

    fn put_chars<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, texts: &[String], before: bool, count: usize) {
        let edits: Vec<Edit> = self
            .cursors
            .iter()
            .zip(texts)
            .map(|(cursor, text)| {
                let pos = cursor.position;
                let at = if before {
                    pos
                } else {
                    buf.clamp(Position::new(pos.line, pos.col + 1))
                };
                Edit::insert(at, text.repeat(count))
            })
            .collect();
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };
        let cursors = edits
            .iter()
            .enumerate()
            .map(|(i, edit)| {
                let placed = applied.edit(i);
                let position = if edit.text.contains('\n') {
                    placed.start
                } else {
                    Position::new(placed.end.line, placed.end.col.saturating_sub(1))
                };
                Cursor::new(buf.clamp_normal(position))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    fn put_lines<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, texts: &[String], before: bool, count: usize) {
        let mut edits = Vec::with_capacity(texts.len());
        let mut offsets = Vec::with_capacity(texts.len());
        for (cursor, text) in self.cursors.iter().zip(texts) {
            let body = vec![text.as_str(); count].join("\n");
            let line = cursor.position.line;
            if before {
                edits.push(Edit::insert(Position::new(line, 0), format!("{body}\n")));
                offsets.push(0);
            } else if line < buf.last_line() {
                edits.push(Edit::insert(Position::new(line + 1, 0), format!("{body}\n")));
                offsets.push(0);
            } else {
                edits.push(Edit::insert(
                    Position::new(line, buf.line_len(line)),
                    format!("\n{body}"),
                ));
                offsets.push(1);
            }
        }
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };
        let cursors = offsets
            .into_iter()
            .enumerate()
            .map(|(i, offset)| {
                let line = applied.edit(i).start.line + offset;
                Cursor::new(buf.clamp_normal(Position::new(line, first_non_blank(buf, line))))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    fn put_block<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, texts: &[String], before: bool, count: usize) {
        let mut edits = Vec::new();
        let mut starts = Vec::new();
        for (cursor, text) in self.cursors.iter().zip(texts) {
            let pos = cursor.position;
            let col = if before || buf.line_len(pos.line) == 0 {
                pos.col
            } else {
                pos.col + 1
            };
            starts.push(Position::new(pos.line, col));
            let rows: Vec<String> = text.split('\n').map(|row| row.repeat(count)).collect();
            let mut appended = String::new();
            for (offset, row) in rows.iter().enumerate() {
                let line = pos.line + offset as u32;
                if line > buf.last_line() {
                    appended.push('\n');
                    appended.push_str(&" ".repeat(col as usize));
                    appended.push_str(row);
                    continue;
                }
                let len = buf.line_len(line);
                let padding = " ".repeat(col.saturating_sub(len) as usize);
                edits.push(Edit::insert(
                    Position::new(line, col.min(len)),
                    format!("{padding}{row}"),
                ));
            }
            if !appended.is_empty() {
                edits.push(Edit::insert(buf.end_of_buffer(), appended));
            }
        }
        if self.apply(buf, &edits).is_none() {
            return;
        }
        let cursors = starts
            .into_iter()
            .map(|pos| Cursor::new(buf.clamp_normal(pos)))
            .collect();
        self.cursors.replace(cursors);
    }

    fn put_over_selection<B: TextBuffer + ?Sized>(
        &mut self,
        buf: &mut B,
        kind: VisualKind,
        texts: &[String],
        value_kind: RegisterKind,
        count: usize,
    ) {
        let regions: Vec<Region> = self
            .cursors
            .iter()
            .filter_map(|cursor| selection_region(buf, cursor, kind, false))
            .collect();
        self.cursors.clear_anchors();
        self.set_mode(Mode::Normal);
        if regions.is_empty() {
            return;
        }
        let old = RegisterValue::new(
            regions.iter().map(|region| region.text(buf)).collect(),
            regions[0].kind(),
        );

        let mut edits = Vec::new();
        let mut owners = Vec::new();
        for (region, text) in regions.iter().zip(texts) {
            let text = vec![text.as_str(); count].join(match value_kind {
                RegisterKind::Linewise => "\n",
                _ => "",
            });
            owners.push((*region, edits.len()));
            match *region {
                Region::Chars(range) if value_kind == RegisterKind::Linewise => {
                    edits.push(Edit::replace(range, format!("\n{text}\n")));
                }
                Region::Chars(range) => edits.push(Edit::replace(range, text)),
                Region::Lines { .. } => {
                    edits.push(Edit::replace(region.pieces(buf)[0], text));
                }
                Region::Block { .. } => {
                    let mut pieces = region.pieces(buf).into_iter();
                    if let Some(first) = pieces.next() {
                        edits.push(Edit::replace(first, text));
                    }
                    edits.extend(pieces.map(Edit::delete));
                }
            }
        }
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };
        self.registers.delete(None, old);

        let cursors = owners
            .into_iter()
            .map(|(region, edit)| {
                let placed = applied.edit(edit);
                let position = match (region, value_kind) {
                    (Region::Chars(_), RegisterKind::Linewise) => {
                        let line = placed.start.line + 1;
                        Position::new(line, first_non_blank(buf, line))
                    }
                    (Region::Lines { .. }, _) | (_, RegisterKind::Linewise) => {
                        Position::new(placed.start.line, first_non_blank(buf, placed.start.line))
                    }
                    _ => Position::new(placed.end.line, placed.end.col.saturating_sub(1)),
                };
                Cursor::new(buf.clamp_normal(position))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    /// `J`: joins `count` lines (at least two), or the selected lines.
    pub(crate) fn join<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, count: u32) {
        let visual = self.mode.visual_kind();
        let mut spans: Vec<(usize, Region)> = Vec::new();
        for (idx, cursor) in self.cursors.iter().enumerate() {
            let (first, last) = match visual.and_then(|kind| cursor.selection(kind)) {
                Some(selection) => {
                    let (first, last) = (selection.start().line, selection.end().line);
                    (first, last.max(first + 1))
                }
                None => {
                    let first = cursor.position.line;
                    (first, first.saturating_add(count.max(2) - 1))
                }
            };
            let last = last.min(buf.last_line());
            if last > first {
                spans.push((idx, Region::Lines { first, last }));
            }
        }
        if visual.is_some() {
            self.cursors.clear_anchors();
            self.set_mode(Mode::Normal);
        }
        let spans = merge_regions(spans);
        if spans.is_empty() {
            return;
        }

        let mut edits = Vec::with_capacity(spans.len());
        let mut join_cols = Vec::with_capacity(spans.len());
        for (_, region) in &spans {
            let Region::Lines { first, last } = *region else {
                continue;
            };
            let mut joined = buf.line_text(first);
            let mut join_col = 0;
            for line in first + 1..=last {
                let text = buf.line_text(line);
                let next = text.trim_start_matches([' ', '\t']);
                join_col = grapheme_count(&joined);
                if next.is_empty() {
                    continue;
                }
                let needs_space = !joined.is_empty()
                    && !joined.ends_with([' ', '\t'])
                    && !next.starts_with(')');
                if needs_space {
                    joined.push(' ');
                }
                joined.push_str(next);
            }
            let range = Range::new(Position::new(first, 0), Position::new(last, buf.line_len(last)));
            edits.push(Edit::replace(range, joined));
            join_cols.push(join_col);
        }
        let Some(applied) = self.apply(buf, &edits) else {
            return;
        };
        let cursors = join_cols
            .into_iter()
            .enumerate()
            .map(|(i, col)| {
                let line = applied.edit(i).start.line;
                Cursor::new(buf.clamp_normal(Position::new(line, col)))
            })
            .collect();
        self.cursors.replace(cursors);
    }

    /// `r{char}`. In Normal mode fails as a whole for a cursor that lacks
    /// `count` characters to its right; in Visual mode replaces every
    /// selected character.
    pub(crate) fn replace_char<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, ch: char, count: u32) {
        if let Some(kind) = self.mode.visual_kind() {
            let regions: Vec<(usize, Region)> = self
                .cursors
                .iter()
                .enumerate()
                .filter_map(|(idx, cursor)| Some((idx, selection_region(buf, cursor, kind, false)?)))
                .collect();
            self.cursors.clear_anchors();
            self.set_mode(Mode::Normal);
            let regions = merge_regions(regions);
            let edits: Vec<Edit> = regions
                .iter()
                .flat_map(|(_, region)| region.pieces(buf))
                .map(|range| {
                    let text: String = buf
                        .slice_to_string(range)
                        .split('\n')
                        .map(|line| ch.to_string().repeat(grapheme_count(line) as usize))
                        .collect::<Vec<_>>()
                        .join("\n");
                    Edit::replace(range, text)
                })
                .collect();
            if self.apply(buf, &edits).is_some() {
                let cursors = regions
                    .iter()
                    .map(|(_, region)| Cursor::new(buf.clamp_normal(region.start())))
                    .collect();
                self.cursors.replace(cursors);
            }
            return;
        }

        let mut edits = Vec::new();
        let mut targets = Vec::new();
        for cursor in self.cursors.iter() {
            let pos = cursor.position;
            let end = pos.col.saturating_add(count);
            if end > buf.line_len(pos.line) {
                targets.push(pos);
                continue;
            }
            edits.push(Edit::replace(
                Range::new(pos, Position::new(pos.line, end)),
                ch.to_string().repeat(count as usize),
            ));
            targets.push(Position::new(pos.line, end - 1));
        }
        if edits.is_empty() || self.apply(buf, &edits).is_none() {
            return;
        }
        for (cursor, target) in self.cursors.iter_mut().zip(targets) {
            cursor.move_to(target);
        }
        self.cursors.clamp(buf, true);
    }

    /// `~` in Normal mode: toggles `count` characters and moves past them.
    pub(crate) fn toggle_case_chars<B: TextBuffer + ?Sized>(&mut self, buf: &mut B, count: u32) {
        let mut edits = Vec::new();
        let mut targets = Vec::new();
        for cursor in self.cursors.iter() {
            let pos = cursor.position;
            let len = buf.line_len(pos.line);
            if len == 0 {
                targets.push(pos);
                continue;
            }
            let end = pos.col.saturating_add(count).min(len);
            let range = Range::new(pos, Position::new(pos.line, end));
            edits.push(Edit::replace(range, toggle_case(&buf.slice_to_string(range))));
            targets.push(Position::new(pos.line, end));
        }
        if self.apply(buf, &edits).is_none() {
            return;
        }
        let cursors = targets
            .into_iter()
            .map(|pos| Cursor::new(buf.clamp_normal(pos)))
            .collect();
        self.cursors.replace(cursors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_overlapping_line_regions() {
        let regions = vec![
            (1, Region::Lines { first: 1, last: 3 }),
            (0, Region::Lines { first: 0, last: 1 }),
            (2, Region::Lines { first: 6, last: 6 }),
        ];
        let merged = merge_regions(regions);
        assert_eq!(
            merged,
            vec![
                (0, Region::Lines { first: 0, last: 3 }),
                (2, Region::Lines { first: 6, last: 6 }),
            ]
        );
    }

    #[test]
    fn identical_regions_collapse_to_the_first_owner() {
        let range = Range::new(Position::new(0, 0), Position::new(0, 3));
        let merged = merge_regions(vec![(1, Region::Chars(range)), (0, Region::Chars(range))]);
        assert_eq!(merged, vec![(0, Region::Chars(range))]);
    }

    #[test]
    fn toggles_case_per_char() {
        assert_eq!(toggle_case("aBc1"), "AbC1");
        assert_eq!(case_op(Operator::Uppercase, "straße"), "STRASSE");
    }
}
