//! Motion resolvers.
//!
//! Every resolver is a pure function of the buffer, a starting position and a
//! count. Results are clamped to the buffer: a motion that would run past the
//! first or last line stops there instead of failing. The only state a motion
//! needs besides its inputs (the last `f` target, the last search pattern) is
//! bound into the [`Motion`] value by the mode handler before resolving.
//!
//! Counted motions are resolved as repeated single steps, so `3w` lands where
//! `w` pressed three times would. Exceptions are the motions whose count is
//! not a repetition: vertical moves (columns clamp per line), `f`/`t`
//! (all-or-nothing), searches, `G`/`gg`, `$` and `|`.

use crate::text::{CharClass, byte_offset, char_class, col_of_byte, graphemes, is_blank_line};
use crate::traits::TextBuffer;
use crate::types::{Position, Range};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// `0`
    LineStart,
    /// `^`
    FirstNonBlank,
    /// `$`
    LineEnd,
    /// `g_`
    LastNonBlank,
    /// `|`
    Column,
    /// `+` and Enter
    NextLineStart,
    /// `-`
    PrevLineStart,
    /// `_`
    CurrentLine,
    /// `gg`
    FirstLine,
    /// `G`
    LastLine,
    WordForward { big: bool },
    WordBackward { big: bool },
    WordEnd { big: bool },
    WordEndBackward { big: bool },
    ParagraphForward,
    ParagraphBackward,
    SentenceForward,
    SentenceBackward,
    FindChar { ch: char, forward: bool, till: bool },
    /// `;` and `,`, bound to the last find by the handler.
    RepeatFind { reverse: bool },
    /// `%`
    MatchPair,
    /// `*` and `#`, bound to the word under the cursor by the handler.
    SearchWord { forward: bool },
    /// `n` and `N`, bound to the last search by the handler.
    RepeatSearch { reverse: bool },
    Search { pattern: String, forward: bool, whole_word: bool },
}

/// How an operator treats the text between the start and the motion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Exclusive,
    Inclusive,
    Linewise,
}

/// The text an operator acts on when combined with a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSpan {
    /// Half-open range. For linewise spans it runs from column 0 of the first
    /// line to the end of the last line.
    pub range: Range,
    pub linewise: bool,
}

impl MotionSpan {
    pub fn lines<B: TextBuffer + ?Sized>(buf: &B, first: u32, last: u32) -> Self {
        let (first, last) = (first.min(last), first.max(last));
        Self {
            range: Range::new(Position::new(first, 0), Position::new(last, buf.line_len(last))),
            linewise: true,
        }
    }

    pub fn chars(range: Range) -> Self {
        Self {
            range,
            linewise: false,
        }
    }
}

impl Motion {
    pub fn kind(&self) -> MotionKind {
        use Motion::*;
        match self {
            Up | Down | NextLineStart | PrevLineStart | CurrentLine | FirstLine | LastLine => {
                MotionKind::Linewise
            }
            LineEnd | LastNonBlank | WordEnd { .. } | WordEndBackward { .. } | MatchPair => {
                MotionKind::Inclusive
            }
            FindChar { forward: true, .. } => MotionKind::Inclusive,
            _ => MotionKind::Exclusive,
        }
    }

    /// Vertical motions keep the cursor's preferred column.
    pub fn is_vertical(&self) -> bool {
        matches!(self, Motion::Up | Motion::Down)
    }

    /// Motions whose count selects a line or column instead of repeating.
    /// For these the handler passes 0 when no count was typed.
    pub fn count_is_absolute(&self) -> bool {
        matches!(self, Motion::FirstLine | Motion::LastLine | Motion::Column)
    }

    /// Resolves the motion for cursor movement.
    pub fn resolve<B: TextBuffer + ?Sized>(&self, buf: &B, from: Position, count: u32) -> Position {
        self.resolve_with(buf, from, count, None)
    }

    /// Resolves with an explicit preferred column for vertical motions.
    /// `u32::MAX` sticks to the end of each line, as after `$`.
    pub fn resolve_with<B: TextBuffer + ?Sized>(
        &self,
        buf: &B,
        from: Position,
        count: u32,
        preferred_col: Option<u32>,
    ) -> Position {
        let from = buf.clamp(from);
        self.try_resolve(buf, from, count, preferred_col)
            .unwrap_or(from)
    }

    /// Resolves a target, or `None` when the motion fails (a missing `f`
    /// target, a search without matches, `j` on the last line).
    fn try_resolve<B: TextBuffer + ?Sized>(
        &self,
        buf: &B,
        from: Position,
        count: u32,
        preferred_col: Option<u32>,
    ) -> Option<Position> {
        use Motion::*;
        let n = count.max(1);
        let last = buf.last_line();
        let pos = match self {
            Left => Position::new(from.line, from.col.saturating_sub(n)),
            Right => {
                let max = buf.line_len(from.line).saturating_sub(1);
                Position::new(from.line, from.col.saturating_add(n).min(max))
            }
            Up | Down => {
                let line = if *self == Up {
                    from.line.saturating_sub(n)
                } else {
                    from.line.saturating_add(n).min(last)
                };
                if line == from.line {
                    return None;
                }
                let col = preferred_col.unwrap_or(from.col);
                buf.clamp_normal(Position::new(line, col))
            }
            LineStart => Position::new(from.line, 0),
            FirstNonBlank => Position::new(from.line, first_non_blank(buf, from.line)),
            LineEnd => buf.line_end(from.line.saturating_add(n - 1)),
            LastNonBlank => {
                let line = from.line.saturating_add(n - 1).min(last);
                Position::new(line, last_non_blank(buf, line))
            }
            Column => buf.clamp_normal(Position::new(from.line, count.saturating_sub(1))),
            NextLineStart => {
                let line = from.line.saturating_add(n).min(last);
                if line == from.line {
                    return None;
                }
                Position::new(line, first_non_blank(buf, line))
            }
            PrevLineStart => {
                if from.line == 0 {
                    return None;
                }
                let line = from.line.saturating_sub(n);
                Position::new(line, first_non_blank(buf, line))
            }
            CurrentLine => {
                let line = from.line.saturating_add(n - 1).min(last);
                Position::new(line, first_non_blank(buf, line))
            }
            FirstLine | LastLine => {
                let line = match (self, count) {
                    (FirstLine, 0) => 0,
                    (_, 0) => last,
                    (_, c) => (c - 1).min(last),
                };
                Position::new(line, first_non_blank(buf, line))
            }
            WordForward { big } => {
                let mut walker = Walker::new(buf, *big);
                let mut cur = from;
                for _ in 0..n {
                    let (next, hit_end) = walker.word_forward(cur);
                    cur = next;
                    if hit_end {
                        break;
                    }
                }
                cur
            }
            WordBackward { big } => {
                let mut walker = Walker::new(buf, *big);
                (0..n).fold(from, |cur, _| walker.word_backward(cur))
            }
            WordEnd { big } => {
                let mut walker = Walker::new(buf, *big);
                (0..n).fold(from, |cur, _| walker.word_end(cur))
            }
            WordEndBackward { big } => {
                let mut walker = Walker::new(buf, *big);
                (0..n).fold(from, |cur, _| walker.word_end_backward(cur))
            }
            ParagraphForward => (0..n).fold(from, |cur, _| paragraph_forward(buf, cur)),
            ParagraphBackward => (0..n).fold(from, |cur, _| paragraph_backward(buf, cur)),
            SentenceForward => {
                let starts = sentence_starts(buf);
                (0..n).fold(from, |cur, _| {
                    starts
                        .iter()
                        .copied()
                        .find(|s| *s > cur)
                        .unwrap_or_else(|| buf.line_end(last))
                })
            }
            SentenceBackward => {
                let starts = sentence_starts(buf);
                (0..n).fold(from, |cur, _| {
                    starts
                        .iter()
                        .rev()
                        .copied()
                        .find(|s| *s < cur)
                        .unwrap_or(Position::ZERO)
                })
            }
            FindChar { ch, forward, till } => find_in_line(buf, from, *ch, *forward, *till, n, false)?,
            MatchPair => match_pair(buf, from)?,
            Search {
                pattern,
                forward,
                whole_word,
            } => {
                let mut cur = from;
                for _ in 0..n {
                    cur = search(buf, cur, pattern, *forward, *whole_word)?;
                }
                cur
            }
            RepeatFind { .. } | SearchWord { .. } | RepeatSearch { .. } => return None,
        };
        Some(pos)
    }

    /// The text an operator acts on, or `None` when the motion fails.
    pub fn span<B: TextBuffer + ?Sized>(
        &self,
        buf: &B,
        from: Position,
        count: u32,
    ) -> Option<MotionSpan> {
        let from = buf.clamp(from);
        let n = count.max(1);
        match self {
            // Under an operator `l` may reach past the last character.
            Motion::Right => {
                let len = buf.line_len(from.line);
                let end = Position::new(from.line, from.col.saturating_add(n).min(len));
                return Some(MotionSpan::chars(Range::new(from, end)));
            }
            Motion::LineEnd => {
                let line = from.line.saturating_add(n - 1).min(buf.last_line());
                let end = Position::new(line, buf.line_len(line));
                return Some(MotionSpan::chars(Range::new(from, end)));
            }
            Motion::WordForward { big } => return Some(word_forward_span(buf, from, n, *big)),
            Motion::ParagraphForward => {
                let to = self.try_resolve(buf, from, count, None)?;
                if !is_blank_line(&buf.line_text(to.line)) || to.line == from.line {
                    // Ran into the end of the buffer: take everything up to it.
                    let end = buf.end_of_buffer();
                    return Some(exclusive_span(buf, Range::new(from, end)));
                }
                return Some(exclusive_span(buf, Range::new(from, to)));
            }
            _ => {}
        }

        let to = self.try_resolve(buf, from, count, None)?;
        let span = match self.kind() {
            MotionKind::Linewise => MotionSpan::lines(buf, from.line, to.line),
            MotionKind::Inclusive => {
                let (start, end) = (from.min(to), from.max(to));
                let end = Position::new(end.line, (end.col + 1).min(buf.line_len(end.line)));
                MotionSpan::chars(Range::new(start, end))
            }
            MotionKind::Exclusive => exclusive_span(buf, Range::new(from, to)),
        };
        Some(span)
    }
}

/// Applies Vim's adjustment for exclusive motions that end at column 0 of a
/// later line: the end moves back to the previous line, and the span becomes
/// linewise when it started at or before the first non-blank.
fn exclusive_span<B: TextBuffer + ?Sized>(buf: &B, range: Range) -> MotionSpan {
    let Range { start, end } = range;
    if end.col == 0 && end.line > start.line {
        let line = end.line - 1;
        if start.col <= first_non_blank(buf, start.line) {
            return MotionSpan::lines(buf, start.line, line);
        }
        return MotionSpan::chars(Range::new(start, Position::new(line, buf.line_len(line))));
    }
    MotionSpan::chars(range)
}

/// `w` under an operator stops at the end of the line holding the last word
/// moved over, and at the end of the buffer when it runs out of words.
fn word_forward_span<B: TextBuffer + ?Sized>(buf: &B, from: Position, n: u32, big: bool) -> MotionSpan {
    let mut walker = Walker::new(buf, big);
    let mut cur = from;
    let mut step_start = from;
    for _ in 0..n {
        step_start = cur;
        let (next, hit_end) = walker.word_forward(cur);
        if hit_end {
            return MotionSpan::chars(Range::new(from, buf.end_of_buffer()));
        }
        cur = next;
    }
    if cur.line > step_start.line {
        let line = step_start.line;
        let end = Position::new(line, buf.line_len(line));
        return MotionSpan::chars(Range::new(from, end.max(from)));
    }
    MotionSpan::chars(Range::new(from, cur))
}

pub(crate) fn first_non_blank<B: TextBuffer + ?Sized>(buf: &B, line: u32) -> u32 {
    let text = buf.line_text(line);
    let gs = graphemes(&text);
    gs.iter()
        .position(|g| char_class(g, false) != CharClass::Blank)
        .unwrap_or(gs.len().saturating_sub(1)) as u32
}

fn last_non_blank<B: TextBuffer + ?Sized>(buf: &B, line: u32) -> u32 {
    let text = buf.line_text(line);
    let gs = graphemes(&text);
    gs.iter()
        .rposition(|g| char_class(g, false) != CharClass::Blank)
        .unwrap_or(0) as u32
}

/// Walks graphemes across lines for the word motions, caching the current
/// line. The line break between two lines counts as a blank.
pub(crate) struct Walker<'a, B: TextBuffer + ?Sized> {
    buf: &'a B,
    big: bool,
    line: Option<u32>,
    graphemes: Vec<String>,
}

impl<'a, B: TextBuffer + ?Sized> Walker<'a, B> {
    pub(crate) fn new(buf: &'a B, big: bool) -> Self {
        Self {
            buf,
            big,
            line: None,
            graphemes: Vec::new(),
        }
    }

    fn load(&mut self, line: u32) {
        if self.line != Some(line) {
            let text = self.buf.line_text(line);
            self.graphemes = graphemes(&text).into_iter().map(str::to_string).collect();
            self.line = Some(line);
        }
    }

    pub(crate) fn len(&mut self, line: u32) -> u32 {
        self.load(line);
        self.graphemes.len() as u32
    }

    pub(crate) fn class(&mut self, pos: Position) -> CharClass {
        self.load(pos.line);
        if self.graphemes.is_empty() {
            return CharClass::EmptyLine;
        }
        match self.graphemes.get(pos.col as usize) {
            Some(g) => char_class(g, self.big),
            None => CharClass::Blank,
        }
    }

    pub(crate) fn next(&mut self, pos: Position) -> Option<Position> {
        if pos.col + 1 < self.len(pos.line) {
            Some(Position::new(pos.line, pos.col + 1))
        } else if pos.line < self.buf.last_line() {
            Some(Position::new(pos.line + 1, 0))
        } else {
            None
        }
    }

    pub(crate) fn prev(&mut self, pos: Position) -> Option<Position> {
        if pos.col > 0 {
            let len = self.len(pos.line);
            Some(Position::new(pos.line, (pos.col - 1).min(len.saturating_sub(1))))
        } else if pos.line > 0 {
            let len = self.len(pos.line - 1);
            Some(Position::new(pos.line - 1, len.saturating_sub(1)))
        } else {
            None
        }
    }

    /// One `w` step. The flag reports that the end of the buffer was reached
    /// without finding another word.
    fn word_forward(&mut self, pos: Position) -> (Position, bool) {
        let mut cur = pos;
        let start = self.class(cur);
        if start != CharClass::Blank {
            loop {
                let Some(next) = self.next(cur) else {
                    return (cur, true);
                };
                let crossed = next.line != cur.line;
                cur = next;
                if crossed || self.class(cur) != start {
                    break;
                }
            }
        }
        while self.class(cur) == CharClass::Blank {
            match self.next(cur) {
                Some(next) => cur = next,
                None => return (cur, true),
            }
        }
        (cur, false)
    }

    fn word_end(&mut self, pos: Position) -> Position {
        let Some(mut cur) = self.next(pos) else {
            return pos;
        };
        while matches!(self.class(cur), CharClass::Blank | CharClass::EmptyLine) {
            match self.next(cur) {
                Some(next) => cur = next,
                None => return cur,
            }
        }
        let class = self.class(cur);
        while let Some(next) = self.next(cur) {
            if next.line != cur.line || self.class(next) != class {
                break;
            }
            cur = next;
        }
        cur
    }

    fn word_backward(&mut self, pos: Position) -> Position {
        let Some(mut cur) = self.prev(pos) else {
            return pos;
        };
        while self.class(cur) == CharClass::Blank {
            match self.prev(cur) {
                Some(prev) => cur = prev,
                None => return cur,
            }
        }
        let class = self.class(cur);
        if class == CharClass::EmptyLine {
            return cur;
        }
        while let Some(prev) = self.prev(cur) {
            if prev.line != cur.line || self.class(prev) != class {
                break;
            }
            cur = prev;
        }
        cur
    }

    fn word_end_backward(&mut self, pos: Position) -> Position {
        let mut cur = pos;
        let start = self.class(cur);
        if start != CharClass::Blank {
            loop {
                let Some(prev) = self.prev(cur) else {
                    return Position::ZERO;
                };
                let crossed = prev.line != cur.line;
                cur = prev;
                if crossed || self.class(cur) != start {
                    break;
                }
            }
        }
        while self.class(cur) == CharClass::Blank {
            match self.prev(cur) {
                Some(prev) => cur = prev,
                None => return Position::ZERO,
            }
        }
        cur
    }
}

fn line_is_blank<B: TextBuffer + ?Sized>(buf: &B, line: u32) -> bool {
    is_blank_line(&buf.line_text(line))
}

fn paragraph_forward<B: TextBuffer + ?Sized>(buf: &B, from: Position) -> Position {
    let last = buf.last_line();
    let mut line = from.line;
    while line < last && line_is_blank(buf, line) {
        line += 1;
    }
    while line < last && !line_is_blank(buf, line) {
        line += 1;
    }
    if line_is_blank(buf, line) && line != from.line {
        Position::new(line, 0)
    } else {
        buf.line_end(last)
    }
}

fn paragraph_backward<B: TextBuffer + ?Sized>(buf: &B, from: Position) -> Position {
    let mut line = from.line;
    while line > 0 && line_is_blank(buf, line) {
        line -= 1;
    }
    while line > 0 && !line_is_blank(buf, line) {
        line -= 1;
    }
    Position::new(line, 0)
}

/// Start positions of every sentence in the buffer, in order. A blank line
/// following text also counts as a sentence start.
pub(crate) fn sentence_starts<B: TextBuffer + ?Sized>(buf: &B) -> Vec<Position> {
    let mut starts = Vec::new();
    let mut expect_start = true;
    let mut pending_end = false;
    let mut prev_blank = false;

    for line in 0..=buf.last_line() {
        let text = buf.line_text(line);
        if is_blank_line(&text) {
            if !prev_blank {
                starts.push(Position::new(line, 0));
            }
            prev_blank = true;
            expect_start = true;
            pending_end = false;
            continue;
        }
        prev_blank = false;

        for (col, g) in graphemes(&text).iter().enumerate() {
            let c = g.chars().next().unwrap_or(' ');
            if c.is_whitespace() {
                if pending_end {
                    expect_start = true;
                    pending_end = false;
                }
                continue;
            }
            if expect_start {
                starts.push(Position::new(line, col as u32));
                expect_start = false;
            }
            if matches!(c, '.' | '!' | '?') {
                pending_end = true;
            } else if !(pending_end && matches!(c, ')' | ']' | '"' | '\'')) {
                pending_end = false;
            }
        }
        if pending_end {
            expect_start = true;
            pending_end = false;
        }
    }
    starts
}

/// `f`/`t`/`F`/`T` within the current line. `repeat` skips an adjacent match
/// for `t`, so that `;` after `t` makes progress.
pub(crate) fn find_in_line<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    ch: char,
    forward: bool,
    till: bool,
    count: u32,
    repeat: bool,
) -> Option<Position> {
    let text = buf.line_text(from.line);
    let gs = graphemes(&text);
    let target = ch.to_string();
    let col = from.col as usize;
    let skip = usize::from(till && repeat);

    let found = if forward {
        gs.iter()
            .enumerate()
            .skip(col + 1 + skip)
            .filter(|(_, g)| **g == target)
            .nth(count as usize - 1)
            .map(|(i, _)| i)
    } else {
        gs.iter()
            .enumerate()
            .take(col.saturating_sub(skip))
            .rev()
            .filter(|(_, g)| **g == target)
            .nth(count as usize - 1)
            .map(|(i, _)| i)
    }?;

    let col = match (forward, till) {
        (true, true) => found - 1,
        (false, true) => found + 1,
        _ => found,
    };
    Some(Position::new(from.line, col as u32))
}

const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

/// `%`: the bracket matching the first bracket at or after the cursor.
fn match_pair<B: TextBuffer + ?Sized>(buf: &B, from: Position) -> Option<Position> {
    let text = buf.line_text(from.line);
    let gs = graphemes(&text);
    let (col, bracket) = gs
        .iter()
        .enumerate()
        .skip(from.col as usize)
        .find_map(|(i, g)| {
            let c = g.chars().next()?;
            PAIRS
                .iter()
                .any(|(o, cl)| *o == c || *cl == c)
                .then_some((i as u32, c))
        })?;
    let start = Position::new(from.line, col);
    if let Some((open, close)) = PAIRS.iter().find(|(o, _)| *o == bracket) {
        find_unmatched(buf, start, *open, *close, true)
    } else {
        let (open, close) = PAIRS.iter().find(|(_, c)| *c == bracket)?;
        find_unmatched(buf, start, *open, *close, false)
    }
}

/// Scans from `from` (exclusive) for the bracket that closes (forward) or
/// opens (backward) the current nesting level.
pub(crate) fn find_unmatched<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    open: char,
    close: char,
    forward: bool,
) -> Option<Position> {
    let (push, pop) = if forward { (open, close) } else { (close, open) };
    let mut walker = Walker::new(buf, false);
    let mut depth = 0u32;
    let mut cur = from;
    loop {
        cur = if forward {
            walker.next(cur)?
        } else {
            walker.prev(cur)?
        };
        walker.load(cur.line);
        let Some(c) = walker
            .graphemes
            .get(cur.col as usize)
            .and_then(|g| g.chars().next())
        else {
            continue;
        };
        if c == push {
            depth += 1;
        } else if c == pop {
            if depth == 0 {
                return Some(cur);
            }
            depth -= 1;
        }
    }
}

/// Literal search with wrap-around. Returns the start of the next match.
fn search<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    pattern: &str,
    forward: bool,
    whole_word: bool,
) -> Option<Position> {
    if pattern.is_empty() {
        return None;
    }
    let line_count = buf.last_line() + 1;
    let matches_in = |line: u32| -> Vec<u32> {
        let text = buf.line_text(line);
        text.match_indices(pattern)
            .filter(|(idx, m)| !whole_word || is_whole_word(&text, *idx, idx + m.len()))
            .map(|(idx, _)| col_of_byte(&text, idx))
            .collect()
    };

    for step in 0..=line_count {
        let line = if forward {
            (from.line + step) % line_count
        } else {
            (from.line + line_count * 2 - step) % line_count
        };
        // Step 0 is the rest of the starting line; the last step wraps back
        // onto its other part.
        let wrapped = step == line_count;
        let cols = matches_in(line);
        let hit = if forward {
            cols.into_iter().find(|&col| match step {
                0 => col > from.col,
                _ if wrapped => col <= from.col,
                _ => true,
            })
        } else {
            cols.into_iter().rev().find(|&col| match step {
                0 => col < from.col,
                _ if wrapped => col >= from.col,
                _ => true,
            })
        };
        if let Some(col) = hit {
            return Some(Position::new(line, col));
        }
    }
    None
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let before = text[..start].chars().next_back().is_none_or(|c| !is_word(c));
    let after = text[end..].chars().next().is_none_or(|c| !is_word(c));
    before && after
}

/// The word under or after the cursor and its start, used by `*` and `#`.
pub(crate) fn word_under_cursor<B: TextBuffer + ?Sized>(
    buf: &B,
    pos: Position,
) -> Option<(Position, String)> {
    let text = buf.line_text(pos.line);
    let gs = graphemes(&text);
    let start = gs
        .iter()
        .enumerate()
        .skip(pos.col as usize)
        .find(|(_, g)| char_class(g, false) == CharClass::Word)
        .map(|(i, _)| i)?;
    let begin = gs[..start]
        .iter()
        .rposition(|g| char_class(g, false) != CharClass::Word)
        .map_or(0, |i| i + 1);
    let end = gs[start..]
        .iter()
        .position(|g| char_class(g, false) != CharClass::Word)
        .map_or(gs.len(), |i| start + i);
    let from = byte_offset(&text, begin as u32);
    let to = byte_offset(&text, end as u32);
    Some((Position::new(pos.line, begin as u32), text[from..to].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lines(Vec<&'static str>);

    impl TextBuffer for Lines {
        fn line_count(&self) -> u32 {
            self.0.len() as u32
        }

        fn line_text(&self, line: u32) -> String {
            self.0.get(line as usize).map(|s| s.to_string()).unwrap_or_default()
        }

        fn replace_range(&mut self, _range: Range, _text: &str) {}
    }

    fn p(line: u32, col: u32) -> Position {
        Position::new(line, col)
    }

    #[test]
    fn word_motions_cross_lines_and_stop_on_empty_lines() {
        let buf = Lines(vec!["foo bar", "", "  baz.qux"]);
        let w = Motion::WordForward { big: false };
        assert_eq!(w.resolve(&buf, p(0, 0), 1), p(0, 4));
        assert_eq!(w.resolve(&buf, p(0, 4), 1), p(1, 0));
        assert_eq!(w.resolve(&buf, p(1, 0), 1), p(2, 2));
        assert_eq!(w.resolve(&buf, p(2, 2), 1), p(2, 5));
        assert_eq!(Motion::WordForward { big: true }.resolve(&buf, p(2, 2), 1), p(2, 8));

        let b = Motion::WordBackward { big: false };
        assert_eq!(b.resolve(&buf, p(2, 2), 1), p(1, 0));
        assert_eq!(b.resolve(&buf, p(1, 0), 1), p(0, 4));

        let e = Motion::WordEnd { big: false };
        assert_eq!(e.resolve(&buf, p(0, 0), 1), p(0, 2));
        assert_eq!(e.resolve(&buf, p(0, 2), 1), p(0, 6));
        assert_eq!(e.resolve(&buf, p(0, 6), 1), p(2, 4));

        let ge = Motion::WordEndBackward { big: false };
        assert_eq!(ge.resolve(&buf, p(0, 4), 1), p(0, 2));
        assert_eq!(ge.resolve(&buf, p(2, 2), 1), p(1, 0));
    }

    #[test]
    fn word_forward_stops_at_last_character() {
        let buf = Lines(vec!["one two"]);
        let w = Motion::WordForward { big: false };
        assert_eq!(w.resolve(&buf, p(0, 4), 1), p(0, 6));
        assert_eq!(w.resolve(&buf, p(0, 0), 5), p(0, 6));
    }

    #[test]
    fn dw_span_stops_at_end_of_line() {
        let buf = Lines(vec!["foo bar", "baz"]);
        let span = Motion::WordForward { big: false }.span(&buf, p(0, 4), 1).unwrap();
        assert_eq!(span.range, Range::new(p(0, 4), p(0, 7)));
        assert!(!span.linewise);

        let buf = Lines(vec!["foo"]);
        let span = Motion::WordForward { big: false }.span(&buf, p(0, 0), 1).unwrap();
        assert_eq!(span.range, Range::new(p(0, 0), p(0, 3)));
    }

    #[test]
    fn paragraphs_move_between_blank_runs() {
        let buf = Lines(vec!["a", "b", "", "", "c", "d"]);
        assert_eq!(Motion::ParagraphForward.resolve(&buf, p(0, 0), 1), p(2, 0));
        assert_eq!(Motion::ParagraphForward.resolve(&buf, p(2, 0), 1), p(5, 0));
        assert_eq!(Motion::ParagraphForward.resolve(&buf, p(0, 0), 9), p(5, 0));
        assert_eq!(Motion::ParagraphBackward.resolve(&buf, p(5, 0), 1), p(3, 0));
        assert_eq!(Motion::ParagraphBackward.resolve(&buf, p(3, 0), 1), p(0, 0));
    }

    #[test]
    fn d_paragraph_becomes_linewise_from_line_start() {
        let buf = Lines(vec!["a", "b", "", "c"]);
        let span = Motion::ParagraphForward.span(&buf, p(0, 0), 1).unwrap();
        assert!(span.linewise);
        assert_eq!(span.range.start.line, 0);
        assert_eq!(span.range.end.line, 1);
    }

    #[test]
    fn vertical_motions_clamp_and_fail_at_edges() {
        let buf = Lines(vec!["long line", "ab", "long line"]);
        assert_eq!(Motion::Down.resolve(&buf, p(0, 6), 1), p(1, 1));
        assert_eq!(Motion::Down.resolve_with(&buf, p(1, 1), 1, Some(6)), p(2, 6));
        assert_eq!(Motion::Up.resolve(&buf, p(0, 3), 1), p(0, 3));
        assert!(Motion::Down.span(&buf, p(2, 0), 1).is_none());
        assert_eq!(Motion::Down.resolve(&buf, p(0, 0), 99), p(2, 0));
    }

    #[test]
    fn find_and_till() {
        let buf = Lines(vec!["a,b,c,d"]);
        let f = Motion::FindChar { ch: ',', forward: true, till: false };
        assert_eq!(f.resolve(&buf, p(0, 0), 2), p(0, 3));
        let t = Motion::FindChar { ch: ',', forward: true, till: true };
        assert_eq!(t.resolve(&buf, p(0, 0), 1), p(0, 0));
        assert_eq!(t.resolve(&buf, p(0, 2), 1), p(0, 2));
        let big_f = Motion::FindChar { ch: 'a', forward: false, till: false };
        assert_eq!(big_f.resolve(&buf, p(0, 6), 1), p(0, 0));
        // Not enough matches: the motion fails as a whole.
        assert_eq!(f.resolve(&buf, p(0, 0), 9), p(0, 0));
        assert_eq!(find_in_line(&buf, p(0, 0), ',', true, true, 1, true), Some(p(0, 2)));
    }

    #[test]
    fn match_pair_crosses_lines() {
        let buf = Lines(vec!["fn x() {", "  (a[1])", "}"]);
        assert_eq!(Motion::MatchPair.resolve(&buf, p(0, 0), 1), p(0, 5));
        assert_eq!(Motion::MatchPair.resolve(&buf, p(0, 7), 1), p(2, 0));
        assert_eq!(Motion::MatchPair.resolve(&buf, p(2, 0), 1), p(0, 7));
        assert_eq!(Motion::MatchPair.resolve(&buf, p(1, 4), 1), p(1, 6));
    }

    #[test]
    fn search_wraps_and_respects_word_boundaries() {
        let buf = Lines(vec!["foo food", "bar foo"]);
        let search = |forward, whole_word| Motion::Search {
            pattern: "foo".into(),
            forward,
            whole_word,
        };
        assert_eq!(search(true, true).resolve(&buf, p(0, 0), 1), p(1, 4));
        assert_eq!(search(true, false).resolve(&buf, p(0, 0), 1), p(0, 4));
        assert_eq!(search(true, true).resolve(&buf, p(1, 4), 1), p(0, 0));
        assert_eq!(search(false, true).resolve(&buf, p(0, 0), 1), p(1, 4));
        assert_eq!(word_under_cursor(&buf, p(0, 3)), Some((p(0, 4), "food".to_string())));
    }

    #[test]
    fn sentences() {
        let buf = Lines(vec!["One. Two! (Three.) Four", "", "Five."]);
        let starts = sentence_starts(&buf);
        assert_eq!(starts, vec![p(0, 0), p(0, 5), p(0, 10), p(0, 19), p(1, 0), p(2, 0)]);
        assert_eq!(Motion::SentenceForward.resolve(&buf, p(0, 0), 2), p(0, 10));
        assert_eq!(Motion::SentenceBackward.resolve(&buf, p(0, 12), 1), p(0, 10));
    }

    #[test]
    fn goto_lines_use_absolute_counts() {
        let buf = Lines(vec!["a", "  b", "c"]);
        assert_eq!(Motion::LastLine.resolve(&buf, p(0, 0), 0), p(2, 0));
        assert_eq!(Motion::LastLine.resolve(&buf, p(0, 0), 2), p(1, 2));
        assert_eq!(Motion::FirstLine.resolve(&buf, p(2, 0), 0), p(0, 0));
        assert_eq!(Motion::FirstLine.resolve(&buf, p(2, 0), 99), p(2, 0));
    }

    #[test]
    fn empty_buffer_stays_at_origin() {
        let buf = Lines(vec![]);
        for motion in [
            Motion::Left,
            Motion::Right,
            Motion::Down,
            Motion::WordForward { big: false },
            Motion::WordBackward { big: false },
            Motion::ParagraphForward,
            Motion::LineEnd,
            Motion::LastLine,
        ] {
            assert_eq!(motion.resolve(&buf, p(0, 0), 3), p(0, 0), "{motion:?}");
        }
    }
}
