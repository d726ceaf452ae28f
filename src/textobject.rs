//! Text object resolvers (`iw`, `ap`, `i(`, `a"` and friends).

use crate::motion::{find_unmatched, sentence_starts};
use crate::text::{CharClass, char_class, end_after_insert, graphemes, is_blank_line};
use crate::traits::TextBuffer;
use crate::types::{Position, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextObject {
    Word { big: bool, around: bool },
    Sentence { around: bool },
    Paragraph { around: bool },
    Bracket { open: char, close: char, around: bool },
    Quote { quote: char, around: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRange {
    pub range: Range,
    pub linewise: bool,
}

impl ObjectRange {
    fn chars(start: Position, end: Position) -> Self {
        Self {
            range: Range::new(start, end),
            linewise: false,
        }
    }

    fn lines<B: TextBuffer + ?Sized>(buf: &B, first: u32, last: u32) -> Self {
        Self {
            range: Range::new(Position::new(first, 0), Position::new(last, buf.line_len(last))),
            linewise: true,
        }
    }
}

impl TextObject {
    /// Looks up the bracket pair for a key typed after `i`/`a`.
    pub fn bracket(key: char, around: bool) -> Option<Self> {
        let (open, close) = match key {
            '(' | ')' | 'b' => ('(', ')'),
            '[' | ']' => ('[', ']'),
            '{' | '}' | 'B' => ('{', '}'),
            '<' | '>' => ('<', '>'),
            _ => return None,
        };
        Some(Self::Bracket {
            open,
            close,
            around,
        })
    }

    /// The range of the object at `from`, or `None` when there is none (an
    /// empty line for `iw`, no enclosing bracket for `i(`).
    pub fn resolve<B: TextBuffer + ?Sized>(
        &self,
        buf: &B,
        from: Position,
        count: u32,
    ) -> Option<ObjectRange> {
        let from = buf.clamp(from);
        let count = count.max(1);
        match *self {
            TextObject::Word { big, around } => word(buf, from, count, big, around),
            TextObject::Sentence { around } => sentence(buf, from, count, around),
            TextObject::Paragraph { around } => Some(paragraph(buf, from.line, count, around)),
            TextObject::Bracket {
                open,
                close,
                around,
            } => bracket(buf, from, count, open, close, around),
            TextObject::Quote { quote, around } => quoted(buf, from, quote, around),
        }
    }
}

/// Maximal runs of graphemes sharing a character class: (start, end, class).
fn runs(gs: &[&str], big: bool) -> Vec<(u32, u32, CharClass)> {
    let mut out: Vec<(u32, u32, CharClass)> = Vec::new();
    for (i, g) in gs.iter().enumerate() {
        let class = char_class(g, big);
        match out.last_mut() {
            Some(run) if run.2 == class => run.1 = i as u32 + 1,
            _ => out.push((i as u32, i as u32 + 1, class)),
        }
    }
    out
}

fn word<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    count: u32,
    big: bool,
    around: bool,
) -> Option<ObjectRange> {
    let text = buf.line_text(from.line);
    let gs = graphemes(&text);
    if gs.is_empty() {
        return None;
    }
    let runs = runs(&gs, big);
    let col = from.col.min(gs.len() as u32 - 1);
    let idx = runs.iter().position(|(s, e, _)| (*s..*e).contains(&col))?;
    let last_run = runs.len() - 1;

    let units = if around { count.saturating_mul(2) } else { count } as usize;
    let end_idx = idx.saturating_add(units).saturating_sub(1).min(last_run);
    let mut start = runs[idx].0;
    let end = runs[end_idx].1;

    // `aw` without trailing blanks takes the blanks before the word instead.
    if around
        && idx > 0
        && runs[end_idx].2 != CharClass::Blank
        && runs[idx].2 != CharClass::Blank
        && runs[idx - 1].2 == CharClass::Blank
    {
        start = runs[idx - 1].0;
    }
    Some(ObjectRange::chars(
        Position::new(from.line, start),
        Position::new(from.line, end),
    ))
}

fn line_is_blank<B: TextBuffer + ?Sized>(buf: &B, line: u32) -> bool {
    is_blank_line(&buf.line_text(line))
}

/// Last line of the run of lines sharing `line`'s blankness.
fn run_end<B: TextBuffer + ?Sized>(buf: &B, line: u32) -> u32 {
    let blank = line_is_blank(buf, line);
    let mut end = line;
    while end < buf.last_line() && line_is_blank(buf, end + 1) == blank {
        end += 1;
    }
    end
}

fn run_start<B: TextBuffer + ?Sized>(buf: &B, line: u32) -> u32 {
    let blank = line_is_blank(buf, line);
    let mut start = line;
    while start > 0 && line_is_blank(buf, start - 1) == blank {
        start -= 1;
    }
    start
}

fn paragraph<B: TextBuffer + ?Sized>(buf: &B, line: u32, count: u32, around: bool) -> ObjectRange {
    let mut first = run_start(buf, line);
    let units = if around { count.saturating_mul(2) } else { count };
    let mut last = run_end(buf, line);
    let mut taken = 1;
    while taken < units && last < buf.last_line() {
        last = run_end(buf, last + 1);
        taken += 1;
    }
    // `ap` at the end of the buffer has no trailing blank lines; take the
    // ones before the paragraph instead.
    if around && taken < units && !line_is_blank(buf, line) && first > 0 {
        first = run_start(buf, first - 1);
    }
    ObjectRange::lines(buf, first, last)
}

fn sentence<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    count: u32,
    around: bool,
) -> Option<ObjectRange> {
    if line_is_blank(buf, from.line) {
        return Some(paragraph(buf, from.line, 1, false));
    }
    let starts = sentence_starts(buf);
    let idx = starts.iter().rposition(|s| *s <= from)?;
    let start = starts[idx];
    let end = match starts.get(idx + count as usize) {
        Some(next) if line_is_blank(buf, next.line) && next.line > 0 => {
            Position::new(next.line - 1, buf.line_len(next.line - 1))
        }
        Some(next) => *next,
        None => buf.end_of_buffer(),
    };

    let text = buf.slice_to_string(Range::new(start, end));
    let trimmed = text.trim_end();
    let (line, col) = end_after_insert(start.line, start.col, trimmed);
    let inner_end = Position::new(line, col);
    if !around {
        return Some(ObjectRange::chars(start, inner_end));
    }
    if inner_end == end {
        // No trailing white space: take the blanks before the sentence.
        let line_text = buf.line_text(start.line);
        let gs = graphemes(&line_text);
        let mut col = start.col;
        while col > 0 && gs[col as usize - 1].chars().all(char::is_whitespace) {
            col -= 1;
        }
        return Some(ObjectRange::chars(Position::new(start.line, col), end));
    }
    Some(ObjectRange::chars(start, end))
}

fn char_at<B: TextBuffer + ?Sized>(buf: &B, pos: Position) -> Option<char> {
    buf.grapheme_at(pos).and_then(|g| g.chars().next())
}

fn bracket<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    count: u32,
    open: char,
    close: char,
    around: bool,
) -> Option<ObjectRange> {
    let mut open_pos = match char_at(buf, from) {
        Some(c) if c == open => from,
        _ => find_unmatched(buf, from, open, close, false)?,
    };
    for _ in 1..count {
        open_pos = find_unmatched(buf, open_pos, open, close, false)?;
    }
    let close_pos = find_unmatched(buf, open_pos, open, close, true)?;

    if around {
        let end = Position::new(close_pos.line, close_pos.col + 1);
        return Some(ObjectRange::chars(open_pos, end));
    }

    let mut start = Position::new(open_pos.line, open_pos.col + 1);
    let mut end = close_pos;
    // A block whose brackets sit on their own lines selects whole lines.
    let open_ends_line = start.col >= buf.line_len(open_pos.line);
    let close_starts_line = buf
        .line_text(close_pos.line)
        .chars()
        .take(close_pos.col as usize)
        .all(char::is_whitespace);
    if open_ends_line && close_starts_line && close_pos.line > open_pos.line + 1 {
        return Some(ObjectRange::lines(buf, open_pos.line + 1, close_pos.line - 1));
    }
    if open_ends_line && close_pos.line > open_pos.line {
        start = Position::new(open_pos.line + 1, 0);
    }
    if close_starts_line && close_pos.line > start.line {
        end = Position::new(close_pos.line - 1, buf.line_len(close_pos.line - 1));
    }
    Some(ObjectRange::chars(start, end.max(start)))
}

fn quoted<B: TextBuffer + ?Sized>(
    buf: &B,
    from: Position,
    quote: char,
    around: bool,
) -> Option<ObjectRange> {
    let text = buf.line_text(from.line);
    let gs = graphemes(&text);
    let q = quote.to_string();
    let mut quotes = Vec::new();
    let mut escaped = false;
    for (i, g) in gs.iter().enumerate() {
        if escaped {
            escaped = false;
        } else if *g == "\\" {
            escaped = true;
        } else if *g == q {
            quotes.push(i as u32);
        }
    }

    let col = from.col;
    let pair = if let Some(i) = quotes.iter().position(|c| *c == col) {
        if i % 2 == 0 {
            (quotes.get(i).copied()?, quotes.get(i + 1).copied()?)
        } else {
            (quotes[i - 1], quotes[i])
        }
    } else {
        quotes
            .chunks_exact(2)
            .map(|p| (p[0], p[1]))
            .find(|(a, b)| *a < col && col < *b)
            .or_else(|| {
                quotes
                    .chunks_exact(2)
                    .map(|p| (p[0], p[1]))
                    .find(|(a, _)| *a > col)
            })?
    };
    let (open, close) = pair;
    if !around {
        return Some(ObjectRange::chars(
            Position::new(from.line, open + 1),
            Position::new(from.line, close),
        ));
    }

    let is_ws = |i: usize| gs.get(i).is_some_and(|g| g.chars().all(char::is_whitespace));
    let mut start = open;
    let mut end = close + 1;
    if is_ws(end as usize) {
        while is_ws(end as usize) {
            end += 1;
        }
    } else {
        while start > 0 && is_ws(start as usize - 1) {
            start -= 1;
        }
    }
    Some(ObjectRange::chars(
        Position::new(from.line, start),
        Position::new(from.line, end),
    ))
}
