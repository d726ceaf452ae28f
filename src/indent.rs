//! Leading-whitespace helpers shared by `o`/`O`, insert-mode Enter and the
//! shift operators.

use crate::config::Config;

/// The leading whitespace of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map_or(line.len(), |(i, _)| i);
    &line[..end]
}

/// Display width of `text` when it starts at column 0.
pub fn display_width(text: &str, tab_width: u32) -> u32 {
    let tab = tab_width.max(1);
    text.chars().fold(0, |col, c| match c {
        '\t' => col + tab - col % tab,
        _ => col + 1,
    })
}

/// Returns the line with its indentation shifted by `levels` shift widths, or
/// `None` when the line is left alone (blank lines are never indented).
pub fn shift_line(line: &str, levels: i32, config: &Config) -> Option<String> {
    let ws = leading_whitespace(line);
    let body = &line[ws.len()..];
    if body.is_empty() {
        return None;
    }

    let width = display_width(ws, config.tab_width()) as i64;
    let delta = i64::from(levels) * i64::from(config.shift_width());
    let target = (width + delta).max(0) as u32;
    let indent = config.indent_text(target);
    if indent == ws {
        return None;
    }
    Some(format!("{indent}{body}"))
}
