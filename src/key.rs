use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Key codes representing individual keys on the keyboard.
///
/// This enum provides a platform-agnostic representation of keys.
/// Hosts map their platform-specific key events to these codes, or hand
/// normalized key names to [`KeyEvent::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key, as typed. Shifted letters arrive as their uppercase
    /// form rather than as a lowercase letter plus SHIFT.
    Char(char),
    /// The Escape key, used to exit modes and cancel operations.
    Esc,
    /// The Enter/Return key.
    Enter,
    /// The Backspace key.
    Backspace,
    /// The Tab key.
    Tab,
    /// The Delete key.
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

bitflags::bitflags! {
    /// Keyboard modifier flags.
    ///
    /// These can be combined to represent multiple modifiers held simultaneously.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// A key press event with optional modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,
    /// Modifier keys held during the key press.
    pub mods: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("empty key name")]
    Empty,
    #[error("unknown key name '{0}'")]
    Unknown(String),
    #[error("invalid key modifier '{0}-'")]
    InvalidModifier(String),
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: Modifiers) -> Self {
        Self { code, mods }
    }

    /// A plain key without modifiers.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::CTRL)
    }

    /// The character this key types, if it is an unmodified character key.
    pub fn as_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !self
                    .mods
                    .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META) =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// The count digit this key contributes, if any.
    pub fn as_digit(&self) -> Option<u32> {
        self.as_char().and_then(|c| c.to_digit(10))
    }

    pub fn is_esc(&self) -> bool {
        self.code == KeyCode::Esc
    }

    /// Parses a single normalized key name such as `"d"`, `"<Esc>"`,
    /// `"<C-v>"` or the literal `"\n"`.
    pub fn from_name(name: &str) -> Result<Self, KeyError> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (None, _) => return Err(KeyError::Empty),
            (Some(c), None) => return Ok(Self::from_char(c)),
            _ => {}
        }

        let inner = name
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| KeyError::Unknown(name.to_string()))?;

        let mut mods = Modifiers::empty();
        let mut rest = inner;
        // Modifier prefixes are single letters followed by '-', e.g. C-A-x.
        while rest.len() > 2
            && rest.as_bytes()[0].is_ascii_alphabetic()
            && rest.as_bytes()[1] == b'-'
        {
            let flag = match &rest[..1] {
                "C" | "c" => Modifiers::CTRL,
                "A" | "a" | "M" | "m" => Modifiers::ALT,
                "S" | "s" => Modifiers::SHIFT,
                "D" | "d" => Modifiers::META,
                other => return Err(KeyError::InvalidModifier(other.to_string())),
            };
            mods |= flag;
            rest = &rest[2..];
        }

        let code = parse_key_token(rest).ok_or_else(|| KeyError::Unknown(name.to_string()))?;
        Ok(Self::new(code, mods))
    }

    fn from_char(c: char) -> Self {
        match c {
            '\n' | '\r' => Self::plain(KeyCode::Enter),
            '\t' => Self::plain(KeyCode::Tab),
            '\u{1b}' => Self::plain(KeyCode::Esc),
            '\u{8}' | '\u{7f}' => Self::plain(KeyCode::Backspace),
            c => Self::char(c),
        }
    }
}

fn parse_key_token(token: &str) -> Option<KeyCode> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }

    let code = match token.to_ascii_lowercase().as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "cr" | "enter" | "return" | "ret" | "nl" => KeyCode::Enter,
        "bs" | "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "del" | "delete" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        "lt" => KeyCode::Char('<'),
        "gt" => KeyCode::Char('>'),
        "bar" => KeyCode::Char('|'),
        "bslash" | "backslash" => KeyCode::Char('\\'),
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => return None,
    };
    Some(code)
}

impl FromStr for KeyEvent {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.code {
            KeyCode::Char('<') => "lt".to_string(),
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "CR".to_string(),
            KeyCode::Backspace => "BS".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
        };

        let plain_char = matches!(self.code, KeyCode::Char(c) if c != '<' && c != ' ');
        if self.mods.is_empty() && plain_char {
            return f.write_str(&name);
        }

        f.write_str("<")?;
        if self.mods.contains(Modifiers::CTRL) {
            f.write_str("C-")?;
        }
        if self.mods.contains(Modifiers::ALT) {
            f.write_str("A-")?;
        }
        if self.mods.contains(Modifiers::SHIFT) {
            f.write_str("S-")?;
        }
        if self.mods.contains(Modifiers::META) {
            f.write_str("D-")?;
        }
        write!(f, "{name}>")
    }
}

/// Splits a key string such as `"2G>>ob\nc<Esc>"` into key events.
///
/// `<...>` groups are parsed as named keys; a `<` that does not start a
/// known name is taken literally so that `">>"` and `"<<"` work unquoted.
pub fn parse_keys(input: &str) -> Result<Vec<KeyEvent>, KeyError> {
    let mut keys = Vec::new();
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(close) = rest.find('>') {
                let candidate = &rest[..=close];
                // "<<" or "<>" style input is two literal keys, not a name.
                if close > 1 && !candidate[1..].contains('<') {
                    match KeyEvent::from_name(candidate) {
                        Ok(key) => {
                            keys.push(key);
                            rest = &rest[close + 1..];
                            continue;
                        }
                        Err(KeyError::Unknown(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
            }
        }
        keys.push(KeyEvent::from_char(c));
        rest = &rest[c.len_utf8()..];
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_parse() {
        assert_eq!(KeyEvent::from_name("<Esc>"), Ok(KeyEvent::plain(KeyCode::Esc)));
        assert_eq!(KeyEvent::from_name("<C-v>"), Ok(KeyEvent::ctrl('v')));
        assert_eq!(KeyEvent::from_name("\n"), Ok(KeyEvent::plain(KeyCode::Enter)));
        assert_eq!(KeyEvent::from_name("<lt>"), Ok(KeyEvent::char('<')));
        assert!(matches!(
            KeyEvent::from_name("<Bogus>"),
            Err(KeyError::Unknown(_))
        ));
    }

    #[test]
    fn key_strings_split_into_events() {
        let keys = parse_keys("2G>>ob\nc<Esc>").unwrap();
        assert_eq!(keys.len(), 9);
        assert_eq!(keys[2], KeyEvent::char('>'));
        assert_eq!(keys[6], KeyEvent::plain(KeyCode::Enter));
        assert_eq!(keys[8], KeyEvent::plain(KeyCode::Esc));
    }

    #[test]
    fn angle_brackets_stay_literal_when_not_a_name() {
        let keys = parse_keys("<<").unwrap();
        assert_eq!(keys, vec![KeyEvent::char('<'), KeyEvent::char('<')]);

        let keys = parse_keys("d<xyz>").unwrap();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[1], KeyEvent::char('<'));
    }

    #[test]
    fn display_round_trips_names() {
        for name in ["<Esc>", "<C-r>", "x", "<lt>", "<CR>", "<Space>"] {
            let key = KeyEvent::from_name(name).unwrap();
            assert_eq!(key.to_string(), name);
        }
    }
}
