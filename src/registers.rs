//! Yank/delete registers.
//!
//! Every register holds one value per cursor, so that yanking with three
//! cursors and putting with three cursors gives each cursor its own text back.

use std::collections::HashMap;
use std::fmt;

use crate::traits::Clipboard;

/// How a register value is put back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegisterKind {
    #[default]
    Charwise,
    /// Whole lines. Values are stored without the final line break.
    Linewise,
    /// A visual block: each value line goes into its own buffer line.
    Blockwise,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterValue {
    pub values: Vec<String>,
    pub kind: RegisterKind,
}

impl RegisterValue {
    pub fn new(values: Vec<String>, kind: RegisterKind) -> Self {
        Self { values, kind }
    }

    pub fn single(text: impl Into<String>, kind: RegisterKind) -> Self {
        Self::new(vec![text.into()], kind)
    }

    /// All values as one text, one per line.
    pub fn joined(&self) -> String {
        self.values.join("\n")
    }

    /// True for deletes that Vim files under the numbered registers.
    fn is_multiline(&self) -> bool {
        self.kind == RegisterKind::Linewise || self.values.iter().any(|v| v.contains('\n'))
    }

    fn append(&mut self, other: RegisterValue) {
        let linewise = self.kind == RegisterKind::Linewise || other.kind == RegisterKind::Linewise;
        let sep = if linewise { "\n" } else { "" };
        if self.values.len() == other.values.len() {
            for (value, extra) in self.values.iter_mut().zip(other.values) {
                value.push_str(sep);
                value.push_str(&extra);
            }
        } else {
            let joined = format!("{}{sep}{}", self.joined(), other.joined());
            self.values = vec![joined];
        }
        if linewise {
            self.kind = RegisterKind::Linewise;
        }
    }
}

pub const UNNAMED: char = '"';
pub const YANK: char = '0';
pub const SMALL_DELETE: char = '-';
pub const BLACK_HOLE: char = '_';
pub const LAST_INSERT: char = '.';

/// Returns true for names accepted after `"`.
pub fn is_valid_name(name: char) -> bool {
    name.is_ascii_alphanumeric() || matches!(name, '"' | '-' | '_' | '.' | '+' | '*')
}

fn is_clipboard(name: char) -> bool {
    matches!(name, '+' | '*')
}

#[derive(Default)]
pub struct Registers {
    slots: HashMap<char, RegisterValue>,
    clipboard: Option<Box<dyn Clipboard>>,
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registers")
            .field("slots", &self.slots)
            .field("clipboard", &self.clipboard.is_some())
            .finish()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clipboard(clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            slots: HashMap::new(),
            clipboard: Some(clipboard),
        }
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = Some(clipboard);
    }

    /// Reads a register. `None` (or `"`) is the unnamed register; uppercase
    /// names read their lowercase register.
    pub fn get(&mut self, name: Option<char>) -> Option<RegisterValue> {
        let name = name.unwrap_or(UNNAMED).to_ascii_lowercase();
        if name == BLACK_HOLE {
            return None;
        }
        if is_clipboard(name) {
            if let Some(clipboard) = self.clipboard.as_mut() {
                let text = clipboard.get()?;
                return Some(match text.strip_suffix('\n') {
                    Some(lines) => RegisterValue::single(lines, RegisterKind::Linewise),
                    None => RegisterValue::single(text, RegisterKind::Charwise),
                });
            }
        }
        self.slots.get(&name).cloned()
    }

    /// Stores yanked text.
    pub fn yank(&mut self, name: Option<char>, value: RegisterValue) {
        match name {
            None | Some(UNNAMED) => {
                self.slots.insert(YANK, value.clone());
                self.slots.insert(UNNAMED, value);
            }
            Some(name) => self.write_named(name, value),
        }
    }

    /// Stores deleted or changed text, rotating the numbered registers for
    /// multi-line deletes.
    pub fn delete(&mut self, name: Option<char>, value: RegisterValue) {
        match name {
            Some(BLACK_HOLE) => {}
            None | Some(UNNAMED) => {
                if value.is_multiline() {
                    self.shift_numbered(value.clone());
                } else {
                    self.slots.insert(SMALL_DELETE, value.clone());
                }
                self.slots.insert(UNNAMED, value);
            }
            Some(name) => {
                if value.is_multiline() {
                    self.shift_numbered(value.clone());
                }
                self.write_named(name, value);
            }
        }
    }

    /// Records the text typed during the last insert session.
    pub(crate) fn set_last_insert(&mut self, text: String) {
        self.slots
            .insert(LAST_INSERT, RegisterValue::single(text, RegisterKind::Charwise));
    }

    fn write_named(&mut self, name: char, value: RegisterValue) {
        if name == BLACK_HOLE || name == LAST_INSERT || !is_valid_name(name) {
            return;
        }
        if is_clipboard(name) {
            let mut text = value.joined();
            if value.kind == RegisterKind::Linewise {
                text.push('\n');
            }
            match self.clipboard.as_mut() {
                Some(clipboard) => clipboard.set(text),
                None => {
                    self.slots.insert(name, value.clone());
                }
            }
            self.slots.insert(UNNAMED, value);
            return;
        }

        let lower = name.to_ascii_lowercase();
        let stored = if name.is_ascii_uppercase() {
            let entry = self.slots.entry(lower).or_default();
            if entry.values.is_empty() {
                *entry = value;
            } else {
                entry.append(value);
            }
            entry.clone()
        } else {
            self.slots.insert(lower, value.clone());
            value
        };
        self.slots.insert(UNNAMED, stored);
    }

    fn shift_numbered(&mut self, value: RegisterValue) {
        self.slots.remove(&'9');
        for n in (1..9u8).rev() {
            if let Some(v) = self.slots.remove(&char::from(b'0' + n)) {
                self.slots.insert(char::from(b'1' + n), v);
            }
        }
        self.slots.insert('1', value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn chars(text: &str) -> RegisterValue {
        RegisterValue::single(text, RegisterKind::Charwise)
    }

    fn lines(text: &str) -> RegisterValue {
        RegisterValue::single(text, RegisterKind::Linewise)
    }

    #[test]
    fn yank_fills_unnamed_and_zero() {
        let mut regs = Registers::new();
        regs.yank(None, chars("word"));
        assert_eq!(regs.get(None), Some(chars("word")));
        assert_eq!(regs.get(Some('0')), Some(chars("word")));
    }

    #[test]
    fn deletes_rotate_numbered_registers() {
        let mut regs = Registers::new();
        regs.delete(None, lines("one"));
        regs.delete(None, lines("two"));
        regs.delete(None, chars("x"));
        assert_eq!(regs.get(Some('1')), Some(lines("two")));
        assert_eq!(regs.get(Some('2')), Some(lines("one")));
        assert_eq!(regs.get(Some('-')), Some(chars("x")));
        assert_eq!(regs.get(None), Some(chars("x")));
    }

    #[test]
    fn uppercase_appends() {
        let mut regs = Registers::new();
        regs.yank(Some('a'), chars("foo"));
        regs.yank(Some('A'), chars("bar"));
        assert_eq!(regs.get(Some('a')), Some(chars("foobar")));
        regs.yank(Some('A'), lines("baz"));
        assert_eq!(regs.get(Some('a')), Some(lines("foobar\nbaz")));
    }

    #[test]
    fn black_hole_keeps_unnamed() {
        let mut regs = Registers::new();
        regs.yank(None, chars("keep"));
        regs.delete(Some('_'), chars("gone"));
        assert_eq!(regs.get(None), Some(chars("keep")));
        assert_eq!(regs.get(Some('_')), None);
    }

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Option<String>>>);

    impl Clipboard for Shared {
        fn get(&mut self) -> Option<String> {
            self.0.borrow().clone()
        }

        fn set(&mut self, text: String) {
            *self.0.borrow_mut() = Some(text);
        }
    }

    #[test]
    fn clipboard_registers_round_trip_linewise() {
        let shared = Shared::default();
        let mut regs = Registers::with_clipboard(Box::new(shared.clone()));
        regs.yank(Some('+'), lines("a\nb"));
        assert_eq!(shared.0.borrow().as_deref(), Some("a\nb\n"));
        assert_eq!(regs.get(Some('*')), Some(lines("a\nb")));
    }
}
