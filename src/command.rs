//! Resolved commands, as produced by the parser and executed by the handler.

use crate::key::KeyEvent;
use crate::motion::Motion;
use crate::textobject::TextObject;
use crate::types::VisualKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    ShiftRight,
    ShiftLeft,
    ToggleCase,
    Lowercase,
    Uppercase,
}

impl Operator {
    pub fn is_mutating(self) -> bool {
        self != Operator::Yank
    }
}

/// What an operator acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Motion(Motion),
    Object(TextObject),
    /// The doubled operator (`dd`, `>>`): `count` whole lines.
    Line,
    /// The visual selection. `linewise` forces whole lines (`D`, `Y`, `R`
    /// in Visual mode).
    Selection { linewise: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    /// `i`
    Before,
    /// `a`
    After,
    /// `I`
    LineStart,
    /// `A`
    LineEnd,
    /// `o`
    OpenBelow,
    /// `O`
    OpenAbove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move(Motion),
    Operate { op: Operator, target: Target },
    /// A text object typed in Visual mode extends the selection.
    SelectObject(TextObject),
    Insert(InsertKind),
    /// `v`, `V` and `<C-v>`.
    EnterVisual(VisualKind),
    EnterReplace,
    /// `r{char}`
    ReplaceChar(char),
    Put { before: bool },
    Join,
    /// `~` in Normal mode.
    ToggleCaseChar,
    Undo,
    Redo,
    /// `.`
    Repeat,
    /// `o` in Visual mode.
    SwapAnchor,
    /// `I`/`A` in Visual mode.
    BlockInsert { append: bool },
    Escape,
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The typed count, if any. Counts typed before and after an operator
    /// are already multiplied.
    pub count: Option<u32>,
    pub register: Option<char>,
    pub action: Action,
}

impl Command {
    pub fn new(action: Action) -> Self {
        Self {
            count: None,
            register: None,
            action,
        }
    }

    pub fn count(&self) -> u32 {
        self.count.unwrap_or(1).max(1)
    }

    /// Commands that change the buffer and are recorded for `.`.
    pub fn is_repeatable(&self) -> bool {
        match &self.action {
            Action::Operate { op, .. } => op.is_mutating(),
            Action::Insert(_)
            | Action::EnterReplace
            | Action::ReplaceChar(_)
            | Action::Put { .. }
            | Action::Join
            | Action::ToggleCaseChar
            | Action::BlockInsert { .. } => true,
            _ => false,
        }
    }
}

/// The partially typed command, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInput {
    pub count: Option<u32>,
    pub register: Option<char>,
    pub operator: Option<Operator>,
    pub awaiting_motion: bool,
    pub keys: Vec<KeyEvent>,
}

impl PendingInput {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
