//! Key-sequence parser.
//!
//! [`CommandParser::feed`] takes one key at a time and either completes a
//! [`Command`], asks for more keys, or rejects the sequence. Counts typed
//! before and after an operator multiply.

use thiserror::Error;

use crate::command::{Action, Command, Operator, PendingInput, Target};
use crate::key::{KeyCode, KeyEvent, Modifiers};
use crate::keymap::{Binding, CharCommand, KEYMAPS, KeyTrie};
use crate::motion::Motion;
use crate::registers;
use crate::textobject::TextObject;
use crate::types::Mode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid key sequence '{0}'")]
    InvalidSequence(String),
}

/// Largest count the parser keeps; longer digit runs clamp to it.
pub const MAX_COUNT: u32 = 999_999_999;

/// Waiting for a single key that is not looked up in the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Char(CharCommand),
    Object { around: bool },
    Register,
}

#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    /// Digits of the count currently being typed.
    count: Option<u32>,
    /// Count typed before the operator.
    op_count: Option<u32>,
    register: Option<char>,
    /// Pending operator and the keys that produced it, for doubling.
    operator: Option<(Operator, Vec<KeyEvent>)>,
    awaiting: Option<Awaiting>,
    /// Keys of the trie lookup in progress.
    seq: Vec<KeyEvent>,
    /// Every key of the command so far.
    keys: Vec<KeyEvent>,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_pending(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn pending(&self) -> PendingInput {
        PendingInput {
            count: self.total_count(),
            register: self.register,
            operator: self.operator.as_ref().map(|(op, _)| *op),
            awaiting_motion: self.operator.is_some(),
            keys: self.keys.clone(),
        }
    }

    /// Feeds one key typed in `mode`.
    ///
    /// Returns `Ok(None)` while the command is incomplete. Escape always
    /// completes with [`Action::Escape`] and drops pending input.
    pub fn feed(&mut self, key: KeyEvent, mode: Mode) -> Result<Option<Command>, ParseError> {
        let key = normalize(key);
        if key.is_esc() {
            self.reset();
            return Ok(Some(Command::new(Action::Escape)));
        }
        if mode.is_text_entry() {
            return Err(self.invalid_with(key));
        }
        self.keys.push(key);

        if let Some(awaiting) = self.awaiting.take() {
            return self.complete_awaiting(awaiting, key, mode);
        }

        if self.seq.is_empty() {
            if let Some(digit) = key.as_digit()
                && (digit != 0 || self.count.is_some())
            {
                let count = self.count.unwrap_or(0).saturating_mul(10).saturating_add(digit);
                self.count = Some(count.min(MAX_COUNT));
                return Ok(None);
            }
            if key.as_char() == Some('"') && self.operator.is_none() {
                self.op_count = self.total_count();
                self.count = None;
                self.awaiting = Some(Awaiting::Register);
                return Ok(None);
            }
        }

        self.seq.push(key);
        if let Some((op, op_keys)) = &self.operator
            && is_doubled(&self.seq, op_keys)
        {
            let op = *op;
            return Ok(Some(self.finish(Action::Operate {
                op,
                target: Target::Line,
            })));
        }

        let trie = match (mode, &self.operator) {
            (Mode::Visual(_), _) => &KEYMAPS.visual,
            (_, Some(_)) => &KEYMAPS.operator_pending,
            _ => &KEYMAPS.normal,
        };
        match trie.search(&self.seq) {
            Some(KeyTrie::Node(_)) => Ok(None),
            Some(KeyTrie::Leaf(binding)) => {
                let binding = binding.clone();
                self.complete(binding, mode)
            }
            None => Err(self.invalid()),
        }
    }

    fn complete(&mut self, binding: Binding, mode: Mode) -> Result<Option<Command>, ParseError> {
        match binding {
            Binding::Motion(motion) => Ok(Some(self.finish_motion(motion))),
            Binding::Operator(op) => {
                if mode.is_visual() {
                    return Ok(Some(self.finish(Action::Operate {
                        op,
                        target: Target::Selection { linewise: false },
                    })));
                }
                if self.operator.is_some() {
                    return Err(self.invalid());
                }
                self.op_count = self.total_count();
                self.count = None;
                self.operator = Some((op, std::mem::take(&mut self.seq)));
                Ok(None)
            }
            Binding::Action(action) => {
                if self.operator.is_some() {
                    return Err(self.invalid());
                }
                Ok(Some(self.finish(action)))
            }
            Binding::ObjectPrefix { around } => {
                self.awaiting = Some(Awaiting::Object { around });
                Ok(None)
            }
            Binding::AwaitChar(command) => {
                self.awaiting = Some(Awaiting::Char(command));
                Ok(None)
            }
        }
    }

    fn complete_awaiting(
        &mut self,
        awaiting: Awaiting,
        key: KeyEvent,
        mode: Mode,
    ) -> Result<Option<Command>, ParseError> {
        let ch = match key.code {
            KeyCode::Tab => Some('\t'),
            _ => key.as_char(),
        };
        let Some(ch) = ch else {
            return Err(self.invalid());
        };

        match awaiting {
            Awaiting::Register => {
                if !registers::is_valid_name(ch) {
                    return Err(self.invalid());
                }
                self.register = Some(ch);
                Ok(None)
            }
            Awaiting::Char(CharCommand::Find { forward, till }) => {
                Ok(Some(self.finish_motion(Motion::FindChar { ch, forward, till })))
            }
            Awaiting::Char(CharCommand::Replace) => {
                if self.operator.is_some() {
                    return Err(self.invalid());
                }
                Ok(Some(self.finish(Action::ReplaceChar(ch))))
            }
            Awaiting::Object { around } => {
                let Some(object) = object_for_key(ch, around) else {
                    return Err(self.invalid());
                };
                if let Some((op, _)) = &self.operator {
                    let op = *op;
                    return Ok(Some(self.finish(Action::Operate {
                        op,
                        target: Target::Object(object),
                    })));
                }
                if mode.is_visual() {
                    return Ok(Some(self.finish(Action::SelectObject(object))));
                }
                Err(self.invalid())
            }
        }
    }

    fn finish_motion(&mut self, motion: Motion) -> Command {
        let action = match &self.operator {
            Some((op, _)) => Action::Operate {
                op: *op,
                target: Target::Motion(motion),
            },
            None => Action::Move(motion),
        };
        self.finish(action)
    }

    fn total_count(&self) -> Option<u32> {
        match (self.op_count, self.count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1)).min(MAX_COUNT)),
        }
    }

    fn finish(&mut self, action: Action) -> Command {
        let command = Command {
            count: self.total_count(),
            register: self.register,
            action,
        };
        self.reset();
        command
    }

    fn invalid(&mut self) -> ParseError {
        let keys: String = self.keys.iter().map(ToString::to_string).collect();
        tracing::trace!(keys = %keys, "discarding invalid key sequence");
        self.reset();
        ParseError::InvalidSequence(keys)
    }

    fn invalid_with(&mut self, key: KeyEvent) -> ParseError {
        self.keys.push(key);
        self.invalid()
    }
}

/// Shifted characters arrive as the character itself; a SHIFT flag on a
/// character key carries no extra meaning.
fn normalize(key: KeyEvent) -> KeyEvent {
    match key.code {
        KeyCode::Char(_) => KeyEvent::new(key.code, key.mods - Modifiers::SHIFT),
        _ => key,
    }
}

/// `dd`, `>>`, `g~~`, `g~g~`, `guu`, `gUU`.
fn is_doubled(seq: &[KeyEvent], op_keys: &[KeyEvent]) -> bool {
    seq == op_keys || (op_keys.len() > 1 && seq.len() == 1 && op_keys.last() == seq.first())
}

fn object_for_key(key: char, around: bool) -> Option<TextObject> {
    let object = match key {
        'w' => TextObject::Word { big: false, around },
        'W' => TextObject::Word { big: true, around },
        's' => TextObject::Sentence { around },
        'p' => TextObject::Paragraph { around },
        '"' | '\'' | '`' => TextObject::Quote { quote: key, around },
        _ => return TextObject::bracket(key, around),
    };
    Some(object)
}
