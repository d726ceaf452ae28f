pub mod command;
pub mod config;
pub mod cursor;
pub mod edit;
pub mod handler;
pub mod indent;
mod insert;
pub mod key;
pub mod keymap;
pub mod motion;
mod operator;
pub mod parser;
pub mod registers;
pub mod text;
pub mod textobject;
pub mod traits;
pub mod types;

pub use crate::command::{Action, Command, InsertKind, Operator, PendingInput, Target};
pub use crate::config::{Config, ConfigError};
pub use crate::cursor::{Cursor, CursorSet};
pub use crate::edit::{Applied, AppliedEdit, Edit, EditError, apply_edits};
pub use crate::handler::{HandlerSnapshot, KeyOutcome, ModeHandler, ModeHandlerBuilder};
pub use crate::key::{KeyCode, KeyError, KeyEvent, Modifiers, parse_keys};
pub use crate::motion::{Motion, MotionKind, MotionSpan};
pub use crate::parser::{CommandParser, ParseError};
pub use crate::registers::{RegisterKind, RegisterValue, Registers};
pub use crate::textobject::{ObjectRange, TextObject};
#[cfg(feature = "clipboard")]
pub use crate::traits::SystemClipboard;
pub use crate::traits::{Clipboard, TextBuffer};
pub use crate::types::{Mode, Position, Range, Selection, VisualKind};
