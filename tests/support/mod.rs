#![allow(dead_code)]

pub mod mock_buffer;
pub mod mock_clipboard;

use mock_buffer::MockBuffer;
use vim_modal::{Config, KeyOutcome, Mode, ModeHandler, Position};

/// A buffer and a handler driven together by key strings.
pub struct Session {
    pub buf: MockBuffer,
    pub vim: ModeHandler,
}

impl Session {
    pub fn new(text: &str) -> Self {
        Self::with_handler(text, ModeHandler::new())
    }

    pub fn with_config(text: &str, config: Config) -> Self {
        Self::with_handler(text, ModeHandler::builder().config(config).build())
    }

    pub fn with_handler(text: &str, vim: ModeHandler) -> Self {
        Self {
            buf: MockBuffer::new(text),
            vim,
        }
    }

    pub fn keys(&mut self, keys: &str) -> KeyOutcome {
        self.vim
            .handle_key_names(&mut self.buf, keys)
            .unwrap_or_else(|err| panic!("bad key string {keys:?}: {err}"))
    }

    pub fn text(&self) -> String {
        vim_modal::TextBuffer::text(&self.buf)
    }

    pub fn lines(&self) -> Vec<String> {
        self.buf.lines()
    }

    pub fn cursor(&self) -> Position {
        self.vim.cursor()
    }

    pub fn cursors(&self) -> Vec<Position> {
        self.vim.cursors().positions()
    }

    pub fn mode(&self) -> Mode {
        self.vim.mode()
    }

    pub fn set_cursor(&mut self, line: u32, col: u32) {
        self.vim.set_cursors([Position::new(line, col)]);
    }
}

pub fn pos(line: u32, col: u32) -> Position {
    Position::new(line, col)
}
