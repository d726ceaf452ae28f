//! Per-mode key tries.
//!
//! Each mode has one trie keyed by [`KeyEvent`]. Interior nodes are prefixes
//! (`g`, `gu`), leaves say what a complete key sequence means. Counts,
//! registers and the character argument of `f`/`r` are not part of the trie;
//! the parser handles them around it.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::command::{Action, InsertKind, Operator, Target};
use crate::key::{KeyEvent, parse_keys};
use crate::motion::Motion;
use crate::types::VisualKind;

/// Commands that take one more typed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCommand {
    Find { forward: bool, till: bool },
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Motion(Motion),
    Operator(Operator),
    Action(Action),
    /// `i`/`a` before a text object key.
    ObjectPrefix { around: bool },
    AwaitChar(CharCommand),
}

#[derive(Debug, Clone)]
pub enum KeyTrie {
    Leaf(Binding),
    Node(HashMap<KeyEvent, KeyTrie>),
}

impl Default for KeyTrie {
    fn default() -> Self {
        KeyTrie::Node(HashMap::new())
    }
}

impl KeyTrie {
    pub fn search(&self, keys: &[KeyEvent]) -> Option<&KeyTrie> {
        let mut trie = self;
        for key in keys {
            trie = match trie {
                KeyTrie::Node(map) => map.get(key)?,
                KeyTrie::Leaf(_) => return None,
            };
        }
        Some(trie)
    }

    fn insert(&mut self, keys: &[KeyEvent], binding: Binding) {
        let KeyTrie::Node(map) = self else {
            return;
        };
        match keys {
            [] => {}
            [last] => {
                map.insert(*last, KeyTrie::Leaf(binding));
            }
            [first, rest @ ..] => map.entry(*first).or_default().insert(rest, binding),
        }
    }

    fn bind(&mut self, bindings: Vec<(&str, Binding)>) {
        for (keys, binding) in bindings {
            match parse_keys(keys) {
                Ok(parsed) => self.insert(&parsed, binding),
                Err(err) => tracing::error!("invalid key literal {keys:?}: {err}"),
            }
        }
    }
}

#[derive(Debug)]
pub struct Keymaps {
    pub normal: KeyTrie,
    pub visual: KeyTrie,
    /// After an operator in Normal mode.
    pub operator_pending: KeyTrie,
}

pub static KEYMAPS: LazyLock<Keymaps> = LazyLock::new(Keymaps::default);

impl Default for Keymaps {
    fn default() -> Self {
        let mut normal = KeyTrie::default();
        normal.bind(motions());
        normal.bind(operators());
        normal.bind(normal_actions());

        let mut visual = KeyTrie::default();
        visual.bind(motions());
        visual.bind(operators());
        visual.bind(visual_actions());
        visual.bind(object_prefixes());

        let mut operator_pending = KeyTrie::default();
        operator_pending.bind(motions());
        operator_pending.bind(object_prefixes());

        Self {
            normal,
            visual,
            operator_pending,
        }
    }
}

fn motions() -> Vec<(&'static str, Binding)> {
    use Motion::*;
    let find = |forward, till| Binding::AwaitChar(CharCommand::Find { forward, till });
    let m = Binding::Motion;
    vec![
        ("h", m(Left)),
        ("<Left>", m(Left)),
        ("<BS>", m(Left)),
        ("l", m(Right)),
        ("<Right>", m(Right)),
        ("<Space>", m(Right)),
        ("j", m(Down)),
        ("<Down>", m(Down)),
        ("<C-n>", m(Down)),
        ("k", m(Up)),
        ("<Up>", m(Up)),
        ("<C-p>", m(Up)),
        ("0", m(LineStart)),
        ("<Home>", m(LineStart)),
        ("^", m(FirstNonBlank)),
        ("$", m(LineEnd)),
        ("<End>", m(LineEnd)),
        ("g_", m(LastNonBlank)),
        ("|", m(Column)),
        ("+", m(NextLineStart)),
        ("<CR>", m(NextLineStart)),
        ("-", m(PrevLineStart)),
        ("_", m(CurrentLine)),
        ("gg", m(FirstLine)),
        ("G", m(LastLine)),
        ("w", m(WordForward { big: false })),
        ("W", m(WordForward { big: true })),
        ("b", m(WordBackward { big: false })),
        ("B", m(WordBackward { big: true })),
        ("e", m(WordEnd { big: false })),
        ("E", m(WordEnd { big: true })),
        ("ge", m(WordEndBackward { big: false })),
        ("gE", m(WordEndBackward { big: true })),
        ("}", m(ParagraphForward)),
        ("{", m(ParagraphBackward)),
        (")", m(SentenceForward)),
        ("(", m(SentenceBackward)),
        ("f", find(true, false)),
        ("F", find(false, false)),
        ("t", find(true, true)),
        ("T", find(false, true)),
        (";", m(RepeatFind { reverse: false })),
        (",", m(RepeatFind { reverse: true })),
        ("%", m(MatchPair)),
        ("*", m(SearchWord { forward: true })),
        ("#", m(SearchWord { forward: false })),
        ("n", m(RepeatSearch { reverse: false })),
        ("N", m(RepeatSearch { reverse: true })),
    ]
}

fn operators() -> Vec<(&'static str, Binding)> {
    use Operator::*;
    let op = Binding::Operator;
    vec![
        ("d", op(Delete)),
        ("c", op(Change)),
        ("y", op(Yank)),
        (">", op(ShiftRight)),
        ("<lt>", op(ShiftLeft)),
        ("g~", op(ToggleCase)),
        ("gu", op(Lowercase)),
        ("gU", op(Uppercase)),
    ]
}

fn operate(op: Operator, target: Target) -> Binding {
    Binding::Action(Action::Operate { op, target })
}

fn normal_actions() -> Vec<(&'static str, Binding)> {
    use Operator::*;
    let a = Binding::Action;
    let motion = |m| Target::Motion(m);
    vec![
        ("x", operate(Delete, motion(Motion::Right))),
        ("<Del>", operate(Delete, motion(Motion::Right))),
        ("X", operate(Delete, motion(Motion::Left))),
        ("D", operate(Delete, motion(Motion::LineEnd))),
        ("C", operate(Change, motion(Motion::LineEnd))),
        ("s", operate(Change, motion(Motion::Right))),
        ("S", operate(Change, Target::Line)),
        ("Y", operate(Yank, Target::Line)),
        ("p", a(Action::Put { before: false })),
        ("P", a(Action::Put { before: true })),
        ("J", a(Action::Join)),
        ("r", Binding::AwaitChar(CharCommand::Replace)),
        ("~", a(Action::ToggleCaseChar)),
        ("u", a(Action::Undo)),
        ("<C-r>", a(Action::Redo)),
        (".", a(Action::Repeat)),
        ("i", a(Action::Insert(InsertKind::Before))),
        ("a", a(Action::Insert(InsertKind::After))),
        ("I", a(Action::Insert(InsertKind::LineStart))),
        ("A", a(Action::Insert(InsertKind::LineEnd))),
        ("o", a(Action::Insert(InsertKind::OpenBelow))),
        ("O", a(Action::Insert(InsertKind::OpenAbove))),
        ("R", a(Action::EnterReplace)),
        ("v", a(Action::EnterVisual(VisualKind::CharWise))),
        ("V", a(Action::EnterVisual(VisualKind::LineWise))),
        ("<C-v>", a(Action::EnterVisual(VisualKind::Block))),
    ]
}

fn visual_actions() -> Vec<(&'static str, Binding)> {
    use Operator::*;
    let a = Binding::Action;
    let selection = Target::Selection { linewise: false };
    let lines = Target::Selection { linewise: true };
    vec![
        ("x", operate(Delete, selection.clone())),
        ("<Del>", operate(Delete, selection.clone())),
        ("s", operate(Change, selection.clone())),
        ("~", operate(ToggleCase, selection.clone())),
        ("u", operate(Lowercase, selection.clone())),
        ("U", operate(Uppercase, selection)),
        ("D", operate(Delete, lines.clone())),
        ("X", operate(Delete, lines.clone())),
        ("Y", operate(Yank, lines.clone())),
        ("C", operate(Change, lines.clone())),
        ("S", operate(Change, lines.clone())),
        ("R", operate(Change, lines)),
        ("J", a(Action::Join)),
        ("r", Binding::AwaitChar(CharCommand::Replace)),
        ("p", a(Action::Put { before: false })),
        ("P", a(Action::Put { before: true })),
        ("o", a(Action::SwapAnchor)),
        ("O", a(Action::SwapAnchor)),
        ("I", a(Action::BlockInsert { append: false })),
        ("A", a(Action::BlockInsert { append: true })),
        ("v", a(Action::EnterVisual(VisualKind::CharWise))),
        ("V", a(Action::EnterVisual(VisualKind::LineWise))),
        ("<C-v>", a(Action::EnterVisual(VisualKind::Block))),
    ]
}

fn object_prefixes() -> Vec<(&'static str, Binding)> {
    vec![
        ("i", Binding::ObjectPrefix { around: false }),
        ("a", Binding::ObjectPrefix { around: true }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(trie: &'a KeyTrie, keys: &str) -> Option<&'a KeyTrie> {
        trie.search(&parse_keys(keys).unwrap())
    }

    #[test]
    fn prefixes_are_nodes_and_sequences_are_leaves() {
        let maps = &*KEYMAPS;
        assert!(matches!(lookup(&maps.normal, "g"), Some(KeyTrie::Node(_))));
        assert!(matches!(
            lookup(&maps.normal, "gg"),
            Some(KeyTrie::Leaf(Binding::Motion(Motion::FirstLine)))
        ));
        assert!(matches!(
            lookup(&maps.normal, "gu"),
            Some(KeyTrie::Leaf(Binding::Operator(Operator::Lowercase)))
        ));
        assert!(matches!(
            lookup(&maps.normal, "<C-v>"),
            Some(KeyTrie::Leaf(Binding::Action(Action::EnterVisual(VisualKind::Block))))
        ));
        assert!(lookup(&maps.normal, "gq").is_none());
        assert!(lookup(&maps.normal, "ggx").is_none());
    }

    #[test]
    fn object_prefixes_only_outside_normal() {
        let maps = &*KEYMAPS;
        assert!(matches!(
            lookup(&maps.operator_pending, "i"),
            Some(KeyTrie::Leaf(Binding::ObjectPrefix { around: false }))
        ));
        assert!(matches!(
            lookup(&maps.normal, "i"),
            Some(KeyTrie::Leaf(Binding::Action(Action::Insert(InsertKind::Before))))
        ));
        assert!(lookup(&maps.operator_pending, "p").is_none());
    }
}
