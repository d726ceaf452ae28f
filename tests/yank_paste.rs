use vim_modal::{ModeHandler, RegisterKind, RegisterValue};

mod support;
use support::mock_clipboard::MockClipboard;
use support::{Session, pos};

fn chars(text: &str) -> Option<RegisterValue> {
    Some(RegisterValue::single(text, RegisterKind::Charwise))
}

fn lines(text: &str) -> Option<RegisterValue> {
    Some(RegisterValue::single(text, RegisterKind::Linewise))
}

#[test]
fn test_yy_p_puts_line_below() {
    let mut s = Session::new("a\nb");
    s.keys("yyp");
    assert_eq!(s.lines(), vec!["a", "a", "b"]);
    assert_eq!(s.cursor(), pos(1, 0));
}

#[test]
fn test_yy_p_on_last_line() {
    let mut s = Session::new("a\nb");
    s.keys("jyyp");
    assert_eq!(s.lines(), vec!["a", "b", "b"]);
    assert_eq!(s.cursor(), pos(2, 0));
}

#[test]
fn test_yy_capital_p_puts_line_above() {
    let mut s = Session::new("a\n  b");
    s.keys("jyykP");
    assert_eq!(s.lines(), vec!["  b", "a", "  b"]);
    assert_eq!(s.cursor(), pos(0, 2));
}

#[test]
fn test_yw_capital_p_puts_before_cursor() {
    let mut s = Session::new("hello world");
    s.keys("ywP");
    assert_eq!(s.text(), "hello hello world");
    assert_eq!(s.cursor(), pos(0, 5));
}

#[test]
fn test_put_with_count() {
    let mut s = Session::new("ab");
    s.keys("yl3p");
    assert_eq!(s.text(), "aaaab");
    assert_eq!(s.cursor(), pos(0, 3));
}

#[test]
fn test_yank_keeps_cursor_in_line() {
    let mut s = Session::new("abc def\nxyz");
    s.keys("wyy");
    assert_eq!(s.cursor(), pos(0, 4));
    s.keys("yb");
    assert_eq!(s.cursor(), pos(0, 0));
    assert_eq!(s.vim.registers_mut().get(None), chars("abc "));
}

#[test]
fn test_named_register_append() {
    let mut s = Session::new("a\nb");
    s.keys("\"ayyj\"Ayy\"ap");
    assert_eq!(s.lines(), vec!["a", "b", "a", "b"]);
    assert_eq!(s.vim.registers_mut().get(Some('a')), lines("a\nb"));
}

#[test]
fn test_line_deletes_shift_numbered_registers() {
    let mut s = Session::new("a\nb\nc");
    s.keys("dddd");
    assert_eq!(s.lines(), vec!["c"]);
    let registers = s.vim.registers_mut();
    assert_eq!(registers.get(Some('1')), lines("b"));
    assert_eq!(registers.get(Some('2')), lines("a"));
    assert_eq!(registers.get(None), lines("b"));
}

#[test]
fn test_small_delete_register() {
    let mut s = Session::new("abc");
    s.keys("x");
    assert_eq!(s.vim.registers_mut().get(Some('-')), chars("a"));
    assert_eq!(s.vim.registers_mut().get(Some('1')), None);
    s.keys("p");
    assert_eq!(s.text(), "bac");
}

#[test]
fn test_yank_register_survives_delete() {
    let mut s = Session::new("foo bar");
    s.keys("yiwwdiw\"0p");
    assert_eq!(s.text(), "foo foo");
}

#[test]
fn test_black_hole_register() {
    let mut s = Session::new("a\nb");
    s.keys("yyj\"_dd");
    assert_eq!(s.lines(), vec!["a"]);
    assert_eq!(s.vim.registers_mut().get(None), lines("a"));
}

#[test]
fn test_clipboard_register() {
    let clipboard = MockClipboard::new();
    let vim = ModeHandler::builder()
        .clipboard(Box::new(clipboard.clone()))
        .build();
    let mut s = Session::with_handler("line\nnext", vim);
    s.keys("\"+yy");
    assert_eq!(clipboard.contents().as_deref(), Some("line\n"));

    s.keys("j\"+p");
    assert_eq!(s.lines(), vec!["line", "next", "line"]);
}

#[test]
fn test_last_insert_register() {
    let mut s = Session::new("");
    s.keys("ifoo<Esc>");
    assert_eq!(s.vim.registers_mut().get(Some('.')), chars("foo"));
    s.keys("\".p");
    assert_eq!(s.text(), "foofoo");
}

#[test]
fn test_visual_put_swaps_text() {
    let mut s = Session::new("foo bar");
    s.keys("yiwwviwp");
    assert_eq!(s.text(), "foo foo");
    assert_eq!(s.vim.registers_mut().get(None), chars("bar"));
    assert_eq!(s.cursor(), pos(0, 6));
}

#[test]
fn test_block_yank_and_put() {
    let mut s = Session::new("ab\ncd\nef");
    s.keys("<C-v>jy");
    assert_eq!(
        s.vim.registers_mut().get(None),
        Some(RegisterValue::single("a\nc", RegisterKind::Blockwise))
    );
    s.keys("$p");
    assert_eq!(s.lines(), vec!["aba", "cdc", "ef"]);
    assert_eq!(s.cursor(), pos(0, 2));
}

#[test]
fn test_put_from_empty_register_does_nothing() {
    let mut s = Session::new("abc");
    s.keys("\"qp");
    assert_eq!(s.text(), "abc");
}
