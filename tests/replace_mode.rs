use vim_modal::Mode;

mod support;
use support::{Session, pos};

#[test]
fn test_replace_overwrites_in_place() {
    let mut s = Session::new("abcd");
    s.keys("R");
    assert_eq!(s.mode(), Mode::Replace);
    s.keys("12<Esc>");
    assert_eq!(s.text(), "12cd");
    assert_eq!(s.cursor(), pos(0, 1));
    assert_eq!(s.mode(), Mode::Normal);
}

#[test]
fn test_replace_appends_past_end_of_line() {
    let mut s = Session::new("ab\ncd");
    s.keys("lRxyz<Esc>");
    assert_eq!(s.lines(), vec!["axyz", "cd"]);
    assert_eq!(s.cursor(), pos(0, 3));
}

#[test]
fn test_replace_backspace_restores_overwritten_text() {
    let mut s = Session::new("abcd");
    s.keys("Rxy");
    assert_eq!(s.text(), "xycd");
    s.keys("<BS><BS>");
    assert_eq!(s.text(), "abcd");
    assert_eq!(s.cursor(), pos(0, 0));
    s.keys("<Esc>");
    assert_eq!(s.text(), "abcd");

    let mut s = Session::new("ab");
    s.keys("lRxyz<BS><BS>");
    assert_eq!(s.text(), "ax");
    s.keys("<BS>");
    assert_eq!(s.text(), "ab");
}

#[test]
fn test_replace_backspace_over_untyped_text_only_moves() {
    let mut s = Session::new("ab");
    s.keys("$R<BS>");
    assert_eq!(s.text(), "ab");
    assert_eq!(s.cursor(), pos(0, 0));
}

#[test]
fn test_replace_with_cursors_on_lines_of_different_length() {
    let mut s = Session::new("abcd\nx");
    s.vim.set_cursors([pos(0, 0), pos(1, 0)]);
    s.keys("R123<Esc>");
    assert_eq!(s.lines(), vec!["123d", "123"]);
    assert_eq!(s.cursors(), vec![pos(0, 2), pos(1, 2)]);

    s.keys("u");
    assert_eq!(s.lines(), vec!["abcd", "x"]);
}

#[test]
fn test_counted_replace_repeats_typed_text() {
    let mut s = Session::new("xxxxxxxx");
    s.keys("3Rab<Esc>");
    assert_eq!(s.text(), "abababxx");
    assert_eq!(s.cursor(), pos(0, 5));

    let mut s = Session::new("xy");
    s.keys("3Rab<Esc>");
    assert_eq!(s.text(), "ababab");
}

#[test]
fn test_replace_session_is_one_undo_step() {
    let mut s = Session::new("abcd");
    s.keys("Rxyz<Esc>");
    assert_eq!(s.buf.undo_steps(), 1);
    s.keys("u");
    assert_eq!(s.text(), "abcd");
}
