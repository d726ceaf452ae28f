use vim_modal::{KeyOutcome, Mode, RegisterKind, RegisterValue, VisualKind};

mod support;
use support::{Session, pos};

#[test]
fn test_inner_and_around_word() {
    let mut s = Session::new("foo bar baz");
    s.keys("wdiw");
    assert_eq!(s.text(), "foo  baz");
    assert_eq!(s.cursor(), pos(0, 4));

    let mut s = Session::new("foo bar baz");
    s.keys("wdaw");
    assert_eq!(s.text(), "foo baz");

    let mut s = Session::new("foo bar baz");
    s.keys("$daw");
    assert_eq!(s.text(), "foo bar");
    assert_eq!(s.cursor(), pos(0, 6));
}

#[test]
fn test_word_object_on_empty_line_is_a_no_op() {
    let mut s = Session::new("a\n\nb");
    s.keys("j");
    assert_eq!(s.keys("diw"), KeyOutcome::Handled);
    assert_eq!(s.lines(), vec!["a", "", "b"]);
}

#[test]
fn test_change_inside_parens() {
    let mut s = Session::new("f(a, b)");
    s.keys("3lci(x<Esc>");
    assert_eq!(s.text(), "f(x)");
    assert_eq!(s.mode(), Mode::Normal);
}

#[test]
fn test_bracket_count_selects_outer_pair() {
    let mut s = Session::new("f(a, (b), c)");
    s.keys("6ld2a(");
    assert_eq!(s.text(), "f");

    let mut s = Session::new("[x]");
    s.keys("ldib");
    assert_eq!(s.text(), "[x]");
    s.keys("di[");
    assert_eq!(s.text(), "[]");
}

#[test]
fn test_quote_objects() {
    let mut s = Session::new("say \"hi\" now");
    s.keys("di\"");
    assert_eq!(s.text(), "say \"\" now");

    let mut s = Session::new("say \"hi\" now");
    s.keys("da\"");
    assert_eq!(s.text(), "say now");
}

#[test]
fn test_paragraph_objects() {
    let mut s = Session::new("a\nb\n\nc");
    s.keys("dip");
    assert_eq!(s.lines(), vec!["", "c"]);

    let mut s = Session::new("a\nb\n\nc");
    s.keys("dap");
    assert_eq!(s.lines(), vec!["c"]);
}

#[test]
fn test_around_objects_with_huge_count() {
    let mut s = Session::new("foo bar baz");
    s.keys("d4294967295aw");
    assert_eq!(s.text(), "");

    let mut s = Session::new("a\n\nb");
    s.keys("d4294967295ap");
    assert_eq!(s.lines(), vec![""]);
    assert_eq!(s.mode(), Mode::Normal);
}

#[test]
fn test_sentence_object() {
    let mut s = Session::new("One two.  Three four. Five");
    s.keys("12ldis");
    assert_eq!(s.text(), "One two.   Five");
}

#[test]
fn test_block_on_own_lines_is_linewise() {
    let mut s = Session::new("fn f() {\n    body\n}");
    s.keys("jyi{");
    assert_eq!(
        s.vim.registers_mut().get(None),
        Some(RegisterValue::single("    body", RegisterKind::Linewise))
    );

    s.keys("ci{x<Esc>");
    assert_eq!(s.lines(), vec!["fn f() {", "    x", "}"]);
}

#[test]
fn test_visual_paragraph_switches_to_linewise() {
    let mut s = Session::new("a\nb\n\nc");
    s.keys("vip");
    assert_eq!(s.mode(), Mode::Visual(VisualKind::LineWise));
    s.keys("d");
    assert_eq!(s.lines(), vec!["", "c"]);
}
