//! Benchmarks for vim_modal keystroke handling.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use ropey::Rope;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;
use vim_modal::{KeyEvent, ModeHandler, Position, Range, TextBuffer, parse_keys};

/// Rope-based buffer for benchmarking. Undo grouping is left to the trait
/// defaults.
#[derive(Clone)]
struct BenchBuffer {
    rope: Rope,
}

impl BenchBuffer {
    fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    fn char_index(&self, pos: Position) -> usize {
        let text = self.line_text(pos.line);
        let byte = text
            .grapheme_indices(true)
            .nth(pos.col as usize)
            .map_or(text.len(), |(i, _)| i);
        self.rope.line_to_char(pos.line as usize) + text[..byte].chars().count()
    }
}

impl TextBuffer for BenchBuffer {
    fn line_count(&self) -> u32 {
        self.rope.len_lines() as u32
    }

    fn line_text(&self, line: u32) -> String {
        if line as usize >= self.rope.len_lines() {
            return String::new();
        }
        let mut s = self.rope.line(line as usize).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        s
    }

    fn replace_range(&mut self, range: Range, text: &str) {
        let start = self.char_index(range.start);
        let end = self.char_index(range.end);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
    }
}

fn generate_sample_text(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        text.push_str(&format!(
            "This is line {} with some sample text for benchmarking vim operations.\n",
            i + 1
        ));
        if i % 10 == 0 {
            text.push('\n');
        }
    }
    text
}

fn keys(names: &str) -> Vec<KeyEvent> {
    parse_keys(names).unwrap()
}

fn feed(vim: &mut ModeHandler, buf: &mut BenchBuffer, keys: &[KeyEvent]) {
    for key in keys {
        black_box(vim.handle_key(buf, black_box(*key)));
    }
}

fn benchmark_simple_movements(c: &mut Criterion) {
    let mut buffer = BenchBuffer::new(&generate_sample_text(1000));
    let mut vim = ModeHandler::new();
    let movements = keys("jjllhk");

    c.bench_function("simple movements (hjkl)", |b| {
        b.iter(|| feed(&mut vim, &mut buffer, &movements));
    });
}

fn benchmark_word_movements(c: &mut Criterion) {
    let mut buffer = BenchBuffer::new(&generate_sample_text(1000));
    let mut vim = ModeHandler::new();
    let movements = keys("wwwbwe");

    c.bench_function("word movements (w/b/e)", |b| {
        b.iter(|| feed(&mut vim, &mut buffer, &movements));
    });
}

fn benchmark_delete_operations(c: &mut Criterion) {
    let text = generate_sample_text(1000);
    let sequence = keys("dwdd");

    c.bench_function("delete operations (dw, dd)", |b| {
        b.iter_batched(
            || {
                let vim = ModeHandler::builder().cursor(Position::new(50, 10)).build();
                (vim, BenchBuffer::new(&text))
            },
            |(mut vim, mut buffer)| feed(&mut vim, &mut buffer, &sequence),
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_visual_selection(c: &mut Criterion) {
    let mut buffer = BenchBuffer::new(&generate_sample_text(1000));
    let mut vim = ModeHandler::builder().cursor(Position::new(50, 10)).build();
    let sequence = keys("vwwwwwiw<Esc>");

    c.bench_function("visual selection", |b| {
        b.iter(|| feed(&mut vim, &mut buffer, &sequence));
    });
}

fn benchmark_search_operations(c: &mut Criterion) {
    let mut buffer = BenchBuffer::new(&generate_sample_text(1000));
    let mut vim = ModeHandler::new();
    let sequence = keys("*nnN#fs;,");

    c.bench_function("search operations", |b| {
        b.iter(|| feed(&mut vim, &mut buffer, &sequence));
    });
}

fn benchmark_multi_cursor_edit(c: &mut Criterion) {
    let text = generate_sample_text(1000);
    let sequence = keys("ciwword<Esc>j.");

    c.bench_function("multi-cursor change (100 cursors)", |b| {
        b.iter_batched(
            || {
                let mut vim = ModeHandler::new();
                vim.set_cursors((0..100).map(|line| Position::new(line * 5, 8)));
                (vim, BenchBuffer::new(&text))
            },
            |(mut vim, mut buffer)| feed(&mut vim, &mut buffer, &sequence),
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_complex_sequence(c: &mut Criterion) {
    let text = generate_sample_text(1000);
    let sequence = keys("5jwwdwihello world<Esc>yyp>>u");

    c.bench_function("complex keystroke sequence", |b| {
        b.iter_batched(
            || (ModeHandler::new(), BenchBuffer::new(&text)),
            |(mut vim, mut buffer)| feed(&mut vim, &mut buffer, &sequence),
            BatchSize::SmallInput,
        );
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = benchmark_simple_movements,
              benchmark_word_movements,
              benchmark_delete_operations,
              benchmark_visual_selection,
              benchmark_search_operations,
              benchmark_multi_cursor_edit,
              benchmark_complex_sequence
}
criterion_main!(benches);
