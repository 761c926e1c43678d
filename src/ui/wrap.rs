//! Width-aware word wrapping of styled lines.
//!
//! Lines are wrapped before rendering so that the line count used for
//! scrolling always matches what is drawn.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

type Cell = (char, Style);

struct Wrapper {
    width: usize,
    out: Vec<Line<'static>>,
    current: Vec<Cell>,
    current_width: usize,
    word: Vec<Cell>,
    word_width: usize,
}

impl Wrapper {
    fn emit(&mut self) {
        while self.current.last().is_some_and(|(ch, _)| *ch == ' ') {
            self.current.pop();
        }
        self.out.push(cells_to_line(&std::mem::take(&mut self.current)));
        self.current_width = 0;
    }

    fn push_cell(&mut self, cell: Cell, cell_width: usize) {
        if self.current_width > 0 && self.current_width + cell_width > self.width {
            self.emit();
        }
        self.current.push(cell);
        self.current_width += cell_width;
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        if self.current_width > 0 && self.current_width + self.word_width > self.width {
            self.emit();
        }
        // Overlong words are broken wherever the line fills up
        for cell in std::mem::take(&mut self.word) {
            let w = char_width(cell.0);
            self.push_cell(cell, w);
        }
        self.word_width = 0;
    }

    fn space(&mut self, style: Style) {
        self.flush_word();
        if self.current_width < self.width {
            self.current.push((' ', style));
            self.current_width += 1;
        } else {
            // The space that causes a wrap is dropped
            self.emit();
        }
    }
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

fn cells_to_line(cells: &[Cell]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;
    for &(ch, style) in cells {
        if run_style.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
        }
        run_style = Some(style);
        run.push(ch);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

pub fn prewrap_lines(lines: &[Line<'_>], width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width);
    if width == 0 {
        return lines
            .iter()
            .map(|line| {
                Line::from(
                    line.spans
                        .iter()
                        .map(|s| Span::styled(s.content.to_string(), s.style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
    }

    let mut wrapper = Wrapper {
        width,
        out: Vec::with_capacity(lines.len()),
        current: Vec::new(),
        current_width: 0,
        word: Vec::new(),
        word_width: 0,
    };

    for line in lines {
        let before = wrapper.out.len();
        for span in &line.spans {
            for ch in span.content.chars() {
                if ch == ' ' {
                    wrapper.space(span.style);
                } else {
                    wrapper.word.push((ch, span.style));
                    wrapper.word_width += char_width(ch);
                }
            }
        }
        wrapper.flush_word();
        if !wrapper.current.is_empty() || wrapper.out.len() == before {
            wrapper.emit();
        }
    }

    wrapper.out
}
