//! Conversion of formatted reply markup into styled terminal lines.
//!
//! Assistant bodies carry the small tag vocabulary produced by
//! [`crate::core::format`]: `<br>`, `<strong>`, `<em>` and
//! `<a href="…" target="_blank">`. Anything else, including stray `<`
//! characters, is shown verbatim. Link targets are appended in parentheses
//! after the link text when the two differ.

use std::sync::LazyLock;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<br>|<strong>|</strong>|<em>|</em>|<a href="([^"]*)" target="_blank">|</a>"#)
        .expect("valid tag pattern")
});

#[derive(Debug, Clone, Copy)]
pub struct MarkupStyles {
    pub base: Style,
    pub link: Style,
    pub link_target: Style,
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.current.push(Span::styled(text.to_string(), style));
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

pub fn markup_to_lines(markup: &str, styles: &MarkupStyles) -> Vec<Line<'static>> {
    let mut out = LineBuilder::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    // (href, visible text so far)
    let mut link: Option<(String, String)> = None;

    let style_for = |bold: usize, italic: usize, in_link: bool| {
        let mut style = if in_link { styles.link } else { styles.base };
        if bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    };

    let mut last = 0;
    for caps in TAG.captures_iter(markup) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let text = &markup[last..tag.start()];
        out.push(text, style_for(bold, italic, link.is_some()));
        if let Some((_, visible)) = link.as_mut() {
            visible.push_str(text);
        }
        last = tag.end();

        match tag.as_str() {
            "<br>" => out.break_line(),
            "<strong>" => bold += 1,
            "</strong>" => bold = bold.saturating_sub(1),
            "<em>" => italic += 1,
            "</em>" => italic = italic.saturating_sub(1),
            "</a>" => {
                if let Some((href, visible)) = link.take() {
                    if href != visible {
                        out.push(&format!(" ({href})"), styles.link_target);
                    }
                }
            }
            _ => {
                let href = caps.get(1).map_or("", |m| m.as_str());
                link = Some((href.to_string(), String::new()));
            }
        }
    }
    out.push(&markup[last..], style_for(bold, italic, link.is_some()));
    out.finish()
}

/// User text is shown as typed; only newlines split lines.
pub fn plain_to_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn styles() -> MarkupStyles {
        MarkupStyles {
            base: Style::default().fg(Color::White),
            link: Style::default().fg(Color::Blue),
            link_target: Style::default().fg(Color::DarkGray),
        }
    }

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn line_breaks_split_lines() {
        let lines = markup_to_lines("one<br>two<br><br>three", &styles());
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["one", "two", "", "three"]);
    }

    #[test]
    fn emphasis_tags_become_modifiers() {
        let lines = markup_to_lines("a <strong>b <em>c</em></strong> d", &styles());
        let spans = &lines[0].spans;

        assert_eq!(spans[0].content, "a ");
        assert!(!spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[1].content, "b ");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[2].content, "c");
        assert!(spans[2]
            .style
            .add_modifier
            .contains(Modifier::BOLD | Modifier::ITALIC));
        assert_eq!(spans[3].content, " d");
        assert!(spans[3].style.add_modifier.is_empty());
    }

    #[test]
    fn links_show_target_when_it_differs() {
        let markup = r#"see <a href="https://example.com" target="_blank">docs</a>."#;
        let lines = markup_to_lines(markup, &styles());
        assert_eq!(text_of(&lines[0]), "see docs (https://example.com).");
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::Blue));

        let bare = r#"<a href="https://x.io" target="_blank">https://x.io</a>"#;
        assert_eq!(text_of(&markup_to_lines(bare, &styles())[0]), "https://x.io");
    }

    #[test]
    fn unknown_angle_brackets_pass_through() {
        let lines = markup_to_lines("1 < 2 <b>x</b>", &styles());
        assert_eq!(text_of(&lines[0]), "1 < 2 <b>x</b>");
    }

    #[test]
    fn plain_text_keeps_markers() {
        let lines = plain_to_lines("**not bold**\nnext", Style::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "**not bold**");
    }
}
