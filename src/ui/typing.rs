//! Animated "thinking" indicator shown while a reply has no text yet.

use std::time::{Duration, Instant};

use ratatui::style::Style;
use ratatui::text::{Line, Span};

pub const THINKING: &str = "thinking";
const CURSOR: &str = "▌";
const DOT_STEP: Duration = Duration::from_millis(200);
const DOT_FRAMES: [&str; 4] = ["   ", "•  ", "•• ", "•••"];

/// Pure function of elapsed time, so the renderer stays stateless.
#[derive(Debug, Clone, Copy)]
pub struct TypingIndicator {
    blink: Duration,
}

impl TypingIndicator {
    pub fn new(blink: Duration) -> Self {
        Self { blink }
    }

    /// The cursor starts visible and flips every blink interval.
    pub fn cursor_visible(&self, started: Instant, now: Instant) -> bool {
        let blink = self.blink.as_millis();
        if blink == 0 {
            return true;
        }
        let elapsed = now.saturating_duration_since(started).as_millis();
        (elapsed / blink) % 2 == 0
    }

    pub fn dots(&self, started: Instant, now: Instant) -> &'static str {
        let elapsed = now.saturating_duration_since(started).as_millis();
        let frame = (elapsed / DOT_STEP.as_millis()) as usize % DOT_FRAMES.len();
        DOT_FRAMES[frame]
    }

    pub fn line(&self, started: Instant, now: Instant, style: Style) -> Line<'static> {
        let cursor = if self.cursor_visible(started, now) {
            CURSOR
        } else {
            " "
        };
        Line::from(vec![
            Span::styled(self.dots(started, now), style),
            Span::styled(" ", style),
            Span::styled(THINKING, style),
            Span::styled(cursor, style),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_blinks_every_interval() {
        let indicator = TypingIndicator::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(indicator.cursor_visible(start, start));
        assert!(indicator.cursor_visible(start, start + Duration::from_millis(499)));
        assert!(!indicator.cursor_visible(start, start + Duration::from_millis(500)));
        assert!(indicator.cursor_visible(start, start + Duration::from_millis(1_000)));
    }

    #[test]
    fn zero_interval_keeps_cursor_on() {
        let indicator = TypingIndicator::new(Duration::ZERO);
        let start = Instant::now();
        assert!(indicator.cursor_visible(start, start + Duration::from_millis(750)));
    }

    #[test]
    fn line_reads_thinking() {
        let indicator = TypingIndicator::new(Duration::from_millis(500));
        let start = Instant::now();
        let line = indicator.line(start, start + Duration::from_millis(650), Style::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "••• thinking ");
    }
}
