use crate::events::ResponseMode;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// One-line status bar under the panel header
#[derive(Debug, Clone, Copy)]
pub struct StatusBar {
    pub busy: bool,
    pub has_messages: bool,
    pub mode: ResponseMode,
    pub tick: u64,
}

impl StatusBar {
    fn indicator(&self) -> Line<'static> {
        if self.busy {
            let pulse = if self.tick % 2 == 0 { "●" } else { "○" };
            let dots = match self.tick % 4 {
                0 => "   ",
                1 => ".  ",
                2 => ".. ",
                _ => "...",
            };
            Line::from(vec![
                Span::styled(format!("{pulse} "), Style::default().fg(Color::Yellow)),
                Span::styled("Thinking", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(dots, Style::default().fg(Color::Yellow)),
            ])
        } else {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Green)),
                Span::styled("Ready", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  ({} answers)", self.mode),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
    }
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        buf.set_line(area.x, area.y, &self.indicator(), area.width);

        if self.has_messages {
            let hint = Line::from(Span::styled(
                "Ctrl+L clear chat",
                Style::default().fg(Color::Gray),
            ));
            let width = hint.width() as u16;
            if width < area.width {
                buf.set_line(area.x + area.width - width, area.y, &hint, width);
            }
        }
    }
}
