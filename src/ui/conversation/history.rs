//! Conversation history display component

use crate::conversation::Message;
use crate::events::Role;
use crate::ui::conversation::markdown::render_markdown;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

/// Message list, or the common questions when nothing has been asked yet
pub struct ConversationHistory<'a> {
    pub messages: &'a [Message],
    pub quick_actions: &'a [String],
    pub selected_quick_action: usize,
    /// Lines scrolled up from the bottom
    pub scroll_back: u16,
    pub tick: u64,
}

impl ConversationHistory<'_> {
    fn quick_action_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                "Common questions:",
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];

        for (index, question) in self.quick_actions.iter().enumerate() {
            let selected = index == self.selected_quick_action;
            let (marker, style) = if selected {
                ("› ", Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD))
            } else {
                ("  ", Style::default().fg(Color::White))
            };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled(format!("{}. {}", index + 1, question), style),
            ]));
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "↑/↓ to choose, Enter to ask, or type your own question.",
            Style::default().fg(Color::DarkGray),
        )));
        lines
    }

    fn message_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in self.messages {
            lines.extend(self.render_message(message));
            lines.push(Line::default());
        }
        lines.pop();
        lines
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message) -> Vec<Line<'static>> {
        let header_style = match message.role {
            Role::User => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            Role::Assistant => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("{} {}", message.role.icon(), message.role.display_name()),
                header_style,
            ),
            Span::styled(
                format!("  {}", message.created_at.with_timezone(&chrono::Local).format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ])];

        if message.is_pending && message.content.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots(self.tick)),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )));
            return lines;
        }

        let mut body = match message.role {
            Role::User => message
                .content
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(Color::White))))
                .collect(),
            Role::Assistant => render_markdown(&message.content, Style::default().fg(Color::Gray)),
        };

        if message.is_pending {
            let cursor = Span::styled("▋", Style::default().fg(Color::Green));
            match body.last_mut() {
                Some(line) => line.spans.push(cursor),
                None => body.push(Line::from(cursor)),
            }
        }

        lines.extend(body);
        lines
    }
}

fn dots(tick: u64) -> &'static str {
    match tick % 4 {
        0 => "",
        1 => ".",
        2 => "..",
        _ => "...",
    }
}

/// Rows `lines` take up once wrapped to `width`
fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum()
}

impl Widget for &ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.messages.is_empty() {
            Paragraph::new(self.quick_action_lines())
                .wrap(Wrap { trim: false })
                .render(area, buf);
            return;
        }

        let lines = self.message_lines();
        let total = wrapped_height(&lines, area.width);
        let bottom = total.saturating_sub(area.height as usize);
        let offset = bottom.saturating_sub(self.scroll_back as usize);

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}
