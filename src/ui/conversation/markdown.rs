//! Markdown answers to styled terminal lines.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render `text` as markdown using `base` for plain prose
pub fn render_markdown(text: &str, base: Style) -> Vec<Line<'static>> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
    let mut renderer = MarkdownRenderer::new(base);
    for event in Parser::new_ext(text, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct MarkdownRenderer {
    base: Style,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next number for each open list; `None` for bullets
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl MarkdownRenderer {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, style: Style) {
        let merged = self.style().patch(style);
        self.styles.push(merged);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| line.spans.is_empty()) || self.lines.is_empty() {
            return;
        }
        self.lines.push(Line::default());
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    let style = Style::default().fg(Color::Yellow);
                    for line in text.lines() {
                        self.lines.push(Line::from(vec![
                            Span::raw("  "),
                            Span::styled(line.to_string(), style),
                        ]));
                    }
                } else {
                    self.current.push(Span::styled(text.to_string(), self.style()));
                }
            }
            Event::Code(code) => {
                self.current.push(Span::styled(
                    code.to_string(),
                    self.style().fg(Color::Yellow),
                ));
            }
            Event::SoftBreak => self.current.push(Span::styled(" ", self.style())),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "☑ " } else { "☐ " };
                self.current.push(Span::styled(marker, self.style()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.push_style(style);
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::raw("  ".repeat(depth)));
                self.current.push(Span::styled(marker, Style::default().fg(Color::Cyan)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { .. } => {
                self.push_style(Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED))
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush();
                self.blank();
            }
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.styles.pop();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn renders_heading_steps_and_hint() {
        let answer = "## 🎫 Create an event\n\n1. Go to **Events**\n2. Click *New*\n\nHint: save as draft first.";
        let lines = render_markdown(answer, Style::default());

        assert_eq!(
            plain(&lines),
            vec![
                "🎫 Create an event",
                "",
                "1. Go to Events",
                "2. Click New",
                "",
                "Hint: save as draft first.",
            ]
        );
        let bold = lines[2].spans.iter().find(|span| span.content == "Events").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn bullets_and_nested_lists_are_indented() {
        let lines = render_markdown("- Tickets\n  - VIP\n- Add-ons", Style::default());
        assert_eq!(plain(&lines), vec!["• Tickets", "  • VIP", "• Add-ons"]);
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let lines = render_markdown("```\nline one\nline two\n```", Style::default());
        assert_eq!(plain(&lines), vec!["  line one", "  line two"]);
    }

    #[test]
    fn partial_markdown_while_streaming_does_not_panic() {
        let lines = render_markdown("**Go to Ev", Style::default());
        assert_eq!(plain(&lines), vec!["**Go to Ev"]);
    }

    #[test]
    fn empty_text_renders_nothing() {
        assert!(render_markdown("", Style::default()).is_empty());
    }
}
