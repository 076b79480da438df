use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Text being typed, with the cursor counted in characters
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    pub cursor: usize,
}

impl TextAreaState {
    fn byte_index(&self, cursor: usize) -> usize {
        self.content
            .char_indices()
            .nth(cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.content.len())
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn insert(&mut self, c: char) {
        let index = self.byte_index(self.cursor);
        self.content.insert(index, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let index = self.byte_index(self.cursor);
        self.content.remove(index);
        true
    }

    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let index = self.byte_index(self.cursor);
        self.content.remove(index);
        true
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

/// Single-line question input
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    busy_placeholder: String,
    enabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
            busy_placeholder: "Waiting for response…".to_string(),
            enabled: true,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.palette_open() && self.apply_selected_command() {
                    return ComposerResult::None;
                }
                if self.state.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = self.state.take();
                self.close_command_palette();
                return match parse_slash_command(&content) {
                    Some(command) => ComposerResult::Command(command),
                    None => ComposerResult::Submitted(content),
                };
            }
            KeyCode::Tab if self.palette_open() => {
                self.apply_selected_command();
            }
            KeyCode::Up if self.palette_open() => self.move_command_selection(-1),
            KeyCode::Down if self.palette_open() => self.move_command_selection(1),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.insert(c);
                self.refresh_command_palette();
            }
            KeyCode::Backspace => {
                if self.state.backspace() {
                    self.refresh_command_palette();
                }
            }
            KeyCode::Delete => {
                if self.state.delete() {
                    self.refresh_command_palette();
                }
            }
            KeyCode::Left => self.state.cursor = self.state.cursor.saturating_sub(1),
            KeyCode::Right => self.state.cursor = (self.state.cursor + 1).min(self.state.char_count()),
            KeyCode::Home => self.state.cursor = 0,
            KeyCode::End => self.state.cursor = self.state.char_count(),
            _ => {}
        }

        ComposerResult::None
    }

    pub fn palette_open(&self) -> bool {
        !self.filtered_commands.is_empty()
    }

    pub fn close_command_palette(&mut self) {
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let content = &self.state.content;
        let Some(query) = content.strip_prefix('/') else {
            self.close_command_palette();
            return;
        };
        if query.contains(char::is_whitespace) {
            self.close_command_palette();
            return;
        }

        let query = query.to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            Some(self.selected_command.unwrap_or(0).min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        let completed = format!("/{}", entry.keyword);
        if self.state.content.trim_end() == completed {
            return false;
        }
        self.state.content = format!("{completed} ");
        self.state.cursor = self.state.char_count();
        self.close_command_palette();
        true
    }

    /// Disable input while an answer is arriving
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn is_empty(&self) -> bool {
        self.state.content.is_empty()
    }

    /// Rows the palette needs above the composer
    pub fn palette_height(&self) -> u16 {
        if self.palette_open() {
            self.filtered_commands.len().min(5) as u16 + 2
        } else {
            0
        }
    }

    /// Draw the command palette into `area`
    pub fn render_palette(&self, area: Rect, buf: &mut Buffer) {
        if !self.palette_open() {
            return;
        }

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(area);
        block.render(area, buf);

        for (index, entry) in self.filtered_commands.iter().enumerate() {
            if index >= inner.height as usize {
                break;
            }

            let style = if self.selected_command == Some(index) {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("/{}", entry.keyword), style),
                Span::styled("  ", Style::default()),
                Span::styled(entry.description, Style::default().fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
        }
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.enabled {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(if self.enabled { "Ask a question" } else { "Please wait" })
            .style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        if !self.enabled {
            let line = Line::from(Span::styled(
                self.busy_placeholder.as_str(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        if self.state.content.is_empty() {
            let line = Line::from(Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        // Keep the cursor visible on long input.
        let chars: Vec<char> = self.state.content.chars().collect();
        let width = inner.width.saturating_sub(1) as usize;
        let start = self.state.cursor.saturating_sub(width);
        let before: String = chars[start..self.state.cursor].iter().collect();
        let after: String = chars[self.state.cursor..].iter().collect();

        let line = Line::from(vec![
            Span::styled(before, Style::default().fg(Color::White)),
            Span::styled("▌", Style::default().fg(Color::Green)),
            Span::styled(after, Style::default().fg(Color::White)),
        ]);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::conversation::commands::SlashCommand;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut ConversationComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut composer = ConversationComposer::new("Type your question...");
        type_text(&mut composer, "How do I add ticket types?");

        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Submitted("How do I add ticket types?".to_string())
        );
        assert!(composer.is_empty());
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut composer = ConversationComposer::new("");
        type_text(&mut composer, "   ");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut composer = ConversationComposer::new("");
        type_text(&mut composer, "café");
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "caé");

        composer.handle_key(press(KeyCode::End));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "ca");
    }

    #[test]
    fn disabled_composer_ignores_typing() {
        let mut composer = ConversationComposer::new("");
        composer.set_enabled(false);
        type_text(&mut composer, "hello");
        assert!(composer.is_empty());
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
    }

    #[test]
    fn slash_input_becomes_a_command() {
        let mut composer = ConversationComposer::new("");
        type_text(&mut composer, "/quick 2");

        match composer.handle_key(press(KeyCode::Enter)) {
            ComposerResult::Command(parsed) => {
                assert_eq!(parsed.command, SlashCommand::Quick);
                assert_eq!(parsed.quick_action_index(), Some(1));
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn palette_completes_selected_command() {
        let mut composer = ConversationComposer::new("");
        type_text(&mut composer, "/cl");
        assert!(composer.palette_open());

        composer.handle_key(press(KeyCode::Tab));
        assert_eq!(composer.content(), "/clear ");
        assert!(!composer.palette_open());
    }
}
