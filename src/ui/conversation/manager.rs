use crate::client::SupportBackend;
use crate::config::UiConfig;
use crate::driver::{IgnoreReason, SubmitOutcome, SupportDriver};
use crate::events::ChatEvent;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand, SlashCommand,
    StatusBar,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tracing::debug;

const PANEL_WIDTH: u16 = 64;
const SCROLL_STEP: u16 = 5;

/// Actions that can be requested by the support panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    Exit,
}

/// The floating support widget: launcher button plus chat panel
pub struct SupportPanel<B> {
    driver: SupportDriver<B>,
    composer: ConversationComposer,
    title: String,
    subtitle: String,
    is_open: bool,
    selected_quick_action: usize,
    scroll_back: u16,
    notice: Option<String>,
    tick: u64,
}

impl<B: SupportBackend> SupportPanel<B> {
    pub fn new(driver: SupportDriver<B>, ui: &UiConfig) -> Self {
        Self {
            driver,
            composer: ConversationComposer::new("Type your question..."),
            title: ui.title.clone(),
            subtitle: ui.subtitle.clone(),
            is_open: false,
            selected_quick_action: 0,
            scroll_back: 0,
            notice: None,
            tick: 0,
        }
    }

    pub fn driver(&self) -> &SupportDriver<B> {
        &self.driver
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        self.is_open = true;
        self.composer.set_enabled(!self.driver.is_busy());
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.composer.close_command_palette();
        self.notice = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn selected_quick_action(&self) -> usize {
        self.selected_quick_action
    }

    /// Advance animations
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Keep the view in sync with conversation changes
    pub fn on_chat_event(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::MessageAppended { .. } => self.scroll_back = 0,
            ChatEvent::MessageUpdated { .. } => {}
            ChatEvent::Cleared => {
                self.scroll_back = 0;
                self.selected_quick_action = 0;
            }
            ChatEvent::BusyChanged(busy) => self.composer.set_enabled(!busy),
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> PanelAction {
        if key.kind != KeyEventKind::Press {
            return PanelAction::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return PanelAction::Exit,
                KeyCode::Char('l') if self.is_open => {
                    self.clear_chat();
                    return PanelAction::None;
                }
                _ => {}
            }
        }

        if !self.is_open {
            return match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('o') => {
                    self.open();
                    PanelAction::None
                }
                KeyCode::Esc | KeyCode::Char('q') => PanelAction::Exit,
                _ => PanelAction::None,
            };
        }

        self.notice = None;
        let browsing_quick_actions = self.driver.messages().is_empty() && self.composer.is_empty();

        match key.code {
            KeyCode::Esc if !self.composer.palette_open() => {
                self.close();
                return PanelAction::None;
            }
            KeyCode::PageUp => {
                self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP);
                return PanelAction::None;
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP);
                return PanelAction::None;
            }
            KeyCode::Up if browsing_quick_actions => {
                self.move_quick_action_selection(-1);
                return PanelAction::None;
            }
            KeyCode::Down if browsing_quick_actions => {
                self.move_quick_action_selection(1);
                return PanelAction::None;
            }
            KeyCode::Enter if browsing_quick_actions => {
                self.ask_quick_action(self.selected_quick_action);
                return PanelAction::None;
            }
            KeyCode::Esc => {
                self.composer.close_command_palette();
                return PanelAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => {
                self.ask(text);
                PanelAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => PanelAction::None,
        }
    }

    fn move_quick_action_selection(&mut self, delta: isize) {
        let len = self.driver.quick_actions().len();
        if len == 0 {
            return;
        }
        let next = (self.selected_quick_action as isize + delta).rem_euclid(len as isize);
        self.selected_quick_action = next as usize;
    }

    fn clear_chat(&mut self) {
        self.driver.clear();
        self.scroll_back = 0;
        self.selected_quick_action = 0;
    }

    /// Submit free text without blocking the UI
    fn ask(&mut self, text: String) {
        self.composer.set_enabled(false);
        let driver = self.driver.clone();
        tokio::spawn(async move {
            let outcome = driver.submit(&text).await;
            log_outcome(&outcome);
        });
    }

    fn ask_quick_action(&mut self, index: usize) {
        if index >= self.driver.quick_actions().len() {
            self.notice = Some(format!("There is no common question number {}.", index + 1));
            return;
        }
        self.composer.set_enabled(false);
        let driver = self.driver.clone();
        tokio::spawn(async move {
            let outcome = driver.submit_quick_action(index).await;
            log_outcome(&outcome);
        });
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> PanelAction {
        match command.command {
            SlashCommand::Quick => match command.quick_action_index() {
                Some(index) => self.ask_quick_action(index),
                None => self.notice = Some("Usage: /quick <number>".to_string()),
            },
            SlashCommand::Clear => self.clear_chat(),
            SlashCommand::Close => self.close(),
            SlashCommand::Help => self.notice = Some(get_help_text()),
            SlashCommand::Bye => return PanelAction::Exit,
        }
        PanelAction::None
    }

    /// Draw the launcher or the open panel
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();
        if self.is_open {
            self.render_panel(frame, area);
        } else {
            self.render_launcher(frame, area);
        }
    }

    fn render_launcher(&self, frame: &mut Frame, area: Rect) {
        let label = Line::from(vec![
            Span::styled(" 💬 ", Style::default().fg(Color::White)),
            Span::styled("Get Support ", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        ]);
        let width = (label.width() as u16 + 2).min(area.width);
        let height = 3.min(area.height);
        let button = Rect {
            x: area.right().saturating_sub(width + 1),
            y: area.bottom().saturating_sub(height + 1),
            width,
            height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(Paragraph::new(label).block(block), button);

        let hint = Paragraph::new(Line::from(Span::styled(
            "Enter: open support   q: quit",
            Style::default().fg(Color::DarkGray),
        )));
        let hint_area = Rect {
            x: area.x + 1,
            y: area.bottom().saturating_sub(2),
            width: area.width.saturating_sub(width + 3),
            height: 1,
        };
        frame.render_widget(hint, hint_area);
    }

    fn render_panel(&self, frame: &mut Frame, area: Rect) {
        let width = PANEL_WIDTH.min(area.width);
        let panel = Rect {
            x: area.right().saturating_sub(width),
            y: area.y,
            width,
            height: area.height,
        };
        frame.render_widget(Clear, panel);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let notice_height = if self.notice.is_some() { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),             // Subtitle
                Constraint::Length(1),             // Status
                Constraint::Min(3),                // Messages
                Constraint::Length(notice_height), // Notice
                Constraint::Length(3),             // Composer
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                self.subtitle.as_str(),
                Style::default().fg(Color::Gray),
            ))),
            chunks[0],
        );

        let messages = self.driver.messages();
        frame.render_widget(
            StatusBar {
                busy: self.driver.is_busy(),
                has_messages: !messages.is_empty(),
                mode: self.driver.mode(),
                tick: self.tick,
            },
            chunks[1],
        );

        let history = ConversationHistory {
            messages: &messages,
            quick_actions: self.driver.quick_actions(),
            selected_quick_action: self.selected_quick_action,
            scroll_back: self.scroll_back,
            tick: self.tick,
        };
        frame.render_widget(&history, chunks[2]);

        if let Some(notice) = &self.notice {
            frame.render_widget(
                Paragraph::new(notice.as_str())
                    .wrap(Wrap { trim: true })
                    .style(Style::default().fg(Color::Yellow)),
                chunks[3],
            );
        }

        frame.render_widget(&self.composer, chunks[4]);

        let palette_height = self.composer.palette_height().min(chunks[2].height);
        if palette_height > 0 {
            let palette = Rect {
                x: chunks[4].x,
                y: chunks[4].y.saturating_sub(palette_height),
                width: chunks[4].width,
                height: palette_height,
            };
            self.composer.render_palette(palette, frame.buffer_mut());
        }
    }
}

fn log_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Answered => debug!("answer shown"),
        SubmitOutcome::Failed(error) => debug!(%error, "apology shown instead of answer"),
        SubmitOutcome::Ignored(IgnoreReason::Busy) => debug!("question dropped while busy"),
        SubmitOutcome::Ignored(reason) => debug!(?reason, "question ignored"),
    }
}
