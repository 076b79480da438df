use anyhow::{Context, Result};
use tracing::info;

use crate::client::SupportBackend;
use crate::ui::conversation::{PanelAction, SupportPanel};
use crate::ui::terminal::{self, AppEvent, EventHandler, Tui};

/// Run the support widget until the user quits
pub async fn run<B: SupportBackend>(mut panel: SupportPanel<B>, open: bool) -> Result<()> {
    terminal::install_panic_hook();
    let mut tui = terminal::init().context("Failed to set up terminal")?;

    let result = event_loop(&mut tui, &mut panel, open).await;

    terminal::restore().context("Failed to restore terminal")?;
    result
}

async fn event_loop<B: SupportBackend>(tui: &mut Tui, panel: &mut SupportPanel<B>, open: bool) -> Result<()> {
    let mut events = EventHandler::new();
    events.forward_chat(panel.driver().subscribe());
    if open {
        panel.open();
    }
    info!(mode = %panel.driver().mode(), "support widget started");

    loop {
        tui.draw(|frame| panel.render(frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            AppEvent::Key(key) => {
                if panel.handle_key(key) == PanelAction::Exit {
                    break;
                }
            }
            AppEvent::Tick => panel.on_tick(),
            AppEvent::Chat(chat) => panel.on_chat_event(&chat),
            AppEvent::Resize(..) => {}
        }
    }

    info!("support widget closed");
    Ok(())
}
