pub mod agent;
pub mod app;
pub mod event;
pub mod logging;
pub mod panels;
pub mod tui;
pub mod ui;

use agent::{AgentManager, Settings};
use anyhow::{Context, Result};
use app::App;
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEventKind};
use event::Event;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tui::{init, restore};
use ui::render;

const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let settings = Settings::load().context("agent configuration is incomplete")?;
    log::info!(
        "Starting with endpoint {} (api-version {})",
        settings.endpoint,
        settings.api_version
    );

    let manager = Arc::new(AgentManager::from_settings(&settings));
    let mut app = App::new(&settings, manager);

    let mut tui = init()?;
    app.start_sessions();
    let result = run(&mut tui, &mut app).await;

    app.cancel_all();
    restore()?;
    if let Err(err) = &result {
        log::error!("Event loop stopped: {err:#}");
    }
    log::info!("Shutting down");
    result
}

async fn run(tui: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(TICK_RATE);

    while !app.should_quit {
        tui.draw(|frame| render(frame, app))?;

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) if key.kind != KeyEventKind::Release => Event::Key(key),
                    Some(Ok(CrosstermEvent::Paste(text))) => Event::Paste(text),
                    Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(err).context("failed to read terminal events"),
                    None => break,
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.handle_key(key),
            Event::Paste(text) => app.handle_paste(&text),
            Event::Resize => {}
        }
    }
    Ok(())
}
