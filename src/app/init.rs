use std::sync::Arc;

use log::debug;
use tokio::sync::mpsc;

use super::{App, PanelId};
use crate::agent::{AgentManager, Settings};
use crate::panels::ChatPanel;

pub const PRICE_TAB_LABEL: &str = "📊 Price Monitoring Agent";
pub const PRICE_HEADER: &str = "📊 In-Season Price Monitoring Agent";
pub const GAP_TAB_LABEL: &str = "⚔️ Competitor Gap Agent";
pub const GAP_HEADER: &str = "⚔️ Competitor Price Gap Agent";

impl App {
    /// Creates the application state with both panels still connecting.
    ///
    /// Call [`App::start_sessions`] from inside the runtime to bind them.
    pub fn new(settings: &Settings, manager: Arc<AgentManager>) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        debug!("Initializing App for UI session {}", session_id);

        let price = ChatPanel::new(
            PRICE_TAB_LABEL,
            PRICE_HEADER,
            manager.key_for(&settings.price_monitoring_agent, &session_id),
        );
        let gap = ChatPanel::new(
            GAP_TAB_LABEL,
            GAP_HEADER,
            manager.key_for(&settings.competitor_gap_agent, &session_id),
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            should_quit: false,
            active: PanelId::PriceMonitoring,
            panels: [price, gap],
            status_message: String::from("Connecting to agents..."),
            manager,
            run_timeout: settings.run_timeout,
            events_tx,
            events_rx,
            spinner_frame: 0,
        }
    }
}
