//! Defines the core state structures for the application.
//!
//! `App` holds everything the render function reads: the two chat panels,
//! which tab is active, the status line, and the channel that background
//! agent tasks report back on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::agent::{AgentApiError, AgentManager, AgentSession};
use crate::panels::ChatPanel;

/// Identifies one of the two chat tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelId {
    PriceMonitoring,
    CompetitorGap,
}

impl PanelId {
    pub const ALL: [PanelId; 2] = [PanelId::PriceMonitoring, PanelId::CompetitorGap];

    pub fn index(self) -> usize {
        match self {
            PanelId::PriceMonitoring => 0,
            PanelId::CompetitorGap => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PanelId::PriceMonitoring => PanelId::CompetitorGap,
            PanelId::CompetitorGap => PanelId::PriceMonitoring,
        }
    }
}

/// Results reported by background tasks, drained on every tick.
#[derive(Debug)]
pub enum AppEvent {
    SessionReady {
        panel: PanelId,
        session: Arc<AgentSession>,
    },
    SessionFailed {
        panel: PanelId,
        error: String,
    },
    Reply {
        panel: PanelId,
        result: Result<String, AgentApiError>,
    },
}

/// The main application state.
pub struct App {
    /// Set when the main loop should exit.
    pub should_quit: bool,
    /// The tab currently shown.
    pub(crate) active: PanelId,
    /// Chat panels, indexed by [`PanelId::index`].
    pub(crate) panels: [ChatPanel; 2],
    /// The message currently displayed in the status bar.
    pub status_message: String,
    pub(crate) manager: Arc<AgentManager>,
    /// Local deadline for one reply; `None` waits as long as the service does.
    pub(crate) run_timeout: Option<Duration>,
    pub(crate) events_tx: UnboundedSender<AppEvent>,
    pub(crate) events_rx: UnboundedReceiver<AppEvent>,
    /// Advances on each tick while a prompt is pending.
    pub(crate) spinner_frame: usize,
}

impl App {
    pub fn active(&self) -> PanelId {
        self.active
    }

    pub fn panel(&self, id: PanelId) -> &ChatPanel {
        &self.panels[id.index()]
    }

    pub fn panel_mut(&mut self, id: PanelId) -> &mut ChatPanel {
        &mut self.panels[id.index()]
    }

    pub fn active_panel(&self) -> &ChatPanel {
        self.panel(self.active)
    }

    pub fn active_panel_mut(&mut self) -> &mut ChatPanel {
        self.panel_mut(self.active)
    }

    pub fn select(&mut self, id: PanelId) {
        self.active = id;
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }
}
