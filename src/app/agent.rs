use log::{debug, error, info};

use super::{App, AppEvent, PanelId};
use crate::agent::ask_with_deadline;
use crate::panels::Submission;

// Implementation block for agent-related logic in the App.
impl App {
    /// Starts session initialization for both panels in the background.
    pub fn start_sessions(&mut self) {
        for id in PanelId::ALL {
            let key = self.panel(id).key().clone();
            let manager = self.manager.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let event = match manager.init_agent(&key).await {
                    Ok(session) => AppEvent::SessionReady { panel: id, session },
                    Err(err) => AppEvent::SessionFailed {
                        panel: id,
                        error: err.to_string(),
                    },
                };
                let _ = tx.send(event);
            });
        }
    }

    /// Submits the active panel's input to its agent.
    pub(crate) fn submit_active(&mut self) {
        let id = self.active;
        let run_timeout = self.run_timeout;
        match self.active_panel_mut().submit() {
            Submission::Ignored => {}
            Submission::Rejected(reason) => {
                self.status_message = String::from(reason);
            }
            Submission::Sent {
                session,
                prompt,
                cancel,
            } => {
                self.status_message = String::from("Thinking...");
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = ask_with_deadline(&session, &prompt, run_timeout, cancel).await;
                    let _ = tx.send(AppEvent::Reply { panel: id, result });
                });
            }
        }
    }

    /// Cancels the active panel's pending prompt.
    pub(crate) fn cancel_active(&mut self) -> bool {
        let cancelled = self.active_panel_mut().cancel();
        if cancelled {
            self.status_message = String::from("Cancelling...");
        }
        cancelled
    }

    /// Cancels every pending prompt; used on shutdown.
    pub fn cancel_all(&mut self) {
        for id in PanelId::ALL {
            if self.panel_mut(id).cancel() {
                debug!("Cancelled pending prompt on {:?}", id);
            }
        }
    }

    /// Applies one background result to the panels.
    pub(crate) fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionReady { panel, session } => {
                let name = session.agent.display_name().to_string();
                self.panel_mut(panel).attach(session);
                info!("{:?} ready: {}", panel, name);
                self.status_message = format!("Connected to {}", name);
            }
            AppEvent::SessionFailed { panel, error } => {
                error!("Failed to initialize {:?}: {}", panel, error);
                self.status_message = format!("Agent unavailable: {}", error);
                self.panel_mut(panel).mark_unavailable(error);
            }
            AppEvent::Reply { panel, result } => {
                let failed = result.as_ref().err().map(|err| err.to_string());
                if self.panel_mut(panel).finish(result) {
                    self.status_message = match failed {
                        Some(message) => format!("Agent request failed: {}", message),
                        None => String::from("Reply received"),
                    };
                }
            }
        }
    }

    /// Waits for the next background result. Test helper.
    #[cfg(test)]
    pub(crate) async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }
}
