use super::{App, PanelId};

// Implementation block for tick-related logic in the App.
impl App {
    /// Called on every tick of the main loop.
    ///
    /// Drains results from background agent tasks and advances the spinner
    /// while any panel is waiting.
    pub fn on_tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
        if PanelId::ALL.iter().any(|id| self.panel(*id).is_pending()) {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }
}
