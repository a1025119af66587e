/// Who said a line in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent,
}

impl Speaker {
    /// Label drawn in front of the turn's text.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "🧑 You:",
            Speaker::Agent => "🤖 Agent:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered, append-only list of displayed turns for one chat panel.
///
/// Also keeps the view's scroll position, counted in rendered lines above the
/// bottom so new turns stay in sight while the user has not scrolled.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    scroll_from_bottom: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a turn and snaps the view back to the newest line.
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            text: text.into(),
        });
        self.scroll_from_bottom = 0;
    }

    pub fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    /// Keeps the offset within what a view of `visible` lines over
    /// `total` rendered lines can show.
    pub fn clamp_scroll(&mut self, total: usize, visible: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.min(total.saturating_sub(visible));
    }
}
