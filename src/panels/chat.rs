use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentApiError, AgentSession, SessionKey, Speaker, Transcript};

use super::input::InputLine;

/// Lifecycle of a chat panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelStatus {
    /// Waiting for the agent lookup and thread creation.
    Connecting,
    /// Displaying the transcript and accepting input.
    Ready,
    /// A prompt is with the agent.
    Pending,
    /// The agent could not be reached; the panel takes no input.
    Unavailable(String),
}

/// Result of pressing submit.
pub enum Submission {
    /// Blank input: nothing happened.
    Ignored,
    /// The panel cannot send right now.
    Rejected(&'static str),
    /// The user turn was recorded; the prompt must now be sent.
    Sent {
        session: Arc<AgentSession>,
        prompt: String,
        cancel: CancellationToken,
    },
}

/// One tab of the UI: a transcript, an input line and the agent binding.
pub struct ChatPanel {
    tab_label: &'static str,
    header: &'static str,
    key: SessionKey,
    session: Option<Arc<AgentSession>>,
    transcript: Transcript,
    input: InputLine,
    status: PanelStatus,
    last_error: Option<String>,
    cancel: Option<CancellationToken>,
}

impl ChatPanel {
    pub fn new(tab_label: &'static str, header: &'static str, key: SessionKey) -> Self {
        Self {
            tab_label,
            header,
            key,
            session: None,
            transcript: Transcript::new(),
            input: InputLine::new(),
            status: PanelStatus::Connecting,
            last_error: None,
            cancel: None,
        }
    }

    pub fn tab_label(&self) -> &'static str {
        self.tab_label
    }

    pub fn header(&self) -> &'static str {
        self.header
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputLine {
        &mut self.input
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == PanelStatus::Pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The agent session is ready; the panel starts accepting prompts.
    pub fn attach(&mut self, session: Arc<AgentSession>) {
        info!(
            "{}: attached to agent {} on thread {}",
            self.tab_label, session.agent.id, session.thread_id
        );
        self.session = Some(session);
        self.status = PanelStatus::Ready;
        self.last_error = None;
    }

    /// Session initialization failed; the panel stays unusable.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("{}: agent unavailable: {}", self.tab_label, reason);
        self.session = None;
        self.status = PanelStatus::Unavailable(reason);
    }

    /// Handles the submit action.
    ///
    /// Blank input is ignored and left in place. Otherwise the user turn is
    /// appended immediately and the panel waits for [`ChatPanel::finish`].
    pub fn submit(&mut self) -> Submission {
        if self.input.value().trim().is_empty() {
            return Submission::Ignored;
        }
        let session = match (&self.status, &self.session) {
            (PanelStatus::Ready, Some(session)) => session.clone(),
            (PanelStatus::Pending, _) => return Submission::Rejected("Still waiting for the agent"),
            (PanelStatus::Unavailable(_), _) => return Submission::Rejected("Agent is unavailable"),
            _ => return Submission::Rejected("Agent is still connecting"),
        };

        let prompt = self.input.take();
        self.transcript.push(Speaker::User, prompt.clone());
        self.status = PanelStatus::Pending;
        self.last_error = None;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        debug!("{}: submitted prompt ({} bytes)", self.tab_label, prompt.len());
        Submission::Sent {
            session,
            prompt,
            cancel,
        }
    }

    /// Records the outcome of the pending prompt and returns to `Ready`.
    ///
    /// Returns `false` when no prompt was pending.
    pub fn finish(&mut self, result: Result<String, AgentApiError>) -> bool {
        if !self.is_pending() {
            debug!("{}: dropping reply with nothing pending", self.tab_label);
            return false;
        }
        self.cancel = None;
        self.status = PanelStatus::Ready;
        match result {
            Ok(reply) => self.transcript.push(Speaker::Agent, reply),
            Err(err) => {
                warn!("{}: ask failed: {}", self.tab_label, err);
                self.last_error = Some(err.to_string());
            }
        }
        true
    }

    /// Cancels the pending prompt, if any. The result still arrives via `finish`.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}
