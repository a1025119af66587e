//! In-memory `AgentsApi` used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::AgentsApi;
use super::azure::models::{
    AgentDescriptor, MessageContent, MessageRole, RunObject, RunStatus, TextContent,
    ThreadMessage,
};
use crate::agent::error::AgentApiError;

/// What a fake agent does when a run is processed.
#[derive(Clone)]
pub enum Reply {
    /// Completes and posts one message with these text segments.
    Segments(Vec<String>),
    /// Completes without posting anything.
    Silent,
    /// Ends the run in `failed` without posting anything.
    FailedRun,
    /// The run request itself is rejected with this status code.
    HttpError(u16),
}

impl Reply {
    pub fn text(value: &str) -> Self {
        Reply::Segments(vec![value.to_string()])
    }
}

#[derive(Default)]
pub struct FakeAgents {
    agents: HashMap<String, Reply>,
    threads: Mutex<HashMap<String, Vec<ThreadMessage>>>,
    run_delay: Option<Duration>,
    pub get_agent_calls: AtomicUsize,
    pub create_thread_calls: AtomicUsize,
    ids: AtomicUsize,
}

impl FakeAgents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent_id: &str, reply: Reply) -> Self {
        self.agents.insert(agent_id.to_string(), reply);
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = Some(delay);
        self
    }

    pub fn messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.threads
            .lock()
            .unwrap()
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.ids.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn push(
        &self,
        thread_id: &str,
        role: MessageRole,
        run_id: Option<&str>,
        segments: &[String],
    ) -> ThreadMessage {
        let message = ThreadMessage {
            id: self.next_id("msg"),
            role,
            run_id: run_id.map(str::to_string),
            content: segments
                .iter()
                .map(|value| MessageContent::Text {
                    text: TextContent {
                        value: value.clone(),
                    },
                })
                .collect(),
        };
        self.threads
            .lock()
            .unwrap()
            .entry(thread_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    fn not_found(what: &str) -> AgentApiError {
        AgentApiError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: format!("{what} not found"),
        }
    }
}

#[async_trait]
impl AgentsApi for FakeAgents {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentDescriptor, AgentApiError> {
        self.get_agent_calls.fetch_add(1, Ordering::SeqCst);
        if !self.agents.contains_key(agent_id) {
            return Err(Self::not_found(agent_id));
        }
        Ok(AgentDescriptor {
            id: agent_id.to_string(),
            name: Some(format!("{agent_id} agent")),
            model: None,
        })
    }

    async fn create_thread(&self) -> Result<String, AgentApiError> {
        self.create_thread_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id("thread");
        self.threads.lock().unwrap().insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AgentApiError> {
        if !self.threads.lock().unwrap().contains_key(thread_id) {
            return Err(Self::not_found(thread_id));
        }
        Ok(self.push(thread_id, role, None, &[content.to_string()]))
    }

    async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<RunObject, AgentApiError> {
        let reply = self
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| Self::not_found(agent_id))?;
        if let Some(delay) = self.run_delay {
            tokio::time::sleep(delay).await;
        }
        let run_id = self.next_id("run");
        let status = match reply {
            Reply::Segments(segments) => {
                self.push(thread_id, MessageRole::Agent, Some(&run_id), &segments);
                RunStatus::Completed
            }
            Reply::Silent => RunStatus::Completed,
            Reply::FailedRun => RunStatus::Failed,
            Reply::HttpError(code) => {
                return Err(AgentApiError::Status {
                    status: reqwest::StatusCode::from_u16(code)
                        .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
                    body: String::from("injected failure"),
                });
            }
        };
        Ok(RunObject {
            id: run_id,
            status,
            last_error: None,
        })
    }

    async fn get_last_message_by_role(
        &self,
        thread_id: &str,
        role: MessageRole,
    ) -> Result<Option<ThreadMessage>, AgentApiError> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .get(thread_id)
            .and_then(|messages| messages.iter().rev().find(|m| m.role == role).cloned()))
    }
}
