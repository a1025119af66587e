//! Request and response bodies for the Azure AI Agents REST API.

use serde::{Deserialize, Serialize};

/// Remote record describing a configured agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl AgentDescriptor {
    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

/// Author of a thread message. The service calls the agent role `assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(rename = "assistant")]
    Agent,
    #[serde(other)]
    Other,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "assistant",
            MessageRole::Other => "other",
        }
    }
}

#[derive(Serialize)]
pub struct CreateMessagePayload<'a> {
    pub role: MessageRole,
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct CreateRunPayload<'a> {
    pub assistant_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Statuses the client keeps polling through. Anything else ends the wait.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            RunStatus::Queued
                | RunStatus::InProgress
                | RunStatus::RequiresAction
                | RunStatus::Cancelling
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    /// Run that produced the message; absent for messages posted directly.
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text segments in the order the agent emitted them.
    pub fn text_segments(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|part| match part {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// One page of a list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_with_mixed_content() {
        let raw = r#"{
            "id": "msg_1",
            "object": "thread.message",
            "role": "assistant",
            "run_id": "run_9",
            "content": [
                {"type": "image_file", "image_file": {"file_id": "f1"}},
                {"type": "text", "text": {"value": "first", "annotations": []}},
                {"type": "text", "text": {"value": "second", "annotations": []}}
            ]
        }"#;
        let message: ThreadMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.role, MessageRole::Agent);
        assert_eq!(message.run_id.as_deref(), Some("run_9"));
        assert_eq!(message.text_segments().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn decodes_run_statuses() {
        let run: RunObject =
            serde_json::from_str(r#"{"id":"run_1","status":"in_progress"}"#).unwrap();
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.status.is_pending());

        let run: RunObject = serde_json::from_str(
            r#"{"id":"run_2","status":"failed","last_error":{"code":"rate_limit_exceeded","message":"slow down"}}"#,
        )
        .unwrap();
        assert!(!run.status.is_pending());
        assert_eq!(run.last_error.unwrap().code.as_deref(), Some("rate_limit_exceeded"));

        let run: RunObject =
            serde_json::from_str(r#"{"id":"run_4","status":"cancelling"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Cancelling);
        assert!(run.status.is_pending());

        let run: RunObject =
            serde_json::from_str(r#"{"id":"run_3","status":"paused_for_review"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(!run.status.is_pending());
    }

    #[test]
    fn serializes_user_message_payload() {
        let payload = CreateMessagePayload {
            role: MessageRole::User,
            content: "price?",
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"role": "user", "content": "price?"})
        );
    }

    #[test]
    fn agent_display_name_falls_back_to_id() {
        let agent: AgentDescriptor = serde_json::from_str(r#"{"id":"asst_1"}"#).unwrap();
        assert_eq!(agent.display_name(), "asst_1");
    }
}
