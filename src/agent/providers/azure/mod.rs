use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::agent::config::Settings;
use crate::agent::error::AgentApiError;

use super::AgentsApi;

pub mod models;

use models::{
    AgentDescriptor, CreateMessagePayload, CreateRunPayload, ListPage, MessageRole, RunObject,
    RunStatus, ThreadMessage, ThreadObject,
};

/// Page size used when walking a thread's message history.
const MESSAGE_PAGE_SIZE: &str = "100";

/// `AgentsApi` 的 REST 實作，用於與 Azure AI Agents 服務通訊。
///
/// The handle is cheap to share behind an `Arc`; `reqwest::Client` pools
/// connections internally.
pub struct AgentsClient {
    /// Project endpoint, always ending in `/` so relative joins keep its path.
    base: Url,
    api_version: String,
    poll_interval: Duration,
    http: Client,
}

impl AgentsClient {
    /// Builds a client for `endpoint`, authenticated with a static key.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        api_version: &str,
        poll_interval: Duration,
    ) -> Result<Self, AgentApiError> {
        let base = parse_endpoint(endpoint)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| AgentApiError::Credential)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("agentdesk/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder().default_headers(headers).build()?;
        debug!("Agents client created for {}", base);
        Ok(Self {
            base,
            api_version: api_version.to_string(),
            poll_interval,
            http,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AgentApiError> {
        Self::new(
            &settings.endpoint,
            &settings.api_key,
            &settings.api_version,
            settings.poll_interval,
        )
    }

    /// Resolves `path` against the project endpoint and adds `api-version`.
    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AgentApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| AgentApiError::Endpoint {
                endpoint: self.base.to_string(),
                reason: err.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", &self.api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AgentApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = error_body(response.text().await);
            warn!("Agent service responded {}: {}", status, body);
            return Err(AgentApiError::Status { status, body });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn create_run(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<RunObject, AgentApiError> {
        let url = self.url(&format!("threads/{thread_id}/runs"), &[])?;
        let payload = CreateRunPayload {
            assistant_id: agent_id,
        };
        self.execute(self.http.post(url).json(&payload)).await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunObject, AgentApiError> {
        let url = self.url(&format!("threads/{thread_id}/runs/{run_id}"), &[])?;
        self.execute(self.http.get(url)).await
    }

    pub async fn cancel_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunObject, AgentApiError> {
        let url = self.url(&format!("threads/{thread_id}/runs/{run_id}/cancel"), &[])?;
        self.execute(self.http.post(url).json(&serde_json::json!({})))
            .await
    }

    /// Fetches one page of messages, newest first.
    pub async fn list_messages(
        &self,
        thread_id: &str,
        after: Option<&str>,
    ) -> Result<ListPage<ThreadMessage>, AgentApiError> {
        let mut query = vec![("order", "desc"), ("limit", MESSAGE_PAGE_SIZE)];
        if let Some(cursor) = after {
            query.push(("after", cursor));
        }
        let url = self.url(&format!("threads/{thread_id}/messages"), &query)?;
        self.execute(self.http.get(url)).await
    }
}

#[async_trait]
impl AgentsApi for AgentsClient {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentDescriptor, AgentApiError> {
        let url = self.url(&format!("assistants/{agent_id}"), &[])?;
        let agent: AgentDescriptor = self.execute(self.http.get(url)).await?;
        info!("Fetched agent {} ({})", agent.id, agent.display_name());
        Ok(agent)
    }

    async fn create_thread(&self) -> Result<String, AgentApiError> {
        let url = self.url("threads", &[])?;
        let thread: ThreadObject = self
            .execute(self.http.post(url).json(&serde_json::json!({})))
            .await?;
        info!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AgentApiError> {
        let url = self.url(&format!("threads/{thread_id}/messages"), &[])?;
        let payload = CreateMessagePayload { role, content };
        debug!(
            "Appending {} message ({} bytes) to {}",
            role.as_str(),
            content.len(),
            thread_id
        );
        self.execute(self.http.post(url).json(&payload)).await
    }

    async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<RunObject, AgentApiError> {
        let run = self.create_run(thread_id, agent_id).await?;
        debug!("Run {} created with status {:?}", run.id, run.status);
        let run = settle_run(
            run,
            self.poll_interval,
            |run_id| async move { self.get_run(thread_id, &run_id).await },
            |run_id| async move { self.cancel_run(thread_id, &run_id).await },
        )
        .await?;
        info!("Run {} finished with status {:?}", run.id, run.status);
        Ok(run)
    }

    async fn get_last_message_by_role(
        &self,
        thread_id: &str,
        role: MessageRole,
    ) -> Result<Option<ThreadMessage>, AgentApiError> {
        find_latest_by_role(role, |cursor| async move {
            self.list_messages(thread_id, cursor.as_deref()).await
        })
        .await
    }
}

/// Polls `run` until it leaves the pending states.
///
/// No tools are registered locally, so a run asking for tool outputs is
/// cancelled once and polling continues until the cancellation settles.
async fn settle_run<G, GF, C, CF>(
    mut run: RunObject,
    poll_interval: Duration,
    mut get_run: G,
    mut cancel_run: C,
) -> Result<RunObject, AgentApiError>
where
    G: FnMut(String) -> GF,
    GF: Future<Output = Result<RunObject, AgentApiError>>,
    C: FnMut(String) -> CF,
    CF: Future<Output = Result<RunObject, AgentApiError>>,
{
    let mut cancel_sent = false;
    loop {
        if run.status == RunStatus::RequiresAction && !cancel_sent {
            warn!("Run {} requires tool outputs, cancelling", run.id);
            cancel_sent = true;
            run = cancel_run(run.id.clone()).await?;
        }
        if !run.status.is_pending() {
            return Ok(run);
        }
        tokio::time::sleep(poll_interval).await;
        run = get_run(run.id.clone()).await?;
    }
}

/// Walks newest-first message pages until one with `role` turns up.
async fn find_latest_by_role<L, LF>(
    role: MessageRole,
    mut list_page: L,
) -> Result<Option<ThreadMessage>, AgentApiError>
where
    L: FnMut(Option<String>) -> LF,
    LF: Future<Output = Result<ListPage<ThreadMessage>, AgentApiError>>,
{
    let mut cursor: Option<String> = None;
    loop {
        let page = list_page(cursor.take()).await?;
        let has_more = page.has_more;
        let last_id = page.last_id;
        if let Some(found) = page.data.into_iter().find(|message| message.role == role) {
            return Ok(Some(found));
        }
        match last_id {
            Some(id) if has_more => cursor = Some(id),
            _ => return Ok(None),
        }
    }
}

/// Body of an error response; a failed read is recorded in its place.
fn error_body(body: Result<String, reqwest::Error>) -> String {
    body.unwrap_or_else(|err| format!("<unreadable body: {err}>"))
}

/// Validates the project endpoint and normalizes it to end with `/`.
fn parse_endpoint(endpoint: &str) -> Result<Url, AgentApiError> {
    let invalid = |reason: String| AgentApiError::Endpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let trimmed = endpoint.trim().trim_end_matches('/');
    let mut url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid(String::from("endpoint has no host")));
    }
    if url.query().is_some() {
        return Err(invalid(String::from("endpoint must not carry a query string")));
    }
    let path = format!("{}/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use super::models::{MessageContent, TextContent};

    fn run(status: RunStatus) -> RunObject {
        RunObject {
            id: String::from("run_1"),
            status,
            last_error: None,
        }
    }

    fn message(id: &str, role: MessageRole, text: &str) -> ThreadMessage {
        ThreadMessage {
            id: id.to_string(),
            role,
            run_id: None,
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: text.to_string(),
                },
            }],
        }
    }

    fn page(data: Vec<ThreadMessage>, has_more: bool) -> ListPage<ThreadMessage> {
        let last_id = data.last().map(|message| message.id.clone());
        ListPage {
            data,
            has_more,
            last_id,
        }
    }

    #[test]
    fn unreadable_error_body_is_recorded() {
        assert_eq!(error_body(Ok(String::from("quota exceeded"))), "quota exceeded");

        let read_error = Client::new().get("not a url").build().unwrap_err();
        let body = error_body(Err(read_error));
        assert!(body.starts_with("<unreadable body: "), "{body}");
    }

    #[tokio::test]
    async fn polls_until_run_completes() {
        let statuses = Mutex::new(VecDeque::from([RunStatus::InProgress, RunStatus::Completed]));
        let polls = Mutex::new(0usize);
        let settled = settle_run(
            run(RunStatus::Queued),
            Duration::ZERO,
            |_| {
                *polls.lock().unwrap() += 1;
                let next = statuses.lock().unwrap().pop_front().unwrap();
                async move { Ok(run(next)) }
            },
            |_| async { panic!("nothing to cancel") },
        )
        .await
        .unwrap();
        assert_eq!(settled.status, RunStatus::Completed);
        assert_eq!(*polls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn requires_action_is_cancelled_once_and_polled_until_settled() {
        let statuses = Mutex::new(VecDeque::from([
            RunStatus::RequiresAction,
            RunStatus::Cancelling,
            RunStatus::Cancelled,
        ]));
        let cancels = Mutex::new(Vec::new());
        let settled = settle_run(
            run(RunStatus::Queued),
            Duration::ZERO,
            |_| {
                let next = statuses.lock().unwrap().pop_front().unwrap();
                async move { Ok(run(next)) }
            },
            |run_id| {
                cancels.lock().unwrap().push(run_id);
                async { Ok(run(RunStatus::Cancelling)) }
            },
        )
        .await
        .unwrap();
        assert_eq!(settled.status, RunStatus::Cancelled);
        assert_eq!(*cancels.lock().unwrap(), ["run_1"]);
        assert!(statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn terminal_run_is_returned_without_polling() {
        let settled = settle_run(
            run(RunStatus::Failed),
            Duration::ZERO,
            |_| async { panic!("terminal run must not be polled") },
            |_| async { panic!("nothing to cancel") },
        )
        .await
        .unwrap();
        assert_eq!(settled.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn poll_errors_propagate() {
        let err = settle_run(
            run(RunStatus::InProgress),
            Duration::ZERO,
            |_| async {
                Err(AgentApiError::Status {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: String::from("upstream"),
                })
            },
            |_| async { panic!("nothing to cancel") },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AgentApiError::Status { status, .. } if status.as_u16() == 502));
    }

    #[tokio::test]
    async fn finds_agent_message_on_second_page() {
        let pages = Mutex::new(VecDeque::from([
            page(
                vec![
                    message("msg_4", MessageRole::User, "again?"),
                    message("msg_3", MessageRole::User, "hello?"),
                ],
                true,
            ),
            page(
                vec![
                    message("msg_2", MessageRole::Agent, "newest reply"),
                    message("msg_1", MessageRole::Agent, "older reply"),
                ],
                false,
            ),
        ]));
        let cursors = Mutex::new(Vec::new());
        let found = find_latest_by_role(MessageRole::Agent, |cursor| {
            cursors.lock().unwrap().push(cursor);
            let next = pages.lock().unwrap().pop_front().unwrap();
            async move { Ok(next) }
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(found.id, "msg_2");
        assert_eq!(*cursors.lock().unwrap(), [None, Some(String::from("msg_3"))]);
    }

    #[tokio::test]
    async fn stops_on_last_page_without_match() {
        let calls = Mutex::new(0usize);
        let found = find_latest_by_role(MessageRole::Agent, |_| {
            *calls.lock().unwrap() += 1;
            async { Ok(page(vec![message("msg_1", MessageRole::User, "hi")], false)) }
        })
        .await
        .unwrap();
        assert!(found.is_none());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn stops_when_more_pages_have_no_cursor() {
        let found = find_latest_by_role(MessageRole::Agent, |_| async {
            Ok(ListPage {
                data: Vec::new(),
                has_more: true,
                last_id: None,
            })
        })
        .await
        .unwrap();
        assert!(found.is_none());
    }

    fn client(endpoint: &str) -> AgentsClient {
        AgentsClient::new(endpoint, "key", "v1", Duration::from_millis(10)).unwrap()
    }

    #[test]
    fn keeps_project_path_when_joining() {
        let client = client("https://demo.services.ai.azure.com/api/projects/shop");
        let url = client.url("threads/thread_1/messages", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://demo.services.ai.azure.com/api/projects/shop/threads/thread_1/messages?api-version=v1"
        );
    }

    #[test]
    fn trailing_slash_on_endpoint_is_tolerated() {
        let client = client("https://demo.services.ai.azure.com/api/projects/shop/");
        let url = client
            .url("threads/t/messages", &[("order", "desc"), ("limit", "100")])
            .unwrap();
        assert_eq!(url.path(), "/api/projects/shop/threads/t/messages");
        assert_eq!(url.query(), Some("api-version=v1&order=desc&limit=100"));
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for endpoint in ["not a url", "ftp://demo.example.com", "mailto:ops@example.com"] {
            let result = AgentsClient::new(endpoint, "key", "v1", Duration::from_secs(1));
            assert!(
                matches!(result, Err(AgentApiError::Endpoint { .. })),
                "{endpoint} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_api_key_with_control_characters() {
        let result = AgentsClient::new("https://demo.example.com", "bad\nkey", "v1", Duration::from_secs(1));
        assert!(matches!(result, Err(AgentApiError::Credential)));
    }
}
