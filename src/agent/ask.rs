use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::error::AgentApiError;
use super::manager::AgentSession;
use super::providers::AgentsApi;
use super::providers::azure::models::{AgentDescriptor, MessageRole, RunStatus, ThreadMessage};

/// Text shown as the agent turn when a run leaves no readable reply.
pub const NO_RESPONSE: &str = "⚠ No response received.";

/// Posts `prompt` to the thread, runs `agent` to completion and returns its
/// latest reply.
///
/// Only the first text segment of the reply is returned. A run that ends in
/// `failed`, `cancelled` or `expired` is not an error here: it yields
/// [`NO_RESPONSE`], as does an agent message left by an earlier run.
pub async fn ask(
    api: &dyn AgentsApi,
    agent: &AgentDescriptor,
    thread_id: &str,
    prompt: &str,
) -> Result<String, AgentApiError> {
    api.create_message(thread_id, MessageRole::User, prompt)
        .await?;

    let run = api.create_and_process_run(thread_id, &agent.id).await?;
    if run.status != RunStatus::Completed {
        let reason = run
            .last_error
            .as_ref()
            .and_then(|err| err.message.as_deref())
            .unwrap_or("no detail");
        warn!(
            "Run {} for agent {} ended as {:?}: {}",
            run.id, agent.id, run.status, reason
        );
        return Ok(NO_RESPONSE.to_string());
    }

    let message = api
        .get_last_message_by_role(thread_id, MessageRole::Agent)
        .await?
        .filter(|message| {
            let fresh = message.run_id.as_deref().is_none_or(|id| id == run.id);
            if !fresh {
                debug!("Latest agent message {} predates run {}", message.id, run.id);
            }
            fresh
        });
    Ok(first_text(message.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| NO_RESPONSE.to_string()))
}

fn first_text(message: Option<&ThreadMessage>) -> Option<&str> {
    message?.text_segments().next()
}

/// [`ask`] bounded by an optional deadline and a cancellation token.
///
/// Cancelling or timing out drops the in-flight request; whatever already
/// reached the remote thread stays there.
pub async fn ask_with_deadline(
    session: &AgentSession,
    prompt: &str,
    timeout: Option<Duration>,
    cancel: CancellationToken,
) -> Result<String, AgentApiError> {
    debug!(
        "Asking {} on {} ({} bytes)",
        session.agent.id,
        session.thread_id,
        prompt.len()
    );
    let call = ask(
        session.client.as_ref(),
        &session.agent,
        &session.thread_id,
        prompt,
    );
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AgentApiError::Timeout(limit))?,
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentApiError::Cancelled),
        result = bounded => result,
    }
}
