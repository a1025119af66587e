use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use tokio::sync::OnceCell;

use crate::agent::config::{Settings, ThreadScope};
use crate::agent::error::AgentApiError;
use crate::agent::providers::AgentsApi;
use crate::agent::providers::azure::AgentsClient;
use crate::agent::providers::azure::models::AgentDescriptor;

type BuildClient = dyn Fn() -> Result<Arc<dyn AgentsApi>, AgentApiError> + Send + Sync;

/// Builds the remote client on first use and hands out the same handle afterwards.
pub struct ClientFactory {
    build: Box<BuildClient>,
    client: OnceCell<Arc<dyn AgentsApi>>,
}

impl ClientFactory {
    /// Factory for the REST client described by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let settings = settings.clone();
        Self::with_builder(move || {
            let client = AgentsClient::from_settings(&settings)?;
            Ok(Arc::new(client) as Arc<dyn AgentsApi>)
        })
    }

    pub fn with_builder<F>(build: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn AgentsApi>, AgentApiError> + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
            client: OnceCell::new(),
        }
    }

    /// Returns the shared client, constructing it on the first call.
    ///
    /// A failed construction is not cached.
    pub async fn get_client(&self) -> Result<Arc<dyn AgentsApi>, AgentApiError> {
        self.client
            .get_or_try_init(|| async { (self.build)() })
            .await
            .cloned()
    }
}

/// Identity under which a remote thread is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub agent_id: String,
    pub scope: SessionScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionScope {
    /// Shared by everyone in this process.
    Process,
    /// Private to one UI session.
    Session(String),
}

/// Client, agent descriptor and remote thread for one agent.
pub struct AgentSession {
    pub client: Arc<dyn AgentsApi>,
    pub agent: AgentDescriptor,
    pub thread_id: String,
}

impl fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSession")
            .field("agent", &self.agent)
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

/// Owns the client factory and the per-key session cache.
///
/// `init_agent` creates at most one remote thread per [`SessionKey`]; callers
/// racing on the same key wait for the first one to finish.
pub struct AgentManager {
    factory: ClientFactory,
    agent_ids: Vec<String>,
    scope: ThreadScope,
    sessions: Mutex<HashMap<SessionKey, Arc<OnceCell<Arc<AgentSession>>>>>,
}

impl AgentManager {
    pub fn new(factory: ClientFactory, agent_ids: Vec<String>, scope: ThreadScope) -> Self {
        Self {
            factory,
            agent_ids,
            scope,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ClientFactory::from_settings(settings),
            settings.agent_ids().iter().map(|id| id.to_string()).collect(),
            settings.thread_scope,
        )
    }

    /// Cache key for `agent_id` as seen from UI session `session_id`.
    pub fn key_for(&self, agent_id: &str, session_id: &str) -> SessionKey {
        let scope = match self.scope {
            ThreadScope::Process => SessionScope::Process,
            ThreadScope::Session => SessionScope::Session(session_id.to_string()),
        };
        SessionKey {
            agent_id: agent_id.to_string(),
            scope,
        }
    }

    /// Returns the session for `key`, fetching the agent and creating its
    /// thread on first use.
    pub async fn init_agent(&self, key: &SessionKey) -> Result<Arc<AgentSession>, AgentApiError> {
        if !self.agent_ids.iter().any(|id| id == &key.agent_id) {
            return Err(AgentApiError::UnknownAgent(key.agent_id.clone()));
        }

        let cell = {
            let mut sessions = self
                .sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            sessions.entry(key.clone()).or_default().clone()
        };

        let session = cell
            .get_or_try_init(|| async {
                debug!("Initializing session for {:?}", key);
                let client = self.factory.get_client().await?;
                let agent = client.get_agent(&key.agent_id).await?;
                let thread_id = client.create_thread().await?;
                info!(
                    "Agent {} bound to thread {} ({:?})",
                    agent.id, thread_id, key.scope
                );
                Ok::<_, AgentApiError>(Arc::new(AgentSession {
                    client,
                    agent,
                    thread_id,
                }))
            })
            .await?;
        Ok(Arc::clone(session))
    }
}
