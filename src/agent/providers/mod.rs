//! `providers` 模組負責與遠端代理服務通訊的具體實作。
//!
//! `AgentsApi` trait 抽象化了遠端代理管理服務的協定（建立對話串、附加訊息、
//! 執行並等待、讀取最後一則訊息），讓 UI 與測試都不需要知道 HTTP 細節。

/// `azure` 模組：透過 REST API 與 Azure AI Agents 服務通訊的實作。
pub mod azure;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::agent::error::AgentApiError;
use azure::models::{AgentDescriptor, MessageRole, RunObject, ThreadMessage};

/// 遠端代理服務的通用介面。
///
/// 所有方法都會改變或讀取遠端狀態；實作不得自行重試。
#[async_trait]
pub trait AgentsApi: Send + Sync {
    /// 取得代理的描述資料。
    async fn get_agent(&self, agent_id: &str) -> Result<AgentDescriptor, AgentApiError>;

    /// 建立一個新的對話串，回傳其 ID。
    async fn create_thread(&self) -> Result<String, AgentApiError>;

    /// 在對話串中附加一則訊息。
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AgentApiError>;

    /// 觸發一次執行，並等待它到達終止狀態。
    async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<RunObject, AgentApiError>;

    /// 回傳指定角色最新的一則訊息；若不存在則回傳 `None`。
    async fn get_last_message_by_role(
        &self,
        thread_id: &str,
        role: MessageRole,
    ) -> Result<Option<ThreadMessage>, AgentApiError>;
}
