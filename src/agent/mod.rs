//! 代理連線與對話資料結構。
//!
//! 此模組負責與遠端代理管理服務互動的所有組件：設定載入、
//! 用戶端與對話串的快取、提問流程，以及在面板中顯示的對話紀錄。

/// `ask` 模組：附加訊息、執行代理並讀取回覆的流程。
pub mod ask;

/// `config` 模組：從環境變數與 `config/secrets.toml` 載入設定。
pub mod config;

/// `error` 模組：遠端服務呼叫的錯誤類型。
pub mod error;

/// `manager` 模組：用戶端工廠與每個代理的對話串快取。
pub mod manager;

/// `providers` 模組：遠端服務協定的 trait 與 REST 實作。
pub mod providers;

/// `transcript` 模組：面板中顯示的 (發言者, 文字) 紀錄。
pub mod transcript;

pub use ask::{NO_RESPONSE, ask, ask_with_deadline};
pub use config::{ConfigError, Settings, ThreadScope};
pub use error::AgentApiError;
pub use manager::{AgentManager, AgentSession, ClientFactory, SessionKey, SessionScope};
pub use providers::AgentsApi;
pub use transcript::{Speaker, Transcript, Turn};
