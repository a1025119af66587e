//! UI 面板的狀態：對話面板與其輸入列。

/// `chat` 模組：單一代理分頁的對話紀錄、輸入與生命週期。
pub mod chat;
/// `input` 模組：單行文字輸入的游標與歷史紀錄。
pub mod input;

pub use chat::{ChatPanel, PanelStatus, Submission};
pub use input::InputLine;
