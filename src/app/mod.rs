//! `app` 模組是應用程式的核心。
//!
//! 它負責管理兩個代理分頁的狀態、處理鍵盤輸入，
//! 並把背景代理工作的結果套用到面板上。

/// `agent` 模組：啟動代理連線、提交提問、套用背景事件。
mod agent;
/// `init` 模組：負責 `App` 結構的初始化。
mod init;
/// `keyboard` 模組：專門處理所有的鍵盤輸入事件。
mod keyboard;
/// `state` 模組：定義了 `App` 結構以及核心的狀態類型。
mod state;
/// `tick` 模組：處理應用程式的定時更新事件（tick）。
mod tick;

pub use init::{GAP_HEADER, GAP_TAB_LABEL, PRICE_HEADER, PRICE_TAB_LABEL};
pub use state::{App, AppEvent, PanelId};
