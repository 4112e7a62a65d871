// Core modules
pub mod config_manager;
pub mod models;
pub mod services; // セッションサービス（ブートストラップ・ポーラー・アクション）
pub mod settings_store; // Twitch資格情報ストア（KEY=VALUE形式）
pub mod traits; // トレイトベース設計
pub mod utils; // ログ初期化・ユーティリティ

// Dioxus UI components
pub mod components;
pub mod hooks;
pub mod styles;

// New state management modules
pub mod session_service;
pub mod state_management;

pub use models::{ActiveView, PredictionSnapshot, SessionState};
pub use services::TwitchSessionService;
pub use session_service::{get_session_service, SessionActions};
pub use state_management::{get_state_manager, AppEvent, StateManager};

pub use components::MainWindow;

/// GUI層のエラー型
#[derive(thiserror::Error, Debug)]
pub enum GuiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("State management error: {0}")]
    StateManagement(String),

    #[error("Session error: {0}")]
    Session(String),
}
