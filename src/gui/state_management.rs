use crate::api::helix::{ChannelInfo, PredictionStatus};
use crate::gui::models::{PredictionSnapshot, SessionState};
use crate::gui::settings_store::SessionSettings;
use crate::gui::GuiError;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::mpsc;

/// アプリケーション全体の状態イベント
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// セッション設定が読み込み直された / 書き換えられた
    SettingsUpdated(SessionSettings),
    /// セッション状態が変更された
    SessionStateChanged(SessionState),
    /// スナップショットが丸ごと差し替えられた（seqはフェッチ採番）
    SnapshotReplaced {
        seq: u64,
        snapshot: Option<PredictionSnapshot>,
    },
    /// end/cancel成功直後の楽観的なstatus書き換え
    SnapshotStatusPatched {
        prediction_id: String,
        status: PredictionStatus,
    },
    /// チャンネル情報（ゲーム名・配信タイトル）が更新された
    ChannelInfoUpdated(Option<ChannelInfo>),
    /// ポーラーの稼働状態が変更された
    PollerStateChanged { is_running: bool },
}

/// アプリケーションの状態
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub settings: SessionSettings,
    pub session_state: SessionState,
    pub snapshot: Option<PredictionSnapshot>,
    /// 採用済みスナップショットのフェッチ採番（遅れて返った古い結果の破棄用）
    pub snapshot_seq: u64,
    pub channel_info: Option<ChannelInfo>,
    pub poller_running: bool,
}

impl AppState {
    /// seqガード付きのスナップショット差し替え
    ///
    /// 既に採用した採番より古いフェッチ結果は破棄する。成功したフェッチは
    /// 丸ごと差し替え（マージしない）。
    pub fn apply_snapshot(&mut self, seq: u64, snapshot: Option<PredictionSnapshot>) -> bool {
        if seq < self.snapshot_seq {
            tracing::debug!(
                "⏭️ Discarding stale snapshot fetch (seq {} < {})",
                seq,
                self.snapshot_seq
            );
            return false;
        }
        self.snapshot_seq = seq;
        self.snapshot = snapshot;
        true
    }

    /// idが一致する場合のみstatusをその場で書き換える
    pub fn patch_snapshot_status(&mut self, prediction_id: &str, status: PredictionStatus) -> bool {
        match self.snapshot.as_mut() {
            Some(snapshot) if snapshot.id == prediction_id => {
                snapshot.status = status;
                true
            }
            _ => false,
        }
    }
}

/// イベント駆動状態マネージャー
pub struct StateManager {
    state: Arc<Mutex<AppState>>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl StateManager {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(AppState::default()));

        // イベント処理ループをすぐに開始
        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            tracing::debug!("🚀 StateManager event loop started");
            Self::run_event_loop(state_clone, event_receiver).await;
        });

        Self {
            state,
            event_sender,
        }
    }

    async fn run_event_loop(
        state: Arc<Mutex<AppState>>,
        mut event_receiver: mpsc::UnboundedReceiver<AppEvent>,
    ) {
        while let Some(event) = event_receiver.recv().await {
            Self::handle_event_static(&state, event);
        }
        tracing::info!("🏁 StateManager event loop stopped");
    }

    /// 現在の状態を取得
    pub fn get_state(&self) -> Result<AppState, GuiError> {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| {
                GuiError::StateManagement(
                    "Failed to acquire state lock (mutex poisoned)".to_string(),
                )
            })
    }

    /// 現在の状態を取得（ロック破損時はデフォルトへフォールバック）
    pub fn get_state_unchecked(&self) -> AppState {
        match self.get_state() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("⚠️ State lock poisoned, returning default state: {}", e);
                AppState::default()
            }
        }
    }

    /// イベントを送信
    pub fn send_event(&self, event: AppEvent) -> Result<(), mpsc::error::SendError<AppEvent>> {
        tracing::debug!("📤 Sending event: {:?}", std::mem::discriminant(&event));
        self.event_sender.send(event)
    }

    fn handle_event_static(state: &Arc<Mutex<AppState>>, event: AppEvent) {
        let mut state_guard = match state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("⚠️ State mutex poisoned during event handling, recovering data");
                poisoned.into_inner()
            }
        };

        match event {
            AppEvent::SettingsUpdated(settings) => {
                tracing::debug!("🔑 Session settings updated");
                state_guard.settings = settings;
            }

            AppEvent::SessionStateChanged(new_state) => {
                tracing::info!("🔄 Session state changed: {:?}", new_state);
                state_guard.session_state = new_state;
            }

            AppEvent::SnapshotReplaced { seq, snapshot } => {
                if state_guard.apply_snapshot(seq, snapshot) {
                    tracing::debug!("📋 Prediction snapshot replaced (seq {})", seq);
                }
            }

            AppEvent::SnapshotStatusPatched {
                prediction_id,
                status,
            } => {
                if state_guard.patch_snapshot_status(&prediction_id, status) {
                    tracing::info!("✏️ Snapshot {} patched to {}", prediction_id, status);
                } else {
                    tracing::debug!(
                        "⏭️ Status patch skipped, snapshot id mismatch: {}",
                        prediction_id
                    );
                }
            }

            AppEvent::ChannelInfoUpdated(info) => {
                tracing::debug!("📺 Channel info updated: {:?}", info);
                state_guard.channel_info = info;
            }

            AppEvent::PollerStateChanged { is_running } => {
                tracing::info!("⏱️ Poller running: {}", is_running);
                state_guard.poller_running = is_running;
            }
        }
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// グローバル状態マネージャー
static STATE_MANAGER: OnceLock<Arc<StateManager>> = OnceLock::new();

/// グローバル状態マネージャーを取得
pub fn get_state_manager() -> Arc<StateManager> {
    STATE_MANAGER
        .get_or_init(|| {
            tracing::debug!("🏗️ Creating global state manager");
            Arc::new(StateManager::new())
        })
        .clone()
}
