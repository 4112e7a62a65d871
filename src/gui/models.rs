use serde::{Deserialize, Serialize};

use crate::api::helix::{HelixPrediction, PredictionStatus};

/// GUI用の予測スナップショット（進行中または直近の予測）
///
/// ブートストラップとポーラーが丸ごと差し替える。end/cancel成功直後のみ
/// statusをローカルで楽観的に書き換え、次のポーリングで上書きされる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionSnapshot {
    pub id: String,
    pub title: String,
    pub outcomes: Vec<SnapshotOutcome>,
    pub prediction_window: u32,
    pub status: PredictionStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotOutcome {
    pub id: String,
    pub title: String,
    pub color: String,
}

impl PredictionSnapshot {
    /// ACTIVE / LOCKED のあいだだけ end / cancel の対象になる
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

impl From<HelixPrediction> for PredictionSnapshot {
    fn from(prediction: HelixPrediction) -> Self {
        Self {
            id: prediction.id,
            title: prediction.title,
            outcomes: prediction
                .outcomes
                .into_iter()
                .map(|outcome| SnapshotOutcome {
                    id: outcome.id,
                    title: outcome.title,
                    color: outcome.color,
                })
                .collect(),
            prediction_window: prediction.prediction_window,
            status: prediction.status,
            created_at: prediction.created_at,
        }
    }
}

/// セッションの進行状態
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// 起動直後、ブートストラップ前
    #[default]
    Idle,
    /// ブートストラップ実行中
    Bootstrapping,
    /// client id / secret / channel name のいずれかが未設定
    NotConfigured,
    /// 資格情報はあるがトークンがない（認可フロー待ち）
    AwaitingAuthorization,
    /// ブラウザでの認可フロー進行中
    Authorizing,
    /// セッション確立済み（ポーリング対象）
    Ready,
    Error(String),
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Starting…",
            SessionState::Bootstrapping => "Connecting…",
            SessionState::NotConfigured => "Not configured",
            SessionState::AwaitingAuthorization => "Authorization required",
            SessionState::Authorizing => "Waiting for Twitch…",
            SessionState::Ready => "Connected",
            SessionState::Error(_) => "Error",
        }
    }
}

/// 表示中のビュー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    MainMenu,
    CreatePrediction,
    MyPredictions,
    Settings,
}

impl Default for ActiveView {
    fn default() -> Self {
        ActiveView::MainMenu
    }
}

impl ActiveView {
    pub fn label(&self) -> &'static str {
        match self {
            ActiveView::MainMenu => "Overview",
            ActiveView::CreatePrediction => "Create Prediction",
            ActiveView::MyPredictions => "My Predictions",
            ActiveView::Settings => "Settings",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActiveView::MainMenu => "🏠",
            ActiveView::CreatePrediction => "✏️",
            ActiveView::MyPredictions => "📋",
            ActiveView::Settings => "⚙️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::helix::PredictionOutcome;

    fn sample_prediction(status: PredictionStatus) -> HelixPrediction {
        HelixPrediction {
            id: "pred-1".to_string(),
            title: "Win the next round?".to_string(),
            outcomes: vec![
                PredictionOutcome {
                    id: "out-1".to_string(),
                    title: "Yes".to_string(),
                    color: "BLUE".to_string(),
                },
                PredictionOutcome {
                    id: "out-2".to_string(),
                    title: "No".to_string(),
                    color: "PINK".to_string(),
                },
            ],
            prediction_window: 90,
            status,
            created_at: None,
        }
    }

    #[test]
    fn test_snapshot_conversion_preserves_outcome_order() {
        let snapshot = PredictionSnapshot::from(sample_prediction(PredictionStatus::Active));
        assert_eq!(snapshot.id, "pred-1");
        assert_eq!(snapshot.outcomes[0].title, "Yes");
        assert_eq!(snapshot.outcomes[1].title, "No");
        assert!(snapshot.is_running());
    }

    #[test]
    fn test_snapshot_terminal_states_not_running() {
        let resolved = PredictionSnapshot::from(sample_prediction(PredictionStatus::Resolved));
        let canceled = PredictionSnapshot::from(sample_prediction(PredictionStatus::Canceled));
        assert!(!resolved.is_running());
        assert!(!canceled.is_running());
    }

    #[test]
    fn test_active_view_labels() {
        assert_eq!(ActiveView::default(), ActiveView::MainMenu);
        assert_eq!(ActiveView::Settings.label(), "Settings");
        assert_eq!(ActiveView::CreatePrediction.icon(), "✏️");
    }
}
