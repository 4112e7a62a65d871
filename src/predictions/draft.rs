//! 予測ドラフト
//!
//! ユーザーが作成してローカルに保存する送信前の予測。Twitch側の制約
//! （タイトル長・アウトカム数・ウィンドウ秒数）は保存前と開始前の両方で
//! 検証する。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 45;
pub const OUTCOME_MAX_LEN: usize = 25;
pub const OUTCOMES_MIN: usize = 2;
pub const OUTCOMES_MAX: usize = 10;
pub const WINDOW_MIN_SECS: u32 = 30;
pub const WINDOW_MAX_SECS: u32 = 1800;
pub const WINDOW_DEFAULT_SECS: u32 = 90;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DraftError {
    #[error("Title must be between 3 and 45 characters (got {0})")]
    TitleLength(usize),

    #[error("A prediction requires at least 2 unique outcomes (got {0})")]
    TooFewOutcomes(usize),

    #[error("A prediction allows at most 10 outcomes (got {0})")]
    TooManyOutcomes(usize),

    #[error("Outcome \"{0}\" exceeds 25 characters")]
    OutcomeTooLong(String),

    #[error("Prediction window must be between 30 and 1800 seconds (got {0})")]
    WindowOutOfRange(u32),

    #[error("Prediction window is not a number: \"{0}\"")]
    WindowNotANumber(String),
}

/// ユーザー作成の予測ドラフト
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionDraft {
    pub id: Uuid,
    pub title: String,
    pub outcomes: Vec<String>,
    /// 省略時は開始時に90秒が使われる
    #[serde(default)]
    pub prediction_window: Option<u32>,
}

impl PredictionDraft {
    /// フォーム入力からドラフトを組み立てる
    ///
    /// アウトカムはカンマ区切り。トリムして空要素を除き、順序を保って
    /// 重複を落とす。ウィンドウは空文字で「未指定」。
    pub fn from_form(title: &str, outcomes_csv: &str, window: &str) -> Result<Self, DraftError> {
        let mut outcomes: Vec<String> = Vec::new();
        for outcome in outcomes_csv.split(',') {
            let outcome = outcome.trim();
            if outcome.is_empty() || outcomes.iter().any(|o| o == outcome) {
                continue;
            }
            outcomes.push(outcome.to_string());
        }

        let window = window.trim();
        let prediction_window = if window.is_empty() {
            None
        } else {
            Some(
                window
                    .parse::<u32>()
                    .map_err(|_| DraftError::WindowNotANumber(window.to_string()))?,
            )
        };

        let draft = Self {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            outcomes,
            prediction_window,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Twitch側の制約に照らして検証する
    pub fn validate(&self) -> Result<(), DraftError> {
        let title_len = self.title.chars().count();
        if title_len < TITLE_MIN_LEN || title_len > TITLE_MAX_LEN {
            return Err(DraftError::TitleLength(title_len));
        }

        if self.outcomes.len() < OUTCOMES_MIN {
            return Err(DraftError::TooFewOutcomes(self.outcomes.len()));
        }
        if self.outcomes.len() > OUTCOMES_MAX {
            return Err(DraftError::TooManyOutcomes(self.outcomes.len()));
        }
        for outcome in &self.outcomes {
            if outcome.chars().count() > OUTCOME_MAX_LEN {
                return Err(DraftError::OutcomeTooLong(outcome.clone()));
            }
        }

        if let Some(window) = self.prediction_window {
            if !(WINDOW_MIN_SECS..=WINDOW_MAX_SECS).contains(&window) {
                return Err(DraftError::WindowOutOfRange(window));
            }
        }
        Ok(())
    }

    /// 実際に使われるウィンドウ秒数（未指定なら90）
    pub fn effective_window(&self) -> u32 {
        self.prediction_window.unwrap_or(WINDOW_DEFAULT_SECS)
    }
}
