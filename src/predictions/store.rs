//! 予測ドラフトのローカルストア
//!
//! JSONファイル1枚にドラフトのリストを保存する。書き込み前に
//! スキーマ検証を通し、壊れたドラフトがディスクに乗らないようにする。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

use crate::predictions::draft::PredictionDraft;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse drafts file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidDraft(#[from] crate::predictions::draft::DraftError),
}

/// JSONファイルベースのドラフトストア
#[derive(Debug, Clone)]
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// XDGデータディレクトリの既定パスを使う
    pub fn with_default_path() -> anyhow::Result<Self> {
        let project_dirs = directories::ProjectDirs::from("io", "twipred", "twipred")
            .context("Failed to get project directories")?;
        let data_dir = project_dirs.data_dir();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Self::new(data_dir.join("my_predictions.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存済みドラフトをすべて読み込む。ファイルがなければ空
    pub fn load(&self) -> Result<Vec<PredictionDraft>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_all(&self, drafts: &[PredictionDraft]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(drafts)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// ドラフトを検証してから追記する
    pub fn append(&self, draft: &PredictionDraft) -> Result<(), StoreError> {
        draft.validate()?;
        let mut drafts = self.load()?;
        drafts.push(draft.clone());
        self.save_all(&drafts)?;
        tracing::info!("💾 Draft saved: {} ({})", draft.title, draft.id);
        Ok(())
    }

    /// idで1件削除する。見つかって消せたらtrue
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut drafts = self.load()?;
        let before = drafts.len();
        drafts.retain(|draft| draft.id != id);
        if drafts.len() == before {
            return Ok(false);
        }
        self.save_all(&drafts)?;
        tracing::info!("🗑️ Draft deleted: {}", id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictions::draft::DraftError;
    use tempfile::tempdir;

    fn sample_draft(title: &str) -> PredictionDraft {
        PredictionDraft {
            id: Uuid::new_v4(),
            title: title.to_string(),
            outcomes: vec!["Yes".to_string(), "No".to_string()],
            prediction_window: Some(90),
        }
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let dir = tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("drafts.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_reload() {
        let dir = tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("drafts.json"));

        let first = sample_draft("First prediction");
        let second = sample_draft("Second prediction");
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let drafts = store.load().unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0], first);
        assert_eq!(drafts[1], second);
    }

    #[test]
    fn test_append_rejects_invalid_draft() {
        let dir = tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("drafts.json"));

        let mut invalid = sample_draft("Bad draft");
        invalid.outcomes.truncate(1);

        let result = store.append(&invalid);
        assert!(matches!(
            result,
            Err(StoreError::InvalidDraft(DraftError::TooFewOutcomes(1)))
        ));
        // 無効なドラフトはディスクに乗らない
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_delete_by_id() {
        let dir = tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("drafts.json"));

        let keep = sample_draft("Keep me");
        let remove = sample_draft("Remove me");
        store.append(&keep).unwrap();
        store.append(&remove).unwrap();

        assert!(store.delete(remove.id).unwrap());
        let drafts = store.load().unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, keep.id);

        // 2回目は見つからない
        assert!(!store.delete(remove.id).unwrap());
    }

    #[test]
    fn test_load_corrupted_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drafts.json");
        fs::write(&path, "not json at all").unwrap();

        let store = DraftStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Parse(_))));
    }
}
