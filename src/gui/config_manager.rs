//! アプリケーション設定管理モジュール
//!
//! XDGディレクトリを使用した設定ファイルの永続化と管理を提供します。
//! Twitchの資格情報・トークンはここではなく KEY=VALUE 形式の設定ストア
//! （settings_store）に保存される。こちらはウィンドウ位置やログ、
//! ポーリング周期などアプリ側の設定のみ。

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::gui::services::DEFAULT_POLL_INTERVAL_SECS;

/// ウィンドウ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub maximized: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 720,
            x: 100,
            y: 100,
            maximized: false,
        }
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// カスタムログディレクトリ（Noneの場合はXDGデフォルト使用）
    pub log_dir: Option<PathBuf>,
    /// ログレベル (trace/debug/info/warn/error)
    pub log_level: String,
    /// ファイル出力有効化
    pub enable_file_logging: bool,
    /// 保存するログファイル数上限
    pub max_log_files: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            log_level: "info".to_string(),
            enable_file_logging: true,
            max_log_files: 14,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Twitch設定ファイル（KEY=VALUE形式）のパス
    pub settings_file: String,

    /// 予測ドラフトのJSONファイルパス（Noneの場合はXDGデータディレクトリ）
    pub drafts_file: Option<PathBuf>,

    /// スナップショットのポーリング周期（秒）
    pub poll_interval_secs: u64,

    /// ウィンドウ設定
    #[serde(default)]
    pub window: WindowConfig,

    /// ログ設定
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_file: ".env".to_string(),
            drafts_file: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            window: WindowConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 設定管理マネージャー
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        // 設定ディレクトリを作成（存在しない場合）
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        Ok(Self { config_path })
    }

    /// XDGディレクトリに基づく設定ファイルパスを取得
    fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("io", "twipred", "twipred")
            .context("Failed to get project directories")?;

        let config_file = project_dirs.config_dir().join("config.toml");
        debug!("Config file path: {}", config_file.display());
        Ok(config_file)
    }

    /// 設定を読み込み
    pub fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Config file not found, using default settings: {}",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let config_content = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config: AppConfig = toml::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse config file: {}",
                self.config_path.display()
            )
        })?;

        info!(
            "✅ Configuration loaded from: {}",
            self.config_path.display()
        );
        Ok(config)
    }

    /// 設定を保存
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let config_content =
            toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, config_content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;

        info!("💾 Configuration saved to: {}", self.config_path.display());
        Ok(())
    }

    /// 設定ファイルパスを取得（デバッグ用）
    pub fn get_config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// 設定をリセット（デフォルト値に戻す）
    pub fn reset_config(&self) -> Result<()> {
        self.save_config(&AppConfig::default())?;
        info!("🔄 Configuration reset to defaults");
        Ok(())
    }

    /// 設定ファイルが存在するかチェック
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}

/// グローバル設定マネージャーインスタンス
static CONFIG_MANAGER: std::sync::OnceLock<std::sync::Mutex<ConfigManager>> =
    std::sync::OnceLock::new();

/// グローバル設定マネージャーを取得
pub fn get_config_manager() -> &'static std::sync::Mutex<ConfigManager> {
    CONFIG_MANAGER.get_or_init(|| {
        debug!("🏗️ Creating global config manager");
        match ConfigManager::new() {
            Ok(manager) => std::sync::Mutex::new(manager),
            Err(e) => {
                warn!("❌ Failed to create config manager, using default: {}", e);
                // フォールバック用の基本的なパスを使用
                let fallback_path = std::env::current_dir()
                    .unwrap_or_default()
                    .join("twipred_config.toml");
                std::sync::Mutex::new(ConfigManager {
                    config_path: fallback_path,
                })
            }
        }
    })
}

/// 設定を非同期で保存（GUI用）
pub fn save_config_async(config: AppConfig) {
    tokio::spawn(async move {
        let manager = get_config_manager();
        if let Ok(manager_guard) = manager.lock() {
            if let Err(e) = manager_guard.save_config(&config) {
                warn!("❌ Failed to save config: {}", e);
            }
        }
    });
}

/// 現在の設定をグローバルに取得（サービス側で使用）
pub fn get_current_config() -> Option<AppConfig> {
    let manager = get_config_manager();
    if let Ok(manager_guard) = manager.lock() {
        manager_guard.load_config().ok()
    } else {
        None
    }
}
