//! Twitchセッション設定ストア
//!
//! 資格情報とトークンをフラットな KEY=VALUE 形式（.envスタイル）で永続化する。
//! `#` で始まる行と空行は無視し、知らないキーは保存時にそのまま残す。
//! トークンのローテーションやbroadcaster id解決のたびに即座に書き戻す
//! （ライトスルー、バッファリングなし）。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const KEY_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
pub const KEY_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";
pub const KEY_CHANNEL_NAME: &str = "TWITCH_CHANNEL_NAME";
pub const KEY_REDIRECT_URI: &str = "OAUTH_REDIRECT_URI";
pub const KEY_ACCESS_TOKEN: &str = "TWITCH_ACCESS_TOKEN";
pub const KEY_REFRESH_TOKEN: &str = "TWITCH_REFRESH_TOKEN";
pub const KEY_BROADCASTER_ID: &str = "TWITCH_BROADCASTER_ID";
pub const KEY_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// プロセス寿命のあいだ生きる単一のセッション設定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSettings {
    pub client_id: String,
    pub client_secret: String,
    pub channel_name: String,
    pub redirect_uri: String,
    pub access_token: String,
    pub refresh_token: String,
    pub broadcaster_id: String,
    /// コアでは未使用。ラウンドトリップで保持するだけ
    pub openai_api_key: String,
    /// 知らないキーの保持用
    pub extra: BTreeMap<String, String>,
}

impl SessionSettings {
    /// client id / secret / channel name がそろっているか
    pub fn credentials_ready(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.channel_name.is_empty()
    }

    /// 認証付きの操作を実行できる状態か
    ///
    /// credentials_ready に加えて access/refresh トークンと broadcaster id
    /// がすべて非空であること。
    pub fn session_ready(&self) -> bool {
        self.credentials_ready()
            && !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
            && !self.broadcaster_id.is_empty()
    }

    pub fn from_map(mut map: BTreeMap<String, String>) -> Self {
        let mut take = |key: &str| map.remove(key).unwrap_or_default();
        Self {
            client_id: take(KEY_CLIENT_ID),
            client_secret: take(KEY_CLIENT_SECRET),
            channel_name: take(KEY_CHANNEL_NAME),
            redirect_uri: take(KEY_REDIRECT_URI),
            access_token: take(KEY_ACCESS_TOKEN),
            refresh_token: take(KEY_REFRESH_TOKEN),
            broadcaster_id: take(KEY_BROADCASTER_ID),
            openai_api_key: take(KEY_OPENAI_API_KEY),
            extra: map,
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();
        map.insert(KEY_CLIENT_ID.to_string(), self.client_id.clone());
        map.insert(KEY_CLIENT_SECRET.to_string(), self.client_secret.clone());
        map.insert(KEY_CHANNEL_NAME.to_string(), self.channel_name.clone());
        map.insert(KEY_REDIRECT_URI.to_string(), self.redirect_uri.clone());
        map.insert(KEY_ACCESS_TOKEN.to_string(), self.access_token.clone());
        map.insert(KEY_REFRESH_TOKEN.to_string(), self.refresh_token.clone());
        map.insert(KEY_BROADCASTER_ID.to_string(), self.broadcaster_id.clone());
        map.insert(KEY_OPENAI_API_KEY.to_string(), self.openai_api_key.clone());
        map
    }
}

/// KEY=VALUE 形式のテキストをパースする
///
/// 行頭トリム後に `#` で始まる行と空行は無視。値に `=` を含められるよう、
/// 最初の `=` でのみ分割する。
pub fn parse_env(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// KEY=VALUE 形式のテキストに直列化する（キーの辞書順で安定）
pub fn serialize_env(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// .envファイルベースの設定ストア
#[derive(Debug, Clone)]
pub struct EnvSettingsStore {
    settings_path: PathBuf,
    state_path: PathBuf,
}

impl EnvSettingsStore {
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        let settings_path = settings_path.into();
        // OAuthのstateノンスは設定ファイルの隣に置く
        let state_path = settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".oauth_state");
        Self {
            settings_path,
            state_path,
        }
    }

    /// カレントディレクトリの .env を使う（既定）
    pub fn with_default_path() -> Self {
        Self::new(".env")
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// 設定を読み込む。ファイルがなければ空の設定を返す
    pub fn load(&self) -> Result<SessionSettings, SettingsError> {
        if !self.settings_path.exists() {
            tracing::info!(
                "📄 Settings file not found, starting empty: {}",
                self.settings_path.display()
            );
            return Ok(SessionSettings::default());
        }
        let contents = fs::read_to_string(&self.settings_path)?;
        Ok(SessionSettings::from_map(parse_env(&contents)))
    }

    /// 設定を書き戻す（ライトスルー）
    pub fn save(&self, settings: &SessionSettings) -> Result<(), SettingsError> {
        fs::write(&self.settings_path, serialize_env(&settings.to_map()))?;
        tracing::debug!("💾 Settings saved to {}", self.settings_path.display());
        Ok(())
    }

    /// 認可フロー開始時にstateノンスを保存する
    pub fn store_oauth_state(&self, state: &str) -> Result<(), SettingsError> {
        fs::write(&self.state_path, state)?;
        Ok(())
    }

    /// 保存済みのstateノンスを取り出してクリアする（1回限り）
    pub fn take_oauth_state(&self) -> Result<Option<String>, SettingsError> {
        if !self.state_path.exists() {
            return Ok(None);
        }
        let stored = fs::read_to_string(&self.state_path)?.trim().to_string();
        fs::write(&self.state_path, "")?;
        Ok(if stored.is_empty() { None } else { Some(stored) })
    }
}
