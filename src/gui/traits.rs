//! セッション管理層のトレイト定義
//!
//! ネットワーク（Helix / OAuth）とディスク（設定ファイル）への依存を
//! 差し替え可能にする。テストはこの2つをモックしてセッションマネージャーを
//! 検証する。

use async_trait::async_trait;

use crate::api::helix::{
    ChannelInfo, CreatePredictionRequest, HelixClient, HelixError, HelixPrediction, TwitchUser,
};
use crate::api::oauth::{self, OAuthError, TokenPair};
use crate::gui::settings_store::{EnvSettingsStore, SessionSettings, SettingsError};

/// Twitch APIの抽象インタフェース
///
/// アクセストークンは呼び出しのたびに現在のセッション状態から渡される
/// （自動注入しない。古いクロージャに閉じたトークンを避けるため）。
#[async_trait]
pub trait TwitchApi: Send + Sync {
    /// ログイン名からユーザーを取得
    async fn get_user_by_login(
        &self,
        client_id: &str,
        access_token: &str,
        login: &str,
    ) -> Result<Option<TwitchUser>, HelixError>;

    /// 直近の予測を1件取得（存在しなければNone）
    async fn get_latest_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<Option<HelixPrediction>, HelixError>;

    /// 予測を作成
    async fn create_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        request: &CreatePredictionRequest,
    ) -> Result<HelixPrediction, HelixError>;

    /// 勝者を指定して予測を確定
    async fn end_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        prediction_id: &str,
        winning_outcome_id: &str,
    ) -> Result<HelixPrediction, HelixError>;

    /// 予測をキャンセル
    async fn cancel_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        prediction_id: &str,
    ) -> Result<HelixPrediction, HelixError>;

    /// 配信中のゲームとタイトルを取得
    async fn get_channel_info(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<Option<ChannelInfo>, HelixError>;

    /// リフレッシュグラントで新しいトークンペアを取得
    async fn refresh_tokens(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, OAuthError>;

    /// 認可コードをトークンに交換
    async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenPair, OAuthError>;
}

#[async_trait]
impl TwitchApi for HelixClient {
    async fn get_user_by_login(
        &self,
        client_id: &str,
        access_token: &str,
        login: &str,
    ) -> Result<Option<TwitchUser>, HelixError> {
        HelixClient::get_user_by_login(self, client_id, access_token, login).await
    }

    async fn get_latest_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<Option<HelixPrediction>, HelixError> {
        let mut predictions = self
            .get_predictions(client_id, access_token, broadcaster_id, 1)
            .await?;
        Ok(if predictions.is_empty() {
            None
        } else {
            Some(predictions.remove(0))
        })
    }

    async fn create_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        request: &CreatePredictionRequest,
    ) -> Result<HelixPrediction, HelixError> {
        HelixClient::create_prediction(self, client_id, access_token, request).await
    }

    async fn end_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        prediction_id: &str,
        winning_outcome_id: &str,
    ) -> Result<HelixPrediction, HelixError> {
        HelixClient::end_prediction(
            self,
            client_id,
            access_token,
            broadcaster_id,
            prediction_id,
            winning_outcome_id,
        )
        .await
    }

    async fn cancel_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        prediction_id: &str,
    ) -> Result<HelixPrediction, HelixError> {
        HelixClient::cancel_prediction(self, client_id, access_token, broadcaster_id, prediction_id)
            .await
    }

    async fn get_channel_info(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<Option<ChannelInfo>, HelixError> {
        HelixClient::get_channel_info(self, client_id, access_token, broadcaster_id).await
    }

    async fn refresh_tokens(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, OAuthError> {
        oauth::refresh_access_token(self.http(), client_id, client_secret, refresh_token).await
    }

    async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenPair, OAuthError> {
        oauth::exchange_code_for_tokens(self.http(), client_id, client_secret, code, redirect_uri)
            .await
    }
}

/// 設定永続化の抽象インタフェース
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<SessionSettings, SettingsError>;
    fn save(&self, settings: &SessionSettings) -> Result<(), SettingsError>;
    fn store_oauth_state(&self, state: &str) -> Result<(), SettingsError>;
    fn take_oauth_state(&self) -> Result<Option<String>, SettingsError>;
}

impl SettingsStore for EnvSettingsStore {
    fn load(&self) -> Result<SessionSettings, SettingsError> {
        EnvSettingsStore::load(self)
    }

    fn save(&self, settings: &SessionSettings) -> Result<(), SettingsError> {
        EnvSettingsStore::save(self, settings)
    }

    fn store_oauth_state(&self, state: &str) -> Result<(), SettingsError> {
        EnvSettingsStore::store_oauth_state(self, state)
    }

    fn take_oauth_state(&self) -> Result<Option<String>, SettingsError> {
        EnvSettingsStore::take_oauth_state(self)
    }
}
