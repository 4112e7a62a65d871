// Twitchセッションサービス層
//
// ブートストラップ・スナップショットポーラー・予測アクションのファサード。
// ネットワークは TwitchApi、ディスクは SettingsStore のトレイト越しに触る。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::api::helix::CreatePredictionRequest;
use crate::api::helix::PredictionStatus;
use crate::api::oauth::{self, CallbackQuery, OAuthError};
use crate::api::request::{send_with_refresh, RequestError};
use crate::gui::models::{PredictionSnapshot, SessionState};
use crate::gui::settings_store::SessionSettings;
use crate::gui::state_management::{AppEvent, StateManager};
use crate::gui::traits::{SettingsStore, TwitchApi};
use crate::predictions::PredictionDraft;

/// ポーリング周期の既定値（秒）
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// セッションの共有コア
///
/// ポーラータスクとUI起点のアクションが同じ設定・採番を共有するため、
/// サービス本体とは分けてArcで持ち回す。
pub struct SessionCore {
    api: Arc<dyn TwitchApi>,
    store: Arc<dyn SettingsStore>,
    /// プロセスで唯一のセッション設定。ネットワーク呼び出しの直前に
    /// 毎回読み直す（古いクロージャに閉じ込めない）
    settings: RwLock<SessionSettings>,
    state: Arc<StateManager>,
    /// スナップショットフェッチの採番（開始時に採番、古い応答は破棄）
    fetch_seq: AtomicU64,
}

impl SessionCore {
    pub fn settings(&self) -> SessionSettings {
        self.settings.read().clone()
    }

    pub fn session_ready(&self) -> bool {
        self.settings.read().session_ready()
    }

    fn set_session_state(&self, new_state: SessionState) {
        let _ = self
            .state
            .send_event(AppEvent::SessionStateChanged(new_state));
    }

    fn publish_settings(&self) {
        let snapshot = self.settings.read().clone();
        let _ = self.state.send_event(AppEvent::SettingsUpdated(snapshot));
    }

    fn ensure_ready(&self) -> anyhow::Result<()> {
        if !self.session_ready() {
            anyhow::bail!("session is not ready, authenticated calls are not allowed");
        }
        Ok(())
    }

    /// リフレッシュグラントで新しいトークンを取得し、コミットして永続化する
    ///
    /// トークンの書き換えは検証済みの成功レスポンスを受けてからのみ行う。
    /// 永続化の失敗はリトライを止めない（メモリ上のトークンは有効なため）。
    async fn refresh_and_persist(&self) -> Result<(), OAuthError> {
        let (client_id, client_secret, refresh_token) = {
            let settings = self.settings.read();
            (
                settings.client_id.clone(),
                settings.client_secret.clone(),
                settings.refresh_token.clone(),
            )
        };

        let pair = self
            .api
            .refresh_tokens(&client_id, &client_secret, &refresh_token)
            .await?;

        {
            let mut settings = self.settings.write();
            settings.access_token = pair.access_token;
            settings.refresh_token = pair.refresh_token;
        }
        let snapshot = self.settings.read().clone();
        if let Err(e) = self.store.save(&snapshot) {
            tracing::warn!("⚠️ Failed to persist rotated tokens: {}", e);
        }
        let _ = self.state.send_event(AppEvent::SettingsUpdated(snapshot));

        tracing::info!("🔑 Access token refreshed");
        Ok(())
    }

    /// channel_nameからbroadcaster idを解決して設定に書き込む
    ///
    /// 空の結果は失敗として報告するだけで自動リトライはしない。
    async fn resolve_broadcaster_id(&self) -> Result<bool, RequestError> {
        let api = Arc::clone(&self.api);
        let user = send_with_refresh(
            || {
                let api = Arc::clone(&api);
                let settings = self.settings.read().clone();
                async move {
                    api.get_user_by_login(
                        &settings.client_id,
                        &settings.access_token,
                        &settings.channel_name,
                    )
                    .await
                }
            },
            || self.refresh_and_persist(),
        )
        .await?;

        match user {
            Some(user) => {
                tracing::info!("👤 Resolved broadcaster id {} ({})", user.id, user.display_name);
                self.settings.write().broadcaster_id = user.id;
                self.publish_settings();
                Ok(true)
            }
            None => {
                tracing::warn!("❓ Channel not found on Twitch");
                Ok(false)
            }
        }
    }

    /// 最新の予測スナップショットを取得して差し替える
    ///
    /// 採番はフェッチ開始時に取り、応答が既採用の採番より古ければ
    /// StateManager側で破棄される（last-write-wins + seqガード）。
    pub async fn fetch_latest_snapshot(
        &self,
    ) -> Result<Option<PredictionSnapshot>, RequestError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let api = Arc::clone(&self.api);

        let prediction = send_with_refresh(
            || {
                let api = Arc::clone(&api);
                let settings = self.settings.read().clone();
                async move {
                    api.get_latest_prediction(
                        &settings.client_id,
                        &settings.access_token,
                        &settings.broadcaster_id,
                    )
                    .await
                }
            },
            || self.refresh_and_persist(),
        )
        .await?;

        let snapshot = prediction.map(PredictionSnapshot::from);
        let _ = self.state.send_event(AppEvent::SnapshotReplaced {
            seq,
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// チャンネル情報（ゲーム名・タイトル）を取得して状態へ流す
    async fn fetch_channel_info(&self) -> Result<(), RequestError> {
        let api = Arc::clone(&self.api);
        let info = send_with_refresh(
            || {
                let api = Arc::clone(&api);
                let settings = self.settings.read().clone();
                async move {
                    api.get_channel_info(
                        &settings.client_id,
                        &settings.access_token,
                        &settings.broadcaster_id,
                    )
                    .await
                }
            },
            || self.refresh_and_persist(),
        )
        .await?;

        let _ = self.state.send_event(AppEvent::ChannelInfoUpdated(info));
        Ok(())
    }

    /// 予測を開始する
    ///
    /// ドラフトはネットワークに出る前にローカル検証する。成功時は作成
    /// レスポンスからマージせず、最新スナップショットを取り直す
    /// （情報源をポーラーと同じ1本に保つ）。失敗時はローカル状態を変えない。
    pub async fn start_prediction(&self, draft: &PredictionDraft) -> anyhow::Result<()> {
        draft.validate()?;
        self.ensure_ready()?;

        let request = {
            let settings = self.settings.read();
            CreatePredictionRequest::new(
                &settings.broadcaster_id,
                &draft.title,
                &draft.outcomes,
                draft.effective_window(),
            )
        };

        let api = Arc::clone(&self.api);
        let created = send_with_refresh(
            || {
                let api = Arc::clone(&api);
                let settings = self.settings.read().clone();
                let request = request.clone();
                async move {
                    api.create_prediction(&settings.client_id, &settings.access_token, &request)
                        .await
                }
            },
            || self.refresh_and_persist(),
        )
        .await
        .context("create prediction failed")?;

        tracing::info!("🎯 Prediction started: {} ({})", created.title, created.id);

        if let Err(e) = self.fetch_latest_snapshot().await {
            // 作成自体は成功している。次のポーリングで追いつくので警告だけ
            tracing::warn!("⚠️ Snapshot refetch after create failed: {}", e);
        }
        Ok(())
    }

    /// 勝者を指定して予測を確定する
    ///
    /// 成功したら次のポーリングを待たずにstatusをRESOLVEDへ楽観的に
    /// 書き換える（即時のUIフィードバック用）。
    pub async fn end_prediction(
        &self,
        prediction_id: &str,
        winning_outcome_id: &str,
    ) -> anyhow::Result<()> {
        if prediction_id.is_empty() || winning_outcome_id.is_empty() {
            anyhow::bail!("end prediction requires a prediction id and a winning outcome id");
        }
        self.ensure_ready()?;

        let api = Arc::clone(&self.api);
        let prediction_id_owned = prediction_id.to_string();
        let winning_outcome_owned = winning_outcome_id.to_string();
        send_with_refresh(
            || {
                let api = Arc::clone(&api);
                let settings = self.settings.read().clone();
                let prediction_id = prediction_id_owned.clone();
                let winning_outcome_id = winning_outcome_owned.clone();
                async move {
                    api.end_prediction(
                        &settings.client_id,
                        &settings.access_token,
                        &settings.broadcaster_id,
                        &prediction_id,
                        &winning_outcome_id,
                    )
                    .await
                }
            },
            || self.refresh_and_persist(),
        )
        .await
        .context("end prediction failed")?;

        let _ = self.state.send_event(AppEvent::SnapshotStatusPatched {
            prediction_id: prediction_id.to_string(),
            status: PredictionStatus::Resolved,
        });
        tracing::info!("🏆 Prediction {} resolved", prediction_id);
        Ok(())
    }

    /// 予測をキャンセルする（ポイントは返却される）
    pub async fn cancel_prediction(&self, prediction_id: &str) -> anyhow::Result<()> {
        if prediction_id.is_empty() {
            anyhow::bail!("cancel prediction requires a prediction id");
        }
        self.ensure_ready()?;

        let api = Arc::clone(&self.api);
        let prediction_id_owned = prediction_id.to_string();
        send_with_refresh(
            || {
                let api = Arc::clone(&api);
                let settings = self.settings.read().clone();
                let prediction_id = prediction_id_owned.clone();
                async move {
                    api.cancel_prediction(
                        &settings.client_id,
                        &settings.access_token,
                        &settings.broadcaster_id,
                        &prediction_id,
                    )
                    .await
                }
            },
            || self.refresh_and_persist(),
        )
        .await
        .context("cancel prediction failed")?;

        let _ = self.state.send_event(AppEvent::SnapshotStatusPatched {
            prediction_id: prediction_id.to_string(),
            status: PredictionStatus::Canceled,
        });
        tracing::info!("🗑️ Prediction {} canceled", prediction_id);
        Ok(())
    }

    /// 認可URLを組み立て、CSRF stateノンスを保存する
    pub fn begin_authorization(&self) -> anyhow::Result<String> {
        let settings = self.settings.read().clone();
        if !settings.credentials_ready() {
            anyhow::bail!("client id / secret / channel name must be set before authorizing");
        }
        if settings.redirect_uri.is_empty() {
            anyhow::bail!("OAUTH_REDIRECT_URI must be set before authorizing");
        }

        let nonce = oauth::generate_state_nonce();
        self.store
            .store_oauth_state(&nonce)
            .context("failed to store OAuth state nonce")?;
        Ok(oauth::build_authorize_url(
            &settings.client_id,
            &settings.redirect_uri,
            &nonce,
        ))
    }

    /// コールバックのstateを検証し、コードをトークンに交換して保存する
    ///
    /// broadcaster idは空に戻し、次のブートストラップで再解決させる。
    pub async fn complete_authorization(&self, callback: CallbackQuery) -> anyhow::Result<()> {
        if let Some(error) = callback.error {
            return Err(OAuthError::Denied(error).into());
        }
        let code = callback.code.ok_or(OAuthError::MalformedCallback)?;

        let stored = self.store.take_oauth_state()?;
        match (stored, callback.state) {
            (Some(stored), Some(returned)) if stored == returned => {}
            _ => return Err(OAuthError::StateMismatch.into()),
        }

        let (client_id, client_secret, redirect_uri) = {
            let settings = self.settings.read();
            (
                settings.client_id.clone(),
                settings.client_secret.clone(),
                settings.redirect_uri.clone(),
            )
        };
        let pair = self
            .api
            .exchange_code(&client_id, &client_secret, &code, &redirect_uri)
            .await?;

        {
            let mut settings = self.settings.write();
            settings.access_token = pair.access_token;
            settings.refresh_token = pair.refresh_token;
            // 次回ロード時に再解決させる
            settings.broadcaster_id.clear();
        }
        let snapshot = self.settings.read().clone();
        self.store.save(&snapshot)?;
        let _ = self.state.send_event(AppEvent::SettingsUpdated(snapshot));

        tracing::info!("✅ Twitch authorization completed, tokens stored");
        Ok(())
    }

    /// 設定エディタ（Settings画面）からの書き換えを反映して永続化する
    pub fn update_credentials(
        &self,
        client_id: String,
        client_secret: String,
        channel_name: String,
        redirect_uri: String,
    ) -> anyhow::Result<()> {
        {
            let mut settings = self.settings.write();
            if settings.channel_name != channel_name {
                // チャンネルが変わったら古いidは無効
                settings.broadcaster_id.clear();
            }
            settings.client_id = client_id;
            settings.client_secret = client_secret;
            settings.channel_name = channel_name;
            settings.redirect_uri = redirect_uri;
        }
        let snapshot = self.settings.read().clone();
        self.store.save(&snapshot)?;
        let _ = self.state.send_event(AppEvent::SettingsUpdated(snapshot));
        Ok(())
    }
}

/// Twitchセッションサービス
///
/// ブートストラップを起点にセッションを確立し、確立後は固定周期の
/// ポーラーでスナップショットを最新に保つ。
pub struct TwitchSessionService {
    core: Arc<SessionCore>,
    shutdown_sender: Option<mpsc::UnboundedSender<()>>,
    poll_interval: Duration,
}

impl TwitchSessionService {
    pub fn new(
        api: Arc<dyn TwitchApi>,
        store: Arc<dyn SettingsStore>,
        state: Arc<StateManager>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            core: Arc::new(SessionCore {
                api,
                store,
                settings: RwLock::new(SessionSettings::default()),
                state,
                fetch_seq: AtomicU64::new(0),
            }),
            shutdown_sender: None,
            poll_interval,
        }
    }

    pub fn core(&self) -> Arc<SessionCore> {
        Arc::clone(&self.core)
    }

    pub fn is_polling(&self) -> bool {
        self.shutdown_sender.is_some()
    }

    /// 永続化された設定からセッションを確立する
    ///
    /// 手順は: 資格情報検証 → トークン有無 → broadcaster id解決 →
    /// スナップショット取得 → 設定をちょうど1回書き戻し。途中で止まった
    /// 場合は状態だけ更新して静かに戻る（UIが状態を監視する）。
    pub async fn bootstrap(&mut self) -> anyhow::Result<()> {
        let core = Arc::clone(&self.core);
        core.set_session_state(SessionState::Bootstrapping);

        // Step 1: 設定ロードと資格情報の検証
        let loaded = core.store.load().context("failed to load settings")?;
        *core.settings.write() = loaded.clone();
        core.publish_settings();

        if !loaded.credentials_ready() {
            tracing::warn!("⚙️ Twitch client id / secret / channel name missing");
            core.set_session_state(SessionState::NotConfigured);
            return Ok(());
        }

        // Step 2: トークンがなければ認可フロー待ち（ここでは対話フローを
        // 起動しない。Settings画面のConnectから始める）
        if loaded.access_token.is_empty() || loaded.refresh_token.is_empty() {
            tracing::info!("🔒 No tokens stored, waiting for authorization");
            core.set_session_state(SessionState::AwaitingAuthorization);
            return Ok(());
        }

        // Step 3: broadcaster idの解決（未解決の場合のみ）
        if core.settings.read().broadcaster_id.is_empty() {
            match core.resolve_broadcaster_id().await {
                Ok(true) => {}
                Ok(false) => {
                    core.set_session_state(SessionState::Error(format!(
                        "Channel \"{}\" not found on Twitch",
                        loaded.channel_name
                    )));
                    self.persist_once(&core);
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("❌ Broadcaster lookup failed: {}", e);
                    core.set_session_state(SessionState::Error(format!(
                        "Broadcaster lookup failed: {}",
                        e
                    )));
                    self.persist_once(&core);
                    return Ok(());
                }
            }
        }

        // Step 4: 直近の予測スナップショットとチャンネル情報
        if let Err(e) = core.fetch_latest_snapshot().await {
            tracing::warn!("⚠️ Initial snapshot fetch failed: {}", e);
        }
        if let Err(e) = core.fetch_channel_info().await {
            tracing::debug!("📺 Channel info fetch failed: {}", e);
        }

        // Step 5: ローテーションされたトークンも含めてちょうど1回書き戻す
        self.persist_once(&core);

        core.set_session_state(SessionState::Ready);
        tracing::info!("✅ Twitch session ready");
        Ok(())
    }

    fn persist_once(&self, core: &SessionCore) {
        let snapshot = core.settings.read().clone();
        if let Err(e) = core.store.save(&snapshot) {
            tracing::error!("❌ Failed to persist settings: {}", e);
        }
    }

    /// スナップショットポーラーを開始する（既に稼働中なら何もしない）
    pub fn start_polling(&mut self) {
        if self.shutdown_sender.is_some() {
            return;
        }
        let (shutdown_sender, shutdown_receiver) = mpsc::unbounded_channel();
        self.shutdown_sender = Some(shutdown_sender);
        self.spawn_snapshot_poller_task(shutdown_receiver);
    }

    /// ポーラーを停止する。実行中のフェッチは中断せず、結果はseqガードが
    /// 面倒を見る
    pub fn stop_polling(&mut self) {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
            tracing::info!("🛑 Prediction poller shutdown requested");
        }
    }

    fn spawn_snapshot_poller_task(&self, mut shutdown_receiver: mpsc::UnboundedReceiver<()>) {
        let core = Arc::clone(&self.core);
        let period = self.poll_interval;

        tokio::spawn(async move {
            let _ = core
                .state
                .send_event(AppEvent::PollerStateChanged { is_running: true });
            // interval.tick()は初回に即時発火する → 起動直後に1回フェッチ
            let mut interval = tokio::time::interval(period);
            let mut fetch_count: u64 = 0;

            tracing::info!("🚀 Prediction poller started (every {:?})", period);

            loop {
                tokio::select! {
                    _ = shutdown_receiver.recv() => {
                        tracing::info!("🛑 Shutdown signal received, stopping poller");
                        break;
                    }
                    _ = interval.tick() => {
                        if !core.session_ready() {
                            tracing::debug!("⏭️ Session not ready, skipping poll tick");
                            continue;
                        }
                        fetch_count += 1;
                        match core.fetch_latest_snapshot().await {
                            Ok(Some(snapshot)) => {
                                tracing::debug!(
                                    "📋 Poll #{}: {} ({})",
                                    fetch_count,
                                    snapshot.title,
                                    snapshot.status
                                );
                            }
                            Ok(None) => {
                                tracing::debug!("📭 Poll #{}: no predictions yet", fetch_count);
                            }
                            Err(e) => {
                                // 失敗しても既存スナップショットは消さない
                                // （空よりは古いデータの方がまし）
                                tracing::warn!(
                                    "⚠️ Poll #{} failed, keeping stale snapshot: {}",
                                    fetch_count,
                                    e
                                );
                            }
                        }
                    }
                }
            }

            let _ = core
                .state
                .send_event(AppEvent::PollerStateChanged { is_running: false });
            tracing::info!("🏁 Prediction poller stopped after {} fetches", fetch_count);
        });
    }
}

impl Drop for TwitchSessionService {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
