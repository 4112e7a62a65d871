use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dioxus::prelude::spawn;
use tokio::sync::Mutex as TokioMutex;

use crate::api::helix::HelixClient;
use crate::api::oauth;
use crate::gui::config_manager;
use crate::gui::models::SessionState;
use crate::gui::services::TwitchSessionService;
use crate::gui::settings_store::EnvSettingsStore;
use crate::gui::state_management::{get_state_manager, AppEvent};
use crate::gui::traits::{SettingsStore, TwitchApi};
use crate::predictions::PredictionDraft;

/// グローバルセッションサービスのインスタンス
static SESSION_SERVICE: OnceLock<Arc<TokioMutex<TwitchSessionService>>> = OnceLock::new();

/// 認可フローの多重起動ガード
static AUTH_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

/// グローバルセッションサービスを取得（遅延初期化）
pub fn get_session_service() -> &'static Arc<TokioMutex<TwitchSessionService>> {
    SESSION_SERVICE.get_or_init(|| {
        tracing::debug!("🏗️ Creating global session service");
        let config = config_manager::get_current_config().unwrap_or_default();

        let api: Arc<dyn TwitchApi> = Arc::new(HelixClient::new());
        let store: Arc<dyn SettingsStore> =
            Arc::new(EnvSettingsStore::new(&config.settings_file));

        Arc::new(TokioMutex::new(TwitchSessionService::new(
            api,
            store,
            get_state_manager(),
            Duration::from_secs(config.poll_interval_secs),
        )))
    })
}

/// エラーをユーザー向けの説明に変換する
fn format_user_friendly_error(error: &anyhow::Error) -> String {
    let error_string = error.to_string();
    let chain = error
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ");

    if chain.contains("Invalid refresh token") || chain.contains("Token refresh failed") {
        "Twitch session expired. Reconnect your account from Settings.".to_string()
    } else if chain.contains("state mismatch") || chain.contains("Authorization state") {
        "Authorization state mismatch. Please retry the login.".to_string()
    } else if chain.contains("timed out") || chain.contains("connection") {
        "Network error while talking to Twitch. Check your connection and try again.".to_string()
    } else {
        error_string
    }
}

/// ブートストラップを実行し、readiness遷移に合わせてポーラーを起動/停止する
async fn run_bootstrap(service: &Arc<TokioMutex<TwitchSessionService>>) {
    let mut service = service.lock().await;
    match service.bootstrap().await {
        Ok(()) => {
            tracing::info!("✅ Session bootstrap finished");
            // ポーラーはsession_readyがtrueになったときだけ動かす
            if service.core().session_ready() {
                service.start_polling();
            } else {
                service.stop_polling();
            }
        }
        Err(e) => {
            let message = format_user_friendly_error(&e);
            tracing::error!("❌ Session bootstrap failed: {}", e);
            service.stop_polling();
            let _ = get_state_manager()
                .send_event(AppEvent::SessionStateChanged(SessionState::Error(message)));
        }
    }
}

/// セッション操作用の公開インターフェース
///
/// Dioxusコンポーネントから呼ぶ薄いspawnラッパー。結果はStateManager
/// 経由でUIに伝わる。
pub struct SessionActions;

impl SessionActions {
    /// 永続化された設定からセッションを確立する（起動時・設定変更後）
    pub fn bootstrap() {
        let service = get_session_service();
        spawn(async move {
            run_bootstrap(service).await;
        });
    }

    /// 保存済みドラフトからTwitch上で予測を開始する
    pub fn start_prediction(draft: PredictionDraft) {
        let service = get_session_service();
        spawn(async move {
            let core = service.lock().await.core();
            match core.start_prediction(&draft).await {
                Ok(()) => tracing::info!("✅ Prediction started via SessionActions"),
                Err(e) => {
                    tracing::error!("❌ Failed to start prediction: {}", e);
                }
            }
        });
    }

    /// 勝者アウトカムを指定して進行中の予測を確定する
    pub fn end_prediction(prediction_id: String, winning_outcome_id: String) {
        let service = get_session_service();
        spawn(async move {
            let core = service.lock().await.core();
            match core.end_prediction(&prediction_id, &winning_outcome_id).await {
                Ok(()) => tracing::info!("✅ Prediction ended via SessionActions"),
                Err(e) => tracing::error!("❌ Failed to end prediction: {}", e),
            }
        });
    }

    /// 進行中の予測をキャンセルする
    pub fn cancel_prediction(prediction_id: String) {
        let service = get_session_service();
        spawn(async move {
            let core = service.lock().await.core();
            match core.cancel_prediction(&prediction_id).await {
                Ok(()) => tracing::info!("✅ Prediction canceled via SessionActions"),
                Err(e) => tracing::error!("❌ Failed to cancel prediction: {}", e),
            }
        });
    }

    /// 資格情報を保存してブートストラップし直す
    pub fn save_credentials(
        client_id: String,
        client_secret: String,
        channel_name: String,
        redirect_uri: String,
    ) {
        let service = get_session_service();
        spawn(async move {
            {
                let core = service.lock().await.core();
                if let Err(e) =
                    core.update_credentials(client_id, client_secret, channel_name, redirect_uri)
                {
                    tracing::error!("❌ Failed to save credentials: {}", e);
                    return;
                }
            }
            tracing::info!("💾 Credentials saved, re-running bootstrap");
            run_bootstrap(service).await;
        });
    }

    /// Twitchの認可フローを開始する
    ///
    /// 認可URLを発行してループバックでコールバックを待ち、コードを
    /// トークンに交換したらブートストラップをやり直す。返り値はユーザーが
    /// ブラウザで開くURL。
    pub fn connect() -> Option<String> {
        if AUTH_IN_PROGRESS.swap(true, Ordering::SeqCst) {
            tracing::warn!("⚠️ Authorization flow already in progress");
            return None;
        }

        let service = get_session_service();
        let core = match service.try_lock() {
            Ok(service) => service.core(),
            Err(_) => {
                AUTH_IN_PROGRESS.store(false, Ordering::SeqCst);
                tracing::warn!("⚠️ Session service busy, try again");
                return None;
            }
        };

        let authorize_url = match core.begin_authorization() {
            Ok(url) => url,
            Err(e) => {
                AUTH_IN_PROGRESS.store(false, Ordering::SeqCst);
                tracing::error!("❌ Cannot start authorization: {}", e);
                return None;
            }
        };

        let redirect_uri = core.settings().redirect_uri;
        let _ = get_state_manager()
            .send_event(AppEvent::SessionStateChanged(SessionState::Authorizing));
        tracing::info!("🌐 Open this URL in your browser to authorize: {}", authorize_url);

        spawn(async move {
            let result = async {
                let callback = oauth::wait_for_callback(&redirect_uri).await?;
                core.complete_authorization(callback).await
            }
            .await;

            AUTH_IN_PROGRESS.store(false, Ordering::SeqCst);

            match result {
                Ok(()) => {
                    tracing::info!("✅ Authorization flow finished, bootstrapping session");
                    run_bootstrap(get_session_service()).await;
                }
                Err(e) => {
                    let message = format_user_friendly_error(&e);
                    tracing::error!("❌ Authorization flow failed: {}", e);
                    let _ = get_state_manager()
                        .send_event(AppEvent::SessionStateChanged(SessionState::Error(message)));
                }
            }
        });

        Some(authorize_url)
    }
}
