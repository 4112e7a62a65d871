//! セッション状態用カスタムフック
//!
//! StateManagerの状態をDioxusのSignalへ同期する。コンポーネントは
//! このハンドル越しにセッション状態を読むだけでよい。

use dioxus::prelude::*;

use crate::api::helix::ChannelInfo;
use crate::gui::models::{PredictionSnapshot, SessionState};
use crate::gui::settings_store::SessionSettings;
use crate::gui::state_management::{get_state_manager, AppState};

/// 状態同期の周期（ミリ秒）
const SYNC_INTERVAL_MS: u64 = 500;

/// セッション状態ハンドル
#[derive(Clone, Copy)]
pub struct SessionHandle {
    pub settings: Signal<SessionSettings>,
    pub session_state: Signal<SessionState>,
    pub snapshot: Signal<Option<PredictionSnapshot>>,
    pub channel_info: Signal<Option<ChannelInfo>>,
    pub poller_running: Signal<bool>,
}

impl PartialEq for SessionHandle {
    fn eq(&self, _other: &Self) -> bool {
        // Signalの比較は意味を持たないため常にfalse扱いにして
        // propsの変更として検出させる
        false
    }
}

fn differs(last: &AppState, current: &AppState) -> bool {
    last.settings != current.settings
        || last.session_state != current.session_state
        || last.snapshot != current.snapshot
        || last.channel_info != current.channel_info
        || last.poller_running != current.poller_running
}

/// StateManagerと同期するセッションハンドルを返す
pub fn use_session() -> SessionHandle {
    let mut settings = use_signal(SessionSettings::default);
    let mut session_state = use_signal(SessionState::default);
    let mut snapshot = use_signal(|| None::<PredictionSnapshot>);
    let mut channel_info = use_signal(|| None::<ChannelInfo>);
    let mut poller_running = use_signal(|| false);

    use_effect(move || {
        spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_millis(SYNC_INTERVAL_MS));
            let mut last: Option<AppState> = None;

            tracing::debug!("🎨 Session state sync loop started");
            loop {
                interval.tick().await;
                let current = get_state_manager().get_state_unchecked();

                let needs_update = match &last {
                    None => true,
                    Some(last) => differs(last, &current),
                };

                if needs_update {
                    settings.set(current.settings.clone());
                    session_state.set(current.session_state.clone());
                    snapshot.set(current.snapshot.clone());
                    channel_info.set(current.channel_info.clone());
                    poller_running.set(current.poller_running);
                    last = Some(current);
                }
            }
        });
    });

    SessionHandle {
        settings,
        session_state,
        snapshot,
        channel_info,
        poller_running,
    }
}
