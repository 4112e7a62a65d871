use dioxus::prelude::*;

use crate::gui::components::PredictionStatusPanel;
use crate::gui::hooks::SessionHandle;
use crate::gui::models::{ActiveView, SessionState};

/// メインメニュー（概要ビュー）
///
/// セッションの状態と進行中の予測を一望し、各ビューへの入口を提供する。
#[component]
pub fn MainMenuView(session: SessionHandle, on_navigate: EventHandler<ActiveView>) -> Element {
    let session_state = session.session_state.read().clone();
    let settings = session.settings.read().clone();

    let (status_icon, status_detail) = match &session_state {
        SessionState::Idle | SessionState::Bootstrapping => ("⏳", String::new()),
        SessionState::NotConfigured => (
            "⚙️",
            "Enter your Twitch credentials in Settings.".to_string(),
        ),
        SessionState::AwaitingAuthorization => (
            "🔒",
            "Connect your Twitch account from Settings.".to_string(),
        ),
        SessionState::Authorizing => (
            "🌐",
            "Finish the authorization in your browser.".to_string(),
        ),
        SessionState::Ready => ("✅", format!("Connected as {}", settings.channel_name)),
        SessionState::Error(message) => ("❌", message.clone()),
    };

    rsx! {
        div {
            // セッション状態カード
            div {
                class: "card",
                div {
                    style: "display: flex; align-items: center; gap: 10px;",
                    span { style: "font-size: 20px;", {status_icon} }
                    div {
                        strong { {session_state.label()} }
                        if !status_detail.is_empty() {
                            p {
                                style: "margin: 4px 0 0 0; font-size: 13px; color: rgba(255,255,255,0.7);",
                                "{status_detail}"
                            }
                        }
                    }
                }
            }

            PredictionStatusPanel { session: session }

            // ナビゲーションカード
            div {
                style: "display: flex; gap: 12px;",
                button {
                    class: "btn btn-primary",
                    style: "flex: 1; padding: 16px;",
                    onclick: move |_| on_navigate.call(ActiveView::CreatePrediction),
                    "✏️ Create new prediction"
                }
                button {
                    class: "btn btn-secondary",
                    style: "flex: 1; padding: 16px;",
                    onclick: move |_| on_navigate.call(ActiveView::MyPredictions),
                    "📋 My predictions"
                }
                button {
                    class: "btn btn-secondary",
                    style: "flex: 1; padding: 16px;",
                    onclick: move |_| on_navigate.call(ActiveView::Settings),
                    "⚙️ Settings"
                }
            }
        }
    }
}
