use dioxus::prelude::*;

use crate::gui::hooks::SessionHandle;
use crate::gui::models::PredictionSnapshot;
use crate::gui::session_service::SessionActions;
use crate::gui::styles::theme::status_color;

/// 進行中 / 直近の予測パネル
///
/// ポーラーが保持するスナップショットを表示する。進行中のあいだは
/// 勝者アウトカムの選択（確定）とキャンセルを提供する。確定・キャンセルの
/// 成功直後はstatusが楽観的に書き換わり、次のポーリングで正式な値に
/// 上書きされる。
#[component]
pub fn PredictionStatusPanel(session: SessionHandle) -> Element {
    let snapshot = session.snapshot.read().clone();
    let channel_line = session
        .channel_info
        .read()
        .as_ref()
        .map(|info| format!("📺 {} — {}", info.title, info.game_name));
    let is_polling = *session.poller_running.read();

    let content = match snapshot {
        None => rsx! {
            p {
                style: "color: rgba(255,255,255,0.6); margin: 0;",
                "No predictions yet for this channel."
            }
        },
        Some(snapshot) => render_snapshot(&snapshot),
    };

    rsx! {
        div {
            class: "card",

            div {
                style: "display: flex; align-items: center; gap: 8px; margin-bottom: 10px;",
                h3 { style: "margin: 0; font-size: 16px;", "📊 Current prediction" }
                if is_polling {
                    span {
                        style: "font-size: 12px; color: rgba(255,255,255,0.5);",
                        "auto-refreshing"
                    }
                }
            }

            if channel_line.is_some() {
                p {
                    style: "margin: 0 0 12px 0; font-size: 13px; color: rgba(255,255,255,0.7);",
                    {channel_line.unwrap_or_default()}
                }
            }

            {content}
        }
    }
}

/// スナップショット本体の描画
fn render_snapshot(snapshot: &PredictionSnapshot) -> Element {
    let is_running = snapshot.is_running();
    let badge_color = status_color(snapshot.status);
    let prediction_id = snapshot.id.clone();
    let cancel_id = snapshot.id.clone();
    let title = snapshot.title.clone();
    let status_text = snapshot.status.to_string();
    let window = snapshot.prediction_window;
    let outcomes = snapshot.outcomes.clone();

    rsx! {
        div {
            div {
                style: "display: flex; align-items: center; gap: 10px; margin-bottom: 10px;",
                strong { style: "font-size: 15px;", "{title}" }
                span {
                    style: "
                        background: {badge_color};
                        color: white;
                        border-radius: 999px;
                        padding: 2px 10px;
                        font-size: 12px;
                        font-weight: 600;
                    ",
                    "{status_text}"
                }
            }

            p {
                style: "margin: 0 0 10px 0; font-size: 13px; color: rgba(255,255,255,0.6);",
                "Window: {window} sec"
            }

            div {
                style: "display: flex; flex-direction: column; gap: 6px;",
                for outcome in outcomes {
                    div {
                        key: "{outcome.id}",
                        style: "
                            display: flex;
                            align-items: center;
                            justify-content: space-between;
                            background: rgba(255,255,255,0.06);
                            border-radius: 8px;
                            padding: 8px 12px;
                        ",
                        span { "{outcome.title}" }
                        if is_running {
                            button {
                                class: "btn btn-primary",
                                style: "padding: 4px 12px; font-size: 12px;",
                                onclick: {
                                    let prediction_id = prediction_id.clone();
                                    let outcome_id = outcome.id.clone();
                                    move |_| {
                                        SessionActions::end_prediction(
                                            prediction_id.clone(),
                                            outcome_id.clone(),
                                        );
                                    }
                                },
                                "Pick winner"
                            }
                        }
                    }
                }
            }

            if is_running {
                div {
                    style: "margin-top: 12px;",
                    button {
                        class: "btn btn-danger",
                        onclick: move |_| {
                            SessionActions::cancel_prediction(cancel_id.clone());
                        },
                        "Cancel prediction"
                    }
                }
            }
        }
    }
}
