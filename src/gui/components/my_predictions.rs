use dioxus::prelude::*;

use crate::gui::components::open_draft_store;
use crate::gui::hooks::SessionHandle;
use crate::gui::session_service::SessionActions;
use crate::predictions::PredictionDraft;

/// 保存済み予測の一覧ビュー
///
/// ドラフトをリスト表示し、START（Twitch上で開始）とDELETEを提供する。
#[component]
pub fn MyPredictionsView(session: SessionHandle) -> Element {
    let mut drafts = use_signal(Vec::<PredictionDraft>::new);
    let mut load_error = use_signal(|| None::<String>);

    let session_ready = session.settings.read().session_ready();

    // マウント時にドラフトを読み込む
    use_effect(move || {
        match open_draft_store().and_then(|store| Ok(store.load()?)) {
            Ok(loaded) => drafts.set(loaded),
            Err(e) => {
                tracing::error!("❌ Failed to load drafts: {}", e);
                load_error.set(Some("Failed to load predictions.".to_string()));
            }
        }
    });

    rsx! {
        div {
            h2 { style: "margin-top: 0;", "My Predictions" }

            if load_error.read().is_some() {
                div {
                    class: "alert-error",
                    {load_error.read().clone().unwrap_or_default()}
                }
            }

            if drafts.read().is_empty() && load_error.read().is_none() {
                p {
                    style: "color: rgba(255,255,255,0.6);",
                    "No predictions found. Create one from the Create Prediction view."
                }
            }

            for draft in drafts.read().iter().cloned() {
                div {
                    key: "{draft.id}",
                    class: "card",

                    strong { "{draft.title}" }

                    ul {
                        style: "margin: 8px 0; padding-left: 20px; color: rgba(255,255,255,0.8);",
                        for (index, outcome) in draft.outcomes.iter().enumerate() {
                            li { key: "{draft.id}-{index}", "{outcome}" }
                        }
                    }

                    p {
                        style: "margin: 0 0 10px 0; font-size: 13px; color: rgba(255,255,255,0.6);",
                        "Duration: {draft.effective_window()} sec"
                    }

                    div {
                        style: "display: flex; gap: 8px;",
                        button {
                            class: "btn btn-primary",
                            disabled: !session_ready,
                            onclick: {
                                let draft = draft.clone();
                                move |_| {
                                    tracing::info!("▶️ Starting saved prediction: {}", draft.title);
                                    SessionActions::start_prediction(draft.clone());
                                }
                            },
                            "START"
                        }
                        button {
                            class: "btn btn-danger",
                            onclick: {
                                let draft_id = draft.id;
                                move |_| {
                                    match open_draft_store().and_then(|store| Ok(store.delete(draft_id)?)) {
                                        Ok(_) => {
                                            drafts.write().retain(|d| d.id != draft_id);
                                        }
                                        Err(e) => {
                                            tracing::error!("❌ Failed to delete draft: {}", e);
                                        }
                                    }
                                }
                            },
                            "DELETE"
                        }
                    }
                }
            }
        }
    }
}
