use dioxus::prelude::*;

use crate::gui::components::open_draft_store;
use crate::gui::hooks::SessionHandle;
use crate::gui::session_service::SessionActions;
use crate::predictions::PredictionDraft;

/// フォームの保存結果表示
#[derive(Debug, Clone, PartialEq)]
enum FormStatus {
    Idle,
    Saved(String),
    Error(String),
}

/// 予測作成ビュー
///
/// タイトル・アウトカム（カンマ区切り）・ウィンドウ秒数を入力して
/// ドラフトとして保存する。Save and start は保存後すぐTwitch上で開始する。
#[component]
pub fn CreatePredictionView(session: SessionHandle) -> Element {
    let mut title = use_signal(String::new);
    let mut outcomes = use_signal(String::new);
    let mut window = use_signal(String::new);
    let mut status = use_signal(|| FormStatus::Idle);

    let session_ready = session.settings.read().session_ready();

    // 保存メッセージは2秒で消す
    use_effect(move || {
        if matches!(status(), FormStatus::Saved(_)) {
            spawn(async move {
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
                if matches!(status(), FormStatus::Saved(_)) {
                    status.set(FormStatus::Idle);
                }
            });
        }
    });

    let mut build_and_save = move || -> Option<PredictionDraft> {
        let draft = match PredictionDraft::from_form(&title(), &outcomes(), &window()) {
            Ok(draft) => draft,
            Err(e) => {
                status.set(FormStatus::Error(e.to_string()));
                return None;
            }
        };

        let store = match open_draft_store() {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("❌ Failed to open draft store: {}", e);
                status.set(FormStatus::Error("Failed to open draft storage.".to_string()));
                return None;
            }
        };

        if let Err(e) = store.append(&draft) {
            tracing::error!("❌ Failed to save draft: {}", e);
            status.set(FormStatus::Error("Prediction failed to save.".to_string()));
            return None;
        }

        // フォームをリセット
        title.set(String::new());
        outcomes.set(String::new());
        window.set(String::new());
        Some(draft)
    };

    rsx! {
        div {
            h2 { style: "margin-top: 0;", "Create new prediction" }

            match status() {
                FormStatus::Idle => rsx! {},
                FormStatus::Saved(message) => rsx! {
                    div { class: "alert-success", "{message}" }
                },
                FormStatus::Error(message) => rsx! {
                    div { class: "alert-error", "!Error! → {message}" }
                },
            }

            div {
                class: "card",

                div {
                    class: "form-group",
                    label { class: "form-label", "Title" }
                    input {
                        class: "form-input",
                        r#type: "text",
                        value: "{title}",
                        oninput: move |event| title.set(event.value()),
                    }
                    span {
                        class: "form-hint",
                        "The title should be between 3 and 45 characters."
                    }
                }

                div {
                    class: "form-group",
                    label { class: "form-label", "Outcomes" }
                    input {
                        class: "form-input",
                        r#type: "text",
                        value: "{outcomes}",
                        oninput: move |event| outcomes.set(event.value()),
                    }
                    span {
                        class: "form-hint",
                        "Separate multiple outcomes with commas, e.g. \"Option 1, Option 2\", maximum 10. Duplicates will be ignored."
                    }
                }

                div {
                    class: "form-group",
                    label { class: "form-label", "Duration" }
                    input {
                        class: "form-input",
                        r#type: "text",
                        value: "{window}",
                        oninput: move |event| window.set(event.value()),
                    }
                    span {
                        class: "form-hint",
                        "Duration in seconds, can be empty, default is 90. Value should be between 30 and 1800."
                    }
                }

                div {
                    style: "display: flex; gap: 12px; margin-top: 8px;",
                    button {
                        class: "btn btn-primary",
                        disabled: !session_ready,
                        onclick: move |_| {
                            if let Some(draft) = build_and_save() {
                                status.set(FormStatus::Saved(
                                    "Prediction saved! Starting on Twitch…".to_string(),
                                ));
                                SessionActions::start_prediction(draft);
                            }
                        },
                        "Save and start"
                    }
                    button {
                        class: "btn btn-secondary",
                        onclick: move |_| {
                            if build_and_save().is_some() {
                                status.set(FormStatus::Saved("Prediction saved!".to_string()));
                            }
                        },
                        "Save"
                    }
                }

                if !session_ready {
                    p {
                        style: "margin: 12px 0 0 0; font-size: 13px; color: rgba(255,255,255,0.6);",
                        "🔒 Connect your Twitch account in Settings to start predictions."
                    }
                }
            }
        }
    }
}
