use dioxus::prelude::*;

use crate::gui::hooks::SessionHandle;
use crate::gui::models::SessionState;
use crate::gui::session_service::SessionActions;

/// 設定ビュー
///
/// Twitchアプリの資格情報とリダイレクトURIを編集し、認可フローを
/// 開始する。トークンとbroadcaster idはセッションマネージャーが管理
/// するためここでは編集させない。
#[component]
pub fn SettingsView(session: SessionHandle) -> Element {
    let stored = session.settings.read().clone();

    let mut client_id = use_signal(|| stored.client_id.clone());
    let mut client_secret = use_signal(|| stored.client_secret.clone());
    let mut channel_name = use_signal(|| stored.channel_name.clone());
    let mut redirect_uri = use_signal(|| stored.redirect_uri.clone());
    let mut authorize_url = use_signal(|| None::<String>);

    let session_state = session.session_state.read().clone();
    let has_tokens = {
        let settings = session.settings.read();
        !settings.access_token.is_empty() && !settings.refresh_token.is_empty()
    };

    rsx! {
        div {
            h2 { style: "margin-top: 0;", "Settings" }

            div {
                class: "card",
                h3 { style: "margin-top: 0; font-size: 15px;", "Twitch application" }

                div {
                    class: "form-group",
                    label { class: "form-label", "Client ID" }
                    input {
                        class: "form-input",
                        r#type: "text",
                        value: "{client_id}",
                        oninput: move |event| client_id.set(event.value()),
                    }
                }

                div {
                    class: "form-group",
                    label { class: "form-label", "Client Secret" }
                    input {
                        class: "form-input",
                        r#type: "password",
                        value: "{client_secret}",
                        oninput: move |event| client_secret.set(event.value()),
                    }
                }

                div {
                    class: "form-group",
                    label { class: "form-label", "Channel name" }
                    input {
                        class: "form-input",
                        r#type: "text",
                        value: "{channel_name}",
                        oninput: move |event| channel_name.set(event.value()),
                    }
                }

                div {
                    class: "form-group",
                    label { class: "form-label", "OAuth redirect URI" }
                    input {
                        class: "form-input",
                        r#type: "text",
                        value: "{redirect_uri}",
                        oninput: move |event| redirect_uri.set(event.value()),
                    }
                    span {
                        class: "form-hint",
                        "Must match the redirect URI registered for your Twitch application, e.g. http://localhost:3000/callback"
                    }
                }

                button {
                    class: "btn btn-primary",
                    onclick: move |_| {
                        SessionActions::save_credentials(
                            client_id(),
                            client_secret(),
                            channel_name(),
                            redirect_uri(),
                        );
                    },
                    "Save settings"
                }
            }

            div {
                class: "card",
                h3 { style: "margin-top: 0; font-size: 15px;", "Twitch account" }

                p {
                    style: "font-size: 13px; color: rgba(255,255,255,0.7);",
                    if has_tokens {
                        "🔓 Tokens stored. Reconnect if Twitch reports an expired session."
                    } else {
                        "🔒 Not connected - authorize the app to manage predictions on your channel."
                    }
                }

                button {
                    class: "btn btn-primary",
                    disabled: matches!(session_state, SessionState::Authorizing),
                    onclick: move |_| {
                        if let Some(url) = SessionActions::connect() {
                            authorize_url.set(Some(url));
                        }
                    },
                    if has_tokens { "Reconnect Twitch account" } else { "Connect Twitch account" }
                }

                if authorize_url.read().is_some() {
                    div {
                        style: "margin-top: 12px;",
                        p {
                            style: "font-size: 13px; color: rgba(255,255,255,0.7); margin: 0 0 6px 0;",
                            "Open this URL in your browser to authorize, then return here:"
                        }
                        code {
                            style: "
                                display: block;
                                word-break: break-all;
                                background: rgba(0,0,0,0.3);
                                border-radius: 8px;
                                padding: 10px;
                                font-size: 12px;
                            ",
                            {authorize_url.read().clone().unwrap_or_default()}
                        }
                    }
                }
            }
        }
    }
}
