use dioxus::prelude::*;

use crate::gui::{
    components::{
        CreatePredictionView, MainMenuView, MyPredictionsView, SettingsView, ViewNavigation,
    },
    hooks::use_session,
    models::ActiveView,
    session_service::SessionActions,
    styles::theme::get_embedded_css,
};

/// メインウィンドウコンポーネント
///
/// ビュー切り替えシェル。マウント時に一度だけセッションのブートストラップを
/// 起動し、以降はセッションハンドル経由で状態を観測する。
#[component]
pub fn MainWindow() -> Element {
    let session = use_session();
    let mut active_view = use_signal(ActiveView::default);

    // 起動時に一度だけブートストラップ
    use_effect(move || {
        tracing::info!("🎬 MainWindow mounted, bootstrapping session");
        SessionActions::bootstrap();
    });

    rsx! {
        // CSSスタイルをdocument headに注入
        document::Style {
            {get_embedded_css()}
        }

        div {
            class: "main-window",
            style: "
                min-height: 100vh;
                background: linear-gradient(135deg, #18181b 0%, #3b0764 100%);
                font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
                color: white;
                padding: 20px;
                display: flex;
                flex-direction: column;
            ",

            // ヘッダー
            div {
                class: "app-header",
                style: "
                    text-align: center;
                    margin-bottom: 24px;
                    background: rgba(255, 255, 255, 0.06);
                    border-radius: 16px;
                    padding: 18px;
                    border: 1px solid rgba(255, 255, 255, 0.12);
                ",

                h1 {
                    style: "
                        font-size: clamp(1.6rem, 4vw, 2.4rem);
                        margin: 0 0 6px 0;
                        font-weight: 700;
                        letter-spacing: -0.02em;
                    ",
                    "🎯 twipred"
                }

                p {
                    style: "
                        color: rgba(255, 255, 255, 0.75);
                        margin: 0;
                        font-size: 0.95rem;
                    ",
                    "Twitch Channel Points Predictions Manager"
                }
            }

            // コンテンツエリア（ナビゲーション + ビュー）
            div {
                style: "
                    flex: 1;
                    display: flex;
                    flex-direction: column;
                    max-width: 860px;
                    width: 100%;
                    margin: 0 auto;
                ",

                ViewNavigation {
                    active_view: active_view(),
                    on_view_change: move |new_view| {
                        tracing::info!("🔄 View switched: {:?} → {:?}", active_view(), new_view);
                        active_view.set(new_view);
                    }
                }

                div {
                    style: "flex: 1; overflow-y: auto;",

                    match active_view() {
                        ActiveView::MainMenu => rsx! {
                            MainMenuView { session: session, on_navigate: move |view| active_view.set(view) }
                        },
                        ActiveView::CreatePrediction => rsx! {
                            CreatePredictionView { session: session }
                        },
                        ActiveView::MyPredictions => rsx! {
                            MyPredictionsView { session: session }
                        },
                        ActiveView::Settings => rsx! {
                            SettingsView { session: session }
                        },
                    }
                }
            }
        }
    }
}
