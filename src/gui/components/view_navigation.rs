use crate::gui::models::ActiveView;
use dioxus::prelude::*;

/// ビュー切り替えナビゲーション
#[component]
pub fn ViewNavigation(active_view: ActiveView, on_view_change: EventHandler<ActiveView>) -> Element {
    let views = vec![
        ActiveView::MainMenu,
        ActiveView::CreatePrediction,
        ActiveView::MyPredictions,
        ActiveView::Settings,
    ];

    rsx! {
        nav {
            class: "view-navigation",
            style: "
                display: flex;
                background: rgba(255, 255, 255, 0.06);
                border: 1px solid rgba(255, 255, 255, 0.12);
                border-radius: 12px;
                padding: 6px;
                margin-bottom: 20px;
                gap: 4px;
            ",

            for view in views {
                ViewButton {
                    key: "{view:?}",
                    view: view,
                    is_active: view == active_view,
                    on_click: move |_| on_view_change.call(view),
                }
            }
        }
    }
}

/// 個別のビューボタン
#[component]
fn ViewButton(view: ActiveView, is_active: bool, on_click: EventHandler<MouseEvent>) -> Element {
    let button_style = if is_active {
        "
            flex: 1;
            display: flex;
            align-items: center;
            justify-content: center;
            gap: 8px;
            padding: 10px 14px;
            border: none;
            border-radius: 8px;
            background: #a970ff;
            color: white;
            font-weight: 600;
            font-size: 14px;
            cursor: pointer;
        "
    } else {
        "
            flex: 1;
            display: flex;
            align-items: center;
            justify-content: center;
            gap: 8px;
            padding: 10px 14px;
            border: none;
            border-radius: 8px;
            background: transparent;
            color: rgba(255, 255, 255, 0.7);
            font-weight: 500;
            font-size: 14px;
            cursor: pointer;
        "
    };

    rsx! {
        button {
            style: "{button_style}",
            onclick: on_click,
            span { {view.icon()} }
            span { {view.label()} }
        }
    }
}
