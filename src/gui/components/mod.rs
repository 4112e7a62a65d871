pub mod create_prediction;
pub mod main_menu;
pub mod main_window;
pub mod my_predictions;
pub mod prediction_status;
pub mod settings_panel;
pub mod view_navigation;

use crate::predictions::DraftStore;

/// 設定のdrafts_fileを尊重してドラフトストアを開く
pub(crate) fn open_draft_store() -> anyhow::Result<DraftStore> {
    match crate::gui::config_manager::get_current_config().and_then(|config| config.drafts_file) {
        Some(path) => Ok(DraftStore::new(path)),
        None => DraftStore::with_default_path(),
    }
}

pub use create_prediction::CreatePredictionView;
pub use main_menu::MainMenuView;
pub use main_window::MainWindow;
pub use my_predictions::MyPredictionsView;
pub use prediction_status::PredictionStatusPanel;
pub use settings_panel::SettingsView;
pub use view_navigation::ViewNavigation;
