pub mod api;
pub mod gui;
pub mod predictions;

// Re-export the main error types for convenience
pub use api::helix::HelixError;
pub use api::oauth::OAuthError;
pub use api::request::RequestError;
pub use gui::GuiError;
pub use predictions::{DraftError, PredictionDraft};

/// クレート共通のエラー型
#[derive(thiserror::Error, Debug)]
pub enum TwipredError {
    #[error(transparent)]
    Gui(#[from] GuiError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TwipredResult<T> = Result<T, TwipredError>;

// Re-export the session manager surface
pub use gui::services::TwitchSessionService;
pub use gui::settings_store::{EnvSettingsStore, SessionSettings};
pub use gui::state_management::{get_state_manager, AppEvent, StateManager};
pub use gui::traits::{SettingsStore, TwitchApi};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Test that the main modules are accessible
        assert!(std::any::type_name::<api::helix::HelixClient>().contains("HelixClient"));
        assert!(
            std::any::type_name::<gui::services::TwitchSessionService>()
                .contains("TwitchSessionService")
        );
    }

    #[test]
    fn test_error_types_re_exported() {
        // Test that error types are available from the crate root
        let _helix_error = HelixError::Unauthorized;
        let _draft_error = DraftError::TooFewOutcomes(1);
        let _gui_error = GuiError::Configuration("test".to_string());
    }

    #[test]
    fn test_session_settings_re_exported() {
        let settings = SessionSettings::default();
        assert!(!settings.credentials_ready());
        assert!(!settings.session_ready());
    }
}
