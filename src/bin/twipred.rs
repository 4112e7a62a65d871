use clap::Parser;
use dioxus::prelude::*;
use std::sync::Mutex;
use twipred::gui::{components::MainWindow, config_manager, utils};
use twipred::TwipredResult;

/// ウィンドウ設定の保存用
static LAST_WINDOW_CONFIG: Mutex<Option<config_manager::WindowConfig>> = Mutex::new(None);

/// Twitch Channel Points Predictions Manager
#[derive(Parser, Debug)]
#[command(name = "twipred", version, about)]
struct Args {
    /// Twitch設定ファイル（KEY=VALUE形式）のパス
    #[arg(long)]
    settings_file: Option<String>,

    /// スナップショットのポーリング周期（秒）
    #[arg(long)]
    poll_interval: Option<u64>,
}

/// twipred GUIアプリケーションのルート
fn app() -> Element {
    let window = dioxus::desktop::use_window();

    // ウィンドウ状態を定期的に記録（終了時保存用の軽量な監視）
    use_effect({
        let window = window.clone();
        move || {
            let window = window.clone();
            spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1));
                loop {
                    interval.tick().await;

                    let current_size = window.inner_size();
                    let current_position = window.outer_position().unwrap_or_default();
                    let is_maximized = window.is_maximized();

                    let window_config = config_manager::WindowConfig {
                        width: current_size.width,
                        height: current_size.height,
                        x: current_position.x,
                        y: current_position.y,
                        maximized: is_maximized,
                    };

                    if let Ok(mut last_config) = LAST_WINDOW_CONFIG.lock() {
                        *last_config = Some(window_config);
                    }
                }
            });
        }
    });

    rsx! {
        div {
            class: "app",
            style: "
                height: 100vh;
                margin: 0;
                padding: 0;
                overflow: hidden;
                font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            ",

            MainWindow {}
        }
    }
}

fn main() -> TwipredResult<()> {
    let args = Args::parse();

    // tokio-consoleの初期化（プロファイリング用）
    #[cfg(feature = "debug-tokio")]
    console_subscriber::init();

    // 設定を読み込み
    let config_manager = config_manager::ConfigManager::new().map_err(|e| {
        twipred::GuiError::Configuration(format!("Failed to create config manager: {}", e))
    })?;
    let mut config = config_manager.load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        config_manager::AppConfig::default()
    });

    // CLI引数で設定を上書きして保存（サービス側はconfig経由で読む）
    let mut config_changed = false;
    if let Some(settings_file) = args.settings_file {
        config.settings_file = settings_file;
        config_changed = true;
    }
    if let Some(poll_interval) = args.poll_interval {
        config.poll_interval_secs = poll_interval.max(1);
        config_changed = true;
    }

    // 強化されたログ初期化
    #[cfg(not(feature = "debug-tokio"))]
    utils::init_logging(&config.log)?;

    tracing::info!("🎬 Starting twipred - Twitch Predictions Manager");

    if config_changed {
        if let Err(e) = config_manager.save_config(&config) {
            tracing::warn!("⚠️ Failed to persist CLI overrides: {}", e);
        }
    }

    // ウィンドウ位置を妥当な範囲に調整
    utils::validate_window_bounds(&mut config.window);
    tracing::info!(
        "🪟 Window: {}x{} at ({}, {}), maximized: {}",
        config.window.width,
        config.window.height,
        config.window.x,
        config.window.y,
        config.window.maximized
    );

    // LaunchBuilderでウィンドウ設定を適用
    let launch_builder = dioxus::LaunchBuilder::desktop().with_cfg(
        dioxus::desktop::Config::new().with_window(
            dioxus::desktop::tao::window::WindowBuilder::new()
                .with_title("twipred - Twitch Predictions Manager")
                .with_inner_size(dioxus::desktop::tao::dpi::LogicalSize::new(
                    config.window.width as f64,
                    config.window.height as f64,
                ))
                .with_position(dioxus::desktop::tao::dpi::LogicalPosition::new(
                    config.window.x as f64,
                    config.window.y as f64,
                ))
                .with_maximized(config.window.maximized)
                .with_resizable(true),
        ),
    );

    // Ctrl+Cシグナルハンドラー
    ctrlc::set_handler(move || {
        tracing::info!("🛑 Termination signal received");
        save_window_config_on_exit();
        std::process::exit(0);
    })
    .map_err(|e| {
        twipred::GuiError::Configuration(format!("Failed to set signal handler: {}", e))
    })?;

    // Dioxusアプリケーションを起動
    launch_builder.launch(app);

    // 正常終了時の設定保存
    save_window_config_on_exit();

    tracing::info!("👋 twipred shutting down");
    Ok(())
}

/// 終了時にウィンドウ設定を保存
fn save_window_config_on_exit() {
    let Ok(last_config_guard) = LAST_WINDOW_CONFIG.lock() else {
        return;
    };
    let Some(window_config) = last_config_guard.as_ref() else {
        tracing::debug!("No window state recorded, skipping save");
        return;
    };

    match config_manager::ConfigManager::new() {
        Ok(config_manager) => match config_manager.load_config() {
            Ok(mut config) => {
                config.window = window_config.clone();
                if let Err(e) = config_manager.save_config(&config) {
                    tracing::error!("❌ Failed to save window config: {}", e);
                } else {
                    tracing::info!(
                        "💾 Window config saved: {}x{} at ({}, {})",
                        config.window.width,
                        config.window.height,
                        config.window.x,
                        config.window.y
                    );
                }
            }
            Err(e) => tracing::warn!("⚠️ Could not reload config for window save: {}", e),
        },
        Err(e) => tracing::error!("❌ Could not create config manager on exit: {}", e),
    }
}
