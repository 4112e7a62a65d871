// GUI用ユーティリティ関数

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use tracing::{debug, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::gui::config_manager::{LogConfig, WindowConfig};

/// non_blockingライターのguard（プロセス終了までフラッシュを生かす）
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// ログディレクトリを解決する（設定優先、なければXDGデータディレクトリ）
fn resolve_log_dir(config: &LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &config.log_dir {
        return Ok(dir.clone());
    }
    let project_dirs = directories::ProjectDirs::from("io", "twipred", "twipred")
        .context("Failed to get project directories")?;
    Ok(project_dirs.data_dir().join("logs"))
}

/// 古いログファイルを削除する（日次ローテーションの産物を上限数まで）
pub fn cleanup_old_logs(log_dir: &Path, max_files: u32) {
    let pattern = log_dir.join("twipred.log*");
    let mut files: Vec<PathBuf> = match glob::glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            warn!("⚠️ Invalid log glob pattern: {}", e);
            return;
        }
    };

    if files.len() <= max_files as usize {
        return;
    }

    // 日付サフィックス付きファイル名は辞書順 = 時系列順
    files.sort();
    let remove_count = files.len() - max_files as usize;
    for path in files.into_iter().take(remove_count) {
        match fs::remove_file(&path) {
            Ok(()) => debug!("🗑️ Removed old log file: {}", path.display()),
            Err(e) => warn!("⚠️ Failed to remove old log {}: {}", path.display(), e),
        }
    }
}

/// 強化されたログ初期化
///
/// コンソール出力に加え、設定が有効ならXDGデータディレクトリへ
/// 日次ローテーションで書き出す。
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    if config.enable_file_logging {
        let log_dir = resolve_log_dir(config)?;
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
        cleanup_old_logs(&log_dir, config.max_log_files);

        let file_appender = tracing_appender::rolling::daily(&log_dir, "twipred.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()?;
    }

    Ok(())
}

/// 時刻フォーマット
pub fn format_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// ウィンドウ位置・サイズを妥当な範囲に収める
pub fn validate_window_bounds(config: &mut WindowConfig) {
    if config.x < 0 {
        config.x = 100;
    }
    if config.y < 0 {
        config.y = 100;
    }
    if config.width < 480 {
        config.width = 480;
    }
    if config.height < 360 {
        config.height = 360;
    }
}

/// エラー詳細のログ
pub fn log_error_with_context(error: &anyhow::Error, context: &str) {
    error!(
        context = context,
        error = %error,
        error_chain = ?error.chain().collect::<Vec<_>>(),
        "❌ Error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_window_bounds_clamps_negative_position() {
        let mut config = WindowConfig {
            width: 800,
            height: 600,
            x: -50,
            y: -10,
            maximized: false,
        };
        validate_window_bounds(&mut config);
        assert_eq!(config.x, 100);
        assert_eq!(config.y, 100);
    }

    #[test]
    fn test_validate_window_bounds_enforces_minimum_size() {
        let mut config = WindowConfig {
            width: 100,
            height: 50,
            x: 0,
            y: 0,
            maximized: false,
        };
        validate_window_bounds(&mut config);
        assert_eq!(config.width, 480);
        assert_eq!(config.height, 360);
    }

    #[test]
    fn test_cleanup_old_logs_keeps_newest() {
        let dir = tempdir().unwrap();
        for day in 1..=5 {
            let path = dir.path().join(format!("twipred.log.2024-11-0{}", day));
            fs::write(&path, "log").unwrap();
        }

        cleanup_old_logs(dir.path(), 2);

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&"twipred.log.2024-11-04".to_string()));
        assert!(remaining.contains(&"twipred.log.2024-11-05".to_string()));
    }

    #[test]
    fn test_cleanup_old_logs_noop_under_limit() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("twipred.log.2024-11-01"), "log").unwrap();

        cleanup_old_logs(dir.path(), 14);

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_format_timestamp_shape() {
        let ts = format_timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.chars().filter(|&c| c == ':').count(), 2);
    }
}
