//! 認証付きリクエストラッパー
//!
//! Helix呼び出しを401（アクセストークン失効）に対して耐性のあるものにする。
//! 401を検出したら1回だけリフレッシュして元のリクエストを1回だけ再試行する。
//! 再試行も失敗した場合はそのまま呼び出し元へ返す（無限リフレッシュ防止）。

use std::future::Future;

use crate::api::helix::HelixError;
use crate::api::oauth::OAuthError;

#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error(transparent)]
    Helix(#[from] HelixError),
    #[error("Token refresh failed")]
    Refresh(#[from] OAuthError),
}

impl RequestError {
    /// リトライ後もなお認証エラーのままか
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RequestError::Helix(HelixError::Unauthorized))
    }
}

/// 401で1回だけリフレッシュ・リトライする
///
/// `request` は呼び出しのたびに現在のアクセストークンを読み直すこと
/// （古いトークンをクロージャに閉じ込めない）。`refresh` は新しいトークン
/// ペアの取得とセッション状態への反映・永続化まで済ませてから返る。
///
/// 保証: リフレッシュは1回まで、元のリクエストは合計2回まで。
pub async fn send_with_refresh<T, F, Fut, R, RFut>(
    mut request: F,
    refresh: R,
) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HelixError>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Result<(), OAuthError>>,
{
    match request().await {
        Err(HelixError::Unauthorized) => {
            tracing::info!("🔄 Access token rejected, refreshing once and retrying");
            refresh().await?;
            request().await.map_err(RequestError::from)
        }
        other => other.map_err(RequestError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_success_without_refresh() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let refresh_calls_in = Arc::clone(&refresh_calls);

        let result = tokio_test::block_on(send_with_refresh(
            || async { Ok::<_, HelixError>(42) },
            move || {
                refresh_calls_in.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        ));

        assert_eq!(result.unwrap(), 42);
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_triggers_single_refresh_and_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let refresh_calls = Arc::new(AtomicUsize::new(0));

        let attempts_in = Arc::clone(&attempts);
        let refresh_calls_in = Arc::clone(&refresh_calls);

        let result = send_with_refresh(
            move || {
                let n = attempts_in.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(HelixError::Unauthorized)
                    } else {
                        Ok("retried")
                    }
                }
            },
            move || {
                refresh_calls_in.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "retried");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_unauthorized_does_not_refresh_again() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let refresh_calls = Arc::new(AtomicUsize::new(0));

        let attempts_in = Arc::clone(&attempts);
        let refresh_calls_in = Arc::clone(&refresh_calls);

        let result: Result<(), RequestError> = send_with_refresh(
            move || {
                attempts_in.fetch_add(1, Ordering::SeqCst);
                async { Err(HelixError::Unauthorized) }
            },
            move || {
                refresh_calls_in.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
        .await;

        assert!(result.unwrap_err().is_unauthorized());
        // 元のリクエストは2回まで、リフレッシュは1回だけ
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_without_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_in = Arc::clone(&attempts);

        let result: Result<(), RequestError> = send_with_refresh(
            move || {
                attempts_in.fetch_add(1, Ordering::SeqCst);
                async { Err(HelixError::Unauthorized) }
            },
            || async {
                Err(OAuthError::Rejected {
                    status: 400,
                    message: "Invalid refresh token".to_string(),
                })
            },
        )
        .await;

        assert!(matches!(result, Err(RequestError::Refresh(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_auth_error_passes_through() {
        let refresh_calls = Arc::new(AtomicUsize::new(0));
        let refresh_calls_in = Arc::clone(&refresh_calls);

        let result: Result<(), RequestError> = send_with_refresh(
            || async {
                Err(HelixError::Api {
                    status: 500,
                    message: "internal".to_string(),
                })
            },
            move || {
                refresh_calls_in.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(RequestError::Helix(HelixError::Api { status: 500, .. }))
        ));
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
    }
}
