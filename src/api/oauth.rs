//! Twitch OAuth2（認可コードフロー）
//!
//! 認可URLの組み立て、CSRF対策のstateノンス、コード交換、
//! リフレッシュグラント、ループバックのコールバック待ち受けを提供します。

use rand::RngCore;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// トークンエンドポイント
pub const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
/// 認可エンドポイント
pub const AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
/// 予測の管理に必要なスコープ
pub const PREDICTIONS_SCOPE: &str = "channel:manage:predictions";

#[derive(thiserror::Error, Debug)]
pub enum OAuthError {
    #[error("Request failed")]
    Request(#[from] reqwest::Error),
    #[error("Failed to parse JSON")]
    Parse(#[from] serde_json::Error),
    #[error("Token endpoint rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Token response missing access_token or refresh_token")]
    IncompleteTokenResponse,
    #[error("Authorization state mismatch")]
    StateMismatch,
    #[error("Authorization denied: {0}")]
    Denied(String),
    #[error("Malformed callback request")]
    MalformedCallback,
    #[error("Unsupported redirect URI: {0}")]
    BadRedirectUri(String),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// アクセストークンとリフレッシュトークンの組
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// トークンエンドポイントのエラーボディ（{"status":400,"message":"..."}）
#[derive(Debug, Deserialize)]
struct TokenErrorPayload {
    status: u16,
    #[serde(default)]
    message: String,
}

/// CSRF対策のstateノンスを生成する（128bitのランダム値をhexで）
pub fn generate_state_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Twitchの認可URLを組み立てる
pub fn build_authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(PREDICTIONS_SCOPE),
        urlencoding::encode(state),
    )
}

async fn request_tokens(
    http: &reqwest::Client,
    params: &[(&str, &str)],
) -> Result<TokenPair, OAuthError> {
    let response = http.post(TOKEN_URL).form(params).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<TokenErrorPayload>(&body) {
            Ok(payload) => OAuthError::Rejected {
                status: payload.status,
                message: payload.message,
            },
            Err(_) => OAuthError::Rejected {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            },
        });
    }

    // 欠けたフィールドはserdeエラーではなく専用エラーにする
    let value: serde_json::Value = serde_json::from_str(&body)?;
    match (
        value.get("access_token").and_then(|v| v.as_str()),
        value.get("refresh_token").and_then(|v| v.as_str()),
    ) {
        (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
            Ok(TokenPair {
                access_token: access.to_string(),
                refresh_token: refresh.to_string(),
            })
        }
        _ => Err(OAuthError::IncompleteTokenResponse),
    }
}

/// 認可コードをトークンに交換する
pub async fn exchange_code_for_tokens(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenPair, OAuthError> {
    request_tokens(
        http,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await
}

/// リフレッシュトークンで新しいトークンペアを取得する
pub async fn refresh_access_token(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenPair, OAuthError> {
    request_tokens(
        http,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await
}

/// リダイレクトで返ってきたクエリパラメータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// リダイレクトURIからバインド先(host:port)とパスを取り出す
///
/// 対応するのは http://localhost:PORT/path 形式のみ。Twitchのアプリ設定も
/// ループバックのみを許可している前提。
pub fn parse_redirect_uri(redirect_uri: &str) -> Result<(String, String), OAuthError> {
    let rest = redirect_uri
        .strip_prefix("http://")
        .ok_or_else(|| OAuthError::BadRedirectUri(redirect_uri.to_string()))?;

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    if authority.is_empty() {
        return Err(OAuthError::BadRedirectUri(redirect_uri.to_string()));
    }

    let bind_addr = if authority.contains(':') {
        authority.to_string()
    } else {
        format!("{}:80", authority)
    };
    Ok((bind_addr, path.to_string()))
}

/// HTTPリクエストラインからコールバッククエリを取り出す
///
/// 期待するパス以外（favicon.ico等）にはNoneを返す。
pub fn parse_callback_request(request_line: &str, expected_path: &str) -> Option<CallbackQuery> {
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    if method != "GET" {
        return None;
    }

    let (path, query) = match target.find('?') {
        Some(idx) => (&target[..idx], &target[idx + 1..]),
        None => (target, ""),
    };
    if path != expected_path {
        return None;
    }

    let mut result = CallbackQuery::default();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match pair.find('=') {
            Some(idx) => (&pair[..idx], &pair[idx + 1..]),
            None => (pair, ""),
        };
        let decoded = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "code" => result.code = Some(decoded),
            "state" => result.state = Some(decoded),
            "error" => result.error = Some(decoded),
            _ => {}
        }
    }
    Some(result)
}

const CALLBACK_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nConnection: close\r\n\r\n<html><body><h2>Twitch authorization complete.</h2><p>You can close this window and return to twipred.</p></body></html>";
const NOT_FOUND_RESPONSE: &str =
    "HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\nNot Found";

/// リダイレクトURIで1回分のコールバックを待ち受ける
///
/// 期待するパスへのGETが届くまで接続を受け続け、届いたらクエリを返す。
/// ブラウザのfavicon取得などは404で流す。
pub async fn wait_for_callback(redirect_uri: &str) -> Result<CallbackQuery, OAuthError> {
    let (bind_addr, expected_path) = parse_redirect_uri(redirect_uri)?;
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("👂 Waiting for OAuth callback on http://{}", bind_addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let mut buffer = vec![0u8; 4096];
        let read = socket.read(&mut buffer).await?;
        let request = String::from_utf8_lossy(&buffer[..read]);

        let request_line = request.lines().next().unwrap_or_default();
        match parse_callback_request(request_line, &expected_path) {
            Some(query) => {
                let _ = socket.write_all(CALLBACK_RESPONSE.as_bytes()).await;
                let _ = socket.shutdown().await;
                tracing::info!("✅ OAuth callback received from {}", peer);
                return Ok(query);
            }
            None => {
                tracing::debug!("🔇 Ignoring unrelated request from {}: {}", peer, request_line);
                let _ = socket.write_all(NOT_FOUND_RESPONSE.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state_nonce_is_random_hex() {
        let a = generate_state_nonce();
        let b = generate_state_nonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_build_authorize_url() {
        let url = build_authorize_url("abc123", "http://localhost:3000/callback", "s7a7e");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=abc123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback"));
        assert!(url.contains("scope=channel%3Amanage%3Apredictions"));
        assert!(url.contains("state=s7a7e"));
    }

    #[test]
    fn test_parse_redirect_uri() {
        let (addr, path) = parse_redirect_uri("http://localhost:3000/callback").unwrap();
        assert_eq!(addr, "localhost:3000");
        assert_eq!(path, "/callback");

        let (addr, path) = parse_redirect_uri("http://127.0.0.1:8080").unwrap();
        assert_eq!(addr, "127.0.0.1:8080");
        assert_eq!(path, "/");
    }

    #[test]
    fn test_parse_redirect_uri_rejects_https() {
        let result = parse_redirect_uri("https://example.com/callback");
        assert!(matches!(result, Err(OAuthError::BadRedirectUri(_))));
    }

    #[test]
    fn test_parse_callback_request_success() {
        let query = parse_callback_request(
            "GET /callback?code=abc&state=xyz&scope=channel%3Amanage%3Apredictions HTTP/1.1",
            "/callback",
        )
        .unwrap();
        assert_eq!(query.code.as_deref(), Some("abc"));
        assert_eq!(query.state.as_deref(), Some("xyz"));
        assert!(query.error.is_none());
    }

    #[test]
    fn test_parse_callback_request_error_param() {
        let query =
            parse_callback_request("GET /callback?error=access_denied HTTP/1.1", "/callback")
                .unwrap();
        assert_eq!(query.error.as_deref(), Some("access_denied"));
        assert!(query.code.is_none());
    }

    #[test]
    fn test_parse_callback_request_ignores_other_paths() {
        assert!(parse_callback_request("GET /favicon.ico HTTP/1.1", "/callback").is_none());
        assert!(parse_callback_request("POST /callback HTTP/1.1", "/callback").is_none());
    }

    #[test]
    fn test_token_pair_deserialization() {
        let json = r#"{"access_token":"at","refresh_token":"rt","expires_in":14400}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.access_token, "at");
        assert_eq!(pair.refresh_token, "rt");
    }
}
