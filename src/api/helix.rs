use serde::{Deserialize, Serialize};

/// Helix APIのベースURL
pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

#[derive(thiserror::Error, Debug)]
pub enum HelixError {
    #[error("Request failed")]
    Request(#[from] reqwest::Error),
    #[error("Twitch rejected the access token")]
    Unauthorized,
    #[error("Twitch API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse JSON")]
    Parse(#[from] serde_json::Error),
}

/// Helixのエラーペイロード（例: {"error":"Unauthorized","status":401,"message":"..."}）
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorPayload {
    #[serde(default)]
    pub error: String,
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

/// Helixレスポンスの共通エンベロープ（{"data":[...]}）
#[derive(Debug, Clone, Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TwitchUser {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub broadcaster_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelInfo {
    pub game_name: String,
    pub title: String,
}

/// 予測の進行状態
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, derive_more::Display, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionStatus {
    #[default]
    #[display("ACTIVE")]
    Active,
    #[display("LOCKED")]
    Locked,
    #[display("RESOLVED")]
    Resolved,
    #[display("CANCELED")]
    Canceled,
}

impl PredictionStatus {
    /// ACTIVE / LOCKED は「進行中」、RESOLVED / CANCELED は終了済み
    pub fn is_running(&self) -> bool {
        matches!(self, PredictionStatus::Active | PredictionStatus::Locked)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionOutcome {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelixPrediction {
    pub id: String,
    pub title: String,
    pub outcomes: Vec<PredictionOutcome>,
    pub prediction_window: u32,
    pub status: PredictionStatus,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 予測作成リクエストのボディ
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatePredictionRequest {
    pub broadcaster_id: String,
    pub title: String,
    pub outcomes: Vec<OutcomeTitle>,
    pub prediction_window: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutcomeTitle {
    pub title: String,
}

impl CreatePredictionRequest {
    pub fn new(broadcaster_id: &str, title: &str, outcomes: &[String], window: u32) -> Self {
        Self {
            broadcaster_id: broadcaster_id.to_string(),
            title: title.to_string(),
            outcomes: outcomes
                .iter()
                .map(|title| OutcomeTitle {
                    title: title.clone(),
                })
                .collect(),
            prediction_window: window,
        }
    }
}

/// ステータスコードとボディからHelixエラーを分類する
///
/// 401はHTTPステータスだけでなく、エラーペイロードの status フィールド
/// としても届くことがある（プロキシ経由などで外側が200のまま）。
pub fn classify_error(status: u16, body: &str) -> HelixError {
    if status == 401 {
        return HelixError::Unauthorized;
    }
    match serde_json::from_str::<ApiErrorPayload>(body) {
        Ok(payload) if payload.status == 401 => HelixError::Unauthorized,
        Ok(payload) => HelixError::Api {
            status: payload.status,
            message: payload.message,
        },
        Err(_) => HelixError::Api {
            status,
            message: body.chars().take(200).collect(),
        },
    }
}

/// Twitch Helix APIクライアント
#[derive(Debug, Clone)]
pub struct HelixClient {
    http: reqwest::Client,
    base_url: String,
}

impl HelixClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: HELIX_BASE_URL.to_string(),
        }
    }

    /// テスト・モックサーバー用にベースURLを差し替える
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HelixError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body))
    }

    /// ログイン名からユーザーを取得する
    pub async fn get_user_by_login(
        &self,
        client_id: &str,
        access_token: &str,
        login: &str,
    ) -> Result<Option<TwitchUser>, HelixError> {
        let response = self
            .http
            .get(self.endpoint("/users"))
            .header("Client-Id", client_id)
            .bearer_auth(access_token)
            .query(&[("login", login)])
            .send()
            .await?;

        let envelope: DataEnvelope<TwitchUser> = Self::parse(response).await?;
        Ok(envelope.data.into_iter().next())
    }

    /// 直近の予測を新しい順に取得する
    pub async fn get_predictions(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        first: u32,
    ) -> Result<Vec<HelixPrediction>, HelixError> {
        let response = self
            .http
            .get(self.endpoint("/predictions"))
            .header("Client-Id", client_id)
            .bearer_auth(access_token)
            .query(&[
                ("broadcaster_id", broadcaster_id),
                ("first", &first.to_string()),
            ])
            .send()
            .await?;

        let envelope: DataEnvelope<HelixPrediction> = Self::parse(response).await?;
        Ok(envelope.data)
    }

    pub async fn create_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        request: &CreatePredictionRequest,
    ) -> Result<HelixPrediction, HelixError> {
        let response = self
            .http
            .post(self.endpoint("/predictions"))
            .header("Client-Id", client_id)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;

        let envelope: DataEnvelope<HelixPrediction> = Self::parse(response).await?;
        envelope.data.into_iter().next().ok_or(HelixError::Api {
            status: 200,
            message: "create prediction returned no data".to_string(),
        })
    }

    /// 勝者アウトカムを指定して予測を確定する
    pub async fn end_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        prediction_id: &str,
        winning_outcome_id: &str,
    ) -> Result<HelixPrediction, HelixError> {
        let response = self
            .http
            .patch(self.endpoint("/predictions"))
            .header("Client-Id", client_id)
            .bearer_auth(access_token)
            .query(&[
                ("broadcaster_id", broadcaster_id),
                ("id", prediction_id),
                ("status", "RESOLVED"),
                ("winning_outcome_id", winning_outcome_id),
            ])
            .send()
            .await?;

        let envelope: DataEnvelope<HelixPrediction> = Self::parse(response).await?;
        envelope.data.into_iter().next().ok_or(HelixError::Api {
            status: 200,
            message: "end prediction returned no data".to_string(),
        })
    }

    pub async fn cancel_prediction(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
        prediction_id: &str,
    ) -> Result<HelixPrediction, HelixError> {
        let response = self
            .http
            .patch(self.endpoint("/predictions"))
            .header("Client-Id", client_id)
            .bearer_auth(access_token)
            .query(&[
                ("broadcaster_id", broadcaster_id),
                ("id", prediction_id),
                ("status", "CANCELED"),
            ])
            .send()
            .await?;

        let envelope: DataEnvelope<HelixPrediction> = Self::parse(response).await?;
        envelope.data.into_iter().next().ok_or(HelixError::Api {
            status: 200,
            message: "cancel prediction returned no data".to_string(),
        })
    }

    /// 配信中のゲームとタイトルを取得する
    pub async fn get_channel_info(
        &self,
        client_id: &str,
        access_token: &str,
        broadcaster_id: &str,
    ) -> Result<Option<ChannelInfo>, HelixError> {
        let response = self
            .http
            .get(self.endpoint("/channels"))
            .header("Client-Id", client_id)
            .bearer_auth(access_token)
            .query(&[("broadcaster_id", broadcaster_id)])
            .send()
            .await?;

        let envelope: DataEnvelope<ChannelInfo> = Self::parse(response).await?;
        Ok(envelope.data.into_iter().next())
    }
}

impl Default for HelixClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error_http_401() {
        let error = classify_error(401, "");
        assert!(matches!(error, HelixError::Unauthorized));
    }

    #[test]
    fn test_classify_error_payload_401() {
        let body = r#"{"error":"Unauthorized","status":401,"message":"Invalid OAuth token"}"#;
        let error = classify_error(200, body);
        assert!(matches!(error, HelixError::Unauthorized));
    }

    #[test]
    fn test_classify_error_other_status() {
        let body = r#"{"error":"Bad Request","status":400,"message":"Missing broadcaster_id"}"#;
        let error = classify_error(400, body);
        match error {
            HelixError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing broadcaster_id");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_error_unparseable_body() {
        let error = classify_error(503, "<html>Service Unavailable</html>");
        match error {
            HelixError::Api { status, .. } => assert_eq!(status, 503),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_prediction_status_roundtrip() {
        let json = r#""ACTIVE""#;
        let status: PredictionStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status, PredictionStatus::Active);
        assert_eq!(serde_json::to_string(&status).unwrap(), json);
        assert_eq!(format!("{}", PredictionStatus::Canceled), "CANCELED");
    }

    #[test]
    fn test_prediction_status_is_running() {
        assert!(PredictionStatus::Active.is_running());
        assert!(PredictionStatus::Locked.is_running());
        assert!(!PredictionStatus::Resolved.is_running());
        assert!(!PredictionStatus::Canceled.is_running());
    }

    #[test]
    fn test_prediction_deserialization() {
        let json = r#"{
            "id": "pred-1",
            "title": "Will we win this game?",
            "outcomes": [
                {"id": "out-1", "title": "Yes", "color": "BLUE"},
                {"id": "out-2", "title": "No", "color": "PINK"}
            ],
            "prediction_window": 120,
            "status": "LOCKED",
            "created_at": "2024-11-02T10:00:00Z"
        }"#;

        let prediction: HelixPrediction = serde_json::from_str(json).unwrap();
        assert_eq!(prediction.id, "pred-1");
        assert_eq!(prediction.outcomes.len(), 2);
        assert_eq!(prediction.outcomes[1].title, "No");
        assert_eq!(prediction.prediction_window, 120);
        assert!(prediction.status.is_running());
        assert!(prediction.created_at.is_some());
    }

    #[test]
    fn test_envelope_deserialization_empty() {
        let json = r#"{"data":[]}"#;
        let envelope: DataEnvelope<HelixPrediction> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn test_create_prediction_request_serialization() {
        let request = CreatePredictionRequest::new(
            "12345",
            "Next boss first try?",
            &["Yes".to_string(), "No".to_string()],
            90,
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["broadcaster_id"], "12345");
        assert_eq!(value["prediction_window"], 90);
        assert_eq!(value["outcomes"][0]["title"], "Yes");
        assert_eq!(value["outcomes"][1]["title"], "No");
    }

    #[test]
    fn test_user_deserialization_optional_fields() {
        let json = r#"{"id":"999","display_name":"streamer"}"#;
        let user: TwitchUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "999");
        assert!(user.profile_image_url.is_empty());
        assert!(user.broadcaster_type.is_empty());
    }
}
