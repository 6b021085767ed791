use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    EntityUpdateRequest, EntityUpdateResponse, HealthStatus, PlatformsResponse, ThreadContext,
    TransformRequest, TransformResponse, WrapRequest, WrapResponse,
};
use crate::core::gap::GapEnvelope;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::SettingsStore;

/// HTTP client for the GAP service.
///
/// The base URL is read from settings on every call so that edits made in the popup
/// apply immediately. One round trip per operation; no retries.
#[derive(Clone)]
pub struct GapServiceClient {
    http: Client,
    settings: SettingsStore,
}

impl GapServiceClient {
    pub fn new(settings: SettingsStore) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("gap-extension/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, settings })
    }

    async fn endpoint(&self, path: &str) -> String {
        let base = self.settings.service_url().await;
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path).await;
        tracing::debug!("[Service] POST {}", url);
        let response = self.http.post(&url).json(body).send().await?;
        Self::parse(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> AppResult<R> {
        let url = self.endpoint(path).await;
        tracing::debug!("[Service] GET {}", url);
        let response = self.http.get(&url).send().await?;
        Self::parse(response).await
    }

    async fn parse<R: DeserializeOwned>(response: Response) -> AppResult<R> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("[Service] {} returned {}", response.url(), status);
            return Err(AppError::ServiceStatus(status.as_u16()));
        }
        Ok(response.json::<R>().await?)
    }

    /// `POST /gap/wrap`
    pub async fn wrap(&self, request: &WrapRequest) -> AppResult<GapEnvelope> {
        let response: WrapResponse = self.post_json("/gap/wrap", request).await?;
        tracing::info!(
            "[Service] Wrapped {} chars for {} ({})",
            request.content.chars().count(),
            request.platform,
            request.chat_id
        );
        GapEnvelope::parse(response.gap_markdown).map_err(|_| {
            AppError::Validation("Service returned content without GAP markers".to_string())
        })
    }

    /// `POST /gap/transform`
    pub async fn transform(&self, request: &TransformRequest) -> AppResult<String> {
        let response: TransformResponse = self.post_json("/gap/transform", request).await?;
        tracing::info!("[Service] Transformed envelope for {}", request.target_platform);
        Ok(response.transformed_content)
    }

    /// `GET /health`. Any failure reads as the service not being available.
    pub async fn check_health(&self) -> AppResult<HealthStatus> {
        let url = self.endpoint("/health").await;
        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::warn!("[Service] Health check failed: {}", e);
            AppError::ServiceUnavailable
        })?;

        if !response.status().is_success() {
            tracing::warn!("[Service] Health check returned {}", response.status());
            return Err(AppError::ServiceUnavailable);
        }
        response
            .json::<HealthStatus>()
            .await
            .map_err(|_| AppError::ServiceUnavailable)
    }

    /// `GET /gap/platforms`
    pub async fn supported_platforms(&self) -> AppResult<Vec<String>> {
        let response: PlatformsResponse = self.get_json("/gap/platforms").await?;
        Ok(response.platforms)
    }

    /// `GET /gap/context/{thread_id}`
    pub async fn thread_context(&self, thread_id: &str) -> AppResult<ThreadContext> {
        if thread_id.trim().is_empty() {
            return Err(AppError::Validation("Thread id is empty".to_string()));
        }
        let path = format!("/gap/context/{}", urlencoding::encode(thread_id));
        self.get_json(&path).await
    }

    /// `POST /gap/update-entity`
    pub async fn update_entity(&self, request: &EntityUpdateRequest) -> AppResult<GapEnvelope> {
        let response: EntityUpdateResponse = self.post_json("/gap/update-entity", request).await?;
        GapEnvelope::parse(response.updated_markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::service::types::{DEFAULT_ENTITY_TYPE, DEFAULT_ROLE};
    use crate::shared::settings::PersistentSettings;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(url: &str) -> GapServiceClient {
        let settings = SettingsStore::in_memory(PersistentSettings {
            service_url: url.to_string(),
            ..Default::default()
        });
        GapServiceClient::new(settings).unwrap()
    }

    fn wrap_request(content: &str) -> WrapRequest {
        WrapRequest {
            content: content.to_string(),
            platform: "claude.ai".to_string(),
            chat_id: "ext_1".to_string(),
            thread_id: None,
            role: DEFAULT_ROLE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_wrap_returns_envelope_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let envelope = "[GAP:START]\nEntities: None\nHello\n[GAP:END]";
        let mock = server
            .mock("POST", "/gap/wrap")
            .match_body(Matcher::Json(json!({
                "content": "Hello",
                "platform": "claude.ai",
                "chat_id": "ext_1",
                "role": "assistant"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "status": "success", "gap_markdown": envelope }).to_string())
            .create_async()
            .await;

        let wrapped = client_for(&server.url()).wrap(&wrap_request("Hello")).await.unwrap();
        assert_eq!(wrapped.as_str(), envelope);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_wrap_non_success_carries_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/gap/wrap")
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server.url()).wrap(&wrap_request("Hello")).await.unwrap_err();
        assert_eq!(err, AppError::ServiceStatus(500));
        assert_eq!(err.to_string(), "Service error: 500");
    }

    #[tokio::test]
    async fn test_wrap_rejects_output_without_markers() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/gap/wrap")
            .with_status(200)
            .with_body(json!({ "gap_markdown": "no markers" }).to_string())
            .create_async()
            .await;

        let err = client_for(&server.url()).wrap(&wrap_request("Hello")).await.unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("Service returned content without GAP markers".to_string())
        );
    }

    #[tokio::test]
    async fn test_transform_sends_optional_additions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/gap/transform")
            .match_body(Matcher::Json(json!({
                "gap_markdown": "[GAP:START]x[GAP:END]",
                "target_platform": "gemini",
                "context_additions": { "tone": "formal" }
            })))
            .with_status(200)
            .with_body(json!({ "transformed_content": "x for gemini" }).to_string())
            .create_async()
            .await;

        let request = TransformRequest {
            gap_markdown: "[GAP:START]x[GAP:END]".into(),
            target_platform: "gemini".into(),
            context_additions: Some([("tone".to_string(), "formal".to_string())].into()),
        };
        let out = client_for(&server.url()).transform(&request).await.unwrap();
        assert_eq!(out, "x for gemini");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_health_keeps_extra_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(json!({ "status": "healthy", "version": "0.1.0", "cached_messages": 3 }).to_string())
            .create_async()
            .await;

        let health = client_for(&server.url()).check_health().await.unwrap();
        assert_eq!(health.version, "0.1.0");
        assert_eq!(health.extra.get("cached_messages"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_health_failure_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/health").with_status(503).create_async().await;

        let err = client_for(&server.url()).check_health().await.unwrap_err();
        assert_eq!(err.to_string(), "Service not available");
    }

    #[tokio::test]
    async fn test_base_url_read_per_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gap/platforms")
            .with_status(200)
            .with_body(json!({ "status": "success", "platforms": ["claude", "chatgpt"] }).to_string())
            .create_async()
            .await;

        let settings = SettingsStore::in_memory(PersistentSettings::default());
        let client = GapServiceClient::new(settings.clone()).unwrap();
        settings
            .update(crate::shared::settings::SettingsPatch {
                service_url: Some(server.url()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(client.supported_platforms().await.unwrap(), vec!["claude", "chatgpt"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_service_url_when_unset() {
        let client = client_for("");
        assert_eq!(client.endpoint("/health").await, "http://localhost:8000/health");
    }

    #[tokio::test]
    async fn test_thread_context_encodes_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gap/context/thread%201")
            .with_status(200)
            .with_body(json!({ "status": "success", "thread_id": "thread 1", "message_count": 0, "context": [] }).to_string())
            .create_async()
            .await;

        let ctx = client_for(&server.url()).thread_context("thread 1").await.unwrap();
        assert_eq!(ctx.message_count, 0);
        assert_eq!(ctx.thread_id, "thread 1");
    }

    #[tokio::test]
    async fn test_update_entity() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/gap/update-entity")
            .match_body(Matcher::PartialJson(json!({ "entity_type": "user_defined" })))
            .with_status(200)
            .with_body(json!({ "updated_markdown": "[GAP:START]Paris=city[GAP:END]" }).to_string())
            .create_async()
            .await;

        let request = EntityUpdateRequest {
            gap_markdown: "[GAP:START]Paris[GAP:END]".into(),
            entity_key: "Paris".into(),
            entity_value: "city".into(),
            entity_type: DEFAULT_ENTITY_TYPE.into(),
        };
        let updated = client_for(&server.url()).update_entity(&request).await.unwrap();
        assert!(updated.as_str().contains("Paris=city"));
    }
}
