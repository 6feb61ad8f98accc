//! HTTP REST API 클라이언트.
//!
//! `DebateApi` 포트 구현. 상태 코드별 에러 매핑 + 재시도 로직.

use async_trait::async_trait;
use std::time::Duration;
use toron_core::error::CoreError;
use toron_core::models::debate::Debate;
use toron_core::models::message::Message;
use toron_core::models::suggestion::SuggestionResponse;
use toron_core::ports::api_client::DebateApi;
use tracing::{debug, warn};

/// 기본 재시도 횟수
const DEFAULT_MAX_RETRIES: u32 = 3;

/// 재시도 가능한 에러인지 판별
fn is_retryable(error: &CoreError) -> bool {
    matches!(
        error,
        CoreError::Network(_) | CoreError::ServiceUnavailable(_) | CoreError::RateLimit { .. }
    )
}

/// REST API 클라이언트 — `DebateApi` 포트 구현
pub struct HttpDebateApi {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpDebateApi {
    /// 새 HTTP API 클라이언트 생성
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// 재시도 횟수 설정
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let status_code = status.as_u16();
        // Retry-After 헤더는 본문 소비 전에 읽는다 (기본 60초)
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);
        let text = resp.text().await.unwrap_or_else(|e| {
            tracing::warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status_code {
            404 => Err(CoreError::NotFound {
                resource_type: "API".to_string(),
                id: text,
            }),
            429 => Err(CoreError::RateLimit {
                retry_after_secs: retry_after,
            }),
            503 => Err(CoreError::ServiceUnavailable(text)),
            _ => Err(CoreError::Internal(format!("API 에러 ({status}): {text}"))),
        }
    }

    /// 재시도가 포함된 요청 실행
    ///
    /// exponential backoff: 1s → 2s → 4s
    async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut last_error = CoreError::Internal("요청 실패".to_string());
        let mut delay = Duration::from_secs(1);

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable(&e) || attempt == self.max_retries {
                        return Err(e);
                    }

                    warn!(
                        "요청 실패 (시도 {}/{}): {e}, {delay:?} 후 재시도",
                        attempt + 1,
                        self.max_retries + 1
                    );

                    // RateLimit의 경우 서버 지정 대기 시간 사용
                    if let CoreError::RateLimit { retry_after_secs } = &e {
                        delay = Duration::from_secs(*retry_after_secs);
                    }

                    last_error = e;
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(30));
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl DebateApi for HttpDebateApi {
    async fn fetch_debates(&self) -> Result<Vec<Debate>, CoreError> {
        debug!("토론 목록 조회");

        self.execute_with_retry(|| async {
            let resp = self
                .client
                .get(self.url("/api/debates"))
                .send()
                .await
                .map_err(|e| CoreError::Network(format!("토론 목록 요청 실패: {e}")))?;

            let resp = self.check_response(resp).await?;
            let debates: Vec<Debate> = resp
                .json()
                .await
                .map_err(|e| CoreError::Internal(format!("토론 목록 파싱 실패: {e}")))?;

            debug!("토론 목록 수신: {}건", debates.len());
            Ok(debates)
        })
        .await
    }

    async fn fetch_messages(&self, debate_id: i64) -> Result<Vec<Message>, CoreError> {
        debug!("메시지 이력 조회: debate_id={debate_id}");

        self.execute_with_retry(|| async {
            let path = format!("/api/debates/{debate_id}/messages");
            let resp = self
                .client
                .get(self.url(&path))
                .send()
                .await
                .map_err(|e| CoreError::Network(format!("메시지 이력 요청 실패: {e}")))?;

            let resp = self.check_response(resp).await?;
            let messages: Vec<Message> = resp
                .json()
                .await
                .map_err(|e| CoreError::Internal(format!("메시지 이력 파싱 실패: {e}")))?;

            debug!("메시지 이력 수신: {}건", messages.len());
            Ok(messages)
        })
        .await
    }

    async fn post_message(
        &self,
        debate_id: i64,
        content: &str,
        author: &str,
    ) -> Result<Message, CoreError> {
        debug!("메시지 게시: debate_id={debate_id}, author={author}");

        self.execute_with_retry(|| async {
            let path = format!("/api/debates/{debate_id}/messages");
            let body = serde_json::json!({ "content": content, "author": author });
            let resp = self
                .client
                .post(self.url(&path))
                .json(&body)
                .send()
                .await
                .map_err(|e| CoreError::Network(format!("메시지 게시 요청 실패: {e}")))?;

            let resp = self.check_response(resp).await?;
            let message: Message = resp
                .json()
                .await
                .map_err(|e| CoreError::Internal(format!("게시 응답 파싱 실패: {e}")))?;

            debug!("메시지 게시 성공: id={}", message.id);
            Ok(message)
        })
        .await
    }

    async fn fetch_suggestions(
        &self,
        debate_id: i64,
        message_id: i64,
    ) -> Result<SuggestionResponse, CoreError> {
        debug!("제안 조회: debate_id={debate_id}, message_id={message_id}");

        self.execute_with_retry(|| async {
            let path = format!("/api/debates/{debate_id}/messages/{message_id}/suggestions");
            let resp = self
                .client
                .get(self.url(&path))
                .send()
                .await
                .map_err(|e| CoreError::Network(format!("제안 요청 실패: {e}")))?;

            let resp = self.check_response(resp).await?;
            let suggestions: SuggestionResponse = resp
                .json()
                .await
                .map_err(|e| CoreError::Internal(format!("제안 응답 파싱 실패: {e}")))?;

            Ok(suggestions)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_creation() {
        let client = HttpDebateApi::new("http://localhost:8000/", Duration::from_secs(30)).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn with_max_retries() {
        let client = HttpDebateApi::new("http://localhost:8000", Duration::from_secs(30))
            .unwrap()
            .with_max_retries(5);
        assert_eq!(client.max_retries, 5);
    }

    #[test]
    fn is_retryable_errors() {
        assert!(is_retryable(&CoreError::Network("test".to_string())));
        assert!(is_retryable(&CoreError::ServiceUnavailable(
            "test".to_string()
        )));
        assert!(is_retryable(&CoreError::RateLimit {
            retry_after_secs: 60
        }));
        assert!(!is_retryable(&CoreError::Internal("test".to_string())));
        assert!(!is_retryable(&CoreError::NotFound {
            resource_type: "API".to_string(),
            id: "x".to_string()
        }));
    }

    fn make_client(server: &mockito::ServerGuard) -> HttpDebateApi {
        HttpDebateApi::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_debates_success() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server);

        let mock = server
            .mock("GET", "/api/debates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1,"title":"기본소득 도입"},{"id":2,"title":"원전 확대"}]"#)
            .create_async()
            .await;

        let debates = client.fetch_debates().await.unwrap();
        assert_eq!(debates.len(), 2);
        assert_eq!(debates[0].title, "기본소득 도입");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_messages_success() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server);

        let mock = server
            .mock("GET", "/api/debates/7/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":1,"debate_id":7,"author":"alice","content":"첫 주장"},
                    {"id":2,"debate_id":7,"author":"bob","content":"반론"}]"#,
            )
            .create_async()
            .await;

        let messages = client.fetch_messages(7).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, 1);
        assert_eq!(messages[1].author, "bob");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_message_returns_server_assigned_id() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server);

        let mock = server
            .mock("POST", "/api/debates/7/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":42,"debate_id":7,"author":"alice","content":"새 주장"}"#)
            .create_async()
            .await;

        let message = client.post_message(7, "새 주장", "alice").await.unwrap();
        assert_eq!(message.id, 42);
        assert_eq!(message.content, "새 주장");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_suggestions_success() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server);

        let mock = server
            .mock("GET", "/api/debates/7/messages/3/suggestions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"suggestions":["근거를 제시하세요","통계를 인용하세요"]}"#)
            .create_async()
            .await;

        let resp = client.fetch_suggestions(7, 3).await.unwrap();
        assert_eq!(resp.suggestions.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_messages_404() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server);

        let mock = server
            .mock("GET", "/api/debates/99/messages")
            .with_status(404)
            .with_body("debate not found")
            .create_async()
            .await;

        let result = client.fetch_messages(99).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_429() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server).with_max_retries(0); // 재시도 없이 즉시 실패

        let mock = server
            .mock("GET", "/api/debates")
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let result = client.fetch_debates().await;
        assert!(matches!(result, Err(CoreError::RateLimit { .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_unavailable_503() {
        let mut server = mockito::Server::new_async().await;
        let client = make_client(&server).with_max_retries(0);

        let mock = server
            .mock("POST", "/api/debates/7/messages")
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let result = client.post_message(7, "내용", "alice").await;
        assert!(matches!(result, Err(CoreError::ServiceUnavailable(_))));
        mock.assert_async().await;
    }
}
