//! 토론 참가 세션.
//!
//! 조정기 위에 표시 이름을 얹은 사용자 세션. 참가 시 프로필 저장소에서
//! 표시 이름을 읽어오고, 이름 변경은 저장소에 지속된다.

use parking_lot::RwLock;
use std::sync::Arc;
use toron_core::error::CoreError;
use toron_core::models::message::Message;
use toron_core::ports::api_client::DebateApi;
use toron_core::ports::profile::{ProfileStore, DISPLAY_NAME_KEY};
use toron_core::ports::stream::StreamClient;
use tracing::{info, warn};

use crate::reconciler::{SessionState, StreamReconciler};

/// 저장된 이름이 없을 때의 기본 표시 이름
const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// 한 토론에 대한 참가 세션
///
/// 표시 이름은 전송 시점에 작성자로 묶인다. 이름 변경은 이후 전송에만
/// 적용되며 이미 보낸 메시지는 그대로다.
pub struct DiscussionSession {
    reconciler: Arc<StreamReconciler>,
    profile: Arc<dyn ProfileStore>,
    display_name: RwLock<String>,
}

impl DiscussionSession {
    /// 토론 참가: 저장된 표시 이름 복원 후 조정기 시작
    ///
    /// 프로필 조회 실패는 기본 이름으로 대체하고 경고만 남긴다 —
    /// 이름 없이도 토론은 참가할 수 있어야 한다.
    pub async fn join(
        debate_id: i64,
        api: Arc<dyn DebateApi>,
        stream: Arc<dyn StreamClient>,
        profile: Arc<dyn ProfileStore>,
    ) -> Result<Self, CoreError> {
        Self::join_with(debate_id, profile, StreamReconciler::new(api, stream)).await
    }

    /// 스트림 수신 채널 용량을 지정하여 참가
    pub async fn join_with_capacity(
        debate_id: i64,
        api: Arc<dyn DebateApi>,
        stream: Arc<dyn StreamClient>,
        profile: Arc<dyn ProfileStore>,
        channel_capacity: usize,
    ) -> Result<Self, CoreError> {
        let reconciler = StreamReconciler::new(api, stream).with_channel_capacity(channel_capacity);
        Self::join_with(debate_id, profile, reconciler).await
    }

    async fn join_with(
        debate_id: i64,
        profile: Arc<dyn ProfileStore>,
        reconciler: StreamReconciler,
    ) -> Result<Self, CoreError> {
        let display_name = match profile.get(DISPLAY_NAME_KEY).await {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => DEFAULT_DISPLAY_NAME.to_string(),
            Err(e) => {
                warn!("표시 이름 복원 실패, 기본값 사용: {e}");
                DEFAULT_DISPLAY_NAME.to_string()
            }
        };

        let reconciler = Arc::new(reconciler);
        reconciler.start(debate_id).await?;

        info!("토론 참가: debate_id={debate_id}, 표시 이름={display_name}");
        Ok(Self {
            reconciler,
            profile,
            display_name: RwLock::new(display_name),
        })
    }

    /// 현재 표시 이름
    pub fn display_name(&self) -> String {
        self.display_name.read().clone()
    }

    /// 표시 이름 변경 + 프로필 저장소에 지속
    ///
    /// 공백뿐인 이름은 거부한다. 변경은 이후 전송부터 적용된다.
    pub async fn switch_user(&self, name: &str) -> Result<(), CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation {
                field: "display_name".to_string(),
                message: "표시 이름은 비워둘 수 없습니다".to_string(),
            });
        }

        self.profile.set(DISPLAY_NAME_KEY, name).await?;
        *self.display_name.write() = name.to_string();
        info!("표시 이름 변경: {name}");
        Ok(())
    }

    /// 현재 표시 이름으로 메시지 전송
    pub async fn send(&self, content: &str) -> Result<Option<Message>, CoreError> {
        let author = self.display_name();
        self.reconciler.send_message(content, &author).await
    }

    /// 토론 이탈 — 스트림 해제
    pub async fn leave(&self) {
        self.reconciler.stop().await;
    }

    /// 내부 조정기 접근 (스냅샷 조회, 제안 요청)
    pub fn reconciler(&self) -> &StreamReconciler {
        &self.reconciler
    }

    /// 세션 상태
    pub fn state(&self) -> SessionState {
        self.reconciler.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use toron_core::models::debate::Debate;
    use toron_core::models::suggestion::SuggestionResponse;
    use toron_core::ports::stream::{StreamSignal, StreamSubscription};

    /// 전송 기록용 최소 API
    struct RecordingApi {
        posted: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DebateApi for RecordingApi {
        async fn fetch_debates(&self) -> Result<Vec<Debate>, CoreError> {
            Ok(Vec::new())
        }

        async fn fetch_messages(&self, _debate_id: i64) -> Result<Vec<Message>, CoreError> {
            Ok(Vec::new())
        }

        async fn post_message(
            &self,
            debate_id: i64,
            content: &str,
            author: &str,
        ) -> Result<Message, CoreError> {
            self.posted
                .lock()
                .unwrap()
                .push((content.to_string(), author.to_string()));
            Ok(Message {
                id: 1,
                debate_id,
                author: author.to_string(),
                content: content.to_string(),
                created_at: None,
            })
        }

        async fn fetch_suggestions(
            &self,
            _debate_id: i64,
            _message_id: i64,
        ) -> Result<SuggestionResponse, CoreError> {
            Ok(SuggestionResponse {
                suggestions: Vec::new(),
            })
        }
    }

    struct NullStream;

    #[async_trait]
    impl StreamClient for NullStream {
        async fn open(
            &self,
            _debate_id: i64,
            _tx: mpsc::Sender<StreamSignal>,
        ) -> Result<Box<dyn StreamSubscription>, CoreError> {
            Ok(Box::new(NullSubscription))
        }
    }

    struct NullSubscription;

    #[async_trait]
    impl StreamSubscription for NullSubscription {
        async fn disconnect(&self) {}
    }

    /// 메모리 프로필 저장소
    struct MemoryProfile {
        values: Mutex<HashMap<String, String>>,
        fail_get: bool,
    }

    impl MemoryProfile {
        fn new() -> Self {
            Self {
                values: Mutex::new(HashMap::new()),
                fail_get: false,
            }
        }

        fn with_name(name: &str) -> Self {
            let profile = Self::new();
            profile
                .values
                .lock()
                .unwrap()
                .insert(DISPLAY_NAME_KEY.to_string(), name.to_string());
            profile
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryProfile {
        async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
            if self.fail_get {
                return Err(CoreError::Storage("프로필 DB 불가".to_string()));
            }
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    async fn join_with(profile: Arc<MemoryProfile>) -> (Arc<RecordingApi>, DiscussionSession) {
        let api = Arc::new(RecordingApi {
            posted: Mutex::new(Vec::new()),
        });
        let session = DiscussionSession::join(1, api.clone(), Arc::new(NullStream), profile)
            .await
            .unwrap();
        (api, session)
    }

    #[tokio::test]
    async fn join_restores_saved_name() {
        let (_api, session) = join_with(Arc::new(MemoryProfile::with_name("민지"))).await;
        assert_eq!(session.display_name(), "민지");
        assert_eq!(session.state(), SessionState::Live);
    }

    #[tokio::test]
    async fn join_defaults_when_no_saved_name() {
        let (_api, session) = join_with(Arc::new(MemoryProfile::new())).await;
        assert_eq!(session.display_name(), "Anonymous");
    }

    #[tokio::test]
    async fn join_survives_profile_failure() {
        let mut profile = MemoryProfile::new();
        profile.fail_get = true;
        let (_api, session) = join_with(Arc::new(profile)).await;
        assert_eq!(session.display_name(), "Anonymous");
        assert_eq!(session.state(), SessionState::Live);
    }

    #[tokio::test]
    async fn send_binds_current_display_name() {
        let profile = Arc::new(MemoryProfile::with_name("민지"));
        let (api, session) = join_with(profile.clone()).await;

        session.send("첫 주장").await.unwrap();
        session.switch_user("현우").await.unwrap();
        session.send("두 번째 주장").await.unwrap();

        let posted = api.posted.lock().unwrap();
        assert_eq!(posted[0], ("첫 주장".to_string(), "민지".to_string()));
        assert_eq!(posted[1], ("두 번째 주장".to_string(), "현우".to_string()));

        // 변경된 이름이 지속되었는지
        assert_eq!(
            profile.get(DISPLAY_NAME_KEY).await.unwrap().as_deref(),
            Some("현우")
        );
    }

    #[tokio::test]
    async fn switch_user_rejects_blank_name() {
        let (_api, session) = join_with(Arc::new(MemoryProfile::with_name("민지"))).await;

        let result = session.switch_user("   ").await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(session.display_name(), "민지");
    }

    #[tokio::test]
    async fn leave_closes_session() {
        let (_api, session) = join_with(Arc::new(MemoryProfile::new())).await;
        session.leave().await;
        assert_eq!(session.state(), SessionState::Closed);
    }
}
