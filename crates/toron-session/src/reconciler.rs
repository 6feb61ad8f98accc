//! 스트림 조정기.
//!
//! 벌크 로드 → 실시간 스트림 순서로 한 토론의 메시지 상태를 구축하고,
//! 이후 수신 이벤트를 저장소/승자 집합/제안 캐시에 반영하는
//! 오케스트레이터. 협력자 완료 콜백이 어떤 순서로 도착해도
//! `MessageStore::upsert`의 멱등성이 중복 표시를 막는다.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::mpsc;
use toron_core::error::CoreError;
use toron_core::models::message::{IdValue, LiveEvent, Message};
use toron_core::models::suggestion::SuggestionStatus;
use toron_core::ports::api_client::DebateApi;
use toron_core::ports::stream::{StreamClient, StreamSignal, StreamSubscription};
use tracing::{debug, info, warn};

use crate::message_store::MessageStore;
use crate::suggestion_cache::SuggestionCache;
use crate::winner_set::WinnerSet;

/// 기본 스트림 수신 채널 용량
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// 세션 수명주기 상태
///
/// `Closed`는 종단 상태다. 새 세션에는 새 조정기 인스턴스가 필요하다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 시작 전
    Uninitialized,
    /// 벌크 로드 진행 중
    Loading,
    /// 실시간 수신 중
    Live,
    /// 해제됨 (종단)
    Closed,
}

/// 스트림 조정기
///
/// 단일 토론에 대해 메시지 저장소, 승자 집합, 제안 캐시를
/// 두 입력 채널(1회성 벌크 로드, 연속 이벤트 스트림)과
/// 사용자 동작(전송, 제안 요청)에 맞춰 갱신한다.
pub struct StreamReconciler {
    api: Arc<dyn DebateApi>,
    stream: Arc<dyn StreamClient>,
    channel_capacity: usize,
    state: Mutex<SessionState>,
    debate_id: Mutex<Option<i64>>,
    store: Arc<RwLock<MessageStore>>,
    winners: Arc<RwLock<WinnerSet>>,
    suggestions: Arc<RwLock<SuggestionCache>>,
    subscription: tokio::sync::Mutex<Option<Box<dyn StreamSubscription>>>,
    event_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StreamReconciler {
    /// 새 조정기 생성 (Uninitialized 상태)
    pub fn new(api: Arc<dyn DebateApi>, stream: Arc<dyn StreamClient>) -> Self {
        Self {
            api,
            stream,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            state: Mutex::new(SessionState::Uninitialized),
            debate_id: Mutex::new(None),
            store: Arc::new(RwLock::new(MessageStore::new())),
            winners: Arc::new(RwLock::new(WinnerSet::new())),
            suggestions: Arc::new(RwLock::new(SuggestionCache::new())),
            subscription: tokio::sync::Mutex::new(None),
            event_task: Mutex::new(None),
        }
    }

    /// 스트림 수신 채널 용량 설정
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// 현재 세션 상태
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// 세션 시작: 벌크 로드 후 실시간 스트림 구독
    ///
    /// 벌크 로드나 스트림 연결이 실패하면 Uninitialized로 복귀한다 —
    /// 전송 실패는 종단 상태가 아니며 호출자가 재시도할 수 있다.
    /// 진행 중 `stop()`이 끼어들면 방금 연 구독까지 해제하고 끝낸다.
    pub async fn start(&self, debate_id: i64) -> Result<(), CoreError> {
        {
            let mut state = self.state.lock();
            if *state != SessionState::Uninitialized {
                return Err(CoreError::InvalidState(format!(
                    "이미 시작된 세션입니다 (현재 {:?})",
                    *state
                )));
            }
            *state = SessionState::Loading;
        }
        *self.debate_id.lock() = Some(debate_id);

        let initial = match self.api.fetch_messages(debate_id).await {
            Ok(messages) => messages,
            Err(e) => {
                self.revert_loading();
                return Err(e);
            }
        };

        // 로딩 중 stop()이 호출되었으면 스트림을 열지 않는다
        if self.state() == SessionState::Closed {
            info!("로딩 중 세션 종료됨 — 스트림 연결 생략");
            return Ok(());
        }

        let initial_count = initial.len();
        self.store.write().load_initial(initial);

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let subscription = match self.stream.open(debate_id, tx).await {
            Ok(sub) => sub,
            Err(e) => {
                self.revert_loading();
                return Err(e);
            }
        };

        let store = self.store.clone();
        let winners = self.winners.clone();
        let handle = tokio::spawn(Self::event_loop(rx, store, winners));

        *self.subscription.lock().await = Some(subscription);
        *self.event_task.lock() = Some(handle);

        let became_live = {
            let mut state = self.state.lock();
            if *state == SessionState::Closed {
                false
            } else {
                *state = SessionState::Live;
                true
            }
        };

        if !became_live {
            // 연결 도중 stop()과 경합 — 방금 연 구독을 즉시 해제
            if let Some(sub) = self.subscription.lock().await.take() {
                sub.disconnect().await;
            }
            if let Some(task) = self.event_task.lock().take() {
                task.abort();
            }
            return Ok(());
        }

        info!("세션 시작: debate_id={debate_id}, 초기 메시지 {initial_count}건");
        Ok(())
    }

    /// Loading 복귀 (stop과 경합 시 Closed 유지)
    fn revert_loading(&self) {
        let mut state = self.state.lock();
        if *state == SessionState::Loading {
            *state = SessionState::Uninitialized;
        }
    }

    /// 세션 해제: 구독 해제 + 이벤트 루프 중단 → Closed (종단)
    ///
    /// 이벤트를 하나도 받지 못한 상태여도, 몇 번을 호출해도 안전하다.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state == SessionState::Closed {
                return;
            }
            *state = SessionState::Closed;
        }

        if let Some(sub) = self.subscription.lock().await.take() {
            sub.disconnect().await;
        }
        if let Some(task) = self.event_task.lock().take() {
            task.abort();
        }
        info!("세션 종료");
    }

    /// 메시지 전송
    ///
    /// 내용/작성자가 공백뿐이면 네트워크 호출 없이 조용히 넘어간다
    /// (UI 가드이지 프로토콜 에러가 아니다). 성공 시 서버 응답 메시지를
    /// 즉시 낙관적으로 삽입하며, 스트림 에코는 upsert 멱등성으로
    /// 흡수된다. 전송된 메시지를 반환하고, 가드에 걸리면 `None`.
    pub async fn send_message(
        &self,
        content: &str,
        author: &str,
    ) -> Result<Option<Message>, CoreError> {
        let content = content.trim();
        let author = author.trim();
        if content.is_empty() || author.is_empty() {
            debug!("빈 내용/작성자 — 전송 생략");
            return Ok(None);
        }

        if self.state() != SessionState::Live {
            return Err(CoreError::InvalidState(
                "Live 상태에서만 전송할 수 있습니다".to_string(),
            ));
        }
        let debate_id = self.require_debate_id()?;

        let message = self.api.post_message(debate_id, content, author).await?;

        // 낙관적 삽입 — 스트림 에코가 먼저 도착했어도 결과는 같다
        let inserted = self.store.write().upsert(message.clone());
        debug!(
            "메시지 전송 완료: id={}, 낙관적 삽입={}",
            message.id, inserted
        );
        Ok(Some(message))
    }

    /// 특정 메시지에 대한 제안 요청 (비동기, best-effort)
    ///
    /// 상태를 `Loading`으로 전환하고 조회를 백그라운드로 띄운다.
    /// 실패는 로그만 남기고 `Failed`로 기록한다 — 치명적이지 않으며
    /// 재요청 가능하다.
    pub fn request_suggestions(&self, message_id: i64) -> Result<(), CoreError> {
        if self.state() != SessionState::Live {
            return Err(CoreError::InvalidState(
                "Live 상태에서만 제안을 요청할 수 있습니다".to_string(),
            ));
        }
        let debate_id = self.require_debate_id()?;

        let token = self.suggestions.write().begin(message_id);
        let api = self.api.clone();
        let cache = self.suggestions.clone();

        tokio::spawn(async move {
            match api.fetch_suggestions(debate_id, message_id).await {
                Ok(resp) => {
                    cache.write().complete(message_id, token, resp.suggestions);
                }
                Err(e) => {
                    warn!("제안 조회 실패: message_id={message_id}: {e}");
                    cache.write().fail(message_id, token);
                }
            }
        });
        Ok(())
    }

    /// 도착 순서 메시지 스냅샷
    pub fn messages(&self) -> Vec<Message> {
        self.store.read().all().to_vec()
    }

    /// 저장된 메시지 수
    pub fn message_count(&self) -> usize {
        self.store.read().len()
    }

    /// 해당 메시지가 현재 승자 집합에 속하는지
    pub fn is_winner(&self, message_id: i64) -> bool {
        self.winners.read().contains_message(message_id)
    }

    /// 메시지의 제안 조회 상태
    pub fn suggestion_status(&self, message_id: i64) -> SuggestionStatus {
        self.suggestions.read().status_for(message_id)
    }

    fn require_debate_id(&self) -> Result<i64, CoreError> {
        (*self.debate_id.lock())
            .ok_or_else(|| CoreError::InvalidState("토론 ID가 설정되지 않았습니다".to_string()))
    }

    /// 이벤트 루프 — 스트림 신호를 저장소/승자 집합에 반영
    ///
    /// 스트림 에러는 로그만 남긴다. 이미 저장된 메시지는 유지되며
    /// 재연결은 어댑터 소관이다.
    async fn event_loop(
        mut rx: mpsc::Receiver<StreamSignal>,
        store: Arc<RwLock<MessageStore>>,
        winners: Arc<RwLock<WinnerSet>>,
    ) {
        while let Some(signal) = rx.recv().await {
            match signal {
                StreamSignal::Event(event) => Self::apply_event(&store, &winners, event),
                StreamSignal::Error(msg) => {
                    warn!("스트림 에러: {msg}");
                }
                StreamSignal::Closed => {
                    info!("스트림 종료 수신");
                }
            }
        }
        debug!("이벤트 루프 종료");
    }

    /// 이벤트 한 건 반영: 승자 집합 전체 교체 → 멱등 삽입
    fn apply_event(
        store: &Arc<RwLock<MessageStore>>,
        winners: &Arc<RwLock<WinnerSet>>,
        event: LiveEvent,
    ) {
        if let Some(raw_ids) = event.current_winners {
            // 수신 경계에서 문자열 한 가지 형태로 정규화
            winners
                .write()
                .replace(raw_ids.iter().map(IdValue::normalize));
        }

        let message_id = event.message.id;
        let inserted = store.write().upsert(event.message);
        if !inserted {
            debug!("중복 메시지 흡수: id={message_id}");
        }
    }
}
