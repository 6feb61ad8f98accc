//! 메시지 저장소.
//!
//! 한 토론의 메시지를 도착 순서로 보관한다. 삽입은 ID 기준 멱등이며,
//! 낙관적 로컬 반영과 스트림 에코가 여기서 하나로 수렴한다.

use std::collections::HashSet;
use toron_core::models::message::Message;
use tracing::warn;

/// 도착 순서 보존 메시지 저장소
///
/// 같은 ID를 가진 항목은 절대 두 개 존재하지 않는다.
/// 네트워크 호출 등 부수 효과 없음.
#[derive(Debug, Default)]
pub struct MessageStore {
    entries: Vec<Message>,
    seen: HashSet<i64>,
    /// 스트림 삽입이 한 번이라도 있었는지 — `load_initial` 선행조건 체크용
    appended: bool,
}

impl MessageStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 벌크 로드 결과로 내용 전체 교체
    ///
    /// 세션 시작 시 1회 호출이 선행조건이다. 스트림 삽입 이후에 호출되면
    /// 이미 수신한 메시지를 잃지 않도록 무시한다.
    pub fn load_initial(&mut self, messages: Vec<Message>) {
        if self.appended {
            warn!("스트림 수신 이후 load_initial 호출 — 무시");
            return;
        }

        self.entries.clear();
        self.seen.clear();
        for message in messages {
            // 벌크 페이로드 내부 중복도 동일 규칙으로 걸러낸다
            if self.seen.insert(message.id) {
                self.entries.push(message);
            }
        }
    }

    /// ID가 처음 보는 것일 때만 끝에 추가
    ///
    /// 중복이면 기존 항목과 순서를 건드리지 않고 `false`를 반환한다.
    /// 어떤 순서로 몇 번을 호출해도 결과는 같다.
    pub fn upsert(&mut self, message: Message) -> bool {
        self.appended = true;

        if !self.seen.insert(message.id) {
            return false;
        }
        self.entries.push(message);
        true
    }

    /// 도착 순서 스냅샷 (벌크 로드 순서 → 스트림 도착 순서)
    pub fn all(&self) -> &[Message] {
        &self.entries
    }

    /// ID 보유 여부
    pub fn contains(&self, id: i64) -> bool {
        self.seen.contains(&id)
    }

    /// 저장된 메시지 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어있는지
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
