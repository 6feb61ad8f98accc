//! 제안 캐시.
//!
//! 메시지별 제안 조회 상태와 진행 중 여부를 추적한다.
//! 전역 "로딩 중" 플래그 하나로 여러 메시지가 간섭하던 방식 대신
//! 키 단위 엔트리를 둔다.

use std::collections::HashMap;
use toron_core::models::suggestion::SuggestionStatus;
use tracing::debug;

/// 키별 엔트리 — 상태와 최신 요청 토큰
#[derive(Debug)]
struct Entry {
    status: SuggestionStatus,
    token: u64,
}

/// 메시지별 제안 조회 캐시
///
/// 요청마다 단조 증가 토큰을 발급하고, 토큰이 최신이 아닌 완료는
/// 폐기한다. 같은 키의 재요청이 진행 중 요청을 대체해도 뒤늦게 도착한
/// 옛 응답이 새 결과를 덮어쓸 수 없다.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<i64, Entry>,
    next_token: u64,
}

impl SuggestionCache {
    /// 빈 캐시 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 요청 시작 — 상태를 `Loading`으로 전환하고 요청 토큰 발급
    ///
    /// 기존 종단 상태(`Ready`/`Failed`)는 무조건 덮어쓴다.
    /// 재요청은 언제나 허용된다.
    pub fn begin(&mut self, message_id: i64) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.entries.insert(
            message_id,
            Entry {
                status: SuggestionStatus::Loading,
                token,
            },
        );
        token
    }

    /// 요청 성공 — 토큰이 최신일 때만 `Ready`로 전환
    ///
    /// 적용 여부를 반환한다.
    pub fn complete(&mut self, message_id: i64, token: u64, suggestions: Vec<String>) -> bool {
        match self.entries.get_mut(&message_id) {
            Some(entry) if entry.token == token => {
                entry.status = SuggestionStatus::Ready(suggestions);
                true
            }
            _ => {
                debug!("뒤늦은 제안 응답 폐기: message_id={message_id}, token={token}");
                false
            }
        }
    }

    /// 요청 실패 — 토큰이 최신일 때만 `Failed`로 전환
    ///
    /// 자동 재시도는 없으며 사용자가 다시 요청할 수 있다.
    pub fn fail(&mut self, message_id: i64, token: u64) -> bool {
        match self.entries.get_mut(&message_id) {
            Some(entry) if entry.token == token => {
                entry.status = SuggestionStatus::Failed;
                true
            }
            _ => {
                debug!("뒤늦은 제안 실패 폐기: message_id={message_id}, token={token}");
                false
            }
        }
    }

    /// 상태 조회 — 요청된 적 없는 키는 `Idle`
    pub fn status_for(&self, message_id: i64) -> SuggestionStatus {
        self.entries
            .get(&message_id)
            .map(|e| e.status.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn lifecycle_loading_to_ready() {
        let mut cache = SuggestionCache::new();
        assert_eq!(cache.status_for(5), SuggestionStatus::Idle);

        let token = cache.begin(5);
        assert_eq!(cache.status_for(5), SuggestionStatus::Loading);

        assert!(cache.complete(5, token, vec!["a".to_string(), "b".to_string()]));
        assert_eq!(
            cache.status_for(5),
            SuggestionStatus::Ready(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn failure_does_not_affect_other_keys() {
        let mut cache = SuggestionCache::new();
        let t5 = cache.begin(5);
        let t6 = cache.begin(6);

        assert!(cache.fail(5, t5));
        assert_eq!(cache.status_for(5), SuggestionStatus::Failed);
        assert_eq!(cache.status_for(6), SuggestionStatus::Loading);

        assert!(cache.complete(6, t6, vec![]));
        assert_matches!(cache.status_for(6), SuggestionStatus::Ready(_));
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut cache = SuggestionCache::new();
        let old_token = cache.begin(5);
        let new_token = cache.begin(5); // 재요청이 진행 중 요청을 대체

        // 옛 요청의 응답이 늦게 도착 — 폐기
        assert!(!cache.complete(5, old_token, vec!["stale".to_string()]));
        assert_eq!(cache.status_for(5), SuggestionStatus::Loading);

        // 최신 요청의 응답만 적용
        assert!(cache.complete(5, new_token, vec!["fresh".to_string()]));
        assert_eq!(
            cache.status_for(5),
            SuggestionStatus::Ready(vec!["fresh".to_string()])
        );
    }

    #[test]
    fn stale_failure_is_discarded() {
        let mut cache = SuggestionCache::new();
        let old_token = cache.begin(7);
        let new_token = cache.begin(7);

        assert!(!cache.fail(7, old_token));
        assert!(cache.complete(7, new_token, vec!["ok".to_string()]));
        assert_matches!(cache.status_for(7), SuggestionStatus::Ready(_));
    }

    #[test]
    fn rerequest_overwrites_terminal_state() {
        let mut cache = SuggestionCache::new();
        let token = cache.begin(3);
        cache.fail(3, token);
        assert_eq!(cache.status_for(3), SuggestionStatus::Failed);

        // 실패 후 재요청 허용
        cache.begin(3);
        assert_eq!(cache.status_for(3), SuggestionStatus::Loading);
    }
}
