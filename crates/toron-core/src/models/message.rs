//! 메시지 및 실시간 스트림 이벤트 모델.
//!
//! 메시지 동일성은 서버 할당 `id`로 판단한다. 내용은 생성 후 불변.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 토론 메시지
///
/// 벌크 로드(REST) 또는 실시간 스트림으로 수신한다.
/// 클라이언트는 전송 응답을 낙관적으로 반영할 뿐 직접 생성하지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// 서버 할당 메시지 ID — 저장소 키
    pub id: i64,
    /// 소속 토론 ID
    #[serde(default)]
    pub debate_id: i64,
    /// 작성자 표시 이름
    pub author: String,
    /// 본문
    pub content: String,
    /// 작성 시각 (서버가 생략할 수 있음 — 정렬은 도착 순서 기준)
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// 와이어 식별자 — 서버가 숫자/문자열을 혼용하는 승자 ID
///
/// 수신 경계에서 [`IdValue::normalize`]로 문자열 한 가지 형태로 통일한다.
/// 비교 시마다 변환하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    /// 숫자 형태 (메시지 ID의 네이티브 타입)
    Num(i64),
    /// 문자열 형태
    Text(String),
}

impl IdValue {
    /// 정규화된 문자열 형태 반환
    pub fn normalize(&self) -> String {
        match self {
            IdValue::Num(n) => n.to_string(),
            IdValue::Text(s) => s.clone(),
        }
    }
}

/// 실시간 스트림 이벤트 한 건
///
/// 새 메시지와, 포함된 경우 전체 승자 집합 교체본을 담는다.
/// `current_winners`는 델타가 아니라 항상 전체 교체다 — 서버가 매번
/// 전역 재계산하기 때문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEvent {
    /// 새로 게시된 메시지
    pub message: Message,
    /// 전체 승자 ID 집합 (없으면 기존 집합 유지)
    #[serde(default)]
    pub current_winners: Option<Vec<IdValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_event_with_mixed_winner_ids() {
        let json = r#"{
            "message": {"id": 3, "debate_id": 1, "author": "bob", "content": "반론입니다"},
            "current_winners": [1, "3", 7]
        }"#;
        let event: LiveEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.message.id, 3);

        let normalized: Vec<String> = event
            .current_winners
            .unwrap()
            .iter()
            .map(IdValue::normalize)
            .collect();
        assert_eq!(normalized, vec!["1", "3", "7"]);
    }

    #[test]
    fn deserialize_event_without_winners() {
        let json = r#"{"message": {"id": 9, "author": "carol", "content": "동의합니다"}}"#;
        let event: LiveEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.message.id, 9);
        assert!(event.current_winners.is_none());
        // debate_id 누락 시 기본값
        assert_eq!(event.message.debate_id, 0);
    }
}
