//! 제안 모델.
//!
//! 메시지 단위로 요청하는 AI 응답 제안과 클라이언트 측 조회 상태.

use serde::{Deserialize, Serialize};

/// 제안 조회 응답 (서버 → 클라이언트)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    /// 서버가 생성한 응답 후보 텍스트 목록 (빈 목록 가능)
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// 메시지별 제안 조회 상태
///
/// 동일 키 재요청은 항상 허용되며 기존 종단 상태를 덮어쓴다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionStatus {
    /// 요청된 적 없음
    #[default]
    Idle,
    /// 요청 진행 중
    Loading,
    /// 수신 완료
    Ready(Vec<String>),
    /// 요청 실패 — 재요청 가능, 자동 재시도 없음
    Failed,
}

impl SuggestionStatus {
    /// 진행 중인지
    pub fn is_loading(&self) -> bool {
        matches!(self, SuggestionStatus::Loading)
    }
}
