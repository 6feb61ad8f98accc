//! 승자 집합.
//!
//! 서버가 전역 재계산해 내려보내는 "이기고 있는 주장" ID 집합.
//! 증분 갱신 없이 이벤트마다 전체 교체된다.

use std::collections::HashSet;

/// 현재 승자 메시지 ID 집합 (정규화된 문자열 형태)
///
/// 아직 도착하지 않은 메시지를 가리키는 ID도 허용한다 — 서버가
/// 진실의 원천이며, 해당 메시지가 도착하는 순간 표시 가능해진다.
#[derive(Debug, Default)]
pub struct WinnerSet {
    ids: HashSet<String>,
}

impl WinnerSet {
    /// 빈 집합 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 집합 전체를 원자적으로 교체
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.ids = ids.into_iter().collect();
    }

    /// 정규화된 문자열 ID로 멤버십 확인
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// 저장소 키 형태(숫자 ID)로 멤버십 확인
    pub fn contains_message(&self, message_id: i64) -> bool {
        self.ids.contains(&message_id.to_string())
    }

    /// 현재 집합 크기
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 비어있는지
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
