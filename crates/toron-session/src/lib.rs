//! # toron-session
//!
//! 메시지 스트림 조정 코어.
//! 벌크 로드한 메시지 이력과 실시간 스트림을 병합하고 중복을 흡수하며,
//! 서버 계산 승자 집합과 메시지별 제안 조회 상태를 관리한다.
//!
//! ## 구조
//!
//! - [`message_store`] — 도착 순서 보존 + 멱등 삽입 메시지 저장소
//! - [`winner_set`] — 전체 교체 방식의 승자 ID 집합
//! - [`suggestion_cache`] — 메시지별 제안 상태 + 요청 토큰
//! - [`reconciler`] — 상태 머신 오케스트레이터 (벌크 로드 → 실시간)
//! - [`session`] — 토론 참가 세션 (표시 이름 + 조정기)

pub mod message_store;
pub mod reconciler;
pub mod session;
pub mod suggestion_cache;
pub mod winner_set;

pub use message_store::MessageStore;
pub use reconciler::{SessionState, StreamReconciler};
pub use session::DiscussionSession;
pub use suggestion_cache::SuggestionCache;
pub use winner_set::WinnerSet;
