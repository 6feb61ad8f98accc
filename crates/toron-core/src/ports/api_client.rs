//! REST API 클라이언트 포트.
//!
//! 구현: `toron-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::debate::Debate;
use crate::models::message::Message;
use crate::models::suggestion::SuggestionResponse;

/// HTTP API 클라이언트
#[async_trait]
pub trait DebateApi: Send + Sync {
    /// 토론 주제 목록 조회
    async fn fetch_debates(&self) -> Result<Vec<Debate>, CoreError>;

    /// 토론의 전체 메시지 이력 조회 (벌크 로드)
    ///
    /// 세션 시작 시 1회 호출한다. 반환 순서가 곧 저장 순서다.
    async fn fetch_messages(&self, debate_id: i64) -> Result<Vec<Message>, CoreError>;

    /// 메시지 게시
    ///
    /// 서버가 ID를 할당한 메시지를 그대로 돌려준다. 같은 메시지가
    /// 스트림으로도 에코되므로 호출자는 중복 삽입에 대비해야 한다.
    async fn post_message(
        &self,
        debate_id: i64,
        content: &str,
        author: &str,
    ) -> Result<Message, CoreError>;

    /// 특정 메시지에 대한 응답 제안 조회
    async fn fetch_suggestions(
        &self,
        debate_id: i64,
        message_id: i64,
    ) -> Result<SuggestionResponse, CoreError>;
}
