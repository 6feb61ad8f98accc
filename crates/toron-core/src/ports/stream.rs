//! 실시간 스트림 포트.
//!
//! 구현: `toron-network` crate (tokio-tungstenite)

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::models::message::LiveEvent;

/// 스트림 구독자가 채널로 수신하는 신호
#[derive(Debug, Clone)]
pub enum StreamSignal {
    /// 새 메시지 (+ 선택적 승자 집합 교체)
    Event(LiveEvent),
    /// 스트림 에러 — 재연결 여부는 어댑터 소관, 코어는 상태를 유지한다
    Error(String),
    /// 서버 측 연결 종료
    Closed,
}

/// 열린 스트림에 대한 구독 핸들
#[async_trait]
pub trait StreamSubscription: Send + Sync {
    /// 구독 해제 및 연결 종료
    ///
    /// 몇 번을 호출해도, 이벤트를 하나도 받지 못한 상태여도 안전해야 한다.
    async fn disconnect(&self);
}

/// 실시간 스트림 클라이언트
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// 토론의 실시간 스트림 연결
    ///
    /// 수신 이벤트를 `tx` 채널로 전달하고 구독 핸들을 반환한다.
    /// 채널이 닫히면 어댑터는 수신을 중단한다.
    async fn open(
        &self,
        debate_id: i64,
        tx: mpsc::Sender<StreamSignal>,
    ) -> Result<Box<dyn StreamSubscription>, CoreError>;
}
