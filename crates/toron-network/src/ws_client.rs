//! WebSocket 실시간 스트림 클라이언트.
//!
//! `StreamClient` 포트 구현. `tokio-tungstenite` 기반 수신 전용 구독.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use toron_core::error::CoreError;
use toron_core::models::message::LiveEvent;
use toron_core::ports::stream::{StreamClient, StreamSignal, StreamSubscription};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket 스트림 클라이언트 — `StreamClient` 포트 구현
pub struct WsStreamClient {
    base_url: String,
}

impl WsStreamClient {
    /// 새 WebSocket 클라이언트 생성
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// HTTP(S) 기본 URL을 ws(s) 스킴으로 변환
    fn ws_url(&self, debate_id: i64) -> String {
        let ws_base = self
            .base_url
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        format!("{ws_base}/ws/debates/{debate_id}")
    }

    /// 텍스트 프레임을 LiveEvent로 디코딩
    fn decode_frame(text: &str) -> Option<LiveEvent> {
        match serde_json::from_str::<LiveEvent>(text) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("스트림 페이로드 파싱 실패: {e}");
                None
            }
        }
    }

    /// 수신 루프 — 프레임을 신호로 변환해 채널로 전달
    async fn read_loop(mut read: SplitStream<WsStream>, tx: mpsc::Sender<StreamSignal>) {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(WsFrame::Text(text)) => {
                    if let Some(event) = Self::decode_frame(&text) {
                        if tx.send(StreamSignal::Event(event)).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(WsFrame::Close(_)) => {
                    let _ = tx.send(StreamSignal::Closed).await;
                    break;
                }
                Ok(_) => {} // Binary/Ping/Pong은 무시 (Ping/Pong은 자동 처리)
                Err(e) => {
                    warn!("WebSocket 수신 에러: {e}");
                    let _ = tx.send(StreamSignal::Error(e.to_string())).await;
                    break;
                }
            }
        }
        debug!("WebSocket 수신 루프 종료");
    }
}

#[async_trait]
impl StreamClient for WsStreamClient {
    async fn open(
        &self,
        debate_id: i64,
        tx: mpsc::Sender<StreamSignal>,
    ) -> Result<Box<dyn StreamSubscription>, CoreError> {
        let url = self.ws_url(debate_id);
        info!("WebSocket 연결: {url}");

        let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 연결 실패: {e}")))?;

        let (write, read) = ws_stream.split();
        let reader = tokio::spawn(Self::read_loop(read, tx));

        Ok(Box::new(WsSubscription {
            write: Arc::new(tokio::sync::Mutex::new(write)),
            reader,
        }))
    }
}

/// 열린 WebSocket 구독 핸들
struct WsSubscription {
    write: Arc<tokio::sync::Mutex<SplitSink<WsStream, WsFrame>>>,
    reader: tokio::task::JoinHandle<()>,
}

#[async_trait]
impl StreamSubscription for WsSubscription {
    async fn disconnect(&self) {
        {
            let mut write = self.write.lock().await;
            if let Err(e) = write.send(WsFrame::Close(None)).await {
                debug!("WebSocket 종료 프레임 전송 실패 (이미 닫힘): {e}");
            }
        }
        self.reader.abort();
        debug!("WebSocket 구독 해제");
    }
}
