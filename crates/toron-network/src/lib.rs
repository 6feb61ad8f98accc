//! # toron-network
//!
//! HTTP/WebSocket 네트워크 어댑터.
//! 서버와의 REST API(메시지 이력, 게시, 제안 조회)와
//! WebSocket 실시간 스트림 수신을 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use toron_network::http_client::HttpDebateApi;
//! use toron_network::ws_client::WsStreamClient;
//! ```

pub mod http_client;
pub mod ws_client;
