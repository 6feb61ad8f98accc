//! Hexagonal Architecture 포트 인터페이스.
//!
//! 조정 코어(`toron-session`)가 소비하는 외부 협력자 경계.
//! 구현은 `toron-network` / `toron-storage` crate에 있다.

pub mod api_client;
pub mod profile;
pub mod stream;
