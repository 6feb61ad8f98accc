//! 로컬 프로필 저장소 포트.
//!
//! 구현: `toron-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;

/// 표시 이름 저장 키
pub const DISPLAY_NAME_KEY: &str = "display_name";

/// 키-값 프로필 저장소
///
/// 현재는 표시 이름 한 필드만 사용한다.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 값 조회 (키가 없으면 `None`)
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// 값 저장 (기존 값 덮어쓰기)
    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}
