//! SQLite 프로필 저장소.
//!
//! `ProfileStore` 포트 구현. 표시 이름 같은 소량의 키-값을 로컬에 지속한다.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use toron_core::error::CoreError;
use toron_core::ports::profile::ProfileStore;
use tracing::{debug, info};

/// SQLite 프로필 저장소 — `ProfileStore` 포트 구현
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// 파일 기반 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            ",
        )
        .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        crate::migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        info!("프로필 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        crate::migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        conn.query_row(
            "SELECT value FROM profile WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| CoreError::Storage(format!("프로필 조회 실패: {e}")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        conn.execute(
            "INSERT INTO profile (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(|e| CoreError::Storage(format!("프로필 저장 실패: {e}")))?;

        debug!("프로필 저장: key={key}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toron_core::ports::profile::DISPLAY_NAME_KEY;

    #[tokio::test]
    async fn missing_key_returns_none() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        assert_eq!(store.get(DISPLAY_NAME_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        store.set(DISPLAY_NAME_KEY, "민지").await.unwrap();
        assert_eq!(
            store.get(DISPLAY_NAME_KEY).await.unwrap().as_deref(),
            Some("민지")
        );
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let store = SqliteProfileStore::open_in_memory().unwrap();
        store.set(DISPLAY_NAME_KEY, "민지").await.unwrap();
        store.set(DISPLAY_NAME_KEY, "현우").await.unwrap();
        assert_eq!(
            store.get(DISPLAY_NAME_KEY).await.unwrap().as_deref(),
            Some("현우")
        );
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.db");

        {
            let store = SqliteProfileStore::open(&path).unwrap();
            store.set(DISPLAY_NAME_KEY, "민지").await.unwrap();
        }

        let reopened = SqliteProfileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(DISPLAY_NAME_KEY).await.unwrap().as_deref(),
            Some("민지")
        );
    }
}
