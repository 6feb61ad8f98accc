//! 토론 주제 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 토론 주제 (주제 목록 API로 수신)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debate {
    /// 토론 고유 ID
    pub id: i64,
    /// 주제 제목
    pub title: String,
    /// 주제 설명 (선택)
    #[serde(default)]
    pub description: Option<String>,
    /// 생성 시각 (서버가 생략할 수 있음)
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
