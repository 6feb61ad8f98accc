//! 애플리케이션 설정 구조체.
//!
//! 서버 URL, 타임아웃, 프로필 저장소 경로 등 런타임 설정을 정의한다.
//! JSON 파일에서 로드하며 누락 필드는 serde 기본값으로 채운다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 서버 연결 설정
    pub server: ServerConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

/// 서버 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API 서버 기본 URL (예: "https://api.example.com")
    pub base_url: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// HTTP 재시도 횟수 (일시적 오류에 한함)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 스트림 수신 채널 용량
    #[serde(default = "default_stream_channel_capacity")]
    pub stream_channel_capacity: usize,
}

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 프로필 DB 파일 경로 (None이면 플랫폼 기본 경로)
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://localhost:8000".to_string(),
                request_timeout_ms: default_request_timeout_ms(),
                max_retries: default_max_retries(),
                stream_channel_capacity: default_stream_channel_capacity(),
            },
            storage: StorageConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_stream_channel_capacity() -> usize {
    64
}
