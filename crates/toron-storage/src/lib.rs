//! # toron-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 프로필(표시 이름 등) 저장과 스키마 마이그레이션을 관리한다.
//!
//! ## 모듈
//! - `profile`: 키-값 프로필 저장소 (ProfileStore 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod profile;

pub use profile::SqliteProfileStore;
