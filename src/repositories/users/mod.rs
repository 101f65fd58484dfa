//! 사용자 저장소 모듈

pub mod mongo_user_repository;
pub mod user_repository;

pub use mongo_user_repository::*;
pub use user_repository::*;
