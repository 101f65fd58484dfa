//! # Domain Entities Module
//!
//! 비즈니스 도메인의 핵심 엔티티들을 정의합니다.
//! 저장소 문서/레코드와 직접 매핑되는 데이터 구조체들을 포함합니다.
//!
//! ## 주요 역할
//!
//! - **도메인 모델링**: 유저센터의 핵심 개념(사용자, 리프레시 세션)을
//!   Rust 구조체로 표현
//! - **저장소 매핑**: MongoDB 문서(User), Redis JSON 레코드(Session)와
//!   1:1 대응
//! - **불변 조건 유지**: `Session`은 생성/회전 경로에서만 만들어지므로
//!   `token_key = digest(refresh_token)` 관계가 항상 성립
//!
//! ## 모듈 구조
//!
//! ```text
//! entities/
//! ├── sessions/    ← 리프레시 세션 엔티티 + 로그인 채널
//! └── users/       ← 사용자 엔티티 + 계정 상태
//! ```

pub mod sessions;
pub mod users;

pub use sessions::*;
pub use users::*;
