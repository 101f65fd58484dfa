//! 데이터 액세스 리포지토리 모듈
//!
//! 저장소와의 상호작용을 담당하는 계층입니다.
//!
//! ## 모듈 구성
//!
//! - [`sessions`] - 리프레시 세션 저장소 (Redis / 인메모리)
//! - [`users`] - 사용자 저장소 (MongoDB / 인메모리)
//!
//! 각 저장소는 trait(`SessionStore`, `UserStore`)을 경계로 하며,
//! 서비스 계층은 구현체가 아닌 trait에만 의존합니다. 내구 구현체는
//! `#[repository]` 매크로로 등록되고, 인메모리 구현체는 단위 테스트가
//! 외부 인프라 없이 전체 시나리오를 실행할 수 있게 합니다.

pub mod sessions;
pub mod users;
