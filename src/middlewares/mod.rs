//! 인증 미들웨어 모듈
//!
//! ActixWeb 요청 파이프라인에 원격 인증 게이트웨이를 끼워 넣습니다.

pub mod auth_inner;
pub mod auth_middleware;

pub use auth_middleware::AuthMiddleware;

use actix_web::HttpMessage;

use crate::domain::models::identity::AuthorizedIdentity;

/// 요청 extension에서 게이트웨이가 부착한 신원을 꺼냅니다.
///
/// `AuthMiddleware::required()`가 적용된 라우트에서는 항상 존재합니다.
pub fn authorized_identity(req: &actix_web::HttpRequest) -> Option<AuthorizedIdentity> {
    req.extensions().get::<AuthorizedIdentity>().cloned()
}
