//! API 라우트 설정 모듈
//!
//! RESTful API 엔드포인트들을 기능별로 그룹화하여 제공합니다.
//! 인증 관련 라우트, 사용자 라우트, 서비스 간 검증 엔드포인트,
//! 헬스체크 엔드포인트를 포함합니다.
//!
//! # Auth Middleware Usage
//!
//! 라우트에 따라 다른 인증 레벨을 적용할 수 있습니다:
//!
//! ```rust,ignore
//! // 인증 불필요 (로그인/회원가입/갱신)
//! cfg.service(
//!     web::scope("/api/v1/auth")
//!         .service(handlers::auth::login_handler)
//!         .service(handlers::auth::refresh_handler)
//! );
//!
//! // 인증 필요 (게이트웨이 미들웨어 적용)
//! cfg.service(
//!     web::scope("/api/v1/me")
//!         .wrap(AuthMiddleware::required())
//!         .service(handlers::users::get_current_user)
//! );
//! ```

use actix_web::web;
use serde_json::json;

use crate::handlers;
use crate::middlewares::AuthMiddleware;

/// 모든 라우트를 설정합니다
///
/// 기능별로 분할된 라우트들을 통합하여 애플리케이션에 등록합니다.
pub fn configure_all_routes(cfg: &mut web::ServiceConfig) {
    // Health check endpoint
    cfg.service(health_check);

    // Feature-specific routes
    configure_user_routes(cfg);
    configure_auth_routes(cfg);
    configure_rpc_routes(cfg);
}

/// 사용자 관련 라우트를 설정합니다
///
/// ## Public 라우트 (인증 불필요)
/// - `POST /api/v1/users` - 회원가입
///
/// ## Protected 라우트 (게이트웨이 인증 필요)
/// - `GET /api/v1/me` - 현재 사용자 투영 신원 조회
fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    // Public routes
    cfg.service(web::scope("/api/v1/users").service(handlers::users::create_user));

    // Protected routes
    cfg.service(
        web::scope("/api/v1/me")
            .wrap(AuthMiddleware::required())
            .service(handlers::users::get_current_user),
    );
}

/// 인증 관련 라우트를 설정합니다
///
/// ## Public 라우트
/// - `POST /api/v1/auth/login` - 로그인 (세션 교체 발급)
/// - `POST /api/v1/auth/refresh` - 리프레시 토큰 교환
///
/// ## Protected 라우트
/// - `POST /api/v1/auth/session/logout` - 로그아웃 (세션 무효화)
fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(handlers::auth::login_handler)
            .service(handlers::auth::refresh_handler)
            .service(
                web::scope("/session")
                    .wrap(AuthMiddleware::required())
                    .service(handlers::auth::logout_handler),
            ),
    );
}

/// 서비스 간 검증 엔드포인트를 설정합니다
///
/// - `POST /rpc/{pattern}` - 패턴 주소 검증 호출 (게이트웨이 전용)
fn configure_rpc_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::rpc::validate_rpc_handler);
}

/// 서비스 상태를 확인하는 헬스체크 엔드포인트
///
/// 로드밸런서나 모니터링 시스템에서 서비스 상태를 확인하는 데 사용됩니다.
#[actix_web::get("/health")]
async fn health_check() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "user_center_backend",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "features": {
            "database": "MongoDB",
            "session_store": "Redis",
            "dependency_injection": "Singleton Macro"
        }
    }))
}
