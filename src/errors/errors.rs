//! 애플리케이션 전역에서 사용하는 에러 시스템
//!
//! 유저센터 백엔드를 위한 통합 에러 처리 시스템입니다.
//! `thiserror`와 `actix_web::ResponseError`를 사용하여 타입 안전하고
//! 일관된 에러 처리를 제공합니다.
//!
//! ## 인증 에러 분류
//!
//! 세션/토큰 수명주기에서 발생하는 에러는 클라이언트의 재시도 정책이
//! 달라지기 때문에 반드시 구분되어야 합니다:
//!
//! - `AuthenticationError`: 자격 증명이 없거나, 손상되었거나, 만료된 경우.
//!   클라이언트는 재시도하지 않고 재로그인해야 합니다. (401)
//! - `ServiceUnavailable`: 인증 서비스에 도달하지 못했거나 응답 기한을
//!   초과한 경우. 클라이언트는 백오프 후 재시도할 수 있습니다. (503)
//! - `UnknownToken`: 제시된 리프레시 토큰이 저장된 어떤 키와도 일치하지
//!   않는 경우 (이미 소모됨, 위조됨, 발급된 적 없음). 클라이언트에게는
//!   `AuthenticationError`와 동일하게 401로 노출되지만, 이상 징후 탐지를
//!   위해 발생 지점에서 별도로 로깅됩니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::errors::errors::AppError;
//!
//! async fn create_user(data: CreateUserRequest) -> Result<User, AppError> {
//!     if data.email.is_empty() {
//!         return Err(AppError::ValidationError("Email is required".to_string()));
//!     }
//!
//!     let user = user_repo.create(data).await
//!         .map_err(|e| AppError::DatabaseError(e.to_string()))?;
//!
//!     Ok(user)
//! }
//! ```

use thiserror::Error;

/// 애플리케이션 전역 에러 타입
///
/// 유저센터 서비스에서 발생할 수 있는 모든 종류의 에러를 포괄하는 열거형입니다.
/// 자동으로 HTTP 응답으로 변환되어 클라이언트에게 전달됩니다.
#[derive(Error, Debug)]
pub enum AppError {
    /// 데이터베이스 관련 에러 (500 Internal Server Error)
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Redis 세션 저장소 관련 에러 (500 Internal Server Error)
    #[error("Redis error: {0}")]
    RedisError(String),

    /// 입력값 검증 에러 (400 Bad Request)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 리소스 찾을 수 없음 에러 (404 Not Found)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 충돌/중복 에러 (409 Conflict)
    #[error("Conflict error: {0}")]
    ConflictError(String),

    /// 인증 실패 에러 (401 Unauthorized)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// 권한 부족 에러 (403 Forbidden)
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// 저장소에 존재하지 않는 리프레시 토큰 (401 Unauthorized)
    ///
    /// 클라이언트 응답은 `AuthenticationError`와 동일한 형태이지만
    /// 리플레이 공격 탐지를 위해 발생 지점에서 별도의 경고 로그를 남깁니다.
    #[error("Unknown refresh token")]
    UnknownToken,

    /// 인증 서비스 도달 불가 또는 응답 기한 초과 (503 Service Unavailable)
    ///
    /// 일시적 네트워크 장애를 인증 실패로 오인하면 대량 세션 무효화로
    /// 이어지므로, 반드시 `AuthenticationError`와 구분하여 반환합니다.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 외부 서비스 에러 (500 Internal Server Error)
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 내부 서버 에러 (500 Internal Server Error)
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl actix_web::ResponseError for AppError {
    /// HTTP 에러 응답을 생성합니다.
    ///
    /// 각 에러 타입을 적절한 HTTP 상태 코드와 JSON 응답으로 변환합니다.
    /// `UnknownToken`은 저장소 내부 상태를 노출하지 않도록
    /// 일반 인증 실패와 동일한 본문으로 가려집니다.
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::http::StatusCode;

        let status = match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::AuthenticationError(_) | AppError::UnknownToken => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // 클라이언트에게는 토큰이 왜 거부되었는지 구분해서 알려주지 않는다
        let message = match self {
            AppError::UnknownToken => "Authentication error: invalid credentials".to_string(),
            other => other.to_string(),
        };

        actix_web::HttpResponse::build(status)
            .json(serde_json::json!({
                "error": message
            }))
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 외부 라이브러리 에러를 AppError로 변환하는 확장 trait
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> AppResult<T>;

    /// 클로저를 사용하여 지연 평가된 컨텍스트를 제공합니다.
    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", f(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_validation_error_response() {
        let error = AppError::ValidationError("Email is required".to_string());
        let response = error.error_response();

        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_authentication_error_response() {
        let error = AppError::AuthenticationError("Invalid token".to_string());
        let response = error.error_response();

        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_token_maps_to_unauthorized() {
        // 소모된 리프레시 토큰은 클라이언트 입장에서 인증 실패와 동일해야 한다
        let error = AppError::UnknownToken;
        let response = error.error_response();

        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_service_unavailable_response() {
        let error = AppError::ServiceUnavailable("identity service timeout".to_string());
        let response = error.error_response();

        assert_eq!(
            response.status(),
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_conflict_error_response() {
        let error = AppError::ConflictError("duplicate email".to_string());
        let response = error.error_response();

        assert_eq!(response.status(), actix_web::http::StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_context_trait() {
        let result: Result<(), &str> = Err("original error");
        let app_result = result.context("Additional context");

        assert!(app_result.is_err());
        if let Err(AppError::InternalError(msg)) = app_result {
            assert!(msg.contains("Additional context"));
            assert!(msg.contains("original error"));
        } else {
            panic!("Expected InternalError");
        }
    }
}
