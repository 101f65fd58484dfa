//! 인증 API 핸들러
//!
//! 로그인, 토큰 갱신, 로그아웃 엔드포인트를 제공합니다.

use actix_web::{post, web, HttpRequest, HttpResponse, Result};
use validator::Validate;

use crate::config::Settings;
use crate::core::registry::ServiceLocator;
use crate::domain::dto::auth::{LoginRequest, LogoutRequest, RefreshRequest, TokenResponse};
use crate::domain::dto::common::ApiResponse;
use crate::errors::errors::AppError;
use crate::middlewares::authorized_identity;
use crate::services::auth::SessionService;
use crate::utils::string_utils::clean_optional_string;

/// 로그인 API 핸들러
///
/// 자격 증명 검증 후 (사용자, 채널) 쌍의 세션을 교체 발급합니다.
#[post("/login")]
pub async fn login_handler(body: web::Json<LoginRequest>) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let settings = ServiceLocator::get::<Settings>();
    let app_id = clean_optional_string(request.app_id.clone())
        .unwrap_or_else(|| settings.session.default_app_id.clone());

    let session_service = ServiceLocator::get::<SessionService>();
    let pair = session_service
        .login(&request.username, &request.password, request.channel, &app_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TokenResponse::from(pair))))
}

/// 토큰 갱신 API 핸들러
///
/// 제시된 리프레시 토큰을 소모하고 새 토큰 쌍을 발급합니다.
/// 이미 소모된 토큰은 일반 인증 실패와 동일한 응답으로 거부됩니다.
#[post("/refresh")]
pub async fn refresh_handler(
    refresh_req: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let session_service = ServiceLocator::get::<SessionService>();
    let pair = session_service
        .refresh(&refresh_req.refresh_token)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TokenResponse::from(pair))))
}

/// 로그아웃 API 핸들러
///
/// 게이트웨이가 부착한 신원의 (사용자, 채널) 세션을 삭제합니다. 멱등 연산입니다.
#[post("/logout")]
pub async fn logout_handler(
    req: HttpRequest,
    body: web::Json<LogoutRequest>,
) -> Result<HttpResponse, AppError> {
    let identity = authorized_identity(&req).ok_or_else(|| {
        AppError::AuthenticationError("인증이 필요합니다".to_string())
    })?;

    let user_id = identity
        .user_id()
        .ok_or_else(|| {
            AppError::InternalError(
                "게이트웨이 필드 구성에 user_id가 없습니다".to_string(),
            )
        })?
        .to_string();

    let session_service = ServiceLocator::get::<SessionService>();
    session_service.logout(&user_id, body.channel).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        data: None,
        message: Some("로그아웃이 성공적으로 처리되었습니다".to_string()),
    }))
}
