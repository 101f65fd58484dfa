//! 사용자 API 핸들러

use actix_web::{get, post, web, HttpRequest, HttpResponse, Result};
use validator::Validate;

use crate::core::registry::ServiceLocator;
use crate::domain::dto::common::ApiResponse;
use crate::domain::dto::users::{CreateUserRequest, UserResponse};
use crate::errors::errors::AppError;
use crate::middlewares::authorized_identity;
use crate::services::users::UserService;

/// 회원가입 API 핸들러
#[post("")]
pub async fn create_user(body: web::Json<CreateUserRequest>) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user_service = ServiceLocator::get::<UserService>();
    let created = user_service.register(request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(UserResponse::from(created))))
}

/// 현재 사용자 정보 조회 API 핸들러
///
/// 게이트웨이가 부착한 투영 신원을 그대로 반환합니다. 선언된 allow-list
/// 밖의 필드는 이 핸들러에 도달하지도 않습니다.
#[get("")]
pub async fn get_current_user(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let identity = authorized_identity(&req)
        .ok_or_else(|| AppError::AuthenticationError("인증이 필요합니다".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(identity)))
}
