//! 아이덴티티 검증기의 원격 호출 엔드포인트
//!
//! 다른 서비스의 게이트웨이가 호출하는 패턴 주소 엔드포인트입니다.
//! 검증 실패는 HTTP 에러가 아니라 본문의 `ok: false`로 전달됩니다.
//! HTTP 수준의 실패는 "검증기에 도달하지 못함"만을 의미해야 하기 때문입니다.

use actix_web::{post, web, HttpResponse, Result};

use crate::core::registry::ServiceLocator;
use crate::domain::dto::rpc::ValidateRequest;
use crate::errors::errors::AppError;
use crate::services::auth::ValidatorService;
use crate::utils::string_utils::validate_required_string;

/// 검증 호출 핸들러
///
/// `POST /rpc/{pattern}`: 등록되지 않은 패턴은 404로 거부됩니다.
#[post("/rpc/{pattern}")]
pub async fn validate_rpc_handler(
    path: web::Path<String>,
    body: web::Json<ValidateRequest>,
) -> Result<HttpResponse, AppError> {
    let pattern = validate_required_string(&path.into_inner(), "pattern")?;

    let validator = ServiceLocator::get::<ValidatorService>();
    let response = validator.handle(&pattern, &body.into_inner())?;

    Ok(HttpResponse::Ok().json(response))
}
