//! AuthMiddleware 인증 로직의 핵심적인 기능

use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse};
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::LocalBoxFuture;

use crate::core::registry::ServiceLocator;
use crate::domain::models::auth::AuthMode;
use crate::errors::errors::AppError;
use crate::rpc::client::RemoteAuthClient;

/// 실제 인증 로직을 수행하는 서비스
///
/// 검증기 호출은 요청당 유일한 중단 지점이며, 기한이 있습니다.
/// 수신 요청이 취소(클라이언트 연결 종료)되면 호출 future도 함께
/// 드롭됩니다. 해석된 신원은 이 요청의 extension에만 존재하며
/// 요청을 넘어 캐시되지 않습니다.
pub struct AuthMiddlewareService<S> {
    pub service: Rc<S>,
    pub mode: AuthMode,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, actix_web::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let mode = self.mode;

        Box::pin(async move {
            // 게이트웨이 클라이언트 인스턴스 가져오기
            let auth_client = ServiceLocator::get::<RemoteAuthClient>();

            // Authorization 헤더 추출 후 원격 검증
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string());
            let auth_result = auth_client.authenticate(auth_header.as_deref()).await;

            match (mode, auth_result) {
                // 검증기 도달 불가: 닫힌 채로 실패하되, 재시도 가능 신호로 구분한다
                (AuthMode::Required, Err(AppError::ServiceUnavailable(msg))) => {
                    log::error!("아이덴티티 서비스 도달 불가: {}", msg);
                    let response = HttpResponse::ServiceUnavailable().json(serde_json::json!({
                        "error": "identity_service_unavailable",
                        "message": "인증 서비스에 연결할 수 없습니다. 잠시 후 다시 시도해주세요"
                    }));
                    let (req, _) = req.into_parts();
                    let res = ServiceResponse::new(req, response).map_into_right_body();
                    return Ok(res);
                }
                // Required 모드에서 인증 실패
                (AuthMode::Required, Err(err)) => {
                    log::warn!("인증 실패: {}", err);
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "authentication_required",
                        "message": "유효한 인증 토큰이 필요합니다"
                    }));
                    let (req, _) = req.into_parts();
                    let res = ServiceResponse::new(req, response).map_into_right_body();
                    return Ok(res);
                }
                // 인증 성공: 투영된 신원을 Request Extensions에 저장
                (_, Ok(identity)) => {
                    log::debug!(
                        "인증 성공: username {}",
                        identity.username().unwrap_or("(미투영)")
                    );
                    req.extensions_mut().insert(identity);
                }
                // Optional 모드에서 인증 실패 (진행 허용)
                (AuthMode::Optional, Err(_)) => {
                    log::debug!("선택적 인증: 유효한 토큰 없음, 요청 진행");
                }
            }

            // 다음 서비스로 요청 전달
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
