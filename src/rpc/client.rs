//! 원격 인증 게이트웨이 클라이언트
//!
//! 모든 보호된 서비스 안에서 실행되는 게이트웨이의 클라이언트 절반입니다.
//! 요청별 상태 기계는 다음과 같습니다:
//!
//! ```text
//! 수신 --(자격 증명 없음)-------------------→ 거부 (Unauthenticated)
//! 수신 --(bearer 추출 성공)----------------→ 검증 중
//! 검증 중 --(원격 호출 성공, 유효)----------→ 승인 (신원 부착)
//! 검증 중 --(원격 호출 성공, 무효)----------→ 거부 (Unauthenticated)
//! 검증 중 --(기한 초과 / 도달 불가)---------→ 거부 (ServiceUnavailable)
//! ```
//!
//! 아이덴티티 서비스에 도달하지 못하면 **반드시 닫힌 채로 실패**합니다.
//! 열린 채로 통과시키는 경로는 존재하지 않습니다.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewaySettings;
use crate::domain::dto::rpc::ValidateRequest;
use crate::domain::models::identity::AuthorizedIdentity;
use crate::errors::errors::AppError;
use crate::rpc::transport::ValidateTransport;

/// 원격 인증 게이트웨이 클라이언트
///
/// `{pattern, fields}` 쌍은 기동 시점의 설정에서 고정되며 요청마다
/// 재협상되지 않습니다.
pub struct RemoteAuthClient {
    transport: Arc<dyn ValidateTransport>,
    pattern: String,
    fields: Vec<String>,
    timeout: Duration,
}

impl RemoteAuthClient {
    pub fn new(transport: Arc<dyn ValidateTransport>, gateway: &GatewaySettings) -> Self {
        Self {
            transport,
            pattern: gateway.pattern.clone(),
            fields: gateway.fields.clone(),
            timeout: Duration::from_millis(gateway.timeout_ms),
        }
    }

    /// Authorization 헤더를 검증하고 투영된 신원을 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError` - 자격 증명 없음/형식 오류/검증 실패
    /// * `AppError::ServiceUnavailable` - 검증기 도달 불가 또는 기한 초과
    pub async fn authenticate(
        &self,
        auth_header: Option<&str>,
    ) -> Result<AuthorizedIdentity, AppError> {
        let header = auth_header.ok_or_else(|| {
            AppError::AuthenticationError("Authorization 헤더가 없습니다".to_string())
        })?;

        let credential = Self::extract_bearer_token(header)?;

        let request = ValidateRequest {
            credential: credential.to_string(),
            fields: self.fields.clone(),
        };

        // 기한이 지나면 전송 결과와 무관하게 ServiceUnavailable.
        // 수신 요청이 취소되면 이 future도 함께 드롭되어 호출이 중단된다.
        let call = self.transport.call(&self.pattern, &request);
        let response = match actix_web::rt::time::timeout(self.timeout, call).await {
            Err(_) => {
                return Err(AppError::ServiceUnavailable(
                    "검증 호출 기한 초과".to_string(),
                ));
            }
            Ok(Err(AppError::ServiceUnavailable(msg))) => {
                return Err(AppError::ServiceUnavailable(msg));
            }
            // 전송 계층의 다른 실패도 닫힌 채로, 재시도 가능 신호로 변환한다
            Ok(Err(e)) => {
                return Err(AppError::ServiceUnavailable(e.to_string()));
            }
            Ok(Ok(response)) => response,
        };

        if !response.ok {
            return Err(AppError::AuthenticationError(
                "유효하지 않은 자격 증명입니다".to_string(),
            ));
        }

        response.identity.ok_or_else(|| {
            AppError::ServiceUnavailable("검증 응답에 신원이 없습니다".to_string())
        })
    }

    /// Bearer 헤더에서 실제 토큰 부분 추출
    fn extract_bearer_token(auth_header: &str) -> Result<&str, AppError> {
        auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::AuthenticationError("유효하지 않은 인증 헤더 형식입니다".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::config::Settings;
    use crate::domain::dto::rpc::ValidateResponse;
    use crate::domain::entities::sessions::LoginChannel;
    use crate::domain::entities::users::User;
    use crate::rpc::transport::LocalValidateTransport;
    use crate::services::auth::codec_service::CodecService;
    use crate::services::auth::validator_service::ValidatorService;

    /// 항상 도달 불가인 전송 스텁
    struct UnreachableTransport;

    #[async_trait]
    impl ValidateTransport for UnreachableTransport {
        async fn call(
            &self,
            _pattern: &str,
            _request: &ValidateRequest,
        ) -> Result<ValidateResponse, AppError> {
            Err(AppError::ServiceUnavailable("connection refused".to_string()))
        }
    }

    /// 응답하지 않고 영원히 매달리는 전송 스텁
    struct HangingTransport;

    #[async_trait]
    impl ValidateTransport for HangingTransport {
        async fn call(
            &self,
            _pattern: &str,
            _request: &ValidateRequest,
        ) -> Result<ValidateResponse, AppError> {
            futures_util::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn local_setup() -> (RemoteAuthClient, String) {
        let settings = Settings::for_tests();
        let codec = Arc::new(CodecService::new(Arc::new(settings.clone())));
        let validator = Arc::new(ValidatorService::new(codec.clone(), &settings));
        let transport = Arc::new(LocalValidateTransport::new(validator));
        let client = RemoteAuthClient::new(transport, &settings.gateway);

        let mut user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        user.id = Some(mongodb::bson::oid::ObjectId::new());
        let pair = codec.mint(&user, LoginChannel::Web, "app-1").unwrap();

        (client, pair.access_token)
    }

    #[actix_web::test]
    async fn test_valid_bearer_attaches_identity() {
        let (client, token) = local_setup();

        let identity = client
            .authenticate(Some(&format!("Bearer {}", token)))
            .await
            .unwrap();

        // 게이트웨이가 선언한 필드(username)만 도착한다
        assert_eq!(identity.username(), Some("alice"));
        assert!(identity.user_id().is_none());
    }

    #[actix_web::test]
    async fn test_missing_header_rejected() {
        let (client, _) = local_setup();

        let result = client.authenticate(None).await;
        assert!(matches!(result, Err(AppError::AuthenticationError(_))));
    }

    #[actix_web::test]
    async fn test_malformed_header_rejected() {
        let (client, token) = local_setup();

        let result = client.authenticate(Some(&token)).await;
        assert!(matches!(result, Err(AppError::AuthenticationError(_))));
    }

    #[actix_web::test]
    async fn test_invalid_credential_rejected_as_unauthenticated() {
        let (client, _) = local_setup();

        let result = client.authenticate(Some("Bearer garbage")).await;
        assert!(matches!(result, Err(AppError::AuthenticationError(_))));
    }

    #[actix_web::test]
    async fn test_unreachable_validator_fails_closed() {
        let settings = Settings::for_tests();
        let client = RemoteAuthClient::new(Arc::new(UnreachableTransport), &settings.gateway);

        // 어떤 토큰을 제시해도 승인 경로는 없다. 응답은 재시도 가능 신호여야 한다
        let result = client.authenticate(Some("Bearer any-token")).await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }

    #[actix_web::test]
    async fn test_hung_validator_times_out_as_unavailable() {
        let settings = Settings::for_tests();
        let client = RemoteAuthClient::new(Arc::new(HangingTransport), &settings.gateway);

        let result = client.authenticate(Some("Bearer any-token")).await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }
}
