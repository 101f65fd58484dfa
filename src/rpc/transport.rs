//! 검증 호출 전송 계층
//!
//! 검증기를 호출하는 방법은 배치 형태에 따라 다릅니다:
//!
//! - 아이덴티티 서비스가 아닌 모든 서비스는 HTTP로 원격 호출합니다
//!   ([`HttpValidateTransport`]).
//! - 아이덴티티 서비스 자신의 라우트를 보호할 때는 네트워크를 거치지 않고
//!   같은 프로세스의 검증기로 직접 디스패치합니다
//!   ([`LocalValidateTransport`]).
//!
//! 두 경우 모두 전송 실패(`Err`)와 검증 실패(`Ok`이되 `ok: false`)는
//! 별개의 축입니다. 전송 실패는 `ServiceUnavailable`로만 표현됩니다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::dto::rpc::{ValidateRequest, ValidateResponse};
use crate::errors::errors::AppError;
use crate::services::auth::validator_service::ValidatorService;

/// 검증 호출 전송 계약
#[async_trait]
pub trait ValidateTransport: Send + Sync {
    /// 패턴 주소로 검증 요청을 전달합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ServiceUnavailable` - 검증기에 도달하지 못한 모든 경우
    async fn call(
        &self,
        pattern: &str,
        request: &ValidateRequest,
    ) -> Result<ValidateResponse, AppError>;
}

/// HTTP 기반 검증 호출 전송
///
/// `POST {base}/rpc/{pattern}` 으로 요청을 전달합니다.
pub struct HttpValidateTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpValidateTransport {
    /// 새 HTTP 전송을 생성합니다.
    ///
    /// 클라이언트 수준 타임아웃은 게이트웨이의 요청별 기한과 별개로
    /// 커넥션이 붙잡혀 있는 것을 막는 하한 장치입니다.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ValidateTransport for HttpValidateTransport {
    async fn call(
        &self,
        pattern: &str,
        request: &ValidateRequest,
    ) -> Result<ValidateResponse, AppError> {
        let url = format!("{}/rpc/{}", self.base_url, pattern);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppError::ServiceUnavailable(format!("검증 호출 전송 실패: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ServiceUnavailable(format!(
                "검증기 비정상 응답: {}",
                response.status()
            )));
        }

        response.json::<ValidateResponse>().await.map_err(|e| {
            AppError::ServiceUnavailable(format!("검증 응답 파싱 실패: {}", e))
        })
    }
}

/// 프로세스 내 직접 디스패치 전송
///
/// 아이덴티티 서비스가 자기 자신의 라우트를 보호할 때 사용합니다.
pub struct LocalValidateTransport {
    validator: Arc<ValidatorService>,
}

impl LocalValidateTransport {
    pub fn new(validator: Arc<ValidatorService>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl ValidateTransport for LocalValidateTransport {
    async fn call(
        &self,
        pattern: &str,
        request: &ValidateRequest,
    ) -> Result<ValidateResponse, AppError> {
        // 미등록 패턴도 호출자 입장에서는 도달 불가와 같다
        self.validator
            .handle(pattern, request)
            .map_err(|e| AppError::ServiceUnavailable(e.to_string()))
    }
}
