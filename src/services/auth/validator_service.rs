//! 아이덴티티 검증기 서비스
//!
//! "이 자격 증명이 지금 유효한 사용자를 가리키는가"에 대한 권위 있는
//! 판정을 내리는 서비스입니다. 아이덴티티 서비스 내부에서만 실행되며,
//! 다른 서비스들은 패턴 주소 원격 호출로만 도달할 수 있습니다.
//!
//! ## 필드 투영 규칙
//!
//! 응답 필드의 allow-list는 **호출자**가 선언하지만, 서버에 등록된 능력
//! (`Settings.validator.allowed_fields`)을 벗어날 수 없습니다. 호출자가
//! 무엇을 요청하든 `요청 필드 ∩ 등록 능력`만 반환됩니다. 새 서비스가
//! 추가될 때 필드 요구가 슬금슬금 늘어나는 것을 서버 쪽에서 차단하는
//! 장치입니다.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::Settings;
use crate::domain::dto::rpc::{ValidateRequest, ValidateResponse};
use crate::domain::models::identity::AuthorizedIdentity;
use crate::domain::models::token::TokenClaims;
use crate::errors::errors::AppError;
use crate::services::auth::codec_service::CodecService;

/// 아이덴티티 검증기
///
/// 검증 실패는 전송 오류가 아닌 구조화된 응답(`ok: false`)으로 반환합니다.
/// 호출자가 "인증 실패"와 "서비스 도달 불가"를 구분할 수 있어야 하기
/// 때문입니다.
pub struct ValidatorService {
    codec: Arc<CodecService>,
    /// 이 검증기가 응답하는 유일한 원격 호출 패턴
    pattern: String,
    /// 서버에 등록된 투영 능력. 이 집합 밖의 필드는 절대 반환되지 않는다
    allowed_fields: Vec<String>,
}

impl ValidatorService {
    pub fn new(codec: Arc<CodecService>, settings: &Settings) -> Self {
        Self {
            codec,
            pattern: settings.gateway.pattern.clone(),
            allowed_fields: settings.validator.allowed_fields.clone(),
        }
    }

    /// 패턴 주소 원격 호출의 진입점
    ///
    /// 등록되지 않은 패턴은 `NotFound`로 거부합니다.
    pub fn handle(
        &self,
        pattern: &str,
        request: &ValidateRequest,
    ) -> Result<ValidateResponse, AppError> {
        if pattern != self.pattern {
            return Err(AppError::NotFound(format!(
                "등록되지 않은 호출 패턴: {}",
                pattern
            )));
        }

        Ok(self.validate(request))
    }

    /// 자격 증명을 검증하고 선언된 필드로 투영합니다.
    ///
    /// 코덱의 상태 없는 검증(서명 + 만료)을 통과하면 클레임에서 투영을
    /// 구성합니다. 실패는 구조화된 `unauthenticated` 응답입니다.
    pub fn validate(&self, request: &ValidateRequest) -> ValidateResponse {
        match self.codec.verify_access(&request.credential) {
            Ok(claims) => {
                let identity = self.project(&claims, &request.fields);
                ValidateResponse::authorized(identity)
            }
            Err(e) => {
                log::debug!("자격 증명 검증 실패: {}", e);
                ValidateResponse::unauthenticated()
            }
        }
    }

    /// 클레임을 `요청 필드 ∩ 등록 능력`으로 투영합니다.
    fn project(&self, claims: &TokenClaims, requested: &[String]) -> AuthorizedIdentity {
        let mut candidates: Map<String, Value> = Map::new();
        candidates.insert("user_id".to_string(), Value::String(claims.sub.clone()));
        candidates.insert(
            "username".to_string(),
            Value::String(claims.username.clone()),
        );
        if let Some(email) = &claims.email {
            candidates.insert("email".to_string(), Value::String(email.clone()));
        }

        let mut fields = Map::new();
        for name in requested {
            if !self.allowed_fields.contains(name) {
                log::debug!("등록 능력 밖의 필드 요청 무시: {}", name);
                continue;
            }
            if let Some(value) = candidates.remove(name) {
                fields.insert(name.clone(), value);
            }
        }

        AuthorizedIdentity::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::sessions::LoginChannel;
    use crate::domain::entities::users::User;

    fn setup() -> (ValidatorService, String) {
        let settings = Settings::for_tests();
        let codec = Arc::new(CodecService::new(Arc::new(settings.clone())));
        let validator = ValidatorService::new(codec.clone(), &settings);

        let mut user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        user.id = Some(mongodb::bson::oid::ObjectId::new());
        let pair = codec.mint(&user, LoginChannel::Web, "app-1").unwrap();

        (validator, pair.access_token)
    }

    fn request(credential: &str, fields: &[&str]) -> ValidateRequest {
        ValidateRequest {
            credential: credential.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_credential_projects_declared_fields() {
        let (validator, token) = setup();

        let response = validator.validate(&request(&token, &["username"]));

        assert!(response.ok);
        let identity = response.identity.unwrap();
        assert_eq!(identity.username(), Some("alice"));
        // 선언한 필드 외에는 아무것도 반환되지 않는다
        assert_eq!(identity.fields.len(), 1);
    }

    #[test]
    fn test_projection_never_exceeds_declared_fields() {
        let (validator, token) = setup();

        let response = validator.validate(&request(&token, &["username", "user_id"]));

        let identity = response.identity.unwrap();
        assert!(identity.username().is_some());
        assert!(identity.user_id().is_some());
        assert!(identity.get("email").is_none());
    }

    #[test]
    fn test_projection_capped_by_registered_capability() {
        let settings = Settings::for_tests();
        let codec = Arc::new(CodecService::new(Arc::new(settings.clone())));

        // 등록 능력을 username 하나로 좁힌다
        let mut narrow = settings.clone();
        narrow.validator.allowed_fields = vec!["username".to_string()];
        let validator = ValidatorService::new(codec.clone(), &narrow);

        let mut user = User::new_local(
            "bob@example.com".to_string(),
            "bob".to_string(),
            "hash".to_string(),
        );
        user.id = Some(mongodb::bson::oid::ObjectId::new());
        let pair = codec.mint(&user, LoginChannel::Web, "app-1").unwrap();

        // 호출자가 능력 밖 필드를 요청해도 반환되지 않는다
        let response =
            validator.validate(&request(&pair.access_token, &["username", "email", "user_id"]));

        let identity = response.identity.unwrap();
        assert_eq!(identity.fields.len(), 1);
        assert_eq!(identity.username(), Some("bob"));
    }

    #[test]
    fn test_invalid_credential_is_structured_failure() {
        let (validator, _) = setup();

        let response = validator.validate(&request("garbage-token", &["username"]));

        assert!(!response.ok);
        assert!(response.identity.is_none());
        assert_eq!(response.reason.as_deref(), Some("unauthenticated"));
    }

    #[test]
    fn test_unknown_pattern_rejected() {
        let (validator, token) = setup();

        let result = validator.handle("Order.create", &request(&token, &["username"]));
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = validator.handle("User.login", &request(&token, &["username"]));
        assert!(result.unwrap().ok);
    }
}
