//! 토큰 코덱 서비스 구현
//!
//! 액세스/리프레시 토큰의 발급과 검증을 담당합니다.
//! 액세스 토큰은 HMAC-SHA256 서명 JWT로, 저장소 조회 없이 서명과 만료만으로
//! 검증됩니다. 리프레시 토큰은 고엔트로피 불투명 문자열이며, 저장소에는
//! 원문 대신 단방향 다이제스트(token_key)만 색인됩니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::entities::sessions::LoginChannel;
use crate::domain::entities::users::User;
use crate::domain::models::token::{derive_token_key, TokenClaims, TokenPair};
use crate::errors::errors::AppError;

/// 토큰 코덱 서비스
///
/// 생성 시점에 전달받은 설정 스냅샷 외의 상태를 갖지 않습니다.
/// 검증 경로는 네트워크/저장소를 전혀 건드리지 않으므로, 보호된 서비스의
/// 요청 처리 경로에 동기적으로 끼어들 수 있습니다.
pub struct CodecService {
    settings: Arc<Settings>,
}

impl CodecService {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// 사용자를 위한 액세스/리프레시 토큰 쌍 생성
    ///
    /// # Arguments
    ///
    /// * `user` - 토큰을 발급받을 사용자
    /// * `channel` - 세션이 생성된 로그인 채널
    /// * `app_id` - 세션이 속한 애플리케이션
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 토큰 생성 실패 또는 사용자 ID 없음
    pub fn mint(
        &self,
        user: &User,
        channel: LoginChannel,
        app_id: &str,
    ) -> Result<TokenPair, AppError> {
        let access_token = self.generate_access_token(user, channel, app_id)?;
        let refresh_token = Self::generate_refresh_token();
        let expires_in = self.settings.token.access_ttl_minutes * 60;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in,
        })
    }

    /// 액세스 토큰 생성
    ///
    /// 서비스 전역 비밀키로 서명되며, 짧은 고정 수명을 갖습니다.
    fn generate_access_token(
        &self,
        user: &User,
        channel: LoginChannel,
        app_id: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.settings.token.access_ttl_minutes);

        let claims = TokenClaims {
            sub: user
                .id_string()
                .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?,
            username: user.username.clone(),
            email: Some(user.email.clone()),
            channel,
            app_id: app_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let header = Header::default();
        let encoding_key = EncodingKey::from_secret(self.settings.token.secret.as_ref());

        encode(&header, &claims, &encoding_key)
            .map_err(|e| AppError::InternalError(format!("액세스 토큰 생성 실패: {}", e)))
    }

    /// 리프레시 토큰 생성
    ///
    /// 구조가 없는 고엔트로피 문자열입니다. 서명이나 클레임을 갖지 않으며,
    /// 유효성은 오직 저장소의 token_key 색인으로만 판정됩니다.
    pub fn generate_refresh_token() -> String {
        format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        )
    }

    /// 액세스 토큰 검증 및 클레임 추출
    ///
    /// 서명, 구조, 만료를 검사합니다. 저장소를 조회하지 않습니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError` - 만료, 잘못된 서명/형식
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, AppError> {
        let decoding_key = DecodingKey::from_secret(self.settings.token.secret.as_ref());
        let validation = Validation::default();

        decode::<TokenClaims>(token, &decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::AuthenticationError("토큰이 만료되었습니다".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::AuthenticationError("토큰 서명이 유효하지 않습니다".to_string())
                }
                _ => AppError::AuthenticationError("유효하지 않은 토큰입니다".to_string()),
            })
    }

    /// 리프레시 토큰에서 저장소 조회 키 파생
    ///
    /// 순수하고 결정적인 단방향 함수입니다.
    pub fn derive_key(&self, refresh_token: &str) -> String {
        derive_token_key(refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CodecService {
        CodecService::new(Arc::new(Settings::for_tests()))
    }

    fn sample_user() -> User {
        let mut user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        user.id = Some(mongodb::bson::oid::ObjectId::new());
        user
    }

    #[test]
    fn test_mint_and_verify_roundtrip() {
        let codec = codec();
        let user = sample_user();

        let pair = codec.mint(&user, LoginChannel::Web, "app-1").unwrap();
        let claims = codec.verify_access(&pair.access_token).unwrap();

        assert_eq!(claims.sub, user.id_string().unwrap());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.channel, LoginChannel::Web);
        assert_eq!(claims.app_id, "app-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let codec = codec();
        let user = sample_user();

        let pair = codec.mint(&user, LoginChannel::Web, "app-1").unwrap();
        let mut tampered = pair.access_token.clone();
        tampered.pop();
        tampered.push('x');

        assert!(matches!(
            codec.verify_access(&tampered),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let codec = codec();
        let user = sample_user();
        let pair = codec.mint(&user, LoginChannel::Web, "app-1").unwrap();

        let mut other_settings = Settings::for_tests();
        other_settings.token.secret = "another-secret".to_string();
        let other_codec = CodecService::new(Arc::new(other_settings));

        assert!(other_codec.verify_access(&pair.access_token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // 음수 TTL로 이미 만료된 토큰을 발급한다 (기본 leeway 60초를 넘긴다)
        let mut settings = Settings::for_tests();
        settings.token.access_ttl_minutes = -5;
        let codec = CodecService::new(Arc::new(settings));

        let pair = codec.mint(&sample_user(), LoginChannel::Web, "app-1").unwrap();

        assert!(matches!(
            codec.verify_access(&pair.access_token),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let codec = codec();
        assert!(codec.verify_access("not-a-jwt").is_err());
        assert!(codec.verify_access("").is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique_and_opaque() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let token = CodecService::generate_refresh_token();
            assert_eq!(token.len(), 64);
            assert!(seen.insert(token));
        }
    }

    #[test]
    fn test_derive_key_matches_domain_function() {
        let codec = codec();
        let token = CodecService::generate_refresh_token();

        assert_eq!(codec.derive_key(&token), derive_token_key(&token));
    }
}
