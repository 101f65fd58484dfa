//! 인증 토큰 구조체 및 페어링 된 세트
//!
//! RFC 7519 JWT 표준 클레임과 2개의 용도별 토큰을 페어링 한 정보를 표시합니다.
//! 액세스 토큰은 서명 검증만으로 유효성이 판정되는 단기 토큰이고,
//! 리프레시 토큰은 저장소 조회가 필요한 장기 불투명 토큰입니다.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::entities::sessions::LoginChannel;

/// 액세스 토큰의 클레임(Payload) 구조체
///
/// RFC 7519 JWT 표준의 클레임과 애플리케이션 특화 클레임을 포함합니다.
/// 개인정보 보호를 위해 최소한의 정보만 포함합니다.
///
/// ## 클레임 구성
///
/// - `sub`: 토큰의 주체 (사용자 ID)
/// - `username`: 사용자 이름 (다운스트림 서비스 투영용)
/// - `email`: 사용자 이메일 (선택사항)
/// - `channel`: 세션이 생성된 로그인 채널
/// - `app_id`: 세션이 속한 애플리케이션
/// - `iat`: 토큰 발급 시간 (Unix timestamp)
/// - `exp`: 토큰 만료 시간 (Unix timestamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// 토큰의 주체 (사용자 ID)
    pub sub: String,
    /// 사용자 이름
    pub username: String,
    /// 사용자 이메일 (선택사항)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 로그인 채널
    pub channel: LoginChannel,
    /// 애플리케이션 ID
    pub app_id: String,
    /// 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
}

/// 토큰 쌍 구조체
///
/// 로그인/갱신 시 클라이언트에게 전달되는 토큰 집합을 나타냅니다.
/// OAuth 2.0 표준의 토큰 응답 형식을 따릅니다.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// 액세스 토큰 (API 접근용 단기 토큰)
    pub access_token: String,
    /// 리프레시 토큰 (토큰 갱신용 장기 불투명 토큰, 1회 사용)
    pub refresh_token: String,
    /// 액세스 토큰 만료 시간 (초)
    pub expires_in: i64,
}

/// 리프레시 토큰에서 조회 키를 파생합니다.
///
/// 순수하고 결정적인 단방향 함수(SHA-256)입니다. 저장소에는 원문 토큰
/// 대신 이 키만 색인되므로, 저장소가 유출되어도 유효한 리프레시 토큰을
/// 복원할 수 없습니다.
///
/// # 반환값
///
/// 64글자 16진수 다이제스트 문자열
pub fn derive_token_key(refresh_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(refresh_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_token_key_is_deterministic() {
        let a = derive_token_key("some-refresh-token");
        let b = derive_token_key("some-refresh-token");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_derive_token_key_distinguishes_tokens() {
        // 대표 코퍼스에서 서로 다른 토큰은 서로 다른 키를 가져야 한다
        let tokens = [
            "token-a",
            "token-b",
            "token-a ",
            "Token-a",
            "",
            "아주-긴-토큰-문자열-1234567890",
        ];

        let keys: std::collections::HashSet<String> =
            tokens.iter().map(|t| derive_token_key(t)).collect();

        assert_eq!(keys.len(), tokens.len());
    }

    #[test]
    fn test_claims_email_omitted_when_none() {
        let claims = TokenClaims {
            sub: "u1".to_string(),
            username: "alice".to_string(),
            email: None,
            channel: LoginChannel::Web,
            app_id: "app-1".to_string(),
            iat: 0,
            exp: 0,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("email"));
    }
}
