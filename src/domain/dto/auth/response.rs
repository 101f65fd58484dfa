//! 인증 응답 DTO

use serde::Serialize;

use crate::domain::models::token::TokenPair;

/// 토큰 발급 응답 DTO
///
/// OAuth 2.0 토큰 응답 형식을 따릅니다.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.expires_in,
        }
    }
}
