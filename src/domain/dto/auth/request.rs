//! 인증 요청 DTO

use serde::Deserialize;
use validator::Validate;

use crate::domain::entities::sessions::LoginChannel;

fn default_channel() -> LoginChannel {
    LoginChannel::Web
}

/// 로그인 요청 DTO
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// 사용자명
    #[validate(length(min = 3, max = 30, message = "사용자명은 3-30자 사이여야 합니다"))]
    pub username: String,

    /// 비밀번호
    #[validate(length(min = 8, message = "비밀번호는 최소 8자 이상이어야 합니다"))]
    pub password: String,

    /// 로그인 채널 (생략 시 web)
    #[serde(default = "default_channel")]
    pub channel: LoginChannel,

    /// 애플리케이션 ID (생략 시 기본 애플리케이션)
    #[serde(default)]
    pub app_id: Option<String>,
}

/// 토큰 갱신 요청 DTO
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 로그아웃 요청 DTO
#[derive(Deserialize)]
pub struct LogoutRequest {
    /// 종료할 세션의 로그인 채널 (생략 시 web)
    #[serde(default = "default_channel")]
    pub channel: LoginChannel,
}
