//! 리프레시 세션 엔티티
//!
//! 사용자 한 명이 로그인 채널 하나에서 유지하는 장기 인증 세션입니다.
//! 세션의 비밀 자료(refresh_token, token_key)는 전체 회전 또는 삭제로만
//! 변경되며, 부분 갱신은 허용되지 않습니다.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::models::token::derive_token_key;

/// 세션이 생성된 접속 경로
///
/// 같은 사용자라도 웹과 모바일 앱에서는 서로 다른 세션을 동시에 유지할 수
/// 있습니다. 채널은 세션 생성 이후 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginChannel {
    /// 웹 브라우저
    Web,
    /// 모바일 앱
    MobileApp,
}

impl LoginChannel {
    /// 문자열에서 LoginChannel을 생성합니다.
    ///
    /// # 지원되는 값
    ///
    /// - `"web"` → `LoginChannel::Web`
    /// - `"mobile_app"` → `LoginChannel::MobileApp`
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "web" => Ok(LoginChannel::Web),
            "mobile_app" => Ok(LoginChannel::MobileApp),
            _ => Err(format!("Unsupported login channel: {}", s)),
        }
    }

    /// LoginChannel을 문자열로 변환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginChannel::Web => "web",
            LoginChannel::MobileApp => "mobile_app",
        }
    }
}

/// 리프레시 세션 레코드
///
/// (user_id, login_channel) 쌍마다 최대 하나만 존재합니다. 새 로그인은
/// 기존 세션을 추가하는 것이 아니라 **교체**합니다.
///
/// ## 불변 조건
///
/// - `token_key`는 항상 `refresh_token`의 단방향 다이제스트입니다.
///   이 관계는 생성자와 회전 경로에서만 세션이 만들어지도록 강제하여
///   유지됩니다. 저장소는 원문 토큰이 아닌 `token_key`로만 색인하므로
///   저장소가 유출되어도 리프레시 토큰 원문은 드러나지 않습니다.
/// - `updated_at`은 회전 시에만 전진합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 사용자 ID
    pub user_id: String,
    /// 리프레시 토큰 원문 (로그 출력 금지)
    pub refresh_token: String,
    /// 리프레시 토큰의 SHA-256 다이제스트. 조회 인덱스로 사용
    pub token_key: String,
    /// 로그인 채널 (생성 후 불변)
    pub login_channel: LoginChannel,
    /// 세션이 속한 애플리케이션 ID (멀티테넌트 구분)
    pub app_id: String,
    /// 생성 시각 (Unix timestamp)
    pub created_at: i64,
    /// 마지막 회전 시각 (Unix timestamp)
    pub updated_at: i64,
}

impl Session {
    /// 새 세션을 생성합니다. token_key는 내부에서 파생됩니다.
    pub fn new(
        user_id: &str,
        login_channel: LoginChannel,
        app_id: &str,
        refresh_token: &str,
    ) -> Self {
        let now = Utc::now().timestamp();

        Self {
            user_id: user_id.to_string(),
            refresh_token: refresh_token.to_string(),
            token_key: derive_token_key(refresh_token),
            login_channel,
            app_id: app_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 새 리프레시 토큰으로 회전된 세션을 반환합니다.
    ///
    /// 비밀 자료(refresh_token + token_key)와 updated_at이 함께 교체됩니다.
    /// created_at과 채널/앱 식별 정보는 유지됩니다.
    pub fn rotated(&self, new_refresh_token: &str) -> Self {
        Self {
            user_id: self.user_id.clone(),
            refresh_token: new_refresh_token.to_string(),
            token_key: derive_token_key(new_refresh_token),
            login_channel: self.login_channel,
            app_id: self.app_id.clone(),
            created_at: self.created_at,
            updated_at: Utc::now().timestamp(),
        }
    }

    /// 세션 만료 여부를 판정합니다.
    ///
    /// 마지막 회전 시각 기준으로 리프레시 수명이 경과했으면 만료입니다.
    pub fn is_expired(&self, refresh_ttl_seconds: i64) -> bool {
        self.updated_at + refresh_ttl_seconds <= Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_channel_roundtrip() {
        for &channel_str in &["web", "mobile_app"] {
            let channel = LoginChannel::from_str(channel_str).unwrap();
            assert_eq!(channel.as_str(), channel_str);
        }

        // 대소문자 무관
        assert_eq!(LoginChannel::from_str("WEB").unwrap(), LoginChannel::Web);

        // 지원하지 않는 채널
        assert!(LoginChannel::from_str("desktop").is_err());
    }

    #[test]
    fn test_session_key_binding() {
        let session = Session::new("u1", LoginChannel::Web, "app-1", "refresh-secret");
        assert_eq!(session.token_key, derive_token_key("refresh-secret"));
    }

    #[test]
    fn test_rotation_replaces_secret_material() {
        let session = Session::new("u1", LoginChannel::Web, "app-1", "old-token");
        let rotated = session.rotated("new-token");

        assert_ne!(rotated.refresh_token, session.refresh_token);
        assert_ne!(rotated.token_key, session.token_key);
        assert_eq!(rotated.token_key, derive_token_key("new-token"));
        assert_eq!(rotated.user_id, session.user_id);
        assert_eq!(rotated.login_channel, session.login_channel);
        assert_eq!(rotated.created_at, session.created_at);
    }

    #[test]
    fn test_expiry_boundary() {
        let session = Session::new("u1", LoginChannel::Web, "app-1", "t");
        assert!(!session.is_expired(3600));
        assert!(session.is_expired(0));
    }
}
