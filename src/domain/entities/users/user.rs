//! User Entity Implementation
//!
//! 사용자 엔티티의 핵심 구현체입니다.
//! 계정 상태(미승인/유효/동결)를 포함하여, 인증 가능 여부 판정을
//! 엔티티 차원에서 제공합니다.

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// 계정 상태
///
/// 동결(`Frozen`) 상태의 계정은 로그인은 물론 기존 세션의 토큰 회전도
/// 거부됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// 계정 미승인
    Pending,
    /// 계정 유효
    Active,
    /// 계정 동결
    Frozen,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Frozen => "frozen",
        }
    }
}

/// 사용자 엔티티
///
/// 유저센터의 모든 사용자를 표현하는 핵심 도메인 엔티티입니다.
/// 비밀번호는 bcrypt 해시로만 저장됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// 사용자 이메일 (unique)
    pub email: String,
    /// 사용자 이름 (unique)
    pub username: String,
    /// 해시된 비밀번호
    pub password_hash: String,
    /// 계정 상태
    pub status: UserStatus,
    /// 마지막 로그인 시각 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<i64>,
    /// 생성 시각 (Unix timestamp)
    pub created_at: i64,
    /// 수정 시각 (Unix timestamp)
    pub updated_at: i64,
}

impl User {
    /// 새 로컬 사용자를 생성합니다.
    ///
    /// 생성 직후 상태는 `Active`입니다.
    pub fn new_local(email: String, username: String, password_hash: String) -> Self {
        let now = Utc::now().timestamp();

        Self {
            id: None,
            email,
            username,
            password_hash,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// ID 문자열로 변환
    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.to_hex())
    }

    /// 인증에 사용할 수 있는 계정인지 확인
    pub fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_local_user_is_active() {
        let user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hashed".to_string(),
        );

        assert!(user.is_active());
        assert!(user.id.is_none());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_frozen_user_is_not_active() {
        let mut user = User::new_local(
            "bob@example.com".to_string(),
            "bob".to_string(),
            "hashed".to_string(),
        );
        user.status = UserStatus::Frozen;

        assert!(!user.is_active());
    }

    #[test]
    fn test_id_string() {
        let mut user = User::new_local(
            "carol@example.com".to_string(),
            "carol".to_string(),
            "hashed".to_string(),
        );
        assert!(user.id_string().is_none());

        let oid = ObjectId::new();
        user.id = Some(oid);
        assert_eq!(user.id_string().unwrap(), oid.to_hex());
    }
}
