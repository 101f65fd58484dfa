//! 사용자 응답 DTO (민감한 정보 제외)

use serde::Serialize;

use crate::domain::entities::users::User;

/// 사용자 응답 DTO
///
/// 비밀번호 해시 등 민감한 필드를 제외한 공개 가능한 정보만 담습니다.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub status: String,
    pub created_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id_string().unwrap_or_default(),
            email: user.email,
            username: user.username,
            status: user.status.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}
