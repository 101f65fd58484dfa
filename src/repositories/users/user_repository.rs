//! # 사용자 저장소 인터페이스와 인메모리 구현
//!
//! 사용자 레코드 저장소의 계약(`UserStore`)과 테스트용 인메모리 구현을
//! 정의합니다. 내구 구현은
//! [`UserRepository`](super::mongo_user_repository::UserRepository)입니다.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::domain::entities::users::User;
use crate::errors::errors::AppError;

/// 사용자 저장소 계약
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 새 사용자를 생성합니다.
    ///
    /// 이메일 또는 사용자명이 중복되면 `ConflictError`를 반환합니다.
    async fn create(&self, user: User) -> Result<User, AppError>;

    /// ID로 사용자를 조회합니다.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// 사용자명으로 사용자를 조회합니다.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// 마지막 로그인 시각을 갱신합니다.
    async fn touch_last_login(&self, user_id: &str) -> Result<(), AppError>;
}

/// 인메모리 사용자 저장소 (단위 테스트용)
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 계정 상태를 변경합니다 (관리자 동결/해제 시나리오용).
    pub fn set_status(&self, user_id: &str, status: crate::domain::entities::users::UserStatus) {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(user_id) {
            user.status = status;
            user.updated_at = Utc::now().timestamp();
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, mut user: User) -> Result<User, AppError> {
        let mut users = self.users.write().unwrap();

        let duplicate = users
            .values()
            .any(|u| u.email == user.email || u.username == user.username);
        if duplicate {
            return Err(AppError::ConflictError(
                "이미 사용 중인 이메일 또는 사용자명입니다".to_string(),
            ));
        }

        let id = ObjectId::new();
        user.id = Some(id);
        users.insert(id.to_hex(), user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().unwrap();
        Ok(users.get(user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn touch_last_login(&self, user_id: &str) -> Result<(), AppError> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(user_id) {
            let now = Utc::now().timestamp();
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(email: &str, username: &str) -> User {
        User::new_local(email.to_string(), username.to_string(), "hash".to_string())
    }

    #[actix_web::test]
    async fn test_create_assigns_id() {
        let store = MemoryUserStore::new();

        let created = store
            .create(sample_user("alice@example.com", "alice"))
            .await
            .unwrap();

        assert!(created.id.is_some());
        let found = store
            .find_by_id(&created.id_string().unwrap())
            .await
            .unwrap();
        assert_eq!(found.unwrap().username, "alice");
    }

    #[actix_web::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::new();

        store
            .create(sample_user("alice@example.com", "alice"))
            .await
            .unwrap();
        let result = store
            .create(sample_user("alice@example.com", "alice2"))
            .await;

        assert!(matches!(result, Err(AppError::ConflictError(_))));
    }

    #[actix_web::test]
    async fn test_touch_last_login() {
        let store = MemoryUserStore::new();

        let created = store
            .create(sample_user("bob@example.com", "bob"))
            .await
            .unwrap();
        let id = created.id_string().unwrap();

        store.touch_last_login(&id).await.unwrap();

        let user = store.find_by_id(&id).await.unwrap().unwrap();
        assert!(user.last_login_at.is_some());
    }
}
