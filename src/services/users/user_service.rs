//! 사용자 계정 서비스
//!
//! 회원가입과 프로필 조회를 담당합니다. 비밀번호는 bcrypt 해시로만
//! 저장되며, 원문은 이 서비스 경계를 넘어 보존되지 않습니다.

use std::sync::Arc;

use crate::domain::dto::users::CreateUserRequest;
use crate::domain::entities::users::User;
use crate::errors::errors::AppError;
use crate::repositories::users::user_repository::UserStore;

/// 사용자 계정 서비스
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// 새 사용자 계정을 생성합니다.
    ///
    /// 요청 DTO의 형식 검증은 핸들러에서 이미 수행된 상태이며, 여기서는
    /// 비밀번호 해싱과 유니크 제약을 처리합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ConflictError` - 이메일/사용자명 중복
    /// * `AppError::InternalError` - 해싱 실패
    pub async fn register(&self, request: CreateUserRequest) -> Result<User, AppError> {
        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::InternalError(format!("비밀번호 해싱 실패: {}", e)))?;

        let user = User::new_local(request.email, request.username, password_hash);
        let created = self.users.create(user).await?;

        log::info!(
            "사용자 생성 완료 - user_id: {}, username: {}",
            created.id_string().unwrap_or_default(),
            created.username
        );

        Ok(created)
    }

    /// ID로 사용자를 조회합니다.
    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("사용자를 찾을 수 없습니다: {}", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::users::user_repository::MemoryUserStore;

    fn request(email: &str, username: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "Password1".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_register_hashes_password() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));

        let created = service
            .register(request("alice@example.com", "alice"))
            .await
            .unwrap();

        // 원문이 그대로 저장되지 않는다
        assert_ne!(created.password_hash, "Password1");
        assert!(bcrypt::verify("Password1", &created.password_hash).unwrap());
    }

    #[actix_web::test]
    async fn test_register_duplicate_rejected() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));

        service
            .register(request("alice@example.com", "alice"))
            .await
            .unwrap();
        let result = service.register(request("alice@example.com", "alice2")).await;

        assert!(matches!(result, Err(AppError::ConflictError(_))));
    }

    #[actix_web::test]
    async fn test_get_user_not_found() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));

        let result = service
            .get_user(&mongodb::bson::oid::ObjectId::new().to_hex())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
