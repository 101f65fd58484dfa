//! # MongoDB 사용자 리포지토리
//!
//! 사용자 엔티티의 내구 저장소입니다. `users` 컬렉션을 사용하며
//! 이메일/사용자명에 유니크 인덱스를 유지합니다.
//!
//! ## 에러 처리
//!
//! - **DatabaseError**: MongoDB 연결/쿼리 오류
//! - **ValidationError**: 잘못된 ObjectId 형식
//! - **ConflictError**: 이메일/사용자명 중복 (사전 조회 또는 유니크
//!   인덱스 위반)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use singleton_macro::repository;

use crate::core::registry::Repository;
use crate::db::Database;
use crate::domain::entities::users::User;
use crate::errors::errors::AppError;
use crate::repositories::users::user_repository::UserStore;

/// 사용자 데이터 액세스 리포지토리
///
/// `UserStore` 계약의 MongoDB 구현체입니다. 아이덴티티 서비스의 조회
/// 경로에서는 캐싱을 두지 않습니다. 해석된 신원이 세션 회전/무효화보다
/// 오래 살아남으면 안 되기 때문입니다.
#[repository(name = "user", collection = "users")]
pub struct UserRepository {
    /// MongoDB 데이터베이스 연결 (자동 주입)
    db: Arc<Database>,
}

impl UserRepository {
    /// 유니크 인덱스를 생성합니다. 기동 시 한 번 호출됩니다.
    ///
    /// - `email` (unique)
    /// - `username` (unique)
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let collection = self.collection::<User>();

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        collection
            .create_index(email_index)
            .await
            .map_err(|e| AppError::DatabaseError(format!("email 인덱스 생성 실패: {}", e)))?;
        collection
            .create_index(username_index)
            .await
            .map_err(|e| AppError::DatabaseError(format!("username 인덱스 생성 실패: {}", e)))?;

        Ok(())
    }

    /// ObjectId 문자열을 파싱합니다.
    fn parse_object_id(user_id: &str) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(user_id)
            .map_err(|_| AppError::ValidationError(format!("잘못된 사용자 ID 형식: {}", user_id)))
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, mut user: User) -> Result<User, AppError> {
        let collection = self.collection::<User>();

        // 사전 중복 조회로 대부분의 충돌을 먼저 걸러낸다
        let existing = collection
            .find_one(doc! {
                "$or": [
                    { "email": &user.email },
                    { "username": &user.username },
                ]
            })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if existing.is_some() {
            return Err(AppError::ConflictError(
                "이미 사용 중인 이메일 또는 사용자명입니다".to_string(),
            ));
        }

        let result = collection.insert_one(&user).await.map_err(|e| {
            // 경쟁 삽입은 유니크 인덱스 위반(E11000)으로 잡힌다
            let message = e.to_string();
            if message.contains("E11000") {
                AppError::ConflictError(
                    "이미 사용 중인 이메일 또는 사용자명입니다".to_string(),
                )
            } else {
                AppError::DatabaseError(message)
            }
        })?;

        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let oid = Self::parse_object_id(user_id)?;

        self.collection::<User>()
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.collection::<User>()
            .find_one(doc! { "username": username })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn touch_last_login(&self, user_id: &str) -> Result<(), AppError> {
        let oid = Self::parse_object_id(user_id)?;
        let now = Utc::now().timestamp();

        self.collection::<User>()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "last_login_at": now, "updated_at": now } },
            )
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
