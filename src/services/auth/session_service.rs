//! 세션 수명주기 서비스
//!
//! 로그인(세션 교체 발급), 리프레시 토큰 교환(회전), 로그아웃(무효화)을
//! 오케스트레이션합니다.
//!
//! ## 단일 사용 강제
//!
//! 리프레시 토큰은 성공적인 회전에 한 번 소모되면 다시는 유효하지 않습니다.
//! 회전은 기존 token_key를 조건으로 하는 저장소의 compare-and-swap으로
//! 수행되므로, 새 키가 기록되는 순간 기존 키는 사라집니다. 같은 토큰으로
//! 동시에 들어온 두 회전 요청 중 하나만 성공하며, 패자는 더 이상 존재하지
//! 않는 키를 관측하여 `UnknownToken`으로 거부됩니다. 토큰 쌍이 조용히
//! 두 번 발급되는 일은 없습니다.

use std::sync::Arc;

use crate::domain::entities::sessions::{LoginChannel, Session};
use crate::domain::entities::users::User;
use crate::domain::models::token::TokenPair;
use crate::errors::errors::AppError;
use crate::repositories::sessions::session_repository::{SessionStore, StoreError};
use crate::repositories::users::user_repository::UserStore;
use crate::services::auth::codec_service::CodecService;

/// 세션 수명주기 서비스
///
/// 저장소 구현이 아닌 trait 경계(`SessionStore`, `UserStore`)에만
/// 의존합니다. 기동 시 조립되어 `ServiceLocator`에 수동 등록됩니다.
pub struct SessionService {
    codec: Arc<CodecService>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
}

impl SessionService {
    pub fn new(
        codec: Arc<CodecService>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            codec,
            sessions,
            users,
        }
    }

    /// 로그인: 자격 증명 검증 후 채널당 단일 세션으로 토큰 쌍을 발급합니다.
    ///
    /// 같은 (사용자, 채널) 쌍의 기존 세션은 추가되지 않고 **교체**됩니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError` - 존재하지 않는 사용자, 비밀번호
    ///   불일치, 유효하지 않은 계정 상태
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        channel: LoginChannel,
        app_id: &str,
    ) -> Result<TokenPair, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::AuthenticationError("사용자명 또는 비밀번호가 올바르지 않습니다".to_string())
            })?;

        if !user.is_active() {
            log::warn!(
                "유효하지 않은 계정 상태의 로그인 시도 - username: {}, status: {}",
                username,
                user.status.as_str()
            );
            return Err(AppError::AuthenticationError(
                "사용할 수 없는 계정입니다".to_string(),
            ));
        }

        let matched = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("비밀번호 검증 실패: {}", e)))?;
        if !matched {
            return Err(AppError::AuthenticationError(
                "사용자명 또는 비밀번호가 올바르지 않습니다".to_string(),
            ));
        }

        let user_id = user
            .id_string()
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        let pair = self.codec.mint(&user, channel, app_id)?;
        self.upsert_with_retry(&user_id, channel, app_id, &pair.refresh_token)
            .await?;
        self.users.touch_last_login(&user_id).await?;

        log::info!(
            "로그인 성공 - user_id: {}, channel: {}, app_id: {}",
            user_id,
            channel.as_str(),
            app_id
        );

        Ok(pair)
    }

    /// 리프레시 토큰 교환: 제시된 토큰을 소모하고 새 토큰 쌍을 발급합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::UnknownToken` - 저장된 키와 일치하지 않는 토큰
    ///   (이미 소모됨, 위조됨, 만료됨, 발급된 적 없음)
    /// * `AppError::AuthenticationError` - 사용자가 더 이상 유효하지 않음.
    ///   이 경우 해당 세션도 즉시 무효화됩니다
    pub async fn refresh(&self, presented_refresh_token: &str) -> Result<TokenPair, AppError> {
        let token_key = self.codec.derive_key(presented_refresh_token);

        let session = match self.sessions.find_by_key(&token_key).await {
            Ok(session) => session,
            Err(StoreError::NotFound) => {
                // 반복되는 미등록 키 시도는 리플레이/공격 신호다
                log::warn!("알 수 없는 리프레시 토큰 키 제시됨 - key: {}...", &token_key[..12]);
                return Err(AppError::UnknownToken);
            }
            Err(e) => return Err(e.into()),
        };

        let user = self.resolve_active_user(&session).await?;

        let pair = self
            .codec
            .mint(&user, session.login_channel, &session.app_id)?;

        match self.sessions.rotate(&token_key, &pair.refresh_token).await {
            Ok(_) => {
                log::debug!(
                    "토큰 회전 성공 - user_id: {}, channel: {}",
                    session.user_id,
                    session.login_channel.as_str()
                );
                Ok(pair)
            }
            Err(StoreError::NotFound) => {
                // 동시 회전 경쟁의 패자. 키는 이미 교체되었다
                log::warn!(
                    "동시 회전 경쟁에서 무효화된 키 제시됨 - key: {}...",
                    &token_key[..12]
                );
                Err(AppError::UnknownToken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 로그아웃: (사용자, 채널) 쌍의 세션을 삭제합니다. 멱등 연산입니다.
    pub async fn logout(&self, user_id: &str, channel: LoginChannel) -> Result<(), AppError> {
        self.sessions.invalidate(user_id, channel).await?;
        log::info!(
            "로그아웃 완료 - user_id: {}, channel: {}",
            user_id,
            channel.as_str()
        );
        Ok(())
    }

    /// 세션의 사용자를 조회하고 유효한 계정인지 확인합니다.
    ///
    /// 동결되었거나 삭제된 사용자의 세션은 회전 시점에 즉시 무효화됩니다.
    async fn resolve_active_user(&self, session: &Session) -> Result<User, AppError> {
        let user = self.users.find_by_id(&session.user_id).await?;

        match user {
            Some(user) if user.is_active() => Ok(user),
            _ => {
                log::warn!(
                    "유효하지 않은 사용자의 세션 회전 시도 - user_id: {}. 세션을 무효화합니다",
                    session.user_id
                );
                self.sessions
                    .invalidate(&session.user_id, session.login_channel)
                    .await?;
                Err(AppError::AuthenticationError(
                    "사용할 수 없는 계정입니다".to_string(),
                ))
            }
        }
    }

    /// 저장소의 동시 쓰기 충돌(Conflict)을 내부에서 1회 재시도합니다.
    ///
    /// 재시도 후에도 실패하면 에러를 그대로 전파합니다. 클라이언트에게
    /// Conflict가 노출되는 일은 없습니다.
    async fn upsert_with_retry(
        &self,
        user_id: &str,
        channel: LoginChannel,
        app_id: &str,
        refresh_token: &str,
    ) -> Result<Session, AppError> {
        match self
            .sessions
            .upsert_session(user_id, channel, app_id, refresh_token)
            .await
        {
            Err(StoreError::Conflict(msg)) => {
                log::warn!("세션 교체 충돌 감지, 재시도 - user_id: {}, {}", user_id, msg);
                self.sessions
                    .upsert_session(user_id, channel, app_id, refresh_token)
                    .await
                    .map_err(AppError::from)
            }
            other => other.map_err(AppError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures_util::join;

    use crate::config::Settings;
    use crate::domain::models::token::derive_token_key;
    use crate::domain::entities::users::UserStatus;
    use crate::repositories::sessions::session_repository::MemorySessionStore;
    use crate::repositories::users::user_repository::MemoryUserStore;

    /// 비밀번호 해시는 테스트 속도를 위해 최저 비용으로 생성한다
    const TEST_BCRYPT_COST: u32 = 4;

    struct Fixture {
        service: SessionService,
        sessions: Arc<MemorySessionStore>,
        users: Arc<MemoryUserStore>,
    }

    async fn fixture_with_ttl(ttl_seconds: i64) -> Fixture {
        let settings = Arc::new(Settings::for_tests());
        let codec = Arc::new(CodecService::new(settings));
        let sessions = Arc::new(MemorySessionStore::new(ttl_seconds));
        let users = Arc::new(MemoryUserStore::new());

        let service = SessionService::new(
            codec,
            sessions.clone() as Arc<dyn SessionStore>,
            users.clone() as Arc<dyn UserStore>,
        );

        Fixture {
            service,
            sessions,
            users,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_ttl(3600).await
    }

    async fn register_user(users: &MemoryUserStore, username: &str, password: &str) -> User {
        let hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        users
            .create(User::new_local(
                format!("{}@example.com", username),
                username.to_string(),
                hash,
            ))
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn test_login_issues_pair_and_session() {
        let f = fixture().await;
        register_user(&f.users, "alice", "Password1").await;

        let pair = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        let session = f
            .sessions
            .find_by_key(&derive_token_key(&pair.refresh_token))
            .await
            .unwrap();
        assert_eq!(session.login_channel, LoginChannel::Web);
        assert_eq!(session.app_id, "app-1");
    }

    #[actix_web::test]
    async fn test_login_rejects_wrong_password() {
        let f = fixture().await;
        register_user(&f.users, "alice", "Password1").await;

        let result = f
            .service
            .login("alice", "WrongPassword1", LoginChannel::Web, "app-1")
            .await;

        assert!(matches!(result, Err(AppError::AuthenticationError(_))));
    }

    #[actix_web::test]
    async fn test_login_rejects_frozen_account() {
        let f = fixture().await;
        let hash = bcrypt::hash("Password1", TEST_BCRYPT_COST).unwrap();
        let mut user = User::new_local(
            "frozen@example.com".to_string(),
            "frozen".to_string(),
            hash,
        );
        user.status = UserStatus::Frozen;
        f.users.create(user).await.unwrap();

        let result = f
            .service
            .login("frozen", "Password1", LoginChannel::Web, "app-1")
            .await;

        assert!(matches!(result, Err(AppError::AuthenticationError(_))));
    }

    #[actix_web::test]
    async fn test_relogin_replaces_session() {
        let f = fixture().await;
        register_user(&f.users, "alice", "Password1").await;

        let first = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();
        let second = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        let k1 = derive_token_key(&first.refresh_token);
        let k2 = derive_token_key(&second.refresh_token);
        assert_ne!(k1, k2);

        // 첫 번째 세션의 키는 교체 즉시 조회 불가
        assert!(matches!(
            f.sessions.find_by_key(&k1).await,
            Err(StoreError::NotFound)
        ));
        assert!(f.sessions.find_by_key(&k2).await.is_ok());
    }

    #[actix_web::test]
    async fn test_refresh_is_single_use() {
        let f = fixture().await;
        register_user(&f.users, "alice", "Password1").await;

        let pair = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        let rotated = f.service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        // 소모된 토큰의 재사용은 UnknownToken
        assert!(matches!(
            f.service.refresh(&pair.refresh_token).await,
            Err(AppError::UnknownToken)
        ));

        // 새 토큰은 정상 회전
        assert!(f.service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[actix_web::test]
    async fn test_concurrent_refresh_single_winner() {
        let f = fixture().await;
        register_user(&f.users, "alice", "Password1").await;

        let pair = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        // 같은 리프레시 토큰으로 동시 회전: 정확히 하나만 성공해야 한다
        let (a, b) = join!(
            f.service.refresh(&pair.refresh_token),
            f.service.refresh(&pair.refresh_token)
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(AppError::UnknownToken)));
    }

    #[actix_web::test]
    async fn test_refresh_unknown_token_rejected() {
        let f = fixture().await;

        let result = f.service.refresh("never-issued-token").await;
        assert!(matches!(result, Err(AppError::UnknownToken)));
    }

    #[actix_web::test]
    async fn test_refresh_expired_session_rejected() {
        // TTL 0 → 발급 즉시 만료
        let f = fixture_with_ttl(0).await;
        register_user(&f.users, "alice", "Password1").await;

        let pair = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        assert!(matches!(
            f.service.refresh(&pair.refresh_token).await,
            Err(AppError::UnknownToken)
        ));
    }

    #[actix_web::test]
    async fn test_frozen_user_refresh_invalidates_session() {
        let f = fixture().await;
        let created = register_user(&f.users, "alice", "Password1").await;

        let pair = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        // 로그인 이후 계정이 동결된다
        f.users
            .set_status(&created.id_string().unwrap(), UserStatus::Frozen);

        let result = f.service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AppError::AuthenticationError(_))));

        // 세션도 즉시 무효화되어, 이후 시도는 UnknownToken
        assert!(matches!(
            f.service.refresh(&pair.refresh_token).await,
            Err(AppError::UnknownToken)
        ));
    }

    #[actix_web::test]
    async fn test_logout_is_idempotent_and_blocks_refresh() {
        let f = fixture().await;
        let created = register_user(&f.users, "alice", "Password1").await;
        let user_id = created.id_string().unwrap();

        let pair = f
            .service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await
            .unwrap();

        f.service.logout(&user_id, LoginChannel::Web).await.unwrap();
        f.service.logout(&user_id, LoginChannel::Web).await.unwrap();

        assert!(matches!(
            f.service.refresh(&pair.refresh_token).await,
            Err(AppError::UnknownToken)
        ));
    }

    /// 첫 upsert가 Conflict로 실패하는 저장소 스텁
    struct ConflictOnceStore {
        inner: MemorySessionStore,
        failures_remaining: AtomicUsize,
    }

    impl ConflictOnceStore {
        fn new(failures: usize) -> Self {
            Self {
                inner: MemorySessionStore::new(3600),
                failures_remaining: AtomicUsize::new(failures),
            }
        }
    }

    #[async_trait]
    impl SessionStore for ConflictOnceStore {
        async fn upsert_session(
            &self,
            user_id: &str,
            channel: LoginChannel,
            app_id: &str,
            refresh_token: &str,
        ) -> Result<Session, StoreError> {
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict("interleaved upsert".to_string()));
            }
            self.inner
                .upsert_session(user_id, channel, app_id, refresh_token)
                .await
        }

        async fn find_by_key(&self, token_key: &str) -> Result<Session, StoreError> {
            self.inner.find_by_key(token_key).await
        }

        async fn rotate(
            &self,
            expected_key: &str,
            new_refresh_token: &str,
        ) -> Result<Session, StoreError> {
            self.inner.rotate(expected_key, new_refresh_token).await
        }

        async fn invalidate(&self, user_id: &str, channel: LoginChannel) -> Result<(), StoreError> {
            self.inner.invalidate(user_id, channel).await
        }
    }

    #[actix_web::test]
    async fn test_store_conflict_retried_once() {
        let users = Arc::new(MemoryUserStore::new());
        register_user(&users, "alice", "Password1").await;

        let service = SessionService::new(
            Arc::new(CodecService::new(Arc::new(Settings::for_tests()))),
            Arc::new(ConflictOnceStore::new(1)),
            users.clone() as Arc<dyn UserStore>,
        );

        // 1회 충돌은 내부 재시도로 흡수된다
        let result = service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await;
        assert!(result.is_ok());
    }

    #[actix_web::test]
    async fn test_persistent_conflict_surfaces() {
        let users = Arc::new(MemoryUserStore::new());
        register_user(&users, "alice", "Password1").await;

        let service = SessionService::new(
            Arc::new(CodecService::new(Arc::new(Settings::for_tests()))),
            Arc::new(ConflictOnceStore::new(2)),
            users.clone() as Arc<dyn UserStore>,
        );

        // 재시도 이후에도 충돌이면 에러가 전파된다
        let result = service
            .login("alice", "Password1", LoginChannel::Web, "app-1")
            .await;
        assert!(matches!(result, Err(AppError::ConflictError(_))));
    }
}
