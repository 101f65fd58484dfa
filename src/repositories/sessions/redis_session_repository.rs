//! # Redis 세션 리포지토리
//!
//! 리프레시 세션의 내구 저장소입니다. Redis를 백엔드로 다음을 제공합니다:
//!
//! - (사용자, 채널) 쌍 기준 세션 레코드와 token_key 색인의 이중 키 구조
//! - Lua 스크립트 단일 실행으로 보장되는 교체/회전/삭제의 원자성
//!   (Redis는 스크립트 하나를 직렬로 실행하므로 별도의 행 잠금이 필요 없음)
//! - 리프레시 수명과 동일한 키 TTL (만료 세션의 자동 정리)
//!
//! ## 키 구조
//!
//! ```text
//! uc:session:{user_id}:{channel}   → 세션 JSON
//! uc:session_key:{token_key}       → 세션 키 이름 (색인)
//! ```
//!
//! 색인이 가리키는 세션의 `token_key`가 색인 키와 일치하는지 조회 시마다
//! 재검증합니다. 경쟁에서 밀려난 쓰기가 남긴 색인 잔재는 이 검증에서
//! NotFound로 읽히고, TTL로 자연 소멸합니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use redis::Script;
use singleton_macro::repository;

use crate::caching::redis::RedisClient;
use crate::config::Settings;
use crate::core::registry::Repository;
use crate::domain::entities::sessions::{LoginChannel, Session};
use crate::domain::models::token::derive_token_key;
use crate::repositories::sessions::session_repository::{SessionStore, StoreError};

/// 세션 교체 스크립트
///
/// 기존 세션의 색인 제거 + 새 세션 기록 + 새 색인 기록을 한 번에 수행한다.
/// KEYS[1] = 세션 키, KEYS[2] = 새 색인 키
/// ARGV[1] = 세션 JSON, ARGV[2] = TTL(초)
static UPSERT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local old = redis.call('GET', KEYS[1])
if old then
  local ok, doc = pcall(cjson.decode, old)
  if ok and doc['token_key'] then
    redis.call('DEL', 'uc:session_key:' .. doc['token_key'])
  end
end
redis.call('SET', KEYS[1], ARGV[1], 'EX', tonumber(ARGV[2]))
redis.call('SET', KEYS[2], KEYS[1], 'EX', tonumber(ARGV[2]))
return 1
"#,
    )
});

/// 세션 회전 스크립트 (compare-and-swap)
///
/// 기대한 기존 키가 현재 키일 때만 비밀 자료를 교체한다. 실패 시 nil.
/// KEYS[1] = 기존 색인 키
/// ARGV[1] = 기대하는 기존 token_key, ARGV[2] = 새 refresh_token,
/// ARGV[3] = 새 token_key, ARGV[4] = 회전 시각, ARGV[5] = TTL(초)
static ROTATE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local session_key = redis.call('GET', KEYS[1])
if not session_key then return false end
local raw = redis.call('GET', session_key)
if not raw then
  redis.call('DEL', KEYS[1])
  return false
end
local doc = cjson.decode(raw)
if doc['token_key'] ~= ARGV[1] then
  redis.call('DEL', KEYS[1])
  return false
end
doc['refresh_token'] = ARGV[2]
doc['token_key'] = ARGV[3]
doc['updated_at'] = tonumber(ARGV[4])
local encoded = cjson.encode(doc)
redis.call('SET', session_key, encoded, 'EX', tonumber(ARGV[5]))
redis.call('DEL', KEYS[1])
redis.call('SET', 'uc:session_key:' .. ARGV[3], session_key, 'EX', tonumber(ARGV[5]))
return encoded
"#,
    )
});

/// 세션 삭제 스크립트 (멱등)
///
/// KEYS[1] = 세션 키
static INVALIDATE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local raw = redis.call('GET', KEYS[1])
if raw then
  local ok, doc = pcall(cjson.decode, raw)
  if ok and doc['token_key'] then
    redis.call('DEL', 'uc:session_key:' .. doc['token_key'])
  end
  redis.call('DEL', KEYS[1])
end
return 1
"#,
    )
});

/// Redis 기반 리프레시 세션 리포지토리
///
/// `SessionStore` 계약의 내구 구현체입니다.
#[repository(name = "session", collection = "sessions")]
pub struct SessionRepository {
    redis: Arc<RedisClient>,
    settings: Arc<Settings>,
}

impl SessionRepository {
    /// (user_id, channel) 쌍의 세션 키 이름
    fn session_key(user_id: &str, channel: LoginChannel) -> String {
        format!("uc:session:{}:{}", user_id, channel.as_str())
    }

    /// token_key의 색인 키 이름
    fn index_key(token_key: &str) -> String {
        format!("uc:session_key:{}", token_key)
    }

    fn refresh_ttl_seconds(&self) -> i64 {
        self.settings.token.refresh_ttl_seconds()
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn upsert_session(
        &self,
        user_id: &str,
        channel: LoginChannel,
        app_id: &str,
        refresh_token: &str,
    ) -> Result<Session, StoreError> {
        let session = Session::new(user_id, channel, app_id, refresh_token);
        let payload =
            serde_json::to_string(&session).map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut conn = self
            .redis
            .connection()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let _: i64 = UPSERT_SCRIPT
            .key(Self::session_key(user_id, channel))
            .key(Self::index_key(&session.token_key))
            .arg(payload)
            .arg(self.refresh_ttl_seconds())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        log::debug!(
            "세션 교체 완료 - user_id: {}, channel: {}, key: {}...",
            user_id,
            channel.as_str(),
            &session.token_key[..8]
        );

        Ok(session)
    }

    async fn find_by_key(&self, token_key: &str) -> Result<Session, StoreError> {
        let session_key = self
            .redis
            .get_string(&Self::index_key(token_key))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or(StoreError::NotFound)?;

        let raw = self
            .redis
            .get_string(&session_key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or(StoreError::NotFound)?;

        let session: Session =
            serde_json::from_str(&raw).map_err(|e| StoreError::Backend(e.to_string()))?;

        // 경쟁에서 밀린 쓰기가 남긴 색인 잔재 방어
        if session.token_key != token_key {
            return Err(StoreError::NotFound);
        }

        // TTL이 대부분 처리하지만 경계 시점은 지연 만료 검사로 보강한다
        if session.is_expired(self.refresh_ttl_seconds()) {
            let _ = self.invalidate(&session.user_id, session.login_channel).await;
            return Err(StoreError::NotFound);
        }

        Ok(session)
    }

    async fn rotate(
        &self,
        expected_key: &str,
        new_refresh_token: &str,
    ) -> Result<Session, StoreError> {
        let new_key = derive_token_key(new_refresh_token);

        let mut conn = self
            .redis
            .connection()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rotated: Option<String> = ROTATE_SCRIPT
            .key(Self::index_key(expected_key))
            .arg(expected_key)
            .arg(new_refresh_token)
            .arg(&new_key)
            .arg(Utc::now().timestamp())
            .arg(self.refresh_ttl_seconds())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let raw = rotated.ok_or(StoreError::NotFound)?;
        let session: Session =
            serde_json::from_str(&raw).map_err(|e| StoreError::Backend(e.to_string()))?;

        log::debug!(
            "세션 회전 완료 - user_id: {}, old: {}..., new: {}...",
            session.user_id,
            &expected_key[..8],
            &session.token_key[..8]
        );

        Ok(session)
    }

    async fn invalidate(&self, user_id: &str, channel: LoginChannel) -> Result<(), StoreError> {
        let mut conn = self
            .redis
            .connection()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let _: i64 = INVALIDATE_SCRIPT
            .key(Self::session_key(user_id, channel))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }
}
