//! # 세션 저장소 인터페이스와 인메모리 구현
//!
//! 리프레시 세션 저장소의 계약(`SessionStore`)과, 외부 인프라 없이
//! 동일한 의미론을 제공하는 인메모리 구현(`MemorySessionStore`)을
//! 정의합니다.
//!
//! ## 저장소 계약의 핵심
//!
//! - **교체 의미론**: `upsert_session`은 같은 (사용자, 채널) 쌍의 기존
//!   세션을 원자적으로 교체합니다. 두 세션이 잠시라도 공존하는 구간은
//!   없습니다.
//! - **키-토큰 결합**: 조회는 `token_key`(리프레시 토큰의 다이제스트)로만
//!   수행되며, 저장소는 키와 토큰의 결합이 깨진 레코드를 반환하지 않습니다.
//! - **조건부 회전**: `rotate`는 기대하는 기존 키가 여전히 유효할 때만
//!   성공하는 compare-and-swap입니다. 동시에 회전을 시도한 패자는
//!   `NotFound`를 관측하게 되어, 같은 리프레시 토큰으로 토큰 쌍이 두 번
//!   발급되는 일이 없습니다.
//! - **지연 만료**: 조회 시점에 `updated_at + TTL`을 검사하여 만료된
//!   세션을 거부(및 제거)합니다.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::sessions::{LoginChannel, Session};
use crate::errors::errors::AppError;

/// 세션 저장소 연산의 실패 유형
///
/// `Conflict`는 저장소 내부의 동시 쓰기 감지이며, 호출 측에서 1회
/// 재시도됩니다. 클라이언트에게 그대로 노출되지 않습니다.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 해당 키/쌍의 세션이 존재하지 않음
    #[error("session not found")]
    NotFound,

    /// 동시 쓰기 충돌 감지 (호출 측에서 1회 재시도)
    #[error("concurrent write conflict: {0}")]
    Conflict(String),

    /// 저장소 백엔드 오류
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("세션을 찾을 수 없습니다".to_string()),
            StoreError::Conflict(msg) => AppError::ConflictError(msg),
            StoreError::Backend(msg) => AppError::RedisError(msg),
        }
    }
}

/// 리프레시 세션 저장소 계약
///
/// 서비스 계층은 이 trait에만 의존합니다. 내구 구현은
/// [`SessionRepository`](super::redis_session_repository::SessionRepository)
/// (Redis), 테스트 구현은 [`MemorySessionStore`]입니다.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// (user_id, channel) 쌍의 세션을 원자적으로 교체 생성합니다.
    ///
    /// 기존 세션이 있으면 그 키 색인과 함께 제거된 뒤 새 세션이
    /// 기록됩니다 (last-writer-wins).
    async fn upsert_session(
        &self,
        user_id: &str,
        channel: LoginChannel,
        app_id: &str,
        refresh_token: &str,
    ) -> Result<Session, StoreError>;

    /// 토큰 키로 세션을 조회합니다.
    ///
    /// 만료되었거나 키-토큰 결합이 깨진 세션은 `NotFound`로 처리됩니다.
    async fn find_by_key(&self, token_key: &str) -> Result<Session, StoreError>;

    /// 기존 키를 조건으로 세션의 비밀 자료를 회전합니다 (CAS).
    ///
    /// `expected_key`가 더 이상 현재 키가 아니면 `NotFound`를 반환합니다.
    /// 성공 시 기존 키는 즉시 무효화되고 새 키가 색인됩니다.
    async fn rotate(
        &self,
        expected_key: &str,
        new_refresh_token: &str,
    ) -> Result<Session, StoreError>;

    /// (user_id, channel) 쌍의 세션을 삭제합니다. 멱등 연산입니다.
    async fn invalidate(&self, user_id: &str, channel: LoginChannel) -> Result<(), StoreError>;
}

/// 인메모리 세션 저장소
///
/// 단위 테스트와 단일 프로세스 실행을 위한 구현입니다. 쌍 기준 맵과
/// 키 색인 맵을 하나의 락 아래에서 함께 갱신하므로 모든 연산이
/// 선형화됩니다.
pub struct MemorySessionStore {
    /// 리프레시 세션 수명 (초)
    refresh_ttl_seconds: i64,
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    /// (user_id, channel) → 세션
    by_pair: HashMap<(String, LoginChannel), Session>,
    /// token_key → (user_id, channel)
    by_key: HashMap<String, (String, LoginChannel)>,
}

impl MemorySessionStore {
    pub fn new(refresh_ttl_seconds: i64) -> Self {
        Self {
            refresh_ttl_seconds,
            inner: RwLock::new(MemoryInner::default()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn upsert_session(
        &self,
        user_id: &str,
        channel: LoginChannel,
        app_id: &str,
        refresh_token: &str,
    ) -> Result<Session, StoreError> {
        let mut inner = self.inner.write().unwrap();
        let pair = (user_id.to_string(), channel);

        // 기존 세션의 키 색인을 먼저 제거하여 교체를 원자적으로 완결한다
        if let Some(old) = inner.by_pair.remove(&pair) {
            inner.by_key.remove(&old.token_key);
        }

        let session = Session::new(user_id, channel, app_id, refresh_token);
        inner
            .by_key
            .insert(session.token_key.clone(), pair.clone());
        inner.by_pair.insert(pair, session.clone());

        Ok(session)
    }

    async fn find_by_key(&self, token_key: &str) -> Result<Session, StoreError> {
        let mut inner = self.inner.write().unwrap();

        let pair = inner.by_key.get(token_key).cloned().ok_or(StoreError::NotFound)?;
        let session = inner
            .by_pair
            .get(&pair)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        // 키-토큰 결합이 깨진 색인 잔재는 정리하고 없는 것으로 취급한다
        if session.token_key != token_key {
            inner.by_key.remove(token_key);
            return Err(StoreError::NotFound);
        }

        // 지연 만료: 수명이 지난 세션은 제거 후 거부
        if session.is_expired(self.refresh_ttl_seconds) {
            inner.by_pair.remove(&pair);
            inner.by_key.remove(token_key);
            return Err(StoreError::NotFound);
        }

        Ok(session)
    }

    async fn rotate(
        &self,
        expected_key: &str,
        new_refresh_token: &str,
    ) -> Result<Session, StoreError> {
        let mut inner = self.inner.write().unwrap();

        let pair = inner
            .by_key
            .get(expected_key)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        let current = inner
            .by_pair
            .get(&pair)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        // CAS 조건: 기대한 키가 여전히 현재 키여야 한다
        if current.token_key != expected_key {
            inner.by_key.remove(expected_key);
            return Err(StoreError::NotFound);
        }

        if current.is_expired(self.refresh_ttl_seconds) {
            inner.by_pair.remove(&pair);
            inner.by_key.remove(expected_key);
            return Err(StoreError::NotFound);
        }

        let rotated = current.rotated(new_refresh_token);
        inner.by_key.remove(expected_key);
        inner
            .by_key
            .insert(rotated.token_key.clone(), pair.clone());
        inner.by_pair.insert(pair, rotated.clone());

        Ok(rotated)
    }

    async fn invalidate(&self, user_id: &str, channel: LoginChannel) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap();
        let pair = (user_id.to_string(), channel);

        if let Some(session) = inner.by_pair.remove(&pair) {
            inner.by_key.remove(&session.token_key);
        }

        Ok(())
    }
}
