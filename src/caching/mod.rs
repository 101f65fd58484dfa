//! 캐시/세션 저장소 클라이언트 모듈
//!
//! Redis 연결 관리를 담당합니다. 유저센터에서는 리프레시 세션 저장소의
//! 백엔드로 사용됩니다.

pub mod redis;
