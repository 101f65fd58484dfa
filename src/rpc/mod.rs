//! 서비스 간 인증 호출 모듈
//!
//! 보호된 서비스에서 아이덴티티 서비스의 검증기에 도달하기 위한
//! 위치 투명(location-transparent) 호출 계층입니다.
//!
//! - [`transport`] - 호출 전송 계층 (HTTP / 프로세스 내 직접 디스패치)
//! - [`client`] - 게이트웨이용 클라이언트: 패턴과 필드 allow-list를
//!   기동 시점에 고정하고, 기한이 있는 검증 호출을 수행

pub mod client;
pub mod transport;

pub use client::*;
pub use transport::*;
