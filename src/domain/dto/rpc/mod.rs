//! 서비스 간 검증 호출의 와이어 계약
//!
//! 보호된 서비스의 게이트웨이가 아이덴티티 서비스의 검증기를 호출할 때
//! 사용하는 요청/응답 형태입니다. 전송 계층(HTTP 등)과 무관하게 이 형태가
//! 안정적인 계약이며, 검증 실패는 전송 오류가 아닌 구조화된 응답
//! (`ok: false`)으로 전달됩니다. 덕분에 호출자는 "인증 실패"와
//! "서비스 도달 불가"를 구분할 수 있습니다.

use serde::{Deserialize, Serialize};

use crate::domain::models::identity::AuthorizedIdentity;

/// 검증 실패 사유 문자열
pub const REASON_UNAUTHENTICATED: &str = "unauthenticated";

/// 검증 요청 페이로드
///
/// `fields`는 호출 서비스가 기동 시점에 선언한 응답 필드 allow-list입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// 검증할 자격 증명 (Bearer 접두사 제외)
    pub credential: String,
    /// 호출자가 선언한 응답 필드 allow-list
    pub fields: Vec<String>,
}

/// 검증 응답 페이로드
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// 검증 성공 여부
    pub ok: bool,
    /// 성공 시: 선언된 필드로만 투영된 신원
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<AuthorizedIdentity>,
    /// 실패 시: 구조화된 사유
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidateResponse {
    /// 검증 성공 응답을 생성합니다.
    pub fn authorized(identity: AuthorizedIdentity) -> Self {
        Self {
            ok: true,
            identity: Some(identity),
            reason: None,
        }
    }

    /// 검증 실패 응답을 생성합니다.
    pub fn unauthenticated() -> Self {
        Self {
            ok: false,
            identity: None,
            reason: Some(REASON_UNAUTHENTICATED.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unauthenticated_wire_shape() {
        let response = ValidateResponse::unauthenticated();
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value, json!({ "ok": false, "reason": "unauthenticated" }));
    }

    #[test]
    fn test_authorized_wire_shape() {
        let mut fields = serde_json::Map::new();
        fields.insert("username".to_string(), json!("alice"));

        let response = ValidateResponse::authorized(AuthorizedIdentity::new(fields));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value,
            json!({ "ok": true, "identity": { "username": "alice" } })
        );
    }
}
