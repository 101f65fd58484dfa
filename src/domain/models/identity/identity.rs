//! 인증된 신원의 allow-list 투영
//!
//! 검증기가 반환하는 것은 전체 사용자 레코드가 아니라, 호출 서비스가
//! 선언한 필드 집합으로 좁혀진 투영입니다. 이 경계 덕분에 다운스트림
//! 서비스가 아이덴티티 서비스의 전체 스키마에 의존하는 일이 생기지 않습니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 요청 스코프의 인증 신원
///
/// 게이트웨이가 검증에 성공하면 요청 extension에 부착하는 값입니다.
/// 선언된 allow-list에 포함된 필드만 담기며, 단일 요청보다 오래
/// 캐시되어서는 안 됩니다 (즉각적인 세션 무효화를 존중하기 위함).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedIdentity {
    /// 선언된 필드만 포함하는 투영 결과
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AuthorizedIdentity {
    /// 빈 투영을 생성합니다.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// 투영된 필드 값을 조회합니다.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// 투영된 문자열 필드를 조회합니다.
    fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    /// 사용자 ID (투영에 포함된 경우)
    pub fn user_id(&self) -> Option<&str> {
        self.get_str("user_id")
    }

    /// 사용자 이름 (투영에 포함된 경우)
    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_serializes_flat() {
        let mut fields = Map::new();
        fields.insert("username".to_string(), json!("alice"));

        let identity = AuthorizedIdentity::new(fields);
        let json = serde_json::to_value(&identity).unwrap();

        // 중첩 없이 선언된 필드만 노출된다
        assert_eq!(json, json!({ "username": "alice" }));
    }

    #[test]
    fn test_typed_accessors() {
        let mut fields = Map::new();
        fields.insert("user_id".to_string(), json!("u-1"));
        fields.insert("username".to_string(), json!("alice"));

        let identity = AuthorizedIdentity::new(fields);

        assert_eq!(identity.user_id(), Some("u-1"));
        assert_eq!(identity.username(), Some("alice"));
        assert!(identity.get("email").is_none());
    }
}
