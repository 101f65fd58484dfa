//! # 애플리케이션 설정 스냅샷
//!
//! 토큰 서명, 세션 수명, 원격 인증 게이트웨이, 아이덴티티 검증기 설정을
//! 기동 시점에 환경 변수로부터 한 번 읽어 불변 구조체로 고정합니다.
//!
//! ## 필수 환경 변수 설정
//!
//! ### 토큰 설정
//! ```bash
//! export JWT_SECRET="your-super-secret-256-bit-key"
//! export ACCESS_TOKEN_TTL_MINUTES="15"
//! export REFRESH_TOKEN_TTL_DAYS="30"
//! ```
//!
//! ### 게이트웨이 설정
//! ```bash
//! # 비워두면 같은 프로세스의 검증기로 직접 디스패치합니다 (아이덴티티 서비스 자신)
//! export AUTH_RPC_ENDPOINT="http://user-center:8080"
//! export AUTH_RPC_PATTERN="User.login"
//! export AUTH_RPC_FIELDS="user_id,username"
//! export AUTH_RPC_TIMEOUT_MS="3000"
//! ```
//!
//! ### 검증기 설정
//! ```bash
//! # 검증기가 호출자에게 내어줄 수 있는 필드의 상한 (서버측 능력 등록)
//! export VALIDATOR_ALLOWED_FIELDS="user_id,username,email"
//! ```

use std::env;

/// 액세스/리프레시 토큰 발급 설정
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// HS256 서명 비밀키
    pub secret: String,
    /// 액세스 토큰 수명 (분)
    pub access_ttl_minutes: i64,
    /// 리프레시 토큰 수명 (일)
    pub refresh_ttl_days: i64,
}

impl TokenSettings {
    /// 리프레시 토큰 수명을 초 단위로 반환합니다.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_days * 24 * 3600
    }
}

/// 세션 저장소 설정
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// 로그인 요청이 app_id를 생략했을 때 적용되는 기본 애플리케이션 식별자
    pub default_app_id: String,
}

/// 원격 인증 게이트웨이 설정
///
/// `{pattern, fields}` 쌍은 기동 시점에 고정되며 요청마다 재협상되지 않습니다.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// 아이덴티티 서비스의 원격 호출 패턴 이름
    pub pattern: String,
    /// 이 서비스가 선언한 응답 필드 allow-list
    pub fields: Vec<String>,
    /// 아이덴티티 서비스 엔드포인트. None이면 프로세스 내 검증기로 직접 호출
    pub endpoint: Option<String>,
    /// 원격 검증 호출의 응답 기한 (밀리초)
    pub timeout_ms: u64,
}

/// 아이덴티티 검증기 설정
#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    /// 호출자가 무엇을 요청하든 이 집합을 벗어난 필드는 절대 반환되지 않습니다
    pub allowed_fields: Vec<String>,
}

/// 프로세스 전역 불변 설정 스냅샷
///
/// 기동 시 `from_env()`로 한 번 조립되어 `ServiceLocator`에 등록되고,
/// 각 컴포넌트의 생성자로 전달됩니다. 이후 환경 변수를 다시 읽는
/// 컴포넌트는 없습니다.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: TokenSettings,
    pub session: SessionSettings,
    pub gateway: GatewaySettings,
    pub validator: ValidatorSettings,
}

impl Settings {
    /// 환경 변수에서 설정 스냅샷을 조립합니다.
    ///
    /// 누락된 값에는 개발용 기본값이 적용됩니다. 서명 비밀키가 기본값으로
    /// 채워지는 경우 프로덕션에서 사용하면 안 된다는 경고를 출력합니다.
    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using default (not secure for production!)");
            "your-secret-key".to_string()
        });

        let access_ttl_minutes = parse_env("ACCESS_TOKEN_TTL_MINUTES", 15);
        let refresh_ttl_days = parse_env("REFRESH_TOKEN_TTL_DAYS", 30);

        let default_app_id =
            env::var("DEFAULT_APP_ID").unwrap_or_else(|_| "user-center".to_string());

        let pattern = env::var("AUTH_RPC_PATTERN").unwrap_or_else(|_| "User.login".to_string());
        let fields = parse_field_list(
            env::var("AUTH_RPC_FIELDS").unwrap_or_else(|_| "user_id,username".to_string()),
        );
        let endpoint = env::var("AUTH_RPC_ENDPOINT").ok().and_then(|v| {
            let trimmed = v.trim().trim_end_matches('/').to_string();
            if trimmed.is_empty() { None } else { Some(trimmed) }
        });
        let timeout_ms = parse_env("AUTH_RPC_TIMEOUT_MS", 3000u64);

        let allowed_fields = parse_field_list(
            env::var("VALIDATOR_ALLOWED_FIELDS")
                .unwrap_or_else(|_| "user_id,username,email".to_string()),
        );

        Self {
            token: TokenSettings {
                secret,
                access_ttl_minutes,
                refresh_ttl_days,
            },
            session: SessionSettings { default_app_id },
            gateway: GatewaySettings {
                pattern,
                fields,
                endpoint,
                timeout_ms,
            },
            validator: ValidatorSettings { allowed_fields },
        }
    }

    /// 테스트용 설정을 생성합니다.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            token: TokenSettings {
                secret: "test-secret".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
            session: SessionSettings {
                default_app_id: "test-app".to_string(),
            },
            gateway: GatewaySettings {
                pattern: "User.login".to_string(),
                fields: vec!["username".to_string()],
                endpoint: None,
                timeout_ms: 200,
            },
            validator: ValidatorSettings {
                allowed_fields: vec![
                    "user_id".to_string(),
                    "username".to_string(),
                    "email".to_string(),
                ],
            },
        }
    }
}

/// 환경 변수를 숫자로 파싱하고, 실패 시 기본값을 사용합니다.
fn parse_env<T: std::str::FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            log::error!("{} 파싱 실패: '{}'. 기본값 {} 사용", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// 쉼표로 구분된 필드 목록을 정리합니다.
fn parse_field_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_list_parsing() {
        let fields = parse_field_list("username, email ,,user_id ".to_string());
        assert_eq!(fields, vec!["username", "email", "user_id"]);
    }

    #[test]
    fn test_refresh_ttl_seconds() {
        let settings = Settings::for_tests();
        assert_eq!(settings.token.refresh_ttl_seconds(), 7 * 24 * 3600);
    }
}
