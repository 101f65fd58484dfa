//! 유저센터 서비스 메인 애플리케이션
//!
//! Actix-web 기반의 HTTP 서버를 구동하고 모든 컴포넌트를 초기화합니다.
//! MongoDB, Redis 연결을 설정하고 토큰 수명주기 관리 REST API와
//! 서비스 간 검증 엔드포인트를 제공합니다.

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::{middleware, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};

use user_center_backend::caching::redis::RedisClient;
use user_center_backend::config::Settings;
use user_center_backend::core::registry::ServiceLocator;
use user_center_backend::db::Database;
use user_center_backend::repositories::sessions::session_repository::SessionStore;
use user_center_backend::repositories::sessions::SessionRepository;
use user_center_backend::repositories::users::user_repository::UserStore;
use user_center_backend::repositories::users::UserRepository;
use user_center_backend::routes::configure_all_routes;
use user_center_backend::rpc::client::RemoteAuthClient;
use user_center_backend::rpc::transport::{
    HttpValidateTransport, LocalValidateTransport, ValidateTransport,
};
use user_center_backend::services::auth::{CodecService, SessionService, ValidatorService};
use user_center_backend::services::users::UserService;

/// Rate Limiting 설정 구조체
#[derive(Debug)]
struct RateLimitConfig {
    per_second: u64,
    burst_size: u32,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 환경 설정 및 로깅 초기화
    load_env_file();
    init_logging();

    info!("🚀 유저센터 서비스 시작중...");

    // 불변 설정 스냅샷 조립 (이후 환경 변수를 다시 읽는 컴포넌트는 없다)
    let settings = Arc::new(Settings::from_env());
    ServiceLocator::set(settings.clone());

    // 데이터 스토어 초기화
    let (database, redis_client) = initialize_data_stores().await;

    // ServiceLocator에 인프라 컴포넌트 등록
    ServiceLocator::set(database);
    ServiceLocator::set(redis_client);

    // 매크로 기반 리포지토리 초기화
    ServiceLocator::initialize_all()
        .await
        .expect("리포지토리 초기화 실패");

    // 핵심 서비스 조립 및 등록 (조립은 기동 시 단 한 번)
    assemble_core_services(&settings).await;

    info!("✅ 모든 컴포넌트가 성공적으로 초기화되었습니다!");

    // HTTP 서버 시작
    start_http_server().await
}

/// 핵심 서비스들을 명시적 생성자로 조립하고 등록합니다
///
/// 설정 스냅샷에서 고정된 구성으로 컴포넌트 그래프를 한 번 구성합니다.
/// 런타임 조건부 모듈 그래프는 존재하지 않습니다.
///
/// # 조립 순서
///
/// 1. 토큰 코덱 (상태 없음)
/// 2. 저장소 경계 (Redis 세션 / MongoDB 사용자)
/// 3. 아이덴티티 검증기
/// 4. 세션 수명주기 서비스, 사용자 서비스
/// 5. 원격 인증 게이트웨이 클라이언트 (전송 선택 포함)
async fn assemble_core_services(settings: &Arc<Settings>) {
    let codec = Arc::new(CodecService::new(settings.clone()));
    ServiceLocator::set(codec.clone());

    // 저장소 경계: 서비스들은 trait으로만 저장소를 본다
    let session_repo = ServiceLocator::get::<SessionRepository>();
    let user_repo = ServiceLocator::get::<UserRepository>();

    // 유니크 인덱스 보장
    user_repo
        .ensure_indexes()
        .await
        .expect("사용자 인덱스 생성 실패");

    let sessions: Arc<dyn SessionStore> = session_repo;
    let users: Arc<dyn UserStore> = user_repo;

    let validator = Arc::new(ValidatorService::new(codec.clone(), settings));
    ServiceLocator::set(validator.clone());

    let session_service = Arc::new(SessionService::new(
        codec.clone(),
        sessions,
        users.clone(),
    ));
    ServiceLocator::set(session_service);

    let user_service = Arc::new(UserService::new(users));
    ServiceLocator::set(user_service);

    // 게이트웨이 전송 선택: 엔드포인트가 있으면 HTTP, 없으면 프로세스 내 직접
    let transport: Arc<dyn ValidateTransport> = match &settings.gateway.endpoint {
        Some(endpoint) => {
            info!("🌐 원격 검증 전송: HTTP ({})", endpoint);
            Arc::new(
                HttpValidateTransport::new(
                    endpoint,
                    Duration::from_millis(settings.gateway.timeout_ms),
                )
                .expect("HTTP 검증 전송 생성 실패"),
            )
        }
        None => {
            info!("🏠 원격 검증 전송: 프로세스 내 직접 디스패치");
            Arc::new(LocalValidateTransport::new(validator))
        }
    };

    let auth_client = Arc::new(RemoteAuthClient::new(transport, &settings.gateway));
    ServiceLocator::set(auth_client);

    info!(
        "🛡️ 게이트웨이 고정 구성 - pattern: {}, fields: {:?}, timeout: {}ms",
        settings.gateway.pattern, settings.gateway.fields, settings.gateway.timeout_ms
    );
}

/// HTTP 서버를 구성하고 실행합니다
///
/// CORS, 로깅, 경로 정규화, Rate Limiting 미들웨어를 포함합니다.
async fn start_http_server() -> std::io::Result<()> {
    let bind_address = "127.0.0.1:8080";

    info!("🌐 서버가 http://{} 에서 실행중입니다", bind_address);
    info!("📍 Health check: http://{}/health", bind_address);
    info!("📍 API 엔드포인트: http://{}/api/v1", bind_address);

    // Rate Limiting 설정
    let rate_limit_config = load_rate_limit_config();
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_second(rate_limit_config.per_second)
        .burst_size(rate_limit_config.burst_size)
        .use_headers()
        .finish()
        .unwrap();

    info!(
        "🛡️ Rate Limiting 활성화: 초당 {}요청, 버스트 {}개",
        rate_limit_config.per_second, rate_limit_config.burst_size
    );

    HttpServer::new(move || {
        // CORS 설정
        let cors = configure_cors();

        App::new()
            // Rate Limiting 미들웨어 (가장 먼저 적용)
            .wrap(Governor::new(&governor_conf))

            // 기존 미들웨어들
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())

            // 라우트 설정
            .configure(configure_all_routes)
    })
    .bind(bind_address)?
    .workers(4) // 워커 스레드 수
    .run()
    .await
}

/// 환경별 설정 파일을 로드합니다
///
/// PROFILE 환경변수에 따라 적절한 .env 파일을 로드합니다.
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    info!("Current profile: {}", profile);

    match profile.as_str() {
        "prod" => match dotenv::from_filename(".env.prod") {
            Ok(_) => info!(".env.prod 파일 로드 됨"),
            Err(e) => error!(".env.prod 파일 로드 실패: {}", e),
        },
        "dev" => match dotenv::from_filename(".env.dev") {
            Ok(_) => info!(".env.dev 파일 로드 됨"),
            Err(e) => error!(".env.dev 파일 로드 실패: {}", e),
        },
        _ => {
            // 기본 .env 파일 로드
            dotenv().ok();
            info!("기본 .env 파일 로드");
        }
    }
}

/// 로깅 시스템을 초기화합니다
///
/// 환경변수 RUST_LOG를 기반으로 로깅 레벨을 설정합니다.
/// 기본값은 info 레벨이며, actix_web은 debug 레벨로 설정됩니다.
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,actix_web=debug"));
}

/// MongoDB와 Redis 연결을 초기화합니다
///
/// 데이터베이스 연결을 설정하고 Arc로 래핑된 핸들을 반환합니다.
/// 연결 실패 시 애플리케이션이 종료됩니다.
///
/// # Panics
///
/// * MongoDB 연결 실패 시
/// * Redis 연결 실패 시
async fn initialize_data_stores() -> (Arc<Database>, Arc<RedisClient>) {
    info!("📡 데이터베이스 연결 중...");

    // 데이터베이스 초기화
    let database = Arc::new(Database::new().await.expect("데이터베이스 연결 실패"));

    info!("✅ MongoDB 연결 성공");

    // Redis 클라이언트 초기화
    let redis_client = Arc::new(RedisClient::new().await.expect("Redis 연결 실패"));

    info!("✅ Redis 연결 성공");

    (database, redis_client)
}

/// CORS 설정을 구성합니다
///
/// 프론트엔드와의 통신을 위한 CORS(Cross-Origin Resource Sharing) 설정을 구성합니다.
/// 개발환경에서 로컬호스트 간 통신을 허용합니다.
fn configure_cors() -> Cors {
    Cors::default()
        // 허용할 Origin 설정
        .allowed_origin("http://localhost:3000")
        .allowed_origin("http://127.0.0.1:3000")
        .allowed_origin("http://localhost:8080")
        .allowed_origin("http://127.0.0.1:8080")

        // 허용할 HTTP 메서드
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])

        // 허용할 헤더
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            header::ACCESS_CONTROL_REQUEST_METHOD,
        ])

        // 자격 증명(쿠키 등) 지원
        .supports_credentials()

        // Preflight 요청 캐시 시간 (초)
        .max_age(3600)
}

/// 환경변수에서 Rate Limiting 설정을 로드합니다
///
/// * `RATE_LIMIT_PER_SECOND` - 초당 허용 요청 수 (기본값: 100)
/// * `RATE_LIMIT_BURST_SIZE` - 버스트 허용량 (기본값: 200)
fn load_rate_limit_config() -> RateLimitConfig {
    let per_second = std::env::var("RATE_LIMIT_PER_SECOND")
        .unwrap_or_else(|_| "100".to_string())
        .parse::<u64>()
        .unwrap_or_else(|e| {
            error!("RATE_LIMIT_PER_SECOND 파싱 실패: {}. 기본값 100 사용", e);
            100
        });

    let burst_size = std::env::var("RATE_LIMIT_BURST_SIZE")
        .unwrap_or_else(|_| "200".to_string())
        .parse::<u32>()
        .unwrap_or_else(|e| {
            error!("RATE_LIMIT_BURST_SIZE 파싱 실패: {}. 기본값 200 사용", e);
            200
        });

    let config = RateLimitConfig {
        per_second,
        burst_size,
    };

    info!("Rate Limiting 설정 로드됨: {:?}", config);
    config
}
