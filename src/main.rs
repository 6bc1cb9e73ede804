use std::net::TcpListener;
use std::sync::Arc;

use authflow::auth::{AuthService, InMemoryCredentialStore};
use authflow::configuration::get_configuration;
use authflow::startup::run;
use authflow::telemetry::init_telemetry;

fn config_error(message: &'static str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry();

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(config_error("Configuration error"));
        }
    };

    // 서명 설정 검증 (지원하지 않는 알고리즘 등은 여기서 즉시 종료)
    let token_settings = configuration.auth.token_settings().map_err(|e| {
        tracing::error!("Invalid token settings: {}", e);
        config_error("Token settings error")
    })?;
    tracing::info!(algorithm = ?token_settings.algorithm, "Token signing configured");

    // 사용자 자격 증명 로드
    let store = InMemoryCredentialStore::from_settings(&configuration.credentials).map_err(|e| {
        tracing::error!("Failed to load credential store: {}", e);
        config_error("Credential store error")
    })?;

    let auth_service = AuthService::new(Arc::new(store), &token_settings);

    // 서버 주소 설정
    let address = configuration.application.address();
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let server = run(listener, auth_service, configuration.application.clone())?;
    tracing::info!("Server started successfully");

    server.await
}
