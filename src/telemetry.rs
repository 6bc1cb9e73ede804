use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 구조화된 로깅을 초기화합니다.
/// JSON 형식의 로그를 stdout 으로 출력하며, RUST_LOG 환경 변수로 로그 레벨을 제어합니다.
pub fn init_telemetry() {
    init_telemetry_with("info", std::io::stdout);
}

/// 기본 필터와 출력 대상을 지정해 로깅을 초기화합니다.
/// CLI 처럼 stdout 을 사용자 출력에 쓰는 경우 stderr 를 넘깁니다.
/// `log` 크레이트 레코드도 같은 구독자로 전달됩니다.
pub fn init_telemetry_with<W>(default_filter: &str, writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .json();

    // 테스트 등에서 이미 초기화된 경우 무시합니다.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_initialization_is_idempotent() {
        init_telemetry_with("debug", std::io::sink);
        init_telemetry_with("debug", std::io::sink);
        tracing::info!("telemetry initialized");
    }
}
