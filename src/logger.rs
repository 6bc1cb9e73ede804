use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;

/// 요청 로깅 미들웨어
/// 메서드, 경로, 상태 코드, 처리 시간을 기록합니다.
/// 쿼리 문자열과 헤더(Authorization 포함)는 기록하지 않습니다.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed_ms = start_time.elapsed().as_millis();

            match &res {
                Ok(response) if response.status().is_success() => {
                    info!(
                        "{} {} -> {} ({}ms)",
                        method,
                        path,
                        response.status().as_u16(),
                        elapsed_ms
                    );
                }
                Ok(response) => {
                    warn!(
                        "{} {} -> {} ({}ms)",
                        method,
                        path,
                        response.status().as_u16(),
                        elapsed_ms
                    );
                }
                // 미들웨어에서 거부된 요청 (예: 인증 실패)
                Err(e) => {
                    warn!(
                        "{} {} -> {} ({}ms)",
                        method,
                        path,
                        e.as_response_error().status_code().as_u16(),
                        elapsed_ms
                    );
                }
            }

            res
        })
    }
}
