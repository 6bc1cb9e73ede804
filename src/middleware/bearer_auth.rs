/// Bearer Token Authentication Middleware
///
/// Reads `Authorization: Bearer <token>`, resolves it through `AuthService`
/// and injects the caller's `UserProfile` into request extensions for use by
/// route handlers (`web::ReqData<UserProfile>`).

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AuthService, UserProfile};
use crate::error::{AppError, AuthError};

/// Bearer middleware for protecting routes
pub struct BearerAuth {
    auth: web::Data<AuthService>,
}

impl BearerAuth {
    pub fn new(auth: web::Data<AuthService>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(BearerAuthService {
            service: Rc::new(service),
            auth: self.auth.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
    auth: web::Data<AuthService>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
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
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_string);

        let outcome = match token {
            None => {
                tracing::debug!("Missing or non-bearer Authorization header");
                Err(AuthError::MissingToken)
            }
            Some(token) => self.auth.resolve_identity(&token),
        };

        match outcome {
            Ok(record) => {
                let profile = UserProfile::from(&record);
                tracing::debug!(username = %profile.username, "Bearer token accepted");
                req.extensions_mut().insert(profile);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(AppError::Auth(e).into()) }),
        }
    }
}

/// Extract the credentials from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; an empty token counts as missing.
pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
