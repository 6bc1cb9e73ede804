/// Authentication Routes
///
/// Token issuance for username/password credentials and the current user's profile.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{AuthService, UserProfile};
use crate::error::AppError;

/// OAuth2 password-grant style login form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /token
///
/// Authenticate with a form-encoded username and password.
/// Returns `{"access_token": "...", "token_type": "bearer"}` on success.
///
/// # Errors
/// - 400: Missing form fields
/// - 401: Unknown user or wrong password (same response for both)
/// - 500: Internal server error
pub async fn login_for_access_token(
    form: web::Form<LoginForm>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let LoginForm { username, password } = form.into_inner();

    // bcrypt is deliberately slow; keep it off the async workers
    let service = auth.clone();
    let record = web::block(move || service.authenticate(&username, &password)).await??;

    let token = auth.issue_token(&record.username, None)?;

    Ok(HttpResponse::Ok().json(token))
}

/// GET /users/me
///
/// **Requires** `Authorization: Bearer <access_token>`; the profile is
/// injected by the bearer middleware.
///
/// # Errors
/// - 401: Missing, invalid or expired token, or unknown subject
/// - 400: Inactive user
pub async fn read_users_me(user: web::ReqData<UserProfile>) -> HttpResponse {
    HttpResponse::Ok().json(user.into_inner())
}
