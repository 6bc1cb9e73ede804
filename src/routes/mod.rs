mod auth;
mod health_check;

pub use auth::{login_for_access_token, read_users_me, LoginForm};
pub use health_check::health_check;

use actix_web::{web, HttpResponse};

use crate::configuration::ApplicationSettings;

/// GET /
pub async fn root(application: web::Data<ApplicationSettings>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Welcome to {}", application.project_name)
    }))
}
