use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::configuration::ApplicationSettings;
use crate::logger::RequestLogger;
use crate::middleware::BearerAuth;
use crate::routes::{health_check, login_for_access_token, read_users_me, root};

pub fn run(
    listener: TcpListener,
    auth_service: AuthService,
    application: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let auth_service = web::Data::new(auth_service);
    let application = web::Data::new(application);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(auth_service.clone())
            .app_data(application.clone())

            // Public routes
            .route("/", web::get().to(root))
            .route("/health_check", web::get().to(health_check))
            .route("/token", web::post().to(login_for_access_token))

            // Protected routes (require a bearer token)
            .service(
                web::scope("/users")
                    .wrap(BearerAuth::new(auth_service.clone()))
                    .route("/me", web::get().to(read_users_me)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
