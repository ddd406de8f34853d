use crate::{
    api::{leave_request, punch, statistics, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // literal paths go before /{id}
                    .service(
                        web::resource("/history")
                            .route(web::get().to(leave_request::leave_history)),
                    )
                    .service(
                        web::resource("/statistics")
                            .route(web::get().to(statistics::leave_statistics)),
                    )
                    .service(
                        web::resource("/deputy")
                            .route(web::get().to(leave_request::deputy_pending)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve/{approver}
                    .service(
                        web::resource("/{id}/approve/{approver}")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject/{approver}
                    .service(
                        web::resource("/{id}/reject/{approver}")
                            .route(web::put().to(leave_request::reject_leave)),
                    )
                    // /leave/{id}/decision (admin fan-out)
                    .service(
                        web::resource("/{id}/decision")
                            .route(web::put().to(leave_request::decide_leave)),
                    )
                    // /leave/{id}/deputy-confirm
                    .service(
                        web::resource("/{id}/deputy-confirm")
                            .route(web::put().to(leave_request::confirm_deputy)),
                    ),
            )
            .service(
                web::scope("/punch")
                    // /punch
                    .service(web::resource("").route(web::post().to(punch::punch)))
                    .service(
                        web::resource("/history").route(web::get().to(punch::punch_history)),
                    )
                    // /punch/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(punch::edit_punch))
                            .route(web::delete().to(punch::delete_punch)),
                    ),
            ),
    );
}
