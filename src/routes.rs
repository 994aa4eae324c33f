use crate::{
    api::{attendance, clock, correction, employee, report},
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
            .service(
                web::scope("/clock")
                    .service(web::resource("/in").route(web::post().to(clock::clock_in)))
                    .service(web::resource("/out").route(web::post().to(clock::clock_out)))
                    .service(web::resource("/break-in").route(web::post().to(clock::break_in)))
                    .service(web::resource("/break-out").route(web::post().to(clock::break_out)))
                    .service(web::resource("/status").route(web::get().to(clock::clock_status))),
            )
            .service(
                web::scope("/attendance")
                    // /attendance?month=YYYY-MM
                    .service(web::resource("").route(web::get().to(attendance::my_month)))
                    // /attendance/daily?date=
                    .service(web::resource("/daily").route(web::get().to(attendance::admin_daily)))
                    // /attendance/monthly?employee_id=&month=
                    .service(
                        web::resource("/monthly").route(web::get().to(attendance::admin_month)),
                    )
                    // /attendance/days/{id}
                    .service(
                        web::resource("/days/{id}").route(web::put().to(attendance::update_day)),
                    ),
            )
            .service(
                web::scope("/corrections")
                    // /corrections
                    .service(
                        web::resource("")
                            .route(web::get().to(correction::correction_list))
                            .route(web::post().to(correction::create_correction)),
                    )
                    // /corrections/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(correction::get_correction)),
                    )
                    // /corrections/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(correction::approve_correction)),
                    )
                    // /corrections/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(correction::reject_correction)),
                    ),
            )
            .service(
                web::scope("/reports").service(
                    web::resource("/attendance.csv").route(web::get().to(report::monthly_csv)),
                ),
            )
            .service(
                web::scope("/employees")
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
            ),
    );
}
