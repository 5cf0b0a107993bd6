use crate::{
    api::{employee, time_record},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter from a requests-per-minute figure.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    // burst_size(0) would make the builder fail, so 0 means the slowest limit
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
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
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            // token-guarded via the AuthUser extractor
            .service(
                web::resource("/change-password")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::change_password)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/scheduled-today
                    .service(
                        web::resource("/scheduled-today")
                            .route(web::get().to(employee::scheduled_today)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/time-records")
                    // /time-records
                    .service(
                        web::resource("").route(web::get().to(time_record::list_records)),
                    )
                    .service(
                        web::resource("/today").route(web::get().to(time_record::today_records)),
                    )
                    .service(web::resource("/clock").route(web::post().to(time_record::clock)))
                    .service(
                        web::resource("/mark-absence")
                            .route(web::post().to(time_record::mark_absence)),
                    )
                    .service(
                        web::resource("/generate-absences")
                            .route(web::post().to(time_record::generate_absences)),
                    )
                    .service(
                        web::resource("/attendance-report")
                            .route(web::get().to(time_record::attendance_report)),
                    )
                    .service(
                        web::resource("/attendance-report/export")
                            .route(web::get().to(time_record::export_attendance_report)),
                    )
                    .service(
                        web::resource("/export").route(web::get().to(time_record::export_records)),
                    )
                    // /time-records/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(time_record::delete_record)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_any_rate_including_zero() {
        // a misconfigured rate of 0 must not abort startup
        let _ = build_limiter(0);
        let _ = build_limiter(1);
        let _ = build_limiter(60);
    }
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
