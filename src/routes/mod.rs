use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;

use crate::handlers::{admin, auth, bookings, disease, machinery, notifications, users, vegetables};
use crate::middleware::auth::{auth_middleware, require_admin, require_seller};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::{create_user_governor, RateTier};
use crate::AppState;

/// Simultaneous calls allowed to the hosted disease model
const DISEASE_CONCURRENCY: usize = 4;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();

    // Public routes (IP rate limited)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let catalog_routes = Router::new()
        .route("/machinery", get(machinery::search_machinery))
        .route("/machinery/{id}", get(machinery::get_machinery))
        .route("/vegetables", get(vegetables::list_vegetables))
        .route("/vegetables/{id}", get(vegetables::get_vegetable))
        .layer(public_governor);

    // Any logged-in user
    let member_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me", patch(users::update_me))
        .route("/users/change-password", post(users::change_password))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings", get(bookings::my_bookings))
        .route("/notifications", get(notifications::my_notifications))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route(
            "/predict/disease",
            post(disease::predict_disease)
                .layer::<_, std::convert::Infallible>(ConcurrencyLimitLayer::new(DISEASE_CONCURRENCY))
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .layer(create_user_governor(RateTier::Standard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Farmers and admins managing their listings
    let seller_routes = Router::new()
        .route("/machinery", post(machinery::create_machinery))
        .route("/machinery/{id}", put(machinery::update_machinery))
        .route("/machinery/{id}", delete(machinery::delete_machinery))
        .route("/vegetables", post(vegetables::create_vegetable))
        .route("/vegetables/{id}", put(vegetables::update_vegetable))
        .route("/vegetables/{id}", delete(vegetables::delete_vegetable))
        .layer(create_user_governor(RateTier::Seller))
        .layer(middleware::from_fn(require_seller))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (no per-user limit beyond the global one)
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}/status", put(admin::update_user_status))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", catalog_routes.merge(member_routes))
        .nest("/api/listings", seller_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
