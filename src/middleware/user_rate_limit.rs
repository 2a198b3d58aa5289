use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::Claims;

/// Key extractor that rate-limits by the authenticated user id
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // Claims are set by auth_middleware, which must run first
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type UserGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-user request budget for a route group
/// - Standard: 100 requests per minute (account, bookings, notifications, predictions)
/// - Seller: 300 requests per minute (listing management)
pub enum RateTier {
    Standard,
    Seller,
}

pub fn create_user_governor(tier: RateTier) -> UserGovernorLayer {
    let (per_ms, burst) = match tier {
        RateTier::Standard => (600, 100),
        RateTier::Seller => (200, 300),
    };

    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(UserIdExtractor)
            .finish()
            .expect("rate limit period and burst must be non-zero"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}
