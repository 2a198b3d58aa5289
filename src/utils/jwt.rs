use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user id
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

/// Issue an access token for `user`, valid for `jwt_expiration_hours`
pub fn create_token(user: &user::Model, config: &Config) -> AppResult<String> {
    issue(user, &config.jwt_secret, config.jwt_expiration_hours)
}

fn issue(user: &user::Model, secret: &str, expiration_hours: i64) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farmer() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "farmer@example.com".to_string(),
            password_hash: String::new(),
            name: "Sita".to_string(),
            phone: "+919000000000".to_string(),
            latitude: None,
            longitude: None,
            role: UserRole::Farmer,
            is_active: true,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_token_round_trip_keeps_identity() {
        let user = farmer();
        let token = issue(&user, "secret", 1).unwrap();

        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, UserRole::Farmer);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = issue(&farmer(), "secret", 1).unwrap();
        assert!(matches!(
            verify_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let token = issue(&farmer(), "secret", -2).unwrap();
        assert!(matches!(
            verify_token(&token, "secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
