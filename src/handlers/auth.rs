use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::handlers::users::UserResponse;
use crate::utils::fields::{ensure_max_len, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PHONE_LEN};
use crate::utils::geo::validate_optional_location;
use crate::utils::jwt::create_token;
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Farmer or customer; defaults to customer
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

impl RegisterRequest {
    /// Trim and check the submitted fields, returning the normalized email
    fn validate(&self) -> AppResult<String> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        ensure_max_len("Name", self.name.trim(), MAX_NAME_LEN)?;

        let email = normalize_email(&self.email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => {
                return Err(AppError::BadRequest(
                    "Please enter a valid email address".to_string(),
                ))
            }
        }
        ensure_max_len("Email", &email, MAX_EMAIL_LEN)?;

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.phone.trim().is_empty() {
            return Err(AppError::BadRequest("Phone number is required".to_string()));
        }
        ensure_max_len("Phone number", self.phone.trim(), MAX_PHONE_LEN)?;

        if self.role == Some(UserRole::Admin) {
            return Err(AppError::BadRequest(
                "Role must be farmer or customer".to_string(),
            ));
        }

        validate_optional_location(self.latitude, self.longitude)?;

        Ok(email)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new farmer or customer account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = payload.validate()?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        name: Set(payload.name.trim().to_string()),
        phone: Set(payload.phone.trim().to_string()),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        role: Set(payload.role.unwrap_or(UserRole::Customer)),
        is_active: Set(true),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await?;
    tracing::info!(user_id = %user.id, role = ?user.role, "User registered");

    let token = create_token(&user, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    let token = create_token(&user, &state.config)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            name: " Sita Devi ".to_string(),
            email: " Sita@Example.COM ".to_string(),
            password: "paddy123".to_string(),
            phone: "+919000000000".to_string(),
            latitude: Some(20.29),
            longitude: Some(85.82),
            role: Some(UserRole::Farmer),
        }
    }

    #[test]
    fn test_valid_registration_normalizes_email() {
        assert_eq!(request().validate().unwrap(), "sita@example.com");
    }

    #[test]
    fn test_registration_rejects_bad_fields() {
        let cases: [fn(&mut RegisterRequest); 11] = [
            |r| r.name = "  ".to_string(),
            |r| r.name = "n".repeat(MAX_NAME_LEN + 1),
            |r| r.email = format!("{}@example.com", "e".repeat(MAX_EMAIL_LEN)),
            |r| r.phone = "9".repeat(MAX_PHONE_LEN + 1),
            |r| r.email = "sita.example.com".to_string(),
            |r| r.email = "@example.com".to_string(),
            |r| r.password = "short".to_string(),
            |r| r.phone = String::new(),
            |r| r.role = Some(UserRole::Admin),
            |r| r.latitude = Some(123.0),
            |r| r.longitude = None,
        ];

        for mutate in cases {
            let mut req = request();
            mutate(&mut req);
            assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
        }
    }
}
