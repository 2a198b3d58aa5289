use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::MIN_PASSWORD_LEN;
use crate::utils::fields::{ensure_max_len, MAX_NAME_LEN, MAX_PHONE_LEN};
use crate::utils::geo::validate_optional_location;
use crate::utils::jwt::Claims;
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            latitude: u.latitude,
            longitude: u.longitude,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

/// Profile fields a user may change on their own account
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UpdateProfileRequest {
    pub fn apply(self, profile: &mut user::Model) -> AppResult<()> {
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::BadRequest("Name cannot be empty".to_string()));
            }
            ensure_max_len("Name", name, MAX_NAME_LEN)?;
            profile.name = name.to_string();
        }
        if let Some(phone) = self.phone {
            let phone = phone.trim();
            if phone.is_empty() {
                return Err(AppError::BadRequest("Phone cannot be empty".to_string()));
            }
            ensure_max_len("Phone", phone, MAX_PHONE_LEN)?;
            profile.phone = phone.to_string();
        }
        if let Some(lat) = self.latitude {
            profile.latitude = Some(lat);
        }
        if let Some(lng) = self.longitude {
            profile.longitude = Some(lng);
        }

        validate_optional_location(profile.latitude, profile.longitude)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

async fn load_user(state: &AppState, id: Uuid) -> AppResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Get the logged-in user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserResponse>> {
    let user = load_user(&state, claims.sub).await?;
    Ok(Json(user.into()))
}

/// Partially update the logged-in user's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = load_user(&state, claims.sub).await?;

    let mut patched = user.clone();
    payload.apply(&mut patched)?;

    let mut active: user::ActiveModel = user.into();
    active.name = Set(patched.name);
    active.phone = Set(patched.phone);
    active.latitude = Set(patched.latitude);
    active.longitude = Set(patched.longitude);

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

/// Change password after verifying the current one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let user = load_user(&state, claims.sub).await?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    if payload.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.update(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "ravi@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Ravi".to_string(),
            phone: "+919111111111".to_string(),
            latitude: None,
            longitude: None,
            role: UserRole::Customer,
            is_active: true,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_apply_touches_only_supplied_fields() {
        let mut user = profile();
        UpdateProfileRequest {
            name: Some(" Ravi Kumar ".to_string()),
            latitude: Some(20.0),
            longitude: Some(85.0),
            ..Default::default()
        }
        .apply(&mut user)
        .unwrap();

        assert_eq!(user.name, "Ravi Kumar");
        assert_eq!(user.phone, "+919111111111");
        assert_eq!(user.latitude, Some(20.0));
        assert_eq!(user.longitude, Some(85.0));
        assert_eq!(user.email, "ravi@example.com");
        assert_eq!(user.role, UserRole::Customer);
    }

    #[test]
    fn test_apply_rejects_half_location() {
        let mut user = profile();
        let result = UpdateProfileRequest {
            latitude: Some(20.0),
            ..Default::default()
        }
        .apply(&mut user);

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_apply_rejects_blank_or_oversized_fields() {
        let patches: [fn() -> UpdateProfileRequest; 4] = [
            || UpdateProfileRequest {
                name: Some("   ".to_string()),
                ..Default::default()
            },
            || UpdateProfileRequest {
                name: Some("n".repeat(MAX_NAME_LEN + 1)),
                ..Default::default()
            },
            || UpdateProfileRequest {
                phone: Some(String::new()),
                ..Default::default()
            },
            || UpdateProfileRequest {
                phone: Some("9".repeat(MAX_PHONE_LEN + 1)),
                ..Default::default()
            },
        ];

        for patch in patches {
            let mut user = profile();
            assert!(matches!(patch().apply(&mut user), Err(AppError::BadRequest(_))));
        }
    }
}
