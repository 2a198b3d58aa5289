use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, QuerySelect, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::handlers::users::UserResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

async fn find_other_user(state: &AppState, claims: &Claims, id: Uuid) -> AppResult<user::Model> {
    if id == claims.sub {
        return Err(AppError::BadRequest(
            "Admins cannot change their own account here".to_string(),
        ));
    }

    user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// List users, oldest first (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::CreatedAt)
        .offset(page.skip)
        .limit(page.limit.min(MAX_PAGE_SIZE))
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Change a user's role (admin)
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = find_other_user(&state, &claims, id).await?;

    let mut active: user::ActiveModel = user.into();
    active.role = Set(payload.role);
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = %updated.id, role = ?updated.role, "User role changed");
    Ok(Json(updated.into()))
}

/// Activate or deactivate a user account (admin)
pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = find_other_user(&state, &claims, id).await?;

    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(payload.is_active);
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = %updated.id, is_active = updated.is_active, "User status changed");
    Ok(Json(updated.into()))
}
