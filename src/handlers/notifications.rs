use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::notification;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

/// List the logged-in user's notifications, newest first
pub async fn my_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<notification::Model>>> {
    let notifications = notification::Entity::find()
        .filter(notification::Column::UserId.eq(claims.sub))
        .order_by_desc(notification::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(notifications))
}

/// Mark one of the logged-in user's notifications as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<notification::Model>> {
    let notification = notification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    if notification.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only update your own notifications".to_string(),
        ));
    }

    if notification.is_read {
        return Ok(Json(notification));
    }

    let mut active: notification::ActiveModel = notification.into();
    active.is_read = Set(true);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated))
}
