use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::{user::UserRole, vegetable};
use crate::error::{AppError, AppResult};
use crate::utils::fields::{ensure_max_len, MAX_CATEGORY_LEN, MAX_NAME_LEN};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VegetableFilter {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVegetableRequest {
    pub veg_name: String,
    pub category: String,
    pub quantity: f64,
    pub rate: f64,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// The only vegetable fields a seller may change after creation
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVegetableRequest {
    pub veg_name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub rate: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl UpdateVegetableRequest {
    pub fn apply(self, item: &mut vegetable::Model) {
        if let Some(name) = self.veg_name {
            item.veg_name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            item.category = category.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(rate) = self.rate {
            item.rate = rate;
        }
        if let Some(url) = self.image_url {
            item.image_url = Some(url);
        }
        if let Some(description) = self.description {
            item.description = Some(description);
        }
    }
}

fn validate_vegetable(item: &vegetable::Model) -> AppResult<()> {
    if item.veg_name.is_empty() {
        return Err(AppError::BadRequest("veg_name is required".to_string()));
    }
    if item.category.is_empty() {
        return Err(AppError::BadRequest("category is required".to_string()));
    }
    ensure_max_len("veg_name", &item.veg_name, MAX_NAME_LEN)?;
    ensure_max_len("category", &item.category, MAX_CATEGORY_LEN)?;
    if !item.quantity.is_finite() || item.quantity < 0.0 {
        return Err(AppError::BadRequest("quantity cannot be negative".to_string()));
    }
    if !item.rate.is_finite() || item.rate <= 0.0 {
        return Err(AppError::BadRequest("rate must be positive".to_string()));
    }
    Ok(())
}

async fn find_vegetable(state: &AppState, id: Uuid) -> AppResult<vegetable::Model> {
    vegetable::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vegetable not found".to_string()))
}

fn ensure_seller(item: &vegetable::Model, claims: &Claims) -> AppResult<()> {
    if item.seller_id != claims.sub && claims.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "You can only manage your own vegetables".to_string(),
        ));
    }
    Ok(())
}

/// List vegetables, optionally for one category
pub async fn list_vegetables(
    State(state): State<AppState>,
    Query(filter): Query<VegetableFilter>,
) -> AppResult<Json<Vec<vegetable::Model>>> {
    let mut query = vegetable::Entity::find().order_by_asc(vegetable::Column::VegName);

    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        query = query.filter(vegetable::Column::Category.eq(category));
    }

    Ok(Json(query.all(&state.db).await?))
}

pub async fn get_vegetable(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<vegetable::Model>> {
    Ok(Json(find_vegetable(&state, id).await?))
}

/// Add a vegetable listing for the logged-in seller
pub async fn create_vegetable(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVegetableRequest>,
) -> AppResult<(StatusCode, Json<vegetable::Model>)> {
    let item = vegetable::Model {
        id: Uuid::new_v4(),
        seller_id: claims.sub,
        veg_name: payload.veg_name.trim().to_string(),
        category: payload.category.trim().to_string(),
        quantity: payload.quantity,
        rate: payload.rate,
        image_url: payload.image_url,
        description: payload.description,
        created_at: chrono::Utc::now().fixed_offset(),
    };
    validate_vegetable(&item)?;

    let created = vegetable::ActiveModel {
        id: Set(item.id),
        seller_id: Set(item.seller_id),
        veg_name: Set(item.veg_name),
        category: Set(item.category),
        quantity: Set(item.quantity),
        rate: Set(item.rate),
        image_url: Set(item.image_url),
        description: Set(item.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a vegetable listing (seller or admin)
pub async fn update_vegetable(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVegetableRequest>,
) -> AppResult<Json<vegetable::Model>> {
    let item = find_vegetable(&state, id).await?;
    ensure_seller(&item, &claims)?;

    let mut patched = item.clone();
    payload.apply(&mut patched);
    validate_vegetable(&patched)?;

    let mut active: vegetable::ActiveModel = item.into();
    active.veg_name = Set(patched.veg_name);
    active.category = Set(patched.category);
    active.quantity = Set(patched.quantity);
    active.rate = Set(patched.rate);
    active.image_url = Set(patched.image_url);
    active.description = Set(patched.description);

    Ok(Json(active.update(&state.db).await?))
}

/// Delete a vegetable listing (seller or admin)
pub async fn delete_vegetable(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let item = find_vegetable(&state, id).await?;
    ensure_seller(&item, &claims)?;

    vegetable::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Vegetable deleted successfully" })))
}
