use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::{machinery, user, user::UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::fields::{ensure_max_len, nullable, MAX_NAME_LEN};
use crate::utils::geo::{validate_coordinates, validate_optional_location};
use crate::utils::jwt::Claims;
use crate::utils::search::{search_listings, SearchHit, SearchQuery};
use crate::AppState;

// ============ Search ============

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in km, 20 by default
    pub max_distance: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SearchParams {
    /// A requester location only applies when both coordinates are given
    fn into_query(self) -> AppResult<SearchQuery> {
        let origin = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                validate_coordinates(lat, lng)?;
                Some((lat, lng))
            }
            _ => None,
        };

        if let Some(radius) = self.max_distance {
            if !radius.is_finite() || radius < 0.0 {
                return Err(AppError::BadRequest(
                    "max_distance must be a non-negative number".to_string(),
                ));
            }
        }

        Ok(SearchQuery {
            name: self.name,
            origin,
            radius_km: self.max_distance,
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

/// Search rentable machinery
pub async fn search_machinery(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<SearchHit>>> {
    let query = params.into_query()?;

    let catalog = machinery::Entity::find()
        .filter(machinery::Column::IsAvailable.eq(true))
        .order_by_asc(machinery::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let hits = search_listings(catalog, &query);
    tracing::debug!(hits = hits.len(), origin = ?query.origin, "Machinery search");

    Ok(Json(hits))
}

/// Get machinery details
pub async fn get_machinery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<machinery::Model>> {
    let listing = find_listing(&state, id).await?;
    Ok(Json(listing))
}

// ============ Listing Management ============

#[derive(Debug, Deserialize)]
pub struct CreateMachineryRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_per_hour: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
    pub available_from: DateTime<Utc>,
    pub available_to: DateTime<Utc>,
    #[serde(default)]
    pub delivery_available: bool,
    pub delivery_charge: Option<f64>,
}

/// The only machinery fields an owner may change after creation.
///
/// Nullable columns take an explicit `null` to clear them; clearing both
/// coordinates takes the listing out of location searches.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMachineryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub price_per_hour: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
    pub delivery_available: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub delivery_charge: Option<Option<f64>>,
    pub is_available: Option<bool>,
}

impl UpdateMachineryRequest {
    pub fn apply(self, listing: &mut machinery::Model) {
        if let Some(name) = self.name {
            listing.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(price) = self.price_per_hour {
            listing.price_per_hour = price;
        }
        if let Some(lat) = self.latitude {
            listing.latitude = lat;
        }
        if let Some(lng) = self.longitude {
            listing.longitude = lng;
        }
        if let Some(url) = self.image_url {
            listing.image_url = url;
        }
        if let Some(from) = self.available_from {
            listing.available_from = from.fixed_offset();
        }
        if let Some(to) = self.available_to {
            listing.available_to = to.fixed_offset();
        }
        if let Some(delivery) = self.delivery_available {
            listing.delivery_available = delivery;
        }
        if let Some(charge) = self.delivery_charge {
            listing.delivery_charge = charge;
        }
        if let Some(available) = self.is_available {
            listing.is_available = available;
        }
    }
}

/// Check the invariants every stored listing must satisfy
pub fn validate_listing(listing: &machinery::Model) -> AppResult<()> {
    if listing.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    ensure_max_len("Name", &listing.name, MAX_NAME_LEN)?;

    if !listing.price_per_hour.is_finite() || listing.price_per_hour <= 0.0 {
        return Err(AppError::BadRequest(
            "price_per_hour must be positive".to_string(),
        ));
    }

    validate_optional_location(listing.latitude, listing.longitude)?;

    if listing.available_from >= listing.available_to {
        return Err(AppError::BadRequest(
            "available_from must be before available_to".to_string(),
        ));
    }

    if let Some(charge) = listing.delivery_charge {
        if !charge.is_finite() || charge < 0.0 {
            return Err(AppError::BadRequest(
                "delivery_charge cannot be negative".to_string(),
            ));
        }
    }

    Ok(())
}

/// Copy the owner-editable fields of `listing` into `active`
fn set_editable_fields(active: &mut machinery::ActiveModel, listing: machinery::Model) {
    active.name = Set(listing.name);
    active.description = Set(listing.description);
    active.price_per_hour = Set(listing.price_per_hour);
    active.latitude = Set(listing.latitude);
    active.longitude = Set(listing.longitude);
    active.image_url = Set(listing.image_url);
    active.available_from = Set(listing.available_from);
    active.available_to = Set(listing.available_to);
    active.delivery_available = Set(listing.delivery_available);
    active.delivery_charge = Set(listing.delivery_charge);
    active.is_available = Set(listing.is_available);
}

async fn find_listing(state: &AppState, id: Uuid) -> AppResult<machinery::Model> {
    machinery::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Machinery not found".to_string()))
}

fn ensure_owner(listing: &machinery::Model, claims: &Claims) -> AppResult<()> {
    if listing.owner_id != claims.sub && claims.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "You can only manage your own machinery".to_string(),
        ));
    }
    Ok(())
}

/// Publish a machinery listing owned by the logged-in farmer
pub async fn create_machinery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMachineryRequest>,
) -> AppResult<(StatusCode, Json<machinery::Model>)> {
    let owner = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let now = Utc::now().fixed_offset();
    let listing = machinery::Model {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        name: payload.name.trim().to_string(),
        description: payload.description,
        price_per_hour: payload.price_per_hour,
        latitude: payload.latitude,
        longitude: payload.longitude,
        owner_name: owner.name,
        owner_phone: owner.phone,
        image_url: payload.image_url,
        available_from: payload.available_from.fixed_offset(),
        available_to: payload.available_to.fixed_offset(),
        delivery_available: payload.delivery_available,
        delivery_charge: payload.delivery_charge,
        is_available: true,
        created_at: now,
        updated_at: None,
    };
    validate_listing(&listing)?;

    let mut active = machinery::ActiveModel {
        id: Set(listing.id),
        owner_id: Set(listing.owner_id),
        owner_name: Set(listing.owner_name.clone()),
        owner_phone: Set(listing.owner_phone.clone()),
        ..Default::default()
    };
    set_editable_fields(&mut active, listing);

    let created = active.insert(&state.db).await?;
    tracing::info!(machinery_id = %created.id, owner_id = %created.owner_id, "Machinery listed");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a machinery listing (owner or admin)
pub async fn update_machinery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMachineryRequest>,
) -> AppResult<Json<machinery::Model>> {
    let listing = find_listing(&state, id).await?;
    ensure_owner(&listing, &claims)?;

    let mut patched = listing.clone();
    payload.apply(&mut patched);
    validate_listing(&patched)?;

    let mut active: machinery::ActiveModel = listing.into();
    set_editable_fields(&mut active, patched);
    active.updated_at = Set(Some(Utc::now().fixed_offset()));

    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

/// Delete a machinery listing (owner or admin)
pub async fn delete_machinery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let listing = find_listing(&state, id).await?;
    ensure_owner(&listing, &claims)?;

    machinery::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(machinery_id = %id, "Machinery deleted");

    Ok(Json(serde_json::json!({ "message": "Machinery deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures::listing;
    use chrono::Duration;

    #[test]
    fn test_apply_changes_only_supplied_fields() {
        let original = listing(20.0, 85.0, 100.0);
        let mut patched = original.clone();

        UpdateMachineryRequest {
            price_per_hour: Some(150.0),
            is_available: Some(false),
            ..Default::default()
        }
        .apply(&mut patched);

        assert_eq!(patched.price_per_hour, 150.0);
        assert!(!patched.is_available);
        assert_eq!(patched.name, original.name);
        assert_eq!(patched.location(), original.location());
        assert_eq!(patched.available_from, original.available_from);
        assert_eq!(patched.owner_id, original.owner_id);
        assert_eq!(patched.owner_phone, original.owner_phone);
    }

    #[test]
    fn test_fixture_listing_is_valid() {
        assert!(validate_listing(&listing(20.0, 85.0, 100.0)).is_ok());
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let mut machine = listing(20.0, 85.0, 100.0);
        let from = machine.available_from;
        UpdateMachineryRequest {
            available_to: Some((from - Duration::hours(1)).with_timezone(&Utc)),
            ..Default::default()
        }
        .apply(&mut machine);

        assert!(matches!(validate_listing(&machine), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_invalid_listing_fields_are_rejected() {
        let cases: [fn(&mut machinery::Model); 7] = [
            |m| m.price_per_hour = 0.0,
            |m| m.price_per_hour = f64::NAN,
            |m| m.name = " ".to_string(),
            |m| m.name = "n".repeat(MAX_NAME_LEN + 1),
            |m| m.latitude = Some(95.0),
            |m| m.longitude = None,
            |m| m.delivery_charge = Some(-1.0),
        ];

        for mutate in cases {
            let mut machine = listing(20.0, 85.0, 100.0);
            mutate(&mut machine);
            assert!(validate_listing(&machine).is_err());
        }
    }

    #[test]
    fn test_patch_null_clears_location_and_missing_keeps_it() {
        let mut machine = listing(20.0, 85.0, 100.0);
        machine.delivery_charge = Some(50.0);

        let keep: UpdateMachineryRequest =
            serde_json::from_str(r#"{"price_per_hour": 120.0}"#).unwrap();
        keep.apply(&mut machine);
        assert_eq!(machine.location(), Some((20.0, 85.0)));
        assert_eq!(machine.delivery_charge, Some(50.0));

        let body = r#"{"latitude": null, "longitude": null, "delivery_charge": null}"#;
        let clear: UpdateMachineryRequest = serde_json::from_str(body).unwrap();
        clear.apply(&mut machine);
        assert_eq!(machine.latitude, None);
        assert_eq!(machine.longitude, None);
        assert_eq!(machine.delivery_charge, None);
        assert_eq!(machine.price_per_hour, 120.0);
        assert!(validate_listing(&machine).is_ok());
    }

    #[test]
    fn test_patch_clearing_one_coordinate_is_rejected() {
        let mut machine = listing(20.0, 85.0, 100.0);
        let patch: UpdateMachineryRequest = serde_json::from_str(r#"{"latitude": null}"#).unwrap();
        patch.apply(&mut machine);

        assert!(matches!(validate_listing(&machine), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_unlocated_listing_is_valid() {
        let mut machine = listing(20.0, 85.0, 100.0);
        machine.latitude = None;
        machine.longitude = None;
        assert!(validate_listing(&machine).is_ok());
    }

    #[test]
    fn test_search_params_ignore_half_location() {
        let query = SearchParams {
            latitude: Some(20.0),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.origin, None);
    }

    #[test]
    fn test_search_params_validate_origin_and_radius() {
        let out_of_range = SearchParams {
            latitude: Some(120.0),
            longitude: Some(85.0),
            ..Default::default()
        };
        assert!(out_of_range.into_query().is_err());

        let negative_radius = SearchParams {
            max_distance: Some(-5.0),
            ..Default::default()
        };
        assert!(negative_radius.into_query().is_err());

        let query = SearchParams {
            latitude: Some(20.0),
            longitude: Some(85.0),
            max_distance: Some(5.0),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.origin, Some((20.0, 85.0)));
        assert_eq!(query.radius_km(), 5.0);
    }
}
