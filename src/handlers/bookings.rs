use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, DeliveryType};
use crate::entities::{machinery, notification, user};
use crate::error::{AppError, AppResult};
use crate::utils::booking::{quote_total, validate_booking};
use crate::utils::fields::{ensure_max_len, MAX_PHONE_LEN};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub machinery_id: Uuid,
    /// Contact number for the owner; defaults to the requester's profile phone
    pub user_phone: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub delivery_type: DeliveryType,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub machinery_id: Uuid,
    pub machinery_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_per_hour: Option<f64>,
    /// Only reported for owner delivery
    pub delivery_charge: Option<f64>,
    pub user_phone: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub delivery_type: DeliveryType,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

impl BookingResponse {
    fn new(b: booking::Model, machine: Option<&machinery::Model>) -> Self {
        let delivery_charge = match b.delivery_type {
            DeliveryType::OwnerDelivery => machine.and_then(|m| m.delivery_charge),
            DeliveryType::SelfPickup => None,
        };

        Self {
            id: b.id,
            machinery_id: b.machinery_id,
            machinery_name: machine.map(|m| m.name.clone()),
            owner_name: machine.map(|m| m.owner_name.clone()),
            owner_phone: machine.map(|m| m.owner_phone.clone()),
            latitude: machine.and_then(|m| m.latitude),
            longitude: machine.and_then(|m| m.longitude),
            price_per_hour: machine.map(|m| m.price_per_hour),
            delivery_charge,
            user_phone: b.user_phone,
            start_time: b.start_time.with_timezone(&Utc),
            end_time: b.end_time.with_timezone(&Utc),
            delivery_type: b.delivery_type,
            total_price: b.total_price,
            created_at: b.created_at.with_timezone(&Utc),
        }
    }
}

/// Message left for the owner when their machinery is booked
fn booking_notice(machine: &machinery::Model, booking: &booking::Model) -> String {
    let delivery = match booking.delivery_type {
        DeliveryType::SelfPickup => "self pickup",
        DeliveryType::OwnerDelivery => "owner delivery",
    };

    format!(
        "New booking for {} from {} to {} ({}), contact {}",
        machine.name,
        booking.start_time.format("%Y-%m-%d %H:%M"),
        booking.end_time.format("%Y-%m-%d %H:%M"),
        delivery,
        booking.user_phone,
    )
}

/// Book machinery for a time interval
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    let machine = machinery::Entity::find_by_id(payload.machinery_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Machinery not found".to_string()))?;

    // Other bookings on this machinery are not consulted, and it stays
    // available afterwards: double-booking is currently possible.
    validate_booking(&machine, payload.start_time, payload.end_time)?;

    if payload.end_time <= payload.start_time {
        return Err(AppError::BadRequest(
            "end_time must be after start_time".to_string(),
        ));
    }

    if payload.delivery_type == DeliveryType::OwnerDelivery && !machine.delivery_available {
        return Err(AppError::BadRequest(
            "Owner delivery is not offered for this machinery".to_string(),
        ));
    }

    let user_phone = match payload.user_phone.map(|p| p.trim().to_string()) {
        Some(phone) if !phone.is_empty() => phone,
        _ => {
            user::Entity::find_by_id(claims.sub)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?
                .phone
        }
    };
    ensure_max_len("user_phone", &user_phone, MAX_PHONE_LEN)?;

    let total_price = quote_total(
        &machine,
        payload.start_time,
        payload.end_time,
        payload.delivery_type,
    );

    let txn = state.db.begin().await?;

    let booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        machinery_id: Set(machine.id),
        user_id: Set(claims.sub),
        user_phone: Set(user_phone),
        start_time: Set(payload.start_time.fixed_offset()),
        end_time: Set(payload.end_time.fixed_offset()),
        delivery_type: Set(payload.delivery_type),
        total_price: Set(total_price),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(machine.owner_id),
        message: Set(booking_notice(&machine, &booking)),
        is_read: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = %booking.id,
        machinery_id = %machine.id,
        user_id = %claims.sub,
        total_price,
        "Machinery booked"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new(booking, Some(&machine))),
    ))
}

/// List the logged-in user's bookings, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = booking::Entity::find()
        .find_also_related(machinery::Entity)
        .filter(booking::Column::UserId.eq(claims.sub))
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let responses = bookings
        .into_iter()
        .map(|(b, machine)| BookingResponse::new(b, machine.as_ref()))
        .collect();

    Ok(Json(responses))
}
