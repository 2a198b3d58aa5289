use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::entities::machinery;

/// Available listing at `(lat, lng)` priced `price` per hour, with an
/// availability window of Jan 1 2025, 08:00 to 18:00 UTC.
pub fn listing(lat: f64, lng: f64, price: f64) -> machinery::Model {
    let day = |hour| Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap().fixed_offset();

    machinery::Model {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Tractor".to_string(),
        description: None,
        price_per_hour: price,
        latitude: Some(lat),
        longitude: Some(lng),
        owner_name: "Ramesh".to_string(),
        owner_phone: "+919876543210".to_string(),
        image_url: None,
        available_from: day(8),
        available_to: day(18),
        delivery_available: false,
        delivery_charge: None,
        is_available: true,
        created_at: day(0),
        updated_at: None,
    }
}
