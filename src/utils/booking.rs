use chrono::{DateTime, Utc};

use crate::entities::{booking::DeliveryType, machinery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Machinery is not available for booking")]
    NotAvailable,
    #[error("Booking time is outside machinery availability window")]
    OutOfWindow,
}

/// Check that `listing` can be booked for `[start, end]`.
///
/// The availability flag is checked before the window. Existing bookings are
/// not consulted, so overlapping requests on the same machinery all pass, and
/// the listing stays available afterwards.
pub fn validate_booking(
    listing: &machinery::Model,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), BookingError> {
    if !listing.is_available {
        return Err(BookingError::NotAvailable);
    }

    let window_start = listing.available_from.with_timezone(&Utc);
    let window_end = listing.available_to.with_timezone(&Utc);

    if start < window_start || end > window_end {
        return Err(BookingError::OutOfWindow);
    }

    // TODO: reject intervals overlapping existing bookings once the
    // double-booking policy is decided
    Ok(())
}

/// Price of renting `listing` for `[start, end]`, billed per fractional hour.
/// Owner delivery adds the listing's delivery charge, if it has one.
pub fn quote_total(
    listing: &machinery::Model,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    delivery: DeliveryType,
) -> f64 {
    let hours = (end - start).num_seconds() as f64 / 3600.0;
    let rental = hours * listing.price_per_hour;

    match delivery {
        DeliveryType::SelfPickup => rental,
        DeliveryType::OwnerDelivery => rental + listing.delivery_charge.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures::listing;
    use chrono::TimeZone;

    fn jan1(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_request_inside_window_is_accepted() {
        let machine = listing(0.0, 0.0, 100.0);
        assert_eq!(validate_booking(&machine, jan1(9, 0), jan1(10, 0)), Ok(()));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let machine = listing(0.0, 0.0, 100.0);
        assert_eq!(validate_booking(&machine, jan1(8, 0), jan1(18, 0)), Ok(()));
    }

    #[test]
    fn test_start_before_window_is_rejected() {
        let machine = listing(0.0, 0.0, 100.0);
        assert_eq!(
            validate_booking(&machine, jan1(7, 0), jan1(10, 0)),
            Err(BookingError::OutOfWindow)
        );
    }

    #[test]
    fn test_end_after_window_is_rejected() {
        let machine = listing(0.0, 0.0, 100.0);
        assert_eq!(
            validate_booking(&machine, jan1(17, 0), jan1(18, 30)),
            Err(BookingError::OutOfWindow)
        );
    }

    #[test]
    fn test_unavailable_listing_is_rejected_regardless_of_window() {
        let mut machine = listing(0.0, 0.0, 100.0);
        machine.is_available = false;

        for (start, end) in [
            (jan1(9, 0), jan1(10, 0)),
            (jan1(7, 0), jan1(10, 0)),
            (jan1(5, 0), jan1(23, 0)),
        ] {
            assert_eq!(
                validate_booking(&machine, start, end),
                Err(BookingError::NotAvailable)
            );
        }
    }

    #[test]
    fn test_window_in_other_offset_is_compared_as_instant() {
        let ist = chrono::FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let mut machine = listing(0.0, 0.0, 100.0);
        // 13:30 IST is 08:00 UTC
        machine.available_from = ist.with_ymd_and_hms(2025, 1, 1, 13, 30, 0).unwrap();

        assert_eq!(validate_booking(&machine, jan1(8, 0), jan1(9, 0)), Ok(()));
        assert_eq!(
            validate_booking(&machine, jan1(7, 59), jan1(9, 0)),
            Err(BookingError::OutOfWindow)
        );
    }

    #[test]
    fn test_overlapping_requests_both_pass() {
        let machine = listing(0.0, 0.0, 100.0);
        assert!(validate_booking(&machine, jan1(9, 0), jan1(12, 0)).is_ok());
        assert!(validate_booking(&machine, jan1(10, 0), jan1(11, 0)).is_ok());
    }

    #[test]
    fn test_quote_self_pickup_bills_fractional_hours() {
        let machine = listing(0.0, 0.0, 100.0);
        let total = quote_total(&machine, jan1(9, 0), jan1(10, 30), DeliveryType::SelfPickup);
        assert!((total - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_owner_delivery_adds_charge() {
        let mut machine = listing(0.0, 0.0, 100.0);
        machine.delivery_available = true;
        machine.delivery_charge = Some(250.0);

        let total = quote_total(&machine, jan1(9, 0), jan1(11, 0), DeliveryType::OwnerDelivery);
        assert!((total - 450.0).abs() < 1e-9);

        machine.delivery_charge = None;
        let total = quote_total(&machine, jan1(9, 0), jan1(11, 0), DeliveryType::OwnerDelivery);
        assert!((total - 200.0).abs() < 1e-9);
    }
}
