//! Booking Service: customer-submitted bookings and the admin status
//! lifecycle.
//!
//! Creation is the one public write in the system and always starts a booking
//! at `Pending`. Status updates are admin-only and permissive: any status may
//! move to any other, including backwards, so operator mistakes are
//! correctable without a support escape hatch.

use crate::auth::AdminIdentity;
use crate::catalog::resolver::subcategory_ref;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    Booking, BookingCreate, BookingStatus, BookingStatusUpdate, BookingView,
};
use crate::store::{Snapshot, Store, StoreError};
use chrono::Utc;
use tracing::info;

pub fn create_booking(store: &Store, payload: BookingCreate) -> ApiResult<BookingView> {
    let mut missing = Vec::new();
    if payload.subcategory_id.is_none() {
        missing.push("subcategoryId");
    }
    if payload.user_name.trim().is_empty() {
        missing.push("userName");
    }
    if payload.phone.trim().is_empty() {
        missing.push("phone");
    }
    if payload.location.trim().is_empty() {
        missing.push("location");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }
    let subcategory_id = payload.subcategory_id.expect("checked above");

    let now = Utc::now();
    let booking = Booking {
        id: crate::model::BookingId::generate(),
        subcategory_id,
        user_name: payload.user_name.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        location: payload.location.trim().to_string(),
        status: BookingStatus::Pending,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    let view = store.mutate(|s| {
        // Existence check and insert share one critical section so a racing
        // subcategory delete cannot leave a booking pointing at nothing at
        // creation time.
        if !s.subcategories.contains_key(booking.subcategory_id.as_str()) {
            return Err(StoreError::NotFound {
                entity: "subcategory",
            });
        }
        s.insert_booking(booking.clone());
        Ok(populate_booking(s, booking.clone()))
    })?;
    crate::metrics::METRICS.record_booking_created();
    info!(booking = %view.booking.id, subcategory = %view.booking.subcategory_id, "booking created");
    Ok(view)
}

/// All bookings, newest first, with subcategory references populated. A
/// dangling reference (subcategory deleted after the booking) simply yields
/// no populated subcategory.
pub fn list_bookings(store: &Store, _admin: &AdminIdentity) -> Vec<BookingView> {
    store.read(|s| {
        s.bookings
            .values()
            .rev()
            .map(|b| populate_booking(s, b.clone()))
            .collect()
    })
}

pub fn update_booking_status(
    store: &Store,
    admin: &AdminIdentity,
    payload: BookingStatusUpdate,
) -> ApiResult<BookingView> {
    let status = BookingStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::Validation("Invalid status".into()))?;

    let view = store.mutate(|s| {
        let booking = s
            .bookings
            .get_mut(payload.id.as_str())
            .ok_or(StoreError::NotFound { entity: "booking" })?;
        booking.status = status;
        if let Some(notes) = payload.notes.clone() {
            booking.notes = Some(notes);
        }
        booking.updated_at = Utc::now();
        let updated = booking.clone();
        Ok(populate_booking(s, updated))
    })?;
    info!(admin = %admin.username, booking = %view.booking.id, status = %view.booking.status, "booking status updated");
    Ok(view)
}

fn populate_booking(snapshot: &Snapshot, booking: Booking) -> BookingView {
    let subcategory = subcategory_ref(snapshot, booking.subcategory_id.as_str());
    BookingView {
        booking,
        subcategory,
    }
}
