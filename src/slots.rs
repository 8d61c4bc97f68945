use crate::models::{BookingRow, BookingStatus};

/// Business hours: half-hour slots from 09:00 up to (exclusive) 18:00.
pub const OPENING_HOUR: u32 = 9;
pub const CLOSING_HOUR: u32 = 18;

/// The ordered half-hour grid for a business day: `09:00, 09:30, ..., 17:30`.
pub fn slot_grid() -> Vec<String> {
    (OPENING_HOUR..CLOSING_HOUR)
        .flat_map(|hour| [format!("{hour:02}:00"), format!("{hour:02}:30")])
        .collect()
}

pub fn is_valid_slot(time: &str) -> bool {
    slot_grid().iter().any(|slot| slot == time)
}

/// Remaining slots for `date`: the grid minus times taken by a non-cancelled
/// booking on that date. Pure and deterministic; may return empty, in which
/// case the caller must present a "no slots available" condition rather than
/// an empty selectable list.
pub fn available_slots(date: &str, bookings: &[BookingRow]) -> Vec<String> {
    let taken: Vec<&str> = bookings
        .iter()
        .filter(|booking| {
            booking.date == date
                && BookingStatus::parse(&booking.status) != Some(BookingStatus::Cancelled)
        })
        .map(|booking| booking.time.as_str())
        .collect();

    slot_grid()
        .into_iter()
        .filter(|slot| !taken.contains(&slot.as_str()))
        .collect()
}
