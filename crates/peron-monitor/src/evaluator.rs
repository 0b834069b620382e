//! Availability evaluation over upstream search responses.
//!
//! Pure and deterministic: given one response and a time-of-day filter, decide
//! whether a notifiable seat exists and render the per-train listing. No
//! network, no timers.

use chrono::{FixedOffset, TimeZone, Timelike, Utc};
use peron_tcdd::{Train, TrainResponse};

/// Sentinel value meaning "no filter" when set for both bounds.
pub const NO_FILTER: i32 = -1;

/// Cabin class whose fare/seat info wins over the train-level minimum price.
const ECONOMY_CABIN: &str = "EKONOMİ";

/// Below this many remaining seats the listing carries a low-stock marker.
const LOW_SEAT_THRESHOLD: u32 = 5;

/// TCDD timetables are Turkey-local; departure epochs are rendered at UTC+3.
const TIMETABLE_UTC_OFFSET_SECS: i32 = 3 * 3600;

/// Inclusive minute-of-day window for departures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartureFilter {
    start: i32,
    end: i32,
}

impl DepartureFilter {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Whether this filter accepts every departure time.
    pub fn is_open(&self) -> bool {
        self.start == NO_FILTER && self.end == NO_FILTER
    }

    /// Whether a departure at the given minute of day passes the filter.
    pub fn accepts(&self, minute: i32) -> bool {
        self.is_open() || (minute >= self.start && minute <= self.end)
    }
}

/// Result of evaluating one search response.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Whether any train has a notifiable (strictly positive) seat count.
    pub found: bool,
    /// One formatted line per notifiable train.
    pub listing: String,
}

/// Evaluate a search response against a departure filter.
pub fn evaluate(response: &TrainResponse, filter: DepartureFilter) -> Evaluation {
    let mut lines = Vec::new();

    for leg in &response.train_legs {
        for availability in &leg.train_availabilities {
            for train in &availability.trains {
                let Some(minute) = departure_minute(train) else {
                    continue;
                };
                if !filter.accepts(minute) {
                    continue;
                }

                let (seats, price) = economy_offer(train);
                if seats == 0 {
                    continue;
                }
                lines.push(format_line(train, minute, seats, price));
            }
        }
    }

    Evaluation {
        found: !lines.is_empty(),
        listing: lines.join("\n"),
    }
}

/// Economy seat count and price for one train.
///
/// The `EKONOMİ` cabin entry wins when present; otherwise the price falls
/// back to the train-level minimum while the seat count stays whatever the
/// cabin lookup yielded.
fn economy_offer(train: &Train) -> (u32, f64) {
    let mut seats = 0u32;
    let mut price = 0.0;
    let mut cabin_seen = false;

    for fare in &train.available_fare_info {
        for cabin in &fare.cabin_classes {
            if cabin
                .cabin_class
                .as_ref()
                .is_some_and(|c| c.name == ECONOMY_CABIN)
            {
                seats = cabin.availability_count.max(0.0) as u32;
                price = cabin.min_price;
                cabin_seen = true;
            }
        }
    }

    if !cabin_seen && let Some(min) = &train.min_price {
        price = min.price_amount;
    }

    (seats, price)
}

/// Minute of day of the first segment's departure, timetable-local.
fn departure_minute(train: &Train) -> Option<i32> {
    let ms = train.segments.first()?.departure_time;
    let utc = Utc.timestamp_millis_opt(ms).single()?;
    let offset = FixedOffset::east_opt(TIMETABLE_UTC_OFFSET_SECS)?;
    let local = utc.with_timezone(&offset);
    Some((local.hour() * 60 + local.minute()) as i32)
}

fn format_line(train: &Train, minute: i32, seats: u32, price: f64) -> String {
    let marker = if seats < LOW_SEAT_THRESHOLD {
        " (son koltuklar!)"
    } else {
        ""
    };
    format!(
        "{:02}:{:02} {} | {} koltuk{} | {:.2} TL",
        minute / 60,
        minute % 60,
        train.name,
        seats,
        marker,
        price
    )
}
