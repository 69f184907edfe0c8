//! Day-rollover bookkeeping and overnight interest (§4.6).

use chrono::{Datelike, TimeZone, Utc, Weekday};
use rust_decimal::Decimal;

/// Source marks the 56-minute offset as unexplained; kept as a named,
/// documented constant rather than guessed away, per the open question.
pub const ROLLOVER_OFFSET_MINUTES: i64 = 56;

/// US/Eastern DST window: second Sunday of March through first Sunday of
/// November, both at 02:00 local. No `chrono-tz` dependency exists anywhere
/// in the retrieval pack, so the fixed UTC-4/UTC-5 offset is derived here
/// rather than imported, following the same "implement it from the
/// calendar primitives you already have" approach `chrono`-only code in the
/// pack uses elsewhere.
fn us_eastern_is_dst(date: chrono::NaiveDate) -> bool {
    let year = date.year();
    let second_sunday_march = nth_sunday(year, 3, 2);
    let first_sunday_november = nth_sunday(year, 11, 1);
    date >= second_sunday_march && date < first_sunday_november
}

fn nth_sunday(year: i32, month: u32, n: u32) -> chrono::NaiveDate {
    let first_of_month = chrono::NaiveDate::from_ymd_opt(year, month, 1).expect("valid calendar month");
    let first_weekday = first_of_month.weekday();
    let days_until_first_sunday = (7 - first_weekday.num_days_from_sunday()) % 7;
    first_of_month + chrono::Duration::days((days_until_first_sunday + 7 * (n - 1)) as i64)
}

/// Compute `rollover_time` for the given calendar day: 17:00 US/Eastern,
/// converted to UTC, minus the unexplained offset (§4.1 step 2). The offset
/// is a `Config::rollover_offset_minutes` value, not hard-coded, per the
/// "preserve as a configurable constant" instruction in §4.1.
pub fn rollover_time_for_day(day: chrono::NaiveDate, offset_minutes: i64) -> chrono::DateTime<Utc> {
    let offset_hours: i64 = if us_eastern_is_dst(day) { 4 } else { 5 };
    let naive = day.and_hms_opt(17, 0, 0).expect("17:00 is always a valid time");
    let utc_5pm_eastern = Utc.from_utc_datetime(&naive) + chrono::Duration::hours(offset_hours);
    utc_5pm_eastern - chrono::Duration::minutes(offset_minutes)
}

/// ISO weekday 3 (Wed) or 5 (Fri) triples the accumulated rollover.
pub fn weekday_multiplier(timestamp: chrono::DateTime<Utc>) -> Decimal {
    match timestamp.weekday() {
        Weekday::Wed | Weekday::Fri => Decimal::from(3),
        _ => Decimal::ONE,
    }
}

/// `rollover = mid * qty * rate * fx`, spread-marked-up by
/// `rollover - rollover * rollover_spread`, tripled on Wed/Fri.
pub fn compute_rollover(
    mid: Decimal,
    quantity: Decimal,
    overnight_rate: Decimal,
    fx: Decimal,
    rollover_spread: Decimal,
    timestamp: chrono::DateTime<Utc>,
) -> Decimal {
    let raw = mid * quantity * overnight_rate * fx;
    let spread_adjusted = raw - raw * rollover_spread;
    spread_adjusted * weekday_multiplier(timestamp)
}
