use chrono::{DateTime, Datelike as _, FixedOffset, NaiveDate, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    consts::{EARTH_RADIUS_METERS, MONEY_DECIMAL_PLACES},
    error::{AppError, AppResult},
};

/// First and last calendar day of the month
pub fn month_range(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("invalid period {year}-{month:02}")))?;

    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    let end = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::validation(format!("invalid period {year}-{month:02}")))?;

    Ok((start, end))
}

/// Every day from `start` to `end`, both inclusive
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Shifts `time` into the office time zone
pub fn to_office_time(time: &DateTime<FixedOffset>, utc_offset_minutes: i32) -> AppResult<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .ok_or_else(|| AppError::Config(format!("invalid UTC offset of {utc_offset_minutes} minutes")))?;

    Ok(time.with_timezone(&offset))
}

/// Great-circle distance between two coordinates (haversine)
pub fn distance_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}
