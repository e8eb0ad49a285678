use chrono::NaiveTime;

/// Primary key of the `attendance_setting` singleton row
pub const SETTING_ID: i32 = 1;

/// Office hours used when no `attendance_setting` row exists yet, (hour, minute)
pub const DEFAULT_WORK_START: (u32, u32) = (8, 0);
pub const DEFAULT_WORK_END: (u32, u32) = (17, 0);
pub const DEFAULT_LATE_TOLERANCE_MINUTES: i32 = 15;

/// WIB, UTC+7
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

/// How far a device clock may drift from the time a clock-in reaches us
pub const MAX_CLOCK_SKEW_MINUTES: i64 = 5;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const MONEY_DECIMAL_PLACES: u32 = 2;

pub const DEFAULT_LOG_PATH: &str = "trace.log";

pub fn default_work_start() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_WORK_START.0, DEFAULT_WORK_START.1, 0).unwrap_or(NaiveTime::MIN)
}

pub fn default_work_end() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_WORK_END.0, DEFAULT_WORK_END.1, 0).unwrap_or(NaiveTime::MIN)
}
