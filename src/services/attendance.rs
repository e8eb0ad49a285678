use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{self, Approver},
    consts::MAX_CLOCK_SKEW_MINUTES,
    entity::{
        attendance_record, attendance_setting,
        prelude::*,
        sea_orm_active_enums::AttendanceStatus,
        user,
    },
    error::{AppError, AppResult},
    logic::attendance::{self as logic, DailyStatus, MonthlyRecap, RecapSummary},
    services::{now, setting, user as users},
    utils,
};

pub use model::*;

mod model;

/// Status and late minutes for a clock-in at `time` (office time).
///
/// Late only once past start + tolerance, but lateness is then counted from the start.
pub fn evaluate_clock_in(settings: &attendance_setting::Model, time: NaiveTime) -> (AttendanceStatus, i32) {
    let start = settings.work_start_time;
    let minutes_after_start = (time - start).num_minutes();

    if minutes_after_start > settings.late_tolerance_minutes as i64 {
        (AttendanceStatus::Late, minutes_after_start as i32)
    } else {
        (AttendanceStatus::Present, 0)
    }
}

fn check_location(settings: &attendance_setting::Model, latitude: Option<f64>, longitude: Option<f64>) -> AppResult<()> {
    if settings.geofence_radius_meters <= 0.0 {
        return Ok(());
    }

    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(AppError::validation("location is required to clock in or out"));
    };

    let distance_meters = utils::distance_meters(
        (latitude, longitude),
        (settings.office_latitude, settings.office_longitude),
    );

    if distance_meters > settings.geofence_radius_meters {
        return Err(AppError::OutsideGeofence {
            distance_meters,
            radius_meters: settings.geofence_radius_meters,
        });
    }

    Ok(())
}

fn check_clock(at: &DateTime<FixedOffset>, received_at: &DateTime<FixedOffset>) -> AppResult<()> {
    let skew_minutes = (*at - *received_at).num_minutes().abs();

    if skew_minutes > MAX_CLOCK_SKEW_MINUTES {
        return Err(AppError::validation(format!(
            "clock time {at} is {skew_minutes} minutes away from the time it was received"
        )));
    }

    Ok(())
}

fn check_selfie(settings: &attendance_setting::Model, selfie_url: &Option<String>) -> AppResult<()> {
    if settings.require_selfie && selfie_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
        return Err(AppError::validation("a selfie is required"));
    }

    Ok(())
}

async fn record_on<C: ConnectionTrait>(db: &C, user_id: Uuid, date: NaiveDate) -> AppResult<Option<attendance_record::Model>> {
    let record = AttendanceRecord::find()
        .filter(attendance_record::Column::UserId.eq(user_id))
        .filter(attendance_record::Column::Date.eq(date))
        .one(db)
        .await?;

    Ok(record)
}

/// Records of `user_ids` between `start` and `end`, both inclusive
pub async fn records_between<C: ConnectionTrait>(
    db: &C,
    user_ids: &[Uuid],
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<attendance_record::Model>> {
    let records = AttendanceRecord::find()
        .filter(attendance_record::Column::UserId.is_in(user_ids.iter().copied()))
        .filter(attendance_record::Column::Date.between(start, end))
        .order_by_asc(attendance_record::Column::Date)
        .all(db)
        .await?;

    Ok(records)
}

#[instrument(skip(db, employee, payload), fields(user = %employee.username))]
pub async fn clock_in(
    db: &DatabaseConnection,
    employee: &user::Model,
    payload: ClockIn,
    received_at: DateTime<FixedOffset>,
) -> AppResult<attendance_record::Model> {
    if !employee.is_active {
        return Err(AppError::Forbidden("account is deactivated"));
    }
    if let Err(err) = check_clock(&payload.at, &received_at) {
        warn!(%err, "clock-in rejected");
        return Err(err);
    }

    let settings = setting::get_settings(db).await?;
    let local = utils::to_office_time(&payload.at, settings.utc_offset_minutes)?;
    let date = local.date_naive();

    if utils::is_weekend(date) {
        return Err(AppError::validation("cannot clock in on weekend"));
    }

    if let Some(holiday) = setting::holiday_on(db, date).await? {
        return Err(AppError::validation(format!("cannot clock in on a holiday ({})", holiday.name)));
    }

    if let Some(existing) = record_on(db, employee.id, date).await? {
        return Err(match existing.status {
            AttendanceStatus::Permit | AttendanceStatus::Sick | AttendanceStatus::PaidLeave => {
                AppError::conflict(format!("you are on leave on {date}"))
            }
            AttendanceStatus::Absent => AppError::conflict(format!("{date} is already marked as absent")),
            _ => AppError::conflict("you have already clocked in today"),
        });
    }

    check_selfie(&settings, &payload.selfie_url)?;
    if let Err(err) = check_location(&settings, payload.latitude, payload.longitude) {
        warn!(%err, "clock-in rejected");
        return Err(err);
    }

    let (status, late_minutes) = evaluate_clock_in(&settings, local.time());

    let record = attendance_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        updated_at: Set(now()),
        user_id: Set(employee.id),
        date: Set(date),
        clock_in: Set(Some(local)),
        clock_out: Set(None),
        status: Set(status),
        clock_in_latitude: Set(payload.latitude),
        clock_in_longitude: Set(payload.longitude),
        clock_out_latitude: Set(None),
        clock_out_longitude: Set(None),
        selfie_in_url: Set(payload.selfie_url),
        selfie_out_url: Set(None),
        late_minutes: Set(late_minutes),
        work_minutes: Set(None),
        leave_request_id: Set(None),
        notes: Set(None),
    }
    .insert(db)
    .await?;

    info!(%date, ?status, late_minutes, "clocked in");

    Ok(record)
}

#[instrument(skip(db, employee, payload), fields(user = %employee.username))]
pub async fn clock_out(
    db: &DatabaseConnection,
    employee: &user::Model,
    payload: ClockOut,
    received_at: DateTime<FixedOffset>,
) -> AppResult<attendance_record::Model> {
    if let Err(err) = check_clock(&payload.at, &received_at) {
        warn!(%err, "clock-out rejected");
        return Err(err);
    }

    let settings = setting::get_settings(db).await?;
    let local = utils::to_office_time(&payload.at, settings.utc_offset_minutes)?;

    let record = match record_on(db, employee.id, local.date_naive()).await? {
        Some(record) => Some(record),
        // Shifts that run past midnight close yesterday's record
        None => match local.date_naive().pred_opt() {
            Some(yesterday) => record_on(db, employee.id, yesterday).await?.filter(|r| r.is_open()),
            None => None,
        },
    };
    let Some(record) = record else {
        return Err(AppError::validation("you have not clocked in today"));
    };
    let date = record.date;

    let Some(clock_in) = record.clock_in else {
        return Err(AppError::conflict(format!("there is no clock-in on {date}")));
    };

    if !record.is_open() {
        return Err(AppError::conflict("you have already clocked out today"));
    }

    if local < clock_in {
        return Err(AppError::validation("clock-out cannot be earlier than clock-in"));
    }

    check_selfie(&settings, &payload.selfie_url)?;
    if let Err(err) = check_location(&settings, payload.latitude, payload.longitude) {
        warn!(%err, "clock-out rejected");
        return Err(err);
    }

    let status = match record.status {
        AttendanceStatus::Present => AttendanceStatus::Completed,
        status => status,
    };
    let work_minutes = (local - clock_in).num_minutes() as i32;

    let record = attendance_record::ActiveModel {
        id: Unchanged(record.id),
        updated_at: Set(now()),
        clock_out: Set(Some(local)),
        clock_out_latitude: Set(payload.latitude),
        clock_out_longitude: Set(payload.longitude),
        selfie_out_url: Set(payload.selfie_url),
        status: Set(status),
        work_minutes: Set(Some(work_minutes)),
        ..Default::default()
    }
    .update(db)
    .await?;

    info!(%date, work_minutes, "clocked out");

    Ok(record)
}

/// Records an unexcused absence for a day without any attendance
#[instrument(skip(db, approver, notes), fields(approver = %approver.username))]
pub async fn mark_absent(
    db: &DatabaseConnection,
    approver: &Approver,
    user_id: Uuid,
    date: NaiveDate,
    notes: Option<String>,
) -> AppResult<attendance_record::Model> {
    users::get(db, user_id).await?;

    if record_on(db, user_id, date).await?.is_some() {
        return Err(AppError::conflict(format!("there is already an attendance record on {date}")));
    }

    let record = attendance_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        updated_at: Set(now()),
        user_id: Set(user_id),
        date: Set(date),
        clock_in: Set(None),
        clock_out: Set(None),
        status: Set(AttendanceStatus::Absent),
        clock_in_latitude: Set(None),
        clock_in_longitude: Set(None),
        clock_out_latitude: Set(None),
        clock_out_longitude: Set(None),
        selfie_in_url: Set(None),
        selfie_out_url: Set(None),
        late_minutes: Set(0),
        work_minutes: Set(None),
        leave_request_id: Set(None),
        notes: Set(notes),
    }
    .insert(db)
    .await?;

    info!("marked absent");

    Ok(record)
}

pub async fn daily_status(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: Uuid,
    date: NaiveDate,
    today: NaiveDate,
) -> AppResult<DailyStatus> {
    auth::ensure_can_view(actor, user_id)?;

    let record = record_on(db, user_id, date).await?;
    let holiday = setting::holiday_on(db, date).await?;

    Ok(logic::resolve_day(date, record.as_ref(), holiday.as_ref(), today))
}

pub async fn monthly_recap(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: Uuid,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> AppResult<MonthlyRecap> {
    auth::ensure_can_view(actor, user_id)?;

    let (start, end) = utils::month_range(year, month)?;
    let records = records_between(db, &[user_id], start, end).await?;
    let holidays = setting::holidays_between(db, start, end).await?;

    logic::build_recap(user_id, year, month, &records, &holidays, today)
}

/// Month summary of every active employee
pub async fn monthly_recap_all(
    db: &DatabaseConnection,
    approver: &Approver,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> AppResult<RecapOverview> {
    let (start, end) = utils::month_range(year, month)?;

    let employees = users::active_employees(db).await?;
    let ids = employees.iter().map(|e| e.id).collect::<Vec<_>>();

    let records = records_between(db, &ids, start, end).await?;
    let holidays = setting::holidays_between(db, start, end).await?;

    let recaps = employees
        .into_iter()
        .map(|employee| {
            let recap = logic::build_recap(employee.id, year, month, &records, &holidays, today)?;

            Ok(EmployeeRecap {
                user_id: employee.id,
                username: employee.username,
                full_name: employee.full_name,
                summary: recap.summary,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    info!(approver = %approver.username, employees = recaps.len(), "monthly recap built");

    Ok(RecapOverview { year, month, recaps })
}

pub async fn history(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<attendance_record::Model>> {
    auth::ensure_can_view(actor, user_id)?;

    if to < from {
        return Err(AppError::validation("`to` is earlier than `from`"));
    }

    records_between(db, &[user_id], from, to).await
}
