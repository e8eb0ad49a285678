use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::Approver,
    entity::{
        attendance_record, leave_request,
        prelude::*,
        sea_orm_active_enums::{AttendanceStatus, LeaveStatus, LeaveType, RoleType},
        user,
    },
    error::{AppError, AppResult},
    services::{attendance, now, setting},
    utils,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct NewLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LeaveFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
}

pub async fn get<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<leave_request::Model> {
    LeaveRequest::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("leave request"))
}

#[instrument(skip(db, employee, new), fields(user = %employee.username))]
pub async fn submit(db: &DatabaseConnection, employee: &user::Model, new: NewLeave) -> AppResult<leave_request::Model> {
    if new.end_date < new.start_date {
        return Err(AppError::validation("end_date is earlier than start_date"));
    }
    if new.reason.trim().is_empty() {
        return Err(AppError::validation("reason is required"));
    }

    let overlapping = LeaveRequest::find()
        .filter(leave_request::Column::UserId.eq(employee.id))
        .filter(leave_request::Column::Status.is_in([LeaveStatus::Pending, LeaveStatus::Approved]))
        .filter(leave_request::Column::StartDate.lte(new.end_date))
        .filter(leave_request::Column::EndDate.gte(new.start_date))
        .one(db)
        .await?;

    if let Some(other) = overlapping {
        warn!(other = %other.id, "overlapping leave request");
        return Err(AppError::conflict(format!(
            "overlaps with a {:?} request from {} to {}",
            other.status, other.start_date, other.end_date
        )));
    }

    let leave = leave_request::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        updated_at: Set(now()),
        user_id: Set(employee.id),
        leave_type: Set(new.leave_type),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        reason: Set(new.reason.trim().to_owned()),
        attachment_url: Set(new.attachment_url),
        status: Set(LeaveStatus::Pending),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        review_note: Set(None),
    }
    .insert(db)
    .await?;

    info!(leave_id = %leave.id, "leave request submitted");

    Ok(leave)
}

/// Moves a pending request to `status`. The UPDATE only matches while the
/// request is still pending, so a concurrent review leaves it untouched.
async fn review<C: ConnectionTrait>(
    db: &C,
    approver: &Approver,
    id: Uuid,
    status: LeaveStatus,
    note: Option<String>,
) -> AppResult<leave_request::Model> {
    let leave = get(db, id).await?;

    if leave.status != LeaveStatus::Pending {
        return Err(AppError::LeaveNotPending(leave.status));
    }
    if leave.user_id == approver.id {
        return Err(AppError::Forbidden("cannot review your own leave request"));
    }

    let res = LeaveRequest::update_many()
        .set(leave_request::ActiveModel {
            updated_at: Set(now()),
            status: Set(status),
            reviewed_by: Set(Some(approver.id)),
            reviewed_at: Set(Some(now())),
            review_note: Set(note),
            ..Default::default()
        })
        .filter(leave_request::Column::Id.eq(id))
        .filter(leave_request::Column::Status.eq(LeaveStatus::Pending))
        .exec(db)
        .await?;

    let leave = get(db, id).await?;

    if res.rows_affected == 0 {
        warn!(status = ?leave.status, "leave request is no longer pending");
        return Err(AppError::LeaveNotPending(leave.status));
    }

    Ok(leave)
}

/// Attendance records standing in for the working days of an approved leave.
///
/// Weekends, holidays and days that already have a record are left alone.
pub fn leave_records(
    leave: &leave_request::Model,
    holidays: &[NaiveDate],
    existing: &[attendance_record::Model],
) -> Vec<attendance_record::ActiveModel> {
    let status = AttendanceStatus::from(leave.leave_type);

    utils::days_between(leave.start_date, leave.end_date)
        .filter(|date| !utils::is_weekend(*date) && !holidays.contains(date))
        .filter(|date| !existing.iter().any(|r| r.date == *date))
        .map(|date| attendance_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now()),
            updated_at: Set(now()),
            user_id: Set(leave.user_id),
            date: Set(date),
            clock_in: Set(None),
            clock_out: Set(None),
            status: Set(status),
            clock_in_latitude: Set(None),
            clock_in_longitude: Set(None),
            clock_out_latitude: Set(None),
            clock_out_longitude: Set(None),
            selfie_in_url: Set(None),
            selfie_out_url: Set(None),
            late_minutes: Set(0),
            work_minutes: Set(None),
            leave_request_id: Set(Some(leave.id)),
            notes: Set(Some(leave.reason.clone())),
        })
        .collect()
}

#[instrument(skip(db, approver, note), fields(approver = %approver.username))]
pub async fn approve(db: &DatabaseConnection, approver: &Approver, id: Uuid, note: Option<String>) -> AppResult<leave_request::Model> {
    let txn = db.begin().await?;

    let leave = review(&txn, approver, id, LeaveStatus::Approved, note).await?;

    let holidays = setting::holidays_between(&txn, leave.start_date, leave.end_date)
        .await?
        .into_iter()
        .map(|h| h.date)
        .collect::<Vec<_>>();
    let existing = attendance::records_between(&txn, &[leave.user_id], leave.start_date, leave.end_date).await?;

    let records = leave_records(&leave, &holidays, &existing);
    let days = records.len();

    if !records.is_empty() {
        AttendanceRecord::insert_many(records).exec_without_returning(&txn).await?;
    }

    txn.commit().await?;

    info!(days, "leave request approved");

    Ok(leave)
}

#[instrument(skip(db, approver, note), fields(approver = %approver.username))]
pub async fn reject(db: &DatabaseConnection, approver: &Approver, id: Uuid, note: Option<String>) -> AppResult<leave_request::Model> {
    let leave = review(db, approver, id, LeaveStatus::Rejected, note).await?;

    info!("leave request rejected");

    Ok(leave)
}

/// Withdraws a request that nobody reviewed yet
#[instrument(skip(db, employee), fields(user = %employee.username))]
pub async fn cancel(db: &DatabaseConnection, employee: &user::Model, id: Uuid) -> AppResult<()> {
    let leave = get(db, id).await?;

    if leave.user_id != employee.id {
        return Err(AppError::Forbidden("cannot cancel another employee's leave request"));
    }
    if leave.status != LeaveStatus::Pending {
        return Err(AppError::LeaveNotPending(leave.status));
    }

    LeaveRequest::delete_by_id(leave.id).exec(db).await?;

    info!("leave request cancelled");

    Ok(())
}

/// Employees only ever see their own requests, whatever the filter says
pub async fn list(db: &DatabaseConnection, actor: &user::Model, filter: LeaveFilter) -> AppResult<Vec<leave_request::Model>> {
    let user_id = match actor.role {
        RoleType::Employee => Some(actor.id),
        _ => filter.user_id,
    };

    let mut query = LeaveRequest::find().order_by_desc(leave_request::Column::StartDate);

    if let Some(user_id) = user_id {
        query = query.filter(leave_request::Column::UserId.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(leave_request::Column::Status.eq(status));
    }

    Ok(query.all(db).await?)
}
