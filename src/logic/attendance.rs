use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entity::{
        attendance_record, holiday,
        sea_orm_active_enums::{AttendanceStatus, LeaveType},
    },
    error::AppResult,
    utils,
};

/// Outcome of a single calendar day for one employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Present,
    Late,
    Absent,
    Leave(LeaveType),
    Holiday,
    /// Today or later, never counted as an absence
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatus {
    pub date: NaiveDate,
    pub status: DayStatus,
    /// Holiday name, `weekend`, or the record's own notes
    pub note: Option<String>,
    pub clock_in: Option<DateTimeWithTimeZone>,
    pub clock_out: Option<DateTimeWithTimeZone>,
    pub late_minutes: i32,
    pub work_minutes: Option<i32>,
}

impl DailyStatus {
    fn bare(date: NaiveDate, status: DayStatus, note: Option<String>) -> Self {
        Self {
            date,
            status,
            note,
            clock_in: None,
            clock_out: None,
            late_minutes: 0,
            work_minutes: None,
        }
    }
}

/// Resolves what happened on `date`.
///
/// A stored record always wins, so an employee clocking in on a holiday is present.
/// Without a record the day is a holiday (listed or weekend), upcoming when it is
/// `today` or later, and absent otherwise.
pub fn resolve_day(
    date: NaiveDate,
    record: Option<&attendance_record::Model>,
    holiday: Option<&holiday::Model>,
    today: NaiveDate,
) -> DailyStatus {
    if let Some(record) = record {
        let status = match record.status {
            AttendanceStatus::Present | AttendanceStatus::Completed => DayStatus::Present,
            AttendanceStatus::Late => DayStatus::Late,
            AttendanceStatus::Absent => DayStatus::Absent,
            AttendanceStatus::Permit => DayStatus::Leave(LeaveType::Permit),
            AttendanceStatus::Sick => DayStatus::Leave(LeaveType::Sick),
            AttendanceStatus::PaidLeave => DayStatus::Leave(LeaveType::PaidLeave),
        };

        return DailyStatus {
            date,
            status,
            note: record.notes.clone(),
            clock_in: record.clock_in,
            clock_out: record.clock_out,
            late_minutes: record.late_minutes,
            work_minutes: record.work_minutes,
        };
    }

    if let Some(holiday) = holiday {
        return DailyStatus::bare(date, DayStatus::Holiday, Some(holiday.name.clone()));
    }

    if utils::is_weekend(date) {
        return DailyStatus::bare(date, DayStatus::Holiday, Some("weekend".to_owned()));
    }

    if date >= today {
        return DailyStatus::bare(date, DayStatus::Upcoming, None);
    }

    DailyStatus::bare(date, DayStatus::Absent, None)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecapSummary {
    /// Days that are neither weekend nor a listed holiday
    pub working_days: i64,
    /// On time and late days together
    pub present_days: i64,
    pub late_days: i64,
    pub absent_days: i64,
    pub permit_days: i64,
    pub sick_days: i64,
    pub paid_leave_days: i64,
    pub holiday_days: i64,
    pub upcoming_days: i64,
    pub total_late_minutes: i64,
    pub total_work_minutes: i64,
}

impl RecapSummary {
    pub fn leave_days(&self) -> i64 {
        self.permit_days + self.sick_days + self.paid_leave_days
    }

    fn count(&mut self, day: &DailyStatus) {
        match day.status {
            DayStatus::Present => self.present_days += 1,
            DayStatus::Late => {
                self.present_days += 1;
                self.late_days += 1;
            }
            DayStatus::Absent => self.absent_days += 1,
            DayStatus::Leave(LeaveType::Permit) => self.permit_days += 1,
            DayStatus::Leave(LeaveType::Sick) => self.sick_days += 1,
            DayStatus::Leave(LeaveType::PaidLeave) => self.paid_leave_days += 1,
            DayStatus::Holiday => self.holiday_days += 1,
            DayStatus::Upcoming => self.upcoming_days += 1,
        }

        self.total_late_minutes += day.late_minutes as i64;
        self.total_work_minutes += day.work_minutes.unwrap_or_default() as i64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecap {
    pub user_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailyStatus>,
    pub summary: RecapSummary,
}

/// Builds the month's recap of `user_id` from its attendance records.
///
/// Records of other users or outside the month are ignored.
pub fn build_recap(
    user_id: Uuid,
    year: i32,
    month: u32,
    records: &[attendance_record::Model],
    holidays: &[holiday::Model],
    today: NaiveDate,
) -> AppResult<MonthlyRecap> {
    let (start, end) = utils::month_range(year, month)?;

    let records = records
        .iter()
        .filter(|r| r.user_id == user_id)
        .map(|r| (r.date, r))
        .collect::<HashMap<_, _>>();

    let holidays = holidays
        .iter()
        .map(|h| (h.date, h))
        .collect::<HashMap<_, _>>();

    let mut summary = RecapSummary::default();
    let mut days = Vec::new();

    for date in utils::days_between(start, end) {
        let holiday = holidays.get(&date).copied();

        if holiday.is_none() && !utils::is_weekend(date) {
            summary.working_days += 1;
        }

        let day = resolve_day(date, records.get(&date).copied(), holiday, today);
        summary.count(&day);
        days.push(day);
    }

    Ok(MonthlyRecap {
        user_id,
        year,
        month,
        days,
        summary,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use chrono::{Local, TimeZone as _};

    pub(crate) fn record(user_id: Uuid, date: NaiveDate, status: AttendanceStatus) -> attendance_record::Model {
        let clock_in = match status {
            AttendanceStatus::Present | AttendanceStatus::Late | AttendanceStatus::Completed => {
                Some(Local.from_local_datetime(&date.and_hms_opt(8, 0, 0).unwrap()).unwrap().fixed_offset())
            }
            _ => None,
        };

        attendance_record::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            user_id,
            date,
            clock_in,
            clock_out: None,
            status,
            clock_in_latitude: None,
            clock_in_longitude: None,
            clock_out_latitude: None,
            clock_out_longitude: None,
            selfie_in_url: None,
            selfie_out_url: None,
            late_minutes: 0,
            work_minutes: None,
            leave_request_id: None,
            notes: None,
        }
    }

    pub(crate) fn holiday(date: NaiveDate, name: &str) -> holiday::Model {
        holiday::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            date,
            name: name.to_owned(),
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_resolve_day_prefers_record() {
        let user_id = Uuid::new_v4();
        let today = june(20);
        let holiday = holiday(june(17), "Idul Adha");

        let late = record(user_id, june(17), AttendanceStatus::Late);
        assert_eq!(resolve_day(june(17), Some(&late), Some(&holiday), today).status, DayStatus::Late);

        let completed = record(user_id, june(3), AttendanceStatus::Completed);
        assert_eq!(resolve_day(june(3), Some(&completed), None, today).status, DayStatus::Present);

        let sick = record(user_id, june(4), AttendanceStatus::Sick);
        assert_eq!(resolve_day(june(4), Some(&sick), None, today).status, DayStatus::Leave(LeaveType::Sick));

        let alpha = record(user_id, june(5), AttendanceStatus::Absent);
        assert_eq!(resolve_day(june(5), Some(&alpha), None, today).status, DayStatus::Absent);
    }

    #[test]
    fn test_resolve_day_without_record() {
        let today = june(12);
        let holiday = holiday(june(17), "Idul Adha");

        let listed = resolve_day(june(17), None, Some(&holiday), today);
        assert_eq!(listed.status, DayStatus::Holiday);
        assert_eq!(listed.note.as_deref(), Some("Idul Adha"));

        let saturday = resolve_day(june(8), None, None, today);
        assert_eq!(saturday.status, DayStatus::Holiday);
        assert_eq!(saturday.note.as_deref(), Some("weekend"));

        assert_eq!(resolve_day(june(11), None, None, today).status, DayStatus::Absent);
        assert_eq!(resolve_day(june(12), None, None, today).status, DayStatus::Upcoming);
        assert_eq!(resolve_day(june(13), None, None, today).status, DayStatus::Upcoming);
    }

    fn june_records(user_id: Uuid) -> Vec<attendance_record::Model> {
        let mut late = record(user_id, june(4), AttendanceStatus::Late);
        late.late_minutes = 20;
        late.work_minutes = Some(460);

        let mut completed = record(user_id, june(3), AttendanceStatus::Completed);
        completed.work_minutes = Some(480);

        vec![
            completed,
            late,
            record(user_id, june(5), AttendanceStatus::Permit),
            record(user_id, june(6), AttendanceStatus::Absent),
            // Somebody else's record, must be ignored
            record(Uuid::new_v4(), june(7), AttendanceStatus::Present),
            // Previous month, must be ignored
            record(user_id, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), AttendanceStatus::Present),
        ]
    }

    #[test]
    fn test_build_recap_closed_month() {
        let user_id = Uuid::new_v4();
        let holidays = [holiday(june(17), "Idul Adha")];

        let recap = build_recap(user_id, 2024, 6, &june_records(user_id), &holidays, june(30).succ_opt().unwrap()).unwrap();

        assert_eq!(recap.days.len(), 30);
        assert_eq!(recap.days[0].date, june(1));
        assert_eq!(
            recap.summary,
            RecapSummary {
                working_days: 19,
                present_days: 2,
                late_days: 1,
                absent_days: 16,
                permit_days: 1,
                sick_days: 0,
                paid_leave_days: 0,
                holiday_days: 11,
                upcoming_days: 0,
                total_late_minutes: 20,
                total_work_minutes: 940,
            }
        );
        assert_eq!(recap.summary.leave_days(), 1);
    }

    #[test]
    fn test_build_recap_running_month() {
        let user_id = Uuid::new_v4();
        let holidays = [holiday(june(17), "Idul Adha")];

        let recap = build_recap(user_id, 2024, 6, &june_records(user_id), &holidays, june(12)).unwrap();

        assert_eq!(recap.summary.working_days, 19);
        assert_eq!(recap.summary.absent_days, 4);
        assert_eq!(recap.summary.upcoming_days, 12);
        assert_eq!(recap.days[11].status, DayStatus::Upcoming);
    }

    #[test]
    fn test_build_recap_invalid_month() {
        assert!(build_recap(Uuid::new_v4(), 2024, 13, &[], &[], june(1)).is_err());
    }
}
