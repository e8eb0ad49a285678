use chrono::{Datelike as _, NaiveDate, NaiveTime};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::Admin,
    consts::{self, SETTING_ID},
    entity::{attendance_setting, holiday, prelude::*},
    error::{AppError, AppResult},
    services::now,
    utils,
};

/// Settings used while nobody has saved any
pub fn default_settings() -> attendance_setting::Model {
    attendance_setting::Model {
        id: SETTING_ID,
        updated_at: now(),
        work_start_time: consts::default_work_start(),
        work_end_time: consts::default_work_end(),
        late_tolerance_minutes: consts::DEFAULT_LATE_TOLERANCE_MINUTES,
        office_latitude: 0.0,
        office_longitude: 0.0,
        geofence_radius_meters: 0.0,
        require_selfie: false,
        utc_offset_minutes: consts::DEFAULT_UTC_OFFSET_MINUTES,
    }
}

pub async fn get_settings<C: ConnectionTrait>(db: &C) -> AppResult<attendance_setting::Model> {
    let settings = AttendanceSetting::find_by_id(SETTING_ID).one(db).await?;

    Ok(settings.unwrap_or_else(default_settings))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub work_start_time: Option<NaiveTime>,
    pub work_end_time: Option<NaiveTime>,
    pub late_tolerance_minutes: Option<i32>,
    pub office_latitude: Option<f64>,
    pub office_longitude: Option<f64>,
    pub geofence_radius_meters: Option<f64>,
    pub require_selfie: Option<bool>,
    pub utc_offset_minutes: Option<i32>,
}

impl SettingsUpdate {
    fn apply(self, settings: &mut attendance_setting::Model) -> AppResult<()> {
        if let Some(v) = self.work_start_time {
            settings.work_start_time = v;
        }
        if let Some(v) = self.work_end_time {
            settings.work_end_time = v;
        }
        if let Some(v) = self.late_tolerance_minutes {
            settings.late_tolerance_minutes = v;
        }
        if let Some(v) = self.office_latitude {
            settings.office_latitude = v;
        }
        if let Some(v) = self.office_longitude {
            settings.office_longitude = v;
        }
        if let Some(v) = self.geofence_radius_meters {
            settings.geofence_radius_meters = v;
        }
        if let Some(v) = self.require_selfie {
            settings.require_selfie = v;
        }
        if let Some(v) = self.utc_offset_minutes {
            settings.utc_offset_minutes = v;
        }

        validate(settings)
    }
}

fn validate(settings: &attendance_setting::Model) -> AppResult<()> {
    if settings.work_end_time <= settings.work_start_time {
        return Err(AppError::validation("work_end_time must be later than work_start_time"));
    }
    if settings.late_tolerance_minutes < 0 {
        return Err(AppError::validation("late_tolerance_minutes cannot be negative"));
    }
    if !(-90.0..=90.0).contains(&settings.office_latitude) || !(-180.0..=180.0).contains(&settings.office_longitude) {
        return Err(AppError::validation("office coordinates are out of range"));
    }
    if settings.geofence_radius_meters < 0.0 {
        return Err(AppError::validation("geofence_radius_meters cannot be negative"));
    }
    if settings.utc_offset_minutes.abs() >= 24 * 60 {
        return Err(AppError::validation("utc_offset_minutes must be within a day"));
    }

    Ok(())
}

#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn update_settings(db: &DatabaseConnection, admin: &Admin, update: SettingsUpdate) -> AppResult<attendance_setting::Model> {
    let existing = AttendanceSetting::find_by_id(SETTING_ID).one(db).await?;
    let exists = existing.is_some();

    let mut settings = existing.unwrap_or_else(default_settings);
    update.apply(&mut settings)?;
    settings.updated_at = now();

    let model = attendance_setting::ActiveModel {
        id: Set(settings.id),
        updated_at: Set(settings.updated_at),
        work_start_time: Set(settings.work_start_time),
        work_end_time: Set(settings.work_end_time),
        late_tolerance_minutes: Set(settings.late_tolerance_minutes),
        office_latitude: Set(settings.office_latitude),
        office_longitude: Set(settings.office_longitude),
        geofence_radius_meters: Set(settings.geofence_radius_meters),
        require_selfie: Set(settings.require_selfie),
        utc_offset_minutes: Set(settings.utc_offset_minutes),
    };

    let settings = if exists {
        model.update(db).await?
    } else {
        model.insert(db).await?
    };

    info!("attendance settings updated");

    Ok(settings)
}

pub async fn holidays_between<C: ConnectionTrait>(db: &C, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<holiday::Model>> {
    let holidays = Holiday::find()
        .filter(holiday::Column::Date.between(start, end))
        .order_by_asc(holiday::Column::Date)
        .all(db)
        .await?;

    Ok(holidays)
}

pub async fn holiday_on<C: ConnectionTrait>(db: &C, date: NaiveDate) -> AppResult<Option<holiday::Model>> {
    let holiday = Holiday::find()
        .filter(holiday::Column::Date.eq(date))
        .one(db)
        .await?;

    Ok(holiday)
}

/// Holidays of a whole year, or of one month when `month` is given
pub async fn list_holidays(db: &DatabaseConnection, year: i32, month: Option<u32>) -> AppResult<Vec<holiday::Model>> {
    let (start, end) = match month {
        Some(month) => utils::month_range(year, month)?,
        None => (utils::month_range(year, 1)?.0, utils::month_range(year, 12)?.1),
    };

    holidays_between(db, start, end).await
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn add_holiday(db: &DatabaseConnection, admin: &Admin, date: NaiveDate, name: String) -> AppResult<holiday::Model> {
    if name.trim().is_empty() {
        return Err(AppError::validation("holiday name is required"));
    }

    if let Some(existing) = holiday_on(db, date).await? {
        return Err(AppError::conflict(format!("{} is already a holiday ({})", date, existing.name)));
    }

    let holiday = holiday::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        date: Set(date),
        name: Set(name.trim().to_owned()),
    }
    .insert(db)
    .await?;

    info!(year = date.year(), "holiday added");

    Ok(holiday)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn remove_holiday(db: &DatabaseConnection, admin: &Admin, date: NaiveDate) -> AppResult<()> {
    let res = Holiday::delete_many()
        .filter(holiday::Column::Date.eq(date))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound("holiday"));
    }

    info!("holiday removed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::{auth::tests::user, entity::sea_orm_active_enums::RoleType};

    use super::*;

    fn admin() -> Admin {
        Admin::try_from(user("root", RoleType::Admin)).unwrap()
    }

    #[tokio::test]
    async fn test_get_settings_falls_back_to_defaults() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attendance_setting::Model>::new()])
            .into_connection();

        let settings = get_settings(&db).await.unwrap();
        assert_eq!(settings.work_start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(settings.late_tolerance_minutes, 15);
        assert_eq!(settings.geofence_radius_meters, 0.0);
    }

    #[tokio::test]
    async fn test_update_settings_rejects_inverted_hours() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![default_settings()]])
            .into_connection();

        let update = SettingsUpdate {
            work_end_time: NaiveTime::from_hms_opt(7, 0, 0),
            ..Default::default()
        };

        let res = update_settings(&db, &admin(), update).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_settings_inserts_singleton() {
        let mut saved = default_settings();
        saved.geofence_radius_meters = 150.0;
        saved.office_latitude = -6.2;
        saved.office_longitude = 106.8;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attendance_setting::Model>::new(), vec![saved.clone()]])
            .into_connection();

        let update = SettingsUpdate {
            geofence_radius_meters: Some(150.0),
            office_latitude: Some(-6.2),
            office_longitude: Some(106.8),
            ..Default::default()
        };

        let settings = update_settings(&db, &admin(), update).await.unwrap();
        assert_eq!(settings, saved);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
        assert!(format!("{:?}", log[1]).contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_add_holiday_rejects_duplicates() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 17).unwrap();

        let existing = holiday::Model {
            id: Uuid::new_v4(),
            created_at: now(),
            date,
            name: "Hari Kemerdekaan".to_owned(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .into_connection();

        let res = add_holiday(&db, &admin(), date, "Independence Day".to_owned()).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_remove_missing_holiday() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let res = remove_holiday(&db, &admin(), NaiveDate::from_ymd_opt(2024, 8, 17).unwrap()).await;
        assert!(matches!(res, Err(AppError::NotFound("holiday"))));
    }
}
