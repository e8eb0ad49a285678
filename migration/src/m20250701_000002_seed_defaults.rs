use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::{
    m20250701_000001_init::{AttendanceSetting, User},
    util::DefaultColumn,
};

/// Fixed id of the bootstrap admin so `down` can find it again
const ADMIN_ID: u128 = 1;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Change the password right after the first login
        let hashed_password = &sha2::Sha256::digest("admin:admin")[..];

        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns([
                    DefaultColumn::Id.into_iden(),
                    User::Username.into_iden(),
                    User::FullName.into_iden(),
                    User::Password.into_iden(),
                    User::Role.into_iden(),
                    User::BaseSalary.into_iden(),
                ])
                .values_panic([
                    Expr::val(format!("{ADMIN_ID:032x}")).cast_as("uuid"),
                    "admin".into(),
                    "Administrator".into(),
                    hashed_password.into(),
                    Expr::val("admin").cast_as("role_type"),
                    0.into(),
                ])
                .to_owned()
        ).await?;

        // Office hours 08:00 - 17:00 WIB, 15 minutes of tolerance, no geofence yet
        manager
            .exec_stmt(Query::insert()
                .into_table(AttendanceSetting::Table)
                .columns([
                    AttendanceSetting::Id,
                    AttendanceSetting::WorkStartTime,
                    AttendanceSetting::WorkEndTime,
                    AttendanceSetting::LateToleranceMinutes,
                    AttendanceSetting::OfficeLatitude,
                    AttendanceSetting::OfficeLongitude,
                    AttendanceSetting::GeofenceRadiusMeters,
                    AttendanceSetting::RequireSelfie,
                    AttendanceSetting::UtcOffsetMinutes,
                ])
                .values_panic([
                    1.into(),
                    Expr::val("08:00:00").cast_as("time"),
                    Expr::val("17:00:00").cast_as("time"),
                    15.into(),
                    0.0.into(),
                    0.0.into(),
                    0.0.into(),
                    false.into(),
                    420.into(),
                ])
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete()
                .from_table(AttendanceSetting::Table)
                .and_where(Expr::col(AttendanceSetting::Id).eq(1))
                .to_owned()
        ).await?;

        manager
            .exec_stmt(Query::delete()
                .from_table(User::Table)
                .and_where(Expr::col(DefaultColumn::Id).eq(Expr::val(format!("{ADMIN_ID:032x}")).cast_as("uuid")))
                .to_owned()
        ).await?;

        Ok(())
    }
}
