use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::util::{default_table_statement, reference, DefaultColumn};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<RoleType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<AttendanceStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<LeaveType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<LeaveStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<AllowanceCalculation>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<DeductionCalculation>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayrollStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PayslipItemKind>()).await?;

        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::FullName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // sha256 of `password:username`
                .col(ColumnDef::new(User::Role)
                    .custom(RoleType::name())
                    .not_null())
                .col(ColumnDef::new(User::BaseSalary)
                    .decimal_len(19, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(User::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(TableCreateStatement::new()
                .if_not_exists()
                .table(AttendanceSetting::Table)
                .col(ColumnDef::new(AttendanceSetting::Id)
                    .integer()
                    .primary_key())
                .col(ColumnDef::new(AttendanceSetting::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()))
                .col(ColumnDef::new(AttendanceSetting::WorkStartTime)
                    .time()
                    .not_null())
                .col(ColumnDef::new(AttendanceSetting::WorkEndTime)
                    .time()
                    .not_null())
                .col(ColumnDef::new(AttendanceSetting::LateToleranceMinutes)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(AttendanceSetting::OfficeLatitude)
                    .double()
                    .not_null())
                .col(ColumnDef::new(AttendanceSetting::OfficeLongitude)
                    .double()
                    .not_null())
                .col(ColumnDef::new(AttendanceSetting::GeofenceRadiusMeters)
                    .double()
                    .not_null()
                    .default(0.0))
                .col(ColumnDef::new(AttendanceSetting::RequireSelfie)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(AttendanceSetting::UtcOffsetMinutes)
                    .integer()
                    .not_null())
                .take()
            ).await?;

        manager
            .create_table(TableCreateStatement::new()
                .if_not_exists()
                .table(Holiday::Table)
                .col(ColumnDef::new(DefaultColumn::Id)
                    .uuid()
                    .primary_key()
                    .default(Expr::cust("GEN_RANDOM_UUID()")))
                .col(ColumnDef::new(DefaultColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()))
                .col(ColumnDef::new(Holiday::Date)
                    .date()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(Holiday::Name)
                    .text()
                    .not_null())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(LeaveRequest::Table)
                .col(ColumnDef::new(LeaveRequest::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::LeaveType)
                    .custom(LeaveType::name())
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::StartDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::EndDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::Reason)
                    .text()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::AttachmentUrl)
                    .text())
                .col(ColumnDef::new(LeaveRequest::Status)
                    .custom(LeaveStatus::name())
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::ReviewedBy)
                    .uuid())
                .col(ColumnDef::new(LeaveRequest::ReviewedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(LeaveRequest::ReviewNote)
                    .text())
                .take()
            ).await?;
        manager.create_foreign_key(reference(LeaveRequest::Table, LeaveRequest::UserId, User::Table, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(reference(LeaveRequest::Table, LeaveRequest::ReviewedBy, User::Table, ForeignKeyAction::SetNull)).await?;

        manager
            .create_table(default_table_statement()
                .table(AttendanceRecord::Table)
                .col(ColumnDef::new(AttendanceRecord::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::ClockIn)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(AttendanceRecord::ClockOut)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(AttendanceRecord::Status)
                    .custom(AttendanceStatus::name())
                    .not_null())
                .col(ColumnDef::new(AttendanceRecord::ClockInLatitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::ClockInLongitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::ClockOutLatitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::ClockOutLongitude)
                    .double())
                .col(ColumnDef::new(AttendanceRecord::SelfieInUrl)
                    .text())
                .col(ColumnDef::new(AttendanceRecord::SelfieOutUrl)
                    .text())
                .col(ColumnDef::new(AttendanceRecord::LateMinutes)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(AttendanceRecord::WorkMinutes)
                    .integer())
                .col(ColumnDef::new(AttendanceRecord::LeaveRequestId)
                    .uuid())
                .col(ColumnDef::new(AttendanceRecord::Notes)
                    .text())
                .take()
            ).await?;
        manager.create_foreign_key(reference(AttendanceRecord::Table, AttendanceRecord::UserId, User::Table, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(reference(AttendanceRecord::Table, AttendanceRecord::LeaveRequestId, LeaveRequest::Table, ForeignKeyAction::SetNull)).await?;

        // One record per user and day
        manager
            .create_index(IndexCreateStatement::new()
                .name("idx_attendance_record_user_date")
                .table(AttendanceRecord::Table)
                .col(AttendanceRecord::UserId)
                .col(AttendanceRecord::Date)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(AllowanceType::Table)
                .col(ColumnDef::new(AllowanceType::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(AllowanceType::Description)
                    .text())
                .col(ColumnDef::new(AllowanceType::Calculation)
                    .custom(AllowanceCalculation::name())
                    .not_null())
                .col(ColumnDef::new(AllowanceType::DefaultAmount)
                    .decimal_len(19, 2)
                    .not_null())
                .col(ColumnDef::new(AllowanceType::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(DeductionType::Table)
                .col(ColumnDef::new(DeductionType::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(DeductionType::Description)
                    .text())
                .col(ColumnDef::new(DeductionType::Calculation)
                    .custom(DeductionCalculation::name())
                    .not_null())
                .col(ColumnDef::new(DeductionType::DefaultValue)
                    .decimal_len(19, 4)
                    .not_null())
                .col(ColumnDef::new(DeductionType::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(UserAllowance::Table)
                .col(ColumnDef::new(UserAllowance::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(UserAllowance::AllowanceTypeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(UserAllowance::Amount)
                    .decimal_len(19, 2))
                .take()
            ).await?;
        manager.create_foreign_key(reference(UserAllowance::Table, UserAllowance::UserId, User::Table, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(reference(UserAllowance::Table, UserAllowance::AllowanceTypeId, AllowanceType::Table, ForeignKeyAction::Cascade)).await?;
        manager
            .create_index(IndexCreateStatement::new()
                .name("idx_user_allowance_user_type")
                .table(UserAllowance::Table)
                .col(UserAllowance::UserId)
                .col(UserAllowance::AllowanceTypeId)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(UserDeduction::Table)
                .col(ColumnDef::new(UserDeduction::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(UserDeduction::DeductionTypeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(UserDeduction::Value)
                    .decimal_len(19, 4))
                .take()
            ).await?;
        manager.create_foreign_key(reference(UserDeduction::Table, UserDeduction::UserId, User::Table, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(reference(UserDeduction::Table, UserDeduction::DeductionTypeId, DeductionType::Table, ForeignKeyAction::Cascade)).await?;
        manager
            .create_index(IndexCreateStatement::new()
                .name("idx_user_deduction_user_type")
                .table(UserDeduction::Table)
                .col(UserDeduction::UserId)
                .col(UserDeduction::DeductionTypeId)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(PayrollRun::Table)
                .col(ColumnDef::new(PayrollRun::PeriodYear)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRun::PeriodMonth)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRun::PeriodStart)
                    .date()
                    .not_null())
                .col(ColumnDef::new(PayrollRun::PeriodEnd)
                    .date()
                    .not_null())
                .col(ColumnDef::new(PayrollRun::Status)
                    .custom(PayrollStatus::name())
                    .not_null())
                .col(ColumnDef::new(PayrollRun::CreatedBy)
                    .uuid())
                .col(ColumnDef::new(PayrollRun::ReviewedBy)
                    .uuid())
                .col(ColumnDef::new(PayrollRun::ReviewedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(PayrollRun::RejectionReason)
                    .text())
                .col(ColumnDef::new(PayrollRun::EmployeeCount)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(PayrollRun::TotalAllowances)
                    .decimal_len(19, 2)
                    .not_null())
                .col(ColumnDef::new(PayrollRun::TotalDeductions)
                    .decimal_len(19, 2)
                    .not_null())
                .col(ColumnDef::new(PayrollRun::TotalNet)
                    .decimal_len(19, 2)
                    .not_null())
                .take()
            ).await?;
        manager.create_foreign_key(reference(PayrollRun::Table, PayrollRun::CreatedBy, User::Table, ForeignKeyAction::SetNull)).await?;
        manager.create_foreign_key(reference(PayrollRun::Table, PayrollRun::ReviewedBy, User::Table, ForeignKeyAction::SetNull)).await?;

        // One live run per period, rejected runs may be regenerated
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_payroll_run_live_period"
                    ON "payroll_run" ("period_year", "period_month")
                    WHERE "status" <> 'REJECTED'"#,
            )
            .await?;

        manager
            .create_table(TableCreateStatement::new()
                .if_not_exists()
                .table(Payslip::Table)
                .col(ColumnDef::new(DefaultColumn::Id)
                    .uuid()
                    .primary_key()
                    .default(Expr::cust("GEN_RANDOM_UUID()")))
                .col(ColumnDef::new(DefaultColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()))
                .col(ColumnDef::new(Payslip::PayrollRunId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payslip::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payslip::BaseSalary)
                    .decimal_len(19, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::WorkingDays).integer().not_null())
                .col(ColumnDef::new(Payslip::PresentDays).integer().not_null())
                .col(ColumnDef::new(Payslip::LateDays).integer().not_null())
                .col(ColumnDef::new(Payslip::AbsentDays).integer().not_null())
                .col(ColumnDef::new(Payslip::LeaveDays).integer().not_null())
                .col(ColumnDef::new(Payslip::TotalAllowances)
                    .decimal_len(19, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::TotalDeductions)
                    .decimal_len(19, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::NetSalary)
                    .decimal_len(19, 2)
                    .not_null())
                .take()
            ).await?;
        manager.create_foreign_key(reference(Payslip::Table, Payslip::PayrollRunId, PayrollRun::Table, ForeignKeyAction::Cascade)).await?;
        manager.create_foreign_key(reference(Payslip::Table, Payslip::UserId, User::Table, ForeignKeyAction::Cascade)).await?;

        manager
            .create_table(TableCreateStatement::new()
                .if_not_exists()
                .table(PayslipItem::Table)
                .col(ColumnDef::new(DefaultColumn::Id)
                    .uuid()
                    .primary_key()
                    .default(Expr::cust("GEN_RANDOM_UUID()")))
                .col(ColumnDef::new(PayslipItem::PayslipId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PayslipItem::Kind)
                    .custom(PayslipItemKind::name())
                    .not_null())
                .col(ColumnDef::new(PayslipItem::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PayslipItem::Description)
                    .text())
                .col(ColumnDef::new(PayslipItem::Amount)
                    .decimal_len(19, 2)
                    .not_null())
                .take()
            ).await?;
        manager.create_foreign_key(reference(PayslipItem::Table, PayslipItem::PayslipId, Payslip::Table, ForeignKeyAction::Cascade)).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first
        let tables: [DynIden; 12] = [
            PayslipItem::Table.into_iden(),
            Payslip::Table.into_iden(),
            PayrollRun::Table.into_iden(),
            UserDeduction::Table.into_iden(),
            UserAllowance::Table.into_iden(),
            DeductionType::Table.into_iden(),
            AllowanceType::Table.into_iden(),
            AttendanceRecord::Table.into_iden(),
            LeaveRequest::Table.into_iden(),
            Holiday::Table.into_iden(),
            AttendanceSetting::Table.into_iden(),
            User::Table.into_iden(),
        ];

        for table in tables {
            manager.drop_table(
                TableDropStatement::new()
                    .table(table)
                    .if_exists()
                    .take()
            ).await?;
        }

        let types = [
            RoleType::name(),
            AttendanceStatus::name(),
            LeaveType::name(),
            LeaveStatus::name(),
            AllowanceCalculation::name(),
            DeductionCalculation::name(),
            PayrollStatus::name(),
            PayslipItemKind::name(),
        ];

        for name in types {
            manager
                .drop_type(
                    TypeDropStatement::new()
                        .name(name)
                        .if_exists()
                        .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum User {
    Table,
    Username,
    FullName,
    Password,
    Role,
    BaseSalary,
    IsActive,
}

#[derive(DeriveIden)]
pub(crate) enum AttendanceSetting {
    Table,
    Id,
    UpdatedAt,
    WorkStartTime,
    WorkEndTime,
    LateToleranceMinutes,
    OfficeLatitude,
    OfficeLongitude,
    GeofenceRadiusMeters,
    RequireSelfie,
    UtcOffsetMinutes,
}

#[derive(DeriveIden)]
enum Holiday {
    Table,
    Date,
    Name,
}

#[derive(DeriveIden)]
enum LeaveRequest {
    Table,
    UserId,
    LeaveType,
    StartDate,
    EndDate,
    Reason,
    AttachmentUrl,
    Status,
    ReviewedBy,
    ReviewedAt,
    ReviewNote,
}

#[derive(DeriveIden)]
enum AttendanceRecord {
    Table,
    UserId,
    Date,
    ClockIn,
    ClockOut,
    Status,
    ClockInLatitude,
    ClockInLongitude,
    ClockOutLatitude,
    ClockOutLongitude,
    SelfieInUrl,
    SelfieOutUrl,
    LateMinutes,
    WorkMinutes,
    LeaveRequestId,
    Notes,
}

#[derive(DeriveIden)]
enum AllowanceType {
    Table,
    Name,
    Description,
    Calculation,
    DefaultAmount,
    IsActive,
}

#[derive(DeriveIden)]
enum DeductionType {
    Table,
    Name,
    Description,
    Calculation,
    DefaultValue,
    IsActive,
}

#[derive(DeriveIden)]
enum UserAllowance {
    Table,
    UserId,
    AllowanceTypeId,
    Amount,
}

#[derive(DeriveIden)]
enum UserDeduction {
    Table,
    UserId,
    DeductionTypeId,
    Value,
}

#[derive(DeriveIden)]
enum PayrollRun {
    Table,
    PeriodYear,
    PeriodMonth,
    PeriodStart,
    PeriodEnd,
    Status,
    CreatedBy,
    ReviewedBy,
    ReviewedAt,
    RejectionReason,
    EmployeeCount,
    TotalAllowances,
    TotalDeductions,
    TotalNet,
}

#[derive(DeriveIden)]
enum Payslip {
    Table,
    PayrollRunId,
    UserId,
    BaseSalary,
    WorkingDays,
    PresentDays,
    LateDays,
    AbsentDays,
    LeaveDays,
    TotalAllowances,
    TotalDeductions,
    NetSalary,
}

#[derive(DeriveIden)]
enum PayslipItem {
    Table,
    PayslipId,
    Kind,
    Name,
    Description,
    Amount,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "employee")]
    Employee,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
enum AttendanceStatus {
    #[sea_orm(string_value = "HADIR")]
    Present,
    #[sea_orm(string_value = "TERLAMBAT")]
    Late,
    #[sea_orm(string_value = "SELESAI")]
    Completed,
    #[sea_orm(string_value = "ALPHA")]
    Absent,
    #[sea_orm(string_value = "IZIN")]
    Permit,
    #[sea_orm(string_value = "SAKIT")]
    Sick,
    #[sea_orm(string_value = "CUTI")]
    PaidLeave,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_type")]
enum LeaveType {
    #[sea_orm(string_value = "IZIN")]
    Permit,
    #[sea_orm(string_value = "SAKIT")]
    Sick,
    #[sea_orm(string_value = "CUTI")]
    PaidLeave,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
enum LeaveStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "allowance_calculation")]
enum AllowanceCalculation {
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "PER_PRESENT_DAY")]
    PerPresentDay,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "deduction_calculation")]
enum DeductionCalculation {
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "PERCENTAGE")]
    Percentage,
    #[sea_orm(string_value = "PER_LATE_DAY")]
    PerLateDay,
    #[sea_orm(string_value = "PER_ABSENCE_DAY")]
    PerAbsenceDay,
    #[sea_orm(string_value = "PERCENTAGE_OF_ABSENCE")]
    PercentageOfAbsence,
    #[sea_orm(string_value = "MANDATORY_PERCENTAGE")]
    MandatoryPercentage,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_status")]
enum PayrollStatus {
    #[sea_orm(string_value = "PENDING_APPROVAL")]
    PendingApproval,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payslip_item_kind")]
enum PayslipItemKind {
    #[sea_orm(string_value = "ALLOWANCE")]
    Allowance,
    #[sea_orm(string_value = "DEDUCTION")]
    Deduction,
}
