use clap::ValueEnum;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ValueEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "employee")]
    Employee,
}

/// Stored status of a single attendance record.
///
/// `Completed` is only reached from `Present` on clock-out, a late record keeps `Late`
/// after clock-out so the lateness survives into the monthly recap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "HADIR")]
    #[serde(rename = "HADIR")]
    Present,
    #[sea_orm(string_value = "TERLAMBAT")]
    #[serde(rename = "TERLAMBAT")]
    Late,
    #[sea_orm(string_value = "SELESAI")]
    #[serde(rename = "SELESAI")]
    Completed,
    #[sea_orm(string_value = "ALPHA")]
    #[serde(rename = "ALPHA")]
    Absent,
    #[sea_orm(string_value = "IZIN")]
    #[serde(rename = "IZIN")]
    Permit,
    #[sea_orm(string_value = "SAKIT")]
    #[serde(rename = "SAKIT")]
    Sick,
    #[sea_orm(string_value = "CUTI")]
    #[serde(rename = "CUTI")]
    PaidLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ValueEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_type")]
pub enum LeaveType {
    #[sea_orm(string_value = "IZIN")]
    #[serde(rename = "IZIN")]
    Permit,
    #[sea_orm(string_value = "SAKIT")]
    #[serde(rename = "SAKIT")]
    Sick,
    #[sea_orm(string_value = "CUTI")]
    #[serde(rename = "CUTI")]
    PaidLeave,
}

impl From<LeaveType> for AttendanceStatus {
    fn from(value: LeaveType) -> Self {
        match value {
            LeaveType::Permit => AttendanceStatus::Permit,
            LeaveType::Sick => AttendanceStatus::Sick,
            LeaveType::PaidLeave => AttendanceStatus::PaidLeave,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ValueEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ValueEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "allowance_calculation")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowanceCalculation {
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "PER_PRESENT_DAY")]
    PerPresentDay,
}

/// Decides how a deduction's value turns into an amount, see `logic::payroll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ValueEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "deduction_calculation")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeductionCalculation {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payroll_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    #[sea_orm(string_value = "PENDING_APPROVAL")]
    PendingApproval,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payslip_item_kind")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayslipItemKind {
    #[sea_orm(string_value = "ALLOWANCE")]
    Allowance,
    #[sea_orm(string_value = "DEDUCTION")]
    Deduction,
}
