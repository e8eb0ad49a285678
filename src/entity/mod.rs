pub mod prelude;

pub mod allowance_type;
pub mod attendance_record;
pub mod attendance_setting;
pub mod deduction_type;
pub mod holiday;
pub mod leave_request;
pub mod payroll_run;
pub mod payslip;
pub mod payslip_item;
pub mod sea_orm_active_enums;
pub mod user;
pub mod user_allowance;
pub mod user_deduction;
