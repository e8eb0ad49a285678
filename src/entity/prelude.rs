pub use super::allowance_type::Entity as AllowanceType;
pub use super::attendance_record::Entity as AttendanceRecord;
pub use super::attendance_setting::Entity as AttendanceSetting;
pub use super::deduction_type::Entity as DeductionType;
pub use super::holiday::Entity as Holiday;
pub use super::leave_request::Entity as LeaveRequest;
pub use super::payroll_run::Entity as PayrollRun;
pub use super::payslip::Entity as Payslip;
pub use super::payslip_item::Entity as PayslipItem;
pub use super::user::Entity as User;
pub use super::user_allowance::Entity as UserAllowance;
pub use super::user_deduction::Entity as UserDeduction;
