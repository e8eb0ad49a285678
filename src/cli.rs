use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait as _};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{self, Admin, Approver},
    entity::{
        sea_orm_active_enums::{AllowanceCalculation, DeductionCalculation, LeaveStatus, LeaveType, RoleType},
        user,
    },
    error::{AppError, AppResult},
    services::{
        attendance::{self, ClockIn},
        compensation::{self, AllowanceTypeUpdate, DeductionTypeUpdate, NewAllowanceType, NewDeductionType},
        leave::{self, LeaveFilter, NewLeave},
        now, payroll,
        setting::{self, SettingsUpdate},
        user::{self as users, NewUser, UserUpdate},
    },
    utils,
};

/// Attendance and payroll management
#[derive(Parser, Debug)]
#[command(name = "attendance-payroll", version, about)]
pub struct Cli {
    /// Username of the acting account
    #[arg(long, short = 'u', global = true, env = "ATTENDANCE_USERNAME")]
    pub username: Option<String>,

    /// Password of the acting account
    #[arg(long, short = 'p', global = true, env = "ATTENDANCE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Database schema management, needs no login
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    #[command(flatten)]
    Account(AccountCommand),
}

/// Commands run on behalf of the logged in user
#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Clock in/out, daily status and monthly recap
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },
    /// Leave requests and their review
    Leave {
        #[command(subcommand)]
        action: LeaveAction,
    },
    /// Payroll runs and payslips
    Payroll {
        #[command(subcommand)]
        action: PayrollAction,
    },
    /// User accounts (admin)
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Allowance types and their assignment (admin)
    Allowance {
        #[command(subcommand)]
        action: AllowanceAction,
    },
    /// Deduction types and their assignment (admin)
    Deduction {
        #[command(subcommand)]
        action: DeductionAction,
    },
    /// Office hours, geofence and selfie rules
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Public holidays
    Holiday {
        #[command(subcommand)]
        action: HolidayAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Apply pending migrations
    Migrate,
    /// Roll back the last migration
    Rollback,
    /// List applied and pending migrations
    Status,
}

#[derive(Subcommand, Debug)]
pub enum AttendanceAction {
    ClockIn {
        #[command(flatten)]
        position: Position,
    },
    ClockOut {
        #[command(flatten)]
        position: Position,
    },
    /// Record an unexcused absence (admin or manager)
    MarkAbsent {
        user_id: Uuid,
        date: NaiveDate,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Status of a single day, today by default
    Status {
        #[arg(long)]
        user: Option<Uuid>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Recap {
        year: i32,
        month: u32,
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Recap summary of every active employee (admin or manager)
    RecapAll {
        year: i32,
        month: u32,
    },
    History {
        from: NaiveDate,
        to: NaiveDate,
        #[arg(long)]
        user: Option<Uuid>,
    },
}

#[derive(clap::Args, Debug)]
pub struct Position {
    /// RFC 3339 device timestamp, now by default. Must be within a few minutes of now.
    #[arg(long)]
    at: Option<DateTime<FixedOffset>>,
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    lng: Option<f64>,
    /// Location of the uploaded selfie
    #[arg(long)]
    selfie: Option<String>,
}

impl From<Position> for ClockIn {
    fn from(position: Position) -> Self {
        ClockIn {
            at: position.at.unwrap_or_else(now),
            latitude: position.lat,
            longitude: position.lng,
            selfie_url: position.selfie,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LeaveAction {
    Submit {
        #[arg(value_enum)]
        leave_type: LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        attachment: Option<String>,
    },
    Approve {
        id: Uuid,
        #[arg(long)]
        note: Option<String>,
    },
    Reject {
        id: Uuid,
        #[arg(long)]
        note: Option<String>,
    },
    /// Withdraw your own pending request
    Cancel { id: Uuid },
    List {
        #[arg(long)]
        user: Option<Uuid>,
        #[arg(long, value_enum)]
        status: Option<LeaveStatus>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PayrollAction {
    Generate { year: i32, month: u32 },
    Approve { id: Uuid },
    Reject {
        id: Uuid,
        #[arg(long)]
        reason: String,
    },
    Show { id: Uuid },
    List {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Payslips of a run
    Payslips { run_id: Uuid },
    /// A payslip with its lines
    Payslip { id: Uuid },
    /// Payslips of approved runs, your own by default
    Mine {
        #[arg(long)]
        user: Option<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    Create {
        #[arg(value_name = "USERNAME")]
        account: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        new_password: String,
        #[arg(long, value_enum, default_value = "employee")]
        role: RoleType,
        #[arg(long, default_value = "0")]
        base_salary: Decimal,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(long, value_enum)]
        role: Option<RoleType>,
        #[arg(long)]
        base_salary: Option<Decimal>,
        #[arg(long)]
        active: Option<bool>,
    },
    Deactivate { id: Uuid },
    Show { id: Uuid },
    List {
        /// Include deactivated accounts
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AllowanceAction {
    Create {
        name: String,
        #[arg(long, value_enum)]
        calculation: AllowanceCalculation,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        calculation: Option<AllowanceCalculation>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete { id: Uuid },
    List,
    /// Assign to a user, the amount overrides the type's default
    Assign {
        user_id: Uuid,
        type_id: Uuid,
        #[arg(long)]
        amount: Option<Decimal>,
    },
    Unassign { user_id: Uuid, type_id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum DeductionAction {
    Create {
        name: String,
        #[arg(long, value_enum)]
        calculation: DeductionCalculation,
        #[arg(long)]
        value: Decimal,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        calculation: Option<DeductionCalculation>,
        #[arg(long)]
        value: Option<Decimal>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete { id: Uuid },
    List,
    /// Assign to a user, the value overrides the type's default
    Assign {
        user_id: Uuid,
        type_id: Uuid,
        #[arg(long)]
        value: Option<Decimal>,
    },
    Unassign { user_id: Uuid, type_id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    Show,
    Update {
        #[arg(long)]
        work_start: Option<NaiveTime>,
        #[arg(long)]
        work_end: Option<NaiveTime>,
        #[arg(long)]
        late_tolerance: Option<i32>,
        #[arg(long, allow_negative_numbers = true)]
        office_lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        office_lng: Option<f64>,
        /// 0 turns the geofence off
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long)]
        require_selfie: Option<bool>,
        #[arg(long, allow_negative_numbers = true)]
        utc_offset: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HolidayAction {
    Add { date: NaiveDate, name: String },
    Remove { date: NaiveDate },
    List {
        year: i32,
        #[arg(long)]
        month: Option<u32>,
    },
}

fn json<T: Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

async fn login(db: &DatabaseConnection, username: Option<String>, password: Option<String>) -> AppResult<user::Model> {
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::validation(
            "--username and --password (or ATTENDANCE_USERNAME and ATTENDANCE_PASSWORD) are required",
        ));
    };

    users::authenticate(db, &username, &password).await
}

/// Today in the office time zone
async fn office_today(db: &DatabaseConnection) -> AppResult<NaiveDate> {
    let settings = setting::get_settings(db).await?;

    Ok(utils::to_office_time(&now(), settings.utc_offset_minutes)?.date_naive())
}

pub async fn run(db: &DatabaseConnection, cli: Cli) -> AppResult<Value> {
    let command = match cli.command {
        Command::Db { action } => return migrate(db, action).await,
        Command::Account(command) => command,
    };

    let actor = login(db, cli.username, cli.password).await?;
    info!(user = %actor.username, role = ?actor.role, "logged in");

    match command {
        AccountCommand::Attendance { action } => run_attendance(db, actor, action).await,
        AccountCommand::Leave { action } => run_leave(db, actor, action).await,
        AccountCommand::Payroll { action } => run_payroll(db, actor, action).await,
        AccountCommand::User { action } => run_user(db, actor, action).await,
        AccountCommand::Allowance { action } => run_allowance(db, Admin::try_from(actor)?, action).await,
        AccountCommand::Deduction { action } => run_deduction(db, Admin::try_from(actor)?, action).await,
        AccountCommand::Settings { action } => run_settings(db, actor, action).await,
        AccountCommand::Holiday { action } => run_holiday(db, actor, action).await,
    }
}

async fn migrate(db: &DatabaseConnection, action: DbAction) -> AppResult<Value> {
    match action {
        DbAction::Migrate => Migrator::up(db, None).await?,
        DbAction::Rollback => Migrator::down(db, Some(1)).await?,
        DbAction::Status => {}
    }

    let applied = Migrator::get_applied_migrations(db).await?;
    let pending = Migrator::get_pending_migrations(db).await?;

    json(MigrationStatus {
        applied: applied.iter().map(|m| m.name().to_owned()).collect(),
        pending: pending.iter().map(|m| m.name().to_owned()).collect(),
    })
}

#[derive(Serialize)]
struct MigrationStatus {
    applied: Vec<String>,
    pending: Vec<String>,
}

async fn run_attendance(db: &DatabaseConnection, actor: user::Model, action: AttendanceAction) -> AppResult<Value> {
    match action {
        AttendanceAction::ClockIn { position } => json(attendance::clock_in(db, &actor, position.into(), now()).await?),
        AttendanceAction::ClockOut { position } => json(attendance::clock_out(db, &actor, position.into(), now()).await?),
        AttendanceAction::MarkAbsent { user_id, date, notes } => {
            let approver = Approver::try_from(actor)?;
            json(attendance::mark_absent(db, &approver, user_id, date, notes).await?)
        }
        AttendanceAction::Status { user, date } => {
            let today = office_today(db).await?;
            let user_id = user.unwrap_or(actor.id);
            json(attendance::daily_status(db, &actor, user_id, date.unwrap_or(today), today).await?)
        }
        AttendanceAction::Recap { year, month, user } => {
            let today = office_today(db).await?;
            let user_id = user.unwrap_or(actor.id);
            json(attendance::monthly_recap(db, &actor, user_id, year, month, today).await?)
        }
        AttendanceAction::RecapAll { year, month } => {
            let approver = Approver::try_from(actor)?;
            let today = office_today(db).await?;
            json(attendance::monthly_recap_all(db, &approver, year, month, today).await?)
        }
        AttendanceAction::History { from, to, user } => {
            let user_id = user.unwrap_or(actor.id);
            json(attendance::history(db, &actor, user_id, from, to).await?)
        }
    }
}

async fn run_leave(db: &DatabaseConnection, actor: user::Model, action: LeaveAction) -> AppResult<Value> {
    match action {
        LeaveAction::Submit { leave_type, start, end, reason, attachment } => {
            let new = NewLeave {
                leave_type,
                start_date: start,
                end_date: end,
                reason,
                attachment_url: attachment,
            };
            json(leave::submit(db, &actor, new).await?)
        }
        LeaveAction::Approve { id, note } => json(leave::approve(db, &Approver::try_from(actor)?, id, note).await?),
        LeaveAction::Reject { id, note } => json(leave::reject(db, &Approver::try_from(actor)?, id, note).await?),
        LeaveAction::Cancel { id } => json(leave::cancel(db, &actor, id).await?),
        LeaveAction::List { user, status } => json(leave::list(db, &actor, LeaveFilter { user_id: user, status }).await?),
    }
}

async fn run_payroll(db: &DatabaseConnection, actor: user::Model, action: PayrollAction) -> AppResult<Value> {
    match action {
        PayrollAction::Payslip { id } => json(payroll::payslip_detail(db, &actor, id).await?),
        PayrollAction::Mine { user } => {
            let user_id = user.unwrap_or(actor.id);
            json(payroll::payslips_for_user(db, &actor, user_id).await?)
        }
        PayrollAction::Generate { year, month } => {
            let admin = Admin::try_from(actor)?;
            let today = office_today(db).await?;
            json(payroll::generate_run(db, &admin, year, month, today).await?)
        }
        PayrollAction::Approve { id } => json(payroll::approve_run(db, &Admin::try_from(actor)?, id).await?),
        PayrollAction::Reject { id, reason } => json(payroll::reject_run(db, &Admin::try_from(actor)?, id, reason).await?),
        PayrollAction::Show { id } => {
            Admin::try_from(actor)?;
            json(payroll::get_run(db, id).await?)
        }
        PayrollAction::List { year } => {
            Admin::try_from(actor)?;
            json(payroll::list_runs(db, year).await?)
        }
        PayrollAction::Payslips { run_id } => json(payroll::payslips_for_run(db, &Admin::try_from(actor)?, run_id).await?),
    }
}

async fn run_user(db: &DatabaseConnection, actor: user::Model, action: UserAction) -> AppResult<Value> {
    match action {
        UserAction::Show { id } => {
            auth::ensure_can_view(&actor, id)?;
            json(users::get(db, id).await?)
        }
        UserAction::Create { account, full_name, new_password, role, base_salary } => {
            let new_user = NewUser {
                username: account,
                full_name,
                password: new_password,
                role,
                base_salary,
            };
            json(users::create(db, &Admin::try_from(actor)?, new_user).await?)
        }
        UserAction::Update { id, full_name, new_password, role, base_salary, active } => {
            let update = UserUpdate {
                full_name,
                password: new_password,
                role,
                base_salary,
                is_active: active,
            };
            json(users::update(db, &Admin::try_from(actor)?, id, update).await?)
        }
        UserAction::Deactivate { id } => json(users::deactivate(db, &Admin::try_from(actor)?, id).await?),
        UserAction::List { all } => {
            Admin::try_from(actor)?;
            json(users::list(db, all).await?)
        }
    }
}

async fn run_allowance(db: &DatabaseConnection, admin: Admin, action: AllowanceAction) -> AppResult<Value> {
    match action {
        AllowanceAction::Create { name, calculation, amount, description } => {
            let new = NewAllowanceType {
                name,
                description,
                calculation,
                default_amount: amount,
            };
            json(compensation::create_allowance_type(db, &admin, new).await?)
        }
        AllowanceAction::Update { id, name, description, calculation, amount, active } => {
            let update = AllowanceTypeUpdate {
                name,
                description,
                calculation,
                default_amount: amount,
                is_active: active,
            };
            json(compensation::update_allowance_type(db, &admin, id, update).await?)
        }
        AllowanceAction::Delete { id } => json(compensation::delete_allowance_type(db, &admin, id).await?),
        AllowanceAction::List => json(compensation::list_allowance_types(db).await?),
        AllowanceAction::Assign { user_id, type_id, amount } => {
            json(compensation::assign_allowance(db, &admin, user_id, type_id, amount).await?)
        }
        AllowanceAction::Unassign { user_id, type_id } => {
            json(compensation::unassign_allowance(db, &admin, user_id, type_id).await?)
        }
    }
}

async fn run_deduction(db: &DatabaseConnection, admin: Admin, action: DeductionAction) -> AppResult<Value> {
    match action {
        DeductionAction::Create { name, calculation, value, description } => {
            let new = NewDeductionType {
                name,
                description,
                calculation,
                default_value: value,
            };
            json(compensation::create_deduction_type(db, &admin, new).await?)
        }
        DeductionAction::Update { id, name, description, calculation, value, active } => {
            let update = DeductionTypeUpdate {
                name,
                description,
                calculation,
                default_value: value,
                is_active: active,
            };
            json(compensation::update_deduction_type(db, &admin, id, update).await?)
        }
        DeductionAction::Delete { id } => json(compensation::delete_deduction_type(db, &admin, id).await?),
        DeductionAction::List => json(compensation::list_deduction_types(db).await?),
        DeductionAction::Assign { user_id, type_id, value } => {
            json(compensation::assign_deduction(db, &admin, user_id, type_id, value).await?)
        }
        DeductionAction::Unassign { user_id, type_id } => {
            json(compensation::unassign_deduction(db, &admin, user_id, type_id).await?)
        }
    }
}

async fn run_settings(db: &DatabaseConnection, actor: user::Model, action: SettingsAction) -> AppResult<Value> {
    match action {
        SettingsAction::Show => json(setting::get_settings(db).await?),
        SettingsAction::Update {
            work_start,
            work_end,
            late_tolerance,
            office_lat,
            office_lng,
            radius,
            require_selfie,
            utc_offset,
        } => {
            let update = SettingsUpdate {
                work_start_time: work_start,
                work_end_time: work_end,
                late_tolerance_minutes: late_tolerance,
                office_latitude: office_lat,
                office_longitude: office_lng,
                geofence_radius_meters: radius,
                require_selfie,
                utc_offset_minutes: utc_offset,
            };
            json(setting::update_settings(db, &Admin::try_from(actor)?, update).await?)
        }
    }
}

async fn run_holiday(db: &DatabaseConnection, actor: user::Model, action: HolidayAction) -> AppResult<Value> {
    match action {
        HolidayAction::List { year, month } => json(setting::list_holidays(db, year, month).await?),
        HolidayAction::Add { date, name } => json(setting::add_holiday(db, &Admin::try_from(actor)?, date, name).await?),
        HolidayAction::Remove { date } => json(setting::remove_holiday(db, &Admin::try_from(actor)?, date).await?),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_db_status() {
        let cli = Cli::try_parse_from(["attendance-payroll", "db", "status"]).unwrap();

        assert!(matches!(cli.command, Command::Db { action: DbAction::Status }));
    }

    #[test]
    fn test_parse_clock_in() {
        let cli = Cli::try_parse_from([
            "attendance-payroll",
            "-u",
            "bob",
            "-p",
            "secret",
            "attendance",
            "clock-in",
            "--at",
            "2024-06-03T08:40:00+07:00",
            "--lat",
            "-6.175",
            "--lng",
            "106.827",
        ])
        .unwrap();

        let Command::Account(AccountCommand::Attendance {
            action: AttendanceAction::ClockIn { position },
        }) = cli.command
        else {
            panic!("expected attendance clock-in");
        };

        let clock_in = ClockIn::from(position);
        assert_eq!(clock_in.latitude, Some(-6.175));
        assert_eq!(clock_in.at.to_rfc3339(), "2024-06-03T08:40:00+07:00");
        assert_eq!(cli.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_parse_leave_submit() {
        let cli = Cli::try_parse_from([
            "attendance-payroll",
            "leave",
            "submit",
            "paid-leave",
            "2024-06-13",
            "2024-06-18",
            "--reason",
            "family trip",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Command::Account(AccountCommand::Leave {
                action: LeaveAction::Submit {
                    leave_type: LeaveType::PaidLeave,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_parse_deduction_create() {
        let cli = Cli::try_parse_from([
            "attendance-payroll",
            "deduction",
            "create",
            "BPJS Kesehatan",
            "--calculation",
            "mandatory-percentage",
            "--value",
            "1",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Command::Account(AccountCommand::Deduction {
                action: DeductionAction::Create {
                    calculation: DeductionCalculation::MandatoryPercentage,
                    ..
                }
            })
        ));
    }
}
