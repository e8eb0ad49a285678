use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{self, Admin},
    entity::{
        attendance_record, deduction_type, holiday, payroll_run, payslip, payslip_item,
        prelude::*,
        sea_orm_active_enums::{PayrollStatus, PayslipItemKind, RoleType},
        user,
    },
    error::{AppError, AppResult},
    logic::{
        attendance::{build_recap, RecapSummary},
        payroll::{calculate_payslip, AssignedAllowance, AssignedDeduction, PayslipCalculation, PayslipInput},
    },
    services::{attendance, compensation, now, setting, user as users},
    utils,
};

/// One employee's share of a run before anything is stored
#[derive(Debug, Clone)]
pub struct DraftPayslip {
    pub user_id: Uuid,
    pub attendance: RecapSummary,
    pub calculation: PayslipCalculation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub total_allowances: Decimal,
    pub total_deductions: Decimal,
    pub total_net: Decimal,
}

impl RunTotals {
    pub fn of(drafts: &[DraftPayslip]) -> Self {
        drafts.iter().fold(Self::default(), |totals, draft| Self {
            total_allowances: totals.total_allowances + draft.calculation.total_allowances,
            total_deductions: totals.total_deductions + draft.calculation.total_deductions,
            total_net: totals.total_net + draft.calculation.net_salary,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayslipDetail {
    pub payslip: payslip::Model,
    pub period_year: i32,
    pub period_month: i32,
    pub run_status: PayrollStatus,
    pub allowances: Vec<payslip_item::Model>,
    pub deductions: Vec<payslip_item::Model>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPayslip {
    pub period_year: i32,
    pub period_month: i32,
    pub payslip: payslip::Model,
}

/// Everything a run is computed from, loaded up front
pub struct RunSources<'a> {
    pub year: i32,
    pub month: u32,
    pub today: NaiveDate,
    pub employees: &'a [user::Model],
    pub records: &'a [attendance_record::Model],
    pub holidays: &'a [holiday::Model],
    pub allowances: &'a HashMap<Uuid, Vec<AssignedAllowance>>,
    pub deductions: &'a HashMap<Uuid, Vec<AssignedDeduction>>,
    pub mandatory: &'a [deduction_type::Model],
}

/// Recap and payslip of every employee of the period
pub fn draft_payslips(sources: &RunSources) -> AppResult<Vec<DraftPayslip>> {
    sources
        .employees
        .iter()
        .map(|employee| {
            let recap = build_recap(
                employee.id,
                sources.year,
                sources.month,
                sources.records,
                sources.holidays,
                sources.today,
            )?;

            let calculation = calculate_payslip(&PayslipInput {
                base_salary: employee.base_salary,
                attendance: &recap.summary,
                allowances: sources.allowances.get(&employee.id).map(Vec::as_slice).unwrap_or_default(),
                deductions: sources.deductions.get(&employee.id).map(Vec::as_slice).unwrap_or_default(),
                mandatory: sources.mandatory,
            });

            Ok(DraftPayslip {
                user_id: employee.id,
                attendance: recap.summary,
                calculation,
            })
        })
        .collect()
}

fn payslip_models(run_id: Uuid, drafts: &[DraftPayslip]) -> (Vec<payslip::ActiveModel>, Vec<payslip_item::ActiveModel>) {
    let mut payslips = Vec::with_capacity(drafts.len());
    let mut items = Vec::new();

    for draft in drafts {
        let payslip_id = Uuid::new_v4();
        let summary = &draft.attendance;

        payslips.push(payslip::ActiveModel {
            id: Set(payslip_id),
            created_at: Set(now()),
            payroll_run_id: Set(run_id),
            user_id: Set(draft.user_id),
            base_salary: Set(draft.calculation.base_salary),
            working_days: Set(summary.working_days as i32),
            present_days: Set(summary.present_days as i32),
            late_days: Set(summary.late_days as i32),
            absent_days: Set(summary.absent_days as i32),
            leave_days: Set(summary.leave_days() as i32),
            total_allowances: Set(draft.calculation.total_allowances),
            total_deductions: Set(draft.calculation.total_deductions),
            net_salary: Set(draft.calculation.net_salary),
        });

        items.extend(draft.calculation.items.iter().map(|item| payslip_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            payslip_id: Set(payslip_id),
            kind: Set(item.kind),
            name: Set(item.name.clone()),
            description: Set(Some(item.description.clone())),
            amount: Set(item.amount),
        }));
    }

    (payslips, items)
}

/// Computes and stores the payroll of a month, pending approval
#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn generate_run(db: &DatabaseConnection, admin: &Admin, year: i32, month: u32, today: NaiveDate) -> AppResult<payroll_run::Model> {
    let (period_start, period_end) = utils::month_range(year, month)?;

    let txn = db.begin().await?;

    let existing = PayrollRun::find()
        .filter(payroll_run::Column::PeriodYear.eq(year))
        .filter(payroll_run::Column::PeriodMonth.eq(month as i32))
        .filter(payroll_run::Column::Status.ne(PayrollStatus::Rejected))
        .one(&txn)
        .await?;

    if let Some(existing) = existing {
        warn!(run_id = %existing.id, "payroll run already exists");
        return Err(period_taken(year, month, Some(existing.status)));
    }

    let employees = users::active_employees(&txn).await?;
    if employees.is_empty() {
        return Err(AppError::validation("there are no active employees to pay"));
    }
    let ids = employees.iter().map(|e| e.id).collect::<Vec<_>>();

    let holidays = setting::holidays_between(&txn, period_start, period_end).await?;
    let records = attendance::records_between(&txn, &ids, period_start, period_end).await?;
    let allowances = compensation::allowances_by_user(&txn, &ids).await?;
    let deductions = compensation::deductions_by_user(&txn, &ids).await?;
    let mandatory = compensation::mandatory_deductions(&txn).await?;

    let drafts = draft_payslips(&RunSources {
        year,
        month,
        today,
        employees: &employees,
        records: &records,
        holidays: &holidays,
        allowances: &allowances,
        deductions: &deductions,
        mandatory: &mandatory,
    })?;
    let totals = RunTotals::of(&drafts);

    let run_id = Uuid::new_v4();
    let (payslips, items) = payslip_models(run_id, &drafts);

    // A concurrent run for the period trips the partial unique index
    let run = payroll_run::ActiveModel {
        id: Set(run_id),
        created_at: Set(now()),
        updated_at: Set(now()),
        period_year: Set(year),
        period_month: Set(month as i32),
        period_start: Set(period_start),
        period_end: Set(period_end),
        status: Set(PayrollStatus::PendingApproval),
        created_by: Set(Some(admin.id)),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        rejection_reason: Set(None),
        employee_count: Set(drafts.len() as i32),
        total_allowances: Set(totals.total_allowances),
        total_deductions: Set(totals.total_deductions),
        total_net: Set(totals.total_net),
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => period_taken(year, month, None),
        _ => AppError::from(e),
    })?;

    Payslip::insert_many(payslips).exec_without_returning(&txn).await?;
    if !items.is_empty() {
        PayslipItem::insert_many(items).exec_without_returning(&txn).await?;
    }

    txn.commit().await?;

    info!(run_id = %run.id, employees = run.employee_count, total_net = %run.total_net, "payroll run generated");

    Ok(run)
}

fn period_taken(year: i32, month: u32, status: Option<PayrollStatus>) -> AppError {
    match status {
        Some(status) => AppError::conflict(format!("a {status:?} payroll run already exists for {year}-{month:02}")),
        None => AppError::conflict(format!("a payroll run already exists for {year}-{month:02}")),
    }
}

pub async fn get_run(db: &DatabaseConnection, id: Uuid) -> AppResult<payroll_run::Model> {
    PayrollRun::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("payroll run"))
}

pub async fn list_runs(db: &DatabaseConnection, year: Option<i32>) -> AppResult<Vec<payroll_run::Model>> {
    let mut query = PayrollRun::find()
        .order_by_desc(payroll_run::Column::PeriodYear)
        .order_by_desc(payroll_run::Column::PeriodMonth)
        .order_by_desc(payroll_run::Column::CreatedAt);

    if let Some(year) = year {
        query = query.filter(payroll_run::Column::PeriodYear.eq(year));
    }

    Ok(query.all(db).await?)
}

/// Applies `review` only while the run still awaits approval
async fn review_run(db: &DatabaseConnection, id: Uuid, review: payroll_run::ActiveModel) -> AppResult<payroll_run::Model> {
    let res = PayrollRun::update_many()
        .set(review)
        .filter(payroll_run::Column::Id.eq(id))
        .filter(payroll_run::Column::Status.eq(PayrollStatus::PendingApproval))
        .exec(db)
        .await?;

    let run = get_run(db, id).await?;

    if res.rows_affected == 0 {
        warn!(status = ?run.status, "payroll run is no longer pending");
        return Err(AppError::PayrollNotPending(run.status));
    }

    Ok(run)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn approve_run(db: &DatabaseConnection, admin: &Admin, id: Uuid) -> AppResult<payroll_run::Model> {
    let review = payroll_run::ActiveModel {
        updated_at: Set(now()),
        status: Set(PayrollStatus::Approved),
        reviewed_by: Set(Some(admin.id)),
        reviewed_at: Set(Some(now())),
        ..Default::default()
    };

    let run = review_run(db, id, review).await?;

    info!("payroll run approved");

    Ok(run)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn reject_run(db: &DatabaseConnection, admin: &Admin, id: Uuid, reason: String) -> AppResult<payroll_run::Model> {
    if reason.trim().is_empty() {
        return Err(AppError::validation("a rejection reason is required"));
    }

    let review = payroll_run::ActiveModel {
        updated_at: Set(now()),
        status: Set(PayrollStatus::Rejected),
        reviewed_by: Set(Some(admin.id)),
        reviewed_at: Set(Some(now())),
        rejection_reason: Set(Some(reason.trim().to_owned())),
        ..Default::default()
    };

    let run = review_run(db, id, review).await?;

    info!("payroll run rejected");

    Ok(run)
}

pub async fn payslips_for_run(db: &DatabaseConnection, _admin: &Admin, run_id: Uuid) -> AppResult<Vec<payslip::Model>> {
    let payslips = Payslip::find()
        .filter(payslip::Column::PayrollRunId.eq(run_id))
        .order_by_asc(payslip::Column::UserId)
        .all(db)
        .await?;

    Ok(payslips)
}

/// A payslip with its lines. Employees only get payslips of approved runs.
pub async fn payslip_detail(db: &DatabaseConnection, actor: &user::Model, payslip_id: Uuid) -> AppResult<PayslipDetail> {
    let Some((payslip, run)) = Payslip::find_by_id(payslip_id)
        .find_also_related(PayrollRun)
        .one(db)
        .await?
    else {
        return Err(AppError::NotFound("payslip"));
    };

    auth::ensure_can_view(actor, payslip.user_id)?;

    let run = run.ok_or(AppError::NotFound("payroll run"))?;
    if actor.role == RoleType::Employee && run.status != PayrollStatus::Approved {
        return Err(AppError::NotFound("payslip"));
    }

    let (allowances, deductions) = PayslipItem::find()
        .filter(payslip_item::Column::PayslipId.eq(payslip.id))
        .order_by_asc(payslip_item::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .partition(|item| item.kind == PayslipItemKind::Allowance);

    Ok(PayslipDetail {
        payslip,
        period_year: run.period_year,
        period_month: run.period_month,
        run_status: run.status,
        allowances,
        deductions,
    })
}

/// Payslips of `user_id` from approved runs, newest period first
pub async fn payslips_for_user(db: &DatabaseConnection, actor: &user::Model, user_id: Uuid) -> AppResult<Vec<UserPayslip>> {
    auth::ensure_can_view(actor, user_id)?;

    let rows = Payslip::find()
        .find_also_related(PayrollRun)
        .filter(payslip::Column::UserId.eq(user_id))
        .filter(payroll_run::Column::Status.eq(PayrollStatus::Approved))
        .order_by_desc(payroll_run::Column::PeriodYear)
        .order_by_desc(payroll_run::Column::PeriodMonth)
        .all(db)
        .await?;

    let payslips = rows
        .into_iter()
        .filter_map(|(payslip, run)| {
            run.map(|run| UserPayslip {
                period_year: run.period_year,
                period_month: run.period_month,
                payslip,
            })
        })
        .collect();

    Ok(payslips)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::{
        auth::tests::user as fixture,
        entity::{
            sea_orm_active_enums::{AllowanceCalculation, AttendanceStatus, DeductionCalculation},
            user_allowance,
        },
        logic::{
            attendance::tests::{holiday, record},
            payroll::tests::{allowance, deduction},
        },
    };

    use super::*;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn run(status: PayrollStatus) -> payroll_run::Model {
        payroll_run::Model {
            id: Uuid::new_v4(),
            created_at: now(),
            updated_at: now(),
            period_year: 2024,
            period_month: 6,
            period_start: june(1),
            period_end: june(30),
            status,
            created_by: None,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            employee_count: 1,
            total_allowances: dec!(0),
            total_deductions: dec!(0),
            total_net: dec!(5000000),
        }
    }

    fn payslip_of(run_id: Uuid, user_id: Uuid) -> payslip::Model {
        payslip::Model {
            id: Uuid::new_v4(),
            created_at: now(),
            payroll_run_id: run_id,
            user_id,
            base_salary: dec!(5000000),
            working_days: 19,
            present_days: 19,
            late_days: 0,
            absent_days: 0,
            leave_days: 0,
            total_allowances: dec!(0),
            total_deductions: dec!(0),
            net_salary: dec!(5000000),
        }
    }

    #[test]
    fn test_draft_payslips() {
        let bob = fixture("bob", RoleType::Employee);
        let siti = fixture("siti", RoleType::Employee);

        // Every working day of June 2024 except the 17th holiday
        let mut records = utils::days_between(june(1), june(30))
            .filter(|d| !utils::is_weekend(*d) && *d != june(17))
            .map(|d| record(bob.id, d, AttendanceStatus::Completed))
            .collect::<Vec<_>>();
        records.push(record(siti.id, june(3), AttendanceStatus::Late));

        let meal = allowance("Meal", AllowanceCalculation::PerPresentDay, dec!(25000));
        let allowances = HashMap::from([(
            bob.id,
            vec![AssignedAllowance {
                allowance: meal,
                amount: None,
            }],
        )]);
        let absence = deduction("Absence fine", DeductionCalculation::PerAbsenceDay, dec!(100000));
        let deductions = HashMap::from([(
            siti.id,
            vec![AssignedDeduction {
                deduction: absence,
                value: None,
            }],
        )]);
        let bpjs = deduction("BPJS", DeductionCalculation::MandatoryPercentage, dec!(1));

        let drafts = draft_payslips(&RunSources {
            year: 2024,
            month: 6,
            today: june(30).succ_opt().unwrap(),
            employees: &[bob.clone(), siti.clone()],
            records: &records,
            holidays: &[holiday(june(17), "Idul Adha")],
            allowances: &allowances,
            deductions: &deductions,
            mandatory: &[bpjs],
        })
        .unwrap();

        assert_eq!(drafts.len(), 2);

        // 19 days x 25.000 meal, 1% BPJS
        let bob_slip = &drafts[0].calculation;
        assert_eq!(drafts[0].attendance.present_days, 19);
        assert_eq!(bob_slip.total_allowances, dec!(475000));
        assert_eq!(bob_slip.total_deductions, dec!(50000));
        assert_eq!(bob_slip.net_salary, dec!(5425000));

        // 18 absences x 100.000 plus 1% BPJS
        let siti_slip = &drafts[1].calculation;
        assert_eq!(drafts[1].attendance.absent_days, 18);
        assert_eq!(siti_slip.total_deductions, dec!(1850000));
        assert_eq!(siti_slip.net_salary, dec!(3150000));

        let totals = RunTotals::of(&drafts);
        assert_eq!(totals.total_allowances, dec!(475000));
        assert_eq!(totals.total_deductions, dec!(1900000));
        assert_eq!(totals.total_net, dec!(8575000));
    }

    #[test]
    fn test_payslip_models_link_items_to_payslips() {
        let bob = fixture("bob", RoleType::Employee);
        let bpjs = deduction("BPJS", DeductionCalculation::MandatoryPercentage, dec!(1));
        let summary = RecapSummary::default();

        let calculation = calculate_payslip(&PayslipInput {
            base_salary: bob.base_salary,
            attendance: &summary,
            allowances: &[],
            deductions: &[],
            mandatory: &[bpjs],
        });

        let run_id = Uuid::new_v4();
        let (payslips, items) = payslip_models(
            run_id,
            &[DraftPayslip {
                user_id: bob.id,
                attendance: summary,
                calculation,
            }],
        );

        assert_eq!(payslips.len(), 1);
        assert_eq!(items.len(), 1);
        assert_eq!(payslips[0].payroll_run_id.clone().unwrap(), run_id);
        assert_eq!(items[0].payslip_id.clone().unwrap(), payslips[0].id.clone().unwrap());
        assert_eq!(items[0].amount.clone().unwrap(), dec!(50000));
    }

    #[tokio::test]
    async fn test_generate_run() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();
        let bob = fixture("bob", RoleType::Employee);
        let bpjs = deduction("BPJS", DeductionCalculation::MandatoryPercentage, dec!(1));
        let stored = run(PayrollStatus::PendingApproval);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<payroll_run::Model>::new()])
            .append_query_results([vec![bob.clone()]])
            .append_query_results([Vec::<holiday::Model>::new()])
            .append_query_results([vec![record(bob.id, june(3), AttendanceStatus::Completed)]])
            .append_query_results([Vec::<user_allowance::Model>::new()])
            .append_query_results([Vec::<user_allowance::Model>::new()])
            .append_query_results([vec![bpjs]])
            .append_query_results([vec![stored.clone()]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let res = generate_run(&db, &admin, 2024, 6, june(30).succ_opt().unwrap()).await.unwrap();
        assert_eq!(res, stored);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"INSERT INTO \"payslip\""#));
        assert!(log.contains(r#"INSERT INTO \"payslip_item\""#));
        assert!(log.contains("PENDING_APPROVAL"));
    }

    #[tokio::test]
    async fn test_generate_run_conflict() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![run(PayrollStatus::Approved)]])
            .into_connection();

        let res = generate_run(&db, &admin, 2024, 6, june(30)).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_generate_run_after_rejected_run() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();
        let bob = fixture("bob", RoleType::Employee);
        let stored = run(PayrollStatus::PendingApproval);

        // The rejected run of the period is filtered out by the lookup
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<payroll_run::Model>::new()])
            .append_query_results([vec![bob.clone()]])
            .append_query_results([Vec::<holiday::Model>::new()])
            .append_query_results([Vec::<attendance_record::Model>::new()])
            .append_query_results([Vec::<user_allowance::Model>::new()])
            .append_query_results([Vec::<user_allowance::Model>::new()])
            .append_query_results([Vec::<deduction_type::Model>::new()])
            .append_query_results([vec![stored.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let res = generate_run(&db, &admin, 2024, 6, june(30)).await.unwrap();
        assert_eq!(res, stored);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"\"payroll_run\".\"status\" <> "#));
        assert!(log.contains("REJECTED"));
    }

    #[tokio::test]
    async fn test_review_only_pending_runs() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();
        let approved = run(PayrollStatus::Approved);
        let untouched = || MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([untouched(), untouched()])
            .append_query_results([vec![approved.clone()], vec![approved.clone()]])
            .into_connection();

        assert!(matches!(
            approve_run(&db, &admin, approved.id).await,
            Err(AppError::PayrollNotPending(PayrollStatus::Approved))
        ));
        assert!(matches!(
            reject_run(&db, &admin, approved.id, "wrong rates".to_owned()).await,
            Err(AppError::PayrollNotPending(PayrollStatus::Approved))
        ));
        assert!(matches!(
            reject_run(&db, &admin, approved.id, " ".to_owned()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_run() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();
        let pending = run(PayrollStatus::PendingApproval);
        let mut approved = pending.clone();
        approved.status = PayrollStatus::Approved;
        approved.reviewed_by = Some(admin.id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![approved.clone()]])
            .into_connection();

        assert_eq!(approve_run(&db, &admin, pending.id).await.unwrap(), approved);

        // The status guard is part of the UPDATE itself
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"UPDATE \"payroll_run\""#));
        assert!(log.contains(r#"AND \"payroll_run\".\"status\" = "#));
        assert!(log.contains("PENDING_APPROVAL"));
    }

    #[tokio::test]
    async fn test_payslip_detail_hides_unapproved_runs_from_employees() {
        let bob = fixture("bob", RoleType::Employee);
        let siti = fixture("siti", RoleType::Employee);
        let pending = run(PayrollStatus::PendingApproval);
        let slip = payslip_of(pending.id, bob.id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![(slip.clone(), pending.clone())], vec![(slip.clone(), pending.clone())]])
            .into_connection();

        assert!(matches!(payslip_detail(&db, &siti, slip.id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(payslip_detail(&db, &bob, slip.id).await, Err(AppError::NotFound("payslip"))));
    }

    #[tokio::test]
    async fn test_payslip_detail() {
        let admin = fixture("root", RoleType::Admin);
        let bob = fixture("bob", RoleType::Employee);
        let approved = run(PayrollStatus::Approved);
        let slip = payslip_of(approved.id, bob.id);

        let item = |kind, name: &str| payslip_item::Model {
            id: Uuid::new_v4(),
            payslip_id: slip.id,
            kind,
            name: name.to_owned(),
            description: None,
            amount: dec!(50000),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![(slip.clone(), approved.clone())]])
            .append_query_results([vec![
                item(PayslipItemKind::Deduction, "BPJS"),
                item(PayslipItemKind::Allowance, "Meal"),
            ]])
            .into_connection();

        let detail = payslip_detail(&db, &admin, slip.id).await.unwrap();

        assert_eq!(detail.payslip, slip);
        assert_eq!(detail.run_status, PayrollStatus::Approved);
        assert_eq!(detail.allowances.len(), 1);
        assert_eq!(detail.deductions[0].name, "BPJS");
    }

    #[tokio::test]
    async fn test_payslips_for_user() {
        let bob = fixture("bob", RoleType::Employee);
        let approved = run(PayrollStatus::Approved);
        let slip = payslip_of(approved.id, bob.id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![(slip.clone(), approved.clone())]])
            .into_connection();

        let payslips = payslips_for_user(&db, &bob, bob.id).await.unwrap();

        assert_eq!(payslips.len(), 1);
        assert_eq!((payslips[0].period_year, payslips[0].period_month), (2024, 6));
        assert_eq!(payslips[0].payslip, slip);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("APPROVED"));
    }
}
