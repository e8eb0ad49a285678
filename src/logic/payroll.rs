use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entity::{
        allowance_type, deduction_type,
        sea_orm_active_enums::{AllowanceCalculation, DeductionCalculation, PayslipItemKind},
    },
    logic::attendance::RecapSummary,
    utils::round_money,
};

#[derive(Debug, Clone)]
pub struct AssignedAllowance {
    pub allowance: allowance_type::Model,
    /// Per-user override of `default_amount`
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct AssignedDeduction {
    pub deduction: deduction_type::Model,
    /// Per-user override of `default_value`
    pub value: Option<Decimal>,
}

pub struct PayslipInput<'a> {
    pub base_salary: Decimal,
    pub attendance: &'a RecapSummary,
    pub allowances: &'a [AssignedAllowance],
    pub deductions: &'a [AssignedDeduction],
    /// Active `MANDATORY_PERCENTAGE` types, applied even when not assigned
    pub mandatory: &'a [deduction_type::Model],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedItem {
    pub kind: PayslipItemKind,
    pub source_id: Uuid,
    pub name: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipCalculation {
    pub base_salary: Decimal,
    pub items: Vec<CalculatedItem>,
    pub total_allowances: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
}

impl PayslipCalculation {
    pub fn items_of(&self, kind: PayslipItemKind) -> impl Iterator<Item = &CalculatedItem> {
        self.items.iter().filter(move |item| item.kind == kind)
    }
}

fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    base * percent / Decimal::ONE_HUNDRED
}

fn allowance_amount(assigned: &AssignedAllowance, attendance: &RecapSummary) -> (Decimal, String) {
    let amount = assigned.amount.unwrap_or(assigned.allowance.default_amount);

    match assigned.allowance.calculation {
        AllowanceCalculation::Fixed => (amount, "fixed".to_owned()),
        AllowanceCalculation::PerPresentDay => (
            amount * Decimal::from(attendance.present_days),
            format!("{} present day(s) x {}", attendance.present_days, amount),
        ),
    }
}

fn deduction_amount(assigned: &AssignedDeduction, base_salary: Decimal, attendance: &RecapSummary) -> (Decimal, String) {
    let value = assigned.value.unwrap_or(assigned.deduction.default_value);

    match assigned.deduction.calculation {
        DeductionCalculation::Fixed => (value, "fixed".to_owned()),
        DeductionCalculation::Percentage | DeductionCalculation::MandatoryPercentage => (
            percent_of(base_salary, value),
            format!("{value}% of {base_salary}"),
        ),
        DeductionCalculation::PerLateDay => (
            value * Decimal::from(attendance.late_days),
            format!("{} late day(s) x {}", attendance.late_days, value),
        ),
        DeductionCalculation::PerAbsenceDay => (
            value * Decimal::from(attendance.absent_days),
            format!("{} absent day(s) x {}", attendance.absent_days, value),
        ),
        DeductionCalculation::PercentageOfAbsence => {
            let amount = if attendance.working_days > 0 {
                let daily_rate = base_salary / Decimal::from(attendance.working_days);
                percent_of(daily_rate * Decimal::from(attendance.absent_days), value)
            } else {
                Decimal::ZERO
            };

            (
                amount,
                format!("{value}% of daily rate x {} absent day(s) of {} working day(s)", attendance.absent_days, attendance.working_days),
            )
        }
    }
}

/// Turns a month of attendance into payslip lines.
///
/// Inactive types and lines that come out as zero are left out. Every line is rounded
/// on its own and the totals are sums of the rounded lines. Net pay never goes below
/// zero.
pub fn calculate_payslip(input: &PayslipInput) -> PayslipCalculation {
    let mut items = Vec::new();

    for assigned in input.allowances.iter().filter(|a| a.allowance.is_active) {
        let (amount, description) = allowance_amount(assigned, input.attendance);
        let amount = round_money(amount);

        if amount.is_zero() {
            continue;
        }

        items.push(CalculatedItem {
            kind: PayslipItemKind::Allowance,
            source_id: assigned.allowance.id,
            name: assigned.allowance.name.clone(),
            description,
            amount,
        });
    }

    let unassigned_mandatory = input
        .mandatory
        .iter()
        .filter(|m| !input.deductions.iter().any(|d| d.deduction.id == m.id))
        .map(|m| AssignedDeduction {
            deduction: m.clone(),
            value: None,
        })
        .collect::<Vec<_>>();

    for assigned in input
        .deductions
        .iter()
        .chain(unassigned_mandatory.iter())
        .filter(|d| d.deduction.is_active)
    {
        let (amount, description) = deduction_amount(assigned, input.base_salary, input.attendance);
        let amount = round_money(amount);

        if amount.is_zero() {
            continue;
        }

        items.push(CalculatedItem {
            kind: PayslipItemKind::Deduction,
            source_id: assigned.deduction.id,
            name: assigned.deduction.name.clone(),
            description,
            amount,
        });
    }

    let total_of = |kind: PayslipItemKind| {
        items
            .iter()
            .filter(|item| item.kind == kind)
            .map(|item| item.amount)
            .sum::<Decimal>()
    };

    let total_allowances = total_of(PayslipItemKind::Allowance);
    let total_deductions = total_of(PayslipItemKind::Deduction);
    let net_salary = (input.base_salary + total_allowances - total_deductions).max(Decimal::ZERO);

    PayslipCalculation {
        base_salary: input.base_salary,
        items,
        total_allowances,
        total_deductions,
        net_salary,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use chrono::Local;
    use rust_decimal_macros::dec;

    pub(crate) fn allowance(name: &str, calculation: AllowanceCalculation, default_amount: Decimal) -> allowance_type::Model {
        allowance_type::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            name: name.to_owned(),
            description: None,
            calculation,
            default_amount,
            is_active: true,
        }
    }

    pub(crate) fn deduction(name: &str, calculation: DeductionCalculation, default_value: Decimal) -> deduction_type::Model {
        deduction_type::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            name: name.to_owned(),
            description: None,
            calculation,
            default_value,
            is_active: true,
        }
    }

    fn attendance() -> RecapSummary {
        RecapSummary {
            working_days: 21,
            present_days: 18,
            late_days: 3,
            absent_days: 2,
            permit_days: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_calculate_payslip() {
        let attendance = attendance();

        let allowances = [
            AssignedAllowance {
                allowance: allowance("Transport", AllowanceCalculation::Fixed, dec!(500000)),
                amount: None,
            },
            AssignedAllowance {
                allowance: allowance("Meal", AllowanceCalculation::PerPresentDay, dec!(25000)),
                amount: Some(dec!(30000)),
            },
        ];

        let deductions = [
            AssignedDeduction {
                deduction: deduction("Late fine", DeductionCalculation::PerLateDay, dec!(50000)),
                value: None,
            },
            AssignedDeduction {
                deduction: deduction("Absence fine", DeductionCalculation::PerAbsenceDay, dec!(100000)),
                value: None,
            },
            AssignedDeduction {
                deduction: deduction("Unpaid absence", DeductionCalculation::PercentageOfAbsence, dec!(100)),
                value: None,
            },
        ];

        let mandatory = [deduction("BPJS", DeductionCalculation::MandatoryPercentage, dec!(1))];

        let payslip = calculate_payslip(&PayslipInput {
            base_salary: dec!(8000000),
            attendance: &attendance,
            allowances: &allowances,
            deductions: &deductions,
            mandatory: &mandatory,
        });

        let amounts = payslip.items.iter().map(|i| (i.name.as_str(), i.amount)).collect::<Vec<_>>();
        assert_eq!(
            amounts,
            vec![
                ("Transport", dec!(500000)),
                ("Meal", dec!(540000)),
                ("Late fine", dec!(150000)),
                ("Absence fine", dec!(200000)),
                ("Unpaid absence", dec!(761904.76)),
                ("BPJS", dec!(80000)),
            ]
        );

        assert_eq!(payslip.total_allowances, dec!(1040000));
        assert_eq!(payslip.total_deductions, dec!(1191904.76));
        assert_eq!(payslip.net_salary, dec!(7848095.24));
        assert_eq!(payslip.items_of(PayslipItemKind::Deduction).count(), 4);
    }

    #[test]
    fn test_mandatory_assignment_overrides_value_once() {
        let attendance = attendance();
        let bpjs = deduction("BPJS", DeductionCalculation::MandatoryPercentage, dec!(1));

        let deductions = [AssignedDeduction {
            deduction: bpjs.clone(),
            value: Some(dec!(2.5)),
        }];

        let payslip = calculate_payslip(&PayslipInput {
            base_salary: dec!(4000000),
            attendance: &attendance,
            allowances: &[],
            deductions: &deductions,
            mandatory: &[bpjs],
        });

        assert_eq!(payslip.items.len(), 1);
        assert_eq!(payslip.items[0].amount, dec!(100000));
        assert_eq!(payslip.net_salary, dec!(3900000));
    }

    #[test]
    fn test_skips_inactive_and_zero_lines() {
        let attendance = RecapSummary {
            working_days: 0,
            absent_days: 0,
            ..Default::default()
        };

        let mut inactive = allowance("Old bonus", AllowanceCalculation::Fixed, dec!(1000000));
        inactive.is_active = false;

        let allowances = [AssignedAllowance { allowance: inactive, amount: None }];
        let deductions = [
            AssignedDeduction {
                deduction: deduction("Late fine", DeductionCalculation::PerLateDay, dec!(50000)),
                value: None,
            },
            AssignedDeduction {
                deduction: deduction("Unpaid absence", DeductionCalculation::PercentageOfAbsence, dec!(100)),
                value: None,
            },
        ];

        let payslip = calculate_payslip(&PayslipInput {
            base_salary: dec!(5000000),
            attendance: &attendance,
            allowances: &allowances,
            deductions: &deductions,
            mandatory: &[],
        });

        assert!(payslip.items.is_empty());
        assert_eq!(payslip.net_salary, dec!(5000000));
    }

    #[test]
    fn test_net_salary_never_negative() {
        let attendance = attendance();

        let deductions = [
            AssignedDeduction {
                deduction: deduction("Loan", DeductionCalculation::Fixed, dec!(3000000)),
                value: None,
            },
            AssignedDeduction {
                deduction: deduction("Pension", DeductionCalculation::Percentage, dec!(2)),
                value: None,
            },
        ];

        let payslip = calculate_payslip(&PayslipInput {
            base_salary: dec!(2000000),
            attendance: &attendance,
            allowances: &[],
            deductions: &deductions,
            mandatory: &[],
        });

        assert_eq!(payslip.total_deductions, dec!(3040000));
        assert_eq!(payslip.net_salary, Decimal::ZERO);
    }
}
