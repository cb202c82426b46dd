//! Payroll record derivation.
//!
//! A record is pure arithmetic over the employee, the period, attendance
//! counts and pay parameters. The only branch is the attendance allowance,
//! which is forfeited by any unexcused absence.

use chrono::NaiveDate;
use thiserror::Error;

use crate::layout::MAX_CELL_AMOUNT;
use crate::types::{
    AttendanceParams, DayCounts, Employee, PayParams, PayPolicy, PayrollRecord, Period,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} days must not be negative, got {value}")]
    NegativeDays { field: &'static str, value: i64 },
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: i64 },
    #[error("attendance days sum to {actual}, period length is {expected}")]
    DayTotalMismatch { expected: u32, actual: i64 },
    #[error("period must start on the first day of a month, got {0}")]
    PeriodNotFirstDay(NaiveDate),
    #[error("invalid period: {0:?} (expected YYYY-MM)")]
    InvalidPeriod(String),
    #[error("{0} overflows")]
    Overflow(&'static str),
    #[error("{field} is {value}, beyond the largest amount a sheet cell holds exactly")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("{field} is {actual}, expected {expected}")]
    Mismatch {
        field: &'static str,
        expected: i64,
        actual: i64,
    },
}

/// Builds payroll records under a fixed [`PayPolicy`].
#[derive(Debug, Clone, Default)]
pub struct PayrollBuilder {
    policy: PayPolicy,
}

impl PayrollBuilder {
    pub fn new(policy: PayPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PayPolicy {
        &self.policy
    }

    /// Derive the payroll row for one employee.
    pub fn build(
        &self,
        employee: &Employee,
        period: Period,
        attendance: &AttendanceParams,
        pay: &PayParams,
    ) -> Result<PayrollRecord, ValidationError> {
        let policy = &self.policy;
        check_policy(policy)?;
        let days = self.day_counts(attendance)?;
        check_pay(pay)?;

        let present = i64::from(days.present);
        let meal_amount = mul("meal_amount", pay.meal_rate, present)?;
        let trans_amount = mul("trans_amount", pay.trans_rate, present)?;
        let overtime_amount = mul("overtime_amount", pay.overtime_hours, pay.overtime_rate)?;
        let attendance_allowance = if days.absence > 0 {
            0
        } else {
            policy.attendance_allowance
        };

        let gross = sum(
            "gross",
            &[
                pay.base_salary,
                meal_amount,
                trans_amount,
                attendance_allowance,
                policy.health_allowance,
                pay.bonus,
                overtime_amount,
                pay.incentive,
                pay.accessory_fee,
            ],
        )?;
        let total_deduction = sum(
            "total_deduction",
            &[policy.insurance, policy.admin_fee, pay.loan],
        )?;
        let net = gross
            .checked_sub(total_deduction)
            .ok_or(ValidationError::Overflow("net"))?;
        within_cell_range(&[
            ("base_salary", pay.base_salary),
            ("meal_rate", pay.meal_rate),
            ("trans_rate", pay.trans_rate),
            ("bonus", pay.bonus),
            ("overtime_hours", pay.overtime_hours),
            ("overtime_rate", pay.overtime_rate),
            ("incentive", pay.incentive),
            ("accessory_fee", pay.accessory_fee),
            ("loan", pay.loan),
            ("meal_amount", meal_amount),
            ("trans_amount", trans_amount),
            ("overtime_amount", overtime_amount),
            ("gross", gross),
            ("total_deduction", total_deduction),
            ("net", net),
        ])?;

        Ok(PayrollRecord {
            no: employee.no,
            employee_name: employee.name.clone(),
            period,
            account_number: employee.account_number.clone(),
            total_days: policy.period_length,
            days,
            base_salary: pay.base_salary,
            training_salary: 0,
            meal_rate: pay.meal_rate,
            meal_amount,
            trans_rate: pay.trans_rate,
            trans_amount,
            attendance_allowance,
            health_allowance: policy.health_allowance,
            bonus: pay.bonus,
            overtime_hours: pay.overtime_hours,
            overtime_amount,
            incentive: pay.incentive,
            accessory_fee: pay.accessory_fee,
            gross,
            loan: pay.loan,
            admin_fee: policy.admin_fee,
            insurance: policy.insurance,
            total_deduction,
            net,
        })
    }

    fn day_counts(&self, a: &AttendanceParams) -> Result<DayCounts, ValidationError> {
        let counts = DayCounts {
            present: day("present", a.present)?,
            off: day("off", a.off)?,
            sick: day("sick", a.sick)?,
            permission: day("permission", a.permission)?,
            absence: day("absence", a.absence)?,
            leave: day("leave", a.leave)?,
        };

        let actual = counts.total();
        if actual != i64::from(self.policy.period_length) {
            return Err(ValidationError::DayTotalMismatch {
                expected: self.policy.period_length,
                actual,
            });
        }
        Ok(counts)
    }
}

impl PayrollRecord {
    /// Check every derivation rule against the stored values.
    ///
    /// Used on records read back from a workbook, where nothing guarantees
    /// the cells were produced by [`PayrollBuilder`].
    pub fn verify(&self, policy: &PayPolicy) -> Result<(), ValidationError> {
        let total = self.days.total();
        if total != i64::from(policy.period_length) {
            return Err(ValidationError::DayTotalMismatch {
                expected: policy.period_length,
                actual: total,
            });
        }
        check_field("total_days", total, i64::from(self.total_days))?;

        let present = i64::from(self.days.present);
        check_field(
            "meal_amount",
            mul("meal_amount", self.meal_rate, present)?,
            self.meal_amount,
        )?;
        check_field(
            "trans_amount",
            mul("trans_amount", self.trans_rate, present)?,
            self.trans_amount,
        )?;
        check_field(
            "overtime_amount",
            mul("overtime_amount", self.overtime_hours, self.overtime_rate)?,
            self.overtime_amount,
        )?;

        let allowance = if self.days.absence > 0 {
            0
        } else {
            policy.attendance_allowance
        };
        check_field("attendance_allowance", allowance, self.attendance_allowance)?;

        let gross = sum(
            "gross",
            &[
                self.base_salary,
                self.meal_amount,
                self.trans_amount,
                self.attendance_allowance,
                self.health_allowance,
                self.bonus,
                self.overtime_amount,
                self.incentive,
                self.accessory_fee,
            ],
        )?;
        check_field("gross", gross, self.gross)?;

        let deduction = sum(
            "total_deduction",
            &[self.insurance, self.admin_fee, self.loan],
        )?;
        check_field("total_deduction", deduction, self.total_deduction)?;

        let net = self
            .gross
            .checked_sub(self.total_deduction)
            .ok_or(ValidationError::Overflow("net"))?;
        check_field("net", net, self.net)
    }
}

fn day(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeDays { field, value });
    }
    u32::try_from(value).map_err(|_| ValidationError::Overflow(field))
}

fn check_pay(pay: &PayParams) -> Result<(), ValidationError> {
    let fields = [
        ("base_salary", pay.base_salary),
        ("meal_rate", pay.meal_rate),
        ("trans_rate", pay.trans_rate),
        ("bonus", pay.bonus),
        ("overtime_hours", pay.overtime_hours),
        ("overtime_rate", pay.overtime_rate),
        ("incentive", pay.incentive),
        ("accessory_fee", pay.accessory_fee),
        ("loan", pay.loan),
    ];
    non_negative(&fields)
}

fn check_policy(policy: &PayPolicy) -> Result<(), ValidationError> {
    let fields = [
        ("attendance_allowance", policy.attendance_allowance),
        ("health_allowance", policy.health_allowance),
        ("insurance", policy.insurance),
        ("admin_fee", policy.admin_fee),
    ];
    non_negative(&fields)
}

fn non_negative(fields: &[(&'static str, i64)]) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, v)| *v < 0) {
        Some(&(field, value)) => Err(ValidationError::NegativeAmount { field, value }),
        None => Ok(()),
    }
}

/// Amounts are written as spreadsheet numbers, which are exact only up to 2^53 - 1.
fn within_cell_range(fields: &[(&'static str, i64)]) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, v)| v.abs() > MAX_CELL_AMOUNT) {
        Some(&(field, value)) => Err(ValidationError::OutOfRange { field, value }),
        None => Ok(()),
    }
}

fn mul(field: &'static str, a: i64, b: i64) -> Result<i64, ValidationError> {
    a.checked_mul(b).ok_or(ValidationError::Overflow(field))
}

fn sum(field: &'static str, parts: &[i64]) -> Result<i64, ValidationError> {
    parts
        .iter()
        .try_fold(0i64, |acc, &v| acc.checked_add(v))
        .ok_or(ValidationError::Overflow(field))
}

fn check_field(field: &'static str, expected: i64, actual: i64) -> Result<(), ValidationError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ValidationError::Mismatch {
            field,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn employee() -> Employee {
        Employee {
            no: 3,
            name: "Siti Wijaya 3".into(),
            national_id: "3201234567890123".into(),
            division: "Wrapping".into(),
            job_title: "Helper".into(),
            phone: "081234567890".into(),
            account_number: "9876543210".into(),
            account_holder: "Siti Wijaya 3".into(),
        }
    }

    fn period() -> Period {
        Period::from_first_day(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()).unwrap()
    }

    fn pay() -> PayParams {
        PayParams {
            base_salary: 4_000_000,
            meal_rate: 15_000,
            trans_rate: 10_000,
            bonus: 500_000,
            overtime_hours: 10,
            overtime_rate: 20_000,
            incentive: 25_000,
            accessory_fee: 12_000,
            loan: 0,
        }
    }

    fn attendance(present: i64) -> AttendanceParams {
        AttendanceParams {
            present,
            off: 26 - present,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_known_values() {
        let record = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(24), &pay())
            .unwrap();

        assert_eq!(record.total_days, 26);
        assert_eq!(record.meal_amount, 360_000);
        assert_eq!(record.trans_amount, 240_000);
        assert_eq!(record.attendance_allowance, 200_000);
        assert_eq!(record.overtime_amount, 200_000);
        // 4_000_000 + 360_000 + 240_000 + 200_000 + 150_000 + 500_000 + 200_000 + 25_000 + 12_000
        assert_eq!(record.gross, 5_687_000);
        assert_eq!(record.total_deduction, 106_500);
        assert_eq!(record.net, 5_580_500);
        assert_eq!(record.account_number, "9876543210");
        assert_eq!(record.no, 3);
    }

    #[test]
    fn test_absence_forfeits_attendance_allowance() {
        let a = AttendanceParams {
            present: 22,
            off: 3,
            absence: 1,
            ..Default::default()
        };
        let record = PayrollBuilder::default()
            .build(&employee(), period(), &a, &pay())
            .unwrap();
        assert_eq!(record.attendance_allowance, 0);
        assert!(record.verify(&PayPolicy::default()).is_ok());
    }

    #[test]
    fn test_sick_and_leave_keep_attendance_allowance() {
        let a = AttendanceParams {
            present: 20,
            off: 3,
            sick: 1,
            permission: 1,
            leave: 1,
            absence: 0,
        };
        let record = PayrollBuilder::default()
            .build(&employee(), period(), &a, &pay())
            .unwrap();
        assert_eq!(record.attendance_allowance, 200_000);
    }

    #[test]
    fn test_negative_days_rejected() {
        let a = AttendanceParams {
            present: 27,
            off: -1,
            ..Default::default()
        };
        let err = PayrollBuilder::default()
            .build(&employee(), period(), &a, &pay())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeDays {
                field: "off",
                value: -1
            }
        );
    }

    #[test]
    fn test_day_total_mismatch_rejected() {
        let a = AttendanceParams {
            present: 20,
            off: 2,
            ..Default::default()
        };
        let err = PayrollBuilder::default()
            .build(&employee(), period(), &a, &pay())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DayTotalMismatch {
                expected: 26,
                actual: 22
            }
        );
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut p = pay();
        p.bonus = -5;
        let err = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(26), &p)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeAmount { field: "bonus", .. }
        ));
    }

    #[test]
    fn test_overflow_reported() {
        let mut p = pay();
        p.overtime_hours = i64::MAX;
        let err = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(26), &p)
            .unwrap_err();
        assert_eq!(err, ValidationError::Overflow("overtime_amount"));
    }

    #[test]
    fn test_custom_period_length() {
        let policy = PayPolicy {
            period_length: 22,
            ..Default::default()
        };
        let a = AttendanceParams {
            present: 20,
            off: 2,
            ..Default::default()
        };
        let record = PayrollBuilder::new(policy.clone())
            .build(&employee(), period(), &a, &pay())
            .unwrap();
        assert_eq!(record.total_days, 22);
        assert!(record.verify(&policy).is_ok());
    }

    #[test]
    fn test_invariants_hold_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(42);
        let builder = PayrollBuilder::default();

        for _ in 0..500 {
            // Random partition of 26 days into six buckets.
            let mut remaining = 26i64;
            let mut take = |rng: &mut StdRng| {
                let v = rng.gen_range(0..=remaining);
                remaining -= v;
                v
            };
            let present = take(&mut rng);
            let sick = take(&mut rng);
            let permission = take(&mut rng);
            let absence = take(&mut rng);
            let leave = take(&mut rng);
            let a = AttendanceParams {
                present,
                sick,
                permission,
                absence,
                leave,
                off: remaining,
            };
            let p = PayParams {
                base_salary: rng.gen_range(0..10_000_000),
                meal_rate: rng.gen_range(0..50_000),
                trans_rate: rng.gen_range(0..50_000),
                bonus: rng.gen_range(0..2_000_000),
                overtime_hours: rng.gen_range(0..40),
                overtime_rate: rng.gen_range(0..50_000),
                incentive: rng.gen_range(0..100_000),
                accessory_fee: rng.gen_range(0..50_000),
                loan: rng.gen_range(0..1_000_000),
            };

            let r = builder.build(&employee(), period(), &a, &p).unwrap();
            assert_eq!(r.days.total(), 26);
            assert_eq!(r.gross - r.total_deduction, r.net);
            assert_eq!(r.attendance_allowance == 0, absence > 0);
            assert!(r.verify(builder.policy()).is_ok());
        }
    }

    #[test]
    fn test_verify_detects_tampered_net() {
        let mut record = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(25), &pay())
            .unwrap();
        record.net += 1;
        assert!(matches!(
            record.verify(&PayPolicy::default()),
            Err(ValidationError::Mismatch { field: "net", .. })
        ));
    }

    #[test]
    fn test_verify_detects_tampered_overtime() {
        let p = PayParams {
            overtime_hours: 10,
            overtime_rate: 20_000,
            ..pay()
        };
        let mut record = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(25), &p)
            .unwrap();
        record.overtime_amount += 1_000_000;
        record.gross += 1_000_000;
        record.net += 1_000_000;
        assert!(matches!(
            record.verify(&PayPolicy::default()),
            Err(ValidationError::Mismatch {
                field: "overtime_amount",
                ..
            })
        ));
    }

    #[test]
    fn test_verify_oversized_day_count_is_mismatch() {
        let mut record = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(25), &pay())
            .unwrap();
        record.days.off = u32::MAX;
        record.days.sick = 30;
        match record.verify(&PayPolicy::default()) {
            Err(ValidationError::DayTotalMismatch { expected, actual }) => {
                assert_eq!(expected, 26);
                assert!(actual > i64::from(u32::MAX));
            }
            other => panic!("expected DayTotalMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_amount_beyond_exact_cell_range_rejected() {
        let at_limit = PayParams {
            base_salary: MAX_CELL_AMOUNT - 1_000_000,
            ..pay()
        };
        // Gross crosses the limit even though the salary alone does not.
        assert!(matches!(
            PayrollBuilder::default().build(&employee(), period(), &attendance(25), &at_limit),
            Err(ValidationError::OutOfRange { field: "gross", .. })
        ));

        let too_big = PayParams {
            base_salary: MAX_CELL_AMOUNT + 2,
            ..pay()
        };
        assert!(matches!(
            PayrollBuilder::default().build(&employee(), period(), &attendance(25), &too_big),
            Err(ValidationError::OutOfRange {
                field: "base_salary",
                ..
            })
        ));
    }

    #[test]
    fn test_verify_detects_wrong_allowance() {
        let mut record = PayrollBuilder::default()
            .build(&employee(), period(), &attendance(26), &pay())
            .unwrap();
        record.days.present -= 1;
        record.days.absence += 1;
        assert!(matches!(
            record.verify(&PayPolicy::default()),
            Err(ValidationError::Mismatch { .. })
        ));
    }
}
