use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::builder::ValidationError;

/// One row of the employee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub no: u32,
    pub name: String,
    /// National ID (NIK), 16 digits.
    pub national_id: String,
    pub division: String,
    pub job_title: String,
    pub phone: String,
    pub account_number: String,
    /// Mirrors `name` for generated rosters.
    pub account_holder: String,
}

impl Employee {
    /// Placeholder used when no roster file is available.
    pub fn placeholder(no: u32) -> Self {
        let name = format!("Employee {no}");
        Self {
            no,
            account_holder: name.clone(),
            name,
            national_id: String::new(),
            division: String::new(),
            job_title: String::new(),
            phone: String::new(),
            account_number: format!("123456{no}"),
        }
    }
}

pub type Roster = Vec<Employee>;

/// Row of the invitation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub name: String,
    pub email: String,
}

/// A payroll cycle, identified by the first calendar day of its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct Period(NaiveDate);

impl Period {
    /// Accept only a date that already falls on the first of its month.
    pub fn from_first_day(date: NaiveDate) -> Result<Self, ValidationError> {
        if date.day() != 1 {
            return Err(ValidationError::PeriodNotFirstDay(date));
        }
        Ok(Self(date))
    }

    /// The period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    /// Parse `YYYY-MM` or a full `YYYY-MM-01` date.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
            .map_err(|_| ValidationError::InvalidPeriod(s.to_string()))?;
        Self::from_first_day(date)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }
}

impl TryFrom<NaiveDate> for Period {
    type Error = ValidationError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        Self::from_first_day(date)
    }
}

impl From<Period> for NaiveDate {
    fn from(period: Period) -> Self {
        period.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Raw attendance input. Signed so that negative counts can be rejected
/// instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceParams {
    pub present: i64,
    pub off: i64,
    pub sick: i64,
    pub permission: i64,
    /// Unexcused absence ("alpha").
    pub absence: i64,
    /// Paid leave ("cuti").
    pub leave: i64,
}

/// Per-employee pay input. All money is whole rupiah.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayParams {
    pub base_salary: i64,
    pub meal_rate: i64,
    pub trans_rate: i64,
    pub bonus: i64,
    pub overtime_hours: i64,
    pub overtime_rate: i64,
    /// Per-unit production incentive ("target koli").
    pub incentive: i64,
    pub accessory_fee: i64,
    pub loan: i64,
}

/// Flat amounts shared by every record of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayPolicy {
    /// Paid only when the employee has no unexcused absence.
    pub attendance_allowance: i64,
    pub health_allowance: i64,
    /// BPJS TK contribution.
    pub insurance: i64,
    pub admin_fee: i64,
    /// Canonical number of days in a period.
    pub period_length: u32,
}

impl Default for PayPolicy {
    fn default() -> Self {
        Self {
            attendance_allowance: 200_000,
            health_allowance: 150_000,
            insurance: 100_000,
            admin_fee: 6_500,
            period_length: 26,
        }
    }
}

/// Validated attendance counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounts {
    pub present: u32,
    pub off: u32,
    pub sick: u32,
    pub permission: u32,
    pub absence: u32,
    pub leave: u32,
}

impl DayCounts {
    /// Sum of all six counts, widened so arbitrary cell values cannot overflow.
    pub fn total(&self) -> i64 {
        [
            self.present,
            self.off,
            self.sick,
            self.permission,
            self.absence,
            self.leave,
        ]
        .iter()
        .map(|&d| i64::from(d))
        .sum()
    }
}

/// One payroll row. Holds every value written to the sheet so that a
/// read-back compares equal field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub no: u32,
    pub employee_name: String,
    pub period: Period,
    pub account_number: String,

    pub total_days: u32,
    pub days: DayCounts,

    pub base_salary: i64,
    pub training_salary: i64,
    pub meal_rate: i64,
    pub meal_amount: i64,
    pub trans_rate: i64,
    pub trans_amount: i64,
    pub attendance_allowance: i64,
    pub health_allowance: i64,
    pub bonus: i64,
    pub overtime_hours: i64,
    pub overtime_amount: i64,
    pub incentive: i64,
    pub accessory_fee: i64,
    pub gross: i64,

    pub loan: i64,
    pub admin_fee: i64,
    pub insurance: i64,
    pub total_deduction: i64,

    pub net: i64,
}
