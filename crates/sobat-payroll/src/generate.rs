//! Dummy rosters, payroll inputs and invitation lists.
//!
//! Every function takes the random source explicitly; callers seed it so a
//! run can be reproduced.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::builder::{PayrollBuilder, ValidationError};
use crate::types::{AttendanceParams, Employee, Invite, PayParams, PayrollRecord, Period, Roster};

const FIRST_NAMES: [&str; 20] = [
    "Budi", "Siti", "Ahmad", "Dewi", "Rudi", "Nina", "Eko", "Rina", "Joko", "Maya", "Adit",
    "Putri", "Bayu", "Sarah", "Dimas", "Hana", "Fajar", "Lia", "Rizky", "Tia",
];

const LAST_NAMES: [&str; 20] = [
    "Santoso", "Wijaya", "Saputra", "Utami", "Pratama", "Kusuma", "Hidayat", "Lestari", "Wibowo",
    "Anggraini", "Nugroho", "Sari", "Firmansyah", "Rahayu", "Setiawan", "Mardiana", "Kurniawan",
    "Susanti", "Purnomo", "Handayani",
];

/// Operational positions in the wrapping division.
pub const POSITIONS: [&str; 5] = [
    "Crew Wrapping",
    "Senior Wrapper",
    "Quality Control",
    "Helper",
    "Team Leader Wrapping",
];

const BASE_SALARIES: [i64; 4] = [3_500_000, 4_000_000, 4_500_000, 5_000_000];
const BONUSES: [i64; 3] = [0, 500_000, 1_000_000];
const MEAL_RATE: i64 = 15_000;
const TRANS_RATE: i64 = 10_000;
const OVERTIME_RATE: i64 = 20_000;
const MIN_PRESENT_DAYS: u32 = 20;
const MAX_OVERTIME_HOURS: i64 = 20;
const MAX_INCENTIVE: i64 = 100_000;
const MAX_ACCESSORY_FEE: i64 = 50_000;

const INVITES: [(&str, &str); 10] = [
    ("Budi Santoso", "budi.santoso@sobat.co.id"),
    ("Siti Aminah", "siti.aminah@sobat.co.id"),
    ("Rizky Pratama", "rizky.pratama@sobat.co.id"),
    ("Dewi Kartika", "dewi.kartika@sobat.co.id"),
    ("Agus Setiawan", "agus.setiawan@sobat.co.id"),
    ("Nina Marlina", "nina.marlina@sobat.co.id"),
    ("Hendra Wijaya", "hendra.wijaya@sobat.co.id"),
    ("Ratna Sari", "ratna.sari@sobat.co.id"),
    ("Doni Saputra", "doni.saputra@sobat.co.id"),
    ("Eka Putri", "eka.putri@sobat.co.id"),
];

fn digits<R: Rng + ?Sized>(rng: &mut R, n: usize) -> String {
    (0..n)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Generate `count` employees numbered from 1.
pub fn roster<R: Rng + ?Sized>(rng: &mut R, count: u32, division: &str) -> Roster {
    (1..=count)
        .map(|no| {
            let name = format!(
                "{} {} {no}",
                pick(rng, &FIRST_NAMES),
                pick(rng, &LAST_NAMES)
            );
            Employee {
                no,
                national_id: digits(rng, 16),
                division: division.to_string(),
                job_title: pick(rng, &POSITIONS).to_string(),
                phone: format!("08{}", digits(rng, 10)),
                account_number: digits(rng, 10),
                account_holder: name.clone(),
                name,
            }
        })
        .collect()
}

/// Draw attendance and pay inputs for one employee.
///
/// Every non-present working day is an off day, so the counts always sum to
/// `period_length`.
pub fn pay_inputs<R: Rng + ?Sized>(
    rng: &mut R,
    period_length: u32,
) -> (AttendanceParams, PayParams) {
    let present = i64::from(rng.gen_range(MIN_PRESENT_DAYS.min(period_length)..=period_length));
    let attendance = AttendanceParams {
        present,
        off: i64::from(period_length) - present,
        ..Default::default()
    };

    let pay = PayParams {
        base_salary: *BASE_SALARIES.choose(rng).unwrap_or(&BASE_SALARIES[0]),
        meal_rate: MEAL_RATE,
        trans_rate: TRANS_RATE,
        bonus: *BONUSES.choose(rng).unwrap_or(&0),
        overtime_hours: rng.gen_range(0..=MAX_OVERTIME_HOURS),
        overtime_rate: OVERTIME_RATE,
        incentive: rng.gen_range(0..=MAX_INCENTIVE),
        accessory_fee: rng.gen_range(0..=MAX_ACCESSORY_FEE),
        loan: 0,
    };
    (attendance, pay)
}

/// Build one dummy payroll record per roster entry.
pub fn payroll<R: Rng + ?Sized>(
    rng: &mut R,
    builder: &PayrollBuilder,
    roster: &[Employee],
    period: Period,
) -> Result<Vec<PayrollRecord>, ValidationError> {
    let period_length = builder.policy().period_length;
    roster
        .iter()
        .map(|employee| {
            let (attendance, pay) = pay_inputs(rng, period_length);
            builder.build(employee, period, &attendance, &pay)
        })
        .collect()
}

/// The fixed invitation list.
pub fn invites() -> Vec<Invite> {
    INVITES
        .iter()
        .map(|(name, email)| Invite {
            name: name.to_string(),
            email: email.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PayPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roster_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let roster = roster(&mut rng, 50, "Wrapping");
        assert_eq!(roster.len(), 50);
        for (i, e) in roster.iter().enumerate() {
            assert_eq!(e.no as usize, i + 1);
            assert!(e.name.ends_with(&format!(" {}", i + 1)));
            assert_eq!(e.national_id.len(), 16);
            assert!(e.national_id.chars().all(|c| c.is_ascii_digit()));
            assert!(e.phone.starts_with("08"));
            assert_eq!(e.phone.len(), 12);
            assert_eq!(e.account_number.len(), 10);
            assert_eq!(e.account_holder, e.name);
            assert_eq!(e.division, "Wrapping");
            assert!(POSITIONS.contains(&e.job_title.as_str()));
        }
    }

    #[test]
    fn test_same_seed_same_roster() {
        let a = roster(&mut StdRng::seed_from_u64(5), 10, "Wrapping");
        let b = roster(&mut StdRng::seed_from_u64(5), 10, "Wrapping");
        let c = roster(&mut StdRng::seed_from_u64(6), 10, "Wrapping");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pay_inputs_ranges() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let (a, p) = pay_inputs(&mut rng, 26);
            assert!((20..=26).contains(&a.present));
            assert_eq!(a.present + a.off, 26);
            assert_eq!(a.sick + a.permission + a.absence + a.leave, 0);
            assert!(BASE_SALARIES.contains(&p.base_salary));
            assert!(BONUSES.contains(&p.bonus));
            assert!((0..=20).contains(&p.overtime_hours));
            assert!((0..=100_000).contains(&p.incentive));
            assert!((0..=50_000).contains(&p.accessory_fee));
            assert_eq!(p.loan, 0);
        }
    }

    #[test]
    fn test_short_period_still_sums() {
        let mut rng = StdRng::seed_from_u64(3);
        let (a, _) = pay_inputs(&mut rng, 15);
        assert_eq!(a.present, 15);
        assert_eq!(a.off, 0);
    }

    #[test]
    fn test_payroll_records_satisfy_invariants() {
        let mut rng = StdRng::seed_from_u64(4);
        let roster = roster(&mut rng, 50, "Wrapping");
        let builder = PayrollBuilder::default();
        let records = payroll(&mut rng, &builder, &roster, Period::parse("2026-01").unwrap())
            .unwrap();

        assert_eq!(records.len(), 50);
        for (record, employee) in records.iter().zip(&roster) {
            assert_eq!(record.employee_name, employee.name);
            assert_eq!(record.account_number, employee.account_number);
            assert_eq!(record.gross - record.total_deduction, record.net);
            assert_eq!(record.attendance_allowance, 200_000);
            assert!(record.verify(&PayPolicy::default()).is_ok());
        }
    }

    #[test]
    fn test_invites_fixed_list() {
        let list = invites();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].name, "Budi Santoso");
        assert!(list.iter().all(|i| i.email.ends_with("@sobat.co.id")));
    }
}
