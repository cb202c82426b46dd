//! Fixed-position payroll sheet layout.
//!
//! The import controller reads cells by column letter starting at row 4 and
//! never looks at header text, so position is the contract: columns must not
//! be inserted, removed or reordered.

use chrono::{Days, NaiveDate};

use crate::types::{DayCounts, PayrollRecord, Period};
use crate::workbook::SheetError;

/// Zero-based index of the row holding human-readable headers (row 2).
pub const HEADER_ROW: u32 = 1;
/// Zero-based index of the first data row (row 4). Rows 1-3 are reserved.
pub const DATA_START_ROW: u32 = 3;
/// Number of columns, A through AM.
pub const COLUMN_COUNT: usize = 39;
/// Largest amount a numeric cell holds exactly (2^53 - 1).
pub const MAX_CELL_AMOUNT: i64 = (1 << 53) - 1;

/// Zero-based column positions.
pub mod col {
    pub const NO: usize = 0; // A
    pub const NAME: usize = 1; // B
    pub const PERIOD: usize = 2; // C
    pub const ACCOUNT: usize = 3; // D
    pub const TOTAL_DAYS: usize = 4; // E
    pub const OFF: usize = 5;
    pub const SICK: usize = 6;
    pub const PERMISSION: usize = 7;
    pub const ABSENCE: usize = 8;
    pub const LEAVE: usize = 9;
    pub const PRESENT: usize = 10; // K
    pub const BASE_SALARY: usize = 11; // L
    pub const TRAINING_SALARY: usize = 12;
    pub const MEAL_RATE: usize = 13;
    pub const MEAL_AMOUNT: usize = 14;
    pub const TRANS_RATE: usize = 15;
    pub const TRANS_AMOUNT: usize = 16;
    pub const ATTENDANCE_ALLOWANCE: usize = 17; // R
    pub const HEALTH_ALLOWANCE: usize = 18;
    pub const BONUS: usize = 19; // T
    pub const SPACER_1: usize = 20; // U
    pub const OVERTIME_LABEL: usize = 21; // V
    pub const OVERTIME_HOURS: usize = 22;
    pub const OVERTIME_AMOUNT: usize = 23;
    pub const INCENTIVE: usize = 24; // Y
    pub const ACCESSORY_FEE: usize = 25; // Z
    pub const GROSS: usize = 26; // AA
    pub const ADJ_BPJS: usize = 27;
    pub const DEDUCT_ABSENT: usize = 28;
    pub const DEDUCT_LATE: usize = 29;
    pub const DEDUCT_ALPHA: usize = 30;
    pub const LOAN: usize = 31; // AF
    pub const ADMIN_FEE: usize = 32;
    pub const INSURANCE: usize = 33;
    pub const TOTAL_DEDUCTION: usize = 34; // AI
    pub const SPACER_2: usize = 35;
    pub const EWA: usize = 36;
    pub const NET: usize = 37; // AL
    pub const NET_COPY: usize = 38; // AM
}

/// Header text for row 2. Informational only.
pub const HEADERS: [&str; COLUMN_COUNT] = [
    "No",
    "Nama Karyawan",
    "Periode",
    "No Rekening",
    "Total Hari",
    "Off",
    "Sakit",
    "Ijin",
    "Alpha",
    "Cuti",
    "Hadir",
    "Gaji Pokok",
    "Gaji Training",
    "Meal Rate",
    "Meal Amount",
    "Trans Rate",
    "Trans Amount",
    "Tunj Hadir",
    "Tunj Sehat",
    "Bonus",
    "",
    "Lembur",
    "Lembur Jam",
    "Lembur Rp",
    "Target Koli",
    "Fee Aksesoris",
    "Gross",
    "Adj BPJS",
    "Pot Absen",
    "Pot Telat",
    "Pot Alpha",
    "Pot Kasbon",
    "Adm Bank",
    "BPJS TK",
    "Total Pot",
    "",
    "EWA",
    "Net Salary",
    "Net Salary",
];

/// Literal written into the overtime label column of every data row.
pub const OVERTIME_LABEL: &str = "Lembur";

/// A sheet cell, independent of the xlsx backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

/// Spreadsheet column letter for a zero-based index (0 -> "A", 38 -> "AM").
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Convert an Excel 1900-system serial day number to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

/// Lay a record out as one full-width row.
pub fn encode(record: &PayrollRecord) -> Vec<Cell> {
    let mut row = vec![Cell::Blank; COLUMN_COUNT];
    let num = |v: i64| Cell::Number(v as f64);
    let days = |v: u32| Cell::Number(f64::from(v));

    row[col::NO] = days(record.no);
    row[col::NAME] = Cell::Text(record.employee_name.clone());
    row[col::PERIOD] = Cell::Date(record.period.first_day());
    row[col::ACCOUNT] = Cell::Text(record.account_number.clone());

    row[col::TOTAL_DAYS] = days(record.total_days);
    row[col::OFF] = days(record.days.off);
    row[col::SICK] = days(record.days.sick);
    row[col::PERMISSION] = days(record.days.permission);
    row[col::ABSENCE] = days(record.days.absence);
    row[col::LEAVE] = days(record.days.leave);
    row[col::PRESENT] = days(record.days.present);

    row[col::BASE_SALARY] = num(record.base_salary);
    row[col::TRAINING_SALARY] = num(record.training_salary);
    row[col::MEAL_RATE] = num(record.meal_rate);
    row[col::MEAL_AMOUNT] = num(record.meal_amount);
    row[col::TRANS_RATE] = num(record.trans_rate);
    row[col::TRANS_AMOUNT] = num(record.trans_amount);
    row[col::ATTENDANCE_ALLOWANCE] = num(record.attendance_allowance);
    row[col::HEALTH_ALLOWANCE] = num(record.health_allowance);
    row[col::BONUS] = num(record.bonus);
    row[col::OVERTIME_LABEL] = Cell::Text(OVERTIME_LABEL.to_string());
    row[col::OVERTIME_HOURS] = num(record.overtime_hours);
    row[col::OVERTIME_AMOUNT] = num(record.overtime_amount);
    row[col::INCENTIVE] = num(record.incentive);
    row[col::ACCESSORY_FEE] = num(record.accessory_fee);
    row[col::GROSS] = num(record.gross);

    for reserved in [
        col::ADJ_BPJS,
        col::DEDUCT_ABSENT,
        col::DEDUCT_LATE,
        col::DEDUCT_ALPHA,
        col::EWA,
    ] {
        row[reserved] = num(0);
    }
    row[col::LOAN] = num(record.loan);
    row[col::ADMIN_FEE] = num(record.admin_fee);
    row[col::INSURANCE] = num(record.insurance);
    row[col::TOTAL_DEDUCTION] = num(record.total_deduction);

    row[col::NET] = num(record.net);
    row[col::NET_COPY] = num(record.net);
    row
}

/// Rebuild a record from a data row. `sheet_row` is the 1-based row number,
/// used only for error messages. Missing trailing cells read as blank.
pub fn decode(cells: &[Cell], sheet_row: u32) -> Result<PayrollRecord, SheetError> {
    let reader = RowReader { cells, sheet_row };

    let days = DayCounts {
        present: reader.count(col::PRESENT)?,
        off: reader.count(col::OFF)?,
        sick: reader.count(col::SICK)?,
        permission: reader.count(col::PERMISSION)?,
        absence: reader.count(col::ABSENCE)?,
        leave: reader.count(col::LEAVE)?,
    };

    Ok(PayrollRecord {
        no: reader.count(col::NO)?,
        employee_name: reader.text(col::NAME),
        period: reader.period(col::PERIOD)?,
        account_number: reader.text(col::ACCOUNT),
        total_days: reader.count(col::TOTAL_DAYS)?,
        days,
        base_salary: reader.amount(col::BASE_SALARY)?,
        training_salary: reader.amount(col::TRAINING_SALARY)?,
        meal_rate: reader.amount(col::MEAL_RATE)?,
        meal_amount: reader.amount(col::MEAL_AMOUNT)?,
        trans_rate: reader.amount(col::TRANS_RATE)?,
        trans_amount: reader.amount(col::TRANS_AMOUNT)?,
        attendance_allowance: reader.amount(col::ATTENDANCE_ALLOWANCE)?,
        health_allowance: reader.amount(col::HEALTH_ALLOWANCE)?,
        bonus: reader.amount(col::BONUS)?,
        overtime_hours: reader.amount(col::OVERTIME_HOURS)?,
        overtime_amount: reader.amount(col::OVERTIME_AMOUNT)?,
        incentive: reader.amount(col::INCENTIVE)?,
        accessory_fee: reader.amount(col::ACCESSORY_FEE)?,
        gross: reader.amount(col::GROSS)?,
        loan: reader.amount(col::LOAN)?,
        admin_fee: reader.amount(col::ADMIN_FEE)?,
        insurance: reader.amount(col::INSURANCE)?,
        total_deduction: reader.amount(col::TOTAL_DEDUCTION)?,
        net: reader.amount(col::NET)?,
    })
}

struct RowReader<'a> {
    cells: &'a [Cell],
    sheet_row: u32,
}

impl RowReader<'_> {
    fn cell(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&Cell::Blank)
    }

    fn invalid(&self, index: usize, reason: impl Into<String>) -> SheetError {
        SheetError::InvalidCell {
            row: self.sheet_row,
            column: column_letter(index),
            reason: reason.into(),
        }
    }

    /// Whole number; blank reads as zero like the import controller does.
    fn amount(&self, index: usize) -> Result<i64, SheetError> {
        match self.cell(index) {
            Cell::Blank => Ok(0),
            Cell::Number(n) if n.fract() != 0.0 => {
                Err(self.invalid(index, format!("{n} is not a whole number")))
            }
            Cell::Number(n) if n.abs() > MAX_CELL_AMOUNT as f64 => {
                Err(self.invalid(index, format!("{n} is out of range")))
            }
            Cell::Number(n) => Ok(*n as i64),
            Cell::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(index, format!("{s:?} is not a number"))),
            Cell::Date(d) => Err(self.invalid(index, format!("unexpected date {d}"))),
        }
    }

    fn count(&self, index: usize) -> Result<u32, SheetError> {
        let v = self.amount(index)?;
        u32::try_from(v).map_err(|_| self.invalid(index, format!("{v} is not a day count")))
    }

    fn text(&self, index: usize) -> String {
        match self.cell(index) {
            Cell::Blank => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.to_string(),
        }
    }

    fn period(&self, index: usize) -> Result<Period, SheetError> {
        let date = match self.cell(index) {
            Cell::Date(d) => *d,
            Cell::Number(n) => excel_serial_to_date(*n)
                .ok_or_else(|| self.invalid(index, format!("{n} is not a date serial")))?,
            Cell::Text(s) => {
                return Period::parse(s).map_err(|e| self.invalid(index, e.to_string()))
            }
            Cell::Blank => return Err(self.invalid(index, "period is empty")),
        };
        Period::from_first_day(date).map_err(|e| self.invalid(index, e.to_string()))
    }
}
