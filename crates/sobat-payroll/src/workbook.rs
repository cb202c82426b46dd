//! Workbook reading and writing.
//!
//! Writes go through `rust_xlsxwriter` and always replace the whole file.
//! Reads go through `calamine` and only look at the first worksheet.

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::builder::ValidationError;
use crate::layout::{self, Cell, COLUMN_COUNT, DATA_START_ROW, HEADER_ROW};
use crate::types::{Employee, Invite, PayrollRecord, Roster};

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("cannot open {}: {reason}", path.display())]
    MissingInput { path: PathBuf, reason: String },
    #[error("workbook {} has no worksheet", .0.display())]
    EmptyWorkbook(PathBuf),
    #[error("column {0:?} not found in header row")]
    MissingColumn(String),
    #[error("row {row}, column {column}: {reason}")]
    InvalidCell {
        row: u32,
        column: String,
        reason: String,
    },
    #[error("row {row}: {source}")]
    Invalid {
        row: u32,
        #[source]
        source: ValidationError,
    },
    #[error("xlsx write: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("xlsx read: {0}")]
    Read(#[from] calamine::Error),
}

/// Roster header contract, in the order they are written.
pub const ROSTER_HEADERS: [&str; 8] = [
    "No",
    "Nama Karyawan",
    "NIK",
    "Divisi",
    "Jabatan",
    "No HP",
    "No Rekening",
    "Nama Pemilik Rekening",
];

/// Zero-based row holding the roster headers (row 1).
pub const ROSTER_HEADER_ROW: u32 = 0;

pub const INVITE_HEADERS: [&str; 2] = ["Nama", "Email"];

const PAYROLL_SHEET: &str = "Payroll";
const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Write payroll records in the fixed layout, replacing `path`.
pub fn write_payroll(path: &Path, records: &[PayrollRecord]) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(PAYROLL_SHEET)?;

    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (c, header) in layout::HEADERS.iter().enumerate() {
        if !header.is_empty() {
            sheet.write_string_with_format(HEADER_ROW, c as u16, *header, &bold)?;
        }
    }

    for (i, record) in records.iter().enumerate() {
        let row = DATA_START_ROW + i as u32;
        for (c, cell) in layout::encode(record).iter().enumerate() {
            write_cell(sheet, row, c as u16, cell, &date_format)?;
        }
    }

    sheet.set_freeze_panes(DATA_START_ROW, 2)?;
    workbook.save(path)?;

    tracing::info!(path = %path.display(), rows = records.len(), "payroll workbook written");
    Ok(())
}

/// Read payroll records back by position. Rows with an empty name are
/// skipped, matching the import controller.
pub fn read_payroll(path: &Path) -> Result<Vec<PayrollRecord>, SheetError> {
    let range = first_sheet(path)?;
    let mut records = Vec::new();

    for row in DATA_START_ROW..=last_row(&range) {
        let cells = read_row(&range, row, COLUMN_COUNT);
        if cells[layout::col::NAME] == Cell::Blank {
            continue;
        }
        records.push(layout::decode(&cells, row + 1)?);
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "payroll workbook read");
    Ok(records)
}

/// Write a roster with its header row in row 1.
pub fn write_roster(path: &Path, roster: &[Employee]) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (c, header) in ROSTER_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, *header, &bold)?;
    }

    for (i, e) in roster.iter().enumerate() {
        let row = 1 + i as u32;
        sheet.write_number(row, 0, f64::from(e.no))?;
        // Identifiers stay text so leading zeros survive.
        let texts = [
            &e.name,
            &e.national_id,
            &e.division,
            &e.job_title,
            &e.phone,
            &e.account_number,
            &e.account_holder,
        ];
        for (offset, value) in texts.iter().enumerate() {
            sheet.write_string(row, 1 + offset as u16, value.as_str())?;
        }
    }

    sheet.autofit();
    workbook.save(path)?;

    tracing::info!(path = %path.display(), employees = roster.len(), "roster workbook written");
    Ok(())
}

/// Read a roster by header name. Only `Nama Karyawan` is mandatory; other
/// missing columns read as empty, a missing `No` falls back to row order and
/// a missing account holder mirrors the name.
pub fn read_roster(path: &Path) -> Result<Roster, SheetError> {
    let range = first_sheet(path)?;
    if range.is_empty() {
        return Ok(Vec::new());
    }
    let header_row = ROSTER_HEADER_ROW;

    let columns = header_index(&range, header_row);
    let find = |name: &str| columns.get(&name.to_lowercase()).copied();
    let name_col = find("Nama Karyawan")
        .ok_or_else(|| SheetError::MissingColumn("Nama Karyawan".into()))?;

    for header in ROSTER_HEADERS {
        if find(header).is_none() {
            tracing::debug!(column = header, "roster column missing, reading as empty");
        }
    }

    let text_at = |row: u32, c: Option<u32>| -> String {
        c.map(|c| cell_text(range.get_value((row, c))))
            .unwrap_or_default()
    };

    let mut roster = Vec::new();
    for row in (header_row + 1)..=last_row(&range) {
        let name = cell_text(range.get_value((row, name_col)));
        if name.is_empty() {
            continue;
        }
        let no = text_at(row, find("No"))
            .parse()
            .unwrap_or(roster.len() as u32 + 1);
        let holder = text_at(row, find("Nama Pemilik Rekening"));

        roster.push(Employee {
            no,
            national_id: text_at(row, find("NIK")),
            division: text_at(row, find("Divisi")),
            job_title: text_at(row, find("Jabatan")),
            phone: text_at(row, find("No HP")),
            account_number: text_at(row, find("No Rekening")),
            account_holder: if holder.is_empty() { name.clone() } else { holder },
            name,
        });
    }

    tracing::debug!(path = %path.display(), employees = roster.len(), "roster read");
    Ok(roster)
}

/// Read the roster, or fall back to `count` placeholder employees when the
/// file is missing or unreadable.
pub fn load_roster_or_placeholder(path: &Path, count: u32) -> Roster {
    match read_roster(path) {
        Ok(roster) => roster,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                count,
                "could not read roster; generating placeholder employees"
            );
            (1..=count).map(Employee::placeholder).collect()
        }
    }
}

/// Write the invitation list.
pub fn write_invites(path: &Path, invites: &[Invite]) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (c, header) in INVITE_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, *header, &bold)?;
    }
    for (i, invite) in invites.iter().enumerate() {
        let row = 1 + i as u32;
        sheet.write_string(row, 0, &invite.name)?;
        sheet.write_string(row, 1, &invite.email)?;
    }

    sheet.autofit();
    workbook.save(path)?;

    tracing::info!(path = %path.display(), invites = invites.len(), "invite workbook written");
    Ok(())
}

/// Open a workbook and load its first worksheet.
pub(crate) fn open_first_sheet(path: &Path) -> Result<(Vec<String>, Range<Data>), SheetError> {
    if !path.is_file() {
        return Err(SheetError::MissingInput {
            path: path.to_path_buf(),
            reason: "file not found".into(),
        });
    }
    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::MissingInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let names = workbook.sheet_names();
    let first = names
        .first()
        .cloned()
        .ok_or_else(|| SheetError::EmptyWorkbook(path.to_path_buf()))?;
    let range = workbook.worksheet_range(&first)?;
    Ok((names, range))
}

fn first_sheet(path: &Path) -> Result<Range<Data>, SheetError> {
    open_first_sheet(path).map(|(_, range)| range)
}

/// Last used row index, zero if the sheet is empty.
pub(crate) fn last_row(range: &Range<Data>) -> u32 {
    range.end().map(|(row, _)| row).unwrap_or(0)
}

/// Read `width` cells of an absolute row into backend-neutral cells.
pub(crate) fn read_row(range: &Range<Data>, row: u32, width: usize) -> Vec<Cell> {
    (0..width as u32)
        .map(|c| range.get_value((row, c)).map(to_cell).unwrap_or(Cell::Blank))
        .collect()
}

/// Lower-cased header text -> absolute column index.
pub(crate) fn header_index(range: &Range<Data>, header_row: u32) -> HashMap<String, u32> {
    let width = range.end().map(|(_, c)| c + 1).unwrap_or(0);
    let mut columns = HashMap::new();
    for c in 0..width {
        let text = cell_text(range.get_value((header_row, c)));
        if !text.is_empty() {
            columns.entry(text.to_lowercase()).or_insert(c);
        }
    }
    columns
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Blank,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) if s.trim().is_empty() => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            layout::excel_serial_to_date(serial)
                .map(Cell::Date)
                .unwrap_or(Cell::Number(serial))
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("{e:?}")),
    }
}

/// Text rendering of a cell; integral numbers lose their ".0" so that
/// identifiers stored as numbers read back as digit strings.
fn cell_text(data: Option<&Data>) -> String {
    match data.map(to_cell) {
        None | Some(Cell::Blank) => String::new(),
        Some(Cell::Text(s)) => s.trim().to_string(),
        Some(Cell::Number(n)) if n.fract() == 0.0 => format!("{}", n as i64),
        Some(Cell::Number(n)) => n.to_string(),
        Some(Cell::Date(d)) => d.to_string(),
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date_format: &Format,
) -> Result<(), SheetError> {
    match cell {
        Cell::Blank => {}
        Cell::Number(n) => {
            sheet.write_number(row, col, *n)?;
        }
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Date(d) => {
            let date = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
            sheet.write_datetime_with_format(row, col, &date, date_format)?;
        }
    }
    Ok(())
}
