//! Versioned sheet schemas and workbook inspection.
//!
//! A schema states where the header row is and where data begins; the
//! inspector never guesses either. Positional schemas compare header text
//! for information only, since their readers go by column position.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::layout::{self, Cell, COLUMN_COUNT};
use crate::types::PayPolicy;
use crate::workbook::{self, SheetError, INVITE_HEADERS, ROSTER_HEADERS};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaLayout {
    /// Cells are read by column position from `data_start_row`.
    Positional {
        header_row: u32,
        data_start_row: u32,
        columns: &'static [&'static str],
    },
    /// Cells are located by header text on `header_row`. The first required
    /// column identifies a data row.
    Keyed {
        header_row: u32,
        required: &'static [&'static str],
        optional: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetSchema {
    pub id: &'static str,
    pub version: u32,
    pub layout: SchemaLayout,
}

pub const PAYROLL_WRAPPING_V1: SheetSchema = SheetSchema {
    id: "payroll-wrapping",
    version: 1,
    layout: SchemaLayout::Positional {
        header_row: layout::HEADER_ROW,
        data_start_row: layout::DATA_START_ROW,
        columns: &layout::HEADERS,
    },
};

pub const ROSTER_V1: SheetSchema = SheetSchema {
    id: "roster",
    version: 1,
    layout: SchemaLayout::Keyed {
        header_row: workbook::ROSTER_HEADER_ROW,
        required: &["Nama Karyawan"],
        optional: &[
            "No",
            "NIK",
            "Divisi",
            "Jabatan",
            "No HP",
            "No Rekening",
            "Nama Pemilik Rekening",
        ],
    },
};

pub const INVITE_V1: SheetSchema = SheetSchema {
    id: "invite",
    version: 1,
    layout: SchemaLayout::Keyed {
        header_row: 0,
        required: &["Nama", "Email"],
        optional: &[],
    },
};

static SCHEMAS: [SheetSchema; 3] = [PAYROLL_WRAPPING_V1, ROSTER_V1, INVITE_V1];

/// All built-in schemas.
pub fn all() -> &'static [SheetSchema] {
    &SCHEMAS
}

/// Look up a schema by id, optionally suffixed with `@<version>`.
pub fn find(spec: &str) -> Option<&'static SheetSchema> {
    let (id, version) = match spec.split_once('@') {
        Some((id, v)) => (id, Some(v.trim_start_matches('v').parse::<u32>().ok()?)),
        None => (spec, None),
    };
    all()
        .iter()
        .filter(|s| s.id == id)
        .filter(|s| version.map_or(true, |v| s.version == v))
        .max_by_key(|s| s.version)
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderCheck {
    pub column: String,
    pub expected: String,
    pub found: Option<String>,
}

impl HeaderCheck {
    pub fn matches(&self) -> bool {
        self.found.as_deref().unwrap_or("").eq_ignore_ascii_case(&self.expected)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    /// 1-based sheet row.
    pub row: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    pub path: String,
    pub schema: String,
    pub sheets: Vec<String>,
    /// Used range as `A1:AM53`, absent for an empty sheet.
    pub used_range: Option<String>,
    pub headers: Vec<HeaderCheck>,
    pub data_rows: usize,
    pub problems: Vec<Problem>,
}

impl InspectionReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "file:       {}", self.path)?;
        writeln!(f, "schema:     {}", self.schema)?;
        writeln!(f, "sheets:     {}", self.sheets.join(", "))?;
        writeln!(
            f,
            "used range: {}",
            self.used_range.as_deref().unwrap_or("(empty)")
        )?;
        writeln!(f, "headers:")?;
        for h in &self.headers {
            let mark = if h.matches() { "ok" } else { "--" };
            writeln!(
                f,
                "  [{mark}] {:>3}: expected {:?}, found {:?}",
                h.column,
                h.expected,
                h.found.as_deref().unwrap_or("")
            )?;
        }
        writeln!(f, "data rows:  {}", self.data_rows)?;
        if self.problems.is_empty() {
            write!(f, "no problems found")
        } else {
            writeln!(f, "problems:")?;
            for p in &self.problems {
                writeln!(f, "  row {}: {}", p.row, p.message)?;
            }
            write!(f, "{} problem(s)", self.problems.len())
        }
    }
}

/// Inspect the first worksheet of `path` against `schema`.
pub fn inspect(
    path: &Path,
    schema: &SheetSchema,
    policy: &PayPolicy,
) -> Result<InspectionReport, SheetError> {
    let (sheets, range) = workbook::open_first_sheet(path)?;

    let used_range = match (range.start(), range.end()) {
        (Some((r0, c0)), Some((r1, c1))) => Some(format!(
            "{}{}:{}{}",
            layout::column_letter(c0 as usize),
            r0 + 1,
            layout::column_letter(c1 as usize),
            r1 + 1
        )),
        _ => None,
    };

    let mut report = InspectionReport {
        path: path.display().to_string(),
        schema: format!("{} v{}", schema.id, schema.version),
        sheets,
        used_range,
        headers: Vec::new(),
        data_rows: 0,
        problems: Vec::new(),
    };

    match &schema.layout {
        SchemaLayout::Positional {
            header_row,
            data_start_row,
            columns,
        } => inspect_positional(&range, *header_row, *data_start_row, columns, policy, &mut report),
        SchemaLayout::Keyed {
            header_row,
            required,
            optional,
        } => inspect_keyed(&range, *header_row, required, optional, &mut report),
    }

    tracing::info!(
        path = %report.path,
        schema = %report.schema,
        data_rows = report.data_rows,
        problems = report.problems.len(),
        "inspection finished"
    );
    Ok(report)
}

fn cell_label(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Blank => None,
        Cell::Text(s) => Some(s.trim().to_string()),
        Cell::Number(n) => Some(n.to_string()),
        Cell::Date(d) => Some(d.to_string()),
    }
}

fn inspect_positional(
    range: &calamine::Range<calamine::Data>,
    header_row: u32,
    data_start_row: u32,
    columns: &[&str],
    policy: &PayPolicy,
    report: &mut InspectionReport,
) {
    let headers = workbook::read_row(range, header_row, columns.len());
    report.headers = columns
        .iter()
        .zip(&headers)
        .enumerate()
        .filter(|(_, (expected, _))| !expected.is_empty())
        .map(|(i, (expected, found))| HeaderCheck {
            column: layout::column_letter(i),
            expected: expected.to_string(),
            found: cell_label(found),
        })
        .collect();

    if let Some((_, last_col)) = range.end() {
        if last_col as usize >= COLUMN_COUNT {
            report.problems.push(Problem {
                row: header_row + 1,
                message: format!(
                    "sheet uses columns up to {}, layout ends at {}",
                    layout::column_letter(last_col as usize),
                    layout::column_letter(COLUMN_COUNT - 1)
                ),
            });
        }
    }

    for row in data_start_row..=workbook::last_row(range) {
        let cells = workbook::read_row(range, row, COLUMN_COUNT);
        if cells[layout::col::NAME] == Cell::Blank {
            continue;
        }
        report.data_rows += 1;
        let sheet_row = row + 1;
        match layout::decode(&cells, sheet_row) {
            Ok(record) => {
                if let Err(e) = record.verify(policy) {
                    report.problems.push(Problem {
                        row: sheet_row,
                        message: e.to_string(),
                    });
                }
                if cells[layout::col::NET] != cells[layout::col::NET_COPY] {
                    report.problems.push(Problem {
                        row: sheet_row,
                        message: "net salary columns AL and AM differ".into(),
                    });
                }
            }
            Err(e) => report.problems.push(Problem {
                row: sheet_row,
                message: e.to_string(),
            }),
        }
    }
}

fn inspect_keyed(
    range: &calamine::Range<calamine::Data>,
    header_row: u32,
    required: &[&str],
    optional: &[&str],
    report: &mut InspectionReport,
) {
    let index = workbook::header_index(range, header_row);

    for (name, is_required) in required
        .iter()
        .map(|n| (n, true))
        .chain(optional.iter().map(|n| (n, false)))
    {
        let col = index.get(&name.to_lowercase()).copied();
        report.headers.push(HeaderCheck {
            column: col
                .map(|c| layout::column_letter(c as usize))
                .unwrap_or_else(|| "?".into()),
            expected: name.to_string(),
            found: col.map(|_| name.to_string()),
        });
        if col.is_none() && is_required {
            report.problems.push(Problem {
                row: header_row + 1,
                message: format!("required column {name:?} is missing"),
            });
        }
    }

    let Some(&key_col) = required.first().and_then(|k| index.get(&k.to_lowercase())) else {
        return;
    };
    let width = range.end().map(|(_, c)| c as usize + 1).unwrap_or(0);

    for row in (header_row + 1)..=workbook::last_row(range) {
        let cells = workbook::read_row(range, row, width);
        if cells.iter().all(|c| *c == Cell::Blank) {
            continue;
        }
        report.data_rows += 1;
        if cells[key_col as usize] == Cell::Blank {
            report.problems.push(Problem {
                row: row + 1,
                message: format!("{:?} is empty", required[0]),
            });
        }
    }
}

/// Header names each built-in keyed schema expects, in writing order.
pub fn declared_headers(schema: &SheetSchema) -> Vec<&'static str> {
    match &schema.layout {
        SchemaLayout::Positional { columns, .. } => columns.to_vec(),
        SchemaLayout::Keyed { .. } if schema.id == ROSTER_V1.id => ROSTER_HEADERS.to_vec(),
        SchemaLayout::Keyed { .. } if schema.id == INVITE_V1.id => INVITE_HEADERS.to_vec(),
        SchemaLayout::Keyed {
            required, optional, ..
        } => required.iter().chain(optional.iter()).copied().collect(),
    }
}
