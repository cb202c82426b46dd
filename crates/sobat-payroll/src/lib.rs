//! sobat-payroll — Payroll record derivation and spreadsheet layout.
//!
//! Builds one payroll row per employee from attendance and pay parameters,
//! and reads/writes the fixed-position workbook layout consumed by the
//! payroll import controller.

pub mod builder;
pub mod generate;
pub mod layout;
pub mod schema;
pub mod types;
pub mod workbook;

pub use builder::{PayrollBuilder, ValidationError};
pub use types::{
    AttendanceParams, Employee, Invite, PayParams, PayPolicy, PayrollRecord, Period, Roster,
};
pub use workbook::SheetError;
