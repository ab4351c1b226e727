//! Spreadsheet export and import (.xlsx).
//!
//! Sheets are written right-to-left with a fixed Arabic header row. Import
//! reads the first sheet of an uploaded workbook and locates columns by
//! header text, so column order in the upload does not matter.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;
use domain::models::{
    classify, Company, CompanyInput, DocumentType, Employee, EmployeeInput, ThresholdSettings,
};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};
use serde_json::Value as JsonValue;
use shared::dates::{excel_serial_to_date, parse_flexible_date};
use shared::validation::is_no_value;
use thiserror::Error;

use crate::error::ApiError;

pub const EMPLOYEES_SHEET: &str = "الموظفين";
pub const COMPANIES_SHEET: &str = "المؤسسات";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const EMPLOYEE_EXPORT_HEADERS: [&str; 15] = [
    "الاسم",
    "المهنة",
    "الجنسية",
    "تاريخ الميلاد",
    "رقم الهاتف",
    "رقم الجواز",
    "رقم الإقامة",
    "تاريخ الالتحاق",
    "تاريخ انتهاء العقد",
    "تاريخ انتهاء الإقامة",
    "المشروع",
    "الحساب البنكي",
    "الراتب",
    "المؤسسة",
    "حالة الإقامة",
];

pub const COMPANY_EXPORT_HEADERS: [&str; 9] = [
    "اسم المؤسسة",
    "الرقم التأميني",
    "الرقم الموحد",
    "رقم اشتراك قوى",
    "نوع المؤسسة",
    "انتهاء السجل التجاري",
    "حالة السجل التجاري",
    "عدد الموظفين",
    "الحد الأقصى للموظفين",
];

/// Import columns: field key, then accepted header spellings. The first
/// spelling is the one written to templates.
type ColumnSpec = (&'static str, &'static [&'static str]);

const EMPLOYEE_COLUMNS: &[ColumnSpec] = &[
    ("name", &["الاسم", "اسم الموظف"]),
    ("profession", &["المهنة"]),
    ("nationality", &["الجنسية"]),
    ("birth_date", &["تاريخ الميلاد"]),
    ("phone", &["رقم الهاتف", "رقم الجوال"]),
    ("passport_number", &["رقم الجواز"]),
    ("residence_number", &["رقم الإقامة"]),
    ("joining_date", &["تاريخ الالتحاق"]),
    ("contract_expiry", &["تاريخ انتهاء العقد", "انتهاء العقد"]),
    ("residence_expiry", &["تاريخ انتهاء الإقامة", "انتهاء الإقامة"]),
    (
        "health_insurance_expiry",
        &["تاريخ انتهاء التأمين الصحي", "انتهاء التأمين الصحي", "انتهاء اشتراك التأمين"],
    ),
    (
        "hired_worker_contract_expiry",
        &["تاريخ انتهاء عقد أجير", "انتهاء عقد أجير"],
    ),
    ("project_name", &["المشروع", "اسم المشروع"]),
    ("bank_account", &["الحساب البنكي"]),
    ("salary", &["الراتب"]),
    ("employee_number", &["الرقم الوظيفي"]),
    ("insurance_number", &["رقم التأمين"]),
    ("residence_image_url", &["رابط صورة الإقامة"]),
    ("company", &["المؤسسة", "اسم المؤسسة"]),
    ("notes", &["ملاحظات"]),
];

const COMPANY_COLUMNS: &[ColumnSpec] = &[
    ("name", &["اسم المؤسسة"]),
    ("tax_number", &["الرقم التأميني"]),
    ("unified_number", &["الرقم الموحد"]),
    ("labor_subscription_number", &["رقم اشتراك قوى", "رقم قوى"]),
    ("company_type", &["نوع المؤسسة"]),
    (
        "commercial_registration_expiry",
        &["انتهاء السجل التجاري", "تاريخ انتهاء السجل التجاري"],
    ),
    (
        "social_insurance_expiry",
        &["انتهاء التأمينات الاجتماعية", "تاريخ انتهاء التأمينات الاجتماعية"],
    ),
    ("power_subscription_expiry", &["انتهاء اشتراك قوى"]),
    ("moqeem_subscription_expiry", &["انتهاء اشتراك مقيم"]),
    ("max_employees", &["الحد الأقصى للموظفين"]),
    ("notes", &["ملاحظات"]),
];

#[derive(Debug, Error)]
pub enum ExcelError {
    #[error("Failed to write workbook: {0}")]
    Write(#[from] XlsxError),

    #[error("ملف Excel غير صالح: {0}")]
    Read(String),

    #[error("الملف لا يحتوي على أي ورقة عمل")]
    NoSheet,

    #[error("العمود المطلوب غير موجود: {0}")]
    MissingColumn(&'static str),

    #[error("عدد الصفوف ({0}) يتجاوز الحد المسموح ({1})")]
    TooManyRows(usize, usize),
}

impl From<ExcelError> for ApiError {
    fn from(err: ExcelError) -> Self {
        match err {
            ExcelError::Write(e) => ApiError::Internal(format!("xlsx write: {}", e)),
            other => ApiError::validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Employees,
    Companies,
}

impl SheetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Employees => "employees",
            SheetKind::Companies => "companies",
        }
    }

    fn sheet_name(&self) -> &'static str {
        match self {
            SheetKind::Employees => EMPLOYEES_SHEET,
            SheetKind::Companies => COMPANIES_SHEET,
        }
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            SheetKind::Employees => EMPLOYEE_COLUMNS,
            SheetKind::Companies => COMPANY_COLUMNS,
        }
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum OutCell {
    Text(String),
    Number(f64),
    Empty,
}

fn text(value: &Option<String>) -> OutCell {
    value.as_deref().map_or(OutCell::Empty, |v| OutCell::Text(v.to_string()))
}

fn date(value: Option<NaiveDate>) -> OutCell {
    value.map_or(OutCell::Empty, |d| OutCell::Text(d.format("%Y-%m-%d").to_string()))
}

fn write_sheet(name: &str, headers: &[&str], rows: &[Vec<OutCell>]) -> Result<Vec<u8>, ExcelError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9E1F2))
        .set_align(FormatAlign::Center);

    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    sheet.set_right_to_left(true);
    sheet.set_freeze_panes(1, 0)?;

    for (col, header) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &header_format)?;
        sheet.set_column_width(col, 20)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                OutCell::Text(value) => {
                    sheet.write_string(r, col, value)?;
                }
                OutCell::Number(value) => {
                    sheet.write_number(r, col, *value)?;
                }
                OutCell::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn export_employees(
    employees: &[(Employee, Option<String>)],
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> Result<Vec<u8>, ExcelError> {
    let residence = thresholds.get(DocumentType::Residence);
    let rows: Vec<Vec<OutCell>> = employees
        .iter()
        .map(|(e, company_name)| {
            vec![
                OutCell::Text(e.name.clone()),
                text(&e.profession),
                text(&e.nationality),
                date(e.birth_date),
                text(&e.phone),
                text(&e.passport_number),
                OutCell::Text(e.residence_number.clone()),
                date(e.joining_date),
                date(e.contract_expiry),
                date(e.residence_expiry),
                text(&e.project_name),
                text(&e.bank_account),
                e.salary.map_or(OutCell::Empty, OutCell::Number),
                text(company_name),
                OutCell::Text(classify(e.residence_expiry, &residence, today).label().to_string()),
            ]
        })
        .collect();

    write_sheet(EMPLOYEES_SHEET, &EMPLOYEE_EXPORT_HEADERS, &rows)
}

pub fn export_companies(
    companies: &[(Company, i64)],
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> Result<Vec<u8>, ExcelError> {
    let commercial = thresholds.get(DocumentType::CommercialRegistration);
    let rows: Vec<Vec<OutCell>> = companies
        .iter()
        .map(|(c, employee_count)| {
            vec![
                OutCell::Text(c.name.clone()),
                c.tax_number.map_or(OutCell::Empty, |n| OutCell::Text(n.to_string())),
                text(&c.unified_number),
                text(&c.labor_subscription_number),
                text(&c.company_type),
                date(c.commercial_registration_expiry),
                OutCell::Text(
                    classify(c.commercial_registration_expiry, &commercial, today)
                        .label()
                        .to_string(),
                ),
                OutCell::Number(*employee_count as f64),
                c.max_employees
                    .map_or(OutCell::Empty, |m| OutCell::Number(f64::from(m))),
            ]
        })
        .collect();

    write_sheet(COMPANIES_SHEET, &COMPANY_EXPORT_HEADERS, &rows)
}

/// Empty workbook with the importable headers.
pub fn import_template(kind: SheetKind) -> Result<Vec<u8>, ExcelError> {
    let headers: Vec<&str> = kind.columns().iter().map(|(_, names)| names[0]).collect();
    write_sheet(kind.sheet_name(), &headers, &[])
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) | Data::DurationIso(s) => {
                let s = s.trim();
                if s.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.to_string())
                }
            }
            Data::Bool(b) => CellValue::Text(b.to_string()),
            // out-of-range serials stay numbers so the row reports them
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                .map_or_else(|_| CellValue::Number(dt.as_f64()), CellValue::Date),
            Data::DateTimeIso(s) => parse_flexible_date(s)
                .map_or_else(|_| CellValue::Text(s.clone()), CellValue::Date),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

impl CellValue {
    /// Text form; whole numbers lose their trailing `.0` so identifiers
    /// typed as numbers survive.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn as_date(&self) -> Result<Option<NaiveDate>, String> {
        match self {
            CellValue::Empty => Ok(None),
            CellValue::Date(d) => Ok(Some(*d)),
            CellValue::Number(n) => excel_serial_to_date(*n)
                .map(Some)
                .map_err(|e| e.to_string()),
            CellValue::Text(s) if is_no_value(s) => Ok(None),
            CellValue::Text(s) => parse_flexible_date(s).map(Some).map_err(|e| e.to_string()),
        }
    }

    pub fn as_f64(&self) -> Result<Option<f64>, String> {
        match self {
            CellValue::Empty => Ok(None),
            CellValue::Number(n) => Ok(Some(*n)),
            CellValue::Text(s) if is_no_value(s) => Ok(None),
            CellValue::Text(s) => s
                .replace(',', "")
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("قيمة رقمية غير صالحة: {}", s)),
            CellValue::Date(_) => Err("قيمة رقمية غير صالحة".to_string()),
        }
    }
}

/// First sheet of a workbook: header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct SheetRows {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetRows {
    /// Non-empty data rows with their 1-based sheet row numbers.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[CellValue])> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| *c != CellValue::Empty))
            .map(|(index, cells)| (index + 2, cells.as_slice()))
    }

    fn column_map(&self, columns: &[ColumnSpec]) -> HashMap<&'static str, usize> {
        columns
            .iter()
            .filter_map(|(field, names)| {
                self.headers
                    .iter()
                    .position(|h| names.contains(&h.trim().trim_end_matches('*').trim()))
                    .map(|index| (*field, index))
            })
            .collect()
    }
}

pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetRows, ExcelError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ExcelError::Read(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExcelError::NoSheet)?
        .map_err(|e| ExcelError::Read(e.to_string()))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|cells| {
            cells
                .iter()
                .map(|c| CellValue::from(c).as_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows
        .map(|cells| cells.iter().map(CellValue::from).collect())
        .collect();

    Ok(SheetRows { headers, rows })
}

struct RowReader<'a> {
    columns: &'a HashMap<&'static str, usize>,
    cells: &'a [CellValue],
}

impl<'a> RowReader<'a> {
    fn cell(&self, field: &str) -> &CellValue {
        self.columns
            .get(field)
            .and_then(|&index| self.cells.get(index))
            .unwrap_or(&CellValue::Empty)
    }

    fn text(&self, field: &str) -> Option<String> {
        self.cell(field).as_text()
    }

    fn date(&self, field: &str, label: &str) -> Result<Option<NaiveDate>, String> {
        self.cell(field)
            .as_date()
            .map_err(|e| format!("{}: {}", label, e))
    }

    fn number(&self, field: &str, label: &str) -> Result<Option<f64>, String> {
        self.cell(field)
            .as_f64()
            .map_err(|e| format!("{}: {}", label, e))
    }
}

/// One parsed employee row. `company_name` is resolved to an id by the caller.
#[derive(Debug, Clone)]
pub struct EmployeeRow {
    pub input: EmployeeInput,
    pub company_name: Option<String>,
}

fn require_columns(
    map: &HashMap<&'static str, usize>,
    required: &[(&'static str, &'static str)],
) -> Result<(), ExcelError> {
    for (field, header) in required {
        if !map.contains_key(field) {
            return Err(ExcelError::MissingColumn(header));
        }
    }
    Ok(())
}

fn check_row_count(sheet: &SheetRows, max_rows: usize) -> Result<(), ExcelError> {
    let count = sheet.data_rows().count();
    if count > max_rows {
        Err(ExcelError::TooManyRows(count, max_rows))
    } else {
        Ok(())
    }
}

/// Maps sheet rows to employee inputs. Per-row failures are returned
/// alongside the row number and never abort the whole sheet.
pub fn parse_employee_rows(
    sheet: &SheetRows,
    max_rows: usize,
) -> Result<Vec<(usize, Result<EmployeeRow, String>)>, ExcelError> {
    let map = sheet.column_map(EMPLOYEE_COLUMNS);
    require_columns(&map, &[("name", "الاسم"), ("residence_number", "رقم الإقامة")])?;
    check_row_count(sheet, max_rows)?;

    Ok(sheet
        .data_rows()
        .map(|(row, cells)| {
            let reader = RowReader {
                columns: &map,
                cells,
            };
            (row, employee_row(&reader))
        })
        .collect())
}

fn employee_row(r: &RowReader<'_>) -> Result<EmployeeRow, String> {
    let input = EmployeeInput {
        company_id: None,
        project_id: None,
        name: r.text("name").unwrap_or_default(),
        profession: r.text("profession"),
        nationality: r.text("nationality"),
        birth_date: r.date("birth_date", "تاريخ الميلاد")?,
        phone: r.text("phone"),
        passport_number: r.text("passport_number"),
        residence_number: r.text("residence_number").unwrap_or_default(),
        joining_date: r.date("joining_date", "تاريخ الالتحاق")?,
        contract_expiry: r.date("contract_expiry", "تاريخ انتهاء العقد")?,
        residence_expiry: r.date("residence_expiry", "تاريخ انتهاء الإقامة")?,
        health_insurance_expiry: r.date("health_insurance_expiry", "تاريخ انتهاء التأمين الصحي")?,
        hired_worker_contract_expiry: r
            .date("hired_worker_contract_expiry", "تاريخ انتهاء عقد أجير")?,
        project_name: r.text("project_name"),
        bank_account: r.text("bank_account"),
        employee_number: r.text("employee_number"),
        insurance_number: r.text("insurance_number"),
        salary: r.number("salary", "الراتب")?,
        residence_image_url: r.text("residence_image_url"),
        additional_fields: JsonValue::Object(Default::default()),
        notes: r.text("notes"),
    };

    Ok(EmployeeRow {
        input,
        company_name: r.text("company").filter(|n| !is_no_value(n)),
    })
}

pub fn parse_company_rows(
    sheet: &SheetRows,
    max_rows: usize,
) -> Result<Vec<(usize, Result<CompanyInput, String>)>, ExcelError> {
    let map = sheet.column_map(COMPANY_COLUMNS);
    require_columns(&map, &[("name", "اسم المؤسسة")])?;
    check_row_count(sheet, max_rows)?;

    Ok(sheet
        .data_rows()
        .map(|(row, cells)| {
            let reader = RowReader {
                columns: &map,
                cells,
            };
            (row, company_row(&reader))
        })
        .collect())
}

fn whole_number(value: Option<f64>, label: &str) -> Result<Option<i64>, String> {
    match value {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Ok(Some(n as i64)),
        Some(n) => Err(format!("{}: يجب أن يكون عدداً صحيحاً ({})", label, n)),
    }
}

fn company_row(r: &RowReader<'_>) -> Result<CompanyInput, String> {
    let tax_number = whole_number(r.number("tax_number", "الرقم التأميني")?, "الرقم التأميني")?;
    let max_employees = whole_number(
        r.number("max_employees", "الحد الأقصى للموظفين")?,
        "الحد الأقصى للموظفين",
    )?
    .map(|n| i32::try_from(n).map_err(|_| "الحد الأقصى للموظفين: قيمة كبيرة جداً".to_string()))
    .transpose()?;

    Ok(CompanyInput {
        name: r.text("name").unwrap_or_default(),
        tax_number,
        unified_number: r.text("unified_number"),
        labor_subscription_number: r.text("labor_subscription_number"),
        company_type: r.text("company_type"),
        commercial_registration_expiry: r
            .date("commercial_registration_expiry", "انتهاء السجل التجاري")?,
        social_insurance_expiry: r.date("social_insurance_expiry", "انتهاء التأمينات الاجتماعية")?,
        power_subscription_expiry: r.date("power_subscription_expiry", "انتهاء اشتراك قوى")?,
        moqeem_subscription_expiry: r.date("moqeem_subscription_expiry", "انتهاء اشتراك مقيم")?,
        max_employees,
        additional_fields: JsonValue::Object(Default::default()),
        notes: r.text("notes"),
    })
}
