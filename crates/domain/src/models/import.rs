//! Import models shared by spreadsheet and JSON bulk import.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::company::CompanyInput;
use super::employee::EmployeeInput;

pub const MAX_BULK_IMPORT_ROWS: usize = 1000;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ImportOptions {
    /// Overwrite rows matched by natural key; otherwise they are skipped.
    #[serde(default = "default_true")]
    pub update_existing: bool,

    /// Validate and report without writing.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            update_existing: true,
            dry_run: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct BulkEmployeeImportRequest {
    /// Rows are validated one by one during import; only the batch size is
    /// checked up front.
    #[validate(length(min = 1, max = 1000, message = "يجب أن تحتوي القائمة على 1 إلى 1000 موظف"))]
    pub employees: Vec<EmployeeInput>,

    #[serde(default)]
    pub options: ImportOptions,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct BulkCompanyImportRequest {
    #[validate(length(min = 1, max = 1000, message = "يجب أن تحتوي القائمة على 1 إلى 1000 مؤسسة"))]
    pub companies: Vec<CompanyInput>,

    #[serde(default)]
    pub options: ImportOptions,
}

/// Per-row result while importing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Created,
    Updated,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ImportRowError {
    /// 1-based row number as the user sees it (header is row 1 for sheets).
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ImportSummary {
    pub processed: u32,
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub errors: Vec<ImportRowError>,
    pub dry_run: bool,
}

impl ImportSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn record(&mut self, row: usize, identifier: Option<String>, outcome: ImportOutcome) {
        self.processed += 1;
        match outcome {
            ImportOutcome::Created => self.created += 1,
            ImportOutcome::Updated => self.updated += 1,
            ImportOutcome::Skipped => self.skipped += 1,
            ImportOutcome::Failed(error) => self.errors.push(ImportRowError {
                row,
                identifier,
                error,
            }),
        }
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}
