//! CSV export and import of the wallet history.
//!
//! Export writes one row per history entry (newest first, as stored):
//! `Date,Class,Type,Amount,Description`.
//!
//! Import accepts pasted lines of `TYPE,AMOUNT,DESCRIPTION`. Only `EARN` rows
//! are kept and anything unreadable is skipped. Text that starts with the
//! export header is read with the export column order instead, so a file
//! produced by [`ExportService::export_history_csv`] can be pasted back in.

use chrono::{Local, TimeZone};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use shared::{ExportHistoryResponse, Transaction, TransactionType};
use thiserror::Error;
use tracing::info;

pub const EXPORT_FILENAME: &str = "wallet_history.csv";
pub const EXPORT_HEADER: [&str; 5] = ["Date", "Class", "Type", "Amount", "Description"];
pub const DEFAULT_CLASS_LABEL: &str = "General";
pub const DEFAULT_IMPORT_DESCRIPTION: &str = "Imported";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while writing CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One accepted import row
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedEarning {
    pub amount: f64,
    pub description: String,
}

/// Column positions of the type, amount and description fields
#[derive(Debug, Clone, Copy)]
struct ImportLayout {
    kind: usize,
    amount: usize,
    description: usize,
}

const PASTED_LAYOUT: ImportLayout = ImportLayout {
    kind: 0,
    amount: 1,
    description: 2,
};

const EXPORTED_LAYOUT: ImportLayout = ImportLayout {
    kind: 2,
    amount: 3,
    description: 4,
};

#[derive(Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Render the history as a CSV download
    pub fn export_history_csv(
        &self,
        history: &[Transaction],
    ) -> Result<ExportHistoryResponse, ExportError> {
        info!("📄 EXPORT: Exporting {} history entries as CSV", history.len());

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(EXPORT_HEADER)?;

        for transaction in history {
            let amount = transaction.amount.to_string();
            writer.write_record([
                local_date(transaction.timestamp).as_str(),
                transaction.class_name.as_deref().unwrap_or(DEFAULT_CLASS_LABEL),
                transaction.kind.as_str(),
                amount.as_str(),
                transaction.description.as_str(),
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        let csv_content = String::from_utf8(bytes)?;

        info!("✅ EXPORT: Generated CSV content ({} bytes)", csv_content.len());

        Ok(ExportHistoryResponse {
            csv_content,
            filename: EXPORT_FILENAME.to_string(),
            transaction_count: history.len(),
        })
    }

    /// Parse pasted CSV text into the earnings to record, in file order.
    ///
    /// Each line is read as its own record, so an unbalanced quote only
    /// spoils the line it is on.
    pub fn parse_import(&self, text: &str) -> Vec<ImportedEarning> {
        let mut layout = PASTED_LAYOUT;
        let mut earnings = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let Some(record) = read_line(line) else {
                continue;
            };
            if index == 0 && is_export_header(&record) {
                layout = EXPORTED_LAYOUT;
                continue;
            }
            if let Some(earning) = parse_row(&record, layout) {
                earnings.push(earning);
            }
        }

        info!("📥 IMPORT: Parsed {} earning rows", earnings.len());
        earnings
    }
}

/// First record of a single line; `None` for blank or unreadable lines
fn read_line(line: &str) -> Option<StringRecord> {
    if line.trim().is_empty() {
        return None;
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    reader.records().next()?.ok()
}

/// Leading decimal number of `text`, ignoring whatever follows it
/// (`"5abc"` is 5). `None` when there is no number or it is not finite.
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let mut frac_end = end + 1;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - (end + 1);
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|amount| amount.is_finite())
}

fn is_export_header(record: &StringRecord) -> bool {
    record.len() >= EXPORT_HEADER.len()
        && EXPORT_HEADER
            .iter()
            .zip(record.iter())
            .all(|(expected, actual)| expected.eq_ignore_ascii_case(actual))
}

fn parse_row(record: &StringRecord, layout: ImportLayout) -> Option<ImportedEarning> {
    let kind = record.get(layout.kind).filter(|s| !s.is_empty())?;
    let amount = record.get(layout.amount).filter(|s| !s.is_empty())?;

    if kind.parse::<TransactionType>().ok()? != TransactionType::Earn {
        return None;
    }

    let amount = parse_amount(amount)?;

    let description = match record.get(layout.description) {
        Some(description) if !description.is_empty() => description.to_string(),
        _ => DEFAULT_IMPORT_DESCRIPTION.to_string(),
    };

    Some(ImportedEarning {
        amount,
        description,
    })
}

/// Local calendar date of an epoch-millis timestamp, `YYYY-MM-DD`
fn local_date(timestamp_millis: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_millis).single() {
        Some(datetime) => datetime.date_naive().format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}
