use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Reader, Xlsx};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{HarnessError, HarnessResult};
use crate::models::{Envelope, ExportFormat, Verdict};
use crate::services::executor::RawResponse;

/// Columns every export must carry, in no particular order.
pub const REQUIRED_HEADERS: [&str; 7] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Subcategory",
    "Account",
    "Type",
];

/// Columns that must be non-empty on every row. Subcategory is optional.
pub const REQUIRED_VALUES: [&str; 6] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Account",
    "Type",
];

pub const TRANSACTIONS_SHEET: &str = "Transactions";

/// Rows named in a failure message before the rest are elided.
const MAX_REPORTED_ROWS: usize = 5;

/// A decoded export file.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
    /// Data rows as the file reports them; for workbooks the used row count minus the header.
    pub row_count: usize,
}

impl ExportArtifact {
    pub fn missing_headers(&self) -> Vec<&'static str> {
        REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|required| !self.headers.iter().any(|h| h == required))
            .collect()
    }
}

pub fn parse(format: ExportFormat, content: &[u8]) -> HarnessResult<ExportArtifact> {
    match format {
        ExportFormat::Csv => parse_csv(content),
        ExportFormat::Xlsx => parse_xlsx(content),
    }
}

pub fn parse_csv(content: &[u8]) -> HarnessResult<ExportArtifact> {
    trace!(content_size = content.len(), "Parsing CSV export");

    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(HarnessError::CsvParse("No header row found".into()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }

    debug!(
        column_count = headers.len(),
        row_count = rows.len(),
        "CSV export parsed"
    );

    Ok(ExportArtifact {
        format: ExportFormat::Csv,
        headers,
        row_count: rows.len(),
        rows,
    })
}

pub fn parse_xlsx(content: &[u8]) -> HarnessResult<ExportArtifact> {
    trace!(content_size = content.len(), "Parsing XLSX export");

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(content))?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == TRANSACTIONS_SHEET) {
        return Err(HarnessError::Workbook(format!(
            "Sheet '{}' not found (sheets: {})",
            TRANSACTIONS_SHEET,
            sheet_names.join(", ")
        )));
    }

    let range = workbook.worksheet_range(TRANSACTIONS_SHEET)?;
    let (max_row, max_col) = range
        .end()
        .map(|(row, col)| (row + 1, col + 1))
        .unwrap_or((0, 0));
    // Absolute positions: the used range may start below row 1 or right of column A.
    let cell = |row: u32, col: u32| {
        range
            .get_value((row, col))
            .map(|value| value.to_string().trim().to_string())
            .unwrap_or_default()
    };

    let header_cells: Vec<(u32, String)> = (0..max_col)
        .map(|col| (col, cell(0, col)))
        .filter(|(_, value)| !value.is_empty())
        .collect();

    let rows: Vec<HashMap<String, String>> = (1..max_row)
        .map(|row| {
            header_cells
                .iter()
                .map(|(col, header)| (header.clone(), cell(row, *col)))
                .collect()
        })
        .collect();

    debug!(
        column_count = header_cells.len(),
        max_row,
        "XLSX export parsed"
    );

    Ok(ExportArtifact {
        format: ExportFormat::Xlsx,
        headers: header_cells.into_iter().map(|(_, h)| h).collect(),
        rows,
        row_count: (max_row as usize).saturating_sub(1),
    })
}

/// Structural verdict for a decoded (or undecodable) export.
pub fn check_structure(format: ExportFormat, parsed: &HarnessResult<ExportArtifact>) -> Verdict {
    let artifact = match parsed {
        Ok(artifact) => artifact,
        Err(e) => return Verdict::fail(format!("Failed to parse {} export: {}", format.label(), e)),
    };

    let missing = artifact.missing_headers();
    if !missing.is_empty() {
        return Verdict::fail(format!("Missing headers: {}", missing.join(", ")))
            .with_details(json!({ "headers": artifact.headers }));
    }

    Verdict::pass(format!(
        "Successfully exported {} transactions",
        artifact.row_count
    ))
    .with_details(json!({
        "headers": artifact.headers,
        "rows": artifact.row_count,
        "sample": artifact.rows.first(),
    }))
}

/// Every row must carry a value for each column in [`REQUIRED_VALUES`].
pub fn check_required_values(artifact: &ExportArtifact) -> Verdict {
    if artifact.rows.is_empty() {
        return Verdict::fail(format!(
            "{} export contains no data rows",
            artifact.format.label()
        ));
    }

    let incomplete: Vec<String> = artifact
        .rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let missing: Vec<&str> = REQUIRED_VALUES
                .iter()
                .copied()
                .filter(|field| row.get(*field).map(|v| v.is_empty()).unwrap_or(true))
                .collect();
            // Row 1 is the header.
            (!missing.is_empty()).then(|| format!("Row {}: {}", idx + 2, missing.join(", ")))
        })
        .collect();

    if incomplete.is_empty() {
        Verdict::pass(format!(
            "All required fields present in {} rows",
            artifact.rows.len()
        ))
    } else {
        let mut shown: Vec<String> = incomplete.iter().take(MAX_REPORTED_ROWS).cloned().collect();
        if incomplete.len() > MAX_REPORTED_ROWS {
            shown.push(format!("... {} more", incomplete.len() - MAX_REPORTED_ROWS));
        }
        Verdict::fail(format!(
            "{} of {} rows are missing required fields",
            incomplete.len(),
            artifact.rows.len()
        ))
        .with_details(json!(shown))
    }
}

/// The export must not be a truncated subset of the transactions listing.
pub fn check_row_count(format: ExportFormat, exported: usize, listed: usize) -> Verdict {
    Verdict::check(
        exported >= listed,
        format!(
            "{} export has {} rows, listing reports {}",
            format.label(),
            exported,
            listed
        ),
        format!(
            "Insufficient rows: {} export has {} rows but the transactions listing reports {}",
            format.label(),
            exported,
            listed
        ),
    )
    .with_details(json!({ "exported": exported, "listed": listed }))
}

/// `GET /export` must return exactly what `GET /export?format=csv` returns.
pub fn check_default_format(default: &RawResponse, explicit_csv: &RawResponse) -> Verdict {
    if default.status != 200 {
        return Verdict::fail(format!("HTTP {}: {}", default.status, default.excerpt()));
    }

    let content_type = default.header("content-type");
    if !content_type.contains(ExportFormat::Csv.content_type()) {
        return Verdict::fail(format!("Not CSV format: {}", content_type));
    }

    if explicit_csv.status != 200 {
        return Verdict::fail(format!(
            "Explicit CSV export failed with HTTP {}",
            explicit_csv.status
        ));
    }

    Verdict::check(
        default.body == explicit_csv.body,
        "Correctly defaults to CSV",
        "Does not match explicit CSV",
    )
    .with_details(json!({
        "default_bytes": default.body.len(),
        "csv_bytes": explicit_csv.body.len(),
    }))
}

/// Number of transactions in a listing response.
///
/// Accepts both `data.transactions: [...]` and a bare `data: [...]`.
pub fn count_listed_transactions(body: &[u8]) -> Result<usize, String> {
    match Envelope::parse(body).map_err(|e| format!("Malformed JSON: {}", e))? {
        Envelope::Success { data } => match &data {
            Value::Array(items) => Ok(items.len()),
            _ => data
                .get("transactions")
                .and_then(Value::as_array)
                .map(Vec::len)
                .ok_or_else(|| "Listing has no transactions array".to_string()),
        },
        Envelope::Error { error } => Err(format!("Transactions API unsuccessful: {}", error)),
        Envelope::Other(_) => Err("Transactions API unsuccessful".to_string()),
    }
}
