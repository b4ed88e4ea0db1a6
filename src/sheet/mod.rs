// Sheet ingestion: CSV text -> rows -> column mapping -> typed dealer records

pub mod columns;
pub mod extract;
pub mod parser;
mod source;

pub use columns::{ColumnIndices, ColumnKey, SideColumns};
pub use extract::{extract_records, is_included, parse_count};
pub use parser::{ParsedRows, parse_rows};
pub use source::{HttpSheetSource, SheetSource};

use chrono::{DateTime, Utc};

use crate::error::{FetchError, ParseError};
use crate::models::RecordSet;

/// Records from one sheet text, plus the rows that were unsupported input.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetRead {
    pub records: RecordSet,
    pub rejected: Vec<ParseError>,
}

/// Parse, map the header row, extract. Rejected rows are logged and skipped; the
/// rest of the sheet still yields records. Text with no data rows yields empty lists.
pub fn read_sheet(text: &str, observed_at: DateTime<Utc>) -> SheetRead {
    let parsed = parse_rows(text);
    for e in &parsed.rejected {
        tracing::warn!(error = %e, "sheet row skipped");
    }
    let header_rejected = parsed.header_rejected();
    let ParsedRows { rows, rejected } = parsed;
    if header_rejected {
        tracing::warn!("sheet header row is unreadable; no records extracted");
        return SheetRead {
            records: RecordSet::default(),
            rejected,
        };
    }
    let Some(header) = rows.first() else {
        return SheetRead {
            records: RecordSet::default(),
            rejected,
        };
    };
    let indices = ColumnIndices::from_headers(header);
    if indices.active_side().is_none() || indices.expired_side().is_none() {
        tracing::warn!(
            mapped_columns = indices.mapped_count(),
            "sheet header is missing columns; affected side yields no records"
        );
    }
    SheetRead {
        records: extract_records(&rows, &indices, observed_at),
        rejected,
    }
}

pub fn records_from_csv(text: &str, observed_at: DateTime<Utc>) -> RecordSet {
    read_sheet(text, observed_at).records
}

/// One fetch from the source, turned into records.
pub async fn fetch_records(source: &dyn SheetSource) -> Result<SheetRead, FetchError> {
    let text = source.fetch_csv().await?;
    let read = read_sheet(&text, Utc::now());
    tracing::debug!(
        operation = "fetch_records",
        active = read.records.active.len(),
        expired = read.records.expired.len(),
        rejected_rows = read.rejected.len(),
        "sheet records extracted"
    );
    Ok(read)
}
