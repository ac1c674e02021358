//! CSV report encoding.
//!
//! Downstream auditors read the columns by position, so the header and
//! column order below are part of the external contract. Output depends
//! only on the violations passed in: rows are sorted before writing,
//! timestamps are rendered in UTC with a fixed pattern and the line
//! terminator is pinned to CRLF.

use csv::{Terminator, WriterBuilder};

use crate::error::{ComplianceError, ComplianceResult};
use crate::models::Violation;

use super::report_order;

/// UTF-8 byte-order mark written before the header.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column headers, in output order.
pub const HEADER: [&str; 8] = [
    "Date",
    "User ID",
    "Violation Type",
    "Severity",
    "Expected",
    "Actual",
    "Affected Entries",
    "Acknowledged",
];

/// Separator for the affected entry ids inside one cell.
pub const ENTRY_SEPARATOR: &str = ";";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Encodes violations as a CSV document.
///
/// # Example
///
/// ```
/// use labor_compliance::service::reports::{render_csv, BOM};
///
/// let bytes = render_csv(&[]).unwrap();
/// assert!(bytes.starts_with(BOM));
/// assert!(bytes.ends_with(b"Acknowledged\r\n"));
/// ```
pub fn render_csv(violations: &[Violation]) -> ComplianceResult<Vec<u8>> {
    let rows = report_order(violations);

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(BOM.to_vec());
    writer.write_record(HEADER)?;

    for violation in rows {
        writer.write_record([
            violation.period_start.format(TIMESTAMP_FORMAT).to_string(),
            violation.user_id.clone(),
            violation.violation_type.as_str().to_string(),
            violation.severity.as_str().to_string(),
            violation.details.expected.to_string(),
            violation.details.actual.to_string(),
            violation.details.affected_entries.join(ENTRY_SEPARATOR),
            if violation.is_acknowledged() { "yes" } else { "no" }.to_string(),
        ])?;
    }

    writer.into_inner().map_err(|err| ComplianceError::Serialization {
        message: err.error().to_string(),
    })
}
