//! PDF report encoding.
//!
//! Writes a minimal PDF 1.4 document: A4 pages, the built-in Helvetica
//! font and one text line per row. Sections always appear in the same
//! order: heading (title, period, rule set), summary counts, then one block
//! per violation. Text outside printable ASCII is replaced with `?`.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::models::{ReportSummary, Violation};

use super::report_order;

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 14;
const LINES_PER_PAGE: usize = 52;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Report metadata printed in the document heading.
#[derive(Debug, Clone, Copy)]
pub struct PdfHeading<'a> {
    /// Start of the reported period.
    pub period_start: DateTime<Utc>,
    /// End of the reported period.
    pub period_end: DateTime<Utc>,
    /// Rule set in force.
    pub rule_set: &'a str,
    /// When the report was rendered.
    pub generated_at: DateTime<Utc>,
    /// Who requested the report.
    pub generated_by: &'a str,
}

/// Encodes a report as a PDF document.
pub fn render_pdf(
    heading: &PdfHeading<'_>,
    summary: &ReportSummary,
    violations: &[Violation],
) -> Vec<u8> {
    let lines = layout(heading, summary, violations);
    let pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();
    write_document(&pages)
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn layout(
    heading: &PdfHeading<'_>,
    summary: &ReportSummary,
    violations: &[Violation],
) -> Vec<String> {
    let mut lines = vec![
        "Labor-Time Compliance Report".to_string(),
        format!(
            "Period: {} to {}",
            stamp(heading.period_start),
            stamp(heading.period_end)
        ),
        format!("Rule set: {}", heading.rule_set),
        format!(
            "Generated: {} by {}",
            stamp(heading.generated_at),
            heading.generated_by
        ),
        String::new(),
        "Summary".to_string(),
        format!("Total violations: {}", summary.total_violations),
    ];
    for (kind, count) in &summary.by_type {
        lines.push(format!("  {}: {}", kind, count));
    }
    for (severity, count) in &summary.by_severity {
        lines.push(format!("  {}: {}", severity, count));
    }

    lines.push(String::new());
    lines.push("Violations".to_string());
    if violations.is_empty() {
        lines.push("  None".to_string());
    }
    for (index, violation) in report_order(violations).into_iter().enumerate() {
        lines.push(format!(
            "{}. {} ({})",
            index + 1,
            violation.violation_type,
            violation.severity
        ));
        lines.push(format!("  User: {}", violation.user_id));
        lines.push(format!(
            "  Period: {} to {}",
            stamp(violation.period_start),
            stamp(violation.period_end)
        ));
        lines.push(format!(
            "  Expected: {} min, actual: {} min",
            violation.details.expected, violation.details.actual
        ));
        lines.push(format!(
            "  Affected entries: {}",
            violation.details.affected_entries.join(", ")
        ));
        lines.push(match (&violation.acknowledged_at, &violation.acknowledged_by) {
            (Some(at), Some(by)) => format!("  Acknowledged: {} by {}", stamp(*at), by),
            (Some(at), None) => format!("  Acknowledged: {}", stamp(*at)),
            _ => "  Acknowledged: no".to_string(),
        });
        lines.push(String::new());
    }
    lines
}

/// Escapes a line for use inside a PDF literal string.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(lines: &[String], page: usize, page_count: usize) -> String {
    let mut stream = String::new();
    let top = PAGE_HEIGHT - MARGIN;
    let _ = write!(
        stream,
        "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
        FONT_SIZE, LEADING, MARGIN, top
    );
    for line in lines {
        let _ = writeln!(stream, "({}) Tj T*", escape(line));
    }
    stream.push_str("ET\n");
    let _ = write!(
        stream,
        "BT\n/F1 8 Tf\n{} {} Td\n(Page {} of {}) Tj\nET\n",
        MARGIN,
        MARGIN / 2,
        page,
        page_count
    );
    stream
}

/// Serializes pages into a complete document with a cross-reference table.
///
/// Object layout: 1 catalog, 2 page tree, 3 font, then a page object and
/// its content stream for every page.
fn write_document(pages: &[&[String]]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];
    for (index, lines) in pages.iter().enumerate() {
        let content_id = page_ids[index] + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, content_id
            )
            .into_bytes(),
        );
        let stream = content_stream(lines, index + 1, pages.len());
        objects.push(
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                stream.len(),
                stream
            )
            .into_bytes(),
        );
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(xref, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );
    out.extend_from_slice(xref.as_bytes());
    out
}
