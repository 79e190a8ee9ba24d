//! Spreadsheet output: one row per non-blank text line.

use super::{ConversionJob, ConvertOptions, OfficeConverter, TargetFormat};
use crate::error::Result;
use crate::extract;
use crate::ooxml::xlsx::{self, CellStyle, SheetRow, Worksheet};
use crate::ooxml::DocProps;
use crate::progress::ProgressTracker;
use crate::sink::OutputDocument;

/// Rows occupy 40..85 of the job.
const ROWS_BASE: u8 = 40;
const ROWS_SPAN: u8 = 45;

/// Column widths in character units.
const MIN_COLUMN_WIDTH: f64 = 8.0;
const MAX_COLUMN_WIDTH: f64 = 255.0;

/// Builds `.xlsx` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetBuilder;

impl OfficeConverter for SpreadsheetBuilder {
    fn format(&self) -> TargetFormat {
        TargetFormat::Spreadsheet
    }

    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn convert(&self, job: &mut ConversionJob<'_>) -> Result<OutputDocument> {
        let (source, options) = (job.source(), job.options());
        let progress = job.progress();

        progress.report(5, "Opening PDF…");
        let lines = extract::extract(source, progress)?;
        progress.checkpoint()?;

        progress.report(ROWS_BASE, "Building Excel spreadsheet…");
        let sheet = layout_sheet(&lines, options, progress)?;

        progress.report(90, "Saving Excel file…");
        let bytes = xlsx::write_workbook(&sheet, &DocProps::now(&options.sheet_name))?;
        Ok(OutputDocument::new(TargetFormat::Spreadsheet, bytes))
    }
}

/// Style of the n-th (1-based) output row.
fn row_style(row_number: usize) -> CellStyle {
    if row_number == 1 {
        CellStyle::Header
    } else if row_number % 2 == 0 {
        CellStyle::Alternate
    } else {
        CellStyle::Content
    }
}

/// Lay out extracted lines as worksheet rows.
///
/// Blank lines are skipped; every other line becomes a row whose cells come
/// from the column splitter. The first row is the header, whatever it holds.
pub fn layout_sheet(
    lines: &[String],
    options: &ConvertOptions,
    progress: &mut ProgressTracker<'_>,
) -> Result<Worksheet> {
    let total = lines.len();
    let mut rows: Vec<SheetRow> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        progress.checkpoint()?;

        let row_number = rows.len() + 1;
        rows.push(SheetRow {
            cells: options.column_splitter.split(line),
            style: row_style(row_number),
        });

        // Counts rows done before this one, so the row phase approaches its
        // end without reaching it. The document layout counts `index + 1`.
        progress.report_fraction(
            ROWS_BASE,
            ROWS_SPAN,
            i,
            total,
            format!("Writing row {} of ~{}…", row_number, total),
        );
    }

    let column_widths = auto_size(&rows);
    Ok(Worksheet {
        name: options.sheet_name.clone(),
        rows,
        column_widths,
    })
}

/// Width for each column present in the header row, fitted to the longest
/// cell in that column.
fn auto_size(rows: &[SheetRow]) -> Vec<f64> {
    let Some(header) = rows.first() else {
        return Vec::new();
    };
    (0..header.cells.len())
        .map(|c| {
            let longest = rows
                .iter()
                .filter_map(|row| row.cells.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            (longest as f64 + 2.0).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}
