//! Spreadsheet export
//!
//! The workbook is assembled in memory and serialized in one step, so a
//! failure never leaves a partial file behind.

use crate::aggregator::Evaluation;
use crate::report::line_items;
use crate::rubric::RubricConfig;
use crate::scorer::ScoreSet;
use crate::{GraderError, Result};
use log::debug;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

pub const RESULTS_SHEET: &str = "Resultados";
pub const SUMMARY_SHEET: &str = "Resumen";

/// Build an `.xlsx` file with a results sheet and a summary sheet.
pub fn build_spreadsheet(
    rubric: &RubricConfig,
    scores: &ScoreSet,
    evaluation: &Evaluation,
) -> Result<Vec<u8>> {
    let bytes = build_workbook(rubric, scores, evaluation).map_err(|e| GraderError::Report {
        artifact: "spreadsheet",
        reason: e.to_string(),
    })?;
    debug!("Built spreadsheet ({} bytes)", bytes.len());
    Ok(bytes)
}

fn build_workbook(
    rubric: &RubricConfig,
    scores: &ScoreSet,
    evaluation: &Evaluation,
) -> std::result::Result<Vec<u8>, XlsxError> {
    let bold = Format::new().set_bold();

    let mut results = Worksheet::new();
    results.set_name(RESULTS_SHEET)?;
    let score_header = format!("Puntaje ({}-{})", rubric.scale.min, rubric.scale.max);
    let headers = [
        "Criterio",
        "Clave",
        score_header.as_str(),
        "Peso (%)",
        "Aporte (%)",
    ];
    for (col, title) in headers.iter().enumerate() {
        results.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (idx, line) in line_items(rubric, scores).iter().enumerate() {
        let row = idx as u32 + 1;
        results.write_string(row, 0, &line.name)?;
        results.write_string(row, 1, &line.key)?;
        results.write_number(row, 2, line.score)?;
        results.write_number(row, 3, line.weight)?;
        results.write_number(row, 4, line.contribution)?;
    }
    results.set_column_width(0, 42)?;
    results.set_column_width(1, 18)?;

    let mut summary = Worksheet::new();
    summary.set_name(SUMMARY_SHEET)?;
    summary.write_string_with_format(0, 0, "Total (%)", &bold)?;
    summary.write_string_with_format(0, 1, "Dictamen", &bold)?;
    summary.write_number(1, 0, evaluation.percentage)?;
    summary.write_string(1, 1, evaluation.decision.label())?;
    summary.set_column_width(1, 30)?;

    let mut workbook = Workbook::new();
    workbook.push_worksheet(results);
    workbook.push_worksheet(summary);
    workbook.save_to_buffer()
}
