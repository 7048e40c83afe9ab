//! Per-criterion breakdown shared by the spreadsheet and document builders

use crate::aggregator::contribution;
use crate::rubric::RubricConfig;
use crate::scorer::ScoreSet;

/// Suggested download name for the spreadsheet
pub const SPREADSHEET_FILE_NAME: &str = "valoracion_informe_final.xlsx";
/// Suggested download name for the document
pub const DOCUMENT_FILE_NAME: &str = "dictamen_informe_final.docx";

/// Scores at or above this value are listed as strengths.
pub const STRENGTH_MIN_SCORE: u32 = 3;
/// Scores at or below this value are listed as areas to improve.
pub const IMPROVEMENT_MAX_SCORE: u32 = 1;

/// One result row
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionLine {
    pub key: String,
    pub name: String,
    pub score: u32,
    pub weight: f64,
    pub contribution: f64,
}

/// Rows for every rubric criterion, in rubric order.
pub fn line_items(rubric: &RubricConfig, scores: &ScoreSet) -> Vec<CriterionLine> {
    rubric
        .criteria
        .iter()
        .map(|criterion| {
            let score = scores.get(&criterion.key);
            let weight = rubric.weight(&criterion.key);
            CriterionLine {
                key: criterion.key.clone(),
                name: criterion.name.clone(),
                score,
                weight,
                contribution: contribution(score, weight, rubric.scale.max),
            }
        })
        .collect()
}

/// Names of criteria scoring at least [`STRENGTH_MIN_SCORE`].
pub fn strengths(lines: &[CriterionLine]) -> Vec<&str> {
    lines
        .iter()
        .filter(|l| l.score >= STRENGTH_MIN_SCORE)
        .map(|l| l.name.as_str())
        .collect()
}

/// Names of criteria scoring at most [`IMPROVEMENT_MAX_SCORE`].
pub fn improvements(lines: &[CriterionLine]) -> Vec<&str> {
    lines
        .iter()
        .filter(|l| l.score <= IMPROVEMENT_MAX_SCORE)
        .map(|l| l.name.as_str())
        .collect()
}

/// Two-decimal number without trailing zeros: `15`, `37.5`, `3.75`.
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
