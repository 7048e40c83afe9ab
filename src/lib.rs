//! Rubric-based grading of project final reports
//!
//! This crate provides:
//! - Text extraction from uploaded PDF and DOCX reports
//! - An advisory keyword-based score per rubric criterion
//! - Weighted aggregation into a compliance percentage and decision
//! - Evidence formatting and spreadsheet/document export

pub mod aggregator;
pub mod document;
pub mod evidence;
pub mod extractor;
pub mod report;
pub mod rubric;
pub mod scorer;
pub mod spreadsheet;

pub use aggregator::{decide, weighted_percentage, Decision, Evaluation};
pub use document::{build_document, DocumentInput};
pub use evidence::{format_evidence, prepare_evidence, scope_to_section};
pub use extractor::{extract, DocumentFormat, ExtractedDocument};
pub use rubric::{RubricConfig, Scale, ScoringPolicy, Thresholds};
pub use scorer::{auto_score, score_criterion, ScoreSet, ScoreSource};
pub use spreadsheet::build_spreadsheet;

use chrono::Local;
use log::info;

/// Result of running an upload through extraction and automatic scoring
#[derive(Debug, Clone)]
pub struct AutoEvaluation {
    /// Extracted text and its source format
    pub document: ExtractedDocument,
    /// Automatic per-criterion suggestion
    pub scores: ScoreSet,
    /// Percentage and decision for the automatic scores
    pub evaluation: Evaluation,
}

/// Runs the grading pipeline against one rubric
///
/// Holds no per-session state; every call works on the values passed in, so
/// one evaluator can serve any number of independent evaluations.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    rubric: &'a RubricConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(rubric: &'a RubricConfig) -> Self {
        Self { rubric }
    }

    /// Extract and auto-score an upload, choosing the format by file name
    ///
    /// This function will:
    /// 1. Reject file names that are not `.pdf` or `.docx`
    /// 2. Extract the text
    /// 3. Score every criterion and aggregate the suggestion
    pub fn evaluate_upload(&self, buffer: &[u8], file_name: &str) -> Result<AutoEvaluation> {
        let format = DocumentFormat::from_file_name(file_name)?;
        let document = extract(buffer, format)?;
        let scores = self.auto_score(&document);
        let evaluation = self.evaluate(&scores);
        info!("Automatic evaluation of '{}': {}", file_name, evaluation);

        Ok(AutoEvaluation {
            document,
            scores,
            evaluation,
        })
    }

    pub fn auto_score(&self, document: &ExtractedDocument) -> ScoreSet {
        auto_score(&document.text, self.rubric)
    }

    pub fn evaluate(&self, scores: &ScoreSet) -> Evaluation {
        Evaluation::compute(scores, self.rubric)
    }

    /// Evidence paragraphs for the document, using the rubric's evidence settings.
    pub fn evidence(&self, document: &ExtractedDocument) -> Vec<String> {
        prepare_evidence(&document.text, &self.rubric.evidence)
    }

    pub fn spreadsheet(&self, scores: &ScoreSet, evaluation: &Evaluation) -> Result<Vec<u8>> {
        build_spreadsheet(self.rubric, scores, evaluation)
    }

    /// Build the report document, stamped with the current local time.
    pub fn document(
        &self,
        scores: &ScoreSet,
        evaluation: &Evaluation,
        evidence: &[String],
        project_name: Option<&str>,
    ) -> Result<Vec<u8>> {
        let input = DocumentInput {
            scores,
            evaluation,
            evidence,
            project_name,
            generated_at: Local::now().naive_local(),
        };
        build_document(self.rubric, &input)
    }
}

pub type Result<T> = std::result::Result<T, GraderError>;

#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file format: {0} (expected .pdf or .docx)")]
    UnsupportedFormat(String),
    #[error("{format} extraction failed: {reason}")]
    Extraction {
        format: DocumentFormat,
        reason: String,
    },
    #[error("Invalid rubric configuration: {0}")]
    Configuration(String),
    #[error("Unknown criterion: {0}")]
    UnknownCriterion(String),
    #[error("Score {score} for '{key}' is outside the scale {min}..={max}")]
    ScoreOutOfRange {
        key: String,
        score: u32,
        min: u32,
        max: u32,
    },
    #[error("Failed to build {artifact}: {reason}")]
    Report {
        artifact: &'static str,
        reason: String,
    },
}

impl From<lopdf::Error> for GraderError {
    fn from(e: lopdf::Error) -> Self {
        GraderError::Extraction {
            format: DocumentFormat::Pdf,
            reason: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GraderError {
    fn from(e: serde_yaml::Error) -> Self {
        GraderError::Configuration(e.to_string())
    }
}
