//! Evaluation report document (DOCX)
//!
//! Section order: title, date, per-criterion results, interpretation,
//! evidence excerpt, decision, blank space for the reviewer's observations.

use crate::aggregator::Evaluation;
use crate::report::{format_number, improvements, line_items, strengths};
use crate::rubric::RubricConfig;
use crate::scorer::ScoreSet;
use crate::{GraderError, Result};
use chrono::NaiveDateTime;
use docx_rs::{Docx, Paragraph, Run, RunFonts, Style, StyleType};
use log::debug;
use std::io::Cursor;

pub const DOCUMENT_TITLE: &str = "UCCuyo – Valoración de Informe Final";

const BODY_FONT: &str = "Times New Roman";
/// 11pt, in half-points
const BODY_SIZE: usize = 22;
const OBSERVATION_LINES: usize = 6;
const OBSERVATION_RULE: &str =
    "________________________________________________________________________";

/// Everything the document shows besides the rubric itself
#[derive(Debug, Clone)]
pub struct DocumentInput<'a> {
    pub scores: &'a ScoreSet,
    pub evaluation: &'a Evaluation,
    /// Paragraphs from the evidence formatter, embedded verbatim
    pub evidence: &'a [String],
    pub project_name: Option<&'a str>,
    pub generated_at: NaiveDateTime,
}

/// Title line, suffixed with the project name when one is given.
pub fn document_title(project_name: Option<&str>) -> String {
    match project_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{}: {}", DOCUMENT_TITLE, name),
        None => DOCUMENT_TITLE.to_string(),
    }
}

/// Build the `.docx` report entirely in memory.
pub fn build_document(rubric: &RubricConfig, input: &DocumentInput<'_>) -> Result<Vec<u8>> {
    let docx = compose(rubric, input);
    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| GraderError::Report {
            artifact: "document",
            reason: e.to_string(),
        })?;
    let bytes = buffer.into_inner();
    debug!(
        "Built document ({} bytes, {} evidence paragraphs)",
        bytes.len(),
        input.evidence.len()
    );
    Ok(bytes)
}

fn compose(rubric: &RubricConfig, input: &DocumentInput<'_>) -> Docx {
    let fonts = RunFonts::new()
        .ascii(BODY_FONT)
        .hi_ansi(BODY_FONT)
        .cs(BODY_FONT);
    let mut docx = Docx::new()
        .default_fonts(fonts)
        .default_size(BODY_SIZE)
        .add_style(heading_style("Heading1", "Heading 1", 32))
        .add_style(heading_style("Heading2", "Heading 2", 26));

    docx = docx
        .add_paragraph(heading(&document_title(input.project_name), "Heading1"))
        .add_paragraph(text(format!(
            "Fecha: {}",
            input.generated_at.format("%Y-%m-%d %H:%M")
        )));

    // Results
    let lines = line_items(rubric, input.scores);
    docx = docx.add_paragraph(heading("Resultados por criterio", "Heading2"));
    for line in &lines {
        let detail = format!(
            "(Puntaje: {}/{} · Peso: {}% · Aporte: {}%)",
            line.score,
            rubric.scale.max,
            format_number(line.weight),
            format_number(line.contribution)
        );
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(format!("{} ", line.name)).bold())
                .add_run(Run::new().add_text(detail)),
        );
    }

    // Interpretation
    docx = docx
        .add_paragraph(heading("Interpretación", "Heading2"))
        .add_paragraph(text(list_sentence(
            "Fortalezas",
            &strengths(&lines),
            "no se identifican fortalezas destacadas.",
        )))
        .add_paragraph(text(list_sentence(
            "Aspectos a mejorar",
            &improvements(&lines),
            "no se identifican aspectos críticos.",
        )));

    // Evidence
    docx = docx.add_paragraph(heading("Evidencia analizada (extracto)", "Heading2"));
    if input.evidence.is_empty() {
        docx = docx.add_paragraph(text("No se extrajo texto del informe."));
    }
    for paragraph in input.evidence {
        docx = docx.add_paragraph(text(paragraph));
    }

    // Decision
    docx = docx
        .add_paragraph(heading("Dictamen", "Heading2"))
        .add_paragraph(text(format!(
            "Dictamen: {} — Cumplimiento: {}%",
            input.evaluation.decision,
            format_number(input.evaluation.percentage)
        )));

    // Reviewer space
    docx = docx.add_paragraph(heading("Observaciones del evaluador", "Heading2"));
    for _ in 0..OBSERVATION_LINES {
        docx = docx.add_paragraph(text(OBSERVATION_RULE));
    }

    docx
}

/// `"<label>: a, b."`, or the fallback phrase when `items` is empty.
fn list_sentence(label: &str, items: &[&str], fallback: &str) -> String {
    if items.is_empty() {
        format!("{}: {}", label, fallback)
    } else {
        format!("{}: {}.", label, items.join(", "))
    }
}

fn heading_style(id: &str, name: &str, size: usize) -> Style {
    Style::new(id, StyleType::Paragraph)
        .name(name)
        .size(size)
        .bold()
}

fn heading(content: &str, style: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(content))
        .style(style)
}

fn text(content: impl AsRef<str>) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(content.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_docx_mem;
    use crate::scorer::ScoreSource;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_title_with_project_name() {
        assert_eq!(document_title(None), DOCUMENT_TITLE);
        assert_eq!(document_title(Some("   ")), DOCUMENT_TITLE);
        assert_eq!(
            document_title(Some("  Suelos áridos ")),
            format!("{}: Suelos áridos", DOCUMENT_TITLE)
        );
    }

    #[test]
    fn test_list_sentence() {
        assert_eq!(
            list_sentence("Fortalezas", &["A", "B"], "ninguna."),
            "Fortalezas: A, B."
        );
        assert_eq!(
            list_sentence("Fortalezas", &[], "ninguna."),
            "Fortalezas: ninguna."
        );
    }

    #[test]
    fn test_document_sections_in_order() {
        let rubric = RubricConfig::builtin().unwrap();
        let mut scores = ScoreSet::from_pairs(
            ScoreSource::Manual,
            rubric.criteria.iter().map(|c| (c.key.clone(), 2)),
        );
        scores.insert("resultados", 4);
        scores.insert("equipo", 0);
        let evaluation = Evaluation::compute(&scores, &rubric);
        let evidence = vec!["Primer párrafo.".to_string(), "Segundo párrafo.".to_string()];
        let input = DocumentInput {
            scores: &scores,
            evaluation: &evaluation,
            evidence: &evidence,
            project_name: Some("Proyecto X"),
            generated_at: timestamp(),
        };

        let bytes = build_document(&rubric, &input).unwrap();
        let text = extract_docx_mem(&bytes).unwrap().text;

        let order = [
            "UCCuyo – Valoración de Informe Final: Proyecto X",
            "Fecha: 2024-03-15 10:30",
            "Resultados obtenidos",
            "(Puntaje: 4/4 · Peso: 15% · Aporte: 15%)",
            "Desempeño del equipo",
            "(Puntaje: 0/4 · Peso: 5% · Aporte: 0%)",
            "Fortalezas: Resultados obtenidos.",
            "Aspectos a mejorar: Desempeño del equipo.",
            "Primer párrafo.",
            "Segundo párrafo.",
            "Dictamen: APROBADO CON OBSERVACIONES — Cumplimiento: 55%",
            OBSERVATION_RULE,
        ];
        let mut from = 0;
        for expected in order {
            let pos = text[from..]
                .find(expected)
                .unwrap_or_else(|| panic!("missing or out of order: {}", expected));
            from += pos + expected.len();
        }
    }

    #[test]
    fn test_empty_evidence_and_fallback_sentences() {
        let rubric = RubricConfig::builtin().unwrap();
        let scores = ScoreSet::from_pairs(
            ScoreSource::Manual,
            rubric.criteria.iter().map(|c| (c.key.clone(), 2)),
        );
        let evaluation = Evaluation::compute(&scores, &rubric);
        let input = DocumentInput {
            scores: &scores,
            evaluation: &evaluation,
            evidence: &[],
            project_name: None,
            generated_at: timestamp(),
        };

        let text = extract_docx_mem(&build_document(&rubric, &input).unwrap())
            .unwrap()
            .text;
        assert!(text.contains("Fortalezas: no se identifican fortalezas destacadas."));
        assert!(text.contains("Aspectos a mejorar: no se identifican aspectos críticos."));
        assert!(text.contains("No se extrajo texto del informe."));
        assert!(text.contains("Dictamen: APROBADO CON OBSERVACIONES — Cumplimiento: 50%"));
    }
}
