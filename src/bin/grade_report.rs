//! CLI tool for grading a final report against the rubric

use clap::Parser;
use env_logger::Env;
use rubric_grader::report::{DOCUMENT_FILE_NAME, SPREADSHEET_FILE_NAME};
use rubric_grader::{Decision, DocumentFormat, Evaluator, GraderError, RubricConfig, ScoreSet};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Score a project final report (PDF or DOCX) against the rubric
#[derive(Parser, Debug)]
#[command(name = "grade-report")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Report to evaluate (.pdf or .docx)
    file: PathBuf,

    /// Rubric YAML file (defaults to the built-in rubric)
    #[arg(long)]
    rubric: Option<PathBuf>,

    /// Manual score override, repeatable
    #[arg(long = "set", value_name = "KEY=SCORE", value_parser = parse_override)]
    overrides: Vec<(String, u32)>,

    /// Write the spreadsheet to this file or directory
    #[arg(long, value_name = "PATH")]
    xlsx: Option<PathBuf>,

    /// Write the report document to this file or directory
    #[arg(long, value_name = "PATH")]
    docx: Option<PathBuf>,

    /// Project name shown in the document title
    #[arg(long)]
    project: Option<String>,

    /// Print a single JSON object instead of text
    #[arg(long)]
    json: bool,

    /// Write the active rubric as YAML
    #[arg(long, value_name = "PATH")]
    dump_rubric: Option<PathBuf>,

    /// Characters of extracted text to preview
    #[arg(long, default_value_t = 600)]
    preview_chars: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    format: String,
    characters: usize,
    empty_pages: u32,
    auto_scores: &'a ScoreSet,
    final_scores: &'a ScoreSet,
    percentage: f64,
    decision: Decision,
    artifacts: Vec<String>,
}

fn parse_override(arg: &str) -> Result<(String, u32), String> {
    let (key, score) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=SCORE, got '{}'", arg))?;
    let score = score
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid score '{}': {}", score, e))?;
    Ok((key.trim().to_string(), score))
}

/// A directory target gets the default file name appended.
fn resolve_output(path: &Path, default_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(default_name)
    } else {
        path.to_path_buf()
    }
}

fn run(cli: &Cli) -> Result<(), GraderError> {
    let rubric = match &cli.rubric {
        Some(path) => RubricConfig::load(path)?,
        None => RubricConfig::builtin()?,
    };
    if let Some(path) = &cli.dump_rubric {
        fs::write(path, rubric.to_yaml()?)?;
    }

    let file_name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Refuse unsupported uploads before reading them into memory
    DocumentFormat::from_file_name(&file_name)?;
    let buffer = fs::read(&cli.file)?;

    let evaluator = Evaluator::new(&rubric);
    let auto = evaluator.evaluate_upload(&buffer, &file_name)?;
    let scores = if cli.overrides.is_empty() {
        auto.scores.clone()
    } else {
        auto.scores.with_overrides(&rubric, &cli.overrides)?
    };
    let evaluation = evaluator.evaluate(&scores);

    let mut artifacts = Vec::new();
    if let Some(path) = &cli.xlsx {
        let target = resolve_output(path, SPREADSHEET_FILE_NAME);
        fs::write(&target, evaluator.spreadsheet(&scores, &evaluation)?)?;
        artifacts.push(target.display().to_string());
    }
    if let Some(path) = &cli.docx {
        let target = resolve_output(path, DOCUMENT_FILE_NAME);
        let evidence = evaluator.evidence(&auto.document);
        let bytes =
            evaluator.document(&scores, &evaluation, &evidence, cli.project.as_deref())?;
        fs::write(&target, bytes)?;
        artifacts.push(target.display().to_string());
    }

    if cli.json {
        let report = JsonReport {
            file: cli.file.display().to_string(),
            format: auto.document.format.to_string(),
            characters: auto.document.char_count(),
            empty_pages: auto.document.empty_pages,
            auto_scores: &auto.scores,
            final_scores: &scores,
            percentage: evaluation.percentage,
            decision: evaluation.decision,
            artifacts,
        };
        let json = serde_json::to_string(&report)
            .map_err(|e| GraderError::Report {
                artifact: "JSON summary",
                reason: e.to_string(),
            })?;
        println!("{}", json);
        return Ok(());
    }

    println!("Final Report Evaluation");
    println!("=======================");
    println!("File: {}", cli.file.display());
    println!(
        "Type: {} ({} characters extracted)",
        auto.document.format,
        auto.document.char_count()
    );
    if auto.document.empty_pages > 0 {
        println!(
            "Note: {} page(s) had no extractable text (scanned?)",
            auto.document.empty_pages
        );
    }
    println!();
    println!("--- Extracted text (preview) ---");
    println!("{}", auto.document.preview(cli.preview_chars));
    println!();

    println!("{:<44} {:>6} {:>6}", "Criterion", "Auto", "Final");
    for criterion in &rubric.criteria {
        println!(
            "{:<44} {:>6} {:>6}",
            criterion.name,
            auto.scores.get(&criterion.key),
            scores.get(&criterion.key)
        );
    }
    println!();
    println!("Suggested: {}", auto.evaluation);
    println!("Result:    {}", evaluation);

    for artifact in &artifacts {
        println!("Written: {}", artifact);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        if cli.json {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
        } else {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}
