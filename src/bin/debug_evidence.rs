//! Print the evidence paragraphs that would be embedded in the report document

use clap::Parser;
use env_logger::Env;
use rubric_grader::extractor::extract_file;
use rubric_grader::{prepare_evidence, RubricConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "debug-evidence")]
#[command(about = "Show scoped and chunked evidence paragraphs for a report")]
struct Cli {
    /// Report to inspect (.pdf or .docx)
    file: PathBuf,

    /// Rubric YAML file (defaults to the built-in rubric)
    #[arg(long)]
    rubric: Option<PathBuf>,

    /// Override the per-paragraph character limit
    #[arg(long)]
    max_chars: Option<usize>,

    /// Stop the excerpt at the first terminal marker
    #[arg(long)]
    cut_at_terminal: bool,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let rubric = match &cli.rubric {
        Some(path) => RubricConfig::load(path),
        None => RubricConfig::builtin(),
    };
    let rubric = rubric.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let mut config = rubric.evidence.clone();
    if let Some(max) = cli.max_chars {
        config.max_paragraph_chars = max.max(1);
    }
    config.cut_at_terminal |= cli.cut_at_terminal;

    let document = extract_file(&cli.file).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let paragraphs = prepare_evidence(&document.text, &config);
    println!(
        "=== {} ({} characters, {} paragraphs, max {}) ===",
        cli.file.display(),
        document.char_count(),
        paragraphs.len(),
        config.max_paragraph_chars
    );
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        println!("[{:>3}] ({} chars)", idx + 1, paragraph.chars().count());
        println!("{}", paragraph);
        println!();
    }
}
