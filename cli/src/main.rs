//! regender CLI - layout-preserving rewriting of gendered terms in PDFs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use regender::{
    batch, rewrite, BatchJob, BatchResult, Direction, DocumentEngine, ImagePolicy, Lexicon,
    LopdfEngine, RewriteOptions, Rgb, SaveOptions,
};

#[derive(Parser)]
#[command(name = "regender")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Rewrite gendered terms in PDF documents, keeping the layout", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Direction of the rewrite (m_to_f or f_to_m)
    #[arg(short, long, value_parser = parse_direction, env = "REGENDER_DIRECTION", default_value = "m_to_f")]
    direction: Direction,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite one or more PDF files
    Transform {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (single input) or directory
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Direction of the rewrite (m_to_f or f_to_m)
        #[arg(short, long, value_parser = parse_direction, env = "REGENDER_DIRECTION", default_value = "m_to_f")]
        direction: Direction,

        /// Word table as JSON ([["he","she"], ...])
        #[arg(long, value_name = "FILE", env = "REGENDER_LEXICON")]
        lexicon: Option<PathBuf>,

        /// Leave unreadable pages untouched instead of failing
        #[arg(long)]
        lenient: bool,

        /// Also remove images under rewritten text
        #[arg(long)]
        remove_images: bool,

        /// Paint erased regions with a color (e.g. "#FFFFFF")
        #[arg(long, value_name = "COLOR", value_parser = parse_color)]
        fill: Option<Rgb>,

        /// Keep unreferenced objects and uncompressed streams
        #[arg(long)]
        no_compact: bool,

        /// Set ModDate and Producer in the document information
        #[arg(long)]
        stamp: bool,

        /// Process files one after another
        #[arg(long)]
        sequential: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview the rewrite of a piece of text
    Text {
        /// Text to rewrite
        #[arg(value_name = "TEXT")]
        text: String,

        /// Direction of the rewrite (m_to_f or f_to_m)
        #[arg(short, long, value_parser = parse_direction, env = "REGENDER_DIRECTION", default_value = "m_to_f")]
        direction: Direction,

        /// Word table as JSON
        #[arg(long, value_name = "FILE", env = "REGENDER_LEXICON")]
        lexicon: Option<PathBuf>,
    },

    /// Dump the positioned text runs of a PDF as JSON
    Runs {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only this page (1-based)
        #[arg(short, long)]
        page: Option<u32>,

        /// Keep the block and line structure
        #[arg(long)]
        blocks: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the word table
    Lexicon {
        /// Word table as JSON (built-in table if not specified)
        #[arg(long, value_name = "FILE", env = "REGENDER_LEXICON")]
        lexicon: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Transform {
            inputs,
            output,
            direction,
            lexicon,
            lenient,
            remove_images,
            fill,
            no_compact,
            stamp,
            sequential,
            json,
        }) => build_options(direction, lexicon.as_deref()).and_then(|options| {
            let mut options = options;
            if lenient {
                options = options.lenient();
            }
            if remove_images {
                options = options.with_image_policy(ImagePolicy::Remove);
            }
            if let Some(fill) = fill {
                options = options.with_redaction_fill(fill);
            }
            if sequential {
                options = options.sequential();
            }
            let save = if no_compact {
                SaveOptions::raw()
            } else {
                SaveOptions::default()
            };
            options = options.with_save_options(save.with_stamp_metadata(stamp));
            cmd_transform(&inputs, output.as_deref(), &options, json)
        }),
        Some(Commands::Text {
            text,
            direction,
            lexicon,
        }) => cmd_text(&text, direction, lexicon.as_deref()),
        Some(Commands::Runs {
            input,
            page,
            blocks,
            compact,
        }) => cmd_runs(&input, page, blocks, compact),
        Some(Commands::Lexicon { lexicon, json }) => cmd_lexicon(lexicon.as_deref(), json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: transform if input is provided
            if let Some(input) = cli.input {
                let options = RewriteOptions::new().with_direction(cli.direction);
                cmd_transform(&[input], cli.output.as_deref(), &options, false)
            } else {
                println!("{}", "Usage: regender <FILE> [OUTPUT]".yellow());
                println!("       regender --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    s.parse::<Direction>().map_err(|e| e.to_string())
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("expected RRGGBB, got '{}'", s));
    }
    u32::from_str_radix(hex, 16)
        .map(Rgb::from_packed)
        .map_err(|e| format!("invalid color '{}': {}", s, e))
}

fn load_lexicon(path: Option<&Path>) -> Result<Arc<Lexicon>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Arc::new(Lexicon::load(path)?)),
        None => Ok(Lexicon::builtin()),
    }
}

fn build_options(
    direction: Direction,
    lexicon: Option<&Path>,
) -> Result<RewriteOptions, Box<dyn std::error::Error>> {
    Ok(RewriteOptions::new()
        .with_direction(direction)
        .with_lexicon(load_lexicon(lexicon)?))
}

/// Pair each input with its output path.
fn plan_jobs(inputs: &[PathBuf], output: Option<&Path>) -> std::io::Result<Vec<BatchJob>> {
    match output {
        None => Ok(inputs.iter().map(|i| BatchJob::beside(i.clone())).collect()),
        Some(file) if inputs.len() == 1 && !file.is_dir() => {
            Ok(vec![BatchJob::new(inputs[0].clone(), file)])
        }
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Ok(inputs
                .iter()
                .map(|i| BatchJob::into_dir(i.clone(), dir))
                .collect())
        }
    }
}

fn cmd_transform(
    inputs: &[PathBuf],
    output: Option<&Path>,
    options: &RewriteOptions,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let jobs = plan_jobs(inputs, output)?;
    log::debug!("{} job(s), parallel: {}", jobs.len(), options.parallel);

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Rewriting ({})...", options.direction));

    let results = batch::transform_files_with_progress(&jobs, options, |_| pb.inc(1));
    pb.finish_and_clear();

    if as_json {
        let report: Vec<serde_json::Value> = results.iter().map(result_json).collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &results {
            print_result(result);
        }
    }

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        return Err(format!("{} of {} file(s) failed", failed, results.len()).into());
    }
    Ok(())
}

fn result_json(result: &BatchResult) -> serde_json::Value {
    match &result.outcome {
        Ok(stats) => json!({
            "input": result.job.input,
            "output": result.job.output,
            "stats": stats,
        }),
        Err(e) => json!({
            "input": result.job.input,
            "error": e.to_string(),
        }),
    }
}

fn print_result(result: &BatchResult) {
    match &result.outcome {
        Ok(stats) => {
            println!(
                "{} {} {} {}",
                "✓".green().bold(),
                result.job.input.display(),
                "→".dimmed(),
                result.job.output.display()
            );
            println!(
                "  {} page(s), {} run(s) rewritten",
                stats.pages_processed, stats.spans_modified
            );
            if stats.spans_degraded > 0 || stats.spans_skipped > 0 {
                println!(
                    "  {}",
                    format!(
                        "{} drawn with fallback font, {} could not be drawn",
                        stats.spans_degraded, stats.spans_skipped
                    )
                    .yellow()
                );
            }
        }
        Err(e) => {
            println!("{} {}: {}", "✗".red().bold(), result.job.input.display(), e);
        }
    }
}

fn cmd_text(
    text: &str,
    direction: Direction,
    lexicon: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let lexicon = load_lexicon(lexicon)?;
    println!("{}", lexicon.transform(text, direction));
    Ok(())
}

fn cmd_runs(
    input: &Path,
    page: Option<u32>,
    blocks: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = LopdfEngine::load_file(input)?;
    let pages: Vec<u32> = match page {
        Some(n) => vec![n],
        None => engine.pages().into_keys().collect(),
    };

    let value = if blocks {
        let listings = pages
            .iter()
            .map(|&n| engine.text_page(n))
            .collect::<regender::Result<Vec<_>>>()?;
        serde_json::to_value(listings)?
    } else {
        let mut out = Vec::with_capacity(pages.len());
        for &n in &pages {
            out.push(json!({ "page": n, "runs": rewrite::extract(&engine, n)? }));
        }
        serde_json::Value::Array(out)
    };

    let json = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_lexicon(lexicon: Option<&Path>, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let lexicon = load_lexicon(lexicon)?;

    if as_json {
        println!("{}", lexicon.to_json()?);
        return Ok(());
    }

    println!("{}", "Word Table".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    let width = lexicon
        .pairs()
        .iter()
        .map(|p| p.masculine.chars().count())
        .max()
        .unwrap_or(0);
    for pair in lexicon.pairs() {
        println!(
            "{:<width$} {} {}",
            pair.masculine,
            "↔".dimmed(),
            pair.feminine,
            width = width
        );
    }
    println!();
    println!("{}: {}", "Pairs".bold(), lexicon.len());
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "regender".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout-preserving rewriting of gendered terms in PDF documents");
    println!();
    println!("Library: regender {}", regender::VERSION);
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#FFFFFF").unwrap(), Rgb::WHITE);
        assert_eq!(parse_color("000000").unwrap(), Rgb::BLACK);
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("f_to_m").unwrap(), Direction::FeminineToMasculine);
        assert!(parse_direction("sideways").is_err());
    }

    #[test]
    fn test_plan_jobs_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let jobs = plan_jobs(&[PathBuf::from("in.pdf")], Some(&output)).unwrap();
        assert_eq!(jobs, vec![BatchJob::new("in.pdf", output)]);
    }

    #[test]
    fn test_plan_jobs_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
        let jobs = plan_jobs(&inputs, Some(&out_dir)).unwrap();
        assert!(out_dir.is_dir());
        assert_eq!(jobs[1].output, out_dir.join("transformed_b.pdf"));
    }

    #[test]
    fn test_plan_jobs_default_beside_input() {
        let jobs = plan_jobs(&[PathBuf::from("docs/a.pdf")], None).unwrap();
        assert_eq!(jobs[0].output, PathBuf::from("docs/transformed_a.pdf"));
    }

    #[test]
    fn test_cli_parses_transform() {
        let cli = Cli::try_parse_from([
            "regender",
            "transform",
            "a.pdf",
            "b.pdf",
            "-d",
            "f_to_m",
            "--fill",
            "#FFFFFF",
            "--sequential",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Transform {
                inputs,
                direction,
                fill,
                sequential,
                ..
            }) => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(direction, Direction::FeminineToMasculine);
                assert_eq!(fill, Some(Rgb::WHITE));
                assert!(sequential);
            }
            _ => panic!("expected transform command"),
        }
    }
}
