use crate::{
    config::RecognizerConfig,
    error::{RecogError, RecogResult},
    glyph::StrokeSet,
    loader::{load_library_from_file, parse_strokes},
    matcher::RankedResult,
    recognizer::{MatcherSelector, Recognizer},
};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

/// Glyph recognition CLI
#[derive(Parser)]
#[command(name = "glyph_recog")]
#[command(about = "Multi-metric handwritten glyph recognition")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recognize a drawn glyph against a template library
    Match {
        /// Template library (JSON)
        #[arg(short, long)]
        library: PathBuf,

        /// Drawn strokes as JSON (stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of candidates to return
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,

        /// Matcher: alignment, angular, spatial or combined
        #[arg(short, long, default_value = "combined")]
        matcher: String,

        /// Only consider these characters
        #[arg(short, long)]
        allowed: Option<String>,

        /// Recognizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (json, text)
        #[arg(short, long, default_value = "json")]
        format: String,
    },
    /// Check that every template recognizes as itself
    Verify {
        /// Template library (JSON)
        #[arg(short, long)]
        library: PathBuf,

        /// Matcher: alignment, angular, spatial or combined
        #[arg(short, long, default_value = "combined")]
        matcher: String,

        /// Recognizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Show detailed results
        #[arg(short, long)]
        verbose: bool,
    },
    /// Summarize a template library
    Stats {
        /// Template library (JSON)
        #[arg(short, long)]
        library: PathBuf,
    },
}

/// Install the stderr log subscriber, honouring `RUST_LOG`
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("glyph_recog=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application
pub fn run() -> RecogResult<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            library,
            input,
            top_k,
            matcher,
            allowed,
            config,
            format,
        } => run_match(
            &library,
            input.as_deref(),
            top_k,
            &matcher,
            allowed.as_deref(),
            config.as_deref(),
            &format,
        ),
        Commands::Verify {
            library,
            matcher,
            config,
            format,
            verbose,
        } => run_verify(&library, &matcher, config.as_deref(), &format, verbose),
        Commands::Stats { library } => run_stats(&library),
    }
}

/// Build a recognizer and load `library` into it
pub fn open_recognizer(library: &Path, config: Option<&Path>) -> RecogResult<Recognizer> {
    let config = match config {
        Some(path) => RecognizerConfig::from_file(path)?,
        None => RecognizerConfig::default(),
    };
    let recognizer = Recognizer::try_new(config)?;
    let count = recognizer.load_from_file(library)?;
    info!(templates = count, library = %library.display(), "library_loaded");
    Ok(recognizer)
}

/// Read drawn strokes from a file, or stdin when no path is given
pub fn read_input(input: Option<&Path>) -> RecogResult<StrokeSet> {
    let json = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    parse_strokes(json.trim())
}

/// Print results in the requested format
pub fn print_results(results: &[RankedResult], format: &str) -> RecogResult<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(results)?),
        "text" => {
            for (rank, result) in results.iter().enumerate() {
                println!("{}. {}  {:.3}", rank + 1, result.label, result.score);
            }
        }
        _ => {
            return Err(RecogError::configuration(format!(
                "Unknown output format: {}",
                format
            )))
        }
    }
    Ok(())
}

fn run_match(
    library: &Path,
    input: Option<&Path>,
    top_k: usize,
    matcher: &str,
    allowed: Option<&str>,
    config: Option<&Path>,
    format: &str,
) -> RecogResult<()> {
    let recognizer = open_recognizer(library, config)?;
    let selector: MatcherSelector = matcher.parse()?;
    let strokes = read_input(input)?;

    let results = match allowed {
        Some(chars) => {
            let labels: Vec<String> = chars.chars().map(String::from).collect();
            recognizer.recognize_in_set(&strokes, &labels, top_k, &selector)?
        }
        None => recognizer.recognize(&strokes, top_k, &selector)?,
    };

    print_results(&results, format)
}

/// Self-recognition outcome over a whole library
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VerifyReport {
    pub total: usize,
    pub matched: usize,
    pub failures: Vec<String>,
}

impl VerifyReport {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Submit every template as input and count first-place hits on its own label
pub fn verify_library(
    recognizer: &Recognizer,
    selector: &MatcherSelector,
) -> RecogResult<VerifyReport> {
    let set = recognizer.templates()?;
    let mut report = VerifyReport {
        total: 0,
        matched: 0,
        failures: Vec::new(),
    };

    for template in set.iter() {
        report.total += 1;
        let results = recognizer.recognize(template.strokes(), 1, selector)?;
        match results.first() {
            Some(best) if best.label == template.label() => report.matched += 1,
            Some(best) => report
                .failures
                .push(format!("{} (recognized as {})", template.label(), best.label)),
            None => report.failures.push(format!("{} (no result)", template.label())),
        }
    }

    Ok(report)
}

fn run_verify(
    library: &Path,
    matcher: &str,
    config: Option<&Path>,
    format: &str,
    verbose: bool,
) -> RecogResult<()> {
    let recognizer = open_recognizer(library, config)?;
    let selector: MatcherSelector = matcher.parse()?;
    let report = verify_library(&recognizer, &selector)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => {
            if verbose {
                for failure in &report.failures {
                    println!("✗ {}", failure);
                }
            }
            println!("Verification Results:");
            println!("  Total templates: {}", report.total);
            println!("  Recognized as themselves: {}", report.matched);
            if report.total > 0 {
                println!("  Success rate: {:.2}%", report.success_rate() * 100.0);
            }
        }
        _ => {
            return Err(RecogError::configuration(format!(
                "Unknown output format: {}",
                format
            )))
        }
    }

    Ok(())
}

fn run_stats(library: &Path) -> RecogResult<()> {
    let records = load_library_from_file(library)?;
    let recognizer = Recognizer::default();
    recognizer.load_records(records)?;
    let stats = recognizer.templates()?.stats();

    println!("Statistics:");
    println!("  Total: {}", stats.total);
    println!("  Hiragana: {}", stats.hiragana);
    println!("  Katakana: {}", stats.katakana);
    println!("  Kanji: {}", stats.kanji);
    println!("  Others: {}", stats.other);
    Ok(())
}
