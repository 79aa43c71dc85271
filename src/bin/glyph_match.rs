use clap::Parser;
use glyph_recog::cli::{init_tracing, open_recognizer, print_results, read_input};
use glyph_recog::MatcherSelector;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glyph_match")]
#[command(about = "Recognize a drawn glyph against a template library")]
struct Args {
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

    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    format: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let recognizer = open_recognizer(&args.library, None)?;
    let selector: MatcherSelector = args.matcher.parse()?;
    let strokes = read_input(args.input.as_deref())?;

    let results = recognizer.recognize(&strokes, args.top_k, &selector)?;
    print_results(&results, &args.format)?;

    Ok(())
}
