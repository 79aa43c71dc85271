use clap::Parser;
use glyph_recog::cli::{init_tracing, open_recognizer, verify_library};
use glyph_recog::MatcherSelector;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glyph_verify")]
#[command(about = "Check that every template in a library recognizes as itself")]
struct Args {
    /// Template library (JSON)
    #[arg(short, long)]
    library: PathBuf,

    /// Matcher: alignment, angular, spatial or combined
    #[arg(short, long, default_value = "combined")]
    matcher: String,

    /// Show every template that was not recognized as itself
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let recognizer = open_recognizer(&args.library, None)?;
    let selector: MatcherSelector = args.matcher.parse()?;
    let report = verify_library(&recognizer, &selector)?;

    if args.verbose {
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

    if !report.failures.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
