fn main() {
    if let Err(err) = glyph_recog::cli::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
