use simherd::cli::Cli;

fn main() {
    // Initialize CLI and launch the fleet
    if let Err(e) = Cli::run() {
        eprintln!("✗ Error: {}", e);
        std::process::exit(1);
    }
}
