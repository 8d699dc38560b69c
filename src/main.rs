//! docgate entry point
//!
//! Parses CLI arguments, delegates to the CLI module, prints errors to
//! stderr, and exits non-zero on failure.

use docgate::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
