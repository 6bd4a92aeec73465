//! Entry point for the sandmirror binary.
#![forbid(unsafe_code)]

use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
    if let Err(err) = sandmirror_cli::run() {
        eprintln!("sandmirror: {err}");
        std::process::exit(1);
    }
}
