mod catalog;
mod config;
mod error;
mod options;
mod prompts;
mod style;
mod term;
mod toml_parser;
mod util;
mod wiring;

use catalog::Catalog;
use error::AppError;
use options::Options;
use config::Config;
use term::Term;
use tracing_subscriber::EnvFilter;

fn run_agent() -> Result<(), AppError> {
    let options = Options::load(std::env::args_os())?;

    if options.list_kb {
        let catalog = Catalog::new(options.knowledge_bases);
        return Ok(Term::new().print_catalog(&catalog)?);
    }

    let config: Config = options.try_into()?;

    wiring::run(config)
}

fn main() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(".env not loaded: {e}");
        }
    }

    match run_agent() {
        Ok(()) => {},
        Err(AppError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}
