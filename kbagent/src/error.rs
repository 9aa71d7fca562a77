use thiserror::Error;

/// App errors
#[derive(Error, Debug)]
pub enum AppError {

    /// Toml parsing error
    #[error("Failed to parse config file: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Config parsing error
    #[error("Failed to parse config file: {0}")]
    ConfigParseError(&'static str),

    /// Missing arguments
    #[error("Missing mandatory arguments: {0}\nTry `kbagent --help` for more information.")]
    MissingArgError(&'static str),

    /// Invalid argument value
    #[error("Incorrect argument value: {0}")]
    InvalidArgError(&'static str),

    /// Command line parsing error, also used for --help and --version.
    #[error("{0}")]
    Cli(#[from] clap::Error),

    /// Library error
    #[error("{0}")]
    LibError(#[from] kbagent_lib::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// General error.
    #[error("{0}")]
    Error(String),
}
