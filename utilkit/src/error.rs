use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Settings format error: {source}")]
    SettingsFormatError {
        #[from]
        source: serde_json::Error,
    },

    #[error("CSV output error: {source}")]
    CsvWriteError {
        #[from]
        source: csv::Error,
    },

    // Raised by the command line parser when a value option ends the argument list.
    #[error("missing argument after {0}")]
    MissingArgument(String),
}

pub type Result<T> = std::result::Result<T, ToolkitError>;
