use std::path::PathBuf;

use thiserror::Error;

/// Error type shared by every stage of a filter run.
#[derive(Debug, Error)]
pub enum FilterError {
    // ── Config ────────────────────────────────────────────────────────────────
    #[error("Failed to read config file {path}: {message}")]
    ConfigRead { path: PathBuf, message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input ─────────────────────────────────────────────────────────────────
    #[error("Blocklist file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Blocklist file has no header row")]
    NoHeader,

    #[error("Blocklist header has no '{column}' column")]
    MissingColumn { column: String },

    #[error("Failed to read exclusion list: {0}")]
    ExclusionRead(String),

    // ── Processing ────────────────────────────────────────────────────────────
    #[error("Failed to read CSV record: {0}")]
    CsvRead(String),

    #[error("Failed to write output: {0}")]
    CsvWrite(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl FilterError {
    /// Short operator-facing suggestion logged next to the error.
    pub fn hint(&self) -> &'static str {
        match self {
            FilterError::ConfigRead { .. } => "Check the --config path",
            FilterError::ConfigParse(_) => "Fix the YAML syntax in the config file",
            FilterError::InvalidConfig(_) => "Adjust the named setting and run again",
            FilterError::SourceNotFound(_) => "Check the blocklist path",
            FilterError::NoHeader => "The blocklist must start with a header row",
            FilterError::MissingColumn { .. } => {
                "Set key_column to a column present in the blocklist header"
            }
            FilterError::ExclusionRead(_) => "Check permissions and encoding of the exclusion list",
            FilterError::CsvRead(_) => "Check the blocklist is valid UTF-8 CSV",
            FilterError::CsvWrite(_) | FilterError::Io(_) => {
                "Check free space and permissions on the output directory"
            }
        }
    }
}

impl From<std::io::Error> for FilterError {
    fn from(e: std::io::Error) -> Self {
        FilterError::Io(e.to_string())
    }
}
