//! Run configuration.
//!
//! Settings come from an optional YAML file; the CLI overlays its flags on
//! top and the merged result is validated once before any file is touched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Rows per batch when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// Column holding the phone number in the blocklist.
pub const DEFAULT_KEY_COLUMN: &str = "TELEFONE";

/// Line terminator used for the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Lf,
    Crlf,
}

impl From<LineTerminator> for csv::Terminator {
    fn from(terminator: LineTerminator) -> Self {
        match terminator {
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
            LineTerminator::Crlf => csv::Terminator::CRLF,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Text file whose first `;`-separated field on each line is excluded.
    pub exclusion_path: PathBuf,
    /// Large CSV to filter.
    pub blocklist_path: PathBuf,
    /// Destination CSV; truncated on every run.
    pub output_path: PathBuf,
    /// Maximum number of records held in memory at once.
    pub batch_size: usize,
    pub key_column: String,
    pub exclusion_delimiter: char,
    pub blocklist_delimiter: char,
    pub line_terminator: LineTerminator,
    /// Write to a temp file and rename into place only on success.
    pub atomic_output: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclusion_path: PathBuf::new(),
            blocklist_path: PathBuf::new(),
            output_path: PathBuf::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            exclusion_delimiter: ';',
            blocklist_delimiter: ',',
            line_terminator: LineTerminator::Lf,
            atomic_output: false,
        }
    }
}

impl FilterConfig {
    /// Parses a YAML config file. The result is not validated yet because
    /// CLI flags may still fill in missing fields.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FilterError::ConfigRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, FilterError> {
        serde_yaml::from_str(content).map_err(|e| FilterError::ConfigParse(e.to_string()))
    }

    /// Checks the merged configuration.
    pub fn validate(&self) -> Result<(), FilterError> {
        require_path("exclusion_path", &self.exclusion_path)?;
        require_path("blocklist_path", &self.blocklist_path)?;
        require_path("output_path", &self.output_path)?;

        let output = resolve_path(&self.output_path);
        if output == resolve_path(&self.blocklist_path)
            || output == resolve_path(&self.exclusion_path)
        {
            return Err(FilterError::InvalidConfig(
                "output_path must differ from the input paths".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(FilterError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.key_column.trim().is_empty() {
            return Err(FilterError::InvalidConfig(
                "key_column cannot be empty".to_string(),
            ));
        }
        delimiter_byte("exclusion_delimiter", self.exclusion_delimiter)?;
        delimiter_byte("blocklist_delimiter", self.blocklist_delimiter)?;
        Ok(())
    }

    /// Blocklist delimiter as the byte the CSV reader expects.
    pub fn blocklist_delimiter_byte(&self) -> Result<u8, FilterError> {
        delimiter_byte("blocklist_delimiter", self.blocklist_delimiter)
    }
}

fn require_path(field: &str, path: &Path) -> Result<(), FilterError> {
    if path.as_os_str().is_empty() {
        return Err(FilterError::InvalidConfig(format!("{} is required", field)));
    }
    Ok(())
}

/// Absolute form of `path` with `..` and symlinks resolved. Files that do
/// not exist yet resolve through their parent directory; if that fails too
/// the path is returned as given.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn delimiter_byte(field: &str, delimiter: char) -> Result<u8, FilterError> {
    if !delimiter.is_ascii() || delimiter == '\n' || delimiter == '\r' || delimiter == '"' {
        return Err(FilterError::InvalidConfig(format!(
            "{} must be a single ASCII character other than a quote or line break",
            field
        )));
    }
    Ok(delimiter as u8)
}
