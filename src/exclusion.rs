//! Exclusion list loading.
//!
//! The exclusion list is a plain text export where only the first
//! delimited field of each line matters. It is small enough to hold in a
//! `HashSet` for the whole run.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::FilterError;

/// Phone numbers to drop from the blocklist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    keys: HashSet<String>,
}

impl ExclusionSet {
    /// Loads the exclusion list at `path`.
    ///
    /// A missing file is not an error: a warning is logged and an empty set
    /// is returned so the whole blocklist passes through.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::ExclusionRead` if the file exists but cannot be
    /// opened or is not valid UTF-8.
    pub fn load(path: impl AsRef<Path>, delimiter: char) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Exclusion list not found, proceeding without exclusions"
                );
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(FilterError::ExclusionRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let set = Self::from_reader(BufReader::new(file), delimiter)?;
        debug!(path = %path.display(), keys = set.len(), "Loaded exclusion list");
        Ok(set)
    }

    /// Builds the set from any buffered reader of exclusion lines.
    pub fn from_reader<R: BufRead>(reader: R, delimiter: char) -> Result<Self, FilterError> {
        let mut keys = HashSet::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                FilterError::ExclusionRead(format!("line {}: {}", index + 1, e))
            })?;
            let line = if index == 0 {
                line.trim_start_matches('\u{feff}')
            } else {
                line.as_str()
            };

            if let Some(key) = first_field(line, delimiter) {
                keys.insert(key.to_string());
            }
        }

        Ok(Self { keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<String> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Trimmed first field of a line, or `None` for blank lines and blank keys.
fn first_field(line: &str, delimiter: char) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let key = line.split(delimiter).next().unwrap_or(line).trim();
    (!key.is_empty()).then_some(key)
}
