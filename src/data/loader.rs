use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use super::model::Document;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read and parse the dataset document.
///
/// Expected JSON schema (one array of records per section):
///
/// ```json
/// {
///   "ca_data_support": [
///     { "Année": 2016, "PC": 10, "Console": 20, "Mobile": 5, "Total": 35 },
///     ...
///   ],
///   ...
/// }
/// ```
pub fn load(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).map_err(|e| DataError::unavailable(path, e))?;
    let doc: Document = serde_json::from_str(&text).map_err(|e| DataError::unavailable(path, e))?;
    log::debug!(
        "Parsed {} with sections {:?}",
        path.display(),
        doc.section_names().collect::<Vec<_>>()
    );
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Memoized loader
// ---------------------------------------------------------------------------

/// Loads the document on first use and serves it from memory afterwards.
///
/// The backing file does not change while the dashboard runs, so a loader is
/// never invalidated; opening another file creates a new loader.
#[derive(Debug)]
pub struct CachedLoader {
    path: PathBuf,
    document: OnceCell<Document>,
}

impl CachedLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed document, reading the file only on the first call.
    pub fn get_or_load(&self) -> Result<&Document> {
        self.document.get_or_try_init(|| {
            log::info!("Loading dataset from {}", self.path.display());
            load(&self.path)
        })
    }
}
