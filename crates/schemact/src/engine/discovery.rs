//! Migration file discovery: listing, lexicographic ordering, and the
//! per-file/aggregate size caps.

use std::collections::HashMap;
use std::path::Path;

use crate::config::Options;
use crate::error::{EngineError, Result};

/// The extension migration files must carry.
pub const MIGRATION_EXTENSION: &str = "sigl";

/// Lists `.sigl` files directly inside `migrations_path`, sorted
/// lexicographically by filename (filenames carry a leading timestamp, so
/// this is also chronological order).
///
/// # Errors
/// Returns [`EngineError::Io`] if the directory can't be read.
pub fn discover_filenames(migrations_path: &Path) -> Result<Vec<String>> {
    if !migrations_path.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(migrations_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(MIGRATION_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Reads every file named in `filenames` from `migrations_path`, enforcing
/// the per-file and aggregate size caps before any file is read if
/// validation is enabled.
///
/// # Errors
/// Returns [`EngineError::Validation`] if any individual file, or the
/// aggregate, exceeds its configured cap.
pub fn read_files(migrations_path: &Path, filenames: &[String], options: &Options) -> Result<HashMap<String, Vec<u8>>> {
    if options.enable_file_size_validation {
        let mut total: u64 = 0;
        for filename in filenames {
            let metadata = std::fs::metadata(migrations_path.join(filename))?;
            let size = metadata.len();
            if size > options.max_file_size {
                return Err(EngineError::Validation(format!(
                    "{filename} is {size} bytes, exceeding the per-file cap of {} bytes",
                    options.max_file_size
                )));
            }
            total += size;
        }
        if total > options.max_total_size {
            return Err(EngineError::Validation(format!(
                "pending migrations total {total} bytes, exceeding the aggregate cap of {} bytes",
                options.max_total_size
            )));
        }
    }

    let mut files = HashMap::with_capacity(filenames.len());
    for filename in filenames {
        let bytes = std::fs::read(migrations_path.join(filename))?;
        files.insert(filename.clone(), bytes);
    }
    Ok(files)
}
