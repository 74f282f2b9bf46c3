//! Validates user-supplied migration names before they ever touch the
//! filesystem.
//!
//! A name is decoded iteratively (in case it arrived percent-encoded more
//! than once), normalized to NFC, checked against a tight character set,
//! length-capped, and finally confirmed to resolve to a strict descendant
//! of the migrations directory.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::{EngineError, Result};

const MAX_DECODE_PASSES: usize = 5;
const MAX_NAME_LENGTH: usize = 100;

fn percent_decode_once(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let mut decoded_any = false;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            if let Ok(value) = u8::from_str_radix(hex, 16) {
                out.push(value);
                i += 3;
                decoded_any = true;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    if !decoded_any {
        return None;
    }
    String::from_utf8(out).ok()
}

/// Repeatedly percent-decodes `input` until a pass produces no change, or
/// [`MAX_DECODE_PASSES`] passes have run.
fn iteratively_decode(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        match percent_decode_once(&current) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    current
}

fn is_valid_charset(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Validates a raw, possibly percent-encoded, user-supplied migration name
/// and returns its final target path inside `migrations_dir`.
///
/// # Errors
/// Returns [`EngineError::Validation`] if the name fails the character-set,
/// length, or descendant checks, or if `migrations_dir` is a symlink.
pub fn validate_migration_name(raw_name: &str, migrations_dir: &Path) -> Result<PathBuf> {
    if migrations_dir.exists() {
        let metadata = std::fs::symlink_metadata(migrations_dir)?;
        if metadata.file_type().is_symlink() {
            return Err(EngineError::Validation(
                "the migrations directory must not be a symbolic link".to_string(),
            ));
        }
    }

    let decoded = iteratively_decode(raw_name);
    let normalized: String = decoded.nfc().collect();

    if !is_valid_charset(&normalized) {
        return Err(EngineError::Validation(format!(
            "migration name '{raw_name}' must match [A-Za-z0-9_-]+, start with a letter or digit, and be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let candidate = migrations_dir.join(&normalized);
    let base = migrations_dir
        .canonicalize()
        .unwrap_or_else(|_| migrations_dir.to_path_buf());
    let resolved_parent = candidate
        .parent()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()))
        .unwrap_or_else(|| base.clone());

    if resolved_parent != base {
        return Err(EngineError::Validation(format!(
            "migration name '{raw_name}' resolves outside the migrations directory"
        )));
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_plain_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = validate_migration_name("add_users_table", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("add_users_table"));
    }

    #[test]
    fn rejects_single_dot_dot_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_migration_name("../etc", dir.path()).is_err());
    }

    #[test]
    fn rejects_single_encoded_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_migration_name("..%2Fetc", dir.path()).is_err());
    }

    #[test]
    fn rejects_double_encoded_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_migration_name("..%252Fetc", dir.path()).is_err());
    }

    #[test]
    fn rejects_names_starting_with_a_hyphen() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_migration_name("-leading-hyphen", dir.path()).is_err());
    }

    #[test]
    fn rejects_names_over_the_length_cap() {
        let dir = tempfile::tempdir().unwrap();
        let long = "a".repeat(101);
        assert!(validate_migration_name(&long, dir.path()).is_err());
    }
}
