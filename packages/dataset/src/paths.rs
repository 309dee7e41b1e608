//! File path helpers for the fused output.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns the sibling path the persister writes to before renaming it over
/// `path` (`fused.csv` becomes `fused.csv.tmp`).
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("output"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Ensures the directory containing `path` exists, creating it if
/// necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("data/crime_data_with_temp.csv")),
            PathBuf::from("data/crime_data_with_temp.csv.tmp")
        );
    }

    #[test]
    fn bare_file_name_needs_no_parent() {
        assert!(ensure_parent_dir(Path::new("fused.csv")).is_ok());
    }
}
