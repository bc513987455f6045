// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use crate::error::SageError;

/// Ensure an output directory exists, creating it and its parents if needed.
///
/// # Arguments
///
/// * `directory` - Path to the output directory
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sage_core::ut::path::ensure_directory;
///
/// let base = Path::new("TEST_ENSURE_DIRECTORY/nested");
///
/// ensure_directory(base).unwrap();
/// ensure_directory(base).unwrap();
/// assert!(base.is_dir());
///
/// std::fs::remove_dir_all("TEST_ENSURE_DIRECTORY").unwrap();
/// ```
pub fn ensure_directory<P: AsRef<Path>>(directory: P) -> Result<PathBuf, SageError> {
    let directory = directory.as_ref();

    if directory.is_file() {
        return Err(SageError::DirError(format!(
            "{} is an existing file",
            directory.display()
        )));
    }

    std::fs::create_dir_all(directory).map_err(|err| SageError::DirError(err.to_string()))?;

    Ok(directory.to_path_buf())
}

/// Check that the parent directory of an output file exists.
///
/// # Arguments
///
/// * `file` - Path to an output file
pub fn check_parent_directory<P: AsRef<Path>>(file: P) -> Result<(), SageError> {
    if let Some(parent) = file.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(SageError::DirError(format!(
                "Parent directory of {} does not exist",
                file.as_ref().display()
            )));
        }
    }

    Ok(())
}
