//! Atomic bundle output.
//!
//! Output filenames are derived from bundle names, which come from user
//! configuration, so every path is validated against traversal out of the
//! build target before anything touches disk. Writes go through a temp file
//! and a rename so readers never observe a half-written bundle.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::{Error, Result};

/// Resolve `filename` under `dir`, rejecting anything that would land
/// outside it.
pub(crate) fn resolve_output_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "filename contains a null byte".into(),
        ));
    }
    let relative = Path::new(filename).clean();
    if relative.is_absolute() || relative.starts_with("..") {
        return Err(Error::InvalidOutputPath(format!(
            "'{filename}' escapes the build target directory"
        )));
    }
    Ok(dir.join(relative))
}

/// Write `contents` to `path` through a temp file and an atomic rename,
/// creating parent directories as needed.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            Error::WriteFailure(format!(
                "cannot create directory '{}': {err}",
                parent.display()
            ))
        })?;
    }

    let temp = path.with_extension("tmp");
    tokio::fs::write(&temp, contents).await.map_err(|err| {
        Error::WriteFailure(format!(
            "cannot write temporary file '{}': {err}",
            temp.display()
        ))
    })?;

    if let Err(err) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(Error::WriteFailure(format!(
            "cannot rename '{}' to '{}': {err}",
            temp.display(),
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn plain_filenames_resolve_under_the_target() {
        let path = resolve_output_path(Path::new("/out"), "main.js").unwrap();
        assert_eq!(path, Path::new("/out/main.js"));
    }

    #[test]
    fn nested_filenames_are_allowed() {
        let path = resolve_output_path(Path::new("/out"), "bundles/app.js").unwrap();
        assert_eq!(path, Path::new("/out/bundles/app.js"));
    }

    #[test]
    fn traversal_is_rejected() {
        for filename in ["../escape.js", "safe/../../escape.js", "/etc/passwd"] {
            let err = resolve_output_path(Path::new("/out"), filename).unwrap_err();
            assert!(matches!(err, Error::InvalidOutputPath(_)), "{filename}");
        }
    }

    #[test]
    fn null_bytes_are_rejected() {
        let err = resolve_output_path(Path::new("/out"), "a\0b.js").unwrap_err();
        assert!(matches!(err, Error::InvalidOutputPath(_)));
    }

    #[test]
    fn dot_relative_targets_work() {
        let path = resolve_output_path(Path::new("dist"), "./main.js").unwrap();
        assert_eq!(path, Path::new("dist/main.js"));
    }

    #[tokio::test]
    async fn write_creates_parents_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("main.js");

        write_atomic(&path, b"define('a');").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "define('a');");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn write_replaces_existing_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.js");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
