//! Async changelog file access.

use std::path::Path;

use relnotes_core::{Changelog, Error, Result};

use crate::markdown::parse_changelog;

/// Read a changelog file as text.
pub async fn read_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))
}

/// Read and parse a changelog file.
pub async fn load_changelog(path: impl AsRef<Path>) -> Result<Changelog> {
    let path = path.as_ref();
    let source = read_source(path).await?;
    log::debug!("Read {} bytes from {}", source.len(), path.display());
    Ok(parse_changelog(&source))
}

/// Write changelog text, replacing the file.
pub async fn write_source(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_changelog() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        std::fs::write(&path, "# Changelog\n\n## 0.1.0\n\n- First\n").unwrap();

        let changelog = load_changelog(&path).await.unwrap();
        assert_eq!(changelog.sections.len(), 1);
        assert_eq!(changelog.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file_names_path() {
        let err = load_changelog("/nonexistent/CHANGELOG.md").await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/CHANGELOG.md"));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        write_source(&path, "## 0.2.0\n").await.unwrap();
        assert_eq!(read_source(&path).await.unwrap(), "## 0.2.0\n");
    }
}
