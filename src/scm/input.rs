use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{BlameError, Result};

/// A file to blame, with the number of lines the analyser believes it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Path relative to the base directory, as handed to `lscm`
    pub path: String,
    /// Declared line count (a trailing newline opens one more, empty, line)
    pub lines: usize,
}

impl InputFile {
    pub fn new(path: impl Into<String>, lines: usize) -> Self {
        Self {
            path: path.into(),
            lines,
        }
    }

    /// Reads `path` (absolute, or relative to `base_dir`) to count its lines.
    pub async fn from_disk(base_dir: &Path, path: &Path) -> Result<Self> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };

        let content = tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BlameError::PathNotFound(full.display().to_string()),
            _ => BlameError::Io(e),
        })?;

        Ok(Self {
            path: relative_name(base_dir, &full),
            lines: count_lines(&content),
        })
    }
}

/// Everything one batch needs: where to run `lscm` and what to blame.
#[derive(Debug, Clone)]
pub struct BlameInput {
    pub base_dir: PathBuf,
    pub files: Vec<InputFile>,
}

impl BlameInput {
    pub fn new(base_dir: impl Into<PathBuf>, files: Vec<InputFile>) -> Self {
        Self {
            base_dir: base_dir.into(),
            files,
        }
    }
}

/// Counts lines the way the analyser does: `\n`, `\r\n` and a lone `\r`
/// all end a line, and there is always one more line after the last break.
pub fn count_lines(content: &[u8]) -> usize {
    let mut lines = 1;
    let mut iter = content.iter().peekable();
    while let Some(&b) = iter.next() {
        match b {
            b'\n' => lines += 1,
            b'\r' => {
                if iter.peek() != Some(&&b'\n') {
                    lines += 1;
                }
            }
            _ => {}
        }
    }
    lines
}

/// `full` relative to `base_dir` with `/` separators. Paths outside the base
/// directory are passed through as-is.
pub fn relative_name(base_dir: &Path, full: &Path) -> String {
    match full.strip_prefix(base_dir) {
        Ok(rel) => rel
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => {
            warn!(
                path = %full.display(),
                base_dir = %base_dir.display(),
                "File is outside the base directory, using its path as given"
            );
            full.to_string_lossy().to_string()
        }
    }
}

/// Rejects paths that are absolute or climb out of the base directory.
pub fn validate_relative(path: &str) -> Result<&Path> {
    let p = Path::new(path);
    if path.is_empty() {
        return Err(BlameError::InvalidPath("empty path".to_string()));
    }
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(BlameError::InvalidPath(path.to_string()));
    }
    Ok(p)
}
