use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::BlameConfig;
use crate::error::{BlameError, Result};
use crate::models::BlameResponse;
use crate::scm::blame::{BlameCommand, FileBlame};
use crate::scm::command::{CommandExecutor, ProcessExecutor};
use crate::scm::input::{validate_relative, InputFile};

/// A Jazz sandbox on disk plus the command used to blame files in it.
pub struct Workspace<E = ProcessExecutor> {
    pub base_dir: PathBuf,
    command: BlameCommand<E>,
}

impl Workspace<ProcessExecutor> {
    pub fn open<P: AsRef<Path>>(path: P, config: BlameConfig) -> Result<Self> {
        Self::with_command(path, BlameCommand::new(config))
    }
}

impl<E: CommandExecutor> Workspace<E> {
    pub fn with_command<P: AsRef<Path>>(path: P, command: BlameCommand<E>) -> Result<Self> {
        let path = path.as_ref();
        let base_dir = std::fs::canonicalize(path)
            .map_err(|_| BlameError::PathNotFound(path.display().to_string()))?;
        if !base_dir.is_dir() {
            return Err(BlameError::InvalidPath(format!("{} is not a directory", path.display())));
        }

        Ok(Self { base_dir, command })
    }

    /// Blames one file given relative to the base directory.
    pub async fn get_blame(&self, path: &str) -> Result<BlameResponse> {
        let rel = validate_relative(path)?;
        let file = InputFile::from_disk(&self.base_dir, rel).await?;

        match self.command.blame_file(&self.base_dir, &file).await? {
            FileBlame::Blamed(lines) => Ok(BlameResponse {
                path: file.path,
                lines,
            }),
            FileBlame::Untracked { .. } => Err(BlameError::Untracked(file.path)),
        }
    }
}

pub type SharedWorkspace = Arc<Workspace>;
