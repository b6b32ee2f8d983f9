//! The PID file recording the host process this tool launched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::LifecycleError;

/// Handle on the PID file. Presence means "we launched a host with this
/// pid"; it says nothing about whether that process is still alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Points at `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the recorded pid. A missing or blank file yields `None`.
    pub fn read(&self) -> Result<Option<u32>, LifecycleError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LifecycleError::ReadPid {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<u32>()
            .map(Some)
            .map_err(|source| LifecycleError::ParsePid {
                path: self.path.clone(),
                source,
            })
    }

    /// Records `pid`, creating the state directory first if needed.
    pub fn write(&self, pid: u32) -> Result<(), LifecycleError> {
        let write_error = |source| LifecycleError::WritePid {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&self.path, format!("{pid}\n")).map_err(write_error)
    }

    /// Removes the file; a missing file is not an error.
    pub fn clear(&self) -> Result<(), LifecycleError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LifecycleError::ClearPid {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
