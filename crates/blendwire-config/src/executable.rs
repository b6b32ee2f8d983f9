//! Resolution of the host executable.
//!
//! Sources are consulted in a fixed order and the first match wins:
//! an explicit path, the `BLENDER_EXECUTABLE` environment variable, the
//! project's `blendwire.json`, the editor's `.vscode/settings.json`, and
//! finally a `PATH` search.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use crate::defaults::{
    EDITOR_EXECUTABLES_KEY, EDITOR_SETTINGS_FILE, EXECUTABLE_ENV, EXECUTABLE_NAME,
    LOCAL_CONFIG_FILE,
};

/// Where a resolved executable path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutableSource {
    /// Supplied directly by the caller.
    Explicit,
    /// Read from the `BLENDER_EXECUTABLE` environment variable.
    Environment,
    /// Read from the project's local JSON config.
    LocalConfig,
    /// Read from the editor integration settings.
    EditorSettings,
    /// Found by searching `PATH`.
    SearchPath,
}

/// An executable path together with the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExecutable {
    /// Path handed to the process spawner.
    pub path: PathBuf,
    /// Resolution step that produced the path.
    pub source: ExecutableSource,
}

/// Errors raised while resolving the host executable.
#[derive(Debug, Error)]
pub enum ExecutableError {
    /// Every resolution step came up empty.
    #[error(
        "could not locate the Blender executable; pass --executable, set BLENDER_EXECUTABLE, \
         add \"blender_executable\" to blendwire.json, or put blender on PATH"
    )]
    NotFound {
        /// Human-readable list of the locations that were consulted.
        searched: Vec<String>,
    },
    /// A config file exists but could not be read.
    #[error("failed to read {path:?}: {source}")]
    ReadConfig {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The local config file is not valid JSON of the expected shape.
    #[error("failed to parse {path:?}: {source}")]
    ParseConfig {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

impl ExecutableError {
    /// Locations consulted, when resolution found nothing.
    #[must_use]
    pub const fn searched(&self) -> Option<&[String]> {
        match self {
            Self::NotFound { searched } => Some(searched.as_slice()),
            Self::ReadConfig { .. } | Self::ParseConfig { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocalConfig {
    #[serde(rename = "blender_executable")]
    executable: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditorSettings {
    #[serde(rename = "blender.executables", default)]
    executables: Vec<EditorExecutable>,
}

#[derive(Debug, Deserialize)]
struct EditorExecutable {
    path: String,
    #[serde(rename = "isDefault", default)]
    is_default: bool,
}

/// Walks the executable resolution chain for one project root.
#[derive(Debug, Clone)]
pub struct ExecutableResolver {
    project_root: PathBuf,
    env_value: Option<OsString>,
    search_path: Option<OsString>,
}

impl ExecutableResolver {
    /// Builds a resolver that reads `BLENDER_EXECUTABLE` and `PATH` from the
    /// process environment.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            env_value: env::var_os(EXECUTABLE_ENV),
            search_path: env::var_os("PATH"),
        }
    }

    /// Replaces the value used for the environment variable step.
    #[must_use]
    pub fn with_env_value(mut self, value: Option<OsString>) -> Self {
        self.env_value = value;
        self
    }

    /// Replaces the directory list used for the `PATH` step.
    #[must_use]
    pub fn with_search_path(mut self, value: Option<OsString>) -> Self {
        self.search_path = value;
        self
    }

    /// Resolves the executable, consulting each source in priority order.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutableError::NotFound`] when every step comes up empty and
    /// [`ExecutableError::ParseConfig`] or [`ExecutableError::ReadConfig`] when
    /// the local config file exists but is unusable.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<ResolvedExecutable, ExecutableError> {
        if let Some(path) = explicit.filter(|path| !path.as_os_str().is_empty()) {
            return Ok(found(path.to_path_buf(), ExecutableSource::Explicit));
        }
        if let Some(value) = self.env_value.as_ref().filter(|value| !value.is_empty()) {
            return Ok(found(PathBuf::from(value), ExecutableSource::Environment));
        }
        if let Some(path) = self.from_local_config()? {
            return Ok(found(path, ExecutableSource::LocalConfig));
        }
        if let Some(path) = self.from_editor_settings()? {
            return Ok(found(path, ExecutableSource::EditorSettings));
        }
        if let Some(path) = self.from_search_path() {
            return Ok(found(path, ExecutableSource::SearchPath));
        }
        Err(ExecutableError::NotFound {
            searched: self.searched_locations(),
        })
    }

    fn from_local_config(&self) -> Result<Option<PathBuf>, ExecutableError> {
        let path = self.project_root.join(LOCAL_CONFIG_FILE);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        let config: LocalConfig = serde_json::from_str(&content)
            .map_err(|source| ExecutableError::ParseConfig { path, source })?;
        Ok(config
            .executable
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from))
    }

    fn from_editor_settings(&self) -> Result<Option<PathBuf>, ExecutableError> {
        let path = self.project_root.join(EDITOR_SETTINGS_FILE);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        let settings: EditorSettings = match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(error) => {
                // Editors accept comments and trailing commas in this file, so a
                // parse failure is not evidence of a broken project.
                warn!(path = %path.display(), %error, "skipping unreadable editor settings");
                return Ok(None);
            }
        };
        let mut entries = settings.executables;
        let chosen = match entries.iter().position(|entry| entry.is_default) {
            Some(index) => Some(entries.swap_remove(index)),
            None if entries.is_empty() => None,
            None => Some(entries.swap_remove(0)),
        };
        Ok(chosen
            .map(|entry| entry.path)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from))
    }

    fn from_search_path(&self) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        env::split_paths(search_path)
            .map(|dir| dir.join(EXECUTABLE_NAME))
            .find(|candidate| candidate.is_file())
    }

    fn searched_locations(&self) -> Vec<String> {
        vec![
            String::from("explicit path"),
            format!("${EXECUTABLE_ENV}"),
            self.project_root.join(LOCAL_CONFIG_FILE).display().to_string(),
            format!(
                "{} ({EDITOR_EXECUTABLES_KEY})",
                self.project_root.join(EDITOR_SETTINGS_FILE).display()
            ),
            format!("PATH ({EXECUTABLE_NAME})"),
        ]
    }
}

fn found(path: PathBuf, source: ExecutableSource) -> ResolvedExecutable {
    debug!(path = %path.display(), %source, "resolved host executable");
    ResolvedExecutable { path, source }
}

fn read_optional(path: &Path) -> Result<Option<String>, ExecutableError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ExecutableError::ReadConfig {
            path: path.to_path_buf(),
            source,
        }),
    }
}
