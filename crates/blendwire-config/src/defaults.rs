//! Default values and well-known names shared by the CLI crates.

use std::env;
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Loopback address the host's automation server listens on by default.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8765";

/// Default log filter expression. Diagnostics stay quiet unless requested.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Environment variable naming the host executable.
pub const EXECUTABLE_ENV: &str = "BLENDER_EXECUTABLE";

/// Project-local JSON file that may name the host executable.
pub const LOCAL_CONFIG_FILE: &str = "blendwire.json";

/// Key inside [`LOCAL_CONFIG_FILE`] holding the executable path.
pub const LOCAL_CONFIG_KEY: &str = "blender_executable";

/// Editor settings file listing known host executables.
pub const EDITOR_SETTINGS_FILE: &str = ".vscode/settings.json";

/// Key inside [`EDITOR_SETTINGS_FILE`] holding the executable list.
pub const EDITOR_EXECUTABLES_KEY: &str = "blender.executables";

/// Binary name searched on `PATH` when nothing else names the executable.
#[cfg(windows)]
pub const EXECUTABLE_NAME: &str = "blender.exe";

/// Binary name searched on `PATH` when nothing else names the executable.
#[cfg(not(windows))]
pub const EXECUTABLE_NAME: &str = "blender";

/// Directory under the project root holding runtime artefacts.
pub const STATE_DIR: &str = ".blendwire";

/// Script passed to the host so it loads the automation server on boot.
pub const BOOTSTRAP_SCRIPT: &str = "server/bootstrap.py";

/// Owned base URL used as the loader default.
#[must_use]
pub fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// The working directory, or `.` when it cannot be read.
#[must_use]
pub fn default_project_root() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
