use std::env;
use std::path::Path;
use std::path::PathBuf;

const BASE_DIR_ENV: &str = "CTXHIST_DIR";
const DEFAULT_BASE_DIR_NAME: &str = ".ctxhist";

/// Storage locations for session stores and lifecycle markers.
///
/// Constructed once by the entry point and passed to each component, so
/// every path the system touches is a pure function of this struct.
#[derive(Debug, Clone)]
pub struct Config {
    base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    pub fn from_env() -> Self {
        let base_dir = env::var(BASE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"));
                home.join(DEFAULT_BASE_DIR_NAME)
            });
        Self { base_dir }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding one `session_<identifier>.jsonl` file per shell.
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    /// Directory holding one `active_<identifier>` marker per live shell.
    pub fn lifecycle_dir(&self) -> PathBuf {
        self.base_dir.join("lifecycle")
    }
}
