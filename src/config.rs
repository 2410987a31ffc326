#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, OnceLock},
};

use tracing::Level;

/// Default location of the gradebook file.
pub const DEFAULT_BOOK_PATH: &str = "gradebook.json";

/// Default location of the grading policy file.
pub const DEFAULT_POLICY_PATH: &str = "policy.json";

/// Settings shared across the crate, read from the environment.
#[derive(Debug, Clone)]
pub struct ConfigState {
    /// Gradebook file used when none is given on the command line.
    book_path:   PathBuf,
    /// Policy file used when none is given on the command line.
    policy_path: PathBuf,
    /// Course label used for new gradebooks and exports.
    course:      String,
    /// Verbosity of the log output.
    log_level:   Level,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            book_path:   PathBuf::from(DEFAULT_BOOK_PATH),
            policy_path: PathBuf::from(DEFAULT_POLICY_PATH),
            course:      String::new(),
            log_level:   Level::INFO,
        }
    }
}

impl ConfigState {
    /// Construct a new configuration instance from environment variables,
    /// falling back to defaults for anything unset.
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            book_path:   read_path("GRADEBOOK_BOOK").unwrap_or(defaults.book_path),
            policy_path: read_path("GRADEBOOK_POLICY").unwrap_or(defaults.policy_path),
            course:      std::env::var("GRADEBOOK_COURSE")
                .map(|value| value.trim().to_owned())
                .unwrap_or(defaults.course),
            log_level:   parse_log_level(std::env::var("GRADEBOOK_LOG").ok()),
        }
    }

    /// Returns the default gradebook path.
    pub fn book_path(&self) -> &PathBuf {
        &self.book_path
    }

    /// Returns the default policy path.
    pub fn policy_path(&self) -> &PathBuf {
        &self.policy_path
    }

    /// Returns the course label.
    pub fn course(&self) -> &str {
        &self.course
    }

    /// Returns the log level.
    pub fn log_level(&self) -> Level {
        self.log_level
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Returns the active configuration, reading the environment on first use.
pub fn get() -> ConfigHandle {
    let mut guard = slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(cfg) = guard.as_ref() {
        return ConfigHandle(Arc::clone(cfg));
    }

    let cfg = Arc::new(ConfigState::from_env());
    *guard = Some(Arc::clone(&cfg));
    ConfigHandle(cfg)
}

/// Replaces the active configuration.
pub fn install(state: ConfigState) {
    let mut guard = slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(Arc::new(state));
}

/// Returns the configured gradebook path.
pub fn book_path() -> PathBuf {
    get().book_path().clone()
}

/// Returns the configured policy path.
pub fn policy_path() -> PathBuf {
    get().policy_path().clone()
}

/// Returns the configured course label.
pub fn course() -> String {
    get().course().to_string()
}

/// Returns the configured log level.
pub fn log_level() -> Level {
    get().log_level()
}

/// Reads a non-empty path from an environment variable.
fn read_path(env: &str) -> Option<PathBuf> {
    std::env::var(env)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Parses a log level name, defaulting to `INFO` when unset or unrecognised.
fn parse_log_level(val: Option<String>) -> Level {
    match val
        .map(|s| s.trim().to_ascii_lowercase())
        .as_deref()
        .unwrap_or("info")
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_log_levels_fall_back_to_info() {
        assert_eq!(parse_log_level(None), Level::INFO);
        assert_eq!(parse_log_level(Some("Debug ".into())), Level::DEBUG);
        assert_eq!(parse_log_level(Some("loud".into())), Level::INFO);
    }

    #[test]
    fn installed_config_is_returned() {
        let state = ConfigState {
            course: "CS 1323".into(),
            ..ConfigState::default()
        };
        install(state);
        assert_eq!(course(), "CS 1323");
        assert_eq!(book_path(), PathBuf::from(DEFAULT_BOOK_PATH));
    }
}
