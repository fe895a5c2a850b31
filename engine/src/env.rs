//! Process-wide engine environment.
//!
//! Native engines require a single environment per process, created
//! before any session loads. `init_env` is safe to call from multiple
//! threads; only the first call has effect, later calls return the
//! existing environment unchanged.

use once_cell::sync::OnceCell;

/// Engine log verbosity, passed through to the native engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Verbose,
    Info,
    #[default]
    Warning,
    Error,
    Fatal,
}

/// The per-process engine environment.
#[derive(Debug)]
pub struct EngineEnv {
    pub name: String,
    pub log_level: LogLevel,
}

static ENV: OnceCell<EngineEnv> = OnceCell::new();

/// Initializes the process-wide environment, or returns the existing one.
pub fn init_env(name: &str, log_level: LogLevel) -> &'static EngineEnv {
    ENV.get_or_init(|| EngineEnv {
        name: name.to_string(),
        log_level,
    })
}

/// Returns the environment if `init_env` has been called.
pub fn env() -> Option<&'static EngineEnv> {
    ENV.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let a = init_env("first", LogLevel::Info);
        let b = init_env("second", LogLevel::Error);
        assert!(std::ptr::eq(a, b));
        assert_eq!(b.name, "first");
        assert_eq!(env().unwrap().name, "first");
    }
}
