//! Configuration
//!
//! Flags consumed by the observation engine. Configuration is per-thread:
//! the engine is single-threaded, and keeping the flags thread-local means
//! independent threads (or parallel tests) never leak settings into each
//! other.
//!
//! # Flags
//!
//! - `async_updates`: when set, [`Dep::notify`](crate::reactive::Dep::notify)
//!   leaves ordering to the scheduler; when cleared, subscribers are sorted
//!   by id and the scheduler flushes as soon as a job is queued.
//! - `server_rendering`: when set, [`observe`](crate::observe::observe)
//!   never creates observers.
//! - `silent`: suppresses developer warnings.
//!
//! The transient "observation enabled" switch lives next to these flags
//! (see [`toggle_observing`]).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{ConfigError, Warning};

/// Callback receiving developer warnings.
pub type WarnHandler = Arc<dyn Fn(&Warning) + Send + Sync>;

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
    static OBSERVING: Cell<bool> = const { Cell::new(true) };
}

/// Engine configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defer consumer updates to the scheduler instead of sorting at notify time.
    #[serde(rename = "async")]
    pub async_updates: bool,

    /// Skip all observation (non-interactive rendering).
    pub server_rendering: bool,

    /// Suppress developer warnings.
    pub silent: bool,

    /// Receives every developer warning that is not suppressed.
    #[serde(skip)]
    pub warn_handler: Option<WarnHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            async_updates: true,
            server_rendering: false,
            silent: false,
            warn_handler: None,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Attach a warning handler.
    pub fn with_warn_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Warning) + Send + Sync + 'static,
    {
        self.warn_handler = Some(Arc::new(handler));
        self
    }

    /// Make this the current thread's configuration.
    ///
    /// The previous configuration is restored when the guard is dropped.
    pub fn install(self) -> ConfigGuard {
        let previous = CONFIG.with(|c| c.replace(self));
        ConfigGuard {
            previous: Some(previous),
        }
    }

    /// A copy of the current thread's configuration.
    pub fn current() -> Self {
        CONFIG.with(|c| c.borrow().clone())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("async_updates", &self.async_updates)
            .field("server_rendering", &self.server_rendering)
            .field("silent", &self.silent)
            .field("warn_handler", &self.warn_handler.is_some())
            .finish()
    }
}

/// Restores the previously installed configuration on drop.
#[must_use = "the configuration is reverted when the guard is dropped"]
pub struct ConfigGuard {
    previous: Option<Config>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CONFIG.with(|c| *c.borrow_mut() = previous);
        }
    }
}

/// Run `f` against the current configuration.
///
/// The borrow is held for the duration of `f`, so `f` must not install a
/// configuration or call back into user code.
pub(crate) fn with<R>(f: impl FnOnce(&Config) -> R) -> R {
    CONFIG.with(|c| f(&c.borrow()))
}

pub(crate) fn async_updates() -> bool {
    with(|c| c.async_updates)
}

pub(crate) fn server_rendering() -> bool {
    with(|c| c.server_rendering)
}

/// Enable or disable observation of new values. Returns the previous state.
pub fn toggle_observing(enabled: bool) -> bool {
    OBSERVING.with(|o| o.replace(enabled))
}

/// Whether new values are currently being observed.
pub fn is_observing() -> bool {
    OBSERVING.with(Cell::get)
}

/// Run `f` with observation disabled, restoring the previous state afterwards.
pub fn without_observing<R>(f: impl FnOnce() -> R) -> R {
    struct Restore(bool);

    impl Drop for Restore {
        fn drop(&mut self) {
            toggle_observing(self.0);
        }
    }

    let _restore = Restore(toggle_observing(false));
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.async_updates);
        assert!(!config.server_rendering);
        assert!(!config.silent);
    }

    #[test]
    fn parses_json_with_defaults() {
        let config = Config::from_json(r#"{ "async": false, "silent": true }"#).unwrap();
        assert!(!config.async_updates);
        assert!(config.silent);
        assert!(!config.server_rendering);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Config::from_json("{ async: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn install_restores_previous() {
        assert!(async_updates());
        {
            let _guard = Config {
                async_updates: false,
                ..Config::default()
            }
            .install();
            assert!(!async_updates());
            {
                let _inner = Config {
                    server_rendering: true,
                    ..Config::default()
                }
                .install();
                assert!(server_rendering());
                assert!(async_updates());
            }
            assert!(!async_updates());
            assert!(!server_rendering());
        }
        assert!(async_updates());
    }

    #[test]
    fn without_observing_restores() {
        assert!(is_observing());
        let inside = without_observing(is_observing);
        assert!(!inside);
        assert!(is_observing());

        let previous = toggle_observing(false);
        assert!(previous);
        assert!(!is_observing());
        toggle_observing(true);
    }
}
