//! Errors and Developer Warnings
//!
//! The observation engine degrades silently wherever it cannot instrument a
//! value (frozen containers, non-configurable properties, excluded kinds).
//! The few situations that deserve a developer's attention are reported as
//! [`Warning`]s. Warnings are advisory: they are logged, forwarded to the
//! configured handler, and never change control flow.

use thiserror::Error;

use crate::config;

/// A developer-facing warning. The operation that raised it still proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// `set` was called on null or a primitive.
    #[error("cannot set reactive property `{key}` on null or a primitive value")]
    SetOnPrimitive { key: String },

    /// `delete` was called on null or a primitive.
    #[error("cannot delete reactive property `{key}` on null or a primitive value")]
    DeleteOnPrimitive { key: String },

    /// A property was added at runtime to a root-tracked container.
    #[error(
        "avoid adding reactive property `{key}` to a root-tracked container at runtime, \
         declare it upfront instead"
    )]
    AddToRoot { key: String },

    /// A property was deleted from a root-tracked container.
    #[error("avoid deleting property `{key}` from a root-tracked container, set it to null instead")]
    DeleteFromRoot { key: String },

    /// A list was addressed with something that is not an index.
    #[error("`{key}` is not a valid list index")]
    InvalidListKey { key: String },

    /// A consumer kept re-queuing itself during a single flush.
    #[error("possible infinite update loop in consumer {id}")]
    InfiniteUpdateLoop { id: u64 },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Deliver a developer warning.
///
/// Does nothing when the current configuration is `silent`.
pub fn warn(warning: Warning) {
    let (silent, handler) = config::with(|c| (c.silent, c.warn_handler.clone()));
    if silent {
        return;
    }

    tracing::warn!(%warning, "rivulet warning");

    if let Some(handler) = handler {
        handler(&warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn warn_reaches_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let _cfg = Config::default()
            .with_warn_handler(move |_| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            })
            .install();

        warn(Warning::AddToRoot { key: "a".into() });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn silent_suppresses_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let _cfg = Config {
            silent: true,
            ..Config::default()
        }
        .with_warn_handler(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        })
        .install();

        warn(Warning::DeleteFromRoot { key: "a".into() });
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn warning_messages_name_the_key() {
        let w = Warning::InvalidListKey { key: "name".into() };
        assert_eq!(w.to_string(), "`name` is not a valid list index");
    }
}
