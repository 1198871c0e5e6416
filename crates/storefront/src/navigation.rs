//! Navigation requests issued by the state holders.
//!
//! The holders never render anything; they ask the view layer to move to
//! another route. A [`History`] records every request so the CLI (and tests)
//! can tell where the user ended up.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Client-side route change.
    Push(String),
    /// Hard navigation that discards in-memory view state.
    Assign(String),
}

impl Navigation {
    /// Target path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Push(path) | Self::Assign(path) => path,
        }
    }

    /// Whether this is a hard navigation.
    #[must_use]
    pub const fn is_hard(&self) -> bool {
        matches!(self, Self::Assign(_))
    }
}

/// Receiver of navigation requests.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Navigation);
}

/// Navigator that records every request.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<Navigation>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests in order.
    #[must_use]
    pub fn entries(&self) -> Vec<Navigation> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent request.
    #[must_use]
    pub fn last(&self) -> Option<Navigation> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Path of the most recent request.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.last().map(|nav| nav.path().to_string())
    }
}

impl Navigator for History {
    fn navigate(&self, to: Navigation) {
        debug!(path = to.path(), hard = to.is_hard(), "Navigate");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_in_order() {
        let history = History::new();
        assert_eq!(history.current(), None);

        history.navigate(Navigation::Push("/products".to_string()));
        history.navigate(Navigation::Assign("/".to_string()));

        assert_eq!(history.entries().len(), 2);
        assert_eq!(history.last(), Some(Navigation::Assign("/".to_string())));
        assert_eq!(history.current().as_deref(), Some("/"));
        assert!(history.last().is_some_and(|nav| nav.is_hard()));
    }
}
