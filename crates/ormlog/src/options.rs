//! Provider options
use std::fmt;
use std::sync::Arc;

/// Builds the row for one record from `(level, event_id, name, message)`
pub type Creator<L> = Arc<dyn Fn(i32, i32, &str, &str) -> L + Send + Sync>;

/// Produces a fresh, blank row for the default creator to fill
pub type Activator<L> = Arc<dyn Fn() -> L + Send + Sync>;

/// Options of the SQL logger provider
pub struct SqlLoggerOptions<L> {
    /// Custom row creator. `None` selects the default creator.
    pub creator: Option<Creator<L>>,
}

impl<L> SqlLoggerOptions<L> {
    /// Sets a custom row creator
    pub fn creator<C>(&mut self, creator: C) -> &mut Self
    where
        C: Fn(i32, i32, &str, &str) -> L + Send + Sync + 'static,
    {
        self.creator = Some(Arc::new(creator));
        self
    }
}

impl<L> Default for SqlLoggerOptions<L> {
    fn default() -> Self {
        Self { creator: None }
    }
}

impl<L> Clone for SqlLoggerOptions<L> {
    fn clone(&self) -> Self {
        Self {
            creator: self.creator.clone(),
        }
    }
}

impl<L> fmt::Debug for SqlLoggerOptions<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlLoggerOptions")
            .field("creator", &self.creator.as_ref().map(|_| "custom"))
            .finish()
    }
}
