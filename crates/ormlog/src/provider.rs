//! Logger provider
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ormlog_sql_common::ContextFactory;

use crate::filter::{self, Filter};
use crate::level::LogLevel;
use crate::log::LogEntity;
use crate::logger::{CreateLogger, Logger, LoggerSetup, SqlLogger};
use crate::options::{Activator, Creator, SqlLoggerOptions};
use crate::Error;

/// Hands out one logger per category
pub trait LoggerProvider: Send + Sync + 'static {
    /// Logger type
    type Logger: Logger;

    /// Creates the logger of `category`
    fn create_logger(&self, category: &str) -> Result<Self::Logger, Error>;

    /// Stops handing out loggers. Calling it again has no effect.
    fn dispose(&self);
}

/// Provider of SQL loggers writing rows of type `L`
///
/// `G` is the logger type handed out, [`SqlLogger`] unless a custom logger is plugged in with
/// [`SqlLoggerProviderBuilder::logger`].
pub struct SqlLoggerProvider<F, L, G = SqlLogger<F, L>>
where
    F: ContextFactory,
    L: LogEntity,
    G: CreateLogger<F, L>,
{
    factory: Arc<F>,
    filter: Filter,
    creator: Option<Creator<L>>,
    activator: Activator<L>,
    disposed: AtomicBool,
    _logger: PhantomData<fn() -> G>,
}

impl<F, L> SqlLoggerProvider<F, L>
where
    F: ContextFactory,
    L: LogEntity,
{
    /// Starts a provider for a row type without a [`Default`], filled from `activator`
    pub fn with_activator<A>(factory: F, activator: A) -> SqlLoggerProviderBuilder<F, L>
    where
        A: Fn() -> L + Send + Sync + 'static,
    {
        SqlLoggerProviderBuilder {
            factory: Arc::new(factory),
            filter: None,
            min_level: LogLevel::Information,
            creator: None,
            activator: Arc::new(activator),
            _logger: PhantomData,
        }
    }
}

impl<F, L> SqlLoggerProvider<F, L>
where
    F: ContextFactory,
    L: LogEntity + Default,
{
    /// Starts a provider with an explicit filter or minimum level
    pub fn builder(factory: F) -> SqlLoggerProviderBuilder<F, L> {
        Self::with_activator(factory, L::default)
    }

    /// Provider configured by options
    ///
    /// Every category and level is accepted; filtering is expected to happen in the host pipeline.
    pub fn from_options(factory: F, options: SqlLoggerOptions<L>) -> Self {
        Self::builder(factory)
            .filter(|_, _| true)
            .options(options)
            .build()
    }
}

impl<F, L, G> SqlLoggerProvider<F, L, G>
where
    F: ContextFactory,
    L: LogEntity,
    G: CreateLogger<F, L>,
{
    /// Whether [`LoggerProvider::dispose`] was called
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Source of persistence contexts shared by every logger
    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }
}

impl<F, L, G> LoggerProvider for SqlLoggerProvider<F, L, G>
where
    F: ContextFactory,
    L: LogEntity,
    G: CreateLogger<F, L>,
{
    type Logger = G;

    fn create_logger(&self, category: &str) -> Result<G, Error> {
        if self.is_disposed() {
            return Err(Error::Disposed(type_name::<Self>().to_owned()));
        }

        Ok(G::create(LoggerSetup {
            name: category.to_owned(),
            filter: self.filter.clone(),
            creator: self.creator.clone(),
            activator: self.activator.clone(),
            factory: self.factory.clone(),
        }))
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}

impl<F, L, G> Drop for SqlLoggerProvider<F, L, G>
where
    F: ContextFactory,
    L: LogEntity,
    G: CreateLogger<F, L>,
{
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<F, L, G> fmt::Debug for SqlLoggerProvider<F, L, G>
where
    F: ContextFactory,
    L: LogEntity,
    G: CreateLogger<F, L>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlLoggerProvider")
            .field("factory", &self.factory)
            .field("custom_creator", &self.creator.is_some())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Builder of [`SqlLoggerProvider`]
pub struct SqlLoggerProviderBuilder<F, L, G = SqlLogger<F, L>> {
    factory: Arc<F>,
    filter: Option<Filter>,
    min_level: LogLevel,
    creator: Option<Creator<L>>,
    activator: Activator<L>,
    _logger: PhantomData<fn() -> G>,
}

impl<F, L, G> SqlLoggerProviderBuilder<F, L, G>
where
    F: ContextFactory,
    L: LogEntity,
    G: CreateLogger<F, L>,
{
    /// Filter predicate over `(category, level)`. Takes precedence over [`Self::min_level`].
    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&str, LogLevel) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(filter::from_fn(predicate));
        self
    }

    /// Minimum level written, `Information` unless set
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Custom row creator
    pub fn creator<C>(mut self, creator: C) -> Self
    where
        C: Fn(i32, i32, &str, &str) -> L + Send + Sync + 'static,
    {
        self.creator = Some(Arc::new(creator));
        self
    }

    /// Blank row factory used by the default creator
    pub fn activator<A>(mut self, activator: A) -> Self
    where
        A: Fn() -> L + Send + Sync + 'static,
    {
        self.activator = Arc::new(activator);
        self
    }

    /// Applies provider options
    pub fn options(mut self, options: SqlLoggerOptions<L>) -> Self {
        self.creator = options.creator;
        self
    }

    /// Hands out loggers of type `G2`
    pub fn logger<G2>(self) -> SqlLoggerProviderBuilder<F, L, G2>
    where
        G2: CreateLogger<F, L>,
    {
        SqlLoggerProviderBuilder {
            factory: self.factory,
            filter: self.filter,
            min_level: self.min_level,
            creator: self.creator,
            activator: self.activator,
            _logger: PhantomData,
        }
    }

    /// Builds the provider
    pub fn build(self) -> SqlLoggerProvider<F, L, G> {
        SqlLoggerProvider {
            factory: self.factory,
            filter: self
                .filter
                .unwrap_or_else(|| filter::min_level(self.min_level)),
            creator: self.creator,
            activator: self.activator,
            disposed: AtomicBool::new(false),
            _logger: PhantomData,
        }
    }
}

impl<F: fmt::Debug, L, G> fmt::Debug for SqlLoggerProviderBuilder<F, L, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlLoggerProviderBuilder")
            .field("factory", &self.factory)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ormlog_sqlite::{memory, SqliteDatabase};

    use super::*;
    use crate::log::Log;

    fn database() -> SqliteDatabase {
        memory::empty().expect("in-memory database")
    }

    #[test]
    fn test_dispose() {
        let provider = SqlLoggerProvider::<_, Log>::builder(database()).build();
        assert!(provider.create_logger("app").is_ok());

        provider.dispose();
        provider.dispose();

        assert!(provider.is_disposed());
        assert!(matches!(
            provider.create_logger("app"),
            Err(Error::Disposed(name)) if name.contains("SqlLoggerProvider")
        ));
    }

    #[test]
    fn test_default_min_level() {
        let provider = SqlLoggerProvider::<_, Log>::builder(database()).build();
        let logger = provider.create_logger("app").expect("logger");

        assert_eq!(logger.name(), "app");
        assert!(!logger.is_enabled(LogLevel::Debug));
        assert!(logger.is_enabled(LogLevel::Information));
        assert!(logger.is_enabled(LogLevel::Critical));
    }

    #[test]
    fn test_filter_takes_precedence_over_min_level() {
        let provider = SqlLoggerProvider::<_, Log>::builder(database())
            .min_level(LogLevel::Error)
            .filter(|category, level| category.starts_with("app") && level >= LogLevel::Debug)
            .build();

        let app = provider.create_logger("app::http").expect("logger");
        assert!(app.is_enabled(LogLevel::Debug));
        assert!(!app.is_enabled(LogLevel::Trace));

        let other = provider.create_logger("other").expect("logger");
        assert!(!other.is_enabled(LogLevel::Critical));
    }

    #[test]
    fn test_from_options_accepts_everything() {
        let provider =
            SqlLoggerProvider::<_, Log>::from_options(database(), SqlLoggerOptions::default());
        let logger = provider.create_logger("anything").expect("logger");

        assert!(logger.is_enabled(LogLevel::Trace));
        assert!(!logger.is_enabled(LogLevel::None));
    }
}
