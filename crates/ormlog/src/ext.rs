//! Registration helpers
use ormlog_sql_common::ContextFactory;
use tracing::Subscriber;
use tracing_subscriber::filter::{Filtered, Targets};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::layer::SqlLoggerLayer;
use crate::log::LogEntity;
use crate::options::SqlLoggerOptions;
use crate::provider::{LoggerProvider, SqlLoggerProvider};

/// Layer type attached by the options-based helpers
pub type SqlLayer<F, L> = SqlLoggerLayer<SqlLoggerProvider<F, L>>;

/// Attaches SQL loggers to a subscriber
///
/// ```rust,ignore
/// use ormlog::{Log, SqlLoggingExt};
/// use tracing_subscriber::util::SubscriberInitExt;
///
/// tracing_subscriber::registry()
///     .with_sql_logger::<Log, _>(database)
///     .init();
/// ```
pub trait SqlLoggingExt: Subscriber + for<'a> LookupSpan<'a> + Sized {
    /// Writes every event through loggers configured with default options
    fn with_sql_logger<L, F>(self, factory: F) -> Layered<SqlLayer<F, L>, Self>
    where
        F: ContextFactory,
        L: LogEntity + Default,
    {
        self.with_sql_logger_options(factory, |_| {})
    }

    /// Writes every event through loggers configured by `configure`
    fn with_sql_logger_options<L, F, C>(
        self,
        factory: F,
        configure: C,
    ) -> Layered<SqlLayer<F, L>, Self>
    where
        F: ContextFactory,
        L: LogEntity + Default,
        C: FnOnce(&mut SqlLoggerOptions<L>),
    {
        let mut options = SqlLoggerOptions::default();
        configure(&mut options);

        self.with(SqlLoggerLayer::new(SqlLoggerProvider::from_options(
            factory, options,
        )))
    }

    /// Writes every event through loggers of a pre-built provider
    fn with_sql_logger_provider<P>(self, provider: P) -> Layered<SqlLoggerLayer<P>, Self>
    where
        P: LoggerProvider,
    {
        self.with(SqlLoggerLayer::new(provider))
    }

    /// Writes the events accepted by `targets` through loggers configured with default options
    fn with_sql_logger_filtered<L, F>(
        self,
        factory: F,
        targets: Targets,
    ) -> Layered<Filtered<SqlLayer<F, L>, Targets, Self>, Self>
    where
        F: ContextFactory,
        L: LogEntity + Default,
    {
        let layer = SqlLoggerLayer::new(SqlLoggerProvider::from_options(
            factory,
            SqlLoggerOptions::default(),
        ));

        self.with(layer.with_filter(targets))
    }
}

impl<S> SqlLoggingExt for S where S: Subscriber + for<'a> LookupSpan<'a> {}
