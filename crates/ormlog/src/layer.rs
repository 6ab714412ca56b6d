//! tracing layer
//!
//! [`SqlLoggerLayer`] is the bridge between `tracing` and a [`LoggerProvider`]: every event is
//! handed to the logger of its target, created on first use and cached.
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Write};
use std::sync::{Arc, RwLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::level::{EventId, LogLevel};
use crate::logger::{failure_text, Failure, Logger};
use crate::provider::LoggerProvider;

/// Name of the event field read as the event id
pub const EVENT_ID_FIELD: &str = "event_id";

/// Name of the event field read as the failure
pub const ERROR_FIELD: &str = "error";

/// A failure recorded on an event, already rendered with its sources
#[derive(Debug)]
struct RecordedFailure(String);

impl fmt::Display for RecordedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for RecordedFailure {}

/// Fields of one event
#[derive(Debug, Default)]
struct EventFields {
    message: String,
    extra: String,
    event_id: Option<i32>,
    failure: Option<RecordedFailure>,
}

impl EventFields {
    fn render(&self, _failure: Option<Failure<'_>>) -> Option<String> {
        let message = match (self.message.is_empty(), self.extra.is_empty()) {
            (_, true) => self.message.clone(),
            (true, false) => self.extra.clone(),
            (false, false) => format!("{} {}", self.message, self.extra),
        };

        (!message.is_empty()).then_some(message)
    }

    fn push_extra(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        let _ = write!(self.extra, "{}={}", field.name(), value);
    }
}

impl Visit for EventFields {
    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == EVENT_ID_FIELD {
            if let Ok(id) = i32::try_from(value) {
                self.event_id = Some(id);
                return;
            }
        }
        self.push_extra(field, format_args!("{value}"));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == EVENT_ID_FIELD {
            if let Ok(id) = i32::try_from(value) {
                self.event_id = Some(id);
                return;
            }
        }
        self.push_extra(field, format_args!("{value}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.push_extra(field, format_args!("{value}"));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn StdError + 'static)) {
        if field.name() == ERROR_FIELD && self.failure.is_none() {
            self.failure = Some(RecordedFailure(failure_text(value)));
        } else {
            self.push_extra(field, format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_extra(field, format_args!("{value:?}"));
        }
    }
}

/// Layer writing events through the loggers of a provider
pub struct SqlLoggerLayer<P: LoggerProvider> {
    provider: P,
    loggers: RwLock<HashMap<String, Arc<P::Logger>>>,
}

impl<P: LoggerProvider> SqlLoggerLayer<P> {
    /// Creates a layer over `provider`
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            loggers: RwLock::new(HashMap::new()),
        }
    }

    /// The provider loggers are created from
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Logger of `category`, created and cached on first use
    ///
    /// `None` once the provider is disposed.
    pub fn logger(&self, category: &str) -> Option<Arc<P::Logger>> {
        if let Some(logger) = self
            .loggers
            .read()
            .ok()
            .and_then(|loggers| loggers.get(category).cloned())
        {
            return Some(logger);
        }

        let logger = Arc::new(self.provider.create_logger(category).ok()?);

        match self.loggers.write() {
            Ok(mut loggers) => Some(
                loggers
                    .entry(category.to_owned())
                    .or_insert(logger)
                    .clone(),
            ),
            Err(_) => Some(logger),
        }
    }
}

impl<P: LoggerProvider> fmt::Debug for SqlLoggerLayer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let categories = self
            .loggers
            .read()
            .map(|loggers| loggers.len())
            .unwrap_or_default();

        f.debug_struct("SqlLoggerLayer")
            .field("loggers", &categories)
            .finish_non_exhaustive()
    }
}

impl<S, P> Layer<S> for SqlLoggerLayer<P>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    P: LoggerProvider,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(logger) = self.logger(metadata.target()) else {
            return;
        };

        let level = LogLevel::from(metadata.level());
        if !logger.is_enabled(level) {
            return;
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);

        let failure = fields
            .failure
            .as_ref()
            .map(|failure| failure as &(dyn StdError + 'static));

        let _ = logger.log(
            level,
            EventId::from(fields.event_id.unwrap_or_default()),
            &fields,
            failure,
            Some(&EventFields::render),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl StdError for Refused {}

    type Captured = (Option<String>, Option<i32>, Option<String>);

    /// Collects the fields of every event it sees
    #[derive(Clone, Default)]
    struct Capture(Arc<std::sync::Mutex<Vec<Captured>>>);

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = EventFields::default();
            event.record(&mut fields);
            let failure = fields.failure.as_ref().map(|f| f.0.clone());
            let message = fields.render(None);
            self.0
                .lock()
                .expect("capture")
                .push((message, fields.event_id, failure));
        }
    }

    fn capture<F: FnOnce()>(f: F) -> Vec<Captured> {
        use tracing_subscriber::layer::SubscriberExt;

        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, f);

        let events = capture.0.lock().expect("capture").clone();
        events
    }

    #[test]
    fn test_event_fields() {
        let events = capture(|| {
            tracing::info!(event_id = 1, "Handling request");
            tracing::warn!(path = "/", status = 404, "Not found");
            tracing::error!(error = &Refused as &dyn StdError, "Request failed");
            tracing::info!(answer = 42);
        });

        assert_eq!(
            events,
            vec![
                (Some("Handling request".to_owned()), Some(1), None),
                (Some("Not found path=/ status=404".to_owned()), None, None),
                (
                    Some("Request failed".to_owned()),
                    None,
                    Some("connection refused".to_owned())
                ),
                (Some("answer=42".to_owned()), None, None),
            ]
        );
    }
}
