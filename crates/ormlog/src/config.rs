//! Logging settings
//!
//! Per-category minimum levels, the way a host configures its logging pipeline. The settings
//! render either a host-level [`Targets`] filter for the options-based provider, or a [`Filter`]
//! predicate for a provider built with an explicit filter.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::Targets;

use crate::filter::{self, Filter};
use crate::level::LogLevel;

/// Minimum levels per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerSettings {
    /// Level of categories not listed in `categories`
    pub default_level: LogLevel,
    /// Minimum level by category prefix. Prefixes match as plain strings, so `app` also covers
    /// `application`. The longest matching prefix wins.
    pub categories: BTreeMap<String, LogLevel>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Information,
            categories: BTreeMap::new(),
        }
    }
}

impl LoggerSettings {
    /// Sets the minimum level of a category
    pub fn with_category<C: Into<String>>(mut self, category: C, level: LogLevel) -> Self {
        self.categories.insert(category.into(), level);
        self
    }

    /// Minimum level that applies to `category`
    ///
    /// Resolves prefixes the same way [`Targets`] does, so both renderings of the settings pick
    /// the same entry for any category.
    pub fn min_level(&self, category: &str) -> LogLevel {
        self.categories
            .iter()
            .filter(|(prefix, _)| category.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| *level)
            .unwrap_or(self.default_level)
    }

    /// Host-level filter for a layer
    ///
    /// `None` turns a category off. `Critical` is as close as `tracing` gets, errors pass.
    pub fn targets(&self) -> Targets {
        Targets::new()
            .with_default(self.default_level.level_filter())
            .with_targets(
                self.categories
                    .iter()
                    .map(|(category, level)| (category.clone(), level.level_filter())),
            )
    }

    /// Filter predicate with the same levels, for [`SqlLoggerProviderBuilder::filter`]
    ///
    /// [`SqlLoggerProviderBuilder::filter`]: crate::SqlLoggerProviderBuilder::filter
    pub fn filter(&self) -> Filter {
        let settings = self.clone();
        filter::from_fn(move |category, level| {
            let min = settings.min_level(category);
            min != LogLevel::None && level >= min
        })
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    fn settings() -> LoggerSettings {
        LoggerSettings::default()
            .with_category("hyper", LogLevel::None)
            .with_category("app", LogLevel::Debug)
            .with_category("app::db", LogLevel::Error)
    }

    #[test]
    fn test_longest_prefix_wins() {
        let settings = settings();

        assert_eq!(settings.min_level("app::http"), LogLevel::Debug);
        assert_eq!(settings.min_level("app::db::pool"), LogLevel::Error);
        assert_eq!(settings.min_level("application"), LogLevel::Debug);
        assert_eq!(settings.min_level("other"), LogLevel::Information);
        assert_eq!(settings.min_level("hyper::client"), LogLevel::None);
    }

    #[test]
    fn test_filter() {
        let filter = settings().filter();

        assert!(filter("app::http", LogLevel::Debug));
        assert!(!filter("app::db", LogLevel::Warning));
        assert!(!filter("hyper", LogLevel::Critical));
        assert!(filter("other", LogLevel::Information));
        assert!(!filter("other", LogLevel::Debug));
    }

    #[test]
    fn test_targets() {
        let targets = settings().targets();

        assert!(targets.would_enable("app::http", &tracing::Level::DEBUG));
        assert!(!targets.would_enable("hyper::client", &tracing::Level::ERROR));
        assert!(targets.would_enable("other", &tracing::Level::INFO));
        assert!(!targets.would_enable("other", &tracing::Level::DEBUG));
        assert_eq!(targets.default_level(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_filter_agrees_with_targets() {
        let settings = LoggerSettings::default()
            .with_category("app", LogLevel::None)
            .with_category("app::db", LogLevel::Warning);
        let filter = settings.filter();
        let targets = settings.targets();

        for category in ["app", "application", "app::db", "app::dbx", "other"] {
            for level in [
                tracing::Level::TRACE,
                tracing::Level::DEBUG,
                tracing::Level::INFO,
                tracing::Level::WARN,
                tracing::Level::ERROR,
            ] {
                assert_eq!(
                    filter(category, LogLevel::from(&level)),
                    targets.would_enable(category, &level),
                    "{category} at {level}"
                );
            }
        }

        assert!(!filter("application", LogLevel::Error));
        assert!(filter("app::dbx", LogLevel::Warning));
    }

    #[test]
    fn test_deserialize() {
        let settings: LoggerSettings = serde_json::from_str(
            r#"{ "default_level": "Warning", "categories": { "app": "trace", "hyper": "None" } }"#,
        )
        .expect("valid settings");

        assert_eq!(settings.default_level, LogLevel::Warning);
        assert_eq!(settings.categories.get("app"), Some(&LogLevel::Trace));
        assert_eq!(settings.categories.get("hyper"), Some(&LogLevel::None));

        let partial: LoggerSettings =
            serde_json::from_str(r#"{ "categories": {} }"#).expect("valid settings");
        assert_eq!(partial.default_level, LogLevel::Information);

        assert!(serde_json::from_str::<LoggerSettings>(r#"{ "default_level": "loud" }"#).is_err());
    }
}
