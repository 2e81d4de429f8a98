use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    callbacks::{AnalyticsSink, NavigationHandler},
    persistence::KeyValueStore,
};

#[derive(uniffi::Enum, Debug, Clone, Default, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ConfigError {
    #[error("Invalid settings JSON - {error}")]
    Json { error: String },
    #[error("Locale code must not be empty")]
    EmptyLocale,
    #[error("Root path must start with '/': {path}")]
    RelativeRoot { path: String },
    #[error("A navigation handler is required")]
    MissingNavigationHandler,
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        ConfigError::Json {
            error: value.to_string(),
        }
    }
}

/// Everything the locale router needs to know about the site's languages.
#[derive(uniffi::Record, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LocaleRules {
    /// Language the site is authored in, served from `default_root`.
    pub default_locale: String,
    /// The one non-default language visitors may be redirected to.
    pub target_locale: String,
    pub default_root: String,
    pub localized_root: String,
    /// Lowercase user agent fragments identifying crawlers.
    pub crawler_fragments: Vec<String>,
    /// Lowercase host fragments identifying search engines, matched as `<fragment>.`
    pub search_engine_fragments: Vec<String>,
}

impl Default for LocaleRules {
    fn default() -> Self {
        Self {
            default_locale: "fr".to_owned(),
            target_locale: "en".to_owned(),
            default_root: "/".to_owned(),
            localized_root: "/en/".to_owned(),
            crawler_fragments: [
                "googlebot",
                "bingbot",
                "yandex",
                "duckduckbot",
                "baiduspider",
                "slurp",
            ]
            .map(str::to_owned)
            .to_vec(),
            search_engine_fragments: ["google", "bing", "yandex", "duckduckgo"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

/// Site wide settings: storage keys and locale rules.
///
/// Every field has a default matching the production site, so hosts only need
/// to supply what differs.
#[derive(uniffi::Record, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    pub consent_key: String,
    pub locale_preference_key: String,
    pub newsletter_key: String,
    pub locale: LocaleRules,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            consent_key: "cookie-consent".to_owned(),
            locale_preference_key: "preferred-lang".to_owned(),
            newsletter_key: "newsletter-elevenmusic".to_owned(),
            locale: LocaleRules::default(),
        }
    }
}

impl SiteSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: SiteSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = &self.locale;
        if rules.default_locale.trim().is_empty() || rules.target_locale.trim().is_empty() {
            return Err(ConfigError::EmptyLocale);
        }
        for root in [&rules.default_root, &rules.localized_root] {
            if !root.starts_with('/') {
                return Err(ConfigError::RelativeRoot { path: root.clone() });
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SiteClientConfiguration {
    /// Origin scoped storage shared by consent and locale state.
    pub persistence_provider: Arc<dyn KeyValueStore>,
    /// Performs redirects and switcher navigations.
    pub navigation_handler: Arc<dyn NavigationHandler>,
    /// The tag function, if the page loaded one.
    pub analytics_sink: Option<Arc<dyn AnalyticsSink>>,
    pub settings: SiteSettings,
    /// Initial log level - defaults to [LogLevel::Info]
    pub log_level: LogLevel,
}

impl SiteClientConfiguration {
    pub fn new(
        persistence_provider: Arc<dyn KeyValueStore>,
        navigation_handler: Arc<dyn NavigationHandler>,
    ) -> Self {
        Self {
            persistence_provider,
            navigation_handler,
            analytics_sink: None,
            settings: SiteSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl std::fmt::Debug for SiteClientConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteClientConfiguration")
            .field("persistence_provider", &"...")
            .field("navigation_handler", &"...")
            .field(
                "analytics_sink",
                &self.analytics_sink.is_some().then_some("..."),
            )
            .field("settings", &self.settings)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            SiteSettings::from_json(r#"{"consentKey":"consent","locale":{"targetLocale":"de","localizedRoot":"/de/"}}"#)
                .unwrap();

        assert_eq!(settings.consent_key, "consent");
        assert_eq!(settings.locale_preference_key, "preferred-lang");
        assert_eq!(settings.locale.target_locale, "de");
        assert_eq!(settings.locale.localized_root, "/de/");
        assert_eq!(settings.locale.default_root, "/");
        assert_eq!(
            settings.locale.crawler_fragments,
            LocaleRules::default().crawler_fragments
        );
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(SiteSettings::from_json("{}").unwrap(), SiteSettings::default());
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(matches!(
            SiteSettings::from_json("not json"),
            Err(ConfigError::Json { .. })
        ));
        assert!(matches!(
            SiteSettings::from_json(r#"{"locale":{"targetLocale":" "}}"#),
            Err(ConfigError::EmptyLocale)
        ));
        assert!(matches!(
            SiteSettings::from_json(r#"{"locale":{"localizedRoot":"en/"}}"#),
            Err(ConfigError::RelativeRoot { .. })
        ));
    }
}
