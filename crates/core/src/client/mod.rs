mod config;
mod logging;

use std::sync::{Arc, Mutex};

pub use config::*;
use log::{info, warn};
pub use logging::{init_log, set_log_level};

use crate::{
    analytics::{Analytics, AnalyticsEvent},
    callbacks::*,
    consent::{ConsentChoice, ConsentDecision, ConsentStore, ListenerId},
    locale::{LocaleRouter, PageEnvironment, RedirectDecision},
    newsletter::{Newsletter, NewsletterOutcome},
    persistence::{InMemoryStore, KeyValueStore},
    prompts::{PromptCopy, PromptLibrary},
};

/// What the page should do after [SiteClient::on_page_load].
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct PageLoadOutcome {
    /// False once the visitor has accepted or refused.
    pub show_consent_banner: bool,
    pub redirect: RedirectDecision,
}

/// A configuration interface for building a [SiteClient] from a foreign host.
/// Rust callers can use [SiteClient::new] with a [SiteClientConfiguration] directly.
#[derive(uniffi::Object, Default)]
pub struct SiteClientBuilder {
    persistence_provider: Mutex<Option<Arc<dyn KeyValueStore>>>,
    navigation_handler: Mutex<Option<Arc<dyn NavigationHandler>>>,
    analytics_sink: Mutex<Option<Arc<dyn AnalyticsSink>>>,
    settings: Mutex<SiteSettings>,
    log_level: Mutex<LogLevel>,
}

#[uniffi::export]
impl SiteClientBuilder {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage for the consent decision and locale preference. Without one
    /// nothing survives the session.
    pub fn set_persistence_provider(&self, provider: Box<dyn KeyValueStore>) {
        *self.persistence_provider.lock().unwrap() = Some(provider.into());
    }

    /// Required: performs redirects and locale switches.
    pub fn set_navigation_handler(&self, handler: Box<dyn NavigationHandler>) {
        *self.navigation_handler.lock().unwrap() = Some(handler.into());
    }

    pub fn set_analytics_sink(&self, sink: Box<dyn AnalyticsSink>) {
        *self.analytics_sink.lock().unwrap() = Some(sink.into());
    }

    pub fn set_settings(&self, settings: SiteSettings) {
        *self.settings.lock().unwrap() = settings;
    }

    /// Set the log filter level.
    ///
    /// By Default the log filter is set to [LogLevel::Info]
    pub fn set_log_level(&self, level: LogLevel) {
        *self.log_level.lock().unwrap() = level;
    }

    pub fn build(&self) -> Result<Arc<SiteClient>, ConfigError> {
        let navigation_handler = self
            .navigation_handler
            .lock()
            .unwrap()
            .clone()
            .ok_or(ConfigError::MissingNavigationHandler)?;

        let persistence_provider = self
            .persistence_provider
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                warn!("No persistent store provided - consent and locale choices will not be persisted");
                Arc::new(InMemoryStore::new())
            });

        let config = SiteClientConfiguration {
            persistence_provider,
            navigation_handler,
            analytics_sink: self.analytics_sink.lock().unwrap().clone(),
            settings: self.settings.lock().unwrap().clone(),
            log_level: *self.log_level.lock().unwrap(),
        };

        SiteClient::new(config).map(Arc::new)
    }
}

/// Page-level entry point tying the consent store, the locale router and the
/// form helpers to one shared storage.
#[derive(uniffi::Object)]
pub struct SiteClient {
    settings: SiteSettings,
    consent: Arc<ConsentStore>,
    router: LocaleRouter,
    analytics: Arc<Analytics>,
    newsletter: Newsletter,
    prompts: PromptLibrary,
    loaded: Mutex<Option<PageLoadOutcome>>,
}

impl std::fmt::Debug for SiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteClient")
            .field("settings", &self.settings)
            .field("consent", &self.consent)
            .finish_non_exhaustive()
    }
}

impl SiteClient {
    pub fn new(config: SiteClientConfiguration) -> Result<Self, ConfigError> {
        config.settings.validate()?;
        init_log(config.log_level);

        let SiteClientConfiguration {
            persistence_provider: store,
            navigation_handler,
            analytics_sink,
            settings,
            ..
        } = config;

        let consent = Arc::new(ConsentStore::new(store.clone(), &settings.consent_key));
        let router = LocaleRouter::new(
            store.clone(),
            navigation_handler,
            &settings.locale_preference_key,
            settings.locale.clone(),
        );
        let analytics = Arc::new(Analytics::new(analytics_sink, consent.clone()));
        let newsletter = Newsletter::new(store, &settings.newsletter_key, analytics.clone());

        Ok(Self {
            settings,
            consent,
            router,
            analytics,
            newsletter,
            prompts: PromptLibrary::default(),
            loaded: Mutex::new(None),
        })
    }

    pub fn consent_store(&self) -> &Arc<ConsentStore> {
        &self.consent
    }

    pub fn locale_router(&self) -> &LocaleRouter {
        &self.router
    }

    pub fn add_consent_listener_arc(&self, listener: Arc<dyn ConsentListener>) -> ListenerId {
        self.consent.on_change(listener)
    }

    fn loaded_outcome(&self) -> Option<PageLoadOutcome> {
        match self.loaded.lock() {
            Ok(loaded) => loaded.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record_consent(&self, choice: ConsentChoice) {
        self.consent.record_decision(choice);
        if choice == ConsentChoice::Accepted {
            self.analytics.track(AnalyticsEvent::ConsentGranted);
        }
    }
}

#[uniffi::export]
impl SiteClient {
    /// Initialisation for a page load. The router only runs on the first call;
    /// later calls return the first outcome without navigating again.
    pub fn on_page_load(&self, env: PageEnvironment) -> PageLoadOutcome {
        if let Some(outcome) = self.loaded_outcome() {
            warn!("on_page_load called more than once, ignoring");
            return outcome;
        }

        // The lock is not held here: the navigation handler may call back in.
        let outcome = PageLoadOutcome {
            show_consent_banner: self.consent.should_show_banner(),
            redirect: self.router.route_on_load(&env),
        };
        info!(
            "Page load {}: banner={} redirect={}",
            env.path,
            outcome.show_consent_banner,
            outcome.redirect.is_redirect()
        );

        let mut loaded = match self.loaded.lock() {
            Ok(loaded) => loaded,
            Err(poisoned) => poisoned.into_inner(),
        };
        loaded.get_or_insert(outcome).clone()
    }

    pub fn settings(&self) -> SiteSettings {
        self.settings.clone()
    }

    pub fn consent_decision(&self) -> ConsentDecision {
        self.consent.decision()
    }

    pub fn should_show_consent_banner(&self) -> bool {
        self.consent.should_show_banner()
    }

    pub fn accept_consent(&self) {
        self.record_consent(ConsentChoice::Accepted);
    }

    pub fn refuse_consent(&self) {
        self.record_consent(ConsentChoice::Refused);
    }

    pub fn add_consent_listener(&self, listener: Box<dyn ConsentListener>) -> ListenerId {
        self.consent.on_change(listener.into())
    }

    pub fn remove_consent_listener(&self, id: ListenerId) -> bool {
        self.consent.remove_listener(id)
    }

    /// Locale switcher selection, returns the path navigated to.
    pub fn select_locale(&self, lang: String) -> String {
        self.router.select_locale(&lang)
    }

    pub fn stored_locale(&self) -> Option<String> {
        self.router.stored_preference()
    }

    /// Reports a click on a call-to-action. Returns whether the event was sent.
    pub fn track_cta_click(&self, label: String) -> bool {
        self.analytics.track(AnalyticsEvent::CtaClick {
            label: label.trim().to_owned(),
        })
    }

    pub fn subscribe_newsletter(&self, email: String) -> NewsletterOutcome {
        self.newsletter.subscribe(&email)
    }

    pub fn official_prompts(&self) -> Vec<String> {
        self.prompts.prompts().to_vec()
    }

    /// Clipboard text for one prompt. The host writes it and shows the message.
    pub fn copy_prompt(&self, index: u32) -> Option<PromptCopy> {
        let copy = self.prompts.copy_text(index as usize);
        if copy.is_none() {
            warn!("Prompt {index} out of range");
        }
        copy
    }

    pub fn copy_all_prompts(&self) -> PromptCopy {
        self.prompts.copy_all()
    }
}
