mod gates;

use std::sync::Arc;

use log::{debug, info, warn};

pub use self::gates::{
    contains_domain_fragment, is_crawler, is_search_referral, language_matches, normalize_path,
    Gate,
};
use crate::{
    callbacks::{NavAction, NavigationHandler},
    client::LocaleRules,
    persistence::{self, KeyValueStore},
};

/// Raw page inputs supplied by the host on each load. None of these are owned
/// by the router.
#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct PageEnvironment {
    /// `location.pathname`
    pub path: String,
    /// `document.referrer`, empty when there is none
    pub referrer: String,
    /// `navigator.userAgent`
    pub user_agent: String,
    /// `navigator.language`
    pub language: String,
}

/// Per-load inputs of the redirect heuristic. Computed, evaluated and dropped.
#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct VisitorSignals {
    pub path: String,
    pub referrer: String,
    pub user_agent: String,
    pub language: String,
    pub has_stored_preference: bool,
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Every gate passed; the visitor is sent to `to` with a replace navigation.
    Redirect { to: String },
    /// `gate` was the first condition that did not hold.
    Suppressed { gate: Gate },
}

impl RedirectDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, RedirectDecision::Redirect { .. })
    }
}

/// Decides, once per page load, whether a first-time visitor is sent to the
/// localized home page, and carries out explicit locale switches.
pub struct LocaleRouter {
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn NavigationHandler>,
    preference_key: String,
    rules: LocaleRules,
}

impl std::fmt::Debug for LocaleRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleRouter")
            .field("preference_key", &self.preference_key)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl LocaleRouter {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn NavigationHandler>,
        preference_key: impl Into<String>,
        rules: LocaleRules,
    ) -> Self {
        Self {
            store,
            navigator,
            preference_key: preference_key.into(),
            rules,
        }
    }

    pub fn rules(&self) -> &LocaleRules {
        &self.rules
    }

    /// The locale the visitor picked explicitly, if any.
    pub fn stored_preference(&self) -> Option<String> {
        persistence::read(self.store.as_ref(), &self.preference_key)
    }

    pub fn signals(&self, env: &PageEnvironment) -> VisitorSignals {
        VisitorSignals {
            path: env.path.clone(),
            referrer: env.referrer.clone(),
            user_agent: env.user_agent.clone(),
            language: env.language.clone(),
            has_stored_preference: self.stored_preference().is_some(),
        }
    }

    /// Pure decision over already collected signals.
    pub fn evaluate(&self, signals: &VisitorSignals) -> RedirectDecision {
        match Gate::first_failing(signals, &self.rules) {
            Some(gate) => RedirectDecision::Suppressed { gate },
            None => RedirectDecision::Redirect {
                to: self.rules.localized_root.clone(),
            },
        }
    }

    /// Runs the heuristic for this page load and performs the redirect when
    /// every gate passes. Nothing is persisted, so the next load decides again.
    pub fn route_on_load(&self, env: &PageEnvironment) -> RedirectDecision {
        let signals = self.signals(env);
        let decision = self.evaluate(&signals);
        match &decision {
            RedirectDecision::Redirect { to } => {
                info!("Redirecting {} to {to}", signals.path);
                self.navigator.navigate(to.clone(), NavAction::Replace);
            }
            RedirectDecision::Suppressed { gate } => {
                debug!("Auto-redirect suppressed by {gate:?}");
            }
        }
        decision
    }

    /// Explicit switcher selection. Always wins over the heuristic: the choice
    /// is stored (best-effort) and the visitor is sent to that locale's root
    /// even if the write failed.
    pub fn select_locale(&self, lang: &str) -> String {
        persistence::write_best_effort(self.store.as_ref(), &self.preference_key, lang);

        let target = self.root_for(lang).to_owned();
        info!("Locale {lang:?} selected, navigating to {target}");
        self.navigator.navigate(target.clone(), NavAction::Push);
        target
    }

    /// Whether `lang` is either the authored or the localized locale.
    pub fn is_known_locale(&self, lang: &str) -> bool {
        lang == self.rules.default_locale || lang == self.rules.target_locale
    }

    fn root_for(&self, lang: &str) -> &str {
        if lang == self.rules.target_locale {
            &self.rules.localized_root
        } else {
            if !self.is_known_locale(lang) {
                warn!(
                    "Unknown locale {lang:?}, falling back to {}",
                    self.rules.default_locale
                );
            }
            &self.rules.default_root
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::persistence::{InMemoryStore, UnavailableStore};

    const PREF: &str = "preferred-lang";
    const BROWSER_UA: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

    #[derive(Default)]
    struct RecordingNavigator(Mutex<Vec<(String, NavAction)>>);

    impl NavigationHandler for RecordingNavigator {
        fn navigate(&self, path: String, action: NavAction) {
            self.0.lock().unwrap().push((path, action));
        }
    }

    fn router(store: Arc<dyn KeyValueStore>) -> (LocaleRouter, Arc<RecordingNavigator>) {
        let nav = Arc::new(RecordingNavigator::default());
        let router = LocaleRouter::new(store, nav.clone(), PREF, LocaleRules::default());
        (router, nav)
    }

    fn first_visit(path: &str, language: &str) -> PageEnvironment {
        PageEnvironment {
            path: path.into(),
            referrer: String::new(),
            user_agent: BROWSER_UA.into(),
            language: language.into(),
        }
    }

    #[test]
    fn english_first_visit_on_home_redirects() {
        let (router, nav) = router(Arc::new(InMemoryStore::new()));

        let decision = router.route_on_load(&first_visit("/", "en-US"));

        assert_eq!(
            decision,
            RedirectDecision::Redirect {
                to: "/en/".into()
            }
        );
        assert_eq!(
            *nav.0.lock().unwrap(),
            vec![("/en/".to_owned(), NavAction::Replace)]
        );
    }

    #[test]
    fn default_document_counts_as_home() {
        let (router, _) = router(Arc::new(InMemoryStore::new()));
        assert!(router
            .route_on_load(&first_visit("/index.html", "en"))
            .is_redirect());
    }

    #[test]
    fn other_paths_are_left_alone() {
        let (router, nav) = router(Arc::new(InMemoryStore::new()));

        let decision = router.route_on_load(&first_visit("/pricing", "en-US"));

        assert_eq!(decision, RedirectDecision::Suppressed { gate: Gate::HomePath });
        assert!(nav.0.lock().unwrap().is_empty());
    }

    #[test]
    fn other_languages_are_left_alone() {
        let (router, nav) = router(Arc::new(InMemoryStore::new()));

        let decision = router.route_on_load(&first_visit("/", "fr-FR"));

        assert_eq!(
            decision,
            RedirectDecision::Suppressed {
                gate: Gate::LocaleMatch
            }
        );
        assert!(nav.0.lock().unwrap().is_empty());
    }

    #[test]
    fn crawler_is_checked_first() {
        let (router, _) = router(Arc::new(InMemoryStore::with_entries([(PREF, "en")])));
        let env = PageEnvironment {
            user_agent: "Googlebot/2.1".into(),
            referrer: "https://www.google.com/".into(),
            ..first_visit("/pricing", "fr")
        };

        assert_eq!(
            router.route_on_load(&env),
            RedirectDecision::Suppressed {
                gate: Gate::NotCrawler
            }
        );
    }

    #[test]
    fn any_stored_preference_suppresses() {
        for stored in ["en", "fr", "de"] {
            let (router, nav) = router(Arc::new(InMemoryStore::with_entries([(PREF, stored)])));
            assert_eq!(
                router.route_on_load(&first_visit("/", "en")),
                RedirectDecision::Suppressed {
                    gate: Gate::NoStoredPreference
                }
            );
            assert!(nav.0.lock().unwrap().is_empty());
        }
    }

    #[test]
    fn search_referral_suppresses() {
        let (router, _) = router(Arc::new(InMemoryStore::new()));
        let env = PageEnvironment {
            referrer: "https://www.google.com/search?q=x".into(),
            ..first_visit("/", "en-GB")
        };
        assert_eq!(
            router.route_on_load(&env),
            RedirectDecision::Suppressed {
                gate: Gate::NotSearchReferral
            }
        );
    }

    #[test]
    fn auto_redirect_does_not_store_preference() {
        let store = Arc::new(InMemoryStore::new());
        let (router, nav) = router(store.clone());

        router.route_on_load(&first_visit("/", "en-US"));
        router.route_on_load(&first_visit("/", "en-US"));

        assert_eq!(store.get(PREF.to_owned()), None);
        assert_eq!(nav.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn unavailable_storage_still_routes() {
        let (router, _) = router(Arc::new(UnavailableStore));
        assert!(router.route_on_load(&first_visit("/", "en")).is_redirect());
    }

    #[test]
    fn selecting_target_locale_pushes_localized_root() {
        let store = Arc::new(InMemoryStore::new());
        let (router, nav) = router(store.clone());

        assert_eq!(router.select_locale("en"), "/en/");

        assert_eq!(store.get(PREF.to_owned()).as_deref(), Some("en"));
        assert_eq!(
            *nav.0.lock().unwrap(),
            vec![("/en/".to_owned(), NavAction::Push)]
        );
    }

    #[test]
    fn selecting_default_locale_overrides_previous_choice() {
        let store = Arc::new(InMemoryStore::with_entries([(PREF, "en")]));
        let (router, nav) = router(store.clone());

        assert_eq!(router.select_locale("fr"), "/");

        assert_eq!(store.get(PREF.to_owned()).as_deref(), Some("fr"));
        assert_eq!(
            *nav.0.lock().unwrap(),
            vec![("/".to_owned(), NavAction::Push)]
        );
    }

    #[test]
    fn unknown_locale_falls_back_to_default_root() {
        let store = Arc::new(InMemoryStore::new());
        let (router, nav) = router(store.clone());

        assert!(router.is_known_locale("fr"));
        assert!(router.is_known_locale("en"));
        assert!(!router.is_known_locale("de"));
        assert_eq!(router.select_locale("de"), "/");

        assert_eq!(store.get(PREF.to_owned()).as_deref(), Some("de"));
        assert_eq!(
            *nav.0.lock().unwrap(),
            vec![("/".to_owned(), NavAction::Push)]
        );
    }

    #[test]
    fn known_locales_follow_configured_rules() {
        let rules = LocaleRules {
            default_locale: "de".to_owned(),
            ..LocaleRules::default()
        };
        let router = LocaleRouter::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingNavigator::default()),
            PREF,
            rules,
        );
        assert!(router.is_known_locale("de"));
        assert!(!router.is_known_locale("fr"));
    }

    #[test]
    fn selection_navigates_when_storage_fails() {
        let (router, nav) = router(Arc::new(UnavailableStore));
        router.select_locale("en");
        assert_eq!(nav.0.lock().unwrap().len(), 1);
    }

    fn signals_strategy() -> impl Strategy<Value = VisitorSignals> {
        (
            prop::sample::select(vec!["/", "/index.html", "/pricing", "/en/", ""]),
            prop::sample::select(vec![
                "",
                "https://www.google.com/search?q=x",
                "https://example.com/",
                "https://duckduckgo.com/",
            ]),
            "[ -~]{0,40}",
            prop::sample::select(vec!["en", "en-US", "fr-FR", "de", ""]),
            any::<bool>(),
        )
            .prop_map(|(path, referrer, user_agent, language, has_stored_preference)| {
                VisitorSignals {
                    path: path.into(),
                    referrer: referrer.into(),
                    user_agent,
                    language: language.into(),
                    has_stored_preference,
                }
            })
    }

    proptest! {
        #[test]
        fn crawlers_never_redirect(
            mut signals in signals_strategy(),
            fragment in prop::sample::select(LocaleRules::default().crawler_fragments),
            upper in any::<bool>(),
        ) {
            let fragment = if upper { fragment.to_uppercase() } else { fragment };
            signals.user_agent = format!("{} {fragment}/2.1", signals.user_agent);
            let (router, _) = router(Arc::new(InMemoryStore::new()));
            prop_assert_eq!(
                router.evaluate(&signals),
                RedirectDecision::Suppressed { gate: Gate::NotCrawler }
            );
        }

        #[test]
        fn search_referrals_never_redirect(
            mut signals in signals_strategy(),
            engine in prop::sample::select(LocaleRules::default().search_engine_fragments),
            tld in prop::sample::select(vec!["com", "fr", "co.uk"]),
        ) {
            signals.referrer = format!("https://www.{engine}.{tld}/search?q=x");
            let (router, _) = router(Arc::new(InMemoryStore::new()));
            prop_assert!(!router.evaluate(&signals).is_redirect());
        }

        #[test]
        fn redirect_implies_every_gate(signals in signals_strategy()) {
            let (router, _) = router(Arc::new(InMemoryStore::new()));
            let rules = LocaleRules::default();
            let all_pass = Gate::ORDER.iter().all(|gate| gate.passes(&signals, &rules));
            prop_assert_eq!(router.evaluate(&signals).is_redirect(), all_pass);
        }
    }
}
