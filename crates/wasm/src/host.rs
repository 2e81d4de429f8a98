//! Browser implementations of the core's host capabilities. Each type is
//! zero-sized and looks the browser objects up per call, so they are trivially
//! `Send + Sync`.

use js_sys::{Function, Object, Reflect};
use log::{debug, warn};
use site_behavior_core::{
    analytics::{AnalyticsError, AnalyticsEvent},
    callbacks::{AnalyticsSink, ConsentListener, NavAction, NavigationHandler},
    consent::ConsentChanged,
    persistence::{KeyValueStore, StorageError},
    PageEnvironment,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, Document, Storage, Window};

/// Name of the document event carrying `{ status }` after a consent choice.
pub const CONSENT_EVENT: &str = "consent:change";

fn window() -> Option<Window> {
    web_sys::window()
}

pub(crate) fn document() -> Option<Document> {
    window()?.document()
}

fn describe(err: &JsValue) -> String {
    match err.dyn_ref::<js_sys::Error>() {
        Some(e) => String::from(e.message()),
        None => format!("{err:?}"),
    }
}

/// Everything the locale router reads from the page.
pub fn page_environment() -> PageEnvironment {
    let Some(window) = window() else {
        return PageEnvironment::default();
    };
    let navigator = window.navigator();
    PageEnvironment {
        path: window.location().pathname().unwrap_or_default(),
        referrer: window.document().map(|d| d.referrer()).unwrap_or_default(),
        user_agent: navigator.user_agent().unwrap_or_default(),
        language: navigator.language().unwrap_or_default(),
    }
}

/// `window.localStorage`. Access can throw (policy, sandboxed iframes), in
/// which case reads are empty and writes fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<Storage, StorageError> {
        let unavailable = |reason: String| StorageError::Unavailable { reason };
        window()
            .ok_or_else(|| unavailable("no window".to_owned()))?
            .local_storage()
            .map_err(|e| unavailable(describe(&e)))?
            .ok_or_else(|| unavailable("localStorage is null".to_owned()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: String) -> Option<String> {
        Self::storage().ok()?.get_item(&key).ok().flatten()
    }

    fn set(&self, key: String, value: String) -> Result<(), StorageError> {
        Self::storage()?.set_item(&key, &value).map_err(|e| {
            let quota = e
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.name()) == "QuotaExceededError")
                .unwrap_or(false);
            if quota {
                StorageError::QuotaExceeded
            } else {
                StorageError::Unavailable {
                    reason: describe(&e),
                }
            }
        })
    }
}

/// `location.assign` for pushes, `location.replace` for replaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl NavigationHandler for BrowserNavigator {
    fn navigate(&self, path: String, action: NavAction) {
        let Some(window) = window() else {
            return;
        };
        let location = window.location();
        let result = match action {
            NavAction::Push => location.assign(&path),
            NavAction::Replace => location.replace(&path),
        };
        if let Err(e) = result {
            warn!("Navigation to {path} failed: {}", describe(&e));
        }
    }
}

/// Re-broadcasts consent changes as a `consent:change` CustomEvent on `document`
/// for scripts outside the binding.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentBus;

impl ConsentListener for DocumentBus {
    fn on_consent_change(&self, event: ConsentChanged) {
        let Some(document) = document() else {
            return;
        };
        let detail = match serde_wasm_bindgen::to_value(&event) {
            Ok(detail) => detail,
            Err(e) => {
                warn!("Failed to build consent event detail: {e}");
                return;
            }
        };
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(CONSENT_EVENT, &init) {
            Ok(custom) => {
                if let Err(e) = document.dispatch_event(&custom) {
                    warn!("Failed to dispatch {CONSENT_EVENT}: {}", describe(&e));
                }
            }
            Err(e) => warn!("Failed to create {CONSENT_EVENT}: {}", describe(&e)),
        }
    }
}

/// Calls `window.gtag('event', name, { event_category, event_label })`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GtagSink;

impl AnalyticsSink for GtagSink {
    fn send(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        let window = window().ok_or(AnalyticsError::NotLoaded)?;
        let gtag = Reflect::get(&window, &JsValue::from_str("gtag"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or(AnalyticsError::NotLoaded)?;

        let params = Object::new();
        let thrown = |e: JsValue| AnalyticsError::Thrown {
            message: describe(&e),
        };
        Reflect::set(
            &params,
            &JsValue::from_str("event_category"),
            &JsValue::from_str(event.category()),
        )
        .map_err(thrown)?;
        if let Some(label) = event.label() {
            Reflect::set(
                &params,
                &JsValue::from_str("event_label"),
                &JsValue::from_str(label),
            )
            .map_err(thrown)?;
        }

        debug!("gtag event {}", event.name());
        gtag.call3(
            &JsValue::NULL,
            &JsValue::from_str("event"),
            &JsValue::from_str(event.name()),
            &params,
        )
        .map(|_| ())
        .map_err(thrown)
    }
}
