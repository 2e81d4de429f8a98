mod host;

use log::{debug, warn};
use serde::Serialize;
use site_behavior_core::{
    client::LogLevel, faq::FaqAccordion, newsletter::NewsletterOutcome, ConsentDecision,
    RedirectDecision, SiteClient, SiteClientConfiguration, SiteSettings,
};
use std::{cell::RefCell, sync::Arc};
use wasm_bindgen::prelude::*;

pub use host::{BrowserNavigator, DocumentBus, GtagSink, LocalStorage, CONSENT_EVENT};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PageLoadReport {
    show_consent_banner: bool,
    redirected_to: Option<String>,
    suppressed_by: Option<String>,
}

#[derive(Serialize, Debug)]
struct PromptReport {
    text: String,
    message: String,
}

#[derive(Serialize, Debug)]
struct NewsletterReport {
    ok: bool,
    message: &'static str,
}

/// The site script's entry point. One instance per page.
#[wasm_bindgen]
pub struct SiteBehavior {
    client: SiteClient,
    faq: RefCell<FaqAccordion>,
}

#[wasm_bindgen]
impl SiteBehavior {
    /// `settings` may be `undefined` or a partial settings object.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<SiteBehavior, JsError> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let settings: SiteSettings = if settings.is_undefined() || settings.is_null() {
            SiteSettings::default()
        } else {
            serde_wasm_bindgen::from_value(settings)?
        };
        debug!("Site settings: {settings:?}");

        let mut config =
            SiteClientConfiguration::new(Arc::new(LocalStorage), Arc::new(BrowserNavigator));
        config.analytics_sink = Some(Arc::new(GtagSink));
        config.settings = settings;
        config.log_level = LogLevel::Info;

        let client = SiteClient::new(config)?;
        client.add_consent_listener_arc(Arc::new(DocumentBus));

        Ok(SiteBehavior {
            client,
            faq: RefCell::new(FaqAccordion::default()),
        })
    }

    /// Runs the banner check and the locale redirect for this page.
    #[wasm_bindgen(js_name = "onPageLoad")]
    pub fn on_page_load(&self) -> Result<JsValue, JsError> {
        let outcome = self.client.on_page_load(host::page_environment());
        let (redirected_to, suppressed_by) = match outcome.redirect {
            RedirectDecision::Redirect { to } => (Some(to), None),
            RedirectDecision::Suppressed { gate } => (None, Some(format!("{gate:?}"))),
        };
        let report = PageLoadReport {
            show_consent_banner: outcome.show_consent_banner,
            redirected_to,
            suppressed_by,
        };
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    #[wasm_bindgen(js_name = "shouldShowConsentBanner")]
    pub fn should_show_consent_banner(&self) -> bool {
        self.client.should_show_consent_banner()
    }

    #[wasm_bindgen(js_name = "consentDecision")]
    pub fn consent_decision(&self) -> String {
        match self.client.consent_decision() {
            ConsentDecision::Unset => "unset",
            ConsentDecision::Accepted => "accepted",
            ConsentDecision::Refused => "refused",
        }
        .to_owned()
    }

    #[wasm_bindgen(js_name = "acceptConsent")]
    pub fn accept_consent(&self) {
        self.client.accept_consent();
    }

    #[wasm_bindgen(js_name = "refuseConsent")]
    pub fn refuse_consent(&self) {
        self.client.refuse_consent();
    }

    /// Subscribes `callback` to the `consent:change` document event.
    #[wasm_bindgen(js_name = "onConsentChange")]
    pub fn on_consent_change(&self, callback: &js_sys::Function) -> Result<(), JsError> {
        let document = host::document().ok_or_else(|| JsError::new("no document"))?;
        document
            .add_event_listener_with_callback(CONSENT_EVENT, callback)
            .map_err(|e| JsError::new(&format!("{e:?}")))
    }

    #[wasm_bindgen(js_name = "selectLocale")]
    pub fn select_locale(&self, lang: String) -> String {
        self.client.select_locale(lang)
    }

    #[wasm_bindgen(js_name = "trackCtaClick")]
    pub fn track_cta_click(&self, label: String) -> bool {
        self.client.track_cta_click(label)
    }

    #[wasm_bindgen(js_name = "subscribeNewsletter")]
    pub fn subscribe_newsletter(&self, email: String) -> Result<JsValue, JsError> {
        let outcome = self.client.subscribe_newsletter(email);
        let report = NewsletterReport {
            ok: outcome == NewsletterOutcome::Subscribed,
            message: outcome.message(),
        };
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    #[wasm_bindgen(js_name = "officialPrompts")]
    pub fn official_prompts(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.client.official_prompts())?)
    }

    /// `{text, message}` for the prompt at `index`, or `null` past the end.
    /// The caller writes `text` to the clipboard and toasts `message`.
    #[wasm_bindgen(js_name = "copyPrompt")]
    pub fn copy_prompt(&self, index: u32) -> Result<JsValue, JsError> {
        match self.client.copy_prompt(index) {
            Some(copy) => Ok(serde_wasm_bindgen::to_value(&PromptReport {
                text: copy.text,
                message: copy.message,
            })?),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = "copyAllPrompts")]
    pub fn copy_all_prompts(&self) -> Result<JsValue, JsError> {
        let copy = self.client.copy_all_prompts();
        Ok(serde_wasm_bindgen::to_value(&PromptReport {
            text: copy.text,
            message: copy.message,
        })?)
    }

    /// Resets the FAQ accordion to `len` collapsed items.
    #[wasm_bindgen(js_name = "faqSetup")]
    pub fn faq_setup(&self, len: usize) {
        *self.faq.borrow_mut() = FaqAccordion::new(len);
    }

    #[wasm_bindgen(js_name = "faqToggle")]
    pub fn faq_toggle(&self, index: usize) -> bool {
        let mut faq = self.faq.borrow_mut();
        if index >= faq.len() {
            warn!("FAQ item {index} out of range ({} items)", faq.len());
        }
        faq.toggle(index)
    }

    #[wasm_bindgen(js_name = "faqAriaExpanded")]
    pub fn faq_aria_expanded(&self, index: usize) -> String {
        self.faq.borrow().aria_expanded(index).to_owned()
    }
}
