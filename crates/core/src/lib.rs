//! Consent and locale routing for the Elevenmusic marketing site.
//!
//! Everything here is host agnostic: storage, navigation and the analytics tag
//! are injected through the traits in [callbacks] and [persistence], so the same
//! decisions run in the browser (see the wasm binding) and in native webview shells.

pub mod analytics;
pub mod callbacks;
pub mod client;
pub mod consent;
pub mod faq;
pub mod locale;
pub mod newsletter;
pub mod persistence;
pub mod prompts;

pub use self::{
    client::{SiteClient, SiteClientBuilder, SiteClientConfiguration, SiteSettings},
    consent::{ConsentChoice, ConsentDecision, ConsentStore},
    locale::{LocaleRouter, PageEnvironment, RedirectDecision},
};

uniffi::setup_scaffolding!("site_behavior");
