use crate::{
    analytics::{AnalyticsError, AnalyticsEvent},
    consent::ConsentChanged,
};

/// How a navigation treats the current history entry.
#[derive(uniffi::Enum, Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NavAction {
    /// Pushing a new entry onto the history stack
    #[default]
    Push,
    /// Replacing the current entry, the page being left is not kept in history
    Replace,
}

/// Performs page navigation on behalf of the core. In a browser this maps to
/// `location.assign` / `location.replace`.
///
/// Navigation is fire-and-forget: failures belong to the host.
#[uniffi::export(callback_interface)]
pub trait NavigationHandler: Send + Sync {
    fn navigate(&self, path: String, action: NavAction);
}

/// Observer for consent changes, see [crate::consent::ConsentStore::on_change].
#[uniffi::export(callback_interface)]
pub trait ConsentListener: Send + Sync {
    /// Called synchronously after the new decision has been persisted.
    fn on_consent_change(&self, event: ConsentChanged);
}

/// The opaque tag function the site reports interactions to (`gtag` on the web).
#[uniffi::export(callback_interface)]
pub trait AnalyticsSink: Send + Sync {
    fn send(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}
