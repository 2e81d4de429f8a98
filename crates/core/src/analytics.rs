use std::sync::Arc;

use log::debug;

use crate::{
    callbacks::AnalyticsSink,
    consent::{ConsentDecision, ConsentStore},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
pub enum AnalyticsError {
    #[error("Tag function is not loaded")]
    NotLoaded,
    #[error("Tag function threw - {message}")]
    Thrown { message: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for AnalyticsError {
    fn from(value: uniffi::UnexpectedUniFFICallbackError) -> Self {
        AnalyticsError::Thrown {
            message: value.reason,
        }
    }
}

/// Interactions reported to the tag function.
#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum AnalyticsEvent {
    CtaClick { label: String },
    NewsletterSignup,
    ConsentGranted,
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::CtaClick { .. } => "cta_click",
            AnalyticsEvent::NewsletterSignup => "newsletter_signup",
            AnalyticsEvent::ConsentGranted => "consent_update",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            AnalyticsEvent::CtaClick { .. } => "CTA",
            AnalyticsEvent::NewsletterSignup => "newsletter",
            AnalyticsEvent::ConsentGranted => "consent",
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            AnalyticsEvent::CtaClick { label } => Some(label.as_str()),
            AnalyticsEvent::NewsletterSignup => None,
            AnalyticsEvent::ConsentGranted => Some("accepted"),
        }
    }
}

/// Consent-gated, failure-proof front for an [AnalyticsSink].
pub struct Analytics {
    sink: Option<Arc<dyn AnalyticsSink>>,
    consent: Arc<ConsentStore>,
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics")
            .field("sink", &self.sink.is_some().then_some("..."))
            .finish_non_exhaustive()
    }
}

impl Analytics {
    pub fn new(sink: Option<Arc<dyn AnalyticsSink>>, consent: Arc<ConsentStore>) -> Self {
        Self { sink, consent }
    }

    /// Forwards `event` if the visitor accepted data collection. Returns whether
    /// the sink took it; sink errors are swallowed.
    pub fn track(&self, event: AnalyticsEvent) -> bool {
        let Some(sink) = &self.sink else {
            return false;
        };
        if self.consent.decision() != ConsentDecision::Accepted {
            debug!("Dropping {} without consent", event.name());
            return false;
        }

        let name = event.name();
        match sink.send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!("Analytics event {name} failed: {e}");
                false
            }
        }
    }
}
