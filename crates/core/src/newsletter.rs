use std::sync::Arc;

use log::info;

use crate::{
    analytics::{Analytics, AnalyticsEvent},
    persistence::{self, KeyValueStore},
};

#[derive(uniffi::Enum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum NewsletterOutcome {
    Invalid,
    Subscribed,
}

impl NewsletterOutcome {
    /// Toast text shown for the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            NewsletterOutcome::Invalid => "Email invalide !",
            NewsletterOutcome::Subscribed => "Inscription validée !",
        }
    }
}

/// Newsletter form handling. There is no backend yet: the address is kept in
/// local storage.
pub struct Newsletter {
    store: Arc<dyn KeyValueStore>,
    key: String,
    analytics: Arc<Analytics>,
}

impl Newsletter {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        analytics: Arc<Analytics>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            analytics,
        }
    }

    pub fn subscribe(&self, email: &str) -> NewsletterOutcome {
        let email = email.trim();
        if !is_valid_email(email) {
            return NewsletterOutcome::Invalid;
        }

        // TODO: post to the mailing list API once it exists instead of storing locally.
        persistence::write_best_effort(self.store.as_ref(), &self.key, email);
        self.analytics.track(AnalyticsEvent::NewsletterSignup);
        info!("Newsletter signup recorded");
        NewsletterOutcome::Subscribed
    }
}

/// `local@label.tld`: local part of word characters, `.` and `-`; a single
/// domain label of word characters and `-`; a tld of at least two word characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((label, tld)) = domain.split_once('.') else {
        return false;
    };

    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    !local.is_empty()
        && local.chars().all(|c| word(c) || c == '.' || c == '-')
        && !label.is_empty()
        && label.chars().all(|c| word(c) || c == '-')
        && tld.len() >= 2
        && tld.chars().all(word)
}
