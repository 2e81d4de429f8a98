use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    callbacks::ConsentListener,
    persistence::{self, KeyValueStore},
};

const ACCEPTED: &str = "accepted";
const REFUSED: &str = "refused";

/// Handle returned by [ConsentStore::on_change], used to unregister.
pub type ListenerId = u64;

/// The persisted consent state as read back from storage.
#[derive(uniffi::Enum, Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ConsentDecision {
    #[default]
    Unset,
    Accepted,
    Refused,
}

impl ConsentDecision {
    /// Anything other than the two recognized literals is [ConsentDecision::Unset].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(ACCEPTED) => ConsentDecision::Accepted,
            Some(REFUSED) => ConsentDecision::Refused,
            _ => ConsentDecision::Unset,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, ConsentDecision::Unset)
    }
}

/// An explicit choice made by the visitor. There is deliberately no way to
/// record "unset".
#[derive(uniffi::Enum, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsentChoice {
    Accepted,
    Refused,
}

impl ConsentChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentChoice::Accepted => ACCEPTED,
            ConsentChoice::Refused => REFUSED,
        }
    }
}

impl fmt::Display for ConsentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConsentChoice> for ConsentDecision {
    fn from(choice: ConsentChoice) -> Self {
        match choice {
            ConsentChoice::Accepted => ConsentDecision::Accepted,
            ConsentChoice::Refused => ConsentDecision::Refused,
        }
    }
}

/// Payload broadcast to consent listeners. Serializes as `{"status":"accepted"}`.
#[derive(uniffi::Record, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConsentChanged {
    pub status: ConsentChoice,
}

impl ConsentChanged {
    pub fn to_json(&self) -> String {
        // A single unit enum field cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Default)]
struct Listeners {
    entries: Mutex<Vec<(ListenerId, Arc<dyn ConsentListener>)>>,
    id_source: AtomicU64,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.entries.lock().map(|e| e.len()).unwrap_or_default();
        write!(f, "{count} listener(s)")
    }
}

/// Single authority over the visitor's consent decision and the only writer
/// of the consent key.
pub struct ConsentStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    listeners: Listeners,
}

impl fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentStore")
            .field("key", &self.key)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl ConsentStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            listeners: Listeners::default(),
        }
    }

    /// The persisted decision. Missing storage and malformed values are both
    /// [ConsentDecision::Unset].
    pub fn decision(&self) -> ConsentDecision {
        let raw = persistence::read(self.store.as_ref(), &self.key);
        let decision = ConsentDecision::parse(raw.as_deref());
        if decision == ConsentDecision::Unset {
            if let Some(raw) = raw {
                debug!("Ignoring unrecognized consent value {raw:?}");
            }
        }
        decision
    }

    /// The consent prompt is only shown while no decision has been recorded.
    pub fn should_show_banner(&self) -> bool {
        !self.decision().is_set()
    }

    /// Persists `choice` and then notifies every listener. Persistence is
    /// best-effort; listeners are notified even if the write failed.
    pub fn record_decision(&self, choice: ConsentChoice) {
        let persisted =
            persistence::write_best_effort(self.store.as_ref(), &self.key, choice.as_str());
        info!("Consent {choice} (persisted: {persisted})");

        let event = ConsentChanged { status: choice };
        for listener in self.snapshot() {
            listener.on_consent_change(event);
        }
    }

    /// Registers `listener` for every subsequent [ConsentStore::record_decision].
    pub fn on_change(&self, listener: Arc<dyn ConsentListener>) -> ListenerId {
        let id = self.listeners.id_source.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut entries) = self.listeners.entries.lock() {
            entries.push((id, listener));
        }
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let Ok(mut entries) = self.listeners.entries.lock() else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    // Listeners run without the lock held so they can (un)register from inside
    // their handler.
    fn snapshot(&self) -> Vec<Arc<dyn ConsentListener>> {
        self.listeners
            .entries
            .lock()
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default()
    }
}
