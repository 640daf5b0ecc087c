//! # Tracking History
//!
//! Write-once audit entries attached to an order, a return, or a payout.
//! The full ordered sequence is the audit trail and is never edited or
//! reordered. Each entry records who did what, when, and optionally where.

use serde::{Deserialize, Serialize};

use souk_core::{Actor, ActorRole, OrderId, PayoutId, ReturnId, Timestamp};

/// What a tracking entry is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum TrackingSubject {
    /// An order's history.
    Order(OrderId),
    /// A return request's history.
    Return(ReturnId),
    /// A payout's history.
    Payout(PayoutId),
}

impl std::fmt::Display for TrackingSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order(id) => write!(f, "order:{id}"),
            Self::Return(id) => write!(f, "return:{id}"),
            Self::Payout(id) => write!(f, "payout:{id}"),
        }
    }
}

/// One immutable audit record of a status change.
///
/// `recorded_at` is when the ledger wrote the entry; `event_at` is the
/// optional instant the underlying event actually happened (a courier scan
/// reported late, for example). Timeline ordering uses
/// [`effective_at`](TrackingEntry::effective_at), which falls back to the
/// recording time when no event time was supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// What this entry is attached to.
    pub subject: TrackingSubject,
    /// The status recorded (a state name such as `"approved"`).
    pub status: String,
    /// Human-readable description of the event.
    pub description: String,
    /// Role of the actor who caused the event.
    pub actor_role: ActorRole,
    /// Identifier of the actor who caused the event.
    pub actor_id: String,
    /// Optional geolocation or facility note.
    pub location: Option<String>,
    /// Optional explicit event time.
    pub event_at: Option<Timestamp>,
    /// When the ledger recorded the entry.
    pub recorded_at: Timestamp,
    /// Insertion sequence, assigned by the ledger on append. Breaks ties
    /// between entries with the same effective time.
    pub seq: u64,
}

impl TrackingEntry {
    /// Create an entry recorded now.
    pub fn new(
        subject: TrackingSubject,
        status: impl Into<String>,
        description: impl Into<String>,
        actor: &Actor,
    ) -> Self {
        Self {
            subject,
            status: status.into(),
            description: description.into(),
            actor_role: actor.role,
            actor_id: actor.id.clone(),
            location: None,
            event_at: None,
            recorded_at: Timestamp::now(),
            seq: 0,
        }
    }

    /// Builder: attach a location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder: set an explicit event time.
    pub fn with_event_at(mut self, at: Timestamp) -> Self {
        self.event_at = Some(at);
        self
    }

    /// Builder: override the recording time (tests, replays).
    pub fn with_recorded_at(mut self, at: Timestamp) -> Self {
        self.recorded_at = at;
        self
    }

    /// The normalized timestamp used for timeline ordering: the explicit
    /// event time when supplied, the recording time otherwise.
    pub fn effective_at(&self) -> &Timestamp {
        self.event_at.as_ref().unwrap_or(&self.recorded_at)
    }
}

/// Sort a timeline by effective time ascending, insertion order on ties.
pub(crate) fn sort_timeline(entries: &mut [TrackingEntry]) {
    entries.sort_by(|a, b| {
        a.effective_at()
            .cmp(b.effective_at())
            .then(a.seq.cmp(&b.seq))
    });
}
