use chrono::Local;
use serde::Serialize;

use crate::constants::PENDING_TEXT;

/// Who a transcript record belongs to. `Pending` marks the transient
/// placeholder shown while a turn is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

impl MessageRecord {
    fn new(sender: Sender, text: String) -> Self {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        Self {
            sender,
            text,
            timestamp,
        }
    }
}

/// Ordered, append-only message log with an explicit in-flight slot.
///
/// Invariant: at most one pending record exists at any time, it is always the
/// last entry, and it is always either resolved or failed before the next turn
/// may start.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<MessageRecord>,
    in_flight: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MessageRecord] {
        &self.entries
    }

    pub fn last(&self) -> Option<&MessageRecord> {
        self.entries.last()
    }

    pub fn has_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        debug_assert!(self.in_flight.is_none(), "append while a turn is in flight");
        self.entries
            .push(MessageRecord::new(Sender::User, text.into()));
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.entries
            .push(MessageRecord::new(Sender::Bot, text.into()));
    }

    /// Appends the pending placeholder for a newly started turn.
    pub fn begin_pending(&mut self) {
        debug_assert!(self.in_flight.is_none(), "a pending record already exists");
        self.entries
            .push(MessageRecord::new(Sender::Pending, PENDING_TEXT.to_string()));
        self.in_flight = Some(self.entries.len() - 1);
    }

    /// Replaces the pending record with the final bot record for this turn.
    /// A failed turn resolves with the apology text; the transcript does not
    /// distinguish the two.
    pub fn resolve_pending(&mut self, text: impl Into<String>) {
        if let Some(idx) = self.in_flight.take() {
            self.entries[idx] = MessageRecord::new(Sender::Bot, text.into());
        } else {
            tracing::warn!("resolve_pending called with no pending record");
        }
    }
}
