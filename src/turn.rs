//! Per-turn orchestration: user text in, resolved transcript out.

use tracing::{debug, error, warn};

use crate::constants::{APOLOGY_TEXT, GREETING_TEXT};
use crate::gemini::{ChatSession, ConversationError, ModelReply};
use crate::order::OrderDesk;
use crate::transcript::Transcript;

/// Where the current turn is in its lifecycle. Terminal states collapse back
/// to `Idle` before control returns to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Idle,
    Sending,
    AwaitingToolResult,
}

/// Owns the transcript, the conversation session, and the order desk for one
/// conversation. Drives the cycle
/// `Idle → Sending → (AwaitingToolResult)? → Resolved | Failed`.
pub struct ChatEngine {
    transcript: Transcript,
    session: Option<ChatSession>,
    orders: OrderDesk,
    state: TurnState,
    in_flight_text: Option<String>,
}

impl ChatEngine {
    pub fn new(session: ChatSession) -> Self {
        Self::build(Some(session), OrderDesk::new())
    }

    pub fn with_order_desk(session: ChatSession, orders: OrderDesk) -> Self {
        Self::build(Some(session), orders)
    }

    /// An engine with no live session. The page keeps serving when session
    /// setup failed; every turn resolves to the apology.
    pub fn unready() -> Self {
        Self::build(None, OrderDesk::new())
    }

    fn build(session: Option<ChatSession>, orders: OrderDesk) -> Self {
        let mut transcript = Transcript::new();
        transcript.push_bot(GREETING_TEXT);
        Self {
            transcript,
            session,
            orders,
            state: TurnState::Idle,
            in_flight_text: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Starts a turn for the given input. Empty or whitespace-only input and
    /// submissions while a turn is in flight are no-ops; nothing is appended
    /// and no remote call happens. Returns whether a turn actually started.
    pub fn begin(&mut self, input: &str) -> bool {
        let text = input.trim();
        if text.is_empty() {
            return false;
        }
        if self.state != TurnState::Idle {
            debug!("submission ignored, a turn is already in flight");
            return false;
        }
        self.state = TurnState::Sending;
        self.transcript.push_user(text);
        self.transcript.begin_pending();
        self.in_flight_text = Some(text.to_string());
        true
    }

    /// Drives the turn begun by [`begin`](Self::begin) to a terminal state,
    /// replacing the pending record with either the bot reply or the fixed
    /// apology. Errors never escape this boundary and nothing is retried.
    pub async fn complete(&mut self) {
        let Some(text) = self.in_flight_text.take() else {
            warn!("complete called with no turn in flight");
            return;
        };
        match self.run_turn(&text).await {
            Ok(reply) => self.transcript.resolve_pending(reply),
            Err(e) => {
                error!(error = %e, "turn failed");
                self.transcript.resolve_pending(APOLOGY_TEXT);
            }
        }
        self.state = TurnState::Idle;
    }

    /// `begin` + `complete` for sequential surfaces like the terminal chat.
    pub async fn submit(&mut self, input: &str) -> bool {
        if !self.begin(input) {
            return false;
        }
        self.complete().await;
        true
    }

    async fn run_turn(&mut self, text: &str) -> Result<String, ConversationError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ConversationError::NotReady("session was never established".to_string()))?;

        match session.send(text).await? {
            ModelReply::PlainText(reply) => Ok(reply),
            ModelReply::ActionRequested(invocation) => {
                self.state = TurnState::AwaitingToolResult;
                let result = self.orders.execute(&invocation);
                let local_confirmation = result.outcome.clone();
                match session.send_tool_result(result).await? {
                    ModelReply::PlainText(reply) if !reply.trim().is_empty() => Ok(reply),
                    // The service sometimes follows a tool result with an
                    // empty reply; the locally built confirmation stands in.
                    ModelReply::PlainText(_) => Ok(local_confirmation),
                    ModelReply::ActionRequested(_) => Err(ConversationError::UnexpectedAction),
                }
            }
        }
    }
}
