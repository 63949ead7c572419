// Fixed strings and environment-overridable endpoint settings.

use std::env;

// Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    /// Base URL of the hosted Generative Language API. Overridable so tests
    /// and gateways can point the client somewhere else.
    pub static ref GEMINI_BASE_URL: String = env::var("GEMINI_BASE_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    /// Model served at that endpoint.
    pub static ref GARCON_MODEL: String =
        env::var("GARCON_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
}

/// Behavioral instruction the conversation session is created with.
pub const SYSTEM_PROMPT: &str = "You are Garçon, the ordering assistant for a small restaurant. \
Chat with the customer, answer questions about food, and when they are ready to order, \
call the placeOrder function with the exact list of items they asked for. \
Keep replies short and friendly.";

/// First bot message shown before any turn has run.
pub const GREETING_TEXT: &str = "Welcome to Garçon! What can I get you today?";

/// Shown while a turn is in flight.
pub const PENDING_TEXT: &str = "…";

/// The single user-visible failure message. Every error class maps to this.
pub const APOLOGY_TEXT: &str = "Sorry, something went wrong. Please try again.";
