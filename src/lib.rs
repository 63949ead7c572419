pub mod chat;
pub mod constants;
pub mod gemini;
pub mod order;
pub mod transcript;
pub mod turn;
pub mod web_server;
