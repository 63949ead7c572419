//! Interactive terminal conversation, driving the same turn orchestration as
//! the web page.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::info;

use crate::constants::SYSTEM_PROMPT;
use crate::gemini::{ChatSession, SessionConfig};
use crate::order::place_order_declaration;
use crate::turn::ChatEngine;

pub async fn run_chat(session_config: SessionConfig) -> Result<()> {
    info!("Starting terminal chat session");

    let session = ChatSession::start(
        session_config,
        SYSTEM_PROMPT,
        vec![place_order_declaration()],
    )?;
    let mut engine = ChatEngine::new(session);

    if let Some(greeting) = engine.transcript().last() {
        println!("garcon: {}", greeting.text);
    }
    println!("(type 'quit' to leave)");

    let stdin = io::stdin();
    loop {
        print!("you: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        if engine.submit(line).await {
            if let Some(reply) = engine.transcript().last() {
                println!("garcon: {}", reply.text);
            }
        }
    }

    info!("Terminal chat session finished");
    Ok(())
}
