use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    serve, Router,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::constants::SYSTEM_PROMPT;
use crate::gemini::{ChatSession, SessionConfig};
use crate::order::place_order_declaration;
use crate::transcript::{MessageRecord, Transcript};
use crate::turn::ChatEngine;

/// Frames the page sends over the chat socket.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientEvent {
    Chat { text: String },
}

/// Frames the server pushes back: a full transcript snapshot after every
/// mutation, which the page re-renders wholesale.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerEvent<'a> {
    Transcript { messages: &'a [MessageRecord] },
}

// Shared application state
#[derive(Clone)]
struct AppState {
    templates: Arc<AutoReloader>,
    session_config: SessionConfig,
}

// Minijinja Environment setup
fn create_minijinja_env() -> Result<AutoReloader> {
    // Use AutoReloader for development convenience
    let reloader = AutoReloader::new(|notifier| {
        let loader = path_loader("templates");
        let mut env = Environment::new();
        env.set_loader(loader);
        // Watch the templates directory for changes
        notifier.watch_path("templates", true);
        Ok(env)
    });
    Ok(reloader)
}

async fn index_handler(
    State(state): State<AppState>,
) -> Result<axum::response::Html<String>, axum::response::Html<String>> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = minijinja::context! {
                    title => "Garçon",
                };
                tmpl.render(context)
            })
        })
        .map(axum::response::Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            axum::response::Html(format!("Internal Server Error: {}", e))
        })
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

// One conversation per socket: a fresh session and engine for each page load,
// dropped when the page goes away.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New chat connection established");
    let (mut sender, mut receiver) = socket.split();

    let mut engine = match ChatSession::start(
        state.session_config.clone(),
        SYSTEM_PROMPT,
        vec![place_order_declaration()],
    ) {
        Ok(session) => ChatEngine::new(session),
        Err(e) => {
            error!("Failed to establish conversation session: {}", e);
            ChatEngine::unready()
        }
    };

    // Initial snapshot so the page shows the greeting.
    if !send_transcript(&mut sender, engine.transcript()).await {
        return;
    }

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Chat { text }) => {
                    if engine.begin(&text) {
                        // Show the pending record before the remote call
                        // resolves, then the terminal transcript after.
                        if !send_transcript(&mut sender, engine.transcript()).await {
                            break;
                        }
                        engine.complete().await;
                        if !send_transcript(&mut sender, engine.transcript()).await {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("Unparseable client frame: {} ({})", text, e);
                }
            },
            Message::Binary(_) => {
                warn!("Received unexpected binary message from client");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                info!("Client requested WebSocket close");
                break;
            }
        }
    }
    info!("Chat connection closed");
}

/// Pushes a transcript snapshot; returns whether the socket is still usable.
async fn send_transcript(
    sender: &mut SplitSink<WebSocket, Message>,
    transcript: &Transcript,
) -> bool {
    let event = ServerEvent::Transcript {
        messages: transcript.entries(),
    };
    match serde_json::to_string(&event) {
        Ok(json) => sender.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize transcript snapshot: {}", e);
            true
        }
    }
}

pub fn build_router(session_config: SessionConfig) -> Result<Router> {
    let templates = create_minijinja_env().context("Failed to initialize template engine")?;
    let state = AppState {
        templates: Arc::new(templates),
        session_config,
    };

    Ok(Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(TraceLayer::new_for_http()))
}

pub async fn start_web_server(port: u16, session_config: SessionConfig) -> Result<()> {
    let app = build_router(session_config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
