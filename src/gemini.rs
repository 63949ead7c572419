//! Conversation client for the hosted Generative Language API.
//!
//! One `ChatSession` holds the whole dialogue state (system instruction, tool
//! declarations, turn history, pending tool invocation) and mediates every
//! exchange over `generateContent`. Nothing outside this module inspects that
//! state; callers only see `ModelReply` values and typed errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{GARCON_MODEL, GEMINI_BASE_URL};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation session is not ready: {0}")]
    NotReady(String),
    #[error("request to the model endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned HTTP {status}: {message}")]
    Service { status: u16, message: String },
    #[error("model returned an unusable reply: {0}")]
    MalformedReply(String),
    #[error("no tool invocation is awaiting a result")]
    NoPendingInvocation,
    #[error("tool result correlation id `{got}` does not match pending invocation `{expected}`")]
    CorrelationMismatch { expected: String, got: String },
    #[error("model requested another action where plain text was expected")]
    UnexpectedAction,
}

/// A structured action the model asked the application to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    /// Opaque correlation token. Echoed by the matching result.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Outcome of executing a requested invocation, reported back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationResult {
    pub correlation_id: String,
    pub outcome: String,
}

/// What one exchange with the model produced. Exactly one of the two; when
/// the service emits a structured action, any accompanying text is ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    PlainText(String),
    ActionRequested(ToolInvocationRequest),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl SessionConfig {
    /// Endpoint settings from the environment, credential supplied by the
    /// caller (main fails fast when it is absent).
    pub fn from_env(api_key: String) -> Self {
        Self {
            api_key,
            base_url: GEMINI_BASE_URL.clone(),
            model: GARCON_MODEL.clone(),
        }
    }
}

/// The invocation the model issued and has not yet received a result for.
#[derive(Debug, Clone)]
struct PendingCall {
    /// Token handed to the application; matched against the result.
    correlation: String,
    /// Id as it appeared on the wire, echoed back verbatim when present.
    wire_id: Option<String>,
    name: String,
}

pub struct ChatSession {
    http: reqwest::Client,
    config: SessionConfig,
    system_instruction: Content,
    tools: Vec<Tool>,
    history: Vec<Content>,
    pending_call: Option<PendingCall>,
}

impl ChatSession {
    /// Establishes the session with a fixed behavioral instruction and the
    /// declared set of callable tools. Created once per conversation.
    pub fn start(
        config: SessionConfig,
        system_prompt: &str,
        declarations: Vec<FunctionDeclaration>,
    ) -> Result<Self, ConversationError> {
        if config.api_key.trim().is_empty() {
            return Err(ConversationError::NotReady(
                "API credential is empty".to_string(),
            ));
        }
        let tools = if declarations.is_empty() {
            Vec::new()
        } else {
            vec![Tool {
                function_declarations: declarations,
            }]
        };
        Ok(Self {
            http: reqwest::Client::new(),
            config,
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: system_prompt.to_string(),
                }],
            },
            tools,
            history: Vec::new(),
            pending_call: None,
        })
    }

    /// Forwards one user turn. A failed exchange leaves the recorded history
    /// as it was before the attempt.
    pub async fn send(&mut self, user_text: &str) -> Result<ModelReply, ConversationError> {
        // A new user turn abandons any invocation an earlier turn left
        // unresolved.
        self.pending_call = None;

        let checkpoint = self.history.len();
        self.history.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part::Text {
                text: user_text.to_string(),
            }],
        });
        match self.generate().await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                self.history.truncate(checkpoint);
                Err(e)
            }
        }
    }

    /// Reports the outcome of the pending invocation. The correlation id must
    /// match the one issued with the request; the reply is expected to be
    /// plain text.
    pub async fn send_tool_result(
        &mut self,
        result: ToolInvocationResult,
    ) -> Result<ModelReply, ConversationError> {
        let pending = self
            .pending_call
            .take()
            .ok_or(ConversationError::NoPendingInvocation)?;
        if pending.correlation != result.correlation_id {
            let expected = pending.correlation.clone();
            self.pending_call = Some(pending);
            return Err(ConversationError::CorrelationMismatch {
                expected,
                got: result.correlation_id,
            });
        }

        let checkpoint = self.history.len();
        self.history.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part::FunctionResponse {
                function_response: FunctionResponse {
                    id: pending.wire_id.clone(),
                    name: pending.name.clone(),
                    response: serde_json::json!({ "result": result.outcome }),
                },
            }],
        });
        match self.generate().await {
            Ok(ModelReply::PlainText(text)) => Ok(ModelReply::PlainText(text)),
            Ok(ModelReply::ActionRequested(_)) => {
                self.history.truncate(checkpoint);
                self.pending_call = None;
                Err(ConversationError::UnexpectedAction)
            }
            Err(e) => {
                self.history.truncate(checkpoint);
                Err(e)
            }
        }
    }

    /// One `generateContent` round trip over the current history.
    async fn generate(&mut self) -> Result<ModelReply, ConversationError> {
        let request = GenerateRequest {
            contents: self.history.clone(),
            system_instruction: Some(self.system_instruction.clone()),
            tools: if self.tools.is_empty() {
                None
            } else {
                Some(self.tools.clone())
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        tracing::debug!(%url, turns = self.history.len(), "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::error!(%status, %message, "model endpoint request failed");
            return Err(ConversationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ConversationError::MalformedReply(e.to_string()))?;
        let candidate = reply
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ConversationError::MalformedReply("no candidates in reply".to_string()))?;

        let content = candidate.content;
        self.history.push(content.clone());

        // A structured action takes precedence over any accompanying text.
        for part in &content.parts {
            if let Part::FunctionCall { function_call } = part {
                let correlation = function_call
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                self.pending_call = Some(PendingCall {
                    correlation: correlation.clone(),
                    wire_id: function_call.id.clone(),
                    name: function_call.name.clone(),
                });
                tracing::info!(tool = %function_call.name, id = %correlation, "model requested an action");
                return Ok(ModelReply::ActionRequested(ToolInvocationRequest {
                    id: correlation,
                    name: function_call.name.clone(),
                    arguments: function_call.args.clone(),
                }));
            }
        }

        let text: String = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Ok(ModelReply::PlainText(text))
    }
}

// Wire types for the generateContent contract.

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<FunctionDeclaration>,
}

/// Schema of one tool the model may invoke.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
