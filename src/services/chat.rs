//! Interrogation Channel
//!
//! One interrogation turn against the provider gateway, with the offline
//! responder as the fallback when every endpoint fails. With the fallback on,
//! only a malformed request is an error.

use std::sync::Arc;

use interrogation_core::action::TurnIntent;
use interrogation_llm::{ChatMessage, ChatRole, CompletionParams, ProviderGateway};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::offline::offline_reply;
use super::prompt::interrogation_system_prompt;
use crate::models::level::LevelCatalog;
use crate::models::response::ReplySource;
use crate::utils::error::{AppError, AppResult};

/// Payload of one interrogation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub current_stress: u8,
    #[serde(default = "default_level_id")]
    pub level_id: String,
    /// Why the turn is made; absent for opaque legacy requests
    #[serde(default)]
    pub intent: Option<TurnIntent>,
}

fn default_level_id() -> String {
    "level-1".to_string()
}

impl ChatRequest {
    /// The request must end with the user turn being answered.
    pub fn validate(&self) -> AppResult<&ChatMessage> {
        let last = self
            .messages
            .last()
            .ok_or_else(|| AppError::validation("chat request has no messages"))?;
        if last.role != ChatRole::User {
            return Err(AppError::validation(format!(
                "last message must be a user turn, got {}",
                last.role.as_str()
            )));
        }
        Ok(last)
    }
}

/// Raw suspect reply and where it came from
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub source: ReplySource,
}

/// Gateway plus offline fallback for interrogation turns
#[derive(Clone)]
pub struct InterrogationChannel {
    gateway: ProviderGateway,
    catalog: Arc<LevelCatalog>,
    offline_fallback: bool,
}

impl InterrogationChannel {
    pub fn new(gateway: ProviderGateway, catalog: Arc<LevelCatalog>) -> Self {
        Self {
            gateway,
            catalog,
            offline_fallback: true,
        }
    }

    /// With the fallback off, a gateway failure is returned as an error.
    pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
        self.offline_fallback = enabled;
        self
    }

    pub async fn send(&self, request: &ChatRequest) -> AppResult<ChatReply> {
        let last_user = request.validate()?;
        let level = self.catalog.get_or_first(&request.level_id);
        let system = interrogation_system_prompt(level, request.current_stress);

        match self
            .gateway
            .complete(&request.messages, Some(&system), CompletionParams::INTERROGATION)
            .await
        {
            Ok((content, log)) => Ok(ChatReply {
                content,
                source: ReplySource::Provider {
                    endpoint: log.successful_endpoint.unwrap_or_default(),
                },
            }),
            Err(e) if !self.offline_fallback => Err(e.into()),
            Err(e) => {
                warn!("[Channel] Falling back to offline responder: {}", e);
                let content = offline_reply(
                    level,
                    &last_user.content,
                    request.intent,
                    request.current_stress,
                )?;
                Ok(ChatReply {
                    content,
                    source: ReplySource::Offline,
                })
            }
        }
    }
}
