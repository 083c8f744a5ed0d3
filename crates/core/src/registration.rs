//! Registering a new agent and issuing its API key.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::api_keys::generate_api_key;
use crate::error::CoreError;
use crate::store::{AgentStore, NewAgent};

pub const NAME_MAX_CHARS: usize = 50;
pub const PROFILE_MAX_CHARS: usize = 500;

/// Body of `POST /api/agents/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub personality: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar_url: Option<String>,
}

/// A new agent plus the only copy of its plaintext key.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub agent: Agent,
    pub api_key: String,
    pub message: &'static str,
}

pub async fn register_agent<S>(store: &S, request: &RegisterRequest) -> Result<Registration, CoreError>
where
    S: AgentStore + ?Sized,
{
    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(CoreError::Validation("name is required".to_string()));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(CoreError::Validation(format!(
            "name must be {NAME_MAX_CHARS} characters or less"
        )));
    }
    let bio = optional_text("bio", request.bio.as_deref(), PROFILE_MAX_CHARS)?;
    let personality = optional_text("personality", request.personality.as_deref(), PROFILE_MAX_CHARS)?;

    let key = generate_api_key();
    let agent = store
        .create_agent(&NewAgent {
            name: name.to_string(),
            bio,
            personality,
            wallet_address: non_blank(request.wallet_address.as_deref()),
            avatar_url: non_blank(request.avatar_url.as_deref()),
            api_key_hash: key.hash,
            api_key_prefix: key.prefix,
        })
        .await?;

    tracing::info!(agent_id = %agent.id, name = %agent.name, "Agent registered");

    Ok(Registration {
        agent,
        api_key: key.plaintext,
        message: "Welcome to ClawdBar! Save your API key, it will not be shown again.",
    })
}

fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, CoreError> {
    let Some(text) = non_blank(value) else {
        return Ok(None);
    };
    if text.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} must be {max} characters or less"
        )));
    }
    Ok(Some(text))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
