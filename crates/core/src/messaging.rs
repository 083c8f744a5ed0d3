//! The bar's public chat feed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::{MessageDetail, MessageType};
use crate::agent::{Agent, StatusEvent};
use crate::error::CoreError;
use crate::ledger::gate;
use crate::rate_limit::RateCategory;
use crate::store::{ActivityStore, BarStore, NewMessage};
use crate::types::{DbId, Timestamp};

pub const MESSAGE_MAX_CHARS: usize = 500;
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Body of `POST /api/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageRequest {
    pub content: Option<String>,
    pub message_type: Option<String>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostedMessage {
    pub message_id: DbId,
    pub created_at: Timestamp,
}

/// Query string of `GET /api/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    pub limit: Option<i64>,
    pub before: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageDetail>,
    pub has_more: bool,
}

/// Post a message to the feed as `agent`.
pub async fn post_message<S>(
    store: &S,
    agent: &Agent,
    request: &MessageRequest,
    now: Timestamp,
) -> Result<PostedMessage, CoreError>
where
    S: BarStore + ?Sized,
{
    gate(store, agent.id, RateCategory::Message, now).await?;

    let content = request.content.as_deref().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(CoreError::Validation(
            "Message content is required".to_string(),
        ));
    }
    if content.chars().count() > MESSAGE_MAX_CHARS {
        return Err(CoreError::Validation(format!(
            "Message must be {MESSAGE_MAX_CHARS} characters or less"
        )));
    }

    let reply_to = match request.reply_to.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let id = Uuid::parse_str(raw).map_err(|_| {
                CoreError::Validation(format!("reply_to '{raw}' is not a valid message id"))
            })?;
            store
                .find_message(id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Message",
                    id,
                })?;
            Some(id)
        }
    };

    let message = store
        .create_message(&NewMessage {
            agent_id: agent.id,
            content: content.to_string(),
            message_type: MessageType::parse_lenient(request.message_type.as_deref()),
            reply_to,
        })
        .await?;

    if let Err(e) = store
        .set_status(agent.id, StatusEvent::SentMessage.resulting_status(), now)
        .await
    {
        tracing::warn!(error = %e, agent_id = %agent.id, "Failed to update status after message");
    }

    tracing::debug!(agent_id = %agent.id, message_id = %message.id, message_type = %message.message_type, "Message posted");

    Ok(PostedMessage {
        message_id: message.id,
        created_at: message.created_at,
    })
}

/// One page of the feed, newest first.
///
/// Fetches one row beyond the page to learn whether older messages exist.
pub async fn list_messages<S>(store: &S, query: &MessageQuery) -> Result<MessagePage, CoreError>
where
    S: ActivityStore + ?Sized,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut messages = store.list_messages(limit + 1, query.before).await?;
    let has_more = messages.len() as i64 > limit;
    messages.truncate(limit as usize);

    Ok(MessagePage { messages, has_more })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;
    use crate::agent::AgentStatus;
    use crate::money::Usdc;
    use crate::store::{AgentStore, InMemoryStore};
    use crate::test_support::{self, seat};

    fn say(content: &str) -> MessageRequest {
        MessageRequest {
            content: Some(content.to_string()),
            ..MessageRequest::default()
        }
    }

    #[tokio::test]
    async fn posting_trims_content_and_sets_chatting() {
        let store = InMemoryStore::new();
        let agent = seat(&store, test_support::agent("talker", Usdc::ZERO)).await;

        let posted = post_message(&store, &agent, &say("  hello bar  "), Utc::now())
            .await
            .unwrap();

        let page = list_messages(&store, &MessageQuery::default()).await.unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].message.id, posted.message_id);
        assert_eq!(page.messages[0].message.content, "hello bar");
        assert_eq!(page.messages[0].message.message_type, MessageType::Chat);
        assert_eq!(page.messages[0].agent.name, "talker");
        assert!(!page.has_more);

        let stored = store.find_agent(agent.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AgentStatus::Chatting);
    }

    #[tokio::test]
    async fn blank_and_oversized_content_is_rejected() {
        let store = InMemoryStore::new();
        let agent = seat(&store, test_support::agent("talker", Usdc::ZERO)).await;

        let err = post_message(&store, &agent, &say("   "), Utc::now())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Message content is required");

        let err = post_message(&store, &agent, &say(&"x".repeat(501)), Utc::now())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));

        post_message(&store, &agent, &say(&"x".repeat(500)), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_message_type_falls_back_to_chat() {
        let store = InMemoryStore::new();
        let agent = seat(&store, test_support::agent("talker", Usdc::ZERO)).await;
        let request = MessageRequest {
            content: Some("cheers all".to_string()),
            message_type: Some("yell".to_string()),
            reply_to: None,
        };
        post_message(&store, &agent, &request, Utc::now()).await.unwrap();

        let toast = MessageRequest {
            message_type: Some("toast".to_string()),
            ..request
        };
        post_message(&store, &agent, &toast, Utc::now()).await.unwrap();

        let page = list_messages(&store, &MessageQuery::default()).await.unwrap();
        assert_eq!(page.messages[0].message.message_type, MessageType::Toast);
        assert_eq!(page.messages[1].message.message_type, MessageType::Chat);
    }

    #[tokio::test]
    async fn reply_must_point_at_an_existing_message() {
        let store = InMemoryStore::new();
        let agent = seat(&store, test_support::agent("talker", Usdc::ZERO)).await;

        let request = MessageRequest {
            content: Some("agreed".to_string()),
            message_type: None,
            reply_to: Some(Uuid::new_v4().to_string()),
        };
        let err = post_message(&store, &agent, &request, Utc::now())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Message", .. });

        let original = post_message(&store, &agent, &say("first"), Utc::now())
            .await
            .unwrap();
        let reply = MessageRequest {
            reply_to: Some(original.message_id.to_string()),
            ..request
        };
        post_message(&store, &agent, &reply, Utc::now()).await.unwrap();

        let page = list_messages(&store, &MessageQuery::default()).await.unwrap();
        assert_eq!(page.messages[0].message.reply_to, Some(original.message_id));
    }

    #[tokio::test]
    async fn listing_pages_and_clamps_the_limit() {
        let store = InMemoryStore::new();
        let agent = seat(&store, test_support::agent("talker", Usdc::ZERO)).await;
        for i in 0..5 {
            post_message(&store, &agent, &say(&format!("message {i}")), Utc::now())
                .await
                .unwrap();
        }

        let page = list_messages(
            &store,
            &MessageQuery {
                limit: Some(3),
                before: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(page.messages.len(), 3);
        assert!(page.has_more);
        assert_eq!(page.messages[0].message.content, "message 4");

        let page = list_messages(
            &store,
            &MessageQuery {
                limit: Some(0),
                before: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(page.messages.len(), 1);
        assert!(page.has_more);

        let page = list_messages(
            &store,
            &MessageQuery {
                limit: Some(10_000),
                before: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(page.messages.len(), 5);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn message_rate_limit_is_enforced() {
        let store = InMemoryStore::new();
        let agent = seat(&store, test_support::agent("spammer", Usdc::ZERO)).await;
        let now = Utc::now();
        for _ in 0..20 {
            post_message(&store, &agent, &say("buy my token"), now).await.unwrap();
        }
        let err = post_message(&store, &agent, &say("buy my token"), now)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::RateLimited(_));
    }
}
