//! Message creation and retrieval.

use tracing::{info, warn};
use uuid::Uuid;

use alcove_shared::time::now_millis;
use alcove_shared::{GroupName, MessageId, UserId};
use alcove_store::{paths, Direction, Document};

use crate::chat::Chat;
use crate::error::Result;
use crate::models::{Message, MessageBody};
use crate::watch::Watch;

/// Live, send-time-ordered view of a group's messages.
pub type MessageWatch = Watch<Vec<Message>>;

impl Chat {
    /// Create a message in a group. The message is immutable after this
    /// except for read-receipt growth.
    pub async fn send_message(
        &self,
        group: &GroupName,
        user_id: &UserId,
        user_name: &str,
        body: MessageBody,
    ) -> Result<Message> {
        let message = Message {
            id: MessageId::new(),
            user_id: user_id.clone(),
            user_name: user_name.to_string(),
            sent_at: now_millis(),
            body,
            read_by: Vec::new(),
            read_by_timestamps: Default::default(),
        };
        self.store()
            .put(
                &paths::message_doc(group, &message.id),
                serde_json::to_value(&message)?,
                false,
            )
            .await?;
        info!(group = %group, id = %message.id, "message sent");
        Ok(message)
    }

    /// One-shot fetch of a group's messages, oldest first (display order).
    pub async fn messages(&self, group: &GroupName) -> Result<Vec<Message>> {
        let docs = self
            .store()
            .query(&paths::messages(group), "sent_at", Direction::Ascending)
            .await?;
        Ok(parse_messages(&docs))
    }

    /// Watch a group's messages, oldest first.
    pub async fn observe_messages(&self, group: &GroupName) -> Result<MessageWatch> {
        let sub = self.store().subscribe(&paths::messages(group)).await?;
        Ok(Watch::spawn(sub, |docs| {
            let mut messages = parse_messages(&docs);
            messages.sort_by_key(|m| m.sent_at);
            messages
        }))
    }
}

pub(crate) fn parse_messages(docs: &[Document]) -> Vec<Message> {
    docs.iter().filter_map(parse_message).collect()
}

fn parse_message(doc: &Document) -> Option<Message> {
    let mut message: Message = match serde_json::from_value(doc.data.clone()) {
        Ok(m) => m,
        Err(e) => {
            warn!(doc = %doc.id, error = %e, "skipping malformed message");
            return None;
        }
    };
    // The document key is authoritative for the id.
    if let Ok(id) = Uuid::parse_str(&doc.id) {
        message.id = MessageId(id);
    }
    Some(message)
}
