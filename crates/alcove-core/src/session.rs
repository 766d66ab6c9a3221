//! Sessions and the user registry.
//!
//! A [`Session`](crate::models::Session) is an explicit value handed to
//! whatever needs it; nothing reads ambient global state. The storage
//! behind sessions is behind the [`SessionStore`] trait so callers inject
//! it like any other collaborator.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use alcove_shared::security::{generate_session_token, validate_display_name};
use alcove_shared::time::now_millis;
use alcove_shared::{GroupName, SessionId, UserId};
use alcove_store::{paths, DocumentStore};

use crate::chat::Chat;
use crate::error::{ChatError, Result};
use crate::models::{RegisteredUser, Session};

/// Persistence seam for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session; absent is `Ok(None)`.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>>;
    async fn save(&self, session: &Session) -> Result<()>;
    /// Remove a session; removing an absent one is not an error.
    async fn clear(&self, id: &SessionId) -> Result<()>;
}

/// [`SessionStore`] backed by the document database (`sessions/<sid>`).
#[derive(Clone)]
pub struct DocumentSessionStore {
    store: Arc<dyn DocumentStore>,
}

impl DocumentSessionStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionStore for DocumentSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        let doc = self.store.get(&paths::session_doc(id)).await?;
        match doc {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.store
            .put(
                &paths::session_doc(&session.session_id),
                serde_json::to_value(session)?,
                false,
            )
            .await?;
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<()> {
        self.store.del(&paths::session_doc(id)).await?;
        Ok(())
    }
}

impl Chat {
    /// Register a display name and get a fresh user id for it.
    pub async fn register_user(&self, display_name: &str) -> Result<RegisteredUser> {
        if !validate_display_name(display_name) {
            return Err(ChatError::InvalidDisplayName(display_name.to_string()));
        }
        let user = RegisteredUser {
            user_id: UserId::generate(),
            display_name: display_name.to_string(),
            registered_at: now_millis(),
        };
        self.store()
            .put(&paths::user_doc(&user.user_id), serde_json::to_value(&user)?, false)
            .await?;
        info!(user = %user.user_id, "user registered");
        Ok(user)
    }

    /// Registry lookup; absent is `Ok(None)`.
    pub async fn registered_user(&self, user_id: &UserId) -> Result<Option<RegisteredUser>> {
        let doc = self.store().get(&paths::user_doc(user_id)).await?;
        match doc {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    /// Join a group: verify the password, register the user, and persist a
    /// session in the injected store.
    pub async fn join_group(
        &self,
        sessions: &dyn SessionStore,
        group: &GroupName,
        password: &str,
        display_name: &str,
    ) -> Result<Session> {
        if !self.verify_group_password(group, password).await? {
            return Err(ChatError::WrongPassword(group.clone()));
        }
        let user = self.register_user(display_name).await?;
        let session = Session {
            session_id: SessionId::new(generate_session_token()),
            user_id: user.user_id,
            display_name: user.display_name,
            group_name: group.clone(),
        };
        sessions.save(&session).await?;
        info!(group = %group, session = %session.session_id, "joined group");
        Ok(session)
    }

    /// Resolve a stored session id back into its session, e.g. when a
    /// client reopens with a remembered id.
    pub async fn resume_session(
        &self,
        sessions: &dyn SessionStore,
        id: &SessionId,
    ) -> Result<Session> {
        sessions
            .load(id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(id.clone()))
    }

    /// Leave a group gracefully: retract presence and clear the session.
    pub async fn leave_group(
        &self,
        sessions: &dyn SessionStore,
        session: &Session,
    ) -> Result<()> {
        self.retract_presence(&session.group_name, &session.user_id)
            .await?;
        sessions.clear(&session.session_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alcove_shared::security::hash_password;
    use alcove_store::MemoryStore;

    use super::*;
    use crate::models::PresenceStatus;

    fn setup() -> (Chat, DocumentSessionStore) {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        (
            Chat::new(store.clone()),
            DocumentSessionStore::new(store),
        )
    }

    #[tokio::test]
    async fn session_round_trip() {
        let (_, sessions) = setup();
        let session = Session {
            session_id: SessionId::new("s1"),
            user_id: UserId("u1".to_string()),
            display_name: "Ada".to_string(),
            group_name: GroupName::new("ops"),
        };
        assert!(sessions.load(&session.session_id).await.unwrap().is_none());

        sessions.save(&session).await.unwrap();
        let loaded = sessions.load(&session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded, session);

        sessions.clear(&session.session_id).await.unwrap();
        assert!(sessions.load(&session.session_id).await.unwrap().is_none());
        // Clearing twice is fine.
        sessions.clear(&session.session_id).await.unwrap();
    }

    #[tokio::test]
    async fn join_requires_the_group_password() {
        let (chat, sessions) = setup();
        let group = GroupName::new("ops");
        chat.create_group(&group, &hash_password("sesame"))
            .await
            .unwrap();

        let err = chat
            .join_group(&sessions, &group, "wrong", "Ada")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::WrongPassword(_)));

        let session = chat
            .join_group(&sessions, &group, "sesame", "Ada")
            .await
            .unwrap();
        assert_eq!(session.group_name, group);
        assert!(sessions.load(&session.session_id).await.unwrap().is_some());

        // The joining user landed in the registry.
        let user = chat
            .registered_user(&session.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.display_name, "Ada");
    }

    #[tokio::test]
    async fn resume_requires_a_live_session() {
        let (chat, sessions) = setup();
        let group = GroupName::new("ops");
        chat.create_group(&group, &hash_password("pw")).await.unwrap();
        let session = chat
            .join_group(&sessions, &group, "pw", "Ada")
            .await
            .unwrap();

        let resumed = chat
            .resume_session(&sessions, &session.session_id)
            .await
            .unwrap();
        assert_eq!(resumed, session);

        sessions.clear(&session.session_id).await.unwrap();
        let err = chat
            .resume_session(&sessions, &session.session_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn join_rejects_bad_display_names() {
        let (chat, sessions) = setup();
        let group = GroupName::new("ops");
        chat.create_group(&group, &hash_password("pw")).await.unwrap();

        let err = chat
            .join_group(&sessions, &group, "pw", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidDisplayName(_)));
    }

    #[tokio::test]
    async fn leave_retracts_presence_and_clears_session() {
        let (chat, sessions) = setup();
        let group = GroupName::new("ops");
        chat.create_group(&group, &hash_password("pw")).await.unwrap();
        let session = chat
            .join_group(&sessions, &group, "pw", "Ada")
            .await
            .unwrap();
        chat.announce_presence(&group, &session.user_id, "Ada", PresenceStatus::Online)
            .await
            .unwrap();

        chat.leave_group(&sessions, &session).await.unwrap();

        let mut watch = chat.observe_presence(&group).await.unwrap();
        assert!(watch.recv().await.unwrap().is_empty());
        assert!(sessions.load(&session.session_id).await.unwrap().is_none());
    }
}
