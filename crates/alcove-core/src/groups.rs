//! Group lifecycle: create, list, and password management.

use serde_json::Value;
use tracing::info;

use alcove_shared::security::{validate_group_name, verify_password};
use alcove_shared::time::now_millis;
use alcove_shared::GroupName;
use alcove_store::{paths, Direction};

use crate::chat::Chat;
use crate::error::{ChatError, Result};
use crate::models::Group;

impl Chat {
    /// Create a group. The name is validated (it doubles as a document
    /// key); creating an existing group overwrites it.
    pub async fn create_group(&self, name: &GroupName, password_hash: &str) -> Result<Group> {
        if !validate_group_name(name.as_str()) {
            return Err(ChatError::InvalidGroupName(name.as_str().to_string()));
        }
        let group = Group {
            name: name.clone(),
            password_hash: password_hash.to_string(),
            created_at: now_millis(),
        };
        self.store()
            .put(&paths::group_doc(name), serde_json::to_value(&group)?, false)
            .await?;
        info!(group = %name, "group created");
        Ok(group)
    }

    /// Point read of one group; absent is `Ok(None)`.
    pub async fn group(&self, name: &GroupName) -> Result<Option<Group>> {
        let doc = self.store().get(&paths::group_doc(name)).await?;
        Ok(doc.map(|data| group_from_doc(name.as_str(), &data)))
    }

    /// All groups, oldest first.
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let docs = self
            .store()
            .query(paths::GROUPS, "created_at", Direction::Ascending)
            .await?;
        Ok(docs
            .iter()
            .map(|doc| group_from_doc(&doc.id, &doc.data))
            .collect())
    }

    /// The stored password hash, or `None` for an unknown group.
    pub async fn group_password_hash(&self, name: &GroupName) -> Result<Option<String>> {
        let doc = self.store().get(&paths::group_doc(name)).await?;
        Ok(doc.and_then(|data| {
            data.get("password_hash")
                .and_then(Value::as_str)
                .map(str::to_string)
        }))
    }

    /// Check a candidate password. Unknown group counts as a failed check.
    pub async fn verify_group_password(&self, name: &GroupName, password: &str) -> Result<bool> {
        Ok(self
            .group_password_hash(name)
            .await?
            .map(|hash| verify_password(password, &hash))
            .unwrap_or(false))
    }

    /// Merge-upsert a group's password hash, creating the group document
    /// implicitly when absent.
    pub async fn set_group_password(&self, name: &GroupName, password_hash: &str) -> Result<()> {
        self.store()
            .put(
                &paths::group_doc(name),
                serde_json::json!({ "password_hash": password_hash }),
                true,
            )
            .await?;
        Ok(())
    }

    /// Admin password update: fails with [`ChatError::GroupNotFound`] when
    /// the group does not exist.
    pub async fn update_group_password(
        &self,
        name: &GroupName,
        password_hash: &str,
    ) -> Result<()> {
        if self.group(name).await?.is_none() {
            return Err(ChatError::GroupNotFound(name.clone()));
        }
        self.set_group_password(name, password_hash).await?;
        info!(group = %name, "group password updated");
        Ok(())
    }
}

/// The document key is authoritative for the name; missing fields fall
/// back the same way partially-written documents are tolerated upstream
/// (a merge-created group has only its password hash).
fn group_from_doc(id: &str, data: &Value) -> Group {
    Group {
        name: GroupName::new(id),
        password_hash: data
            .get("password_hash")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        created_at: data
            .get("created_at")
            .and_then(Value::as_i64)
            .unwrap_or_else(now_millis),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alcove_shared::security::hash_password;
    use alcove_store::MemoryStore;

    use super::*;

    fn chat() -> Chat {
        Chat::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_get_list() {
        let chat = chat();
        let name = GroupName::new("ops");
        chat.create_group(&name, &hash_password("pw")).await.unwrap();
        chat.create_group(&GroupName::new("general"), &hash_password("pw2"))
            .await
            .unwrap();

        let fetched = chat.group(&name).await.unwrap().unwrap();
        assert_eq!(fetched.name, name);

        let all = chat.list_groups().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(chat.group(&GroupName::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_names() {
        let chat = chat();
        let err = chat
            .create_group(&GroupName::new("bad/name"), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidGroupName(_)));
    }

    #[tokio::test]
    async fn password_verification() {
        let chat = chat();
        let name = GroupName::new("ops");
        chat.create_group(&name, &hash_password("sesame")).await.unwrap();

        assert!(chat.verify_group_password(&name, "sesame").await.unwrap());
        assert!(!chat.verify_group_password(&name, "mesame").await.unwrap());
        // Unknown group fails the check rather than erroring.
        assert!(!chat
            .verify_group_password(&GroupName::new("nope"), "sesame")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn update_password_requires_existing_group() {
        let chat = chat();
        let err = chat
            .update_group_password(&GroupName::new("nope"), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::GroupNotFound(_)));

        let name = GroupName::new("ops");
        chat.create_group(&name, &hash_password("old")).await.unwrap();
        chat.update_group_password(&name, &hash_password("new"))
            .await
            .unwrap();
        assert!(chat.verify_group_password(&name, "new").await.unwrap());
        assert!(!chat.verify_group_password(&name, "old").await.unwrap());
    }

    #[tokio::test]
    async fn set_password_creates_implicitly() {
        let chat = chat();
        let name = GroupName::new("ops");
        chat.set_group_password(&name, &hash_password("pw"))
            .await
            .unwrap();
        assert!(chat.verify_group_password(&name, "pw").await.unwrap());
    }
}
