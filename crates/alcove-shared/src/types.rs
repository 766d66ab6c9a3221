use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier.
///
/// Generated client-side on registration; there is no account system, so
/// the id doubles as the presence/typing document key within a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a fresh id of the form `user_<epoch-millis>_<9 rand chars>`.
    pub fn generate() -> Self {
        let millis = crate::time::now_millis();
        let suffix: String = {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            (0..9)
                .map(|_| {
                    let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";
                    chars[rng.gen_range(0..chars.len())] as char
                })
                .collect()
        };
        Self(format!("user_{millis}_{suffix}"))
    }

    /// Truncated, anonymized form for display when no profile is known.
    ///
    /// Strips the `user_<millis>_` prefix when present and keeps at most
    /// eight characters of what remains.
    pub fn short(&self) -> String {
        let tail = self
            .0
            .strip_prefix("user_")
            .and_then(|rest| rest.split_once('_').map(|(_, t)| t))
            .unwrap_or(&self.0);
        tail.chars().take(8).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group's name, which is also its document key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GroupName(pub String);

impl GroupName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique message identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier handed to a client when it joins a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_user_ids_are_unique() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
        assert!(a.0.starts_with("user_"));
    }

    #[test]
    fn short_strips_prefix_and_truncates() {
        let id = UserId("user_1700000000000_abcdefghijkl".to_string());
        assert_eq!(id.short(), "abcdefgh");
    }

    #[test]
    fn short_falls_back_to_raw_id() {
        let id = UserId("anonymous".to_string());
        assert_eq!(id.short(), "anonymou");
    }
}
