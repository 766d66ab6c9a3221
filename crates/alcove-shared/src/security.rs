//! Password hashing, session tokens, input validation, and rate limiting.
//!
//! The group password is a shared room secret, not an account credential;
//! a plain one-shot digest is all the scheme calls for.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::constants::{
    MAX_DISPLAY_NAME_LEN, MAX_GROUP_NAME_LEN, RATE_LIMIT_MAX_ATTEMPTS, RATE_LIMIT_WINDOW,
};

/// Hash a group password to its stored hex form.
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// Constant-format comparison of a candidate password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    hash_password(password) == hash
}

/// Generate a 64-hex-char session token from 32 random bytes.
pub fn generate_session_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Group names are also document keys, so the character set is restricted.
pub fn validate_group_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_GROUP_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_')
}

pub fn validate_display_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_DISPLAY_NAME_LEN
}

/// In-memory sliding-window rate limiter keyed by an arbitrary string
/// (e.g. `"join:<group>"` or `"admin_login"`).
///
/// Client-side only; it throttles a well-behaved UI, nothing more.
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<String, Window>>,
}

struct Window {
    count: u32,
    first_attempt: Instant,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt; returns `false` when the key is over its budget.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut attempts = self.attempts.lock().expect("rate limiter lock poisoned");
        let window = attempts.entry(key.to_string()).or_insert(Window {
            count: 0,
            first_attempt: now,
        });

        if now.duration_since(window.first_attempt) > self.window {
            window.count = 0;
            window.first_attempt = now;
        }

        if window.count >= self.max_attempts {
            return false;
        }
        window.count += 1;
        true
    }

    /// Forget a key entirely (e.g. after a successful login).
    pub fn clear(&self, key: &str) {
        let mut attempts = self.attempts.lock().expect("rate limiter lock poisoned");
        attempts.remove(key);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_MAX_ATTEMPTS, RATE_LIMIT_WINDOW)
    }
}
