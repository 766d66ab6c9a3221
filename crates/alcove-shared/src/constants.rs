use std::time::Duration;

/// Interval between presence heartbeat writes while a user is in a group.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Age after which a presence record no longer counts as "currently in the
/// group". Single canonical threshold shared by every reader, including the
/// admin monitor.
pub const PRESENCE_STALE_MS: i64 = 120_000;

/// A user seen within this window is shown as online.
pub const ONLINE_WINDOW_MS: i64 = 60_000;

/// A user seen within this window (but outside the online window) is away;
/// older than this is offline.
pub const AWAY_WINDOW_MS: i64 = 300_000;

/// Idle time after the last keystroke before the typing record is cleared.
pub const TYPING_IDLE: Duration = Duration::from_secs(2);

/// Age after which a typing record from an abruptly-terminated session is
/// ignored by readers. Writers normally delete their own record long before
/// this elapses.
pub const TYPING_STALE_MS: i64 = 10_000;

/// Grace period after sending during which a message shows "sending",
/// masking push latency.
pub const SENDING_GRACE_MS: i64 = 2_000;

/// A message older than this with no readers is assumed delivered.
pub const DELIVERED_AFTER_MS: i64 = 5_000;

/// Group names: 1..=50 chars, alphanumerics, spaces, `-`, `_`.
pub const MAX_GROUP_NAME_LEN: usize = 50;

/// Display names: 1..=30 chars, anything printable.
pub const MAX_DISPLAY_NAME_LEN: usize = 30;

/// Rate limiting for gated actions (join attempts, admin login).
pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 5;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
