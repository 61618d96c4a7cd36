//! Rate limiting for bindings.
//!
//! A binding may carry a [`LimitScope`]; the dispatcher then consults the
//! matching [`RateLimiter`] before running the mid-middlewares and handler.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// What a limiter counts hits against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitScope {
    /// One budget per sender.
    User,
    /// One budget per conversation (group, or the sender in private chats).
    Conversation,
}

impl LimitScope {
    /// Parses a limiter selector from configuration.
    ///
    /// `"user"` selects [`LimitScope::User`], `"group"` selects
    /// [`LimitScope::Conversation`]; everything else means no limiter.
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector {
            "user" => Some(Self::User),
            "group" => Some(Self::Conversation),
            _ => None,
        }
    }

    /// Returns the key an event is counted under.
    pub fn key(&self, event: &Event) -> i64 {
        match self {
            Self::User => event.user_id,
            Self::Conversation => event.conversation_id(),
        }
    }
}

/// Window and budget of one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSettings {
    /// Length of the sliding window in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Hits allowed per key within one window.
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_hits: default_max_hits(),
        }
    }
}

fn default_window_ms() -> u64 {
    5000
}

fn default_max_hits() -> usize {
    1
}

/// Number of recorded checks between sweeps of expired keys.
pub const SWEEP_INTERVAL: usize = 256;

/// Sliding-window limiter keyed by user or conversation id.
///
/// Keys whose hits have all expired are swept every [`SWEEP_INTERVAL`]
/// checks, so the table stays bounded by the ids active within one window.
pub struct RateLimiter {
    window: Duration,
    max_hits: usize,
    state: Mutex<LimiterState>,
}

#[derive(Default)]
struct LimiterState {
    entries: HashMap<i64, Vec<Instant>>,
    checks: usize,
}

impl LimiterState {
    fn sweep(&mut self, now: Instant, window: Duration) {
        self.entries.retain(|_, hits| {
            hits.retain(|&t| now.duration_since(t) < window);
            !hits.is_empty()
        });
    }
}

impl RateLimiter {
    pub fn new(settings: RateSettings) -> Self {
        Self {
            window: Duration::from_millis(settings.window_ms),
            max_hits: settings.max_hits,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Returns `true` if the hit is allowed, `false` if rate-limited.
    /// Records the hit and evicts expired timestamps for this key.
    pub fn check_and_record(&self, key: i64) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();

        state.checks += 1;
        if state.checks >= SWEEP_INTERVAL {
            state.checks = 0;
            state.sweep(now, self.window);
        }

        let hits = state.entries.entry(key).or_default();
        hits.retain(|&t| now.duration_since(t) < self.window);

        if hits.len() >= self.max_hits {
            return false;
        }

        hits.push(now);
        true
    }

    /// Drops keys whose hits have all expired.
    pub fn cleanup(&self) {
        self.state.lock().sweep(Instant::now(), self.window);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.state.lock().entries.len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("window", &self.window)
            .field("max_hits", &self.max_hits)
            .finish()
    }
}

/// The per-user and per-conversation limiters owned by a dispatcher.
#[derive(Debug)]
pub struct Limiters {
    user: RateLimiter,
    conversation: RateLimiter,
}

impl Limiters {
    pub fn new(user: RateSettings, conversation: RateSettings) -> Self {
        Self {
            user: RateLimiter::new(user),
            conversation: RateLimiter::new(conversation),
        }
    }

    /// Records a hit for `event` under `scope`, returning whether it is allowed.
    pub fn check(&self, scope: LimitScope, event: &Event) -> bool {
        let limiter = match scope {
            LimitScope::User => &self.user,
            LimitScope::Conversation => &self.conversation,
        };
        limiter.check_and_record(scope.key(event))
    }

    /// Number of keys tracked across both limiters.
    pub fn tracked_keys(&self) -> usize {
        self.user.tracked_keys() + self.conversation.tracked_keys()
    }

    /// Runs [`RateLimiter::cleanup`] on both limiters.
    pub fn cleanup(&self) {
        self.user.cleanup();
        self.conversation.cleanup();
    }
}

impl Default for Limiters {
    fn default() -> Self {
        Self::new(RateSettings::default(), RateSettings::default())
    }
}
