//! Engine configuration for the coordination core.
//!
//! Configuration is deserialized from a JSON document read through a
//! capability-scoped directory handle, or constructed in code via
//! [`EngineConfig::default`]. All knobs are plain data so services stay
//! deterministic and testable without a live store.

use crate::identity::UserId;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The supplied path had no parent directory or file name component.
    #[error("config path '{0}' cannot be split into directory and file")]
    InvalidPath(String),

    /// The config file could not be opened or read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file was not valid JSON for the expected schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A quiet-hour bound was outside `0..=23`.
    #[error("quiet window hour {0} is outside 0..=23")]
    InvalidQuietHour(u8),
}

/// Local-time window during which outbound delivery is deferred.
///
/// The window may wrap midnight (`start_hour > end_hour`). A window whose
/// bounds are equal is treated as disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietWindow {
    /// First local hour (inclusive) of the quiet window.
    pub start_hour: u8,
    /// Local hour (exclusive) at which delivery resumes.
    pub end_hour: u8,
}

impl QuietWindow {
    /// Returns `true` when the given local hour falls inside the window.
    #[must_use]
    pub const fn contains(self, local_hour: u8) -> bool {
        if self.start_hour == self.end_hour {
            return false;
        }
        if self.start_hour < self.end_hour {
            local_hour >= self.start_hour && local_hour < self.end_hour
        } else {
            local_hour >= self.start_hour || local_hour < self.end_hour
        }
    }

    /// Validates that both bounds are real hours.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidQuietHour`] when either bound is 24
    /// or larger.
    pub const fn validate(self) -> Result<(), ConfigError> {
        if self.start_hour > 23 {
            return Err(ConfigError::InvalidQuietHour(self.start_hour));
        }
        if self.end_hour > 23 {
            return Err(ConfigError::InvalidQuietHour(self.end_hour));
        }
        Ok(())
    }
}

/// Per-user override of the messaging defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOverride {
    /// Overrides the rolling daily unit budget.
    #[serde(default)]
    pub daily_limit: Option<u32>,
    /// Overrides the rolling hourly unit budget.
    #[serde(default)]
    pub hourly_limit: Option<u32>,
    /// Overrides the quiet-hour window.
    #[serde(default)]
    pub quiet_hours: Option<QuietWindow>,
    /// Overrides the user's UTC offset in minutes.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Resolved send policy for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendProfile {
    /// Rolling daily unit budget.
    pub daily_limit: u32,
    /// Rolling hourly unit budget.
    pub hourly_limit: u32,
    /// Quiet-hour window in the user's local time, if any.
    pub quiet_hours: Option<QuietWindow>,
    /// Offset from UTC, in minutes, of the user's local time.
    pub utc_offset_minutes: i32,
}

/// Messaging defaults and per-user overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Default rolling daily unit budget per user.
    pub daily_limit: u32,
    /// Default rolling hourly unit budget per user.
    pub hourly_limit: u32,
    /// Delay before a transiently failed send is retried, in seconds.
    pub retry_delay_secs: u64,
    /// Default quiet-hour window, if any.
    pub quiet_hours: Option<QuietWindow>,
    /// Default UTC offset in minutes for users without an override.
    pub utc_offset_minutes: i32,
    /// Per-user overrides keyed by user identifier.
    pub overrides: HashMap<UserId, SendOverride>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            daily_limit: 5,
            hourly_limit: 2,
            retry_delay_secs: 300,
            quiet_hours: Some(QuietWindow {
                start_hour: 21,
                end_hour: 8,
            }),
            utc_offset_minutes: 0,
            overrides: HashMap::new(),
        }
    }
}

impl MessagingConfig {
    /// Resolves the effective send profile for a user.
    #[must_use]
    pub fn profile_for(&self, user_id: UserId) -> SendProfile {
        let overrides = self.overrides.get(&user_id);
        SendProfile {
            daily_limit: overrides
                .and_then(|o| o.daily_limit)
                .unwrap_or(self.daily_limit),
            hourly_limit: overrides
                .and_then(|o| o.hourly_limit)
                .unwrap_or(self.hourly_limit),
            quiet_hours: overrides
                .and_then(|o| o.quiet_hours)
                .or(self.quiet_hours),
            utc_offset_minutes: overrides
                .and_then(|o| o.utc_offset_minutes)
                .unwrap_or(self.utc_offset_minutes),
        }
    }
}

/// Task queue dispatch and retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskQueueConfig {
    /// Maximum tasks claimed per dispatch batch.
    pub dispatch_limit: u32,
    /// Retry ceiling applied to tasks enqueued without an explicit limit.
    pub default_max_retries: u32,
    /// First retry delay, in seconds; later retries double this.
    pub base_backoff_secs: u64,
    /// Upper bound on any single retry delay, in seconds.
    pub max_backoff_secs: u64,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            dispatch_limit: 25,
            default_max_retries: 3,
            base_backoff_secs: 30,
            max_backoff_secs: 3600,
        }
    }
}

impl TaskQueueConfig {
    /// Returns the backoff delay for the given retry ordinal, capped at
    /// [`Self::max_backoff_secs`].
    #[must_use]
    pub const fn backoff_secs(&self, retry_count: u32) -> u64 {
        let shift = if retry_count >= 32 { 32 } else { retry_count };
        let doubled = self.base_backoff_secs.saturating_mul(1_u64 << shift);
        if doubled > self.max_backoff_secs {
            self.max_backoff_secs
        } else {
            doubled
        }
    }
}

/// Saga bounty and grace-period settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SagaConfig {
    /// Bounty credited for a completed introduction when no override
    /// applies, in credit units.
    pub default_bounty: i64,
    /// Configured rate per solution-provider account, keyed by the
    /// provider's user identifier. Looked up once, at offer creation.
    pub provider_rates: HashMap<UserId, i64>,
    /// How long an opportunity stays open before expiry, in seconds.
    pub opportunity_ttl_secs: u64,
    /// How long an offer waits for the introducee before expiry, in
    /// seconds.
    pub offer_response_ttl_secs: u64,
    /// Grace period after introducee acceptance before the single
    /// connector reminder is due, in seconds.
    pub confirmation_grace_secs: u64,
    /// Additional grace period after the reminder before an unconfirmed
    /// offer expires, in seconds.
    pub confirmation_final_grace_secs: u64,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            default_bounty: 25,
            provider_rates: HashMap::new(),
            opportunity_ttl_secs: 14 * 24 * 60 * 60,
            offer_response_ttl_secs: 7 * 24 * 60 * 60,
            confirmation_grace_secs: 2 * 24 * 60 * 60,
            confirmation_final_grace_secs: 3 * 24 * 60 * 60,
        }
    }
}

impl SagaConfig {
    /// Returns the bounty for an offer aimed at the given recipient,
    /// honouring solution-provider rate overrides.
    #[must_use]
    pub fn bounty_for_recipient(&self, recipient: UserId) -> i64 {
        self.provider_rates
            .get(&recipient)
            .copied()
            .unwrap_or(self.default_bounty)
    }
}

/// Polling cadence for dispatcher loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Base poll interval, in seconds.
    pub poll_interval_secs: u64,
    /// Maximum random jitter added to each interval, in seconds.
    pub jitter_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            jitter_secs: 5,
        }
    }
}

/// Root configuration for the coordination engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Task queue settings.
    pub task_queue: TaskQueueConfig,
    /// Message orchestrator settings.
    pub messaging: MessagingConfig,
    /// Introduction saga settings.
    pub saga: SagaConfig,
    /// Dispatcher polling settings.
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Loads configuration from a JSON file.
    ///
    /// The parent directory is opened as a capability handle; only the
    /// named file is readable through it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path cannot be split, the file
    /// cannot be read, the JSON is malformed, or validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let invalid = || ConfigError::InvalidPath(path.display().to_string());
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(invalid)?;
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let parent_dir = parent.to_str().ok_or_else(invalid)?;

        let dir = Dir::open_ambient_dir(parent_dir, ambient_authority())?;
        let contents = dir.read_to_string(file_name)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a quiet window carries an impossible
    /// hour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(window) = self.messaging.quiet_hours {
            window.validate()?;
        }
        for override_entry in self.messaging.overrides.values() {
            if let Some(window) = override_entry.quiet_hours {
                window.validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, MessagingConfig, QuietWindow, SendOverride};
    use crate::identity::UserId;

    #[test]
    fn quiet_window_handles_midnight_wrap() {
        let window = QuietWindow {
            start_hour: 21,
            end_hour: 8,
        };
        assert!(window.contains(23));
        assert!(window.contains(3));
        assert!(!window.contains(12));
    }

    #[test]
    fn quiet_window_with_equal_bounds_is_disabled() {
        let window = QuietWindow {
            start_hour: 9,
            end_hour: 9,
        };
        assert!(!window.contains(9));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = super::TaskQueueConfig {
            base_backoff_secs: 30,
            max_backoff_secs: 100,
            ..super::TaskQueueConfig::default()
        };
        assert_eq!(config.backoff_secs(0), 30);
        assert_eq!(config.backoff_secs(1), 60);
        assert_eq!(config.backoff_secs(2), 100);
        assert_eq!(config.backoff_secs(63), 100);
    }

    #[test]
    fn profile_resolution_prefers_overrides() {
        let user = UserId::new();
        let mut messaging = MessagingConfig::default();
        messaging.overrides.insert(
            user,
            SendOverride {
                daily_limit: Some(10),
                ..SendOverride::default()
            },
        );

        let profile = messaging.profile_for(user);
        assert_eq!(profile.daily_limit, 10);
        assert_eq!(profile.hourly_limit, messaging.hourly_limit);

        let other = messaging.profile_for(UserId::new());
        assert_eq!(other.daily_limit, messaging.daily_limit);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::default();
        let encoded = serde_json::to_string(&config).expect("config serializes");
        let decoded: EngineConfig = serde_json::from_str(&encoded).expect("config parses");
        assert_eq!(decoded, config);
    }

    #[test]
    fn provider_rate_overrides_default_bounty() {
        let provider = UserId::new();
        let mut saga = super::SagaConfig::default();
        saga.provider_rates.insert(provider, 80);
        assert_eq!(saga.bounty_for_recipient(provider), 80);
        assert_eq!(saga.bounty_for_recipient(UserId::new()), saga.default_bounty);
    }
}
