//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use presence::PresenceConfig;
use scoring::ScoringPolicy;

/// Assessment session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Total time allowed for the attempt (seconds)
    pub time_limit_secs: u64,

    /// Grading policy applied at submission
    pub scoring: ScoringPolicy,

    /// Refuse user submission while questions are unanswered.
    /// Forced terminations (timeout, absence, hidden page) ignore this.
    pub require_complete: bool,

    /// Presence monitor settings
    pub presence: PresenceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 45 * 60,
            scoring: ScoringPolicy::default(),
            require_complete: false,
            presence: PresenceConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}
