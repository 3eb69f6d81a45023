use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::timer::frames;

/// Timing and rule settings of a playfield.
///
/// Missing fields take their default when deserializing, so a config file only
/// needs to name what it changes.
///
/// # Example
///
/// ```
/// use blockfall_engine::{WellConfig, frames};
///
/// let config: WellConfig =
///     serde_json::from_str(r#"{ "lock_infinity": false }"#).unwrap();
/// assert!(!config.lock_infinity);
/// assert_eq!(config.lock_delay, frames(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellConfig {
    /// Time between gravity steps. Never faster than 20G.
    pub gravity_delay: Duration,
    /// Horizontal auto-repeat delay before turbo kicks in.
    pub das_normal_delay: Duration,
    pub das_turbo_delay: Duration,
    pub rotation_delay: Duration,
    pub lock_delay: Duration,
    /// Moving or rotating a grounded piece restarts its lock delay.
    pub lock_infinity: bool,
    /// Hard drop locks right away instead of waiting for lock delay.
    pub harddrop_locks_instantly: bool,
    pub preview_count: usize,
}

impl Default for WellConfig {
    fn default() -> Self {
        Self {
            gravity_delay: frames(64),
            das_normal_delay: frames(14),
            das_turbo_delay: frames(4),
            rotation_delay: frames(12),
            lock_delay: frames(30),
            lock_infinity: true,
            harddrop_locks_instantly: true,
            preview_count: 5,
        }
    }
}
