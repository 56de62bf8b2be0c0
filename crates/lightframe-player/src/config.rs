//! Tunables for the playback binder and the lifecycle coordinator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Playback binder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Idle time after the last pointer movement before controls hide.
    pub controls_idle_hide_ms: u64,
    /// Arrow-key seek step on the progress control.
    pub progress_seek_step_secs: f64,
    /// Arrow-key seek step on the video element.
    pub video_seek_step_secs: f64,
    /// Volumes below this show the "low" icon.
    pub low_volume_threshold: f64,
    /// Delay between inserting video markup and wiring it.
    pub wiring_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            controls_idle_hide_ms: 3000,
            progress_seek_step_secs: 5.0,
            video_seek_step_secs: 10.0,
            low_volume_threshold: 0.5,
            wiring_delay_ms: 500,
        }
    }
}

impl PlayerConfig {
    pub fn idle_hide_delay(&self) -> Duration {
        Duration::from_millis(self.controls_idle_hide_ms)
    }

    pub fn wiring_delay(&self) -> Duration {
        Duration::from_millis(self.wiring_delay_ms)
    }
}

/// Lifecycle coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Drop every pending timer on unload-type signals.
    pub cancel_timers_on_unload: bool,
    /// Pause media and detach its source on teardown.
    pub release_media: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            cancel_timers_on_unload: true,
            release_media: true,
        }
    }
}
