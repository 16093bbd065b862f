//! Device capability tiers and event throttling.
//!
//! Classifies the visitor's device from what the browser reports and decides
//! how much animation it gets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Viewport width below which the layout is considered mobile.
pub const MOBILE_BREAKPOINT: u32 = 768;

/// Below this many GB of device memory a device counts as low-end.
pub const LOW_MEMORY_GB: f32 = 4.0;

/// What the host knows about the visitor's device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Logical CPU count (`navigator.hardwareConcurrency`).
    pub hardware_concurrency: u32,
    /// Unmasked WebGL renderer string, empty if unknown.
    pub renderer: String,
    /// Whether a WebGL context could be created.
    pub has_webgl: bool,
    /// `navigator.deviceMemory`, if exposed.
    pub device_memory_gb: Option<f32>,
    /// `navigator.connection.effectiveType`, if exposed.
    pub effective_connection_type: Option<String>,
    /// Viewport width in CSS pixels.
    pub viewport_width: u32,
    /// `prefers-reduced-motion: reduce`.
    pub prefers_reduced_motion: bool,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            hardware_concurrency: 8,
            renderer: String::from("ANGLE (NVIDIA GeForce)"),
            has_webgl: true,
            device_memory_gb: Some(8.0),
            effective_connection_type: Some(String::from("4g")),
            viewport_width: 1440,
            prefers_reduced_motion: false,
        }
    }
}

impl DeviceProfile {
    /// Tier for this device.
    #[must_use]
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::classify(self)
    }

    /// Checks whether the device should get reduced effects.
    ///
    /// True for the low tier, 2g connections, and less than
    /// [`LOW_MEMORY_GB`] of memory.
    #[must_use]
    pub fn is_low_end(&self) -> bool {
        self.tier() == PerformanceTier::Low
            || self.effective_connection_type.as_deref() == Some("2g")
            || self.device_memory_gb.is_some_and(|gb| gb < LOW_MEMORY_GB)
    }

    /// Checks whether the viewport is below the mobile breakpoint.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.viewport_width < MOBILE_BREAKPOINT
    }

    /// Checks whether animated overlays should run at all.
    #[must_use]
    pub fn allows_animation(&self) -> bool {
        !self.prefers_reduced_motion && !self.is_low_end()
    }
}

/// Coarse device capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    /// Weak or unknown hardware.
    Low,
    /// Mid-range hardware.
    Medium,
    /// Many cores and a discrete-class GPU.
    High,
}

impl PerformanceTier {
    /// Classifies a device.
    #[must_use]
    pub fn classify(profile: &DeviceProfile) -> Self {
        if !profile.has_webgl {
            return Self::Low;
        }
        let integrated = profile.renderer.to_ascii_lowercase().contains("intel");
        if profile.hardware_concurrency > 4 && !integrated {
            Self::High
        } else if profile.hardware_concurrency > 2 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Particle count for the optimized overlay.
    ///
    /// # Arguments
    /// * `profile` - Device the overlay runs on
    #[must_use]
    pub fn particle_budget(profile: &DeviceProfile) -> usize {
        if profile.is_low_end() {
            15
        } else if profile.is_mobile() {
            25
        } else {
            50
        }
    }
}

/// Admits at most one call per window.
///
/// Time is passed in by the caller (milliseconds since page load in the
/// browser), so the throttle never reads a clock itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    window: Duration,
    last: Option<Duration>,
}

impl Throttle {
    /// Creates a throttle with the given window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Creates a throttle with a window in milliseconds.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Returns true if a call at `now` may run, and records it.
    ///
    /// The first call always runs.
    pub fn admit(&mut self, now: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            },
        }
    }

    /// Forgets the last admitted call.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// The throttle window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}
