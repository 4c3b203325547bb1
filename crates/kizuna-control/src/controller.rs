// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! The quality ladder state machine.
//!
//! Automatic changes only move down, one rung per trigger, and share a single
//! cooldown window. Manual changes may jump to any rung.

use crate::analysis::{MemoryPressure, QualityAnalysis};
use crate::config::QualityConfig;
use kizuna_core::{AnimationError, QualityLevel, QualityProfile};
use kizuna_telemetry::PerformanceSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the controller decided after a memory sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryAction {
    /// Nothing to do.
    None,
    /// Drop caches and old samples. The profile is unchanged.
    Cleanup {
        /// The ratio that triggered the cleanup.
        ratio: f32,
    },
    /// Drop caches and apply a reduced profile.
    Reduce {
        /// The ratio that triggered the reduction.
        ratio: f32,
        /// The profile to push to every subsystem.
        profile: QualityProfile,
    },
}

/// Figures exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Tier computed at start-up.
    pub device_tier: QualityLevel,
    /// Active ladder level.
    pub quality_level: QualityLevel,
    /// Active blend loop cadence.
    pub target_fps: u32,
    /// Average frame rate over the frame window.
    pub avg_fps: f32,
    /// Latest memory reading, in MB.
    pub current_memory_mb: f32,
    /// Mean of the memory window, in MB.
    pub avg_memory_mb: f32,
}

/// Single writer of the active [`QualityProfile`].
#[derive(Debug, Clone)]
pub struct QualityController {
    config: QualityConfig,
    profile: QualityProfile,
    device_tier: QualityLevel,
    optimization_enabled: bool,
    last_adjustment: Option<Duration>,
    preference: Option<QualityLevel>,
}

impl QualityController {
    /// Starts at the configured level, or at the device tier if none is set.
    pub fn new(config: QualityConfig, device_tier: QualityLevel) -> Self {
        let level = config.initial_level.unwrap_or(device_tier);
        log::info!(
            "QualityController: starting at {} (device tier {})",
            level,
            device_tier
        );
        Self {
            optimization_enabled: config.optimization_enabled,
            preference: config.initial_level,
            profile: QualityProfile::for_level(level),
            config,
            device_tier,
            last_adjustment: None,
        }
    }

    /// The active profile.
    pub fn profile(&self) -> QualityProfile {
        self.profile
    }

    /// The active ladder level.
    pub fn level(&self) -> QualityLevel {
        self.profile.level
    }

    /// Tier the device was classified as.
    pub fn device_tier(&self) -> QualityLevel {
        self.device_tier
    }

    /// The level last chosen by hand, for the settings collaborator to persist.
    pub fn preference(&self) -> Option<QualityLevel> {
        self.preference
    }

    /// Whether automatic adaptation is on.
    pub fn optimization_enabled(&self) -> bool {
        self.optimization_enabled
    }

    /// The controller's configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Turns automatic adaptation on or off.
    pub fn set_optimization_enabled(&mut self, enabled: bool) {
        if self.optimization_enabled != enabled {
            log::info!(
                "QualityController: automatic optimization {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.optimization_enabled = enabled;
    }

    /// Returns `true` once the cooldown since the last adjustment has elapsed.
    pub fn cooldown_ready(&self, now: Duration) -> bool {
        // An unrepresentable cooldown never elapses.
        let cooldown = Duration::try_from_secs_f32(self.config.cooldown_secs.max(0.0))
            .unwrap_or(Duration::MAX);
        self.last_adjustment
            .is_none_or(|last| now.saturating_sub(last) >= cooldown)
    }

    /// Feeds an average FPS reading. Returns the new profile on a downgrade.
    pub fn on_fps_sample(
        &mut self,
        average_fps: f32,
        samples: usize,
        now: Duration,
    ) -> Option<QualityProfile> {
        if !self.optimization_enabled || samples < self.config.min_fps_samples {
            return None;
        }
        let minimum = QualityAnalysis::minimum_fps(&self.profile, &self.config);
        if average_fps >= minimum {
            return None;
        }
        if !self.cooldown_ready(now) {
            log::debug!(
                "QualityController: low FPS ({:.1}) ignored during cooldown",
                average_fps
            );
            return None;
        }
        let Some(profile) = self.profile.downgraded() else {
            log::debug!("QualityController: already at the lowest level");
            return None;
        };

        log::info!(
            "QualityController: avg FPS {:.1} < {:.1}, downgrading {} -> {} ({} FPS)",
            average_fps,
            minimum,
            self.profile.level,
            profile.level,
            profile.target_fps
        );
        self.profile = profile;
        self.last_adjustment = Some(now);
        Some(profile)
    }

    /// Feeds a memory ratio (used / budget).
    ///
    /// Above the high-water mark a cleanup is always requested. Above the
    /// critical mark, and once the cooldown allows it, the profile is also
    /// reduced within its level.
    pub fn on_memory_sample(&mut self, ratio: f32, now: Duration) -> MemoryAction {
        match QualityAnalysis::memory_pressure(ratio, &self.config) {
            MemoryPressure::Normal => MemoryAction::None,
            MemoryPressure::High => {
                log::warn!(
                    "QualityController: memory at {:.0}% of budget, requesting cleanup",
                    ratio * 100.0
                );
                MemoryAction::Cleanup { ratio }
            }
            MemoryPressure::Critical => {
                if !self.optimization_enabled || !self.cooldown_ready(now) {
                    return MemoryAction::Cleanup { ratio };
                }
                let mut profile = self.profile;
                if !profile.reduce_for_memory_pressure() {
                    return MemoryAction::Cleanup { ratio };
                }
                log::warn!(
                    "QualityController: memory critical ({:.0}%), texture {:.2} anim {:.2}",
                    ratio * 100.0,
                    profile.texture_res_factor,
                    profile.anim_quality_factor
                );
                self.profile = profile;
                self.last_adjustment = Some(now);
                MemoryAction::Reduce { ratio, profile }
            }
        }
    }

    /// Switches to `level` by hand and remembers it as the user's preference.
    ///
    /// The cooldown restarts so the choice is not overridden immediately.
    pub fn set_level(&mut self, level: QualityLevel, now: Duration) -> QualityProfile {
        log::info!(
            "QualityController: quality set to {} (was {})",
            level,
            self.profile.level
        );
        self.profile = QualityProfile::for_level(level);
        self.preference = Some(level);
        self.last_adjustment = Some(now);
        self.profile
    }

    /// Parses a level tag and applies it. Unknown tags leave the level untouched.
    pub fn set_level_by_name(
        &mut self,
        tag: &str,
        now: Duration,
    ) -> Result<QualityProfile, AnimationError> {
        let level = tag.parse::<QualityLevel>()?;
        Ok(self.set_level(level, now))
    }

    /// Overrides the target FPS of the active profile.
    pub fn set_target_fps(&mut self, fps: u32) -> Result<QualityProfile, AnimationError> {
        self.profile = self.profile.with_target_fps(fps)?;
        log::info!("QualityController: target FPS set to {}", fps);
        Ok(self.profile)
    }

    /// Combines the controller state with monitor figures.
    pub fn stats(&self, snapshot: &PerformanceSnapshot) -> PerformanceStats {
        PerformanceStats {
            device_tier: self.device_tier,
            quality_level: self.profile.level,
            target_fps: self.profile.target_fps,
            avg_fps: snapshot.average_fps,
            current_memory_mb: snapshot.current_memory_mb,
            avg_memory_mb: snapshot.average_memory_mb,
        }
    }

    /// Advice derived from the snapshot and the active profile.
    pub fn recommendations(&self, snapshot: &PerformanceSnapshot) -> Vec<String> {
        QualityAnalysis.recommendations(
            snapshot,
            &self.profile,
            &self.config,
            self.optimization_enabled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn controller() -> QualityController {
        QualityController::new(QualityConfig::default(), QualityLevel::High)
    }

    #[test]
    fn test_initial_level_prefers_config() {
        let config = QualityConfig {
            initial_level: Some(QualityLevel::Low),
            ..Default::default()
        };
        let controller = QualityController::new(config, QualityLevel::High);
        assert_eq!(controller.level(), QualityLevel::Low);
        assert_eq!(controller.preference(), Some(QualityLevel::Low));

        assert_eq!(controller_at_tier(QualityLevel::Medium).level(), QualityLevel::Medium);
    }

    fn controller_at_tier(tier: QualityLevel) -> QualityController {
        QualityController::new(QualityConfig::default(), tier)
    }

    #[test]
    fn test_downgrade_moves_one_step() {
        let mut controller = controller();
        let profile = controller.on_fps_sample(20.0, 30, secs(30)).unwrap();
        assert_eq!(profile.level, QualityLevel::Medium);
        assert_eq!(profile.target_fps, 25);
    }

    #[test]
    fn test_cooldown_blocks_second_trigger() {
        let mut controller = controller();
        assert!(controller.on_fps_sample(10.0, 30, secs(30)).is_some());
        assert!(controller.on_fps_sample(5.0, 30, secs(35)).is_none());
        assert_eq!(controller.level(), QualityLevel::Medium);

        assert!(controller.on_fps_sample(5.0, 30, secs(40)).is_some());
        assert_eq!(controller.level(), QualityLevel::Low);
    }

    #[test]
    fn test_downgrade_stops_at_bottom() {
        let mut controller = controller_at_tier(QualityLevel::UltraLow);
        assert!(controller.on_fps_sample(1.0, 30, secs(100)).is_none());
        assert_eq!(controller.level(), QualityLevel::UltraLow);
    }

    #[test]
    fn test_disabled_optimization_ignores_triggers() {
        let mut controller = controller();
        controller.set_optimization_enabled(false);
        assert!(controller.on_fps_sample(1.0, 30, secs(100)).is_none());
        assert_eq!(controller.on_memory_sample(0.95, secs(100)), MemoryAction::Cleanup { ratio: 0.95 });
        assert_eq!(controller.level(), QualityLevel::High);
    }

    #[test]
    fn test_memory_cleanup_ignores_cooldown() {
        let mut controller = controller();
        controller.on_fps_sample(1.0, 30, secs(100));
        assert_eq!(
            controller.on_memory_sample(0.85, secs(101)),
            MemoryAction::Cleanup { ratio: 0.85 }
        );
        assert_eq!(controller.on_memory_sample(0.5, secs(101)), MemoryAction::None);
    }

    #[test]
    fn test_critical_memory_reduces_within_level() {
        let mut controller = controller();
        let MemoryAction::Reduce { profile, .. } = controller.on_memory_sample(0.95, secs(100))
        else {
            panic!("expected a reduction");
        };
        assert_eq!(profile.level, QualityLevel::High);
        assert!(!profile.physics_enabled);
        assert!(!profile.auto_expression_enabled);
        assert!(profile.texture_res_factor < 1.0);

        // Shares the cooldown with FPS downgrades.
        assert!(controller.on_fps_sample(1.0, 30, secs(105)).is_none());
    }

    #[test]
    fn test_unrepresentable_cooldown_never_elapses() {
        let config = QualityConfig {
            cooldown_secs: 1e20,
            ..QualityConfig::default()
        };
        let mut controller = QualityController::new(config, QualityLevel::High);
        assert!(controller.on_fps_sample(1.0, 30, secs(1)).is_some());
        assert!(!controller.cooldown_ready(Duration::MAX));
        assert!(controller.on_fps_sample(1.0, 30, secs(1_000_000)).is_none());
    }

    #[test]
    fn test_manual_level_and_fps() {
        let mut controller = controller();
        assert!(controller.set_level_by_name("extreme", secs(0)).is_err());
        assert_eq!(controller.level(), QualityLevel::High);
        assert_eq!(controller.preference(), None);

        let profile = controller.set_level_by_name("ultra_low", secs(0)).unwrap();
        assert_eq!(profile.level, QualityLevel::UltraLow);
        assert_eq!(controller.preference(), Some(QualityLevel::UltraLow));

        assert!(controller.set_target_fps(5).is_err());
        assert_eq!(controller.profile().target_fps, 15);
        assert_eq!(controller.set_target_fps(30).map(|p| p.target_fps), Ok(30));
    }
}
