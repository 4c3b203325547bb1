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


//! Session configuration, loadable from JSON.

use anyhow::{ensure, Context, Result};
use kizuna_animation::{AnimationConfig, MAX_TIMER_SECS};
use kizuna_control::QualityConfig;
use serde::{Deserialize, Serialize};

/// Sampling cadences of the performance tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Interval between two FPS evaluations, in milliseconds.
    pub fps_sample_interval_ms: u64,
    /// Interval between two memory readings, in milliseconds.
    pub memory_sample_interval_ms: u64,
    /// Denominator of the memory ratio, compared against the process RSS.
    ///
    /// `None` uses [`DEFAULT_MEMORY_BUDGET_MB`](kizuna_telemetry::DEFAULT_MEMORY_BUDGET_MB),
    /// capped at the device's total RAM. Hosts with a known footprint should set it.
    pub memory_budget_mb: Option<f32>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            fps_sample_interval_ms: 1000,
            memory_sample_interval_ms: 5000,
            memory_budget_mb: None,
        }
    }
}

/// Everything needed to build a [`Companion`](crate::Companion).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Blending speeds and auto-behavior timers.
    pub animation: AnimationConfig,
    /// Sampling cadences.
    pub performance: PerformanceConfig,
    /// Quality ladder thresholds.
    pub quality: QualityConfig,
    /// Seed for the auto-behavior jitter. `None` draws one from the OS.
    pub rng_seed: Option<u64>,
    /// Maximum number of pending animation commands.
    pub command_queue_capacity: Option<usize>,
}

/// Default bound of the command queue.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 256;

impl CompanionConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse companion configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize companion configuration")
    }

    /// Checks the values a session cannot run with.
    pub fn validate(&self) -> Result<()> {
        let anim = &self.animation;
        ensure!(anim.blend_speed > 0.0, "animation.blend_speed must be positive");
        ensure!(
            anim.ease_rate_per_second > 0.0,
            "animation.ease_rate_per_second must be positive"
        );
        ensure!(
            anim.blink_interval_min_secs > 0.0
                && anim.blink_interval_min_secs <= anim.blink_interval_max_secs,
            "animation.blink_interval_min_secs must be positive and not above the maximum"
        );
        for (name, value) in [
            ("animation.blink_interval_max_secs", anim.blink_interval_max_secs),
            ("animation.idle_interval_secs", anim.idle_interval_secs),
            ("animation.idle_jitter_secs", anim.idle_jitter_secs),
            (
                "animation.random_expression_interval_secs",
                anim.random_expression_interval_secs,
            ),
            (
                "animation.random_expression_jitter_secs",
                anim.random_expression_jitter_secs,
            ),
            ("quality.cooldown_secs", self.quality.cooldown_secs),
        ] {
            ensure!(
                (0.0..=MAX_TIMER_SECS).contains(&value),
                "{} must be between 0 and {} seconds",
                name,
                MAX_TIMER_SECS
            );
        }
        ensure!(
            anim.blink_duration_ms as f32 <= MAX_TIMER_SECS * 1000.0,
            "animation.blink_duration_ms must not exceed {} seconds",
            MAX_TIMER_SECS
        );
        ensure!(
            self.performance.fps_sample_interval_ms > 0
                && self.performance.memory_sample_interval_ms > 0,
            "performance sampling intervals must be positive"
        );
        if let Some(budget) = self.performance.memory_budget_mb {
            ensure!(budget > 0.0, "performance.memory_budget_mb must be positive");
        }
        let quality = &self.quality;
        ensure!(
            quality.fps_tolerance > 0.0 && quality.fps_tolerance <= 1.0,
            "quality.fps_tolerance must be in (0, 1]"
        );
        ensure!(
            quality.memory_high_water < quality.memory_critical,
            "quality.memory_high_water must be below quality.memory_critical"
        );
        Ok(())
    }

    /// Bound of the command queue.
    pub fn queue_capacity(&self) -> usize {
        self.command_queue_capacity
            .unwrap_or(DEFAULT_COMMAND_QUEUE_CAPACITY)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kizuna_core::QualityLevel;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CompanionConfig::from_json_str(
            r#"{ "quality": { "initial_level": "medium" }, "rng_seed": 9 }"#,
        )
        .unwrap();
        assert_eq!(config.quality.initial_level, Some(QualityLevel::Medium));
        assert_eq!(config.quality.cooldown_secs, 10.0);
        assert_eq!(config.performance.fps_sample_interval_ms, 1000);
        assert_eq!(config.animation.blink_duration_ms, 150);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.queue_capacity(), DEFAULT_COMMAND_QUEUE_CAPACITY);
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut config = CompanionConfig::default();
        config.performance.memory_budget_mb = Some(512.0);
        let json = config.to_json_string().unwrap();
        assert_eq!(CompanionConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(CompanionConfig::from_json_str("not json").is_err());
        assert!(CompanionConfig::from_json_str(
            r#"{ "animation": { "blink_interval_min_secs": 6.0 } }"#
        )
        .is_err());
        assert!(CompanionConfig::from_json_str(
            r#"{ "quality": { "memory_high_water": 0.95 } }"#
        )
        .is_err());
    }

    #[test]
    fn test_oversized_timers_are_rejected() {
        for json in [
            r#"{ "animation": { "idle_interval_secs": 1e30 } }"#,
            r#"{ "animation": { "random_expression_jitter_secs": 1e38 } }"#,
            r#"{ "animation": { "blink_interval_max_secs": 7200.0 } }"#,
            r#"{ "animation": { "blink_duration_ms": 18446744073709551615 } }"#,
            r#"{ "quality": { "cooldown_secs": 1e20 } }"#,
            r#"{ "quality": { "cooldown_secs": -1.0 } }"#,
        ] {
            assert!(CompanionConfig::from_json_str(json).is_err(), "{json}");
        }
        assert!(CompanionConfig::from_json_str(
            r#"{ "animation": { "idle_interval_secs": 3600.0 } }"#
        )
        .is_ok());
    }
}
