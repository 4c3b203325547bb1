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

//! Tunables for blending and auto behaviors.

use serde::{Deserialize, Serialize};

/// Upper bound of every timer interval, jitter and blink duration, in seconds.
pub const MAX_TIMER_SECS: f32 = 3600.0;

/// Configuration for the [`Animator`](crate::Animator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Speed at which motion and expression weights approach their target, per second.
    pub blend_speed: f32,
    /// Parameter easing factor per second. The per-frame rate is `min(1, k * dt)`.
    pub ease_rate_per_second: f32,
    /// Shortest interval between two blinks, in seconds.
    pub blink_interval_min_secs: f32,
    /// Longest interval between two blinks, in seconds.
    pub blink_interval_max_secs: f32,
    /// How long the eyes stay closed, in milliseconds.
    pub blink_duration_ms: u64,
    /// Mean interval between idle motion checks, in seconds.
    pub idle_interval_secs: f32,
    /// Maximum deviation from the idle interval, in seconds.
    pub idle_jitter_secs: f32,
    /// Mean interval between random expressions, in seconds.
    pub random_expression_interval_secs: f32,
    /// Maximum deviation from the random expression interval, in seconds.
    pub random_expression_jitter_secs: f32,
    /// How strongly hair follows head and body yaw when physics is on.
    pub hair_follow: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            blend_speed: 5.0,
            ease_rate_per_second: 5.0,
            blink_interval_min_secs: 3.0,
            blink_interval_max_secs: 5.0,
            blink_duration_ms: 150,
            idle_interval_secs: 8.0,
            idle_jitter_secs: 3.0,
            random_expression_interval_secs: 20.0,
            random_expression_jitter_secs: 8.0,
            hair_follow: 0.3,
        }
    }
}
