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

//! The quality ladder and the settings attached to each rung.
//!
//! All bounds on the tunable factors live here, so callers never clamp by hand:
//!
//! | Level | Texture | Animation | Physics | Blink | Idle | Auto-expr | FPS |
//! |---|---|---|---|---|---|---|---|
//! | High | 1.0 | 1.0 | on | on | on | on | 60 |
//! | Medium | 0.75 | 0.8 | on | on | on | on | 25 |
//! | Low | 0.5 | 0.6 | off | on | on | off | 20 |
//! | UltraLow | 0.35 | 0.4 | off | on | off | off | 15 |

use crate::error::AnimationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Allowed range of the texture resolution factor.
pub const TEXTURE_RES_FACTOR_RANGE: RangeInclusive<f32> = 0.25..=1.0;
/// Allowed range of the animation quality factor.
pub const ANIM_QUALITY_FACTOR_RANGE: RangeInclusive<f32> = 0.3..=1.0;
/// Allowed range of the target frame rate.
pub const TARGET_FPS_RANGE: RangeInclusive<u32> = 10..=60;
/// How much each memory-pressure reduction removes from both factors.
pub const MEMORY_REDUCTION_STEP: f32 = 0.1;

/// A rung of the quality ladder. Also used as the device capability tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// Full fidelity.
    #[default]
    High,
    /// Slightly reduced textures and frame rate.
    Medium,
    /// No physics, no automatic expressions.
    Low,
    /// Bare minimum to keep the avatar alive.
    UltraLow,
}

impl QualityLevel {
    /// All levels from best to worst.
    pub const ALL: [QualityLevel; 4] = [
        QualityLevel::High,
        QualityLevel::Medium,
        QualityLevel::Low,
        QualityLevel::UltraLow,
    ];

    /// The next lower level, or `None` at the bottom of the ladder.
    pub fn downgrade(&self) -> Option<Self> {
        match self {
            QualityLevel::High => Some(QualityLevel::Medium),
            QualityLevel::Medium => Some(QualityLevel::Low),
            QualityLevel::Low => Some(QualityLevel::UltraLow),
            QualityLevel::UltraLow => None,
        }
    }

    /// The snake_case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::High => "high",
            QualityLevel::Medium => "medium",
            QualityLevel::Low => "low",
            QualityLevel::UltraLow => "ultra_low",
        }
    }
}

impl FromStr for QualityLevel {
    type Err = AnimationError;

    /// Accepts `high`, `medium`, `low` and `ultra_low` in any case, with `-`
    /// or no separator also allowed for the last one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityLevel::High),
            "medium" => Ok(QualityLevel::Medium),
            "low" => Ok(QualityLevel::Low),
            "ultra_low" | "ultra-low" | "ultralow" => Ok(QualityLevel::UltraLow),
            _ => Err(AnimationError::invalid("quality level", s)),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settings pushed to every subsystem when the quality changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// The ladder level this profile was derived from.
    pub level: QualityLevel,
    /// Renderer hint: fraction of the native texture resolution.
    pub texture_res_factor: f32,
    /// Fraction of the full motion sampling rate.
    pub anim_quality_factor: f32,
    /// Secondary (hair) motion on/off.
    pub physics_enabled: bool,
    /// Automatic blinking on/off.
    pub auto_blink_enabled: bool,
    /// Automatic idle motion on/off.
    pub auto_idle_enabled: bool,
    /// Automatic random expressions on/off.
    pub auto_expression_enabled: bool,
    /// Blend loop cadence, in frames per second.
    pub target_fps: u32,
}

impl QualityProfile {
    /// The stock profile of a ladder level.
    pub fn for_level(level: QualityLevel) -> Self {
        let (texture_res_factor, anim_quality_factor, physics, idle, expression, target_fps) =
            match level {
                QualityLevel::High => (1.0, 1.0, true, true, true, 60),
                QualityLevel::Medium => (0.75, 0.8, true, true, true, 25),
                QualityLevel::Low => (0.5, 0.6, false, true, false, 20),
                QualityLevel::UltraLow => (0.35, 0.4, false, false, false, 15),
            };
        Self {
            level,
            texture_res_factor,
            anim_quality_factor,
            physics_enabled: physics,
            auto_blink_enabled: true,
            auto_idle_enabled: idle,
            auto_expression_enabled: expression,
            target_fps,
        }
    }

    /// Returns a copy with a different target frame rate.
    pub fn with_target_fps(mut self, fps: u32) -> Result<Self, AnimationError> {
        if !TARGET_FPS_RANGE.contains(&fps) {
            return Err(AnimationError::invalid("target fps", fps));
        }
        self.target_fps = fps;
        Ok(self)
    }

    /// The stock profile one rung down, keeping reductions already in force.
    ///
    /// Each factor takes the lower of its current and stock value, physics and
    /// automatic expressions stay off if they are off now, and the target frame
    /// rate never rises. Returns `None` at the bottom of the ladder.
    pub fn downgraded(&self) -> Option<Self> {
        let mut next = Self::for_level(self.level.downgrade()?);
        next.texture_res_factor = next.texture_res_factor.min(self.texture_res_factor);
        next.anim_quality_factor = next.anim_quality_factor.min(self.anim_quality_factor);
        next.physics_enabled &= self.physics_enabled;
        next.auto_expression_enabled &= self.auto_expression_enabled;
        next.target_fps = next.target_fps.min(self.target_fps);
        next.clamp();
        Some(next)
    }

    /// Sheds load within the current level in response to memory pressure.
    ///
    /// Lowers both factors by [`MEMORY_REDUCTION_STEP`] and disables physics and
    /// automatic expressions. Returns `false` if nothing was left to reduce.
    pub fn reduce_for_memory_pressure(&mut self) -> bool {
        let before = *self;
        self.texture_res_factor -= MEMORY_REDUCTION_STEP;
        self.anim_quality_factor -= MEMORY_REDUCTION_STEP;
        self.physics_enabled = false;
        self.auto_expression_enabled = false;
        self.clamp();
        *self != before
    }

    /// Forces every factor back into its allowed range.
    pub fn clamp(&mut self) {
        self.texture_res_factor = self
            .texture_res_factor
            .clamp(*TEXTURE_RES_FACTOR_RANGE.start(), *TEXTURE_RES_FACTOR_RANGE.end());
        self.anim_quality_factor = self.anim_quality_factor.clamp(
            *ANIM_QUALITY_FACTOR_RANGE.start(),
            *ANIM_QUALITY_FACTOR_RANGE.end(),
        );
        self.target_fps = self
            .target_fps
            .clamp(*TARGET_FPS_RANGE.start(), *TARGET_FPS_RANGE.end());
    }

    /// Duration of one blend loop tick, in seconds.
    pub fn frame_interval_secs(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self::for_level(QualityLevel::High)
    }
}
