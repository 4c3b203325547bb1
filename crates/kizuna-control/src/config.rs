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


//! Tunables for the quality controller.

use kizuna_core::QualityLevel;
use serde::{Deserialize, Serialize};

/// Configuration for the [`QualityController`](crate::QualityController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum time between two automatic adjustments, in seconds.
    pub cooldown_secs: f32,
    /// Downgrade when the average FPS drops below `target_fps * fps_tolerance`.
    pub fps_tolerance: f32,
    /// Frame samples required before the average FPS is trusted.
    pub min_fps_samples: usize,
    /// Memory ratio above which a cleanup is requested.
    pub memory_high_water: f32,
    /// Memory ratio above which quality is reduced within the current level.
    pub memory_critical: f32,
    /// Starting level. `None` uses the device tier.
    pub initial_level: Option<QualityLevel>,
    /// Whether automatic adaptation runs at all.
    pub optimization_enabled: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 10.0,
            fps_tolerance: 0.75,
            min_fps_samples: 5,
            memory_high_water: 0.80,
            memory_critical: 0.90,
            initial_level: None,
            optimization_enabled: true,
        }
    }
}
