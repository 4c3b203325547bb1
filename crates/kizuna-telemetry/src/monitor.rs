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


//! Rolling frame-rate and memory figures.
//!
//! The blend loop records one timestamp per frame; the average frame rate is
//! derived from the first and last timestamp in the window. Memory readings
//! are pushed by a slower sampling task.

use crate::metrics::RingBuffer;
use kizuna_core::{AnimationError, QualityLevel, SystemProbe};
use serde::{Deserialize, Serialize};

/// Number of frame timestamps kept.
pub const FRAME_WINDOW: usize = 30;
/// Number of memory readings kept.
pub const MEMORY_WINDOW: usize = 10;
/// Per-process memory budget used when the host does not set one, in MB.
///
/// Capped at the device's total RAM.
pub const DEFAULT_MEMORY_BUDGET_MB: f32 = 512.0;

/// Buckets a device into a quality tier from its RAM and core count.
///
/// | Tier | RAM | Cores |
/// |---|---|---|
/// | High | ≥ 8 GB | ≥ 8 |
/// | Medium | ≥ 4 GB | ≥ 4 |
/// | Low | ≥ 2 GB | any |
/// | UltraLow | below | any |
pub fn classify_device(total_memory_mb: f32, cpu_cores: usize) -> QualityLevel {
    match (total_memory_mb, cpu_cores) {
        (mb, cores) if mb >= 8192.0 && cores >= 8 => QualityLevel::High,
        (mb, cores) if mb >= 4096.0 && cores >= 4 => QualityLevel::Medium,
        (mb, _) if mb >= 2048.0 => QualityLevel::Low,
        _ => QualityLevel::UltraLow,
    }
}

/// A copy of the monitor's derived figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Tier computed at start-up.
    pub device_tier: QualityLevel,
    /// Rate implied by the last two frame timestamps.
    pub instantaneous_fps: f32,
    /// Rate implied by the whole frame window.
    pub average_fps: f32,
    /// Frame timestamps currently in the window.
    pub frame_samples: usize,
    /// Latest memory reading, in MB.
    pub current_memory_mb: f32,
    /// Mean of the memory window, in MB.
    pub average_memory_mb: f32,
    /// Largest reading in the memory window, in MB.
    pub peak_memory_mb: f32,
    /// Newer-half minus older-half mean of the memory window, in MB.
    pub memory_trend_mb: f32,
    /// Latest reading divided by the memory budget.
    pub memory_ratio: f32,
}

/// Frame and memory windows plus the start-up device tier.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    frames: RingBuffer<f64, FRAME_WINDOW>,
    instantaneous_fps: f32,
    memory: RingBuffer<f32, MEMORY_WINDOW>,
    device_tier: QualityLevel,
    memory_budget_mb: f32,
}

impl PerformanceMonitor {
    /// Creates a monitor for a device of the given tier.
    pub fn new(device_tier: QualityLevel, memory_budget_mb: f32) -> Self {
        Self {
            frames: RingBuffer::new(),
            instantaneous_fps: 0.0,
            memory: RingBuffer::new(),
            device_tier,
            memory_budget_mb: memory_budget_mb.max(1.0),
        }
    }

    /// Classifies the device through `probe` once.
    ///
    /// The memory budget defaults to [`DEFAULT_MEMORY_BUDGET_MB`], or the
    /// device's total RAM if that is smaller. If the probe cannot report the
    /// total, the device is treated as the lowest tier.
    pub fn from_probe(probe: &dyn SystemProbe, memory_budget_mb: Option<f32>) -> Self {
        let cores = probe.cpu_cores();
        let (tier, total) = match probe.total_memory_mb() {
            Ok(total) => (classify_device(total, cores), total),
            Err(e) => {
                log::warn!("PerformanceMonitor: cannot classify device: {}", e);
                (QualityLevel::UltraLow, 1024.0)
            }
        };
        let budget = memory_budget_mb.unwrap_or(DEFAULT_MEMORY_BUDGET_MB.min(total));
        log::info!(
            "PerformanceMonitor: device tier {} ({:.0} MB, {} cores), memory budget {:.0} MB",
            tier,
            total,
            cores,
            budget
        );
        Self::new(tier, budget)
    }

    /// Records the timestamp of a rendered frame, in milliseconds.
    ///
    /// Timestamps must be monotonic. Returns the instantaneous frame rate.
    pub fn record_frame(&mut self, timestamp_ms: f64) -> f32 {
        if let Some(previous) = self.frames.latest() {
            let delta = timestamp_ms - previous;
            if delta > 0.0 {
                self.instantaneous_fps = (1000.0 / delta) as f32;
            }
        }
        self.frames.push(timestamp_ms);
        self.instantaneous_fps
    }

    /// Average frame rate over the window: `(n - 1)` intervals over the elapsed time.
    pub fn average_fps(&self) -> f32 {
        let (Some(first), Some(last)) = (self.frames.oldest(), self.frames.latest()) else {
            return 0.0;
        };
        let span = last - first;
        if self.frames.count() < 2 || span <= 0.0 {
            return 0.0;
        }
        ((self.frames.count() - 1) as f64 * 1000.0 / span) as f32
    }

    /// Frame rate between the last two frames.
    pub fn instantaneous_fps(&self) -> f32 {
        self.instantaneous_fps
    }

    /// Number of frame timestamps in the window.
    pub fn frame_samples(&self) -> usize {
        self.frames.count()
    }

    /// Records a memory reading in MB.
    pub fn record_memory(&mut self, used_mb: f32) {
        self.memory.push(used_mb.max(0.0));
    }

    /// Reads memory usage through `probe` and records it.
    pub fn sample_memory(&mut self, probe: &dyn SystemProbe) -> Result<f32, AnimationError> {
        let used = probe.used_memory_mb()?;
        if !used.is_finite() {
            return Err(AnimationError::TransientMonitoringFailure(format!(
                "probe reported {used} MB"
            )));
        }
        self.record_memory(used);
        Ok(used)
    }

    /// Latest memory reading, or `0.0` before the first sample.
    pub fn current_memory_mb(&self) -> f32 {
        self.memory.latest().unwrap_or(0.0)
    }

    /// Mean of the memory window.
    pub fn average_memory_mb(&self) -> f32 {
        self.memory.average()
    }

    /// Latest reading divided by the memory budget.
    pub fn memory_ratio(&self) -> f32 {
        self.current_memory_mb() / self.memory_budget_mb
    }

    /// The memory budget, in MB.
    pub fn memory_budget_mb(&self) -> f32 {
        self.memory_budget_mb
    }

    /// Tier computed at start-up.
    pub fn device_tier(&self) -> QualityLevel {
        self.device_tier
    }

    /// Drops every memory reading except the latest.
    pub fn trim(&mut self) {
        self.memory.retain_latest(1);
    }

    /// Clears both windows.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.memory.clear();
        self.instantaneous_fps = 0.0;
        log::debug!("PerformanceMonitor: statistics reset");
    }

    /// Copies every derived figure.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            device_tier: self.device_tier,
            instantaneous_fps: self.instantaneous_fps,
            average_fps: self.average_fps(),
            frame_samples: self.frames.count(),
            current_memory_mb: self.current_memory_mb(),
            average_memory_mb: self.memory.average(),
            peak_memory_mb: self.memory.max(),
            memory_trend_mb: self.memory.trend(),
            memory_ratio: self.memory_ratio(),
        }
    }
}
