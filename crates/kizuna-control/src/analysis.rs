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


//! Heuristic analysis of the performance figures.
//!
//! `QualityAnalysis` classifies frame pacing and memory pressure for the
//! controller and turns the same figures into human-readable advice.

use crate::config::QualityConfig;
use kizuna_core::{QualityLevel, QualityProfile};
use kizuna_telemetry::PerformanceSnapshot;

/// Memory growth (MB per window half) considered a leak suspect.
const MEMORY_TREND_WARN_MB: f32 = 20.0;
/// Instantaneous FPS below this fraction of the average suggests hitches.
const HITCH_RATIO: f32 = 0.5;

/// How close memory usage is to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum MemoryPressure {
    /// Below the high-water mark.
    #[default]
    Normal,
    /// Above the high-water mark: caches should be dropped.
    High,
    /// Above the critical mark: fidelity must go down.
    Critical,
}

/// Findings of one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// `true` if the average FPS is trusted and below the acceptable minimum.
    pub fps_below_target: bool,
    /// Classification of the latest memory ratio.
    pub memory_pressure: MemoryPressure,
    /// Human-readable summary of the findings for logging.
    pub alerts: Vec<String>,
}

/// Evaluates performance figures against the active profile.
pub struct QualityAnalysis;

impl QualityAnalysis {
    /// Classifies a memory ratio.
    pub fn memory_pressure(ratio: f32, config: &QualityConfig) -> MemoryPressure {
        if ratio > config.memory_critical {
            MemoryPressure::Critical
        } else if ratio > config.memory_high_water {
            MemoryPressure::High
        } else {
            MemoryPressure::Normal
        }
    }

    /// Lowest average FPS accepted for `profile`.
    pub fn minimum_fps(profile: &QualityProfile, config: &QualityConfig) -> f32 {
        profile.target_fps as f32 * config.fps_tolerance
    }

    /// Analyzes a snapshot.
    pub fn analyze(
        &self,
        snapshot: &PerformanceSnapshot,
        profile: &QualityProfile,
        config: &QualityConfig,
    ) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        // ── Frame pacing ────────────────────────────────────────────────
        let minimum = Self::minimum_fps(profile, config);
        if snapshot.frame_samples >= config.min_fps_samples && snapshot.average_fps < minimum {
            report.fps_below_target = true;
            report.alerts.push(format!(
                "FPS: avg {:.1} below minimum {:.1} (target {}).",
                snapshot.average_fps, minimum, profile.target_fps
            ));
        }

        // ── Memory ──────────────────────────────────────────────────────
        report.memory_pressure = Self::memory_pressure(snapshot.memory_ratio, config);
        match report.memory_pressure {
            MemoryPressure::Critical => report.alerts.push(format!(
                "Memory: CRITICAL at {:.0}% of budget.",
                snapshot.memory_ratio * 100.0
            )),
            MemoryPressure::High => report.alerts.push(format!(
                "Memory: High at {:.0}% of budget.",
                snapshot.memory_ratio * 100.0
            )),
            MemoryPressure::Normal => {}
        }

        report
    }

    /// Advice for the user or the settings screen.
    pub fn recommendations(
        &self,
        snapshot: &PerformanceSnapshot,
        profile: &QualityProfile,
        config: &QualityConfig,
        optimization_enabled: bool,
    ) -> Vec<String> {
        let mut advice = Vec::new();
        let report = self.analyze(snapshot, profile, config);

        if matches!(
            snapshot.device_tier,
            QualityLevel::Low | QualityLevel::UltraLow
        ) && profile.level < snapshot.device_tier
        {
            advice.push(format!(
                "This device is rated {}; the {} quality level may not run smoothly.",
                snapshot.device_tier, profile.level
            ));
        }

        if report.fps_below_target {
            advice.push(format!(
                "Frame rate is {:.0} FPS against a target of {}. Lower the quality level or the target FPS.",
                snapshot.average_fps, profile.target_fps
            ));
        }

        if snapshot.average_fps > 0.0
            && snapshot.instantaneous_fps > 0.0
            && snapshot.instantaneous_fps < snapshot.average_fps * HITCH_RATIO
        {
            advice.push("Frame pacing is uneven. Close other busy applications.".to_owned());
        }

        match report.memory_pressure {
            MemoryPressure::Critical => advice.push(format!(
                "Memory usage is critical ({:.0} MB). Reduce texture resolution or restart the companion.",
                snapshot.current_memory_mb
            )),
            MemoryPressure::High => advice.push(format!(
                "Memory usage is high ({:.0} MB). Consider a lower quality level.",
                snapshot.current_memory_mb
            )),
            MemoryPressure::Normal => {}
        }

        if snapshot.memory_trend_mb > MEMORY_TREND_WARN_MB {
            advice.push(format!(
                "Memory usage keeps rising (+{:.0} MB).",
                snapshot.memory_trend_mb
            ));
        }

        if profile.physics_enabled && report.fps_below_target {
            advice.push("Disable hair physics to save CPU time.".to_owned());
        }

        if !optimization_enabled && (report.fps_below_target || report.memory_pressure > MemoryPressure::Normal)
        {
            advice.push("Enable automatic optimization to adapt quality on the fly.".to_owned());
        }

        if advice.is_empty() {
            advice.push("Performance is good. No changes needed.".to_owned());
        }
        advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(avg_fps: f32, samples: usize, ratio: f32) -> PerformanceSnapshot {
        PerformanceSnapshot {
            device_tier: QualityLevel::High,
            instantaneous_fps: avg_fps,
            average_fps: avg_fps,
            frame_samples: samples,
            current_memory_mb: ratio * 1000.0,
            average_memory_mb: ratio * 1000.0,
            peak_memory_mb: ratio * 1000.0,
            memory_trend_mb: 0.0,
            memory_ratio: ratio,
        }
    }

    #[test]
    fn test_healthy_snapshot_raises_nothing() {
        let config = QualityConfig::default();
        let profile = QualityProfile::default();
        let report = QualityAnalysis.analyze(&snapshot(59.0, 30, 0.3), &profile, &config);
        assert!(!report.fps_below_target);
        assert_eq!(report.memory_pressure, MemoryPressure::Normal);
        assert!(report.alerts.is_empty());

        let advice =
            QualityAnalysis.recommendations(&snapshot(59.0, 30, 0.3), &profile, &config, true);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("good"));
    }

    #[test]
    fn test_low_fps_needs_enough_samples() {
        let config = QualityConfig::default();
        let profile = QualityProfile::default();
        assert!(!QualityAnalysis.analyze(&snapshot(20.0, 3, 0.3), &profile, &config).fps_below_target);
        assert!(QualityAnalysis.analyze(&snapshot(20.0, 5, 0.3), &profile, &config).fps_below_target);
        // 46 FPS is above 60 * 0.75.
        assert!(!QualityAnalysis.analyze(&snapshot(46.0, 30, 0.3), &profile, &config).fps_below_target);
    }

    #[test]
    fn test_memory_pressure_levels() {
        let config = QualityConfig::default();
        assert_eq!(QualityAnalysis::memory_pressure(0.5, &config), MemoryPressure::Normal);
        assert_eq!(QualityAnalysis::memory_pressure(0.85, &config), MemoryPressure::High);
        assert_eq!(QualityAnalysis::memory_pressure(0.95, &config), MemoryPressure::Critical);
    }

    #[test]
    fn test_recommendations_cover_each_problem() {
        let config = QualityConfig::default();
        let profile = QualityProfile::default();
        let mut snap = snapshot(20.0, 30, 0.95);
        snap.device_tier = QualityLevel::Low;
        snap.memory_trend_mb = 50.0;

        let advice = QualityAnalysis.recommendations(&snap, &profile, &config, false);
        let joined = advice.join("\n");
        assert!(joined.contains("rated low"));
        assert!(joined.contains("Frame rate"));
        assert!(joined.contains("critical"));
        assert!(joined.contains("rising"));
        assert!(joined.contains("physics"));
        assert!(joined.contains("automatic optimization"));
    }
}
