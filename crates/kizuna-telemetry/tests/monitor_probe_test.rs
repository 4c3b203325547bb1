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


use approx::assert_abs_diff_eq;
use kizuna_core::{AnimationError, QualityLevel, SystemProbe};
use kizuna_telemetry::{PerformanceMonitor, DEFAULT_MEMORY_BUDGET_MB};
use std::sync::Mutex;

/// A probe that replays scripted readings.
struct FakeProbe {
    total_mb: Result<f32, AnimationError>,
    cores: usize,
    readings: Mutex<Vec<Result<f32, AnimationError>>>,
}

impl FakeProbe {
    fn new(total_mb: f32, cores: usize, readings: Vec<Result<f32, AnimationError>>) -> Self {
        Self {
            total_mb: Ok(total_mb),
            cores,
            readings: Mutex::new(readings),
        }
    }
}

impl SystemProbe for FakeProbe {
    fn used_memory_mb(&self) -> Result<f32, AnimationError> {
        let mut readings = self.readings.lock().unwrap();
        if readings.is_empty() {
            return Err(AnimationError::TransientMonitoringFailure("exhausted".into()));
        }
        readings.remove(0)
    }

    fn total_memory_mb(&self) -> Result<f32, AnimationError> {
        self.total_mb.clone()
    }

    fn cpu_cores(&self) -> usize {
        self.cores
    }
}

#[test]
fn test_device_tier_comes_from_probe() {
    let probe = FakeProbe::new(6144.0, 6, vec![]);
    let monitor = PerformanceMonitor::from_probe(&probe, None);
    assert_eq!(monitor.device_tier(), QualityLevel::Medium);
    assert_abs_diff_eq!(monitor.memory_budget_mb(), DEFAULT_MEMORY_BUDGET_MB);

    let monitor = PerformanceMonitor::from_probe(&probe, Some(512.0));
    assert_abs_diff_eq!(monitor.memory_budget_mb(), 512.0);
}

#[test]
fn test_default_budget_is_per_process() {
    // --- 1. ARRANGE ---
    let roomy = FakeProbe::new(16384.0, 8, vec![Ok(450.0)]);
    let tiny = FakeProbe::new(300.0, 1, vec![]);

    // --- 2. ACT ---
    let mut monitor = PerformanceMonitor::from_probe(&roomy, None);
    monitor.sample_memory(&roomy).unwrap();

    // --- 3. ASSERT ---
    // 450 MB is negligible against 16 GB of RAM but close to the process budget.
    assert!(monitor.memory_ratio() > 0.8);
    assert_abs_diff_eq!(
        PerformanceMonitor::from_probe(&tiny, None).memory_budget_mb(),
        300.0
    );
}

#[test]
fn test_failed_classification_falls_back_to_lowest_tier() {
    let probe = FakeProbe {
        total_mb: Err(AnimationError::TransientMonitoringFailure("no sysfs".into())),
        cores: 8,
        readings: Mutex::new(vec![]),
    };
    let monitor = PerformanceMonitor::from_probe(&probe, None);
    assert_eq!(monitor.device_tier(), QualityLevel::UltraLow);
}

#[test]
fn test_sampling_failures_leave_window_untouched() {
    // --- 1. ARRANGE ---
    let probe = FakeProbe::new(
        4096.0,
        4,
        vec![
            Ok(200.0),
            Err(AnimationError::TransientMonitoringFailure("busy".into())),
            Ok(f32::NAN),
            Ok(300.0),
        ],
    );
    let mut monitor = PerformanceMonitor::from_probe(&probe, Some(1000.0));

    // --- 2. ACT ---
    let results: Vec<_> = (0..4).map(|_| monitor.sample_memory(&probe)).collect();

    // --- 3. ASSERT ---
    assert_eq!(results[0], Ok(200.0));
    assert!(matches!(
        results[1],
        Err(AnimationError::TransientMonitoringFailure(_))
    ));
    assert!(results[2].is_err());
    assert_eq!(results[3], Ok(300.0));

    let snapshot = monitor.snapshot();
    assert_abs_diff_eq!(snapshot.current_memory_mb, 300.0);
    assert_abs_diff_eq!(snapshot.average_memory_mb, 250.0);
    assert_abs_diff_eq!(snapshot.peak_memory_mb, 300.0);
    assert_abs_diff_eq!(snapshot.memory_ratio, 0.3);
}
