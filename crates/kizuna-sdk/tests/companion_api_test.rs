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
use kizuna_sdk::{
    ids, AnimationError, Companion, CompanionConfig, CompanionEvent, ContentKind, MemoryAction,
    QualityLevel, SystemProbe,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A probe reporting a fixed device and an adjustable memory reading.
struct FakeProbe {
    used_mb: Mutex<f32>,
}

impl FakeProbe {
    fn new(used_mb: f32) -> Arc<Self> {
        Arc::new(Self {
            used_mb: Mutex::new(used_mb),
        })
    }

    fn set_used(&self, used_mb: f32) {
        *self.used_mb.lock().unwrap() = used_mb;
    }
}

impl SystemProbe for FakeProbe {
    fn used_memory_mb(&self) -> Result<f32, AnimationError> {
        Ok(*self.used_mb.lock().unwrap())
    }

    fn total_memory_mb(&self) -> Result<f32, AnimationError> {
        Ok(16384.0)
    }

    fn cpu_cores(&self) -> usize {
        8
    }
}

fn config() -> CompanionConfig {
    let mut config = CompanionConfig {
        rng_seed: Some(42),
        ..CompanionConfig::default()
    };
    config.performance.memory_budget_mb = Some(1000.0);
    config
}

fn companion_with(probe: Arc<FakeProbe>) -> Companion {
    Companion::builder(config()).probe(probe).build().unwrap()
}

fn companion() -> Companion {
    companion_with(FakeProbe::new(200.0))
}

fn run(companion: &Companion, seconds: f32) {
    let frames = (seconds * 60.0) as usize;
    for _ in 0..frames {
        companion.step(1.0 / 60.0);
    }
}

fn started_motions(events: &flume::Receiver<CompanionEvent>) -> Vec<String> {
    events
        .try_iter()
        .filter_map(|event| match event {
            CompanionEvent::MotionStarted { name, .. } => Some(name),
            _ => None,
        })
        .collect()
}

#[test]
fn test_emotion_plays_expression_and_motion() {
    // --- 1. ARRANGE ---
    let companion = companion();
    let events = companion.subscribe();

    // --- 2. ACT ---
    assert!(companion.set_emotion("Happy"));
    run(&companion, 2.0);

    // --- 3. ASSERT ---
    assert_eq!(companion.current_expression_name().as_deref(), Some("happy"));
    assert_eq!(started_motions(&events).first().map(String::as_str), Some("tap_body_00"));
}

#[test]
fn test_unknown_emotion_is_rejected() {
    let companion = companion();
    assert!(!companion.set_emotion("melancholy"));
    run(&companion, 0.5);
    assert_eq!(companion.current_expression_name(), None);
}

#[test]
fn test_locked_motion_is_skipped_until_unlocked() {
    // --- 1. ARRANGE ---
    let companion = companion();
    let events = companion.subscribe();

    // --- 2. ACT ---
    // Love maps to a special motion, which starts out locked.
    assert!(companion.set_emotion("love"));
    run(&companion, 0.5);
    let before_unlock = started_motions(&events);

    assert!(companion.play_motion("special_00", false).is_none());
    assert!(companion.unlock_motion("special_00"));
    assert!(companion.set_emotion("love"));
    run(&companion, 0.5);
    let after_unlock = started_motions(&events);

    // --- 3. ASSERT ---
    assert!(!before_unlock.contains(&"special_00".to_owned()));
    assert!(after_unlock.contains(&"special_00".to_owned()));
    assert_eq!(companion.current_expression_name().as_deref(), Some("love"));
}

#[test]
fn test_unlock_events_and_unknown_ids() {
    let companion = companion();
    let events = companion.subscribe();

    assert!(!companion.is_unlocked("wink"));
    assert!(!companion.play_expression("wink", None));
    assert!(companion.unlock_expression("wink"));
    // A second unlock succeeds without a second event.
    assert!(companion.unlock_expression("wink"));
    assert!(!companion.unlock_motion("moonwalk"));

    assert!(companion.is_unlocked("wink"));
    assert!(companion.play_expression("wink", Some(0.2)));
    let unlocked: Vec<_> = events
        .try_iter()
        .filter(|e| matches!(e, CompanionEvent::ContentUnlocked { .. }))
        .collect();
    assert_eq!(
        unlocked,
        vec![CompanionEvent::ContentUnlocked {
            kind: ContentKind::Expression,
            id: "wink".to_owned()
        }]
    );
}

#[test]
fn test_play_motion_returns_distinct_handles() {
    let companion = companion();
    let first = companion.play_motion("nod", false).unwrap();
    let second = companion.play_motion("shake_01", true).unwrap();
    assert_ne!(first, second);
    assert!(companion.play_motion("moonwalk", false).is_none());

    run(&companion, 0.5);
    let info = companion.current_animation_info();
    assert_eq!(info.active_motion.as_deref(), Some("shake_01"));
    assert!(info.is_playing);
}

#[test]
fn test_unknown_quality_tag_leaves_level_unchanged() {
    let companion = companion();
    assert_eq!(companion.quality_profile().level, QualityLevel::High);

    assert!(!companion.set_quality_level("extreme"));
    assert_eq!(companion.quality_profile().level, QualityLevel::High);
    assert_eq!(companion.quality_preference(), None);

    assert!(companion.set_quality_level("ultra_low"));
    assert_eq!(companion.quality_profile().level, QualityLevel::UltraLow);
    assert_eq!(companion.quality_preference(), Some(QualityLevel::UltraLow));
    assert_eq!(companion.performance_stats().quality_level, QualityLevel::UltraLow);
}

#[test]
fn test_target_fps_bounds() {
    let companion = companion();
    assert!(!companion.set_target_fps(5));
    assert!(!companion.set_target_fps(61));
    assert!(companion.set_target_fps(10));
    assert!(companion.set_target_fps(60));
    assert_eq!(companion.quality_profile().target_fps, 60);
    assert_eq!(companion.performance_stats().target_fps, 60);
}

#[test]
fn test_parameter_override_pins_target() {
    // --- 1. ARRANGE ---
    let companion = companion();
    let view = companion.parameter_view();

    // --- 2. ACT ---
    assert!(companion.set_parameter_override("ParamMouthOpenY", 0.8));
    assert!(!companion.set_parameter_override("ParamTail", 1.0));
    run(&companion, 3.0);

    // --- 3. ASSERT ---
    assert_abs_diff_eq!(view.get(ids::MOUTH_OPEN_Y.as_str()).unwrap(), 0.8, epsilon = 0.01);

    assert!(companion.clear_parameter_override("ParamMouthOpenY"));
    run(&companion, 3.0);
    assert_abs_diff_eq!(
        companion.current_parameters()[&ids::MOUTH_OPEN_Y],
        0.0,
        epsilon = 0.01
    );
}

#[test]
fn test_reset_pose_returns_to_defaults() {
    let companion = companion();
    companion.set_emotion("angry");
    run(&companion, 1.0);
    companion.reset_pose();
    run(&companion, 3.0);

    assert_eq!(companion.current_expression_name(), None);
    assert!(!companion.current_animation_info().is_playing);
}

#[test]
fn test_memory_pressure_reduces_quality_and_notifies() {
    // --- 1. ARRANGE ---
    let probe = FakeProbe::new(500.0);
    let companion = companion_with(Arc::clone(&probe));
    let events = companion.subscribe();

    // --- 2. ACT ---
    let calm = companion.sample_memory_at(Duration::from_secs(5));
    probe.set_used(850.0);
    let high = companion.sample_memory_at(Duration::from_secs(10));
    probe.set_used(950.0);
    let critical = companion.sample_memory_at(Duration::from_secs(15));

    // --- 3. ASSERT ---
    assert_eq!(calm, Some(MemoryAction::None));
    assert!(matches!(high, Some(MemoryAction::Cleanup { .. })));
    assert!(matches!(critical, Some(MemoryAction::Reduce { .. })));

    let profile = companion.quality_profile();
    assert_eq!(profile.level, QualityLevel::High);
    assert!(!profile.physics_enabled);

    let pressure: Vec<bool> = events
        .try_iter()
        .filter_map(|e| match e {
            CompanionEvent::MemoryPressure { critical, .. } => Some(critical),
            _ => None,
        })
        .collect();
    assert_eq!(pressure, vec![false, true]);
    assert_abs_diff_eq!(companion.performance_stats().current_memory_mb, 950.0);
}

#[test]
fn test_slow_frames_downgrade_quality() {
    let companion = companion();
    let events = companion.subscribe();

    // Ten frames at 5 FPS, well under the High tier's minimum.
    for _ in 0..10 {
        companion.step(0.2);
    }
    let profile = companion.sample_fps_at(Duration::from_secs(2)).unwrap();

    assert_eq!(profile.level, QualityLevel::Medium);
    assert!(events.try_iter().any(|e| matches!(
        e,
        CompanionEvent::QualityChanged {
            level: QualityLevel::Medium,
            ..
        }
    )));
    assert!(!companion.optimization_recommendations().is_empty());
}

#[test]
fn test_disabled_optimization_keeps_level() {
    let companion = companion();
    companion.set_optimization_enabled(false);
    assert!(!companion.optimization_enabled());
    for _ in 0..10 {
        companion.step(0.2);
    }
    assert!(companion.sample_fps_at(Duration::from_secs(2)).is_none());
    assert_eq!(companion.quality_profile().level, QualityLevel::High);
}

#[test]
fn test_start_requires_a_runtime() {
    let companion = companion();
    assert!(companion.start().is_err());
    assert!(!companion.is_running());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = config();
    config.animation.blend_speed = 0.0;
    assert!(Companion::builder(config).probe(FakeProbe::new(0.0)).build().is_err());
}

#[test]
fn test_oversized_timer_config_fails_to_build() {
    let mut config = config();
    config.animation.idle_interval_secs = 1e30;
    let built = Companion::builder(config)
        .probe(FakeProbe::new(0.0))
        .build();
    assert!(built.is_err());
    assert!(
        CompanionConfig::from_json_str(r#"{"animation":{"idle_interval_secs":1e30}}"#).is_err()
    );
}

#[test]
fn test_huge_step_is_clamped() {
    let companion = companion();
    companion.set_emotion("happy");
    companion.step(1e20);
    companion.step(f32::NAN);
    assert_eq!(companion.current_expression_name().as_deref(), Some("happy"));
}

#[tokio::test]
async fn test_start_and_stop_lifecycle() {
    // --- 1. ARRANGE ---
    let companion = companion();
    let events = companion.subscribe();

    // --- 2. ACT ---
    companion.start().unwrap();
    companion.start().unwrap();
    assert!(companion.is_running());
    assert!(companion.play_motion("tap_body", false).is_some());
    tokio::time::sleep(Duration::from_millis(200)).await;
    companion.stop();

    // --- 3. ASSERT ---
    assert!(!companion.is_running());
    assert!(started_motions(&events).contains(&"tap_body_00".to_owned()));
    assert_eq!(
        companion.current_animation_info().active_motion.as_deref(),
        Some("tap_body_00")
    );
}
