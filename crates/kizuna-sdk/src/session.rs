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


//! State shared by the facade and the background tasks.
//!
//! Every mutation of animation state goes through the command queue and is
//! applied by [`Session::step`], so the blend loop stays the single writer.
//! The quality profile is written only here, on behalf of the controller.

use crate::config::CompanionConfig;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use kizuna_animation::{AnimationCommand, AnimationInfo, Animator, ContentCatalog};
use kizuna_control::{MemoryAction, PerformanceStats, QualityController};
use kizuna_core::{
    AnimationError, CompanionEvent, EventBus, ParameterStore, QualityProfile, SystemProbe,
};
use kizuna_telemetry::PerformanceMonitor;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

pub(crate) struct Session {
    pub(crate) config: CompanionConfig,
    pub(crate) store: Arc<ParameterStore>,
    pub(crate) catalog: ContentCatalog,
    pub(crate) events: EventBus<CompanionEvent>,
    probe: Arc<dyn SystemProbe>,
    animator: Mutex<Animator>,
    monitor: Mutex<PerformanceMonitor>,
    controller: Mutex<QualityController>,
    profile: RwLock<QualityProfile>,
    info: RwLock<AnimationInfo>,
    commands_tx: Sender<AnimationCommand>,
    commands_rx: Receiver<AnimationCommand>,
    started: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Session {
    pub(crate) fn new(
        config: CompanionConfig,
        catalog: ContentCatalog,
        probe: Arc<dyn SystemProbe>,
    ) -> Self {
        let monitor =
            PerformanceMonitor::from_probe(probe.as_ref(), config.performance.memory_budget_mb);
        let controller = QualityController::new(config.quality.clone(), monitor.device_tier());
        let profile = controller.profile();

        let store = Arc::new(ParameterStore::with_standard_parameters());
        let animator = Animator::new(
            config.animation.clone(),
            Arc::clone(&store),
            catalog.clone(),
            profile,
            config.rng_seed,
        );
        let (commands_tx, commands_rx) = crossbeam_channel::bounded(config.queue_capacity());

        Self {
            store,
            catalog,
            events: EventBus::new(),
            probe,
            animator: Mutex::new(animator),
            monitor: Mutex::new(monitor),
            controller: Mutex::new(controller),
            profile: RwLock::new(profile),
            info: RwLock::new(AnimationInfo::default()),
            commands_tx,
            commands_rx,
            started: Instant::now(),
            config,
        }
    }

    /// Time since the session was created.
    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Queues a command for the next frame. Returns `false` if the queue is full.
    pub(crate) fn enqueue(&self, command: AnimationCommand) -> bool {
        match self.commands_tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                log::warn!("Session: command queue full, dropping {:?}", command);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Runs one blend loop frame of `dt` seconds and records its timestamp.
    pub(crate) fn step(&self, dt: f32) -> usize {
        let profile = self.profile();
        let (changed, events, info, clock) = {
            let mut animator = lock(&self.animator);
            if *animator.profile() != profile {
                animator.apply(AnimationCommand::ApplyProfile(profile));
            }
            while let Ok(command) = self.commands_rx.try_recv() {
                animator.apply(command);
            }
            let changed = animator.tick(dt);
            (changed, animator.take_events(), animator.info(), animator.clock())
        };

        *self.info.write().unwrap_or_else(|e| e.into_inner()) = info;
        lock(&self.monitor).record_frame(clock.as_secs_f64() * 1000.0);

        for event in events {
            self.events.publish(event);
        }
        changed
    }

    /// Evaluates the frame rate and lets the controller react.
    pub(crate) fn sample_fps(&self, now: Duration) -> Option<QualityProfile> {
        let (average, samples) = {
            let monitor = lock(&self.monitor);
            (monitor.average_fps(), monitor.frame_samples())
        };
        log::trace!("Session: avg FPS {:.1} over {} frames", average, samples);
        let downgrade = lock(&self.controller).on_fps_sample(average, samples, now);
        if let Some(profile) = downgrade {
            self.push_profile(profile);
        }
        downgrade
    }

    /// Reads memory through the probe and lets the controller react.
    pub(crate) fn sample_memory(&self, now: Duration) -> Result<MemoryAction, AnimationError> {
        let ratio = {
            let mut monitor = lock(&self.monitor);
            monitor.sample_memory(self.probe.as_ref())?;
            monitor.memory_ratio()
        };
        let action = lock(&self.controller).on_memory_sample(ratio, now);
        match action {
            MemoryAction::None => {}
            MemoryAction::Cleanup { ratio } => {
                lock(&self.monitor).trim();
                self.events.publish(CompanionEvent::MemoryPressure {
                    ratio,
                    critical: false,
                });
            }
            MemoryAction::Reduce { ratio, profile } => {
                lock(&self.monitor).trim();
                self.push_profile(profile);
                self.events.publish(CompanionEvent::MemoryPressure {
                    ratio,
                    critical: true,
                });
            }
        }
        Ok(action)
    }

    /// Runs `change` against the controller and applies the profile it returns.
    pub(crate) fn with_controller<F>(&self, change: F) -> Result<QualityProfile, AnimationError>
    where
        F: FnOnce(&mut QualityController) -> Result<QualityProfile, AnimationError>,
    {
        let profile = change(&mut lock(&self.controller))?;
        self.push_profile(profile);
        Ok(profile)
    }

    pub(crate) fn set_optimization_enabled(&self, enabled: bool) {
        lock(&self.controller).set_optimization_enabled(enabled);
    }

    fn push_profile(&self, profile: QualityProfile) {
        // Applied to the animator at the start of the next frame.
        *self.profile.write().unwrap_or_else(|e| e.into_inner()) = profile;
        self.events.publish(CompanionEvent::QualityChanged {
            level: profile.level,
            target_fps: profile.target_fps,
        });
    }

    pub(crate) fn profile(&self) -> QualityProfile {
        *self.profile.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn info(&self) -> AnimationInfo {
        self.info.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn stats(&self) -> PerformanceStats {
        let snapshot = lock(&self.monitor).snapshot();
        lock(&self.controller).stats(&snapshot)
    }

    pub(crate) fn recommendations(&self) -> Vec<String> {
        let snapshot = lock(&self.monitor).snapshot();
        lock(&self.controller).recommendations(&snapshot)
    }

    pub(crate) fn preference(&self) -> Option<kizuna_core::QualityLevel> {
        lock(&self.controller).preference()
    }

    pub(crate) fn optimization_enabled(&self) -> bool {
        lock(&self.controller).optimization_enabled()
    }

    pub(crate) fn reset_performance(&self) {
        lock(&self.monitor).reset();
    }

    pub(crate) fn cancel_pending(&self) -> bool {
        lock(&self.animator).cancel_pending()
    }
}
