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


//! The explicitly-owned companion facade.

use crate::config::CompanionConfig;
use crate::runtime::TaskSet;
use crate::session::Session;
use anyhow::{Context, Result};
use kizuna_animation::{
    AnimationCommand, AnimationInfo, ContentCatalog, ExpressionLibrary, MotionDefinition,
    MotionLibrary,
};
use kizuna_control::{MemoryAction, PerformanceStats};
use kizuna_core::{
    AnimationError, CompanionEvent, ContentKind, Emotion, MotionGroup, MotionHandle, ParameterId,
    ParameterView, QualityLevel, QualityProfile, SystemProbe, UnlockRegistry, UnlockSet,
};
use kizuna_telemetry::SysinfoProbe;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One avatar session.
///
/// Owns the parameter store, the animation channels and the quality loop.
/// Nothing in the public API returns an error: rejected requests return
/// `false` (or `None`) and are logged.
pub struct Companion {
    session: Arc<Session>,
    tasks: Mutex<TaskSet>,
}

impl Companion {
    /// Creates a session with the stock content, an empty unlock set and a
    /// `sysinfo` system probe.
    pub fn new(config: CompanionConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Starts a builder for custom content, unlocks or probe.
    pub fn builder(config: CompanionConfig) -> CompanionBuilder {
        CompanionBuilder {
            config,
            motions: None,
            expressions: None,
            unlocks: None,
            probe: None,
        }
    }

    // --- Lifecycle ---

    /// Spawns the blend loop and the two sampling tasks on the current tokio runtime.
    ///
    /// Calling `start` on a running session does nothing.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("Companion::start must be called from within a tokio runtime")?;
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if !tasks.is_empty() {
            return Ok(());
        }
        *tasks = TaskSet::spawn(Arc::clone(&self.session), &runtime);
        log::info!("Companion started.");
        Ok(())
    }

    /// Cancels the three tasks and any pending blink restore.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if tasks.is_empty() {
            return;
        }
        tasks.abort();
        self.session.cancel_pending();
        log::info!("Companion stopped.");
    }

    /// Returns `true` between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        !self.tasks.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    /// Runs one blend loop frame by hand. Returns how many parameters moved.
    ///
    /// Meant for hosts that drive their own frame loop instead of calling `start`.
    pub fn step(&self, dt: f32) -> usize {
        self.session.step(dt)
    }

    /// Runs one FPS evaluation by hand at session time `now`.
    pub fn sample_fps_at(&self, now: Duration) -> Option<QualityProfile> {
        self.session.sample_fps(now)
    }

    /// Runs one memory reading by hand at session time `now`.
    pub fn sample_memory_at(&self, now: Duration) -> Option<MemoryAction> {
        match self.session.sample_memory(now) {
            Ok(action) => Some(action),
            Err(e) => {
                log::warn!("Companion: memory sample failed: {}", e);
                None
            }
        }
    }

    // --- Emotions, motions and expressions ---

    /// Maps an emotion label to an expression and a motion and plays both.
    ///
    /// The motion intensity is the emotion's energy level. A locked or
    /// unknown motion is skipped while the expression still plays. Returns
    /// `false` for an unknown label or if neither part could be played.
    pub fn set_emotion(&self, label: &str) -> bool {
        let emotion = match label.parse::<Emotion>() {
            Ok(emotion) => emotion,
            Err(e) => {
                log::warn!("Companion: {}", e);
                return false;
            }
        };
        let response = emotion.response();
        log::debug!("Companion: emotion '{}' -> {:?}", emotion, response);

        let expression = self.play_expression(response.expression, None);
        let motion = self
            .session
            .catalog
            .resolve_motion_group(response.motion_group, response.motion_index)
            .map_err(|e| log::warn!("Companion: emotion '{}' motion skipped: {}", emotion, e))
            .ok()
            .and_then(|definition| self.enqueue_motion(definition, false, response.energy));
        expression || motion.is_some()
    }

    /// Plays a motion by name (or bare group name) at full intensity.
    ///
    /// Returns the playback handle, or `None` if the name is unknown or locked.
    pub fn play_motion(&self, name: &str, looping: bool) -> Option<MotionHandle> {
        match self.session.catalog.resolve_motion(name) {
            Ok(definition) => self.enqueue_motion(definition, looping, 1.0),
            Err(e) => {
                log::warn!("Companion: play_motion rejected: {}", e);
                None
            }
        }
    }

    /// Plays the motion at `index` within `group`.
    pub fn play_motion_group(
        &self,
        group: MotionGroup,
        index: usize,
        looping: bool,
    ) -> Option<MotionHandle> {
        match self.session.catalog.resolve_motion_group(group, index) {
            Ok(definition) => self.enqueue_motion(definition, looping, 1.0),
            Err(e) => {
                log::warn!("Companion: play_motion_group rejected: {}", e);
                None
            }
        }
    }

    fn enqueue_motion(
        &self,
        definition: Arc<MotionDefinition>,
        looping: bool,
        intensity: f32,
    ) -> Option<MotionHandle> {
        let handle = MotionHandle::fresh();
        self.session
            .enqueue(AnimationCommand::PlayMotion {
                handle,
                definition,
                looping,
                intensity,
            })
            .then_some(handle)
    }

    /// Cross-fades to an expression. `fade_secs` overrides the default speed.
    pub fn play_expression(&self, name: &str, fade_secs: Option<f32>) -> bool {
        match self.session.catalog.resolve_expression(name) {
            Ok(definition) => self.session.enqueue(AnimationCommand::PlayExpression {
                definition,
                fade_secs,
            }),
            Err(e) => {
                log::warn!("Companion: play_expression rejected: {}", e);
                false
            }
        }
    }

    /// Fades every motion out.
    pub fn stop_all_motions(&self) {
        self.session.enqueue(AnimationCommand::StopAllMotions);
    }

    /// Drops every motion, expression and override and returns to the rest pose.
    pub fn reset_pose(&self) {
        self.session.enqueue(AnimationCommand::Reset);
    }

    // --- Unlocks ---

    /// Unlocks a motion. Returns `false` if the catalog does not know it.
    pub fn unlock_motion(&self, id: &str) -> bool {
        self.unlock(ContentKind::Motion, id)
    }

    /// Unlocks an expression. Returns `false` if the catalog does not know it.
    pub fn unlock_expression(&self, id: &str) -> bool {
        self.unlock(ContentKind::Expression, id)
    }

    fn unlock(&self, kind: ContentKind, id: &str) -> bool {
        let catalog = &self.session.catalog;
        if !catalog.contains(kind, id) {
            log::warn!("Companion: cannot unlock {}", AnimationError::unknown(kind, id));
            return false;
        }
        let newly = match kind {
            ContentKind::Motion => catalog.unlocks().unlock_motion(id),
            ContentKind::Expression => catalog.unlocks().unlock_expression(id),
        };
        if newly {
            self.session.events.publish(CompanionEvent::ContentUnlocked {
                kind,
                id: id.to_owned(),
            });
        }
        true
    }

    /// Returns `true` if `id` is free content or has been unlocked.
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.session.catalog.is_unlocked(id)
    }

    // --- Parameters ---

    /// Snapshot of every parameter's current value.
    pub fn current_parameters(&self) -> HashMap<ParameterId, f32> {
        self.session.store.snapshot()
    }

    /// A cheap read-only handle for a renderer thread.
    pub fn parameter_view(&self) -> ParameterView {
        ParameterView::new(Arc::clone(&self.session.store))
    }

    /// Pins the target of a parameter, e.g. the mouth during speech.
    ///
    /// The value is still eased. Returns `false` for an unknown parameter.
    pub fn set_parameter_override(&self, id: &str, value: f32) -> bool {
        match self.known_parameter(id) {
            Some(id) => self
                .session
                .enqueue(AnimationCommand::SetOverride(id, value)),
            None => false,
        }
    }

    /// Releases a pinned parameter.
    pub fn clear_parameter_override(&self, id: &str) -> bool {
        match self.known_parameter(id) {
            Some(id) => self.session.enqueue(AnimationCommand::ClearOverride(id)),
            None => false,
        }
    }

    fn known_parameter(&self, id: &str) -> Option<ParameterId> {
        let known = self
            .session
            .store
            .defaults()
            .get_key_value(id)
            .map(|(id, _)| id.clone());
        if known.is_none() {
            log::warn!("Companion: {}", AnimationError::invalid("parameter id", id));
        }
        known
    }

    // --- Diagnostics ---

    /// Main motion and playing state as of the last frame.
    pub fn current_animation_info(&self) -> AnimationInfo {
        self.session.info()
    }

    /// The settled expression as of the last frame.
    pub fn current_expression_name(&self) -> Option<String> {
        self.session.info().expression
    }

    /// Tier, level, target FPS and the rolling averages.
    pub fn performance_stats(&self) -> PerformanceStats {
        self.session.stats()
    }

    /// Human-readable advice derived from the current figures.
    pub fn optimization_recommendations(&self) -> Vec<String> {
        self.session.recommendations()
    }

    /// Clears the frame and memory windows.
    pub fn reset_performance_stats(&self) {
        self.session.reset_performance();
    }

    // --- Quality ---

    /// Switches to a quality level by tag (`high`, `medium`, `low`, `ultra_low`).
    ///
    /// An unknown tag leaves the level unchanged and returns `false`.
    pub fn set_quality_level(&self, tag: &str) -> bool {
        let now = self.session.elapsed();
        self.report(
            "set_quality_level",
            self.session
                .with_controller(|controller| controller.set_level_by_name(tag, now)),
        )
    }

    /// Sets the blend loop cadence. Accepts 10 to 60 FPS.
    pub fn set_target_fps(&self, fps: u32) -> bool {
        self.report(
            "set_target_fps",
            self.session
                .with_controller(|controller| controller.set_target_fps(fps)),
        )
    }

    /// Turns automatic quality adaptation on or off.
    pub fn set_optimization_enabled(&self, enabled: bool) {
        self.session.set_optimization_enabled(enabled);
    }

    /// Whether automatic quality adaptation is on.
    pub fn optimization_enabled(&self) -> bool {
        self.session.optimization_enabled()
    }

    /// The active quality profile.
    pub fn quality_profile(&self) -> QualityProfile {
        self.session.profile()
    }

    /// The level last chosen by hand, for the settings collaborator to persist.
    pub fn quality_preference(&self) -> Option<QualityLevel> {
        self.session.preference()
    }

    fn report(&self, operation: &str, result: Result<QualityProfile, AnimationError>) -> bool {
        match result {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Companion: {} rejected: {}", operation, e);
                false
            }
        }
    }

    // --- Events ---

    /// Subscribes to session events.
    pub fn subscribe(&self) -> flume::Receiver<CompanionEvent> {
        self.session.events.subscribe()
    }
}

impl Drop for Companion {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("running", &self.is_running())
            .field("profile", &self.quality_profile())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Companion`] from optional custom parts.
pub struct CompanionBuilder {
    config: CompanionConfig,
    motions: Option<MotionLibrary>,
    expressions: Option<ExpressionLibrary>,
    unlocks: Option<Arc<dyn UnlockRegistry>>,
    probe: Option<Arc<dyn SystemProbe>>,
}

impl CompanionBuilder {
    /// Replaces the stock motions.
    pub fn motions(mut self, motions: MotionLibrary) -> Self {
        self.motions = Some(motions);
        self
    }

    /// Replaces the stock expressions.
    pub fn expressions(mut self, expressions: ExpressionLibrary) -> Self {
        self.expressions = Some(expressions);
        self
    }

    /// Uses an existing unlock registry, e.g. one restored from saved settings.
    pub fn unlocks(mut self, unlocks: Arc<dyn UnlockRegistry>) -> Self {
        self.unlocks = Some(unlocks);
        self
    }

    /// Uses a custom system probe.
    pub fn probe(mut self, probe: Arc<dyn SystemProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Validates the configuration and creates the session.
    pub fn build(self) -> Result<Companion> {
        self.config
            .validate()
            .context("Invalid companion configuration")?;

        let catalog = ContentCatalog::new(
            self.motions.unwrap_or_else(MotionLibrary::standard),
            self.expressions.unwrap_or_else(ExpressionLibrary::standard),
            self.unlocks.unwrap_or_else(|| Arc::new(UnlockSet::new())),
        );
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(SysinfoProbe::new()));

        Ok(Companion {
            session: Arc::new(Session::new(self.config, catalog, probe)),
            tasks: Mutex::new(TaskSet::default()),
        })
    }
}
