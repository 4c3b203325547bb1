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

//! The blend loop body.
//!
//! The [`Animator`] is the only writer of the [`ParameterStore`]. Every call to
//! [`Animator::tick`] runs one frame:
//!
//! 1. Fire due auto behaviors.
//! 2. Advance the motion and expression channels.
//! 3. Rebuild the frame targets from the rest pose, expression deltas, motion
//!    offsets, overrides and hair physics, in that order.
//! 4. Ease the store's current values toward the targets.

use crate::catalog::ContentCatalog;
use crate::command::AnimationCommand;
use crate::config::AnimationConfig;
use crate::expression::ExpressionChannel;
use crate::motion::MotionChannel;
use crate::scheduler::{AutoBehavior, AutoBehaviorScheduler};
use kizuna_core::parameter::ids;
use kizuna_core::{CompanionEvent, MotionGroup, ParameterId, ParameterStore, QualityProfile};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Head plus body yaw that swings the hair fully to one side.
const HAIR_FULL_SWING_DEGREES: f32 = 30.0;

/// Longest frame a single tick simulates, in seconds.
pub const MAX_TICK_SECS: f32 = 1.0;

/// What the UI shows about the running animation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationInfo {
    /// Name of the main motion, if any.
    pub active_motion: Option<String>,
    /// Whether any motion is still fading in or playing.
    pub is_playing: bool,
    /// Name of the settled expression, if any.
    pub expression: Option<String>,
}

/// Drives the motion and expression channels and writes the parameter store.
#[derive(Debug)]
pub struct Animator {
    config: AnimationConfig,
    store: Arc<ParameterStore>,
    catalog: ContentCatalog,
    motions: MotionChannel,
    expressions: ExpressionChannel,
    scheduler: AutoBehaviorScheduler,
    profile: QualityProfile,
    overrides: HashMap<ParameterId, f32>,
    frame: HashMap<ParameterId, f32>,
    events: Vec<CompanionEvent>,
    clock: Duration,
}

impl Animator {
    /// Creates an animator writing to `store`, with auto behaviors armed for `profile`.
    pub fn new(
        config: AnimationConfig,
        store: Arc<ParameterStore>,
        catalog: ContentCatalog,
        profile: QualityProfile,
        seed: Option<u64>,
    ) -> Self {
        let mut motions = MotionChannel::new(config.blend_speed);
        motions.set_quality(profile.anim_quality_factor);
        let mut scheduler = AutoBehaviorScheduler::new(config.clone(), seed);
        scheduler.apply_profile(&profile, Duration::ZERO);

        Self {
            expressions: ExpressionChannel::new(config.blend_speed),
            frame: HashMap::with_capacity(store.len()),
            config,
            store,
            catalog,
            motions,
            scheduler,
            profile,
            overrides: HashMap::new(),
            events: Vec::new(),
            clock: Duration::ZERO,
        }
    }

    /// Applies a queued state change.
    pub fn apply(&mut self, command: AnimationCommand) {
        match command {
            AnimationCommand::PlayMotion {
                handle,
                definition,
                looping,
                intensity,
            } => {
                let name = definition.name.clone();
                self.motions
                    .play_with_handle(handle, definition, looping, intensity);
                self.events
                    .push(CompanionEvent::MotionStarted { handle, name });
            }
            AnimationCommand::PlayExpression {
                definition,
                fade_secs,
            } => {
                self.expressions.play(definition, fade_secs);
            }
            AnimationCommand::StopAllMotions => self.motions.stop_all(),
            AnimationCommand::ApplyProfile(profile) => self.apply_profile(profile),
            AnimationCommand::SetOverride(id, value) => {
                self.overrides.insert(id, value);
            }
            AnimationCommand::ClearOverride(id) => {
                self.overrides.remove(&id);
            }
            AnimationCommand::Reset => self.reset(),
        }
    }

    fn apply_profile(&mut self, profile: QualityProfile) {
        log::debug!(
            "Animator: applying {} profile (anim quality {:.2}, physics {})",
            profile.level,
            profile.anim_quality_factor,
            profile.physics_enabled
        );
        self.motions.set_quality(profile.anim_quality_factor);
        self.scheduler.apply_profile(&profile, self.clock);
        self.profile = profile;
    }

    fn reset(&mut self) {
        self.motions.clear();
        self.expressions.clear();
        self.overrides.clear();
        // Timers restart from now so the rest pose holds for a full interval.
        self.scheduler.disarm();
        self.scheduler.apply_profile(&self.profile, self.clock);
        self.store.reset();
    }

    /// Runs one frame of `dt` seconds. Returns how many parameters moved.
    ///
    /// `dt` is clamped to `[0, MAX_TICK_SECS]`; NaN counts as zero.
    pub fn tick(&mut self, dt: f32) -> usize {
        let dt = dt.max(0.0).min(MAX_TICK_SECS);
        self.clock += Duration::from_secs_f32(dt);

        let mut snap: Vec<ParameterId> = Vec::new();
        for behavior in self.scheduler.poll(self.clock) {
            self.run_behavior(behavior, &mut snap);
        }

        for retired in self.motions.tick(dt) {
            self.events.push(CompanionEvent::MotionFinished {
                handle: retired.handle(),
                name: retired.name().to_owned(),
            });
        }
        if let Some(name) = self.expressions.tick(dt) {
            self.events.push(CompanionEvent::ExpressionChanged { name });
        }

        self.build_frame();

        let rate = (self.config.ease_rate_per_second * dt).min(1.0);
        self.store.apply_frame(&self.frame, rate, &snap)
    }

    fn run_behavior(&mut self, behavior: AutoBehavior, snap: &mut Vec<ParameterId>) {
        match behavior {
            AutoBehavior::BlinkClose => {
                for id in &ids::EYES_OPEN {
                    self.store.set_current(id, 0.0);
                }
            }
            AutoBehavior::BlinkOpen => snap.extend(ids::EYES_OPEN),
            AutoBehavior::IdleMotion => {
                if self.motions.main_motion().is_some() {
                    return;
                }
                match self.catalog.resolve_motion_group(MotionGroup::Idle, 0) {
                    Ok(definition) => {
                        let name = definition.name.clone();
                        let handle = self.motions.play(definition, false, 1.0);
                        self.events
                            .push(CompanionEvent::MotionStarted { handle, name });
                    }
                    Err(e) => log::warn!("Animator: idle motion unavailable: {}", e),
                }
            }
            AutoBehavior::RandomExpression => {
                let current = self.expressions.current().map(|c| c.name().to_owned());
                let candidates: Vec<_> = self
                    .catalog
                    .playable_expressions()
                    .into_iter()
                    .filter(|d| Some(&d.name) != current.as_ref())
                    .collect();
                if let Some(definition) = self.scheduler.choose(&candidates) {
                    log::trace!("Animator: random expression '{}'", definition.name);
                    self.expressions.play(Arc::clone(definition), None);
                }
            }
        }
    }

    fn build_frame(&mut self) {
        self.frame.clear();
        self.frame
            .extend(self.store.defaults().iter().map(|(id, v)| (id.clone(), *v)));

        self.expressions.contribute(&mut self.frame);
        self.motions.contribute(&mut self.frame);

        for (id, value) in &self.overrides {
            self.frame.insert(id.clone(), *value);
        }

        if self.profile.physics_enabled {
            let yaw = self.frame.get(ids::ANGLE_X.as_str()).copied().unwrap_or(0.0)
                + self
                    .frame
                    .get(ids::BODY_ANGLE_X.as_str())
                    .copied()
                    .unwrap_or(0.0);
            let sway = (-yaw / HAIR_FULL_SWING_DEGREES * self.config.hair_follow).clamp(-1.0, 1.0);
            *self.frame.entry(ids::HAIR_FRONT).or_insert(0.0) += sway;
            *self.frame.entry(ids::HAIR_BACK).or_insert(0.0) += sway * 0.5;
        }

        if self.scheduler.is_blinking() {
            for id in ids::EYES_OPEN {
                self.frame.insert(id, 0.0);
            }
        }
    }

    /// Drains the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<CompanionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drops the pending blink restore. The eyes ease back open on the next tick.
    pub fn cancel_pending(&mut self) -> bool {
        self.scheduler.cancel_pending()
    }

    /// Main motion, playing state and settled expression.
    pub fn info(&self) -> AnimationInfo {
        AnimationInfo {
            active_motion: self.motions.main_motion().map(|m| m.name().to_owned()),
            is_playing: self.motions.is_playing(),
            expression: self.expressions.current().map(|e| e.name().to_owned()),
        }
    }

    /// The motion channel.
    pub fn motions(&self) -> &MotionChannel {
        &self.motions
    }

    /// The expression channel.
    pub fn expressions(&self) -> &ExpressionChannel {
        &self.expressions
    }

    /// The profile currently in effect.
    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    /// Targets computed by the last tick.
    pub fn frame_targets(&self) -> &HashMap<ParameterId, f32> {
        &self.frame
    }

    /// Time accumulated from every tick so far.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// The store this animator writes to.
    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }
}
