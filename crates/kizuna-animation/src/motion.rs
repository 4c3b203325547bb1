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

//! Timed body motions.
//!
//! The [`MotionChannel`] holds every motion that still contributes to the pose.
//! Only the most recently played one is the *main* motion; older ones keep
//! fading out until their weight reaches zero and they are retired.

use crate::blend::{approach, WEIGHT_EPSILON};
use kizuna_core::parameter::ids;
use kizuna_core::{MotionGroup, MotionHandle, ParameterId};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;

/// Motion sampling rate at full animation quality, in samples per second.
const FULL_SAMPLE_RATE: f32 = 60.0;

/// Static description of a procedural motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionDefinition {
    /// Unique name, e.g. `tap_body_01`.
    pub name: String,
    /// Family the motion belongs to.
    pub group: MotionGroup,
    /// Position within the family.
    pub index: usize,
    /// Length of one play-through, in seconds.
    pub duration_secs: f32,
    /// Oscillation cycles per play-through.
    pub frequency: f32,
    /// Peak offset applied to each driven parameter.
    pub amplitudes: Vec<(ParameterId, f32)>,
    /// Whether the motion must be unlocked before it can play.
    pub lockable: bool,
}

impl MotionDefinition {
    fn new(
        group: MotionGroup,
        index: usize,
        duration_secs: f32,
        frequency: f32,
        amplitudes: Vec<(ParameterId, f32)>,
    ) -> Self {
        let name = if group == MotionGroup::Idle && index == 0 {
            group.as_str().to_owned()
        } else {
            format!("{}_{:02}", group.as_str(), index)
        };
        Self {
            name,
            group,
            index,
            duration_secs,
            frequency,
            amplitudes,
            lockable: group == MotionGroup::Special,
        }
    }
}

/// The set of motions the avatar knows.
#[derive(Debug, Clone, Default)]
pub struct MotionLibrary {
    definitions: Vec<Arc<MotionDefinition>>,
    by_name: HashMap<String, usize>,
}

impl MotionLibrary {
    /// Builds a library from definitions. Later duplicates replace earlier ones.
    pub fn new(definitions: impl IntoIterator<Item = MotionDefinition>) -> Self {
        let mut library = Self::default();
        for definition in definitions {
            library.insert(definition);
        }
        library
    }

    /// The stock motions bundled with the default avatar.
    pub fn standard() -> Self {
        use MotionGroup::*;
        Self::new([
            MotionDefinition::new(Idle, 0, 4.0, 1.0, vec![(ids::BREATH, 0.5), (ids::ANGLE_Z, 2.0)]),
            MotionDefinition::new(Idle, 1, 6.0, 1.0, vec![(ids::BREATH, 0.4), (ids::ANGLE_Y, -4.0)]),
            MotionDefinition::new(
                TapBody,
                0,
                1.5,
                2.0,
                vec![(ids::BODY_ANGLE_X, 6.0), (ids::ANGLE_Y, 5.0)],
            ),
            MotionDefinition::new(
                TapBody,
                1,
                2.0,
                3.0,
                vec![(ids::BODY_ANGLE_X, 8.0), (ids::BODY_ANGLE_Z, 4.0)],
            ),
            MotionDefinition::new(Shake, 0, 1.2, 3.0, vec![(ids::ANGLE_X, 15.0)]),
            MotionDefinition::new(
                Shake,
                1,
                1.0,
                4.0,
                vec![(ids::ANGLE_X, 20.0), (ids::BODY_ANGLE_X, 5.0)],
            ),
            MotionDefinition::new(Nod, 0, 1.6, 2.0, vec![(ids::ANGLE_Y, 12.0)]),
            MotionDefinition::new(
                Nod,
                1,
                2.0,
                1.0,
                vec![(ids::ANGLE_Y, 6.0), (ids::ANGLE_Z, 10.0)],
            ),
            MotionDefinition::new(
                Special,
                0,
                3.0,
                2.0,
                vec![(ids::BODY_ANGLE_Z, 10.0), (ids::ANGLE_Z, 8.0)],
            ),
            MotionDefinition::new(
                Special,
                1,
                2.5,
                2.0,
                vec![(ids::BODY_ANGLE_X, 10.0), (ids::ANGLE_X, 10.0)],
            ),
        ])
    }

    fn insert(&mut self, definition: MotionDefinition) {
        let name = definition.name.clone();
        let definition = Arc::new(definition);
        match self.by_name.get(&name) {
            Some(&slot) => self.definitions[slot] = definition,
            None => {
                self.by_name.insert(name, self.definitions.len());
                self.definitions.push(definition);
            }
        }
    }

    /// Looks a motion up by its exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<MotionDefinition>> {
        self.by_name.get(name).map(|&slot| &self.definitions[slot])
    }

    /// Resolves a motion name, accepting a bare group name for its first member.
    pub fn resolve(&self, name: &str) -> Option<&Arc<MotionDefinition>> {
        self.get(name).or_else(|| {
            MotionGroup::from_name(name).and_then(|group| self.member(group, 0))
        })
    }

    /// Returns the motion at `index` within `group`.
    pub fn member(&self, group: MotionGroup, index: usize) -> Option<&Arc<MotionDefinition>> {
        self.definitions
            .iter()
            .find(|d| d.group == group && d.index == index)
    }

    /// Iterates over all definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MotionDefinition>> {
        self.definitions.iter()
    }

    /// Number of known motions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// One playback of a motion.
#[derive(Debug, Clone)]
pub struct MotionState {
    handle: MotionHandle,
    definition: Arc<MotionDefinition>,
    current_time: f32,
    weight: f32,
    target_weight: f32,
    looping: bool,
    finished: bool,
    released: bool,
    intensity: f32,
}

impl MotionState {
    fn new(
        handle: MotionHandle,
        definition: Arc<MotionDefinition>,
        looping: bool,
        intensity: f32,
    ) -> Self {
        Self {
            handle,
            definition,
            current_time: 0.0,
            weight: 0.0,
            target_weight: 1.0,
            looping,
            finished: false,
            released: false,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// Handle of this playback.
    pub fn handle(&self) -> MotionHandle {
        self.handle
    }

    /// Name of the motion.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The static definition being played.
    pub fn definition(&self) -> &MotionDefinition {
        &self.definition
    }

    /// Seconds since the playback started (wrapped for looping motions).
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Current blend weight in `[0, 1]`.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Weight the playback is moving toward.
    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    /// Whether the playback wraps around at the end.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Whether a non-looping playback ran to its end.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Energy scaling applied to the contribution.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    fn release(&mut self) {
        self.target_weight = 0.0;
        self.released = true;
    }

    fn advance(&mut self, dt: f32, blend_speed: f32) {
        let duration = self.definition.duration_secs.max(f32::EPSILON);
        self.current_time += dt;
        if self.looping && self.current_time >= duration {
            self.current_time %= duration;
        }

        self.weight = approach(self.weight, self.target_weight, blend_speed, dt);

        if !self.looping && !self.finished && self.current_time >= duration {
            self.current_time = duration;
            self.finished = true;
            self.target_weight = 0.0;
        }
    }

    fn is_expired(&self) -> bool {
        (self.finished || self.released) && self.weight <= WEIGHT_EPSILON
    }

    /// Adds this playback's weighted offsets to `out`.
    ///
    /// Time is quantised to `FULL_SAMPLE_RATE * quality` samples per second, so
    /// lower animation quality yields fewer distinct poses.
    fn contribute(&self, quality: f32, out: &mut HashMap<ParameterId, f32>) {
        if self.weight <= 0.0 {
            return;
        }
        let samples_per_sec = (FULL_SAMPLE_RATE * quality).max(1.0);
        let sampled = (self.current_time * samples_per_sec).floor() / samples_per_sec;
        let phase = sampled / self.definition.duration_secs.max(f32::EPSILON);
        let wave = (TAU * self.definition.frequency * phase).sin();
        let scale = wave * self.weight * self.intensity;

        for (id, amplitude) in &self.definition.amplitudes {
            *out.entry(id.clone()).or_insert(0.0) += amplitude * scale;
        }
    }
}

/// Zero or more concurrently playing motions.
#[derive(Debug)]
pub struct MotionChannel {
    active: Vec<MotionState>,
    main: Option<MotionHandle>,
    blend_speed: f32,
    quality: f32,
}

impl MotionChannel {
    /// Creates an empty channel.
    pub fn new(blend_speed: f32) -> Self {
        Self {
            active: Vec::new(),
            main: None,
            blend_speed,
            quality: 1.0,
        }
    }

    /// Starts a motion with a freshly allocated handle.
    pub fn play(
        &mut self,
        definition: Arc<MotionDefinition>,
        looping: bool,
        intensity: f32,
    ) -> MotionHandle {
        let handle = MotionHandle::fresh();
        self.play_with_handle(handle, definition, looping, intensity);
        handle
    }

    /// Starts a motion under a handle allocated by the caller.
    ///
    /// The previous main motion fades out and the new playback becomes main.
    pub fn play_with_handle(
        &mut self,
        handle: MotionHandle,
        definition: Arc<MotionDefinition>,
        looping: bool,
        intensity: f32,
    ) {
        if let Some(previous) = self.main.and_then(|h| self.state_mut(h)) {
            previous.release();
        }
        log::debug!(
            "MotionChannel: playing '{}' (handle={}, loop={})",
            definition.name,
            handle.raw(),
            looping
        );
        self.active
            .push(MotionState::new(handle, definition, looping, intensity));
        self.main = Some(handle);
    }

    /// Fades every active motion out. They are retired once their weight is zero.
    pub fn stop_all(&mut self) {
        for state in &mut self.active {
            state.release();
        }
    }

    /// Advances time and weights, then retires expired playbacks.
    ///
    /// Returns the retired playbacks.
    pub fn tick(&mut self, dt: f32) -> Vec<MotionState> {
        for state in &mut self.active {
            state.advance(dt, self.blend_speed);
        }

        let mut retired = Vec::new();
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].is_expired() {
                let state = self.active.remove(index);
                if self.main == Some(state.handle) {
                    self.main = None;
                }
                retired.push(state);
            } else {
                index += 1;
            }
        }
        retired
    }

    /// Adds the weighted contribution of every active playback to `out`.
    pub fn contribute(&self, out: &mut HashMap<ParameterId, f32>) {
        for state in &self.active {
            state.contribute(self.quality, out);
        }
    }

    /// Sets the animation quality factor used to sample motions.
    pub fn set_quality(&mut self, quality: f32) {
        self.quality = quality.clamp(0.0, 1.0);
    }

    /// The main motion, if one is still playing.
    pub fn main_motion(&self) -> Option<&MotionState> {
        self.main.and_then(|h| self.get(h))
    }

    /// Looks a playback up by handle.
    pub fn get(&self, handle: MotionHandle) -> Option<&MotionState> {
        self.active.iter().find(|s| s.handle == handle)
    }

    fn state_mut(&mut self, handle: MotionHandle) -> Option<&mut MotionState> {
        self.active.iter_mut().find(|s| s.handle == handle)
    }

    /// Finds the most recent playback of a motion by name.
    pub fn find(&self, name: &str) -> Option<&MotionState> {
        self.active.iter().rev().find(|s| s.name() == name)
    }

    /// All playbacks still contributing, oldest first.
    pub fn active(&self) -> &[MotionState] {
        &self.active
    }

    /// Returns `true` if any playback has a non-zero target weight.
    pub fn is_playing(&self) -> bool {
        self.active.iter().any(|s| s.target_weight > 0.0)
    }

    /// Drops every playback immediately.
    pub fn clear(&mut self) {
        self.active.clear();
        self.main = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn library() -> MotionLibrary {
        MotionLibrary::standard()
    }

    fn def(name: &str) -> Arc<MotionDefinition> {
        library().get(name).cloned().expect("known motion")
    }

    #[test]
    fn test_standard_library_names() {
        let lib = library();
        assert!(lib.get("idle").is_some());
        assert!(lib.get("idle_01").is_some());
        assert!(lib.get("tap_body_00").is_some());
        assert!(lib.get("special_01").unwrap().lockable);
        assert!(!lib.get("shake_00").unwrap().lockable);
        assert_eq!(lib.resolve("tap_body").unwrap().name, "tap_body_00");
        assert!(lib.resolve("moonwalk").is_none());
        assert_eq!(lib.member(MotionGroup::Nod, 1).unwrap().name, "nod_01");
    }

    #[test]
    fn test_new_motion_becomes_main_and_fades_in() {
        let mut channel = MotionChannel::new(5.0);
        let handle = channel.play(def("nod_00"), false, 1.0);
        assert_eq!(channel.main_motion().map(|m| m.handle()), Some(handle));
        assert_eq!(channel.get(handle).unwrap().weight(), 0.0);

        let mut last = 0.0;
        for _ in 0..30 {
            channel.tick(DT);
            let weight = channel.get(handle).unwrap().weight();
            assert!(weight >= last);
            assert!((0.0..=1.0).contains(&weight));
            last = weight;
        }
        assert!(last > 0.9);
    }

    #[test]
    fn test_replacing_main_releases_previous() {
        let mut channel = MotionChannel::new(5.0);
        let idle = channel.play(def("idle"), true, 1.0);
        for _ in 0..60 {
            channel.tick(DT);
        }
        let tap = channel.play(def("tap_body_00"), false, 1.0);
        assert_eq!(channel.get(idle).unwrap().target_weight(), 0.0);
        assert_eq!(channel.main_motion().unwrap().handle(), tap);
        assert_eq!(channel.active().len(), 2);
    }

    #[test]
    fn test_finished_motion_is_retired_after_fading() {
        let mut channel = MotionChannel::new(5.0);
        let handle = channel.play(def("shake_00"), false, 1.0);

        let mut retired = Vec::new();
        for _ in 0..(60 * 4) {
            retired.extend(channel.tick(DT));
        }
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].handle(), handle);
        assert!(retired[0].is_finished());
        assert!(channel.get(handle).is_none());
        assert!(channel.main_motion().is_none());
    }

    #[test]
    fn test_looping_motion_never_finishes() {
        let mut channel = MotionChannel::new(5.0);
        let handle = channel.play(def("idle"), true, 1.0);
        for _ in 0..(60 * 10) {
            assert!(channel.tick(DT).is_empty());
        }
        let state = channel.get(handle).unwrap();
        assert!(!state.is_finished());
        assert!(state.current_time() < state.definition().duration_secs);
        assert_eq!(state.weight(), 1.0);
    }

    #[test]
    fn test_stop_all_keeps_main_until_decayed() {
        let mut channel = MotionChannel::new(5.0);
        let handle = channel.play(def("idle"), true, 1.0);
        for _ in 0..60 {
            channel.tick(DT);
        }
        channel.stop_all();
        assert!(!channel.is_playing());
        assert_eq!(channel.main_motion().map(|m| m.handle()), Some(handle));

        for _ in 0..120 {
            channel.tick(DT);
        }
        assert!(channel.main_motion().is_none());
        assert!(channel.active().is_empty());
    }

    #[test]
    fn test_contribution_scales_with_weight_and_intensity() {
        let mut channel = MotionChannel::new(1000.0);
        channel.play(def("shake_00"), true, 0.5);
        // Quarter of the way through one of three cycles: sin(TAU * 3 * 0.25 / 3) = 1.
        channel.tick(0.1);

        let mut out = HashMap::new();
        channel.contribute(&mut out);
        let state = &channel.active()[0];
        let phase = state.current_time() / state.definition().duration_secs;
        let expected = 15.0 * (TAU * 3.0 * phase).sin() * state.weight() * 0.5;
        assert_abs_diff_eq!(out["ParamAngleX"], expected, epsilon = 1e-3);
    }

    #[test]
    fn test_contributions_from_overlapping_motions_add_up() {
        let mut channel = MotionChannel::new(5.0);
        channel.play(def("shake_00"), true, 1.0);
        channel.play(def("shake_01"), true, 1.0);
        for _ in 0..5 {
            channel.tick(DT);
        }

        let mut together = HashMap::new();
        channel.contribute(&mut together);

        let mut separate = 0.0;
        for state in channel.active() {
            let mut out = HashMap::new();
            state.contribute(1.0, &mut out);
            separate += out.get("ParamAngleX").copied().unwrap_or(0.0);
        }
        assert_abs_diff_eq!(together["ParamAngleX"], separate, epsilon = 1e-5);
    }
}
