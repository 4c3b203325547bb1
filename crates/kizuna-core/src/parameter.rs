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

//! Avatar parameters and the store shared with the renderer.
//!
//! The [`ParameterStore`] keeps two tables: the per-frame *target* computed by
//! the blend loop, and the *current* values that ease toward it. Only the blend
//! loop writes; renderers read through a [`ParameterView`], which can never
//! mutate the store.

use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Deltas smaller than this snap straight to the target.
pub const EASE_SNAP_EPSILON: f32 = 0.001;

/// Name of a single scalar degree of freedom of the avatar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(Cow<'static, str>);

impl ParameterId {
    /// Creates an id from a static string without allocating.
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Creates an id from a runtime string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ParameterId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ParameterId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known parameter ids, following the usual Live2D naming.
pub mod ids {
    use super::ParameterId;

    /// Head yaw.
    pub const ANGLE_X: ParameterId = ParameterId::from_static("ParamAngleX");
    /// Head pitch.
    pub const ANGLE_Y: ParameterId = ParameterId::from_static("ParamAngleY");
    /// Head roll.
    pub const ANGLE_Z: ParameterId = ParameterId::from_static("ParamAngleZ");
    /// Body yaw.
    pub const BODY_ANGLE_X: ParameterId = ParameterId::from_static("ParamBodyAngleX");
    /// Body roll.
    pub const BODY_ANGLE_Z: ParameterId = ParameterId::from_static("ParamBodyAngleZ");
    /// Breathing.
    pub const BREATH: ParameterId = ParameterId::from_static("ParamBreath");
    /// Left eye openness.
    pub const EYE_L_OPEN: ParameterId = ParameterId::from_static("ParamEyeLOpen");
    /// Right eye openness.
    pub const EYE_R_OPEN: ParameterId = ParameterId::from_static("ParamEyeROpen");
    /// Left eye smile.
    pub const EYE_L_SMILE: ParameterId = ParameterId::from_static("ParamEyeLSmile");
    /// Right eye smile.
    pub const EYE_R_SMILE: ParameterId = ParameterId::from_static("ParamEyeRSmile");
    /// Left brow height.
    pub const BROW_L_Y: ParameterId = ParameterId::from_static("ParamBrowLY");
    /// Right brow height.
    pub const BROW_R_Y: ParameterId = ParameterId::from_static("ParamBrowRY");
    /// Mouth curve, frown to smile.
    pub const MOUTH_FORM: ParameterId = ParameterId::from_static("ParamMouthForm");
    /// Mouth opening.
    pub const MOUTH_OPEN_Y: ParameterId = ParameterId::from_static("ParamMouthOpenY");
    /// Blush.
    pub const CHEEK: ParameterId = ParameterId::from_static("ParamCheek");
    /// Front hair sway.
    pub const HAIR_FRONT: ParameterId = ParameterId::from_static("ParamHairFront");
    /// Back hair sway.
    pub const HAIR_BACK: ParameterId = ParameterId::from_static("ParamHairBack");

    /// Both eye-openness parameters, driven by blinking.
    pub const EYES_OPEN: [ParameterId; 2] = [EYE_L_OPEN, EYE_R_OPEN];

    /// Every parameter with its rest value.
    pub fn defaults() -> Vec<(ParameterId, f32)> {
        vec![
            (ANGLE_X, 0.0),
            (ANGLE_Y, 0.0),
            (ANGLE_Z, 0.0),
            (BODY_ANGLE_X, 0.0),
            (BODY_ANGLE_Z, 0.0),
            (BREATH, 0.0),
            (EYE_L_OPEN, 1.0),
            (EYE_R_OPEN, 1.0),
            (EYE_L_SMILE, 0.0),
            (EYE_R_SMILE, 0.0),
            (BROW_L_Y, 0.0),
            (BROW_R_Y, 0.0),
            (MOUTH_FORM, 0.0),
            (MOUTH_OPEN_Y, 0.0),
            (CHEEK, 0.0),
            (HAIR_FRONT, 0.0),
            (HAIR_BACK, 0.0),
        ]
    }
}

#[derive(Debug, Default)]
struct Tables {
    current: HashMap<ParameterId, f32>,
    target: HashMap<ParameterId, f32>,
}

/// Concurrently readable parameter tables.
#[derive(Debug)]
pub struct ParameterStore {
    defaults: HashMap<ParameterId, f32>,
    tables: RwLock<Tables>,
}

impl ParameterStore {
    /// Creates a store whose current and target tables start at `defaults`.
    pub fn new(defaults: impl IntoIterator<Item = (ParameterId, f32)>) -> Self {
        let defaults: HashMap<ParameterId, f32> = defaults.into_iter().collect();
        let tables = Tables {
            current: defaults.clone(),
            target: defaults.clone(),
        };
        Self {
            defaults,
            tables: RwLock::new(tables),
        }
    }

    /// Creates a store with the standard avatar parameters.
    pub fn with_standard_parameters() -> Self {
        Self::new(ids::defaults())
    }

    /// The rest value of every parameter.
    pub fn defaults(&self) -> &HashMap<ParameterId, f32> {
        &self.defaults
    }

    /// Returns the current value of a parameter.
    pub fn current(&self, id: &str) -> Option<f32> {
        self.read().current.get(id).copied()
    }

    /// Returns the last computed target of a parameter.
    pub fn target(&self, id: &str) -> Option<f32> {
        self.read().target.get(id).copied()
    }

    /// Copies the current table.
    pub fn snapshot(&self) -> HashMap<ParameterId, f32> {
        self.read().current.clone()
    }

    /// Number of parameters held in the current table.
    pub fn len(&self) -> usize {
        self.read().current.len()
    }

    /// Returns `true` if the store holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.read().current.is_empty()
    }

    /// Publishes a frame of targets and eases every touched parameter toward it.
    ///
    /// `ease_rate` is the fraction of the remaining distance covered this frame
    /// and is clamped to `[0, 1]`. Ids listed in `snap` jump to their target.
    /// Returns the number of parameters whose current value changed.
    pub fn apply_frame(
        &self,
        targets: &HashMap<ParameterId, f32>,
        ease_rate: f32,
        snap: &[ParameterId],
    ) -> usize {
        let rate = ease_rate.clamp(0.0, 1.0);
        let mut tables = self.write();
        let Tables { current, target } = &mut *tables;
        let mut changed = 0;

        for (id, &goal) in targets {
            match target.get_mut(id) {
                Some(slot) => *slot = goal,
                None => {
                    target.insert(id.clone(), goal);
                }
            }

            let value = current.entry(id.clone()).or_insert(goal);
            let next = if snap.contains(id) {
                goal
            } else {
                ease_toward(*value, goal, rate)
            };
            if next != *value {
                *value = next;
                changed += 1;
            }
        }
        changed
    }

    /// Overwrites the current value of a parameter, bypassing easing.
    pub fn set_current(&self, id: &ParameterId, value: f32) {
        let mut tables = self.write();
        match tables.current.get_mut(id.as_str()) {
            Some(slot) => *slot = value,
            None => {
                tables.current.insert(id.clone(), value);
            }
        }
    }

    /// Restores both tables to the rest values.
    pub fn reset(&self) {
        let mut tables = self.write();
        tables.current = self.defaults.clone();
        tables.target = self.defaults.clone();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// One easing step: moves `current` toward `target` by `rate`, snapping when close.
pub fn ease_toward(current: f32, target: f32, rate: f32) -> f32 {
    let delta = target - current;
    if delta.abs() < EASE_SNAP_EPSILON {
        target
    } else {
        current + delta * rate
    }
}

/// Read-only handle to a [`ParameterStore`], handed to renderers.
#[derive(Debug, Clone)]
pub struct ParameterView {
    store: Arc<ParameterStore>,
}

impl ParameterView {
    /// Wraps a shared store.
    pub fn new(store: Arc<ParameterStore>) -> Self {
        Self { store }
    }

    /// Returns the current value of a parameter.
    pub fn get(&self, id: &str) -> Option<f32> {
        self.store.current(id)
    }

    /// Copies all current values.
    pub fn snapshot(&self) -> HashMap<ParameterId, f32> {
        self.store.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn single(id: &'static str, value: f32) -> HashMap<ParameterId, f32> {
        HashMap::from([(ParameterId::from_static(id), value)])
    }

    #[test]
    fn test_lookup_by_str() {
        let store = ParameterStore::with_standard_parameters();
        assert_eq!(store.current("ParamEyeLOpen"), Some(1.0));
        assert_eq!(store.current("ParamMouthForm"), Some(0.0));
        assert_eq!(store.current("ParamTail"), None);
    }

    #[test]
    fn test_easing_is_a_contraction() {
        let store = ParameterStore::new([(ParameterId::from_static("P"), 0.0)]);
        let targets = single("P", 1.0);
        let rate = 5.0 / 60.0;

        let mut previous_gap = 1.0f32;
        let mut steps = 0;
        while store.current("P") != Some(1.0) {
            store.apply_frame(&targets, rate, &[]);
            let gap = (1.0 - store.current("P").unwrap()).abs();
            assert!(gap < previous_gap || gap == 0.0);
            previous_gap = gap;
            steps += 1;
            assert!(steps < 200, "easing did not converge");
        }
        // (1 - 1/12)^n drops below 1e-3 after 80 steps, plus the snapping step.
        assert!(steps <= 85, "took {steps} steps");
        assert_eq!(store.target("P"), Some(1.0));
    }

    #[test]
    fn test_snap_ids_jump_to_target() {
        let store = ParameterStore::new([(ParameterId::from_static("P"), 0.0)]);
        store.apply_frame(&single("P", 0.8), 0.1, &[ParameterId::from_static("P")]);
        assert_eq!(store.current("P"), Some(0.8));
    }

    #[test]
    fn test_rate_is_clamped() {
        let store = ParameterStore::new([(ParameterId::from_static("P"), 0.0)]);
        store.apply_frame(&single("P", 1.0), 3.0, &[]);
        assert_abs_diff_eq!(store.current("P").unwrap(), 1.0);
    }

    #[test]
    fn test_set_current_and_reset() {
        let store = ParameterStore::with_standard_parameters();
        store.set_current(&ids::EYE_L_OPEN, 0.0);
        assert_eq!(store.current("ParamEyeLOpen"), Some(0.0));
        store.reset();
        assert_eq!(store.current("ParamEyeLOpen"), Some(1.0));
    }

    #[test]
    fn test_view_reads_shared_store() {
        let store = Arc::new(ParameterStore::with_standard_parameters());
        let view = ParameterView::new(Arc::clone(&store));
        store.set_current(&ids::CHEEK, 0.5);
        assert_eq!(view.get("ParamCheek"), Some(0.5));
        assert_eq!(view.snapshot().len(), store.len());
    }
}
