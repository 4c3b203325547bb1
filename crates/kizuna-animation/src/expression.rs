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

//! Facial expressions and their cross-fade.

use crate::blend::{approach, PROMOTION_THRESHOLD, WEIGHT_EPSILON};
use kizuna_core::parameter::ids;
use kizuna_core::ParameterId;
use std::collections::HashMap;
use std::sync::Arc;

/// Converts a fade time into a blend speed.
///
/// With `approach`, a weight covers 99% of the distance after roughly
/// `4.6 / speed` seconds, so this speed makes a fade last about `fade_secs`.
const FADE_CONSTANT: f32 = 4.6;

/// A named set of parameter offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionDefinition {
    /// Unique name, e.g. `happy`.
    pub name: String,
    /// Offset added to each parameter at full weight.
    pub deltas: Vec<(ParameterId, f32)>,
    /// Whether the expression must be unlocked before it can play.
    pub lockable: bool,
}

impl ExpressionDefinition {
    /// Creates an always-available expression.
    pub fn new(name: impl Into<String>, deltas: Vec<(ParameterId, f32)>) -> Self {
        Self {
            name: name.into(),
            deltas,
            lockable: false,
        }
    }

    /// Marks the expression as requiring an unlock.
    pub fn lockable(mut self) -> Self {
        self.lockable = true;
        self
    }
}

/// The set of expressions the avatar knows.
#[derive(Debug, Clone, Default)]
pub struct ExpressionLibrary {
    definitions: HashMap<String, Arc<ExpressionDefinition>>,
    order: Vec<String>,
}

impl ExpressionLibrary {
    /// Builds a library from definitions. Later duplicates replace earlier ones.
    pub fn new(definitions: impl IntoIterator<Item = ExpressionDefinition>) -> Self {
        let mut library = Self::default();
        for definition in definitions {
            if !library.definitions.contains_key(&definition.name) {
                library.order.push(definition.name.clone());
            }
            library
                .definitions
                .insert(definition.name.clone(), Arc::new(definition));
        }
        library
    }

    /// One expression per emotion label, plus `wink` which is unlocked as a reward.
    pub fn standard() -> Self {
        Self::new([
            ExpressionDefinition::new("neutral", vec![]),
            ExpressionDefinition::new(
                "happy",
                vec![
                    (ids::EYE_L_SMILE, 1.0),
                    (ids::EYE_R_SMILE, 1.0),
                    (ids::MOUTH_FORM, 1.0),
                    (ids::CHEEK, 0.3),
                ],
            ),
            ExpressionDefinition::new(
                "sad",
                vec![
                    (ids::BROW_L_Y, -0.6),
                    (ids::BROW_R_Y, -0.6),
                    (ids::MOUTH_FORM, -0.8),
                    (ids::EYE_L_OPEN, -0.3),
                    (ids::EYE_R_OPEN, -0.3),
                ],
            ),
            ExpressionDefinition::new(
                "surprised",
                vec![
                    (ids::BROW_L_Y, 0.8),
                    (ids::BROW_R_Y, 0.8),
                    (ids::MOUTH_OPEN_Y, 0.8),
                    (ids::EYE_L_OPEN, 0.2),
                    (ids::EYE_R_OPEN, 0.2),
                ],
            ),
            ExpressionDefinition::new(
                "angry",
                vec![
                    (ids::BROW_L_Y, -1.0),
                    (ids::BROW_R_Y, -1.0),
                    (ids::MOUTH_FORM, -0.5),
                ],
            ),
            ExpressionDefinition::new(
                "excited",
                vec![
                    (ids::EYE_L_SMILE, 0.6),
                    (ids::EYE_R_SMILE, 0.6),
                    (ids::MOUTH_OPEN_Y, 0.6),
                    (ids::MOUTH_FORM, 1.0),
                    (ids::CHEEK, 0.5),
                ],
            ),
            ExpressionDefinition::new(
                "thinking",
                vec![(ids::BROW_L_Y, 0.4), (ids::MOUTH_FORM, -0.2)],
            ),
            ExpressionDefinition::new(
                "love",
                vec![
                    (ids::EYE_L_SMILE, 0.8),
                    (ids::EYE_R_SMILE, 0.8),
                    (ids::CHEEK, 1.0),
                    (ids::MOUTH_FORM, 0.7),
                ],
            ),
            ExpressionDefinition::new(
                "sleepy",
                vec![(ids::EYE_L_OPEN, -0.6), (ids::EYE_R_OPEN, -0.6)],
            ),
            ExpressionDefinition::new(
                "confused",
                vec![(ids::BROW_L_Y, 0.5), (ids::BROW_R_Y, -0.3)],
            ),
            ExpressionDefinition::new(
                "wink",
                vec![(ids::EYE_R_OPEN, -1.0), (ids::MOUTH_FORM, 0.8)],
            )
            .lockable(),
        ])
    }

    /// Looks an expression up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ExpressionDefinition>> {
        self.definitions.get(name)
    }

    /// Iterates over all definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ExpressionDefinition>> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }

    /// Number of known expressions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// One expression with its blend weight.
#[derive(Debug, Clone)]
pub struct ExpressionState {
    definition: Arc<ExpressionDefinition>,
    weight: f32,
    target_weight: f32,
    speed: f32,
}

impl ExpressionState {
    fn new(definition: Arc<ExpressionDefinition>, speed: f32) -> Self {
        Self {
            definition,
            weight: 0.0,
            target_weight: 1.0,
            speed,
        }
    }

    /// Name of the expression.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Current blend weight in `[0, 1]`.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Weight the expression is moving toward.
    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    fn advance(&mut self, dt: f32) {
        self.weight = approach(self.weight, self.target_weight, self.speed, dt);
    }

    fn contribute(&self, out: &mut HashMap<ParameterId, f32>) {
        if self.weight <= 0.0 {
            return;
        }
        for (id, delta) in &self.definition.deltas {
            *out.entry(id.clone()).or_insert(0.0) += delta * self.weight;
        }
    }
}

/// Cross-fades from the current expression to an incoming one.
///
/// Expressions displaced before they were promoted, and the old current after
/// a promotion, keep fading out in a retiring list so nothing pops.
#[derive(Debug)]
pub struct ExpressionChannel {
    current: Option<ExpressionState>,
    target: Option<ExpressionState>,
    retiring: Vec<ExpressionState>,
    blend_speed: f32,
}

impl ExpressionChannel {
    /// Creates an empty channel.
    pub fn new(blend_speed: f32) -> Self {
        Self {
            current: None,
            target: None,
            retiring: Vec::new(),
            blend_speed,
        }
    }

    /// Starts fading toward `definition`.
    ///
    /// `fade_secs` overrides the default blend speed. Requesting the expression
    /// that is already incoming, or already current with nothing incoming, is a
    /// no-op. Returns `true` if a new fade started.
    pub fn play(&mut self, definition: Arc<ExpressionDefinition>, fade_secs: Option<f32>) -> bool {
        let name = definition.name.as_str();
        if self.target.as_ref().is_some_and(|t| t.name() == name) {
            return false;
        }
        let back_to_current = self.current.as_ref().is_some_and(|c| c.name() == name);
        if back_to_current && self.target.is_none() {
            return false;
        }

        let speed = match fade_secs {
            Some(secs) if secs > 0.0 => FADE_CONSTANT / secs,
            _ => self.blend_speed,
        };

        if let Some(mut displaced) = self.target.take() {
            displaced.target_weight = 0.0;
            self.retiring.push(displaced);
        }

        // The current expression never left full target weight, so cancelling
        // the incoming fade is enough.
        if back_to_current {
            log::debug!("ExpressionChannel: fade cancelled, keeping '{}'", name);
            return true;
        }

        // Resume from a retiring copy so its weight does not restart at zero.
        let state = match self.retiring.iter().position(|s| s.name() == name) {
            Some(index) => {
                let mut resumed = self.retiring.remove(index);
                resumed.target_weight = 1.0;
                resumed.speed = speed;
                resumed
            }
            None => ExpressionState::new(definition, speed),
        };

        log::debug!("ExpressionChannel: fading to '{}'", state.name());
        self.target = Some(state);
        true
    }

    /// Advances every weight and performs at most one promotion.
    ///
    /// Returns the name of the newly promoted expression, if any.
    pub fn tick(&mut self, dt: f32) -> Option<String> {
        if let Some(current) = &mut self.current {
            current.advance(dt);
        }
        if let Some(target) = &mut self.target {
            target.advance(dt);
        }
        for state in &mut self.retiring {
            state.advance(dt);
        }
        self.retiring.retain(|s| s.weight > WEIGHT_EPSILON || s.target_weight > 0.0);

        let ready = self
            .target
            .as_ref()
            .is_some_and(|t| t.weight >= PROMOTION_THRESHOLD);
        if !ready {
            return None;
        }

        let promoted = self.target.take()?;
        if let Some(mut old) = self.current.take() {
            if old.name() != promoted.name() {
                old.target_weight = 0.0;
                self.retiring.push(old);
            }
        }
        let name = promoted.name().to_owned();
        log::debug!("ExpressionChannel: '{}' is now current", name);
        self.current = Some(promoted);
        Some(name)
    }

    /// Adds the weighted deltas of every live expression to `out`.
    pub fn contribute(&self, out: &mut HashMap<ParameterId, f32>) {
        self.current
            .iter()
            .chain(self.target.iter())
            .chain(self.retiring.iter())
            .for_each(|state| state.contribute(out));
    }

    /// The settled expression.
    pub fn current(&self) -> Option<&ExpressionState> {
        self.current.as_ref()
    }

    /// The incoming expression, if a fade is in progress.
    pub fn target(&self) -> Option<&ExpressionState> {
        self.target.as_ref()
    }

    /// Expressions still fading out.
    pub fn retiring(&self) -> &[ExpressionState] {
        &self.retiring
    }

    /// Drops every expression immediately.
    pub fn clear(&mut self) {
        self.current = None;
        self.target = None;
        self.retiring.clear();
    }
}
