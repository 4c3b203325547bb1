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

use crate::expression::ExpressionDefinition;
use crate::motion::MotionDefinition;
use kizuna_core::{MotionHandle, ParameterId, QualityProfile};
use std::sync::Arc;

/// A state change queued for the animator and applied at the next tick boundary.
///
/// Names are already resolved and unlock-checked when a command is built, so
/// applying one cannot fail.
#[derive(Debug, Clone)]
pub enum AnimationCommand {
    /// Start a motion as the new main motion.
    PlayMotion {
        /// Handle returned to the caller.
        handle: MotionHandle,
        /// The motion to play.
        definition: Arc<MotionDefinition>,
        /// Wrap around at the end instead of finishing.
        looping: bool,
        /// Contribution scale in `[0, 1]`.
        intensity: f32,
    },
    /// Cross-fade to an expression.
    PlayExpression {
        /// The expression to fade to.
        definition: Arc<ExpressionDefinition>,
        /// Fade duration in seconds, or the default blend speed.
        fade_secs: Option<f32>,
    },
    /// Fade every motion out.
    StopAllMotions,
    /// Push new quality settings.
    ApplyProfile(QualityProfile),
    /// Pin a parameter target.
    SetOverride(ParameterId, f32),
    /// Release a pinned parameter.
    ClearOverride(ParameterId),
    /// Drop all animation state and return to the rest pose.
    Reset,
}
