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


//! # Kizuna Animation
//!
//! Named motions and expressions blended over a flat parameter set, the
//! auto-behavior timers, and the [`Animator`] that runs one blend loop frame.

#![warn(missing_docs)]

pub mod animator;
pub mod blend;
pub mod catalog;
pub mod command;
pub mod config;
pub mod expression;
pub mod motion;
pub mod scheduler;

pub use animator::{AnimationInfo, Animator, MAX_TICK_SECS};
pub use catalog::ContentCatalog;
pub use command::AnimationCommand;
pub use config::{AnimationConfig, MAX_TIMER_SECS};
pub use expression::{ExpressionChannel, ExpressionDefinition, ExpressionLibrary, ExpressionState};
pub use motion::{MotionChannel, MotionDefinition, MotionLibrary, MotionState};
pub use scheduler::{AutoBehavior, AutoBehaviorScheduler};
