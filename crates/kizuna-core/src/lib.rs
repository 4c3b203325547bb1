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

//! # Kizuna Core
//!
//! Foundational crate containing the plain data types and interface contracts
//! shared by the avatar runtime: the parameter store read by the renderer, the
//! quality ladder, the emotion vocabulary, content gating and the event bus.

#![warn(missing_docs)]

pub mod content;
pub mod emotion;
pub mod error;
pub mod event;
pub mod parameter;
pub mod platform;
pub mod quality;

pub use content::{ContentKind, MotionGroup, MotionHandle, UnlockRegistry, UnlockSet};
pub use emotion::{Emotion, EmotionResponse};
pub use error::AnimationError;
pub use event::{CompanionEvent, EventBus};
pub use parameter::{ParameterId, ParameterStore, ParameterView};
pub use platform::SystemProbe;
pub use quality::{QualityLevel, QualityProfile};
