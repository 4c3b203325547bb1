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


//! # Kizuna SDK
//!
//! The public entry point of the avatar runtime. A host creates a
//! [`Companion`], calls [`Companion::start`] from inside a tokio runtime and
//! reads [`Companion::parameter_view`] from its renderer every frame.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use kizuna_sdk::{Companion, CompanionConfig};
//!
//! let companion = Companion::new(CompanionConfig::default())?;
//! companion.start()?;
//! companion.set_emotion("happy");
//! let view = companion.parameter_view();
//! let _mouth = view.get("ParamMouthForm");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod companion;
pub mod config;
mod runtime;
mod session;

pub use companion::{Companion, CompanionBuilder};
pub use config::{CompanionConfig, PerformanceConfig, DEFAULT_COMMAND_QUEUE_CAPACITY};

pub use kizuna_animation::{AnimationConfig, AnimationInfo, ExpressionLibrary, MotionLibrary};
pub use kizuna_control::{MemoryAction, PerformanceStats, QualityConfig};
pub use kizuna_core::parameter::ids;
pub use kizuna_core::{
    AnimationError, CompanionEvent, ContentKind, MotionGroup, MotionHandle, ParameterId,
    ParameterView, QualityLevel, QualityProfile, SystemProbe, UnlockRegistry, UnlockSet,
};
