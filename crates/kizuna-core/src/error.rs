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

//! Error taxonomy for the animation and quality subsystems.
//!
//! None of these errors cross the public `Companion` API: they are logged and
//! reported to callers as a plain `bool`, so a single bad input can never
//! interrupt the frame loop.

use crate::content::ContentKind;
use thiserror::Error;

/// An error raised by an animation, quality or monitoring operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnimationError {
    /// The motion or expression name is not registered in the catalog.
    #[error("unknown {kind} '{name}'")]
    UnknownName {
        /// Whether a motion or an expression was requested.
        kind: ContentKind,
        /// The requested name.
        name: String,
    },
    /// The name is registered but has not been unlocked yet.
    #[error("{kind} '{name}' is locked")]
    LockedContent {
        /// Whether a motion or an expression was requested.
        kind: ContentKind,
        /// The requested name.
        name: String,
    },
    /// A quality level, frame rate or other setting is outside its allowed bounds.
    #[error("invalid {what}: {value}")]
    InvalidRange {
        /// The setting being changed.
        what: &'static str,
        /// The rejected value, formatted for logging.
        value: String,
    },
    /// Sampling the frame rate or memory usage failed. Never fatal.
    #[error("monitoring failure: {0}")]
    TransientMonitoringFailure(String),
}

impl AnimationError {
    /// Shorthand for an [`AnimationError::UnknownName`].
    pub fn unknown(kind: ContentKind, name: impl Into<String>) -> Self {
        Self::UnknownName {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for an [`AnimationError::InvalidRange`].
    pub fn invalid(what: &'static str, value: impl ToString) -> Self {
        Self::InvalidRange {
            what,
            value: value.to_string(),
        }
    }
}
