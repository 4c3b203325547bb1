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

//! The emotion vocabulary produced by the classification collaborator.

use crate::content::MotionGroup;
use crate::error::AnimationError;
use std::fmt;
use std::str::FromStr;

/// One of the fixed emotion labels the avatar can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    /// Smiling, light bounce.
    Happy,
    /// Downcast, slow idle.
    Sad,
    /// Wide eyes, quick shake.
    Surprised,
    /// Furrowed brows, hard shake.
    Angry,
    /// Resting face.
    Neutral,
    /// Big smile, energetic bounce.
    Excited,
    /// Raised brow, slow nod.
    Thinking,
    /// Blushing, rewarded motion.
    Love,
    /// Half-closed eyes, very slow idle.
    Sleepy,
    /// Tilted head, uncertain nod.
    Confused,
}

/// What the avatar should do for an emotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionResponse {
    /// Expression to cross-fade to.
    pub expression: &'static str,
    /// Group of the motion to play.
    pub motion_group: MotionGroup,
    /// Index of the motion within its group.
    pub motion_index: usize,
    /// Energy in `[0, 1]`, used as the motion intensity.
    pub energy: f32,
}

impl Emotion {
    /// Every label in the vocabulary.
    pub const ALL: [Emotion; 10] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Angry,
        Emotion::Neutral,
        Emotion::Excited,
        Emotion::Thinking,
        Emotion::Love,
        Emotion::Sleepy,
        Emotion::Confused,
    ];

    /// The lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Angry => "angry",
            Emotion::Neutral => "neutral",
            Emotion::Excited => "excited",
            Emotion::Thinking => "thinking",
            Emotion::Love => "love",
            Emotion::Sleepy => "sleepy",
            Emotion::Confused => "confused",
        }
    }

    /// Maps the emotion to an expression, a motion and an energy level.
    pub fn response(&self) -> EmotionResponse {
        let (expression, motion_group, motion_index, energy) = match self {
            Emotion::Happy => ("happy", MotionGroup::TapBody, 0, 0.8),
            Emotion::Sad => ("sad", MotionGroup::Idle, 1, 0.3),
            Emotion::Surprised => ("surprised", MotionGroup::Shake, 0, 0.9),
            Emotion::Angry => ("angry", MotionGroup::Shake, 1, 1.0),
            Emotion::Neutral => ("neutral", MotionGroup::Idle, 0, 0.5),
            Emotion::Excited => ("excited", MotionGroup::TapBody, 1, 1.0),
            Emotion::Thinking => ("thinking", MotionGroup::Nod, 0, 0.4),
            Emotion::Love => ("love", MotionGroup::Special, 0, 0.7),
            Emotion::Sleepy => ("sleepy", MotionGroup::Idle, 1, 0.2),
            Emotion::Confused => ("confused", MotionGroup::Nod, 1, 0.5),
        };
        EmotionResponse {
            expression,
            motion_group,
            motion_index,
            energy,
        }
    }
}

impl FromStr for Emotion {
    type Err = AnimationError;

    /// Parses a label, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == label)
            .ok_or_else(|| AnimationError::invalid("emotion", s.trim()))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
