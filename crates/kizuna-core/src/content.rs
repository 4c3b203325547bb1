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

//! Content identifiers and the unlock contract.
//!
//! Which motions and expressions the user has earned is owned by an external
//! reward collaborator. The runtime only asks it one question, through
//! [`UnlockRegistry::is_unlocked`], before playing gated content.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// The two kinds of playable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A timed body motion.
    Motion,
    /// A weighted facial expression.
    Expression,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Motion => f.write_str("motion"),
            ContentKind::Expression => f.write_str("expression"),
        }
    }
}

/// A named family of motions. Members are addressed by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MotionGroup {
    /// Breathing and small sways played when nothing else is happening.
    Idle,
    /// Reaction to the user touching the avatar.
    TapBody,
    /// Head shaking (surprise, refusal, anger).
    Shake,
    /// Head nodding (agreement, thinking).
    Nod,
    /// Rewarded motions, locked until earned.
    Special,
}

impl MotionGroup {
    /// All groups, in declaration order.
    pub const ALL: [MotionGroup; 5] = [
        MotionGroup::Idle,
        MotionGroup::TapBody,
        MotionGroup::Shake,
        MotionGroup::Nod,
        MotionGroup::Special,
    ];

    /// The group name, also the prefix of its members' names.
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionGroup::Idle => "idle",
            MotionGroup::TapBody => "tap_body",
            MotionGroup::Shake => "shake",
            MotionGroup::Nod => "nod",
            MotionGroup::Special => "special",
        }
    }

    /// Looks a group up by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == name)
    }
}

impl fmt::Display for MotionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NEXT_MOTION_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of one playback of a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MotionHandle(u64);

impl MotionHandle {
    /// Allocates a handle that has never been returned before.
    pub fn fresh() -> Self {
        Self(NEXT_MOTION_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value, for logging.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Gatekeeper for rewarded content.
///
/// Implementations must be cheap to query: `is_unlocked` is called on every
/// play request and by the auto-behavior scheduler.
pub trait UnlockRegistry: Send + Sync {
    /// Marks a motion as unlocked. Returns `true` if it was newly unlocked.
    fn unlock_motion(&self, id: &str) -> bool;

    /// Marks an expression as unlocked. Returns `true` if it was newly unlocked.
    fn unlock_expression(&self, id: &str) -> bool;

    /// Returns `true` if the id was unlocked as either a motion or an expression.
    fn is_unlocked(&self, id: &str) -> bool;
}

/// In-memory [`UnlockRegistry`].
///
/// Persistence is left to the settings collaborator, which can seed the set at
/// start-up with [`UnlockSet::with_unlocked`].
#[derive(Debug, Default)]
pub struct UnlockSet {
    motions: RwLock<HashSet<String>>,
    expressions: RwLock<HashSet<String>>,
}

impl UnlockSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with the given motions and expressions already unlocked.
    pub fn with_unlocked<M, E>(motions: M, expressions: E) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            motions: RwLock::new(motions.into_iter().map(Into::into).collect()),
            expressions: RwLock::new(expressions.into_iter().map(Into::into).collect()),
        }
    }

    fn insert(set: &RwLock<HashSet<String>>, id: &str) -> bool {
        let mut guard = set.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(id.to_owned())
    }

    fn contains(set: &RwLock<HashSet<String>>, id: &str) -> bool {
        set.read().unwrap_or_else(|e| e.into_inner()).contains(id)
    }
}

impl UnlockRegistry for UnlockSet {
    fn unlock_motion(&self, id: &str) -> bool {
        let added = Self::insert(&self.motions, id);
        if added {
            log::info!("UnlockSet: motion '{}' unlocked", id);
        }
        added
    }

    fn unlock_expression(&self, id: &str) -> bool {
        let added = Self::insert(&self.expressions, id);
        if added {
            log::info!("UnlockSet: expression '{}' unlocked", id);
        }
        added
    }

    fn is_unlocked(&self, id: &str) -> bool {
        Self::contains(&self.motions, id) || Self::contains(&self.expressions, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_round_trips_through_name() {
        for group in MotionGroup::ALL {
            assert_eq!(MotionGroup::from_name(group.as_str()), Some(group));
        }
        assert_eq!(MotionGroup::from_name("backflip"), None);
    }

    #[test]
    fn test_handles_are_unique() {
        let a = MotionHandle::fresh();
        let b = MotionHandle::fresh();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_unlock_set_reports_new_unlocks_once() {
        let unlocks = UnlockSet::new();
        assert!(!unlocks.is_unlocked("special_00"));
        assert!(unlocks.unlock_motion("special_00"));
        assert!(!unlocks.unlock_motion("special_00"));
        assert!(unlocks.is_unlocked("special_00"));
    }

    #[test]
    fn test_unlock_set_seeded() {
        let unlocks = UnlockSet::with_unlocked(["special_01"], ["love"]);
        assert!(unlocks.is_unlocked("special_01"));
        assert!(unlocks.is_unlocked("love"));
        assert!(!unlocks.is_unlocked("special_00"));
    }
}
