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

//! Idle-time behaviors fired on jittered timers.
//!
//! Timers are due timestamps checked by [`AutoBehaviorScheduler::poll`], so the
//! scheduler never sleeps and tests can drive it with synthetic time.

use crate::config::{AnimationConfig, MAX_TIMER_SECS};
use kizuna_core::QualityProfile;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Shortest interval any timer may be re-armed with.
const MIN_INTERVAL_SECS: f32 = 0.1;

/// Something the scheduler wants the animator to do now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoBehavior {
    /// Close both eyes.
    BlinkClose,
    /// Reopen the eyes after a blink.
    BlinkOpen,
    /// Play the idle motion if nothing else is playing.
    IdleMotion,
    /// Cross-fade to a random expression.
    RandomExpression,
}

/// Three independent timers plus the pending blink restore.
#[derive(Debug)]
pub struct AutoBehaviorScheduler {
    config: AnimationConfig,
    rng: StdRng,
    blink_due: Option<Duration>,
    idle_due: Option<Duration>,
    expression_due: Option<Duration>,
    blink_restore_due: Option<Duration>,
}

impl AutoBehaviorScheduler {
    /// Creates a scheduler with every timer disarmed.
    ///
    /// With a seed the jitter sequence is reproducible.
    pub fn new(config: AnimationConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            blink_due: None,
            idle_due: None,
            expression_due: None,
            blink_restore_due: None,
        }
    }

    /// Arms or disarms each timer according to the profile's enable flags.
    ///
    /// Timers that were already armed keep their due time.
    pub fn apply_profile(&mut self, profile: &QualityProfile, now: Duration) {
        self.blink_due = match (profile.auto_blink_enabled, self.blink_due) {
            (true, Some(due)) => Some(due),
            (true, None) => Some(now.saturating_add(self.blink_interval())),
            (false, _) => None,
        };
        self.idle_due = match (profile.auto_idle_enabled, self.idle_due) {
            (true, Some(due)) => Some(due),
            (true, None) => Some(now.saturating_add(self.idle_interval())),
            (false, _) => None,
        };
        self.expression_due = match (profile.auto_expression_enabled, self.expression_due) {
            (true, Some(due)) => Some(due),
            (true, None) => Some(now.saturating_add(self.expression_interval())),
            (false, _) => None,
        };
    }

    /// Returns the behaviors due at `now` and re-arms their timers.
    ///
    /// Each timer fires at most once per poll, however late the poll is.
    pub fn poll(&mut self, now: Duration) -> Vec<AutoBehavior> {
        let mut due = Vec::new();

        if self.blink_restore_due.is_some_and(|t| now >= t) {
            self.blink_restore_due = None;
            due.push(AutoBehavior::BlinkOpen);
        }

        if self.blink_due.is_some_and(|t| now >= t) {
            self.blink_due = Some(now.saturating_add(self.blink_interval()));
            if self.blink_restore_due.is_none() {
                let closed = self.config.blink_duration_ms.min(MAX_TIMER_SECS as u64 * 1000);
                self.blink_restore_due = Some(now.saturating_add(Duration::from_millis(closed)));
                due.push(AutoBehavior::BlinkClose);
            }
        }

        if self.idle_due.is_some_and(|t| now >= t) {
            self.idle_due = Some(now.saturating_add(self.idle_interval()));
            due.push(AutoBehavior::IdleMotion);
        }

        if self.expression_due.is_some_and(|t| now >= t) {
            self.expression_due = Some(now.saturating_add(self.expression_interval()));
            due.push(AutoBehavior::RandomExpression);
        }

        due
    }

    /// Drops the in-flight blink restore. Returns `true` if one was pending.
    pub fn cancel_pending(&mut self) -> bool {
        self.blink_restore_due.take().is_some()
    }

    /// Disarms every timer and drops any pending restore.
    pub fn disarm(&mut self) {
        self.blink_due = None;
        self.idle_due = None;
        self.expression_due = None;
        self.blink_restore_due = None;
    }

    /// Returns `true` while the eyes are closed by a blink.
    pub fn is_blinking(&self) -> bool {
        self.blink_restore_due.is_some()
    }

    /// Picks one item uniformly using the scheduler's random source.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// When the blink timer fires next.
    pub fn blink_due(&self) -> Option<Duration> {
        self.blink_due
    }

    /// When the idle timer fires next.
    pub fn idle_due(&self) -> Option<Duration> {
        self.idle_due
    }

    /// When the random expression timer fires next.
    pub fn expression_due(&self) -> Option<Duration> {
        self.expression_due
    }

    fn blink_interval(&mut self) -> Duration {
        let lo = Self::bounded(self.config.blink_interval_min_secs);
        let hi = Self::bounded(self.config.blink_interval_max_secs);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self::secs(self.rng.gen_range(lo..=hi))
    }

    fn idle_interval(&mut self) -> Duration {
        let base = self.config.idle_interval_secs;
        let jitter = self.config.idle_jitter_secs;
        self.jittered(base, jitter)
    }

    fn expression_interval(&mut self) -> Duration {
        let base = self.config.random_expression_interval_secs;
        let jitter = self.config.random_expression_jitter_secs;
        self.jittered(base, jitter)
    }

    fn jittered(&mut self, base: f32, jitter: f32) -> Duration {
        let base = Self::bounded(base);
        let jitter = jitter.abs().min(MAX_TIMER_SECS);
        if jitter > 0.0 {
            Self::secs(base + self.rng.gen_range(-jitter..=jitter))
        } else {
            Self::secs(base)
        }
    }

    /// Maps any input, NaN included, into `[MIN_INTERVAL_SECS, MAX_TIMER_SECS]`.
    fn bounded(value: f32) -> f32 {
        value.max(MIN_INTERVAL_SECS).min(MAX_TIMER_SECS)
    }

    fn secs(value: f32) -> Duration {
        Duration::from_secs_f32(Self::bounded(value))
    }
}
