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


//! The three cooperative tasks: blend loop, FPS sampling and memory sampling.

use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Longest frame the blend loop will simulate after a stall, in seconds.
const MAX_FRAME_DT: f32 = 0.25;

/// Handles of the running tasks. Dropping the set does not stop them.
#[derive(Debug, Default)]
pub(crate) struct TaskSet {
    handles: Vec<JoinHandle<()>>,
}

impl TaskSet {
    /// Spawns the three tasks on `runtime`.
    pub(crate) fn spawn(session: Arc<Session>, runtime: &tokio::runtime::Handle) -> Self {
        let handles = vec![
            runtime.spawn(blend_loop(Arc::clone(&session))),
            runtime.spawn(fps_sampler(Arc::clone(&session))),
            runtime.spawn(memory_sampler(session)),
        ];
        Self { handles }
    }

    /// Cancels every task.
    pub(crate) fn abort(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Ticks the animator at the profile's target FPS.
///
/// `dt` is the measured time since the previous frame, so a slow machine
/// animates at the right speed with fewer frames.
async fn blend_loop(session: Arc<Session>) {
    log::info!("Blend loop started.");
    let mut last = Instant::now();
    loop {
        let frame_start = Instant::now();
        let dt = frame_start
            .duration_since(last)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        last = frame_start;

        session.step(dt);

        let interval = Duration::from_secs_f32(session.profile().frame_interval_secs());
        let remaining = interval.saturating_sub(frame_start.elapsed());
        if remaining.is_zero() {
            tokio::task::yield_now().await;
        } else {
            time::sleep(remaining).await;
        }
    }
}

async fn fps_sampler(session: Arc<Session>) {
    let period = Duration::from_millis(session.config.performance.fps_sample_interval_ms);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        session.sample_fps(session.elapsed());
    }
}

async fn memory_sampler(session: Arc<Session>) {
    let period = Duration::from_millis(session.config.performance.memory_sample_interval_ms);
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = session.sample_memory(session.elapsed()) {
            log::warn!("Memory sampling failed, retrying next period: {}", e);
        }
    }
}
