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

//! Publish/subscribe primitives for runtime notifications.
//!
//! The [`EventBus`] fans every published event out to all live subscribers.
//! It is generic over the event type so that the bus itself stays decoupled
//! from [`CompanionEvent`].

use crate::content::{ContentKind, MotionHandle};
use crate::quality::QualityLevel;
use std::sync::Mutex;

/// A notification emitted by the avatar runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum CompanionEvent {
    /// A motion became the main motion.
    MotionStarted {
        /// Handle of the new playback.
        handle: MotionHandle,
        /// Name of the motion.
        name: String,
    },
    /// A motion faded out and was retired.
    MotionFinished {
        /// Handle of the retired playback.
        handle: MotionHandle,
        /// Name of the motion.
        name: String,
    },
    /// An expression was promoted to the current expression.
    ExpressionChanged {
        /// Name of the new current expression.
        name: String,
    },
    /// A new quality profile was applied.
    QualityChanged {
        /// The active ladder level.
        level: QualityLevel,
        /// The active target frame rate.
        target_fps: u32,
    },
    /// Memory usage crossed the high-water mark. Renderers should drop caches.
    MemoryPressure {
        /// Used memory divided by the memory budget.
        ratio: f32,
        /// `true` once the critical threshold is crossed.
        critical: bool,
    },
    /// A motion or expression was unlocked.
    ContentUnlocked {
        /// Which kind of content.
        kind: ContentKind,
        /// Its id.
        id: String,
    },
}

/// A thread-safe fan-out channel.
///
/// Each call to [`subscribe`](Self::subscribe) creates an unbounded channel;
/// [`publish`](Self::publish) clones the event into every one of them.
/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        log::debug!("EventBus initialized.");
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sender);
        receiver
    }

    /// Sends the event to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.len();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        if subscribers.len() < before {
            log::trace!(
                "EventBus: pruned {} disconnected subscriber(s).",
                before - subscribers.len()
            );
        }
        subscribers.len()
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::sync::Arc;
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Resized { width: u32 },
        Shutdown,
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = EventBus::<TestEvent>::new();
        assert_eq!(bus.publish(TestEvent::Shutdown), 0);
    }

    #[test]
    fn every_subscriber_receives_every_event() {
        let bus = EventBus::<TestEvent>::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        assert_eq!(bus.publish(TestEvent::Resized { width: 4 }), 2);
        assert_eq!(bus.publish(TestEvent::Shutdown), 2);

        for rx in [&a, &b] {
            assert_eq!(rx.try_recv(), Ok(TestEvent::Resized { width: 4 }));
            assert_eq!(rx.try_recv(), Ok(TestEvent::Shutdown));
            assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::<TestEvent>::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        assert_eq!(bus.publish(TestEvent::Shutdown), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(TestEvent::Shutdown));
    }

    #[test]
    fn publish_from_thread() {
        let bus = Arc::new(EventBus::<TestEvent>::new());
        let rx = bus.subscribe();
        let publisher = Arc::clone(&bus);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            publisher.publish(TestEvent::Resized { width: 7 });
        });

        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => assert_eq!(event, TestEvent::Resized { width: 7 }),
            Err(e) => panic!("Failed to receive event from thread: {e:?}"),
        }
        handle.join().expect("Thread join failed");
    }
}
