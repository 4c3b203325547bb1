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


//! # Kizuna Telemetry
//!
//! Observes the running avatar: frame pacing and memory windows, the device
//! tier, a `sysinfo`-backed [`SystemProbe`](kizuna_core::SystemProbe), and the
//! logger bootstrap used by binaries.

#![warn(missing_docs)]

pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod probe;

pub use logging::{init_logging, init_logging_with_default};
pub use metrics::RingBuffer;
pub use monitor::{
    classify_device, PerformanceMonitor, PerformanceSnapshot, DEFAULT_MEMORY_BUDGET_MB,
};
pub use probe::SysinfoProbe;
