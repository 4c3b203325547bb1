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

//! Abstractions over the host platform.

use crate::error::AnimationError;

/// Trait for observing memory and CPU capacity of the host.
///
/// Implementations live in `kizuna-telemetry`; tests use fakes. Every call may
/// fail transiently, in which case the caller logs and retries on its next
/// sampling cadence.
pub trait SystemProbe: Send + Sync {
    /// Memory currently used by this process, in megabytes.
    fn used_memory_mb(&self) -> Result<f32, AnimationError>;

    /// Total physical memory of the device, in megabytes.
    fn total_memory_mb(&self) -> Result<f32, AnimationError>;

    /// Number of logical CPU cores.
    fn cpu_cores(&self) -> usize;
}
