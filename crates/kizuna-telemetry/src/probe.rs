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


//! sysinfo-based implementation of the SystemProbe trait.

use kizuna_core::{AnimationError, SystemProbe};
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

const BYTES_PER_MB: f32 = 1024.0 * 1024.0;

/// A system probe that uses the `sysinfo` crate.
///
/// "Used memory" is the resident memory of the current process.
pub struct SysinfoProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SysinfoProbe {
    /// Creates a new SysinfoProbe.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("SysinfoProbe: current process unavailable: {}", e);
                None
            }
        };
        Self {
            system: Mutex::new(system),
            pid,
        }
    }
}

impl SystemProbe for SysinfoProbe {
    fn used_memory_mb(&self) -> Result<f32, AnimationError> {
        let pid = self.pid.ok_or_else(|| {
            AnimationError::TransientMonitoringFailure("current process unknown".into())
        })?;
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system
            .process(pid)
            .map(|process| process.memory() as f32 / BYTES_PER_MB)
            .ok_or_else(|| {
                AnimationError::TransientMonitoringFailure(format!("process {pid} not found"))
            })
    }

    fn total_memory_mb(&self) -> Result<f32, AnimationError> {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_memory();
        match system.total_memory() {
            0 => Err(AnimationError::TransientMonitoringFailure(
                "total memory unavailable".into(),
            )),
            bytes => Ok(bytes as f32 / BYTES_PER_MB),
        }
    }

    fn cpu_cores(&self) -> usize {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        if system.cpus().is_empty() {
            system.refresh_cpu_all();
        }
        system.cpus().len().max(1)
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProbe").field("pid", &self.pid).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reports_plausible_values() {
        let probe = SysinfoProbe::new();
        assert!(probe.cpu_cores() >= 1);
        if let Ok(total) = probe.total_memory_mb() {
            assert!(total > 0.0);
            if let Ok(used) = probe.used_memory_mb() {
                assert!(used >= 0.0 && used <= total);
            }
        }
    }
}
