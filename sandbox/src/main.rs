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


// Kizuna Sandbox
// Runs a companion for a few seconds and prints what it did.

use anyhow::{Context, Result};
use kizuna_sdk::{ids, Companion, CompanionConfig, CompanionEvent};
use std::time::Duration;

/// Emotions played in order, one every `STEP`.
const SCRIPT: [&str; 5] = ["happy", "thinking", "surprised", "love", "neutral"];
const STEP: Duration = Duration::from_millis(1200);

/// Loads the configuration from the path in the first argument, if any.
fn load_config() -> Result<CompanionConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read configuration '{}'", path))?;
            CompanionConfig::from_json_str(&json)
        }
        None => Ok(CompanionConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    kizuna_telemetry::init_logging();

    let companion = Companion::new(load_config()?)?;
    let events = companion.subscribe();
    let view = companion.parameter_view();
    companion.start()?;

    for emotion in SCRIPT {
        if !companion.set_emotion(emotion) {
            log::warn!("Sandbox: '{}' was not played", emotion);
        }
        tokio::time::sleep(STEP).await;
        log::info!(
            "Sandbox: {} -> mouth {:.2}, angle {:.1}, info {:?}",
            emotion,
            view.get(ids::MOUTH_FORM.as_str()).unwrap_or_default(),
            view.get(ids::ANGLE_X.as_str()).unwrap_or_default(),
            companion.current_animation_info()
        );
    }

    companion.unlock_motion("special_00");
    companion.set_emotion("love");
    tokio::time::sleep(STEP).await;
    companion.stop();

    for event in events.try_iter() {
        match event {
            CompanionEvent::MotionStarted { name, .. } => log::info!("Sandbox: motion '{}'", name),
            CompanionEvent::QualityChanged { level, target_fps } => {
                log::info!("Sandbox: quality {} at {} FPS", level, target_fps)
            }
            other => log::debug!("Sandbox: {:?}", other),
        }
    }

    let stats = companion.performance_stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    for line in companion.optimization_recommendations() {
        println!("- {}", line);
    }
    Ok(())
}
