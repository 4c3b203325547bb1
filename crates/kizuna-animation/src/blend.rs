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

//! Weight blending shared by the motion and expression channels.

/// Weights closer than this to their target snap onto it.
pub const WEIGHT_EPSILON: f32 = 0.01;

/// Weight at or above which an incoming expression is promoted.
pub const PROMOTION_THRESHOLD: f32 = 0.99;

/// Moves `weight` toward `target` by `speed * dt` of the remaining distance.
///
/// The step is clamped to `[0, 1]`, so the result never overshoots and stays
/// between `weight` and `target`. Converges monotonically for a fixed `dt`.
pub fn approach(weight: f32, target: f32, speed: f32, dt: f32) -> f32 {
    let step = (speed * dt).clamp(0.0, 1.0);
    let next = weight + (target - weight) * step;
    if (target - next).abs() < WEIGHT_EPSILON {
        target
    } else {
        next.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approach_is_monotonic_and_bounded() {
        for (start, target) in [(0.0, 1.0), (1.0, 0.0), (0.3, 0.7), (0.9, 0.2)] {
            let mut weight = start;
            let mut steps = 0;
            while weight != target {
                let next = approach(weight, target, 5.0, 1.0 / 60.0);
                assert!((0.0..=1.0).contains(&next));
                assert!((target - next).abs() <= (target - weight).abs());
                weight = next;
                steps += 1;
                assert!(steps < 500);
            }
        }
    }

    #[test]
    fn test_large_dt_does_not_overshoot() {
        assert_eq!(approach(0.0, 1.0, 5.0, 2.0), 1.0);
        assert_eq!(approach(1.0, 0.0, 5.0, 2.0), 0.0);
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        assert_eq!(approach(0.4, 1.0, 5.0, 0.0), 0.4);
    }
}
