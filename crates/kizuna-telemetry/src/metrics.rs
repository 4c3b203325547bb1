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


//! Fixed-capacity storage for rolling samples.

/// A fixed-size circular buffer for storing numerical samples.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    data: [T; N],
    index: usize,
    count: usize,
}

impl<T: Default + Copy, const N: usize> RingBuffer<T, N> {
    /// Creates a new, empty ring buffer.
    pub fn new() -> Self {
        Self {
            data: [T::default(); N],
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new value into the buffer, overwriting the oldest if full.
    pub fn push(&mut self, value: T) {
        self.data[self.index] = value;
        self.index = (self.index + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Returns the number of elements currently in the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` if no sample was pushed since the last clear.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Returns an iterator over the values in chronological order (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (left, right) = self.data.split_at(self.index);
        if self.count < N {
            // Not full yet: everything lives before the write index.
            right[N - self.index..]
                .iter()
                .chain(left[..self.index].iter())
        } else {
            // Full: the oldest value sits at the write index.
            right.iter().chain(left.iter())
        }
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        Some(self.data[(self.index + N - 1) % N])
    }

    /// The oldest sample still kept.
    pub fn oldest(&self) -> Option<T> {
        self.iter().next().copied()
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.index = 0;
        self.count = 0;
    }

    /// Keeps only the `keep` most recent samples.
    pub fn retain_latest(&mut self, keep: usize) {
        if keep >= self.count {
            return;
        }
        let kept: Vec<T> = self.iter().skip(self.count - keep).copied().collect();
        self.clear();
        for value in kept {
            self.push(value);
        }
    }
}

impl<T: Default + Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<f32, N> {
    /// Calculates the arithmetic mean of the values in the buffer.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f32>() / self.count as f32
    }

    /// Difference between the mean of the newer half and the older half.
    /// Positive when the values are increasing.
    pub fn trend(&self) -> f32 {
        if self.count < 2 {
            return 0.0;
        }
        let half = self.count / 2;
        let first_half_avg: f32 = self.iter().take(half).sum::<f32>() / half as f32;
        let last_half_avg: f32 = self.iter().skip(self.count - half).sum::<f32>() / half as f32;
        last_half_avg - first_half_avg
    }

    /// Returns the maximum value in the buffer, or `0.0` if empty.
    pub fn max(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().copied().fold(f32::MIN, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ring_buffer_wraps_in_chronological_order() {
        let mut rb = RingBuffer::<f32, 3>::new();
        rb.push(1.0);
        rb.push(2.0);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0]);

        rb.push(3.0);
        rb.push(4.0);
        assert_eq!(rb.count(), 3);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(rb.latest(), Some(4.0));
        assert_eq!(rb.oldest(), Some(2.0));
    }

    #[test]
    fn test_ring_buffer_stats() {
        let mut rb = RingBuffer::<f32, 4>::new();
        assert_eq!(rb.average(), 0.0);
        assert_eq!(rb.latest(), None);

        for v in [10.0, 20.0, 30.0, 40.0] {
            rb.push(v);
        }
        assert_abs_diff_eq!(rb.average(), 25.0);
        assert_abs_diff_eq!(rb.trend(), 20.0);
        assert_abs_diff_eq!(rb.max(), 40.0);
    }

    #[test]
    fn test_retain_latest() {
        let mut rb = RingBuffer::<f64, 5>::new();
        for v in 0..7 {
            rb.push(v as f64);
        }
        rb.retain_latest(2);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![5.0, 6.0]);
        rb.push(7.0);
        assert_eq!(rb.latest(), Some(7.0));

        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.oldest(), None);
    }
}
