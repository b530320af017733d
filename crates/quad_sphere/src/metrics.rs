//! Terrain build and topology statistics.
//!
//! # Usage
//!
//! ```ignore
//! let metrics = sphere.metrics();
//! println!(
//!   "{} builds, avg {:.0}us, {} failed",
//!   metrics.builds_completed,
//!   metrics.avg_build_timing_us(),
//!   metrics.builds_failed,
//! );
//! ```

use std::collections::VecDeque;

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  /// Create a new rolling window with the given capacity.
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Iterate over values (oldest to newest).
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  /// Get the most recent value.
  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  /// Compute the sum of all values.
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  /// Compute the average of all values.
  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  /// Get min and max values.
  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Counters and timings accumulated by a terrain sphere.
#[derive(Debug, Clone, Default)]
pub struct BuildMetrics {
  /// Recent mesh build times in microseconds.
  pub build_timings: RollingWindow<u64>,
  /// Builds that produced a mesh.
  pub builds_completed: u64,
  /// Builds that returned an error.
  pub builds_failed: u64,
  /// Builds handed to the dispatcher.
  pub builds_dispatched: u64,
  pub subdivisions: u64,
  pub unsubdivisions: u64,
  pub patches_created: u64,
  pub patches_removed: u64,
}

impl BuildMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a committed build.
  pub fn record_build(&mut self, timing_us: u64) {
    self.build_timings.push(timing_us);
    self.builds_completed += 1;
  }

  pub fn record_failure(&mut self) {
    self.builds_failed += 1;
  }

  /// Get average build timing in microseconds.
  pub fn avg_build_timing_us(&self) -> f64 {
    self.build_timings.average()
  }

  /// Most recent build timing in microseconds.
  pub fn last_build_us(&self) -> Option<u64> {
    self.build_timings.last().copied()
  }

  /// Patches currently alive according to the counters.
  pub fn live_patches(&self) -> u64 {
    self.patches_created.saturating_sub(self.patches_removed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rolling_window() {
    let mut window = RollingWindow::new(3);
    assert!(window.is_empty());
    assert_eq!(window.min_max(), None);

    window.push(10u64);
    window.push(20);
    window.push(30);
    assert_eq!(window.len(), 3);
    assert_eq!(window.sum(), 60);
    assert_eq!(window.average(), 20.0);

    // Push one more, oldest should be evicted
    window.push(40);
    assert_eq!(window.len(), 3);
    assert_eq!(window.sum(), 90);
    assert_eq!(window.average(), 30.0);

    let (min, max) = window.min_max().unwrap();
    assert_eq!(min, 20);
    assert_eq!(max, 40);
  }

  #[test]
  fn test_build_metrics() {
    let mut metrics = BuildMetrics::new();
    metrics.record_build(1000);
    metrics.record_build(2000);
    metrics.record_build(3000);
    metrics.record_failure();

    assert_eq!(metrics.builds_completed, 3);
    assert_eq!(metrics.builds_failed, 1);
    assert_eq!(metrics.avg_build_timing_us(), 2000.0);
    assert_eq!(metrics.last_build_us(), Some(3000));

    metrics.patches_created = 10;
    metrics.patches_removed = 4;
    assert_eq!(metrics.live_patches(), 6);
  }
}
