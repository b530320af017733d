//! Mesh build dispatch using rayon.
//!
//! Patch meshes are built off the simulation thread. A [`MeshDispatcher`]
//! accepts a [`MeshRequest`] and hands back a [`BuildHandle`], which the patch
//! keeps while it is `Rebuilding` and joins (or polls) later.
//!
//! - [`RayonDispatcher`]: `rayon::spawn` on the global pool, or a dedicated
//!   `rayon::ThreadPool`
//! - [`InlineDispatcher`]: builds synchronously inside `submit`
//!
//! # Usage
//!
//! ```ignore
//! let dispatcher = RayonDispatcher::new();
//!
//! // Queue work (non-blocking)
//! let mut handle = dispatcher.submit(request);
//!
//! // Poll for the result each step...
//! if let Some(result) = handle.poll() {
//!     // Use result
//! }
//!
//! // ...or block until it is done.
//! let mesh = handle.join()?;
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{Result, TerrainError};
use crate::mesh::{build_patch_mesh, MeshRequest};
use crate::types::PatchMesh;

/// Sending half of a build, held by whoever runs it.
pub type BuildSender = Sender<Result<PatchMesh>>;

fn next_build_id() -> u64 {
  static COUNTER: AtomicU64 = AtomicU64::new(0);
  COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// How the controller completes outstanding builds at the end of a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildCompletion {
  /// Join every outstanding build; all meshes are committed within the step
  /// that dispatched them.
  #[default]
  Blocking,
  /// Only commit builds that already finished; the rest stay `Rebuilding`.
  Poll,
}

/// Handle to one in-flight mesh build.
///
/// There is no cancellation: a handle is either joined or polled to
/// completion. Dropping it discards the result once the worker finishes.
#[derive(Debug)]
pub struct BuildHandle {
  id: u64,
  rx: Receiver<Result<PatchMesh>>,
  result: Option<Result<PatchMesh>>,
  /// The result was handed out; the closed channel no longer means abandoned.
  delivered: bool,
}

impl BuildHandle {
  /// Create a pending handle plus the sender its worker must complete.
  ///
  /// Dropping the sender without sending resolves the handle to
  /// [`TerrainError::BuildAbandoned`].
  pub fn channel() -> (BuildSender, BuildHandle) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let handle = BuildHandle {
      id: next_build_id(),
      rx,
      result: None,
      delivered: false,
    };
    (tx, handle)
  }

  /// Create a handle that is already complete.
  pub fn ready(result: Result<PatchMesh>) -> BuildHandle {
    let (_tx, mut handle) = Self::channel();
    handle.result = Some(result);
    handle
  }

  /// Unique id of this build.
  #[inline]
  pub fn id(&self) -> u64 {
    self.id
  }

  fn fetch(&mut self) {
    if self.delivered || self.result.is_some() {
      return;
    }
    self.result = match self.rx.try_recv() {
      Ok(result) => Some(result),
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => Some(Err(TerrainError::BuildAbandoned(self.id))),
    };
  }

  /// Check whether the result is available without taking it.
  pub fn is_finished(&mut self) -> bool {
    self.fetch();
    self.result.is_some()
  }

  /// Take the result if the build has finished (non-blocking).
  ///
  /// Returns `None` once the result has been taken.
  pub fn poll(&mut self) -> Option<Result<PatchMesh>> {
    self.fetch();
    let result = self.result.take();
    if result.is_some() {
      self.delivered = true;
    }
    result
  }

  /// Block until the build finishes.
  pub fn join(mut self) -> Result<PatchMesh> {
    if let Some(result) = self.result.take() {
      return result;
    }
    let id = self.id;
    self
      .rx
      .recv()
      .unwrap_or(Err(TerrainError::BuildAbandoned(id)))
  }
}

/// Runs mesh builds somewhere and reports back through a [`BuildHandle`].
pub trait MeshDispatcher: Send + Sync {
  /// Start building `request`.
  fn submit(&self, request: MeshRequest) -> BuildHandle;

  /// Number of builds submitted but not yet finished.
  fn in_flight(&self) -> usize {
    0
  }
}

/// Dispatcher backed by rayon.
///
/// Works across all platforms where rayon is supported (native,
/// wasm-bindgen-rayon, emscripten with pthreads).
#[derive(Clone, Default)]
pub struct RayonDispatcher {
  pool: Option<Arc<rayon::ThreadPool>>,
  in_flight: Arc<AtomicUsize>,
}

impl RayonDispatcher {
  /// Dispatch onto rayon's global pool.
  pub fn new() -> Self {
    Self::default()
  }

  /// Dispatch onto a dedicated pool.
  pub fn with_pool(pool: Arc<rayon::ThreadPool>) -> Self {
    Self {
      pool: Some(pool),
      in_flight: Arc::default(),
    }
  }

  /// Get the number of worker threads.
  pub fn num_threads(&self) -> usize {
    match &self.pool {
      Some(pool) => pool.current_num_threads(),
      None => rayon::current_num_threads(),
    }
  }
}

impl MeshDispatcher for RayonDispatcher {
  fn submit(&self, request: MeshRequest) -> BuildHandle {
    let (tx, handle) = BuildHandle::channel();
    let id = handle.id();
    let in_flight = Arc::clone(&self.in_flight);
    in_flight.fetch_add(1, Ordering::AcqRel);

    let work = move || {
      let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| build_patch_mesh(&request)));
      in_flight.fetch_sub(1, Ordering::AcqRel);
      match outcome {
        Ok(result) => {
          // The receiver is gone if the patch was dropped without joining.
          let _ = tx.send(result);
        }
        Err(_) => {
          tracing::error!(build = id, face = ?request.face, level = request.level, "mesh build panicked");
          drop(tx);
        }
      }
    };

    match &self.pool {
      Some(pool) => pool.spawn(work),
      None => rayon::spawn(work),
    }

    handle
  }

  fn in_flight(&self) -> usize {
    self.in_flight.load(Ordering::Acquire)
  }
}

impl std::fmt::Debug for RayonDispatcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RayonDispatcher")
      .field("dedicated_pool", &self.pool.is_some())
      .field("in_flight", &self.in_flight())
      .finish()
  }
}

/// Builds on the calling thread during `submit`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineDispatcher;

impl MeshDispatcher for InlineDispatcher {
  fn submit(&self, request: MeshRequest) -> BuildHandle {
    BuildHandle::ready(build_patch_mesh(&request))
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use glam::{DVec2, Vec3};

  use super::*;
  use crate::sphere::CubeFace;

  fn request() -> MeshRequest {
    MeshRequest {
      face: CubeFace::Yn,
      edge_subdivisions: 2,
      center: DVec2::ZERO,
      level: 0,
      origin: Vec3::new(0.0, -10.0, 0.0),
      radius: 10.0,
      coarser_edges: [0; 4],
    }
  }

  #[test]
  fn test_submit_and_join() {
    let dispatcher = RayonDispatcher::new();
    let handle = dispatcher.submit(request());
    let mesh = handle.join().unwrap();
    assert_eq!(mesh.vertex_count(), 25);
  }

  #[test]
  fn test_submit_and_poll() {
    let dispatcher = RayonDispatcher::new();
    let mut handle = dispatcher.submit(request());

    // Poll until complete
    let mut result = None;
    for _ in 0..1000 {
      if let Some(r) = handle.poll() {
        result = Some(r);
        break;
      }
      std::thread::sleep(std::time::Duration::from_millis(1));
    }

    assert_eq!(result.unwrap().unwrap().triangle_count(), 32);
    // The result is handed out once.
    assert!(handle.poll().is_none());
  }

  #[test]
  fn test_multiple_builds_on_dedicated_pool() {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
    let dispatcher = RayonDispatcher::with_pool(Arc::new(pool));
    assert_eq!(dispatcher.num_threads(), 2);

    let handles: Vec<_> = (0..8).map(|_| dispatcher.submit(request())).collect();
    let ids: std::collections::HashSet<_> = handles.iter().map(|h| h.id()).collect();
    assert_eq!(ids.len(), 8);

    for handle in handles {
      assert!(handle.join().is_ok());
    }
    assert_eq!(dispatcher.in_flight(), 0);
  }

  #[test]
  fn test_errors_are_delivered() {
    let mut bad = request();
    bad.edge_subdivisions = 9;
    let handle = RayonDispatcher::new().submit(bad);
    assert!(matches!(handle.join(), Err(TerrainError::MeshTooLarge { .. })));
  }

  #[test]
  fn test_inline_is_ready_immediately() {
    let mut handle = InlineDispatcher.submit(request());
    assert!(handle.is_finished());
    assert!(handle.is_finished());
    assert!(handle.poll().unwrap().is_ok());
    assert!(handle.poll().is_none());
    assert!(!handle.is_finished());
  }

  #[test]
  fn test_taken_result_is_not_reported_again() {
    let (tx, mut handle) = BuildHandle::channel();
    tx.send(build_patch_mesh(&request())).unwrap();
    drop(tx);

    assert!(handle.is_finished());
    assert!(handle.poll().unwrap().is_ok());
    // The sender is gone, but nothing was abandoned.
    assert!(!handle.is_finished());
    assert!(handle.poll().is_none());
    assert!(handle.poll().is_none());
  }

  #[test]
  fn test_dropped_sender_is_abandoned() {
    let (tx, mut handle) = BuildHandle::channel();
    let id = handle.id();
    assert!(!handle.is_finished());
    drop(tx);
    assert_eq!(handle.poll(), Some(Err(TerrainError::BuildAbandoned(id))));
    assert!(handle.poll().is_none());

    let (tx, handle) = BuildHandle::channel();
    drop(tx);
    let id = handle.id();
    assert_eq!(handle.join(), Err(TerrainError::BuildAbandoned(id)));
  }
}
