use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use tephra_mesh_cpu::ChunkletSnapshot;

/// Lock-free pool that recycles snapshot buffers between the capture
/// side (main thread) and the mesh workers that consume them.
pub struct SnapshotPool {
    available_tx: Sender<ChunkletSnapshot>,
    available_rx: Receiver<ChunkletSnapshot>,
    allocated: AtomicUsize,
    max_snapshots: usize,
}

impl SnapshotPool {
    pub fn new(max_snapshots: usize) -> Self {
        debug_assert!(max_snapshots > 0);
        let (tx, rx) = bounded(max_snapshots);
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            max_snapshots,
        }
    }

    /// Two buffers per worker covers one in flight plus one being
    /// captured.
    pub fn with_capacity_from_workers(worker_count: usize) -> Arc<Self> {
        Arc::new(Self::new(worker_count.max(1) * 2))
    }

    /// Acquire a snapshot buffer without blocking: reuse a returned
    /// one, allocate fresh while under capacity, and report `None`
    /// once every buffer is out with a mesh job. The caller keeps the
    /// chunklet dirty and retries on a later frame.
    pub fn try_acquire(self: &Arc<Self>) -> Option<PooledSnapshot> {
        if let Ok(snap) = self.available_rx.try_recv() {
            return Some(self.wrap(snap));
        }
        if self.allocated.fetch_add(1, Ordering::AcqRel) < self.max_snapshots {
            return Some(self.wrap(ChunkletSnapshot::default()));
        }
        self.allocated.fetch_sub(1, Ordering::AcqRel);
        // A worker may have returned a buffer between the two checks.
        self.available_rx.try_recv().ok().map(|snap| self.wrap(snap))
    }

    fn wrap(self: &Arc<Self>, snap: ChunkletSnapshot) -> PooledSnapshot {
        PooledSnapshot {
            snap: Some(snap),
            pool: Arc::clone(self),
        }
    }

    fn release(&self, snap: ChunkletSnapshot) {
        let _ = self.available_tx.send(snap);
    }
}

/// Owned handle to a pooled snapshot. Unlike a borrow-based guard it
/// can cross thread boundaries inside a job and returns its buffer to
/// the pool on drop from whichever thread finishes with it.
pub struct PooledSnapshot {
    snap: Option<ChunkletSnapshot>,
    pool: Arc<SnapshotPool>,
}

impl Deref for PooledSnapshot {
    type Target = ChunkletSnapshot;

    fn deref(&self) -> &Self::Target {
        self.snap.as_ref().expect("snapshot already released")
    }
}

impl DerefMut for PooledSnapshot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.snap.as_mut().expect("snapshot already released")
    }
}

impl Drop for PooledSnapshot {
    fn drop(&mut self) {
        if let Some(snap) = self.snap.take() {
            self.pool.release(snap);
        }
    }
}
