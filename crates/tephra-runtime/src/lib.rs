//! Background job queues and worker orchestration for chunk loading
//! and chunklet meshing.
#![forbid(unsafe_code)]

mod snapshot_pool;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tephra_blocks::BlockRegistry;
use tephra_chunk::{ChunkCoord, ChunkPayload, ChunkSource, ChunkletCoord};
use tephra_mesh_cpu::{ChunkletMesh, build_chunklet_mesh};

pub use snapshot_pool::{PooledSnapshot, SnapshotPool};

/// A mesh build request. The snapshot was captured on the main thread,
/// so the worker never touches world state.
pub struct MeshJob {
    pub coord: ChunkletCoord,
    pub job_id: u64,
    pub snapshot: PooledSnapshot,
}

pub struct MeshJobOut {
    pub coord: ChunkletCoord,
    pub job_id: u64,
    pub mesh: ChunkletMesh,
}

pub struct LoadJob {
    pub coord: ChunkCoord,
}

/// `payload` is `None` when the source has no chunk at the coordinate.
pub struct LoadJobOut {
    pub coord: ChunkCoord,
    pub payload: Option<ChunkPayload>,
}

#[derive(Clone, Copy, Debug)]
pub struct RuntimeOptions {
    pub mesh_workers: usize,
    pub load_workers: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        // One mesh worker is enough to keep up with edits and window
        // shifts; loads overlap I/O so they get a second thread.
        Self {
            mesh_workers: 1,
            load_workers: 2,
        }
    }
}

/// Owns the worker pools and the channels between them and the main
/// thread. Results are never pushed; the frame loop drains them.
pub struct Runtime {
    mesh_tx: Sender<MeshJob>,
    mesh_rx: Receiver<MeshJobOut>,
    load_tx: Sender<LoadJob>,
    load_rx: Receiver<LoadJobOut>,
    _mesh_pool: Arc<ThreadPool>,
    _load_pool: Arc<ThreadPool>,
    q_mesh: Arc<AtomicUsize>,
    q_load: Arc<AtomicUsize>,
    inflight_mesh: Arc<AtomicUsize>,
    inflight_load: Arc<AtomicUsize>,
    snapshot_pool: Arc<SnapshotPool>,
    pub mesh_workers: usize,
    pub load_workers: usize,
}

impl Runtime {
    pub fn new(
        source: Arc<dyn ChunkSource>,
        reg: Arc<BlockRegistry>,
        options: RuntimeOptions,
    ) -> Self {
        let mesh_workers = options.mesh_workers.max(1);
        let load_workers = options.load_workers.max(1);

        let (mesh_job_tx, mesh_job_rx) = unbounded::<MeshJob>();
        let (mesh_res_tx, mesh_res_rx) = unbounded::<MeshJobOut>();
        let (load_job_tx, load_job_rx) = unbounded::<LoadJob>();
        let (load_res_tx, load_res_rx) = unbounded::<LoadJobOut>();

        let q_mesh = Arc::new(AtomicUsize::new(0));
        let q_load = Arc::new(AtomicUsize::new(0));
        let inflight_mesh = Arc::new(AtomicUsize::new(0));
        let inflight_load = Arc::new(AtomicUsize::new(0));

        let snapshot_pool = SnapshotPool::with_capacity_from_workers(mesh_workers);

        let mesh_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(mesh_workers)
                .thread_name(|i| format!("tephra-mesh-{i}"))
                .build()
                .expect("mesh pool"),
        );
        for _ in 0..mesh_workers {
            let rx = mesh_job_rx.clone();
            let tx = mesh_res_tx.clone();
            let reg = reg.clone();
            let q_mesh = q_mesh.clone();
            let inflight_mesh = inflight_mesh.clone();
            mesh_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q_mesh.fetch_sub(1, Ordering::Relaxed);
                    inflight_mesh.fetch_add(1, Ordering::Relaxed);
                    let mesh = build_chunklet_mesh(&job.snapshot, &reg);
                    // Return the buffer before the counters say idle,
                    // so an idle runtime implies a refilled pool.
                    drop(job.snapshot);
                    let _ = tx.send(MeshJobOut {
                        coord: job.coord,
                        job_id: job.job_id,
                        mesh,
                    });
                    inflight_mesh.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        let load_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(load_workers)
                .thread_name(|i| format!("tephra-load-{i}"))
                .build()
                .expect("load pool"),
        );
        for _ in 0..load_workers {
            let rx = load_job_rx.clone();
            let tx = load_res_tx.clone();
            let source = source.clone();
            let q_load = q_load.clone();
            let inflight_load = inflight_load.clone();
            load_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q_load.fetch_sub(1, Ordering::Relaxed);
                    inflight_load.fetch_add(1, Ordering::Relaxed);
                    let payload = source.load(job.coord);
                    if payload.is_none() {
                        log::debug!("no chunk at ({}, {})", job.coord.cx, job.coord.cz);
                    }
                    let _ = tx.send(LoadJobOut {
                        coord: job.coord,
                        payload,
                    });
                    inflight_load.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        Self {
            mesh_tx: mesh_job_tx,
            mesh_rx: mesh_res_rx,
            load_tx: load_job_tx,
            load_rx: load_res_rx,
            _mesh_pool: mesh_pool,
            _load_pool: load_pool,
            q_mesh,
            q_load,
            inflight_mesh,
            inflight_load,
            snapshot_pool,
            mesh_workers,
            load_workers,
        }
    }

    /// Buffer to capture the next mesh snapshot into, or `None` while
    /// every pooled buffer is out with a worker. Never blocks; the
    /// frame loop submits what it can and retries the rest later.
    pub fn try_acquire_snapshot(&self) -> Option<PooledSnapshot> {
        self.snapshot_pool.try_acquire()
    }

    pub fn submit_mesh_job(&self, job: MeshJob) {
        self.q_mesh.fetch_add(1, Ordering::Relaxed);
        if self.mesh_tx.send(job).is_err() {
            self.q_mesh.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn submit_load_job(&self, job: LoadJob) {
        self.q_load.fetch_add(1, Ordering::Relaxed);
        if self.load_tx.send(job).is_err() {
            self.q_load.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn drain_mesh_results(&self) -> Vec<MeshJobOut> {
        self.mesh_rx.try_iter().collect()
    }

    pub fn drain_load_results(&self) -> Vec<LoadJobOut> {
        self.load_rx.try_iter().collect()
    }

    /// (queued mesh, inflight mesh, queued load, inflight load).
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_mesh.load(Ordering::Relaxed),
            self.inflight_mesh.load(Ordering::Relaxed),
            self.q_load.load(Ordering::Relaxed),
            self.inflight_load.load(Ordering::Relaxed),
        )
    }

    /// Whether any work is queued or executing on either lane.
    pub fn is_idle(&self) -> bool {
        let (qm, im, ql, il) = self.queue_debug_counts();
        qm + im + ql + il == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tephra_geom::Vec3;

    const BLOCKS: &str = r#"
        [[blocks]]
        name = "air"
        id = 0

        [[blocks]]
        name = "stone"
        id = 1
        solid = true
        opaque = true
        tiles = { all = { tx = 1, ty = 0 } }
    "#;

    struct FlatSource;

    impl ChunkSource for FlatSource {
        fn load(&self, coord: ChunkCoord) -> Option<ChunkPayload> {
            if coord.cx < 0 {
                return None;
            }
            let mut p = ChunkPayload::empty();
            for x in 0..16 {
                for z in 0..16 {
                    p.set_block(x, 0, z, 1);
                }
            }
            Some(p)
        }
    }

    fn runtime() -> Runtime {
        Runtime::new(
            Arc::new(FlatSource),
            Arc::new(BlockRegistry::from_toml(BLOCKS).unwrap()),
            RuntimeOptions::default(),
        )
    }

    fn wait_for<T>(mut poll: impl FnMut() -> Vec<T>) -> Vec<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let out = poll();
            if !out.is_empty() {
                return out;
            }
            assert!(Instant::now() < deadline, "worker result never arrived");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn load_jobs_round_trip_through_workers() {
        let rt = runtime();
        rt.submit_load_job(LoadJob {
            coord: ChunkCoord::new(2, 3),
        });
        rt.submit_load_job(LoadJob {
            coord: ChunkCoord::new(-1, 0),
        });
        let mut seen = Vec::new();
        while seen.len() < 2 {
            seen.extend(wait_for(|| rt.drain_load_results()));
        }
        for out in &seen {
            if out.coord.cx < 0 {
                assert!(out.payload.is_none());
            } else {
                assert_eq!(out.payload.as_ref().unwrap().block(0, 0, 0), 1);
            }
        }
    }

    #[test]
    fn mesh_jobs_carry_their_ids_back() {
        let rt = runtime();
        let mut snap = rt.try_acquire_snapshot().unwrap();
        snap.fill(
            Vec3::ZERO,
            |x, y, z| u8::from(x == 0 && y == 0 && z == 0),
            |_, _, _| 15,
        );
        rt.submit_mesh_job(MeshJob {
            coord: ChunkletCoord::new(0, 0, 0),
            job_id: 41,
            snapshot: snap,
        });
        let out = wait_for(|| rt.drain_mesh_results());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].job_id, 41);
        let opaque = out[0].mesh.opaque.as_ref().unwrap();
        assert_eq!(opaque.quad_count(), 6);
    }

    #[test]
    fn counters_settle_back_to_idle() {
        let rt = runtime();
        rt.submit_load_job(LoadJob {
            coord: ChunkCoord::new(0, 0),
        });
        let _ = wait_for(|| rt.drain_load_results());
        let deadline = Instant::now() + Duration::from_secs(5);
        while !rt.is_idle() {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
