//! Sliding chunk window, streaming, and per-frame draw emission.

use std::sync::Arc;

use hashbrown::HashSet;
use tephra_blocks::BlockRegistry;
use tephra_chunk::{
    CHUNK_SY, Chunk, ChunkCoord, ChunkSource, Chunklet, ChunkletCoord, Face,
};
use tephra_geom::{Containment, Frustum, Vec3};
use tephra_runtime::{LoadJob, MeshJob, Runtime, RuntimeOptions};

use crate::render::{Pass, RenderBackend};
use crate::visibility::{ChunkletGraph, Walker};

/// The streamed world: a `(2r+1)x(2r+1)` window of chunk columns kept
/// centered on the observer, plus the per-frame visibility and draw
/// machinery.
pub struct World {
    radius: i32,
    span: i32,
    center: ChunkCoord,
    /// Row-major `[z][x]` slots relative to the window's min corner.
    /// Boxed so retained chunks keep identity across window shifts.
    slots: Vec<Option<Box<Chunk>>>,
    pending_loads: HashSet<ChunkCoord>,
    reg: Arc<BlockRegistry>,
    runtime: Runtime,
    /// Current frame's draw-flag value; bumped at the end of `draw`.
    stamp: u64,
    walker: Walker,
    render_list: Vec<ChunkletCoord>,
    next_job_id: u64,
}

#[inline]
fn slot_index(center: ChunkCoord, span: i32, coord: ChunkCoord) -> Option<usize> {
    let r = (span - 1) / 2;
    let dx = coord.cx - (center.cx - r);
    let dz = coord.cz - (center.cz - r);
    if (0..span).contains(&dx) && (0..span).contains(&dz) {
        Some((dz * span + dx) as usize)
    } else {
        None
    }
}

impl World {
    pub fn new(
        radius: i32,
        center: ChunkCoord,
        reg: Arc<BlockRegistry>,
        source: Arc<dyn ChunkSource>,
        options: RuntimeOptions,
    ) -> Self {
        let radius = radius.max(0);
        let span = 2 * radius + 1;
        let runtime = Runtime::new(source, Arc::clone(&reg), options);
        let mut world = Self {
            radius,
            span,
            center,
            slots: (0..span * span).map(|_| None).collect(),
            pending_loads: HashSet::new(),
            reg,
            runtime,
            stamp: 1,
            walker: Walker::default(),
            render_list: Vec::new(),
            next_job_id: 1,
        };
        world.fill_chunks();
        world
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Optional squared-distance cap on the visibility walk.
    pub fn set_walk_limit(&mut self, limit: Option<f32>) {
        self.walker.max_distance_sq = limit;
    }

    #[inline]
    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    // ---- queries ---------------------------------------------------

    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        slot_index(self.center, self.span, coord)
            .and_then(|i| self.slots[i].as_deref())
    }

    fn get_chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        slot_index(self.center, self.span, coord)
            .and_then(|i| self.slots[i].as_deref_mut())
    }

    pub fn get_chunklet(&self, coord: ChunkletCoord) -> Option<&Chunklet> {
        if !coord.in_world_height() {
            return None;
        }
        self.get_chunk(coord.chunk())
            .map(|c| c.chunklet(coord.sy as usize))
    }

    fn get_chunklet_mut(&mut self, coord: ChunkletCoord) -> Option<&mut Chunklet> {
        if !coord.in_world_height() {
            return None;
        }
        self.get_chunk_mut(coord.chunk())
            .map(|c| c.chunklet_mut(coord.sy as usize))
    }

    /// Block id at world coordinates. Out-of-window, unloaded, and
    /// out-of-height positions all read as air.
    pub fn block_at(&self, wx: i32, wy: i32, wz: i32) -> u8 {
        if !(0..CHUNK_SY as i32).contains(&wy) {
            return 0;
        }
        let coord = ChunkCoord::new(wx.div_euclid(16), wz.div_euclid(16));
        match self.get_chunk(coord) {
            Some(chunk) => chunk.block(
                wx.rem_euclid(16) as usize,
                wy as usize,
                wz.rem_euclid(16) as usize,
            ),
            None => 0,
        }
    }

    /// Combined `max(skylight, blocklight)` at world coordinates.
    /// Above the world everything is fully skylit; below it is dark,
    /// as are unloaded chunks.
    pub fn light_at(&self, wx: i32, wy: i32, wz: i32) -> u8 {
        if wy >= CHUNK_SY as i32 {
            return 15;
        }
        if wy < 0 {
            return 0;
        }
        let coord = ChunkCoord::new(wx.div_euclid(16), wz.div_euclid(16));
        match self.get_chunk(coord) {
            Some(chunk) => chunk.light_max(
                wx.rem_euclid(16) as usize,
                wy as usize,
                wz.rem_euclid(16) as usize,
            ),
            None => 0,
        }
    }

    #[inline]
    pub fn is_solid_at(&self, wx: i32, wy: i32, wz: i32) -> bool {
        self.reg.is_solid(self.block_at(wx, wy, wz))
    }

    /// Whether the chunklet containing a position is resident. Physics
    /// holds still while the ground under the observer is not loaded.
    pub fn chunklet_loaded_at(&self, p: Vec3) -> bool {
        self.get_chunklet(ChunkletCoord::containing(p)).is_some()
    }

    // ---- streaming -------------------------------------------------

    /// Per-frame window maintenance: drains worker completions, then
    /// recenters the window one column/row at a time toward the
    /// observer, then requests loads for any empty slots.
    pub fn advance(&mut self, observer_x: f32, observer_z: f32) {
        self.drain_completions();
        let target = ChunkCoord::containing(observer_x, observer_z);
        let moved = self.center != target;
        while self.center != target {
            let dx = (target.cx - self.center.cx).signum();
            if dx != 0 {
                self.shift(dx, 0);
                continue;
            }
            let dz = (target.cz - self.center.cz).signum();
            self.shift(0, dz);
        }
        if moved {
            log::debug!(
                "window recentered to ({}, {})",
                self.center.cx,
                self.center.cz
            );
            self.fill_chunks();
        }
    }

    /// Shifts the window one step, dropping the vacated edge and
    /// reusing the slot storage in place.
    fn shift(&mut self, dx: i32, dz: i32) {
        debug_assert_eq!(dx.abs() + dz.abs(), 1);
        let span = self.span as usize;
        if dx != 0 {
            for z in 0..span {
                let row = z * span;
                if dx > 0 {
                    drop(self.slots[row].take());
                    for x in 0..span - 1 {
                        self.slots[row + x] = self.slots[row + x + 1].take();
                    }
                } else {
                    drop(self.slots[row + span - 1].take());
                    for x in (1..span).rev() {
                        self.slots[row + x] = self.slots[row + x - 1].take();
                    }
                }
            }
        } else {
            if dz > 0 {
                for x in 0..span {
                    drop(self.slots[x].take());
                }
                for z in 0..span - 1 {
                    for x in 0..span {
                        self.slots[z * span + x] = self.slots[(z + 1) * span + x].take();
                    }
                }
            } else {
                for x in 0..span {
                    drop(self.slots[(span - 1) * span + x].take());
                }
                for z in (1..span).rev() {
                    for x in 0..span {
                        self.slots[z * span + x] = self.slots[(z - 1) * span + x].take();
                    }
                }
            }
        }
        self.center = ChunkCoord::new(self.center.cx + dx, self.center.cz + dz);
    }

    /// Requests a load for every empty window slot that is not already
    /// pending.
    pub fn fill_chunks(&mut self) {
        for dz in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let coord = ChunkCoord::new(self.center.cx + dx, self.center.cz + dz);
                let idx = slot_index(self.center, self.span, coord)
                    .expect("window coord in window");
                if self.slots[idx].is_none() && !self.pending_loads.contains(&coord) {
                    self.pending_loads.insert(coord);
                    self.runtime.submit_load_job(LoadJob { coord });
                }
            }
        }
    }

    /// Unloads everything, reallocates the window for the new radius,
    /// and re-requests all chunks. Expensive and rare.
    pub fn set_load_radius(&mut self, radius: i32) {
        let radius = radius.max(0);
        self.radius = radius;
        self.span = 2 * radius + 1;
        self.slots = (0..self.span * self.span).map(|_| None).collect();
        self.pending_loads.clear();
        log::info!("load radius set to {radius}");
        self.fill_chunks();
    }

    /// Main-thread hand-off point for everything the workers finished.
    fn drain_completions(&mut self) {
        for out in self.runtime.drain_load_results() {
            self.pending_loads.remove(&out.coord);
            let Some(idx) = slot_index(self.center, self.span, out.coord) else {
                continue; // window moved on; drop the result
            };
            let Some(payload) = out.payload else {
                continue; // missing chunk: slot stays empty, retried later
            };
            if self.slots[idx].is_some() {
                continue;
            }
            let chunk = {
                let shell = |wx: i32, wy: i32, wz: i32| self.block_at(wx, wy, wz);
                Box::new(Chunk::new(out.coord, payload, &self.reg, &shell))
            };
            self.slots[idx] = Some(chunk);
            // Shared-face visibility depends on this chunk's data now.
            for n in out.coord.lateral_neighbors() {
                if let Some(chunk) = self.get_chunk_mut(n) {
                    chunk.geom_dirty();
                }
            }
        }
        for out in self.runtime.drain_mesh_results() {
            let Some(chunklet) = self.get_chunklet_mut(out.coord) else {
                continue; // evicted while the job ran
            };
            if !chunklet.publish_mesh(out.job_id, out.mesh) {
                log::trace!("stale mesh result dropped for {:?}", out.coord);
            }
        }
    }

    // ---- edits -----------------------------------------------------

    /// Writes a block and dirties the geometry of the containing
    /// chunklet and of any chunklet sharing the touched boundary.
    /// Sheet/empty flags are not recomputed, so an edit near a sealed
    /// boundary can leave stale occlusion until the chunk reloads.
    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, id: u8) {
        if !(0..CHUNK_SY as i32).contains(&wy) {
            return;
        }
        let coord = ChunkCoord::new(wx.div_euclid(16), wz.div_euclid(16));
        let (lx, ly, lz) = (
            wx.rem_euclid(16) as usize,
            wy as usize,
            wz.rem_euclid(16) as usize,
        );
        let Some(chunk) = self.get_chunk_mut(coord) else {
            return;
        };
        chunk.set_block(lx, ly, lz, id);
        let here = ChunkletCoord::new(coord.cx, wy.div_euclid(16), coord.cz);
        if let Some(c) = self.get_chunklet_mut(here) {
            c.geom_dirty();
        }
        for face in Face::ALL {
            let (dx, dy, dz) = face.delta();
            let neighbor_cell = (wx + dx, wy + dy, wz + dz);
            let n = ChunkletCoord::new(
                neighbor_cell.0.div_euclid(16),
                neighbor_cell.1.div_euclid(16),
                neighbor_cell.2.div_euclid(16),
            );
            if n != here
                && let Some(c) = self.get_chunklet_mut(n)
            {
                c.geom_dirty();
            }
        }
    }

    // ---- drawing ---------------------------------------------------

    /// Runs the visibility walk from the eye's chunklet, schedules
    /// mesh builds for whatever needs one, and emits the two passes:
    /// opaque front-to-back, transparent back-to-front.
    pub fn draw(&mut self, eye: Vec3, frustum: &Frustum, backend: &mut dyn RenderBackend) {
        let mut walker = std::mem::take(&mut self.walker);
        let mut list = std::mem::take(&mut self.render_list);

        let origin = ChunkletCoord::containing(eye);
        let stamp = self.stamp;
        {
            let mut graph = WorldGraph {
                world: self,
                frustum,
                eye,
            };
            walker.run(&mut graph, origin, stamp, &mut list);
        }

        list.sort_by(|a, b| a.distance_sq(eye).total_cmp(&b.distance_sq(eye)));

        for &coord in &list {
            self.schedule_mesh(coord);
            if let Some(mesh) = self
                .get_chunklet(coord)
                .and_then(|c| c.mesh())
                .and_then(|m| m.opaque.as_ref())
            {
                backend.draw_chunklet(coord, Pass::Opaque, mesh);
            }
        }
        for &coord in list.iter().rev() {
            if let Some(mesh) = self
                .get_chunklet(coord)
                .and_then(|c| c.mesh())
                .and_then(|m| m.transparent.as_ref())
            {
                backend.draw_chunklet(coord, Pass::Transparent, mesh);
            }
        }

        list.clear();
        self.render_list = list;
        self.walker = walker;
        self.stamp += 1;
    }

    /// Captures a snapshot and submits one mesh job if the chunklet is
    /// dirty, not empty, and has no job in flight.
    fn schedule_mesh(&mut self, coord: ChunkletCoord) {
        let needs = self
            .get_chunklet(coord)
            .map(|c| c.needs_mesh())
            .unwrap_or(false);
        if !needs {
            return;
        }
        // Snapshot buffers are finite. When all of them are out with
        // the workers the chunklet stays dirty and a later frame
        // retries; the frame loop never waits on a buffer.
        let Some(mut snapshot) = self.runtime.try_acquire_snapshot() else {
            return;
        };
        let min = coord.world_min();
        let (bx, by, bz) = (min.x as i32, min.y as i32, min.z as i32);
        snapshot.fill(
            min,
            |x, y, z| self.block_at(bx + x, by + y, bz + z),
            |x, y, z| self.light_at(bx + x, by + y, bz + z),
        );
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        if let Some(chunklet) = self.get_chunklet_mut(coord) {
            chunklet.begin_mesh(job_id);
        }
        self.runtime.submit_mesh_job(MeshJob {
            coord,
            job_id,
            snapshot,
        });
    }

    /// (queued mesh, inflight mesh, queued load, inflight load).
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        self.runtime.queue_debug_counts()
    }

    /// Blocks until the workers go idle, then drains their results.
    /// For the headless demo and tests, not the frame loop.
    pub fn pump(&mut self) {
        while !self.runtime.is_idle() {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        self.drain_completions();
    }
}

/// Walker view of the world for one frame.
struct WorldGraph<'a> {
    world: &'a mut World,
    frustum: &'a Frustum,
    eye: Vec3,
}

impl ChunkletGraph for WorldGraph<'_> {
    fn exists(&self, coord: ChunkletCoord) -> bool {
        self.world.get_chunklet(coord).is_some()
    }

    fn sheet(&self, coord: ChunkletCoord, face: Face) -> bool {
        self.world
            .get_chunklet(coord)
            .map(|c| c.sheet(face))
            .unwrap_or(false)
    }

    fn stamp(&self, coord: ChunkletCoord) -> u64 {
        self.world
            .get_chunklet(coord)
            .map(|c| c.stamp())
            .unwrap_or(0)
    }

    fn set_stamp(&mut self, coord: ChunkletCoord, stamp: u64) {
        if let Some(c) = self.world.get_chunklet_mut(coord) {
            c.set_stamp(stamp);
        }
    }

    fn containment(&self, coord: ChunkletCoord) -> Containment {
        self.frustum.intersect_aabb(&coord.bounds())
    }

    fn distance_sq(&self, coord: ChunkletCoord) -> f32 {
        coord.distance_sq(self.eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StatsBackend;
    use tephra_chunk::ChunkPayload;

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

        [[blocks]]
        name = "water"
        id = 8
        solid = true
        water = true
        tiles = { all = { tx = 13, ty = 12 } }
    "#;

    /// Stone slab up to y = 8 everywhere; a water layer on top of the
    /// slab in chunk (0, 0) only.
    struct SlabSource;

    impl ChunkSource for SlabSource {
        fn load(&self, coord: ChunkCoord) -> Option<ChunkPayload> {
            let mut p = ChunkPayload::empty();
            for x in 0..16 {
                for z in 0..16 {
                    for y in 0..8 {
                        p.set_block(x, y, z, 1);
                    }
                    if coord.cx == 0 && coord.cz == 0 {
                        p.set_block(x, 8, z, 8);
                    }
                }
            }
            Some(p)
        }
    }

    fn test_world(radius: i32) -> World {
        World::new(
            radius,
            ChunkCoord::new(0, 0),
            Arc::new(BlockRegistry::from_toml(BLOCKS).unwrap()),
            Arc::new(SlabSource),
            RuntimeOptions::default(),
        )
    }

    fn wide_frustum(eye: Vec3) -> Frustum {
        Frustum::from_camera(
            eye,
            Vec3::new(0.0, -1.0, 0.01),
            Vec3::new(1.0, 0.0, 0.0),
            120.0,
            1.0,
            0.1,
            10_000.0,
        )
    }

    #[test]
    fn window_shift_retains_chunk_identity() {
        let mut w = test_world(1);
        w.pump();
        for dz in -1..=1 {
            for dx in -1..=1 {
                assert!(w.get_chunk(ChunkCoord::new(dx, dz)).is_some());
            }
        }

        let retained: Vec<(ChunkCoord, *const Chunk)> = (0..=1)
            .flat_map(|cx| (-1..=1).map(move |cz| ChunkCoord::new(cx, cz)))
            .map(|c| (c, w.get_chunk(c).unwrap() as *const Chunk))
            .collect();

        // Observer steps into chunk column (1, 0).
        w.advance(16.5, 0.5);
        assert_eq!(w.center(), ChunkCoord::new(1, 0));
        for cz in -1..=1 {
            assert!(w.get_chunk(ChunkCoord::new(-1, cz)).is_none());
        }
        for (coord, ptr) in &retained {
            assert_eq!(
                w.get_chunk(*coord).unwrap() as *const Chunk,
                *ptr,
                "retained chunk reloaded needlessly"
            );
        }

        w.pump();
        for cz in -1..=1 {
            assert!(w.get_chunk(ChunkCoord::new(2, cz)).is_some());
        }
    }

    #[test]
    fn block_queries_degrade_to_air() {
        let mut w = test_world(1);
        w.pump();
        assert_eq!(w.block_at(0, 0, 0), 1);
        assert_eq!(w.block_at(-1, 0, -1), 1, "neighbor chunk answers");
        assert_eq!(w.block_at(0, -1, 0), 0);
        assert_eq!(w.block_at(0, 128, 0), 0);
        assert_eq!(w.block_at(1000, 0, 0), 0, "out of window");
        assert_eq!(w.light_at(0, 500, 0), 15, "above the world is sky");
        assert_eq!(w.light_at(0, -5, 0), 0);
    }

    #[test]
    fn draw_passes_are_distance_sorted() {
        let mut w = test_world(1);
        w.pump();
        let eye = Vec3::new(8.0, 40.0, 8.0);
        let frustum = wide_frustum(eye);
        let mut backend = StatsBackend::default();

        // First draw schedules mesh jobs; nothing is published yet.
        w.draw(eye, &frustum, &mut backend);
        backend.reset();
        w.pump();
        w.draw(eye, &frustum, &mut backend);

        assert!(backend.opaque_draws > 0);
        assert!(backend.transparent_draws > 0, "water layer emits");

        let opaque: Vec<f32> = backend
            .sequence
            .iter()
            .filter(|(_, p)| *p == Pass::Opaque)
            .map(|(c, _)| c.distance_sq(eye))
            .collect();
        assert!(opaque.windows(2).all(|w| w[0] <= w[1]));
        let transparent: Vec<f32> = backend
            .sequence
            .iter()
            .filter(|(_, p)| *p == Pass::Transparent)
            .map(|(c, _)| c.distance_sq(eye))
            .collect();
        assert!(transparent.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn draw_defers_meshing_when_snapshot_buffers_are_out() {
        let mut w = test_world(1);
        w.pump();
        let eye = Vec3::new(8.0, 40.0, 8.0);
        let frustum = wide_frustum(eye);
        let mut backend = StatsBackend::default();

        // Hold every snapshot buffer so the pool has nothing to hand
        // out. The draw must still return, leaving each dirty chunklet
        // unscheduled and retryable rather than waiting on a worker.
        let hold_a = w.runtime.try_acquire_snapshot().unwrap();
        let hold_b = w.runtime.try_acquire_snapshot().unwrap();
        w.draw(eye, &frustum, &mut backend);

        let coords: Vec<ChunkletCoord> = (-1..=1)
            .flat_map(|cx| (-1..=1).map(move |cz| ChunkletCoord::new(cx, 0, cz)))
            .collect();
        for &c in &coords {
            let ch = w.get_chunklet(c).unwrap();
            assert!(ch.needs_mesh(), "deferred, not stuck behind a job");
            assert!(ch.mesh().is_none());
        }
        let (queued, inflight, _, _) = w.queue_debug_counts();
        assert_eq!(queued + inflight, 0);

        // With the buffers back, later frames drain the backlog two
        // jobs at a time.
        drop(hold_a);
        drop(hold_b);
        for _ in 0..8 {
            backend.reset();
            w.draw(eye, &frustum, &mut backend);
            w.pump();
        }
        for &c in &coords {
            assert!(w.get_chunklet(c).unwrap().mesh().is_some());
        }
    }

    #[test]
    fn draw_from_unloaded_chunklet_emits_nothing() {
        let mut w = test_world(1);
        w.pump();
        let eye = Vec3::new(500.0, 40.0, 500.0);
        let mut backend = StatsBackend::default();
        w.draw(eye, &wide_frustum(eye), &mut backend);
        assert!(backend.sequence.is_empty());
    }

    #[test]
    fn edits_dirty_and_remesh() {
        let mut w = test_world(0);
        w.pump();
        let eye = Vec3::new(8.0, 40.0, 8.0);
        let frustum = wide_frustum(eye);
        let mut backend = StatsBackend::default();
        w.draw(eye, &frustum, &mut backend);
        w.pump();

        let coord = ChunkletCoord::new(0, 0, 0);
        assert!(!w.get_chunklet(coord).unwrap().is_dirty());
        w.set_block(4, 4, 4, 0);
        assert!(w.get_chunklet(coord).unwrap().is_dirty());

        backend.reset();
        w.draw(eye, &frustum, &mut backend);
        w.pump();
        assert!(!w.get_chunklet(coord).unwrap().is_dirty());
        assert!(w.get_chunklet(coord).unwrap().mesh().is_some());
    }

    #[test]
    fn radius_change_reloads_the_window() {
        let mut w = test_world(1);
        w.pump();
        w.set_load_radius(0);
        w.pump();
        assert!(w.get_chunk(ChunkCoord::new(0, 0)).is_some());
        assert!(w.get_chunk(ChunkCoord::new(1, 0)).is_none());

        w.set_load_radius(2);
        w.pump();
        assert!(w.get_chunk(ChunkCoord::new(2, 2)).is_some());
    }
}
