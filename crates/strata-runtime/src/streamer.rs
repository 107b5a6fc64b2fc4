use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::{HashMap, HashSet};
use strata_geom::{Aabb, Vec3};
use strata_mesh_cpu::{MeshExtractor, extractor_for};
use strata_world::{ChunkCoord, ConfigError, TerrainConfig, Voxel, VoxelSampler};

use crate::{ChunkSlot, Runtime, SlotState};

/// What one scheduling pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub center: ChunkCoord,
    pub evicted: usize,
    pub admitted: usize,
    pub dispatched: usize,
    pub harvested: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamerStats {
    pub pooled: usize,
    pub ready_to_load: usize,
    pub loading: usize,
    pub loaded: usize,
    pub total: usize,
    pub queued_jobs: usize,
    pub inflight_jobs: usize,
    pub failures: u64,
}

/// Read-only view of a loaded chunk for the renderer. Buffers are replaced
/// wholesale whenever the slot is reused; `generation` changes with them.
#[derive(Clone, Copy, Debug)]
pub struct ChunkRender<'a> {
    pub coord: ChunkCoord,
    pub origin: Vec3,
    pub bounds: Aabb,
    pub vertices: &'a [Vec3],
    pub indices: &'a [u32],
    pub visible: bool,
    pub generation: u64,
}

/// Owns every chunk slot and moves them between the pool, ready-to-load,
/// loading, and loaded collections once per tick. All state transitions happen
/// on the thread that calls [`TerrainStreamer::tick`].
pub struct TerrainStreamer {
    cfg: Arc<TerrainConfig>,
    sampler: Arc<VoxelSampler>,
    runtime: Runtime,
    slots: Vec<ChunkSlot>,
    pool: VecDeque<usize>,
    ready_to_load: VecDeque<usize>,
    loading: Vec<usize>,
    loaded: Vec<usize>,
    by_coord: HashMap<ChunkCoord, usize>,
    /// Offsets within `load_radius`, nearest first, ties by x then z.
    admit_offsets: Vec<ChunkCoord>,
    /// Bound on the observer chunk so every coordinate within the unload
    /// radius stays addressable.
    center_limit: i32,
    last_observer: Vec3,
    ticks: u64,
    failures: u64,
}

impl TerrainStreamer {
    /// Validates `cfg` and warms the slot pool. Nothing is allocated when the
    /// configuration is rejected.
    pub fn new(cfg: TerrainConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let extractor = extractor_for(cfg.mesher, cfg.iso_level);
        Ok(Self::build(cfg, extractor))
    }

    /// Like [`TerrainStreamer::new`] with a caller-supplied mesh extractor in
    /// place of the configured one.
    pub fn with_extractor(
        cfg: TerrainConfig,
        extractor: Arc<dyn MeshExtractor>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::build(cfg, extractor))
    }

    fn build(cfg: TerrainConfig, extractor: Arc<dyn MeshExtractor>) -> Self {
        let cfg = Arc::new(cfg);
        let sampler = Arc::new(VoxelSampler::from_config(&cfg));
        let capacity = cfg.slot_capacity();
        let slots: Vec<ChunkSlot> = (0..capacity).map(ChunkSlot::new).collect();
        let pool: VecDeque<usize> = (0..capacity).collect();
        let admit_offsets = ChunkCoord::default().disc(cfg.load_radius);
        let center_limit = ChunkCoord::max_index(cfg.chunk_size).saturating_sub(cfg.unload_radius);
        if capacity < admit_offsets.len() {
            log::warn!(
                target: "streamer",
                "pool of {capacity} slots cannot cover the {} chunks within load radius {}",
                admit_offsets.len(),
                cfg.load_radius
            );
        }
        let runtime = Runtime::new(Arc::clone(&cfg), Arc::clone(&sampler), Arc::clone(&extractor));
        log::info!(
            target: "streamer",
            "terrain streamer ready: {capacity} slots, chunk {}x{}x{}, radii load={} unload={}, {} workers, mesher={}, seams={:?}",
            cfg.chunk_size,
            cfg.chunk_height,
            cfg.chunk_size,
            cfg.load_radius,
            cfg.unload_radius,
            runtime.workers,
            extractor.name(),
            cfg.seams
        );
        Self {
            cfg,
            sampler,
            runtime,
            slots,
            pool,
            ready_to_load: VecDeque::new(),
            loading: Vec::new(),
            loaded: Vec::new(),
            by_coord: HashMap::new(),
            admit_offsets,
            center_limit,
            last_observer: Vec3::ZERO,
            ticks: 0,
            failures: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.cfg
    }

    #[inline]
    pub fn sampler(&self) -> &VoxelSampler {
        &self.sampler
    }

    #[inline]
    pub fn slot(&self, id: usize) -> Option<&ChunkSlot> {
        self.slots.get(id)
    }

    #[inline]
    pub fn slots(&self) -> &[ChunkSlot] {
        &self.slots
    }

    /// One scheduling pass: evict, admit, dispatch, harvest. Never blocks.
    pub fn tick(&mut self, observer: Vec3) -> TickReport {
        self.ticks += 1;
        self.last_observer = observer;
        let center = self.observer_chunk(observer);
        let mut report = TickReport {
            tick: self.ticks,
            center,
            ..TickReport::default()
        };

        report.evicted = self.evict(center);
        report.admitted = self.admit(center);
        report.dispatched = self.dispatch();
        let (harvested, failed, late_evictions) = self.harvest(center);
        report.harvested = harvested;
        report.failed = failed;
        report.evicted += late_evictions;

        log::trace!(
            target: "streamer",
            "[tick {}] center=({}, {}) evicted={} admitted={} dispatched={} harvested={} failed={} pool={} ready={} loading={} loaded={}",
            report.tick,
            center.cx,
            center.cz,
            report.evicted,
            report.admitted,
            report.dispatched,
            report.harvested,
            report.failed,
            self.pool.len(),
            self.ready_to_load.len(),
            self.loading.len(),
            self.loaded.len()
        );
        debug_assert!(self.check_invariants().is_ok(), "{:?}", self.check_invariants());
        report
    }

    /// Chunk the observer stands in, held back from the edge of the
    /// addressable range.
    fn observer_chunk(&self, observer: Vec3) -> ChunkCoord {
        let center = ChunkCoord::containing(observer, self.cfg.chunk_size);
        let clamped = center.clamped(self.center_limit);
        if clamped != center {
            log::debug!(
                target: "streamer",
                "observer chunk ({}, {}) clamped to ({}, {})",
                center.cx,
                center.cz,
                clamped.cx,
                clamped.cz
            );
        }
        clamped
    }

    fn release_to_pool(&mut self, id: usize) {
        let slot = &mut self.slots[id];
        if let Some(c) = slot.coord() {
            self.by_coord.remove(&c);
        }
        slot.release();
        self.pool.push_back(id);
    }

    fn evict(&mut self, center: ChunkCoord) -> usize {
        let radius = self.cfg.unload_radius;
        let slots = &self.slots;
        let far = |id: &usize| {
            slots[*id]
                .coord()
                .is_some_and(|c| !center.within(c, radius))
        };
        let mut evicted: Vec<usize> = self.loaded.iter().copied().filter(far).collect();
        evicted.extend(self.ready_to_load.iter().copied().filter(far));
        if evicted.is_empty() {
            return 0;
        }
        let gone: HashSet<usize> = evicted.iter().copied().collect();
        self.loaded.retain(|id| !gone.contains(id));
        self.ready_to_load.retain(|id| !gone.contains(id));
        for &id in &evicted {
            if let Some(c) = self.slots[id].coord() {
                log::debug!(target: "streamer", "evict slot {id} from ({}, {})", c.cx, c.cz);
            }
            self.release_to_pool(id);
        }
        evicted.len()
    }

    fn admit(&mut self, center: ChunkCoord) -> usize {
        let mut admitted = 0;
        for off in &self.admit_offsets {
            let coord = center.offset(off.cx, off.cz);
            if self.by_coord.contains_key(&coord) {
                continue;
            }
            let Some(id) = self.pool.pop_front() else {
                break;
            };
            self.slots[id].assign(coord);
            self.by_coord.insert(coord, id);
            self.ready_to_load.push_back(id);
            admitted += 1;
            log::debug!(target: "streamer", "admit ({}, {}) into slot {id}", coord.cx, coord.cz);
        }
        admitted
    }

    fn dispatch(&mut self) -> usize {
        let mut dispatched = 0;
        while self.loading.len() < self.cfg.max_parallel_loads {
            let Some(id) = self.ready_to_load.pop_front() else {
                break;
            };
            let job = self.slots[id].begin_load();
            if let Err(job) = self.runtime.submit(job) {
                log::warn!(
                    target: "streamer",
                    "runtime is shut down; returning slot {} to the pool",
                    job.slot
                );
                self.release_to_pool(id);
                continue;
            }
            log::debug!(target: "streamer", "dispatch slot {id}");
            self.loading.push(id);
            dispatched += 1;
        }
        dispatched
    }

    /// Commits worker results, then moves ready slots to `loaded`. Returns
    /// `(harvested, failed, evicted_on_arrival)`.
    fn harvest(&mut self, center: ChunkCoord) -> (usize, usize, usize) {
        let mut failed = 0;
        for out in self.runtime.drain_worker_results() {
            let Some(slot) = self.slots.get_mut(out.slot) else {
                continue;
            };
            let current = slot.state() == SlotState::Loading && slot.ticket() == out.ticket;
            match out.result {
                Ok(built) => {
                    if !slot.complete(out.ticket, built) {
                        log::debug!(
                            target: "streamer",
                            "discard stale result for slot {} ticket {}",
                            out.slot,
                            out.ticket
                        );
                    }
                }
                Err(err) if current => {
                    log::warn!(target: "streamer", "{err}; slot {} returns to the pool", out.slot);
                    self.loading.retain(|id| *id != out.slot);
                    self.release_to_pool(out.slot);
                    self.failures += 1;
                    failed += 1;
                }
                Err(err) => {
                    log::debug!(target: "streamer", "discard stale failure: {err}");
                }
            }
        }

        let radius = self.cfg.unload_radius;
        let (ready, pending): (Vec<usize>, Vec<usize>) = self
            .loading
            .iter()
            .copied()
            .partition(|id| self.slots[*id].is_ready());
        self.loading = pending;
        let mut harvested = 0;
        let mut evicted = 0;
        for id in ready {
            let in_range = self.slots[id]
                .coord()
                .is_some_and(|c| center.within(c, radius));
            if in_range {
                self.slots[id].mark_loaded();
                self.loaded.push(id);
                harvested += 1;
            } else {
                // Eviction was deferred while the build was in flight.
                self.slots[id].mark_loaded();
                self.release_to_pool(id);
                evicted += 1;
            }
        }
        (harvested, failed, evicted)
    }

    /// Loaded chunks as renderer handles.
    pub fn renderables(&self) -> impl Iterator<Item = ChunkRender<'_>> + '_ {
        self.loaded.iter().filter_map(move |&id| self.render_view(id))
    }

    fn render_view(&self, id: usize) -> Option<ChunkRender<'_>> {
        let slot = &self.slots[id];
        if slot.state() != SlotState::Loaded {
            return None;
        }
        let coord = slot.coord()?;
        let origin = coord.world_origin(self.cfg.chunk_size, self.cfg.base_y);
        let size = self.cfg.chunk_size as f32;
        let extent = Vec3::new(size, self.cfg.chunk_height as f32, size);
        Some(ChunkRender {
            coord,
            origin,
            bounds: Aabb::from_origin_size(origin, extent),
            vertices: &slot.mesh().vertices,
            indices: &slot.mesh().indices,
            visible: slot.visible(),
            generation: slot.ready_generation(),
        })
    }

    /// Slot currently holding `coord` in any non-pooled state.
    pub fn chunk_at(&self, coord: ChunkCoord) -> Option<&ChunkSlot> {
        self.by_coord.get(&coord).map(|&id| &self.slots[id])
    }

    /// Loaded chunk containing a world-space position.
    pub fn chunk_at_position(&self, pos: Vec3) -> Option<ChunkRender<'_>> {
        let coord = ChunkCoord::try_containing(pos, self.cfg.chunk_size)?;
        let id = *self.by_coord.get(&coord)?;
        self.render_view(id)
    }

    /// Loaded chunks within `radius` chunks of `pos`, nearest first.
    pub fn chunks_around(&self, pos: Vec3, radius: i32) -> Vec<ChunkRender<'_>> {
        let Some(center) = ChunkCoord::try_containing(pos, self.cfg.chunk_size) else {
            return Vec::new();
        };
        center
            .disc(radius)
            .into_iter()
            .filter_map(|c| self.by_coord.get(&c).and_then(|&id| self.render_view(id)))
            .collect()
    }

    /// Voxel at a world-space position, if its chunk is loaded.
    pub fn voxel_at(&self, pos: Vec3) -> Option<Voxel> {
        let coord = ChunkCoord::try_containing(pos, self.cfg.chunk_size)?;
        let slot = self.chunk_at(coord)?;
        if slot.state() != SlotState::Loaded {
            return None;
        }
        let grid = slot.grid()?;
        let wy = (pos.y - self.cfg.base_y).floor() as i32;
        grid.get_world(pos.x.floor() as i32, wy, pos.z.floor() as i32)
    }

    pub fn stats(&self) -> StreamerStats {
        let (queued_jobs, inflight_jobs) = self.runtime.queue_debug_counts();
        StreamerStats {
            pooled: self.pool.len(),
            ready_to_load: self.ready_to_load.len(),
            loading: self.loading.len(),
            loaded: self.loaded.len(),
            total: self.slots.len(),
            queued_jobs,
            inflight_jobs,
            failures: self.failures,
        }
    }

    /// Verifies the slot partition, coordinate uniqueness, and the admission
    /// bound. Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let total = self.slots.len();
        let sum = self.pool.len() + self.ready_to_load.len() + self.loading.len() + self.loaded.len();
        if sum != total {
            return Err(format!("collections hold {sum} slots, expected {total}"));
        }
        let mut seen = vec![false; total];
        let groups: [(&str, SlotState, Vec<usize>); 4] = [
            ("pool", SlotState::Pooled, self.pool.iter().copied().collect()),
            (
                "ready_to_load",
                SlotState::ReadyToLoad,
                self.ready_to_load.iter().copied().collect(),
            ),
            ("loading", SlotState::Loading, self.loading.clone()),
            ("loaded", SlotState::Loaded, self.loaded.clone()),
        ];
        for (name, state, ids) in &groups {
            for &id in ids {
                let Some(slot) = self.slots.get(id) else {
                    return Err(format!("{name} references unknown slot {id}"));
                };
                if std::mem::replace(&mut seen[id], true) {
                    return Err(format!("slot {id} appears in more than one collection"));
                }
                if slot.state() != *state {
                    return Err(format!("slot {id} in {name} has state {:?}", slot.state()));
                }
                match (slot.state(), slot.coord()) {
                    (SlotState::Pooled, Some(c)) => {
                        return Err(format!("pooled slot {id} still holds ({}, {})", c.cx, c.cz));
                    }
                    (SlotState::Pooled, None) if slot.visible() => {
                        return Err(format!("pooled slot {id} is visible"));
                    }
                    (SlotState::Pooled, None) => {}
                    (_, None) => return Err(format!("slot {id} in {name} has no coordinate")),
                    (_, Some(c)) => {
                        if self.by_coord.get(&c) != Some(&id) {
                            return Err(format!(
                                "coordinate ({}, {}) not indexed to slot {id}",
                                c.cx, c.cz
                            ));
                        }
                    }
                }
            }
        }
        let active = total - self.pool.len();
        if self.by_coord.len() != active {
            return Err(format!(
                "{} indexed coordinates for {active} non-pooled slots",
                self.by_coord.len()
            ));
        }
        if self.loading.len() > self.cfg.max_parallel_loads {
            return Err(format!(
                "{} slots loading, limit {}",
                self.loading.len(),
                self.cfg.max_parallel_loads
            ));
        }
        Ok(())
    }

    /// True when nothing is queued or loading.
    pub fn is_idle(&self) -> bool {
        self.ready_to_load.is_empty() && self.loading.is_empty()
    }

    /// Ticks at the last observer position until idle. Returns false on
    /// timeout, or at once when the runtime is shut down with slots still
    /// loading.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.tick(self.last_observer);
            if self.is_idle() {
                return true;
            }
            if self.runtime.is_shut_down() {
                log::debug!(
                    target: "streamer",
                    "runtime is shut down with {} slots loading",
                    self.loading.len()
                );
                return false;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stops the build workers. Builds already queued may still be harvested
    /// by later ticks; nothing new is dispatched.
    pub fn shutdown(&mut self) {
        self.runtime.shutdown();
    }
}
