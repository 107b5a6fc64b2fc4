use strata_chunk::VoxelGrid;
use strata_mesh_cpu::ChunkMesh;
use strata_world::{ChunkCoord, Voxel};

use crate::{BuildJob, BuiltChunk};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotState {
    Pooled,
    ReadyToLoad,
    Loading,
    Loaded,
}

/// Recyclable chunk storage. Created once at startup and moved between the
/// streamer's collections; never freed while the streamer lives.
#[derive(Debug)]
pub struct ChunkSlot {
    id: usize,
    state: SlotState,
    coord: Option<ChunkCoord>,
    grid: Option<VoxelGrid>,
    /// Voxel storage kept for the next load while no grid is held.
    spare_cells: Vec<Voxel>,
    mesh: ChunkMesh,
    ticket: u64,
    ready_generation: u64,
    ready: bool,
    visible: bool,
}

impl ChunkSlot {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: SlotState::Pooled,
            coord: None,
            grid: None,
            spare_cells: Vec::new(),
            mesh: ChunkMesh::default(),
            ticket: 0,
            ready_generation: 0,
            ready: false,
            visible: false,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Grid position; `None` while pooled.
    #[inline]
    pub fn coord(&self) -> Option<ChunkCoord> {
        self.coord
    }

    #[inline]
    pub fn grid(&self) -> Option<&VoxelGrid> {
        self.grid.as_ref()
    }

    #[inline]
    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Number of successful loads this slot has completed.
    #[inline]
    pub fn ready_generation(&self) -> u64 {
        self.ready_generation
    }

    /// Ticket of the most recent dispatch.
    #[inline]
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// True once the current dispatch has committed its voxels and mesh.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == SlotState::Loading && self.ready
    }

    /// Pooled -> ReadyToLoad.
    pub fn assign(&mut self, coord: ChunkCoord) {
        debug_assert_eq!(self.state, SlotState::Pooled, "assign on slot {}", self.id);
        self.coord = Some(coord);
        self.state = SlotState::ReadyToLoad;
    }

    /// ReadyToLoad -> Loading. Moves the recycled buffers into a job under a
    /// fresh ticket; the previous mesh is gone from this point on.
    pub fn begin_load(&mut self) -> BuildJob {
        debug_assert_eq!(self.state, SlotState::ReadyToLoad, "begin_load on slot {}", self.id);
        let coord = self.coord.unwrap_or_default();
        self.ticket += 1;
        self.ready = false;
        self.state = SlotState::Loading;
        let mut mesh = std::mem::take(&mut self.mesh);
        mesh.clear_keep_capacity();
        let cells = match self.grid.take() {
            Some(g) => g.into_cells(),
            None => std::mem::take(&mut self.spare_cells),
        };
        BuildJob {
            slot: self.id,
            ticket: self.ticket,
            coord,
            cells,
            mesh,
        }
    }

    /// Commits a finished build if it belongs to the current dispatch.
    /// Returns false, leaving the slot untouched, for stale results.
    pub fn complete(&mut self, ticket: u64, built: BuiltChunk) -> bool {
        if self.state != SlotState::Loading || ticket != self.ticket || self.ready {
            return false;
        }
        if Some(built.grid.coord) != self.coord {
            return false;
        }
        self.grid = Some(built.grid);
        self.mesh = built.mesh;
        self.ready_generation += 1;
        self.ready = true;
        true
    }

    /// Loading -> Loaded once ready; makes the chunk visible.
    pub fn mark_loaded(&mut self) {
        debug_assert!(self.is_ready(), "mark_loaded on slot {} before ready", self.id);
        self.state = SlotState::Loaded;
        self.visible = true;
    }

    /// Any state -> Pooled. Strips identity and content and hides the chunk;
    /// storage capacity is kept for reuse.
    pub fn release(&mut self) {
        self.coord = None;
        if let Some(g) = self.grid.take() {
            self.spare_cells = g.into_cells();
        }
        self.mesh.clear_keep_capacity();
        self.ready = false;
        self.visible = false;
        self.state = SlotState::Pooled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::ChunkOccupancy;

    fn built(coord: ChunkCoord) -> BuiltChunk {
        let mut grid = VoxelGrid::new(coord, 2, 2, 2);
        grid.cells[0] = Voxel::STONE;
        let mut mesh = ChunkMesh::default();
        mesh.add_quad(
            strata_geom::Vec3::ZERO,
            strata_geom::Vec3::ZERO,
            strata_geom::Vec3::ZERO,
            strata_geom::Vec3::ZERO,
        );
        BuiltChunk {
            grid,
            mesh,
            occupancy: ChunkOccupancy::Populated,
        }
    }

    #[test]
    fn full_lifecycle() {
        let c = ChunkCoord::new(1, 2);
        let mut s = ChunkSlot::new(0);
        assert_eq!(s.state(), SlotState::Pooled);
        assert!(!s.visible());

        s.assign(c);
        assert_eq!(s.state(), SlotState::ReadyToLoad);
        assert_eq!(s.coord(), Some(c));

        let job = s.begin_load();
        assert_eq!(s.state(), SlotState::Loading);
        assert_eq!((job.slot, job.ticket, job.coord), (0, 1, c));
        assert!(!s.is_ready());

        assert!(s.complete(job.ticket, built(c)));
        assert!(s.is_ready());
        assert_eq!(s.ready_generation(), 1);
        s.mark_loaded();
        assert_eq!(s.state(), SlotState::Loaded);
        assert!(s.visible());
        assert_eq!(s.mesh().vertices.len(), 4);

        s.release();
        assert_eq!(s.state(), SlotState::Pooled);
        assert_eq!(s.coord(), None);
        assert!(s.grid().is_none());
        assert!(s.mesh().is_empty());
        assert!(!s.visible());
    }

    #[test]
    fn stale_tickets_are_discarded() {
        let c = ChunkCoord::new(0, 0);
        let mut s = ChunkSlot::new(5);
        s.assign(c);
        let first = s.begin_load();
        s.release();
        s.assign(c);
        let second = s.begin_load();
        assert_eq!(second.ticket, first.ticket + 1);

        assert!(!s.complete(first.ticket, built(c)));
        assert!(!s.is_ready());
        assert_eq!(s.ready_generation(), 0);
        assert!(s.complete(second.ticket, built(c)));
        // A duplicate commit for the same dispatch is ignored too.
        assert!(!s.complete(second.ticket, built(c)));
        assert_eq!(s.ready_generation(), 1);
    }

    #[test]
    fn results_for_another_coordinate_are_discarded() {
        let mut s = ChunkSlot::new(1);
        s.assign(ChunkCoord::new(3, 3));
        let job = s.begin_load();
        assert!(!s.complete(job.ticket, built(ChunkCoord::new(4, 3))));
    }

    #[test]
    fn storage_is_recycled_across_loads() {
        let c = ChunkCoord::new(0, 0);
        let mut s = ChunkSlot::new(0);
        s.assign(c);
        let job = s.begin_load();
        assert!(job.cells.is_empty());
        assert!(s.complete(job.ticket, built(c)));
        s.mark_loaded();
        s.release();

        s.assign(ChunkCoord::new(9, 9));
        let job = s.begin_load();
        assert_eq!(job.cells.len(), 8);
        assert!(job.mesh.is_empty());
    }

    #[test]
    fn release_from_loading_returns_to_pool() {
        let mut s = ChunkSlot::new(2);
        s.assign(ChunkCoord::new(-1, 0));
        let _job = s.begin_load();
        s.release();
        assert_eq!(s.state(), SlotState::Pooled);
        assert!(!s.is_ready());
    }
}
