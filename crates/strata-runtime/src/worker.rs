use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_chunk::{
    BoundedNeighbors, ChunkOccupancy, NeighborIndex, SampledNeighbors, VoxelGrid, generate_chunk,
};
use strata_mesh_cpu::{ChunkMesh, MeshExtractor};
use strata_world::{ChunkCoord, SeamPolicy, TerrainConfig, Voxel, VoxelSampler};

use crate::BuildError;

/// One generate-then-extract request. The buffers are recycled storage taken
/// from the slot; the worker overwrites them and sends them back.
#[derive(Debug)]
pub struct BuildJob {
    pub slot: usize,
    pub ticket: u64,
    pub coord: ChunkCoord,
    pub cells: Vec<Voxel>,
    pub mesh: ChunkMesh,
}

#[derive(Debug)]
pub struct BuiltChunk {
    pub grid: VoxelGrid,
    pub mesh: ChunkMesh,
    pub occupancy: ChunkOccupancy,
}

#[derive(Debug)]
pub struct JobOut {
    pub slot: usize,
    pub ticket: u64,
    pub coord: ChunkCoord,
    pub result: Result<BuiltChunk, BuildError>,
    pub t_gen_ms: u32,
    pub t_mesh_ms: u32,
}

#[inline]
fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

struct WorkerCtx {
    cfg: Arc<TerrainConfig>,
    sampler: Arc<VoxelSampler>,
    extractor: Arc<dyn MeshExtractor>,
}

fn process_build_job(job: BuildJob, ctx: &WorkerCtx, tx: &Sender<JobOut>) {
    let BuildJob {
        slot,
        ticket,
        coord,
        cells,
        mesh,
    } = job;
    let mut t_gen_ms = 0;
    let mut t_mesh_ms = 0;
    let built = panic::catch_unwind(AssertUnwindSafe(|| {
        let t0 = Instant::now();
        let generated = generate_chunk(
            &ctx.sampler,
            coord,
            ctx.cfg.chunk_size,
            ctx.cfg.chunk_height,
            cells,
        );
        t_gen_ms = elapsed_ms(t0);

        let mut mesh = mesh;
        if generated.occupancy.has_blocks() {
            let t0 = Instant::now();
            let sampled;
            let neighbors: &dyn NeighborIndex = match ctx.cfg.seams {
                SeamPolicy::Isolated => &BoundedNeighbors,
                SeamPolicy::Sampled => {
                    sampled = SampledNeighbors::new(&ctx.sampler);
                    &sampled
                }
            };
            ctx.extractor
                .extract_into(&generated.grid, neighbors, &mut mesh);
            t_mesh_ms = elapsed_ms(t0);
        } else {
            mesh.clear_keep_capacity();
        }
        BuiltChunk {
            grid: generated.grid,
            mesh,
            occupancy: generated.occupancy,
        }
    }));
    let result = built.map_err(|payload| BuildError::Panicked {
        coord,
        message: panic_message(payload.as_ref()),
    });
    let _ = tx.send(JobOut {
        slot,
        ticket,
        coord,
        result,
        t_gen_ms,
        t_mesh_ms,
    });
}

/// Background build workers. Jobs go out on one channel and results come back
/// on another; the scheduler drains results without blocking.
pub struct Runtime {
    job_tx: Option<Sender<BuildJob>>,
    res_rx: Receiver<JobOut>,
    _pool: Arc<ThreadPool>,
    q_jobs: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl Runtime {
    pub fn new(
        cfg: Arc<TerrainConfig>,
        sampler: Arc<VoxelSampler>,
        extractor: Arc<dyn MeshExtractor>,
    ) -> Self {
        let (job_tx, job_rx) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let workers = cfg.worker_count();
        let q_jobs = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("strata-build-{i}"))
                .build()
                .expect("build pool"),
        );
        let ctx = Arc::new(WorkerCtx {
            cfg,
            sampler,
            extractor,
        });
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let ctx = Arc::clone(&ctx);
            let q_jobs = Arc::clone(&q_jobs);
            let inflight = Arc::clone(&inflight);
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q_jobs.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_build_job(job, &ctx, &tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
                log::trace!(target: "runtime", "build worker exiting");
            });
        }
        log::debug!(target: "runtime", "started {workers} build workers");

        Self {
            job_tx: Some(job_tx),
            res_rx,
            _pool: pool,
            q_jobs,
            inflight,
            workers,
        }
    }

    /// Queues a job. Returns it back if the runtime has shut down.
    pub fn submit(&self, job: BuildJob) -> Result<(), BuildJob> {
        let Some(tx) = self.job_tx.as_ref() else {
            return Err(job);
        };
        self.q_jobs.fetch_add(1, Ordering::Relaxed);
        tx.send(job).map_err(|e| {
            self.q_jobs.fetch_sub(1, Ordering::Relaxed);
            e.into_inner()
        })
    }

    pub fn drain_worker_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// `(queued, in flight)`; observational only.
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.q_jobs.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }

    pub fn is_shut_down(&self) -> bool {
        self.job_tx.is_none()
    }

    /// Closes the job channel. Workers finish their current job and exit;
    /// queued jobs are still drained by them first.
    pub fn shutdown(&mut self) {
        if self.job_tx.take().is_some() {
            log::debug!(target: "runtime", "job channel closed");
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
