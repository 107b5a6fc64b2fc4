use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use strata_geom::Vec3;
use strata_runtime::TerrainStreamer;
use strata_world::{ConfigError, MesherKind, SeamPolicy, TerrainConfig, load_config_from_path};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MesherArg {
    FaceCull,
    MarchingCubes,
}

impl From<MesherArg> for MesherKind {
    fn from(m: MesherArg) -> Self {
        match m {
            MesherArg::FaceCull => MesherKind::FaceCull,
            MesherArg::MarchingCubes => MesherKind::MarchingCubes,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SeamsArg {
    Isolated,
    Sampled,
}

impl From<SeamsArg> for SeamPolicy {
    fn from(s: SeamsArg) -> Self {
        match s {
            SeamsArg::Isolated => SeamPolicy::Isolated,
            SeamsArg::Sampled => SeamPolicy::Sampled,
        }
    }
}

/// Streams terrain around an observer walking along +X and logs the scheduler
/// state every tick.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about)]
struct Args {
    /// TOML terrain config; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of scheduling ticks to run
    #[arg(long, default_value_t = 240)]
    ticks: u64,
    /// World units the observer moves per tick
    #[arg(long, default_value_t = 0.5)]
    step: f32,
    #[arg(long, value_enum)]
    mesher: Option<MesherArg>,
    #[arg(long, value_enum)]
    seams: Option<SeamsArg>,
    /// Sleep between ticks, in milliseconds
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// After the walk, keep ticking in place until every admitted chunk loads
    #[arg(long)]
    settle: bool,
}

fn load_config(args: &Args) -> Result<TerrainConfig, ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => TerrainConfig::default(),
    };
    if let Some(m) = args.mesher {
        cfg.mesher = m.into();
    }
    if let Some(s) = args.seams {
        cfg.seams = s.into();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let args = Args::parse();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("configuration rejected: {e}");
            return ExitCode::from(2);
        }
    };
    let mut streamer = match TerrainStreamer::new(cfg) {
        Ok(s) => s,
        Err(e) => {
            log::error!("configuration rejected: {e}");
            return ExitCode::from(2);
        }
    };

    let started = Instant::now();
    let mut observer = Vec3::new(0.5, 0.0, 0.5);
    for _ in 0..args.ticks {
        let report = streamer.tick(observer);
        let st = streamer.stats();
        log::info!(
            target: "events",
            "[tick {}] chunk=({}, {}) pool={} ready={} loading={} loaded={} queued={} inflight={} +{} -{} failed={}",
            report.tick,
            report.center.cx,
            report.center.cz,
            st.pooled,
            st.ready_to_load,
            st.loading,
            st.loaded,
            st.queued_jobs,
            st.inflight_jobs,
            report.harvested,
            report.evicted,
            st.failures
        );
        observer += Vec3::new(args.step, 0.0, 0.0);
        if args.tick_ms > 0 {
            std::thread::sleep(Duration::from_millis(args.tick_ms));
        }
    }
    if args.settle && !streamer.wait_idle(Duration::from_secs(30)) {
        log::warn!("streamer did not settle within 30s");
    }

    let st = streamer.stats();
    let triangles: usize = streamer.renderables().map(|r| r.indices.len() / 3).sum();
    let vertices: usize = streamer.renderables().map(|r| r.vertices.len()).sum();
    println!(
        "{} ticks in {:.2?}: {} chunks loaded of {} slots, {} triangles, {} vertices, {} failures",
        args.ticks,
        started.elapsed(),
        st.loaded,
        st.total,
        triangles,
        vertices,
        st.failures
    );
    streamer.shutdown();
    ExitCode::SUCCESS
}
