//! corridor — end-to-end demo for the rust_td demand scheduler.
//!
//! Loads an hour of turn counts for the four approaches of one junction,
//! drives the scheduler for the configured number of ticks, and writes
//! `spawns.csv`, `tick_summaries.csv`, and `lateness.csv`.
//!
//! ```text
//! RUST_LOG=info cargo run -p corridor -- demos/corridor/config.json
//! ```

mod network;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;

use td_core::{RunConfig, VehicleCatalog, VehicleClassId, VehicleSpec};
use td_demand::{LoadOptions, load_demand_csv};
use td_lanes::LaneNetwork;
use td_output::{CsvWriter, SpawnOutputObserver};
use td_sched::{LanePolicy, RunSummary, SchedulerBuilder, SpawnLoop, SpawnPoint, SpawnScheduler};

use network::build_junction;

// ── Constants ─────────────────────────────────────────────────────────────────

const DEFAULT_CONFIG: &str = "demos/corridor/config.json";

const CAR:   VehicleClassId = VehicleClassId(0);
const TRUCK: VehicleClassId = VehicleClassId(1);

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default, Clone, Copy, Debug)]
#[serde(rename_all = "snake_case")]
enum SchedulerKind {
    /// Head-of-queue dispatch on the curb lane of each approach.
    Plain,
    /// Lane-restricted claiming on every approach lane.
    #[default]
    Restricted,
}

/// Paths are relative to the config file.
#[derive(Deserialize)]
struct DemoConfig {
    demand_csv:  PathBuf,
    output_dir:  PathBuf,
    run:         RunConfig,
    #[serde(default)]
    load:        LoadOptions,
    #[serde(default)]
    scheduler:   SchedulerKind,
    #[serde(default)]
    lane_policy: LanePolicy,
}

fn load_config(path: &Path) -> Result<DemoConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let mut cfg: DemoConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    let base = path.parent().unwrap_or(Path::new("."));
    cfg.demand_csv = base.join(&cfg.demand_csv);
    cfg.output_dir = base.join(&cfg.output_dir);
    Ok(cfg)
}

fn catalog() -> Result<VehicleCatalog> {
    Ok(VehicleCatalog::new(vec![
        VehicleSpec { name: "car".into(),   class: CAR,   length_m: 4.5,  max_speed_mps: 13.9 },
        VehicleSpec { name: "truck".into(), class: TRUCK, length_m: 12.0, max_speed_mps: 11.1 },
    ])?)
}

// ── Driver ────────────────────────────────────────────────────────────────────

fn drive<S: SpawnScheduler>(
    cfg:    &DemoConfig,
    sched:  S,
    points: Vec<SpawnPoint>,
    lanes:  &LaneNetwork,
) -> Result<RunSummary> {
    std::fs::create_dir_all(&cfg.output_dir)?;
    let writer = CsvWriter::new(&cfg.output_dir)?;
    let mut obs = SpawnOutputObserver::new(writer);

    let mut driver = SpawnLoop::new(cfg.run.clone(), sched, points)?;
    let summary = driver.run(lanes, &mut obs)?;

    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }
    Ok(summary)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_owned());
    let cfg = load_config(Path::new(&config_path))?;

    println!("=== corridor — rust_td demand scheduler ===");

    // 1. Demand.
    let table = load_demand_csv(&cfg.demand_csv, &cfg.load)
        .with_context(|| format!("loading demand {}", cfg.demand_csv.display()))?;
    println!(
        "Demand: {} roads × {} buckets, {} vehicles, ends at {:.0}s",
        table.road_count(),
        table.bucket_count(),
        table.total(),
        table.end_secs().unwrap_or(0.0)
    );

    // 2. Junction.
    let junction = build_junction()?;
    println!(
        "Junction: {} roads, {} lanes",
        junction.lanes.road_count(),
        junction.lanes.lane_count()
    );

    // 3. Run.
    println!(
        "Run: {} ticks of {}s ({:?} ticks), {:?} scheduler",
        cfg.run.total_ticks, cfg.run.tick_secs, cfg.run.tick_mode, cfg.scheduler
    );
    let builder = SchedulerBuilder::new(&table, catalog()?, junction.turns).config(&cfg.run);
    let t0 = Instant::now();
    let summary = match cfg.scheduler {
        SchedulerKind::Plain => {
            let points = junction.entries.iter().map(|&[_, _, curb]| SpawnPoint::new(curb, CAR)).collect();
            drive(&cfg, builder.build()?, points, &junction.lanes)?
        }
        SchedulerKind::Restricted => {
            // Trucks enter on the through lane only.
            let points = junction
                .entries
                .iter()
                .flat_map(|&[pocket, through, curb]| {
                    [
                        SpawnPoint::new(pocket, CAR),
                        SpawnPoint::new(through, TRUCK),
                        SpawnPoint::new(curb, CAR),
                    ]
                })
                .collect();
            let sched = builder.lane_policy(cfg.lane_policy).build_restricted(&junction.lanes)?;
            drive(&cfg, sched, points, &junction.lanes)?
        }
    };
    let elapsed = t0.elapsed();

    // 4. Summary.
    println!("Run complete in {:.3} s", elapsed.as_secs_f64());
    println!("  requests   : {}", summary.requests);
    println!("  dispatched : {} of {} scheduled", summary.dispatched, summary.scheduled);
    println!("  pending    : {}", summary.pending);
    println!("  late       : {}", summary.late);
    println!("Output written to {}", cfg.output_dir.display());

    Ok(())
}
