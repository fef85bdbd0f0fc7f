use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use slitgas::config::SimConfig;
use slitgas::core::{Container, Simulation};
use slitgas::io::TextSink;

/// Event-driven hard-disk gas in a two-chamber slit container.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Number of collision events to simulate
    events: Option<u64>,
    /// Slit height L (0 < L <= 0.09)
    l: Option<f64>,
    /// Number of particles
    particles: Option<u32>,

    /// JSON configuration file; overrides the positional arguments
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disk radius
    #[arg(long, default_value_t = 0.0015)]
    radius: f64,

    /// Initial speed of every disk
    #[arg(long, default_value_t = 0.01)]
    velocity: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    if let Some(path) = &args.config {
        return Ok(SimConfig::from_file(path)?);
    }
    let (Some(events), Some(l), Some(particles)) = (args.events, args.l, args.particles) else {
        bail!("expected <events> <L> <particles> positional arguments or --config <file>");
    };
    let cfg = SimConfig {
        steps: events,
        l,
        particles,
        radius: args.radius,
        velocity: args.velocity,
        seed: args.seed,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = load_config(&args)?;

    let container = Container::slit_chamber(cfg.l)?;
    let particles = cfg.spawn(&container)?;
    let mut sim = Simulation::new(cfg.steps, particles, container)?;
    let mut sink = TextSink::create(&args.out)?;

    println!(
        "Simulating {} events for {} particles (L = {}) ...",
        cfg.steps, cfg.particles, cfg.l
    );
    if let Err(e) = sim.run(&mut sink) {
        if let Some(step) = sim.last_step() {
            eprintln!(
                "aborted after step {} at t = {:.14}; last snapshot written",
                step.index, step.time
            );
        }
        return Err(e.into());
    }
    println!(
        "Done: {} events, final t = {:.14}, E = {:.14e}",
        sim.step_index(),
        sim.time(),
        sim.kinetic_energy()
    );
    Ok(())
}
