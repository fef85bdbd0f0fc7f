//! Snapshot sinks.
//!
//! The scheduler pushes observations through the [`StepSink`] capability;
//! it neither knows nor cares whether they land on disk or in memory.
//! Snapshots arrive in strict step order and the particle lists handed
//! over are deep copies, safe to retain.

use crate::core::{Obstacle, Step};
use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Receiver for the setup record and the per-event snapshots.
pub trait StepSink {
    /// Called once, before the first event.
    fn write_setup(&mut self, particle_count: usize, l: f64, obstacles: &[Obstacle])
        -> Result<()>;

    /// Called once per processed event, in step order.
    fn write_step(&mut self, step: &Step) -> Result<()>;
}

/// Plain-text sink matching the layout consumed by the analysis tooling:
///
/// - `setup.txt`: `"<N> <L>"`, then one `"ax ay bx by"` line per wall
/// - `steps/<i>.txt`: one `"x y vx vy r"` line per particle
/// - `events.txt`: one `"<time> <KIND> <subject> <target>"` line per event
///
/// All reals are written with 14 decimal digits and a `.` separator.
pub struct TextSink {
    root: PathBuf,
    events: Option<BufWriter<File>>,
}

impl TextSink {
    /// Prepare an output directory, clearing any step files left over
    /// from a previous run.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let steps_dir = root.join("steps");
        fs::create_dir_all(&steps_dir)?;
        for entry in fs::read_dir(&steps_dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(path)?;
            }
        }
        Ok(Self { root, events: None })
    }
}

impl StepSink for TextSink {
    fn write_setup(
        &mut self,
        particle_count: usize,
        l: f64,
        obstacles: &[Obstacle],
    ) -> Result<()> {
        let mut setup = BufWriter::new(File::create(self.root.join("setup.txt"))?);
        writeln!(setup, "{} {:.14}", particle_count, l)?;
        for obstacle in obstacles {
            if let Obstacle::Segment(s) = obstacle {
                writeln!(
                    setup,
                    "{:.14} {:.14} {:.14} {:.14}",
                    s.a.x, s.a.y, s.b.x, s.b.y
                )?;
            }
        }
        setup.flush()?;

        self.events = Some(BufWriter::new(File::create(self.root.join("events.txt"))?));
        Ok(())
    }

    fn write_step(&mut self, step: &Step) -> Result<()> {
        let path = self.root.join("steps").join(format!("{}.txt", step.index));
        let mut out = BufWriter::new(File::create(path)?);
        for p in &step.particles {
            writeln!(
                out,
                "{:.14} {:.14} {:.14} {:.14} {:.14}",
                p.position.x, p.position.y, p.velocity.x, p.velocity.y, p.radius
            )?;
        }
        out.flush()?;

        if let Some(events) = &mut self.events {
            writeln!(
                events,
                "{:.14} {} {} {}",
                step.time,
                step.event.label(),
                step.event.subject(),
                step.event.target()
            )?;
            events.flush()?;
        }
        Ok(())
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub particle_count: usize,
    pub l: f64,
    pub steps: Vec<Step>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepSink for MemorySink {
    fn write_setup(
        &mut self,
        particle_count: usize,
        l: f64,
        _obstacles: &[Obstacle],
    ) -> Result<()> {
        self.particle_count = particle_count;
        self.l = l;
        Ok(())
    }

    fn write_step(&mut self, step: &Step) -> Result<()> {
        self.steps.push(step.clone());
        Ok(())
    }
}
