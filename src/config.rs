//! Run configuration and seeded initial-state generation.
//!
//! The engine itself only requires a valid input state; producing one is
//! this module's job. Placement uses rejection sampling inside the
//! container, all disks share one radius, and every velocity has the same
//! speed with a uniformly random direction.

use crate::core::{Container, Particle, Vector2};
use crate::error::{Error, Result};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Placement attempts per particle before giving up on a too-dense state.
const MAX_PLACEMENT_ATTEMPTS: usize = 1_000_000;

/// Top-level run configuration, loadable from JSON:
///
/// ```json
/// {
///   "steps": 20000,
///   "L": 0.05,
///   "particles": 200,
///   "radius": 0.0015,
///   "velocity": 0.01,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Number of collision events to process.
    pub steps: u64,
    /// Slit height of the two-chamber container.
    #[serde(rename = "L")]
    pub l: f64,
    /// Number of disks.
    pub particles: u32,
    /// Common disk radius.
    pub radius: f64,
    /// Common initial speed.
    pub velocity: f64,
    /// RNG seed; omit for a nondeterministic run.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let cfg: SimConfig = serde_json::from_reader(BufReader::new(file))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(Error::InvalidParam("steps must be > 0".into()));
        }
        if self.particles == 0 {
            return Err(Error::InvalidParam("particles must be > 0".into()));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !self.velocity.is_finite() || self.velocity <= 0.0 {
            return Err(Error::InvalidParam(
                "velocity must be finite and > 0".into(),
            ));
        }
        Ok(())
    }

    /// Generate the initial placement: non-overlapping disks fully inside
    /// the container, speeds of magnitude `velocity` in uniformly random
    /// directions. Runs with the same seed produce identical states.
    pub fn spawn(&self, container: &Container) -> Result<Vec<Particle>> {
        self.validate()?;
        let mut rng: StdRng = match self.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        let (min, max) = container.bounds();
        let mut particles: Vec<Particle> = Vec::with_capacity(self.particles as usize);

        for id in 0..self.particles {
            let mut attempts = 0usize;
            let position = loop {
                if attempts >= MAX_PLACEMENT_ATTEMPTS {
                    return Err(Error::InvalidParam(format!(
                        "failed to place particle {id} without overlap; \
                         try fewer particles or a smaller radius"
                    )));
                }
                attempts += 1;
                let candidate = Vector2::new(
                    rng.random_range(min.x..=max.x),
                    rng.random_range(min.y..=max.y),
                );
                if container.contains(candidate, self.radius)
                    && !overlaps_existing(&particles, candidate, self.radius)
                {
                    break candidate;
                }
            };

            let angle = rng.random_range(0.0..std::f64::consts::TAU);
            let velocity = Vector2::new(angle.cos(), angle.sin()) * self.velocity;
            particles.push(Particle::new(id, position, velocity, self.radius)?);
        }

        Ok(particles)
    }
}

fn overlaps_existing(existing: &[Particle], candidate: Vector2, radius: f64) -> bool {
    existing.iter().any(|p| {
        let min_dist = p.radius + radius;
        (p.position - candidate).norm_squared() < min_dist * min_dist
    })
}
