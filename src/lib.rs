//! Event-driven molecular dynamics of a 2D hard-disk gas.
//!
//! The gas lives in a fixed, piece-wise axis-aligned container: two square
//! chambers joined by a rectangular slit, with concave corners rounded by
//! point obstacles. The engine predicts pairwise collision times in closed
//! form, keeps them in a min-heap with lazy collision-count invalidation,
//! and advances simulated time one event at a time, emitting a deep-copied
//! snapshot after each processed event.
//!
//! ```no_run
//! use slitgas::config::SimConfig;
//! use slitgas::core::{Container, Simulation};
//! use slitgas::io::MemorySink;
//!
//! # fn main() -> slitgas::error::Result<()> {
//! let cfg = SimConfig {
//!     steps: 1000,
//!     l: 0.05,
//!     particles: 100,
//!     radius: 0.0015,
//!     velocity: 0.01,
//!     seed: Some(42),
//! };
//! let container = Container::slit_chamber(cfg.l)?;
//! let particles = cfg.spawn(&container)?;
//! let mut sim = Simulation::new(cfg.steps, particles, container)?;
//! let mut sink = MemorySink::new();
//! sim.run(&mut sink)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod io;

pub use crate::core::{Container, Particle, Simulation, Step, Vector2};
pub use crate::error::{Error, Result};
