use crate::core::obstacle::{Container, Obstacle};
use crate::core::{collide, predict, Event, EventKind, Particle, Vector2};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Small numeric tolerance for time comparisons.
const EPS_TIME: f64 = 1e-12;

/// Consecutive zero-advance events tolerated before declaring a stall.
const STALL_LIMIT: u32 = 16;

/// The externally observable state after one processed event: the step
/// counter, the absolute time, the event that fired, and a deep copy of
/// every particle. The copy is immutable and safe to retain.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub index: u64,
    pub time: f64,
    pub event: EventKind,
    pub particles: Vec<Particle>,
}

/// Event-driven simulation of hard disks in a fixed container.
///
/// The scheduler owns the particle vector and a min-heap of predicted
/// events. Stale events (whose collision-count tokens no longer match)
/// are left in the heap and rejected lazily when they surface; tokens
/// strictly increase per participant, so a stale event can never fire.
#[derive(Debug)]
pub struct Simulation {
    steps: u64,
    time: f64,
    step_index: u64,
    particles: Vec<Particle>,
    container: Container,
    pq: BinaryHeap<Reverse<Event>>,
    stall_run: u32,
    last_step: Option<Step>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Simulation {
    /// Create a simulation that will process `steps` events.
    ///
    /// The initial state is validated up front: particle ids must equal
    /// their indices, every disk must lie fully inside the container, and
    /// no two disks may overlap. Violations are fatal before the first
    /// event.
    pub fn new(steps: u64, particles: Vec<Particle>, container: Container) -> Result<Self> {
        if particles.is_empty() {
            return Err(Error::InvalidState("no particles".into()));
        }
        for (i, p) in particles.iter().enumerate() {
            if p.id as usize != i {
                return Err(Error::InvalidState(format!(
                    "particle ids must be contiguous from 0; found id {} at index {}",
                    p.id, i
                )));
            }
            if !container.contains(p.position, p.radius) {
                return Err(Error::InvalidState(format!(
                    "particle {} is not fully inside the container",
                    p.id
                )));
            }
        }
        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                let gap = (particles[j].position - particles[i].position).norm()
                    - (particles[i].radius + particles[j].radius);
                if gap < -EPS_TIME {
                    return Err(Error::InvalidState(format!(
                        "particles {} and {} overlap",
                        particles[i].id, particles[j].id
                    )));
                }
            }
        }

        let mut sim = Self {
            steps,
            time: 0.0,
            step_index: 0,
            particles,
            container,
            pq: BinaryHeap::new(),
            stall_run: 0,
            last_step: None,
            cancel: None,
        };
        sim.schedule_initial_events()?;
        Ok(sim)
    }

    /// Current absolute simulated time.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of events processed so far.
    #[inline]
    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The most recent emitted snapshot, kept for forensic dumps when the
    /// run aborts.
    #[inline]
    pub fn last_step(&self) -> Option<&Step> {
        self.last_step.as_ref()
    }

    /// Total kinetic energy (diagnostic; conserved by elastic collisions).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Total momentum (diagnostic; walls absorb momentum, disk collisions
    /// do not).
    pub fn momentum(&self) -> Vector2 {
        self.particles
            .iter()
            .fold(Vector2::ZERO, |acc, p| acc + p.velocity)
    }

    /// Install a cancellation flag, checked at the top of every
    /// [`advance`](Self::advance) call.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    /// Process exactly one event and return its snapshot.
    ///
    /// Returns `Ok(None)` once the configured number of events has been
    /// processed, or when cancellation was requested (no partial snapshot
    /// is emitted in that case). Errors are fatal: an empty heap means a
    /// particle escaped, and a long run of zero-advance events means the
    /// trajectory has numerically wedged.
    pub fn advance(&mut self) -> Result<Option<Step>> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Ok(None);
            }
        }
        if self.step_index >= self.steps {
            return Ok(None);
        }

        loop {
            let Some(Reverse(ev)) = self.pq.pop() else {
                return Err(Error::HeapExhausted {
                    step: self.step_index,
                });
            };

            let t_ev = ev.time_f64();
            if t_ev < self.time - EPS_TIME {
                // Defensive: events are never scheduled in the past
                continue;
            }
            if !self.event_is_current(&ev) {
                continue;
            }

            // Clamp sub-roundoff regressions so simulated time stays monotone
            let dt = (t_ev - self.time).max(0.0);
            if dt <= f64::EPSILON * self.time.max(1.0) {
                self.stall_run += 1;
                if self.stall_run > STALL_LIMIT {
                    return Err(Error::NumericalStall {
                        step: self.step_index,
                        time: self.time,
                        run: self.stall_run,
                    });
                }
            } else {
                self.stall_run = 0;
            }

            for p in &mut self.particles {
                p.advance(dt);
            }
            self.time += dt;

            match ev.kind {
                EventKind::P2P { i, j } => {
                    let (lo, hi) = (i as usize, j as usize);
                    let (left, right) = self.particles.split_at_mut(hi);
                    collide::disks(&mut left[lo], &mut right[0])?;
                    self.recompute_events_for(lo)?;
                    self.recompute_events_for(hi)?;
                }
                EventKind::P2W { i, wall } => {
                    let Obstacle::Segment(s) = self.container.obstacles()[wall as usize] else {
                        return Err(Error::MathError(format!(
                            "wall event targets non-segment obstacle {wall}"
                        )));
                    };
                    collide::segment(&mut self.particles[i as usize], &s);
                    self.recompute_events_for(i as usize)?;
                }
                EventKind::P2V { i, vertex } => {
                    let Obstacle::Vertex(v) = self.container.obstacles()[vertex as usize] else {
                        return Err(Error::MathError(format!(
                            "corner event targets non-vertex obstacle {vertex}"
                        )));
                    };
                    collide::vertex(&mut self.particles[i as usize], &v)?;
                    self.recompute_events_for(i as usize)?;
                }
            }

            let step = Step {
                index: self.step_index,
                time: self.time,
                event: ev.kind,
                particles: self.particles.clone(),
            };
            self.step_index += 1;
            self.last_step = Some(step.clone());
            return Ok(Some(step));
        }
    }

    /// Drive the whole trajectory into a sink: setup first, then one step
    /// per processed event, in strict step order.
    pub fn run(&mut self, sink: &mut dyn crate::io::StepSink) -> Result<()> {
        sink.write_setup(
            self.particles.len(),
            self.container.l(),
            self.container.obstacles(),
        )?;
        while let Some(step) = self.advance()? {
            sink.write_step(&step)?;
        }
        Ok(())
    }

    /// Iterator adapter over [`advance`](Self::advance).
    pub fn trajectory(&mut self) -> Trajectory<'_> {
        Trajectory { sim: self }
    }

    // ============ Internal helpers ============

    fn event_is_current(&self, ev: &Event) -> bool {
        match ev.kind {
            EventKind::P2P { i, j } => ev.is_valid(
                self.particles[i as usize].collision_count,
                Some(self.particles[j as usize].collision_count),
            ),
            EventKind::P2W { i, .. } | EventKind::P2V { i, .. } => {
                ev.is_valid(self.particles[i as usize].collision_count, None)
            }
        }
    }

    /// Seed the heap: every unordered particle pair once, plus every
    /// (particle, obstacle) pair.
    fn schedule_initial_events(&mut self) -> Result<()> {
        let now = self.time;
        let particles = &self.particles;
        let obstacles = self.container.obstacles();

        let batches: Vec<Vec<Event>> = particles
            .par_iter()
            .enumerate()
            .map(|(i, a)| -> Result<Vec<Event>> {
                let mut local = Vec::new();
                for b in &particles[i + 1..] {
                    if let Some(t) = predict::disk_disk(a, b) {
                        local.push(Event::new(
                            now + t,
                            EventKind::P2P { i: a.id, j: b.id },
                            a.collision_count,
                            Some(b.collision_count),
                        )?);
                    }
                }
                local.extend(candidate_obstacle_events(a, obstacles, now)?);
                Ok(local)
            })
            .collect::<Result<_>>()?;

        for ev in batches.into_iter().flatten() {
            self.pq.push(Reverse(ev));
        }
        Ok(())
    }

    /// Recompute the future of a just-collided particle against every
    /// other object. The per-pair predictions are pure and fan out across
    /// the thread pool; the heap merge stays on this thread.
    fn recompute_events_for(&mut self, i: usize) -> Result<()> {
        let now = self.time;
        let subject = &self.particles[i];
        let obstacles = self.container.obstacles();

        let disk_events: Vec<Event> = self
            .particles
            .par_iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .filter_map(|(j, other)| {
                let (a, b) = if i < j { (subject, other) } else { (other, subject) };
                predict::disk_disk(a, b).map(|t| {
                    Event::new(
                        now + t,
                        EventKind::P2P { i: a.id, j: b.id },
                        a.collision_count,
                        Some(b.collision_count),
                    )
                })
            })
            .collect::<Result<_>>()?;

        let obstacle_events = candidate_obstacle_events(subject, obstacles, now)?;

        for ev in disk_events.into_iter().chain(obstacle_events) {
            self.pq.push(Reverse(ev));
        }
        Ok(())
    }
}

/// Predicted events for one particle against every obstacle.
fn candidate_obstacle_events(
    p: &Particle,
    obstacles: &[Obstacle],
    now: f64,
) -> Result<Vec<Event>> {
    obstacles
        .par_iter()
        .enumerate()
        .filter_map(|(k, obstacle)| {
            let hit = match obstacle {
                Obstacle::Segment(s) => predict::disk_segment(p, s).map(|t| {
                    (
                        t,
                        EventKind::P2W {
                            i: p.id,
                            wall: k as u32,
                        },
                    )
                }),
                Obstacle::Vertex(v) => predict::disk_vertex(p, v).map(|t| {
                    (
                        t,
                        EventKind::P2V {
                            i: p.id,
                            vertex: k as u32,
                        },
                    )
                }),
            };
            hit.map(|(t, kind)| Event::new(now + t, kind, p.collision_count, None))
        })
        .collect()
}

/// Iterator over processed events; yields one `Step` per event until the
/// configured horizon, cancellation, or a fatal error.
pub struct Trajectory<'a> {
    sim: &'a mut Simulation,
}

impl Iterator for Trajectory<'_> {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        self.sim.advance().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(id: u32, x: f64, y: f64, vx: f64, vy: f64, r: f64) -> Particle {
        Particle::new(id, Vector2::new(x, y), Vector2::new(vx, vy), r)
            .expect("valid test particle")
    }

    #[test]
    fn rejects_overlapping_initial_state() -> Result<()> {
        let container = Container::rectangle(10.0, 10.0)?;
        let particles = vec![
            disk(0, 5.0, 5.0, 0.0, 0.0, 0.5),
            disk(1, 5.4, 5.0, 0.0, 0.0, 0.5),
        ];
        let err = Simulation::new(10, particles, container).unwrap_err();
        assert!(err.to_string().contains("overlap"));
        Ok(())
    }

    #[test]
    fn rejects_escaped_initial_state() -> Result<()> {
        let container = Container::rectangle(1.0, 1.0)?;
        let particles = vec![disk(0, 0.05, 0.5, 0.0, 0.0, 0.1)];
        let err = Simulation::new(10, particles, container).unwrap_err();
        assert!(err.to_string().contains("inside"));
        Ok(())
    }

    #[test]
    fn rejects_non_contiguous_ids() -> Result<()> {
        let container = Container::rectangle(1.0, 1.0)?;
        let particles = vec![disk(3, 0.5, 0.5, 0.0, 0.0, 0.1)];
        let err = Simulation::new(10, particles, container).unwrap_err();
        assert!(err.to_string().contains("contiguous"));
        Ok(())
    }

    #[test]
    fn wall_bounce_sequence() -> Result<()> {
        // Disk of radius 0.1 launched rightward from x = 0.15 in a unit
        // box: right wall at t = 0.75, back across to the left wall at
        // t = 1.55.
        let container = Container::rectangle(1.0, 1.0)?;
        let particles = vec![disk(0, 0.15, 0.5, 1.0, 0.0, 0.1)];
        let mut sim = Simulation::new(2, particles, container)?;

        let step = sim.advance()?.expect("first event");
        assert!(matches!(step.event, EventKind::P2W { i: 0, .. }));
        assert!((step.time - 0.75).abs() < 1e-12);
        assert!((step.particles[0].position.x - 0.9).abs() < 1e-12);
        assert_eq!(step.particles[0].velocity, Vector2::new(-1.0, 0.0));
        assert_eq!(step.particles[0].collision_count, 1);

        let step = sim.advance()?.expect("second event");
        assert!((step.time - 1.55).abs() < 1e-12);
        assert!((step.particles[0].position.x - 0.1).abs() < 1e-12);
        assert_eq!(step.particles[0].velocity, Vector2::new(1.0, 0.0));

        assert_eq!(sim.advance()?, None);
        Ok(())
    }

    #[test]
    fn heap_exhaustion_is_fatal() -> Result<()> {
        // A motionless disk generates no events at all
        let container = Container::rectangle(1.0, 1.0)?;
        let particles = vec![disk(0, 0.5, 0.5, 0.0, 0.0, 0.1)];
        let mut sim = Simulation::new(10, particles, container)?;
        assert!(matches!(
            sim.advance(),
            Err(Error::HeapExhausted { step: 0 })
        ));
        Ok(())
    }

    #[test]
    fn cancellation_returns_cleanly() -> Result<()> {
        let container = Container::rectangle(1.0, 1.0)?;
        let particles = vec![disk(0, 0.5, 0.5, 1.0, 0.0, 0.1)];
        let mut sim = Simulation::new(100, particles, container)?;
        let flag = Arc::new(AtomicBool::new(false));
        sim.set_cancel_flag(Arc::clone(&flag));

        assert!(sim.advance()?.is_some());
        flag.store(true, Ordering::Relaxed);
        assert_eq!(sim.advance()?, None);
        assert_eq!(sim.step_index(), 1);
        Ok(())
    }

    #[test]
    fn trajectory_iterator_yields_all_steps() -> Result<()> {
        let container = Container::rectangle(1.0, 1.0)?;
        let particles = vec![disk(0, 0.5, 0.5, 1.0, 0.7, 0.1)];
        let mut sim = Simulation::new(5, particles, container)?;
        let steps: Result<Vec<Step>> = sim.trajectory().collect();
        let steps = steps?;
        assert_eq!(steps.len(), 5);
        for (n, step) in steps.iter().enumerate() {
            assert_eq!(step.index, n as u64);
        }
        Ok(())
    }
}
