use crate::core::Vector2;
use crate::error::{Error, Result};

/// A hard disk with mutable state.
///
/// Fields:
/// - `id`: stable identifier, equal to the particle's index in the simulation
/// - `position`, `velocity`: current kinematic state
/// - `radius`: disk radius (> 0)
/// - `collision_count`: incremented each time the particle participates in a
///   realized collision; queued events snapshot it for invalidation
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: u32,
    pub position: Vector2,
    pub velocity: Vector2,
    pub radius: f64,
    pub collision_count: u64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors with `Error::InvalidParam` if `radius` is non-positive or any
    /// component is NaN/inf.
    pub fn new(id: u32, position: Vector2, velocity: Vector2, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !position.is_finite() {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !velocity.is_finite() {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            id,
            position,
            velocity,
            radius,
            collision_count: 0,
        })
    }

    /// Straight-line drift for `dt` time units.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        self.position += self.velocity * dt;
    }

    /// Increment the collision counter (used for event invalidation).
    #[inline]
    pub fn bump_collision_count(&mut self) {
        self.collision_count = self.collision_count.saturating_add(1);
    }

    /// Kinetic energy 1/2 |v|^2 (unit mass).
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.velocity.norm_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_ok() -> Result<()> {
        let p = Particle::new(1, Vector2::new(0.5, 1.0), Vector2::new(2.0, -3.0), 0.25)?;
        assert_eq!(p.id, 1);
        assert_eq!(p.position, Vector2::new(0.5, 1.0));
        assert_eq!(p.velocity, Vector2::new(2.0, -3.0));
        assert_eq!(p.radius, 0.25);
        assert_eq!(p.collision_count, 0);
        Ok(())
    }

    #[test]
    fn invalid_radius_rejected() {
        let err = Particle::new(0, Vector2::ZERO, Vector2::ZERO, 0.0).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn non_finite_state_rejected() {
        let err = Particle::new(0, Vector2::new(f64::NAN, 0.0), Vector2::ZERO, 1.0).unwrap_err();
        assert!(err.to_string().contains("position"));
        let err =
            Particle::new(0, Vector2::ZERO, Vector2::new(f64::INFINITY, 0.0), 1.0).unwrap_err();
        assert!(err.to_string().contains("velocity"));
    }

    #[test]
    fn advance_moves_linearly() -> Result<()> {
        let mut p = Particle::new(0, Vector2::new(1.0, 1.0), Vector2::new(0.5, -1.0), 0.1)?;
        p.advance(2.0);
        assert_eq!(p.position, Vector2::new(2.0, -1.0));
        Ok(())
    }

    #[test]
    fn kinetic_energy_computed() -> Result<()> {
        // v = (3, 4), |v|^2 = 25; KE = 12.5
        let p = Particle::new(7, Vector2::ZERO, Vector2::new(3.0, 4.0), 1.0)?;
        assert!((p.kinetic_energy() - 12.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn bump_collision_count() -> Result<()> {
        let mut p = Particle::new(1, Vector2::ZERO, Vector2::ZERO, 1.0)?;
        assert_eq!(p.collision_count, 0);
        p.bump_collision_count();
        assert_eq!(p.collision_count, 1);
        Ok(())
    }
}
