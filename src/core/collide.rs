//! Impulse-exchange collision responses.
//!
//! Each response rewrites the velocities of the participants at the moment
//! of contact and bumps their collision counters, invalidating every event
//! queued against their previous trajectories. Collisions are perfectly
//! elastic; masses are equal and not modeled separately.

use crate::core::obstacle::{Orientation, Segment, Vertex};
use crate::core::Particle;
use crate::error::{Error, Result};

/// Guard against degenerate (near-coincident) contact normals.
const EPS_NORMAL: f64 = 1e-14;

/// Equal-mass hard-disk impulse: with dr = p_b - p_a, dv = v_b - v_a and
/// sigma = r_a + r_b, the impulse J = dr (dv . dr) / sigma^2 is added to
/// `a` and subtracted from `b`. Momentum and kinetic energy are preserved
/// exactly for point contact.
pub fn disks(a: &mut Particle, b: &mut Particle) -> Result<()> {
    let dr = b.position - a.position;
    let dv = b.velocity - a.velocity;
    let sigma = a.radius + b.radius;
    if dr.norm_squared() <= EPS_NORMAL {
        return Err(Error::MathError(
            "degenerate contact normal in disk-disk collision".into(),
        ));
    }

    let j_scalar = (2.0 * dv.dot(dr)) / (2.0 * sigma);
    let impulse = dr * (j_scalar / sigma);

    a.velocity += impulse;
    b.velocity -= impulse;

    a.bump_collision_count();
    b.bump_collision_count();
    Ok(())
}

/// Specular wall reflection: the velocity component normal to the segment
/// flips sign.
pub fn segment(p: &mut Particle, s: &Segment) {
    match s.orientation {
        Orientation::Horizontal => p.velocity.y = -p.velocity.y,
        Orientation::Vertical => p.velocity.x = -p.velocity.x,
    }
    p.bump_collision_count();
}

/// Corner reflection: mirror the velocity across the contact normal from
/// the vertex to the disk center, as if bouncing off an immovable point.
pub fn vertex(p: &mut Particle, v: &Vertex) -> Result<()> {
    let n = p.position - v.position;
    if n.norm_squared() <= EPS_NORMAL {
        return Err(Error::MathError(
            "degenerate contact normal in disk-vertex collision".into(),
        ));
    }
    let n = n.normalized();
    p.velocity -= n * (2.0 * p.velocity.dot(n));
    p.bump_collision_count();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vector2;

    fn disk(id: u32, x: f64, y: f64, vx: f64, vy: f64, r: f64) -> Particle {
        Particle::new(id, Vector2::new(x, y), Vector2::new(vx, vy), r)
            .expect("valid test particle")
    }

    #[test]
    fn head_on_swap() -> Result<()> {
        // Equal disks meeting head-on exchange velocities
        let mut a = disk(0, -1.0, 0.0, 1.0, 0.0, 1.0);
        let mut b = disk(1, 1.0, 0.0, -1.0, 0.0, 1.0);
        disks(&mut a, &mut b)?;
        assert_eq!(a.velocity, Vector2::new(-1.0, 0.0));
        assert_eq!(b.velocity, Vector2::new(1.0, 0.0));
        assert_eq!(a.collision_count, 1);
        assert_eq!(b.collision_count, 1);
        Ok(())
    }

    #[test]
    fn oblique_conserves_energy_and_momentum() -> Result<()> {
        let mut a = disk(0, 0.0, 0.0, 0.7, -0.2, 0.5);
        let mut b = disk(1, 0.6, 0.8, -0.3, 0.1, 0.5);
        let e0 = a.kinetic_energy() + b.kinetic_energy();
        let p0 = a.velocity + b.velocity;
        disks(&mut a, &mut b)?;
        let e1 = a.kinetic_energy() + b.kinetic_energy();
        let p1 = a.velocity + b.velocity;
        assert!((e1 - e0).abs() < 1e-12);
        assert!((p1 - p0).norm() < 1e-12);
        Ok(())
    }

    #[test]
    fn coincident_centers_rejected() {
        let mut a = disk(0, 0.0, 0.0, 1.0, 0.0, 0.5);
        let mut b = disk(1, 0.0, 0.0, -1.0, 0.0, 0.5);
        assert!(disks(&mut a, &mut b).is_err());
    }

    #[test]
    fn wall_reflection_flips_normal_component() -> Result<()> {
        let vertical = Segment::new(Vector2::new(1.0, 0.0), Vector2::new(1.0, 2.0))?;
        let mut p = disk(0, 0.9, 1.0, 0.5, 0.3, 0.1);
        segment(&mut p, &vertical);
        assert_eq!(p.velocity, Vector2::new(-0.5, 0.3));
        assert_eq!(p.collision_count, 1);

        let horizontal = Segment::new(Vector2::new(0.0, 2.0), Vector2::new(3.0, 2.0))?;
        segment(&mut p, &horizontal);
        assert_eq!(p.velocity, Vector2::new(-0.5, -0.3));
        assert_eq!(p.collision_count, 2);
        Ok(())
    }

    #[test]
    fn corner_mirror_at_45_degrees() -> Result<()> {
        let v = Vertex {
            position: Vector2::new(1.0, 1.0),
        };
        // Disk up-left of the corner moving straight at it: velocity reverses
        let mut p = disk(0, 1.0 - 0.1, 1.0 + 0.1, 1.0, -1.0, 0.2);
        vertex(&mut p, &v)?;
        assert!((p.velocity.x + 1.0).abs() < 1e-12);
        assert!((p.velocity.y - 1.0).abs() < 1e-12);
        assert_eq!(p.collision_count, 1);
        Ok(())
    }

    #[test]
    fn corner_mirror_conserves_speed() -> Result<()> {
        let v = Vertex {
            position: Vector2::new(0.0, 0.0),
        };
        let mut p = disk(0, 0.3, 0.4, -1.0, -0.25, 0.5);
        let speed0 = p.velocity.norm();
        vertex(&mut p, &v)?;
        assert!((p.velocity.norm() - speed0).abs() < 1e-12);
        Ok(())
    }
}
