//! Closed-form collision-time predictors.
//!
//! All predictors are pure: they take the current state as given, never
//! advance it, and return the time from now until contact, or `None` when
//! the pair will not meet. Candidate times below [`EPS`] are rejected as
//! already-touching degenerate contacts; this guardband is what keeps
//! freshly collided pairs from re-colliding in place.

use crate::core::obstacle::{Orientation, Segment, Vertex};
use crate::core::{Particle, Vector2};

/// Numerical guardband for approach, discriminant, and time thresholds.
pub const EPS: f64 = 1e-14;

/// Time until two moving disks touch.
///
/// With dr = p_b - p_a, dv = v_b - v_a and sigma = r_a + r_b, contact
/// happens at the smaller root of |dr + dv t| = sigma, provided the pair
/// is actually approaching (dv . dr < 0) and the discriminant is positive.
pub fn disk_disk(a: &Particle, b: &Particle) -> Option<f64> {
    time_to_contact(
        b.position - a.position,
        b.velocity - a.velocity,
        a.radius + b.radius,
    )
}

/// Time until a disk touches an axis-aligned wall segment.
///
/// The disk must approach the wall's line from one side; contact with the
/// line happens when the coordinate along the fixed axis reaches k -/+ r.
/// The crossing point then has to fall within the segment's extent,
/// widened by r on both ends so grazing contacts at the rim are kept;
/// contacts beyond that belong to the corner vertices.
pub fn disk_segment(p: &Particle, s: &Segment) -> Option<f64> {
    let (u, vu, w, vw) = match s.orientation {
        Orientation::Vertical => (p.position.x, p.velocity.x, p.position.y, p.velocity.y),
        Orientation::Horizontal => (p.position.y, p.velocity.y, p.position.x, p.velocity.x),
    };
    let k = s.fixed_coord();

    let offset = if u < k && vu > 0.0 {
        -p.radius
    } else if u > k && vu < 0.0 {
        p.radius
    } else {
        return None;
    };

    let t = (k + offset - u) / vu;
    if t < EPS {
        return None;
    }

    let w_hit = w + vw * t;
    let (lo, hi) = s.free_extent();
    if w_hit < lo - p.radius || w_hit > hi + p.radius {
        return None;
    }
    Some(t)
}

/// Time until a disk touches a concave corner, modeled as a frozen ghost
/// disk of radius zero at the vertex position.
pub fn disk_vertex(p: &Particle, v: &Vertex) -> Option<f64> {
    time_to_contact(v.position - p.position, -p.velocity, p.radius)
}

fn time_to_contact(dr: Vector2, dv: Vector2, sigma: f64) -> Option<f64> {
    let dv_dr = dv.dot(dr);
    if dv_dr >= -EPS {
        // Receding or moving in parallel
        return None;
    }
    let dv_dv = dv.norm_squared();
    if dv_dv <= EPS {
        return None;
    }
    let d = dv_dr * dv_dr - dv_dv * (dr.norm_squared() - sigma * sigma);
    if d < EPS {
        return None;
    }
    let t = -(dv_dr + d.sqrt()) / dv_dv;
    if t < EPS {
        return None;
    }
    Some(t)
}
