use crate::core::Vector2;
use crate::error::{Error, Result};

/// Side length of each square chamber.
pub const SIDE: f64 = 0.09;

/// Geometric tolerance for coordinate comparisons.
const EPS_GEOM: f64 = 1e-12;

/// Axis a segment runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// An axis-aligned wall segment. Both endpoints share the coordinate fixed
/// by the orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub orientation: Orientation,
    pub a: Vector2,
    pub b: Vector2,
}

impl Segment {
    /// Build a segment from two endpoints, inferring the orientation from
    /// the shared coordinate. Zero-length or oblique segments are rejected.
    pub fn new(a: Vector2, b: Vector2) -> Result<Self> {
        let horizontal = (a.y - b.y).abs() < EPS_GEOM;
        let vertical = (a.x - b.x).abs() < EPS_GEOM;
        if horizontal && vertical {
            return Err(Error::InvalidParam("zero-length wall segment".into()));
        }
        if horizontal {
            Ok(Self {
                orientation: Orientation::Horizontal,
                a,
                b,
            })
        } else if vertical {
            Ok(Self {
                orientation: Orientation::Vertical,
                a,
                b,
            })
        } else {
            Err(Error::InvalidParam(
                "wall segments must be axis-aligned".into(),
            ))
        }
    }

    /// The coordinate fixed by the orientation.
    #[inline]
    pub fn fixed_coord(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.a.y,
            Orientation::Vertical => self.a.x,
        }
    }

    /// Extent `(lo, hi)` along the free axis.
    #[inline]
    pub fn free_extent(&self) -> (f64, f64) {
        let (u, v) = match self.orientation {
            Orientation::Horizontal => (self.a.x, self.b.x),
            Orientation::Vertical => (self.a.y, self.b.y),
        };
        (u.min(v), u.max(v))
    }

    /// Euclidean distance from a point to the segment.
    pub fn distance_to(&self, p: Vector2) -> f64 {
        let (lo, hi) = self.free_extent();
        let k = self.fixed_coord();
        let closest = match self.orientation {
            Orientation::Horizontal => Vector2::new(p.x.clamp(lo, hi), k),
            Orientation::Vertical => Vector2::new(k, p.y.clamp(lo, hi)),
        };
        (p - closest).norm()
    }
}

/// A concave corner of the container, treated as a frozen point of radius
/// zero for collision purposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vector2,
}

/// Static collision target: a wall segment or a concave corner point.
/// Obstacle ids are their indices in the container's obstacle list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    Segment(Segment),
    Vertex(Vertex),
}

/// The fixed container: a closed, piece-wise axis-aligned polygon with
/// `Vertex` obstacles at its concave corners.
#[derive(Debug, Clone)]
pub struct Container {
    l: f64,
    obstacles: Vec<Obstacle>,
}

impl Container {
    /// Two square chambers of side [`SIDE`] joined by a slit of height `l`
    /// centered on the shared wall. The two slit lips are concave corners
    /// and carry `Vertex` obstacles; for `l = SIDE` the wall is fully open
    /// and there are no corners.
    pub fn slit_chamber(l: f64) -> Result<Self> {
        if !l.is_finite() || l <= 0.0 || l > SIDE + EPS_GEOM {
            return Err(Error::InvalidParam(format!(
                "slit height must be in (0, {SIDE}], got {l}"
            )));
        }
        let lil = (SIDE - l) / 2.0;
        let corners = [
            Vector2::new(0.0, 0.0),
            Vector2::new(SIDE, 0.0),
            Vector2::new(SIDE, lil),
            Vector2::new(2.0 * SIDE, lil),
            Vector2::new(2.0 * SIDE, lil + l),
            Vector2::new(SIDE, lil + l),
            Vector2::new(SIDE, SIDE),
            Vector2::new(0.0, SIDE),
        ];

        let mut obstacles = Vec::with_capacity(10);
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            // A fully open slit degenerates the two lip segments to points.
            if (a - b).norm() < EPS_GEOM {
                continue;
            }
            obstacles.push(Obstacle::Segment(Segment::new(a, b)?));
        }
        if lil > EPS_GEOM {
            obstacles.push(Obstacle::Vertex(Vertex {
                position: Vector2::new(SIDE, lil),
            }));
            obstacles.push(Obstacle::Vertex(Vertex {
                position: Vector2::new(SIDE, lil + l),
            }));
        }

        let container = Self { l, obstacles };
        container.validate_closed()?;
        Ok(container)
    }

    /// A plain rectangular box `[0, w] x [0, h]` with no concave corners.
    pub fn rectangle(w: f64, h: f64) -> Result<Self> {
        if !w.is_finite() || w <= 0.0 || !h.is_finite() || h <= 0.0 {
            return Err(Error::InvalidParam(
                "box dimensions must be finite and > 0".into(),
            ));
        }
        let corners = [
            Vector2::new(0.0, 0.0),
            Vector2::new(w, 0.0),
            Vector2::new(w, h),
            Vector2::new(0.0, h),
        ];
        let mut obstacles = Vec::with_capacity(4);
        for i in 0..corners.len() {
            obstacles.push(Obstacle::Segment(Segment::new(
                corners[i],
                corners[(i + 1) % corners.len()],
            )?));
        }
        Ok(Self { l: h, obstacles })
    }

    /// Build from an externally supplied obstacle list. The segments must
    /// form a closed polygon.
    pub fn from_obstacles(l: f64, obstacles: Vec<Obstacle>) -> Result<Self> {
        let container = Self { l, obstacles };
        container.validate_closed()?;
        Ok(container)
    }

    /// The characteristic length reported to sinks (slit height for the
    /// two-chamber geometry, box height for rectangles).
    #[inline]
    pub fn l(&self) -> f64 {
        self.l
    }

    #[inline]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Wall segments only, in construction order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.obstacles.iter().filter_map(|o| match o {
            Obstacle::Segment(s) => Some(s),
            Obstacle::Vertex(_) => None,
        })
    }

    /// Axis-aligned bounding box of the container.
    pub fn bounds(&self) -> (Vector2, Vector2) {
        let mut min = Vector2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for s in self.segments() {
            for p in [s.a, s.b] {
                min.x = min.x.min(p.x);
                min.y = min.y.min(p.y);
                max.x = max.x.max(p.x);
                max.y = max.y.max(p.y);
            }
        }
        (min, max)
    }

    /// True when a disk of the given radius centered at `p` lies fully
    /// inside the polygon, with `EPS_GEOM` slack for roundoff.
    pub fn contains(&self, p: Vector2, radius: f64) -> bool {
        if !self.point_inside(p) {
            return false;
        }
        self.obstacles.iter().all(|o| {
            let d = match o {
                Obstacle::Segment(s) => s.distance_to(p),
                Obstacle::Vertex(v) => (p - v.position).norm(),
            };
            d >= radius - EPS_GEOM
        })
    }

    /// Ray-cast point-in-polygon test: count crossings of the rightward
    /// horizontal ray with the vertical wall segments. Half-open extents
    /// keep shared endpoints from double-counting.
    fn point_inside(&self, p: Vector2) -> bool {
        let mut crossings = 0u32;
        for s in self.segments() {
            if s.orientation != Orientation::Vertical {
                continue;
            }
            let (lo, hi) = s.free_extent();
            if p.y >= lo && p.y < hi && s.fixed_coord() > p.x {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    /// Every segment endpoint must be shared by exactly one other segment,
    /// otherwise the polygon is not closed.
    fn validate_closed(&self) -> Result<()> {
        use std::collections::HashMap;
        let mut counts: HashMap<(u64, u64), u32> = HashMap::new();
        for s in self.segments() {
            for p in [s.a, s.b] {
                *counts.entry((p.x.to_bits(), p.y.to_bits())).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return Err(Error::InvalidState("container has no wall segments".into()));
        }
        for (&(x, y), &n) in &counts {
            if n != 2 {
                return Err(Error::InvalidState(format!(
                    "container polygon is not closed at ({}, {})",
                    f64::from_bits(x),
                    f64::from_bits(y)
                )));
            }
        }
        Ok(())
    }
}
