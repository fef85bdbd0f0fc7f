use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Kinds of events the engine schedules.
///
/// Tie-breaking for deterministic ordering prefers `P2P` < `P2W` < `P2V`
/// when times are equal; the loser of a tie is invalidated by the winner's
/// response, so any total order is physically acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Disk-disk collision between particles `i` and `j` (with `i < j`).
    P2P { i: u32, j: u32 },
    /// Disk-wall collision for particle `i` and segment obstacle `wall`.
    P2W { i: u32, wall: u32 },
    /// Disk-corner collision for particle `i` and vertex obstacle `vertex`.
    P2V { i: u32, vertex: u32 },
}

impl EventKind {
    #[inline]
    fn order_key(&self) -> (u8, u32, u32) {
        match *self {
            EventKind::P2P { i, j } => (0, i, j),
            EventKind::P2W { i, wall } => (1, i, wall),
            EventKind::P2V { i, vertex } => (2, i, vertex),
        }
    }

    /// The id of the moving participant (for `P2P`, the lower id).
    #[inline]
    pub fn subject(&self) -> u32 {
        match *self {
            EventKind::P2P { i, .. } | EventKind::P2W { i, .. } | EventKind::P2V { i, .. } => i,
        }
    }

    /// The id of the collision partner: a particle id for `P2P`, an
    /// obstacle id otherwise.
    #[inline]
    pub fn target(&self) -> u32 {
        match *self {
            EventKind::P2P { j, .. } => j,
            EventKind::P2W { wall, .. } => wall,
            EventKind::P2V { vertex, .. } => vertex,
        }
    }

    /// Wire label used in the event log.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::P2P { .. } => "PARTICLE",
            EventKind::P2W { .. } => "WALL",
            EventKind::P2V { .. } => "VERTEX",
        }
    }
}

/// A scheduled event in the priority queue with deterministic ordering.
///
/// - `time`: absolute occurrence time (finite, non-NaN).
/// - `kind`: event kind and participants.
/// - `cc_i`, `cc_j`: collision-count snapshots for invalidation. `cc_j` is
///   `None` for obstacle partners, which never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: NotNan<f64>,
    pub kind: EventKind,
    pub cc_i: u64,
    pub cc_j: Option<u64>,
}

impl Event {
    /// Create a new event, validating that time is finite and non-NaN.
    pub fn new(time: f64, kind: EventKind, cc_i: u64, cc_j: Option<u64>) -> Result<Self> {
        if !time.is_finite() {
            return Err(Error::InvalidParam("event time must be finite".into()));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::InvalidParam("event time cannot be NaN".into()))?;
        Ok(Self {
            time,
            kind,
            cc_i,
            cc_j,
        })
    }

    /// Returns the raw f64 event time.
    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }

    /// Validate against current collision counts. Pass `None` for
    /// `cc_j_now` when the partner is an obstacle.
    #[inline]
    pub fn is_valid(&self, cc_i_now: u64, cc_j_now: Option<u64>) -> bool {
        if self.cc_i != cc_i_now {
            return false;
        }
        match (self.cc_j, cc_j_now) {
            (Some(a), Some(b)) => a == b,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {
                let a = self.kind.order_key();
                let b = other.kind.order_key();
                match a.cmp(&b) {
                    Ordering::Equal => {
                        // Final tie-breaker on cc snapshots for a total order
                        (self.cc_i, self.cc_j.unwrap_or(0))
                            .cmp(&(other.cc_i, other.cc_j.unwrap_or(0)))
                    }
                    o => o,
                }
            }
            o => o,
        }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
