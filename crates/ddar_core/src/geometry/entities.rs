//! Entity payload types stored in the geometric graph's arenas (C6).
//!
//! Each struct holds only *root* state (§3, invariant ROOT) — once a node
//! stops being a root its payload is no longer read, only its union-find
//! parent pointer matters. `W` is the witness type threaded through every
//! incidence/equality record (normally a predicate reference); every
//! entity index is parameterized by it since e.g. a `Line`'s points map is
//! keyed by `PointId<W>`.

use std::collections::{BTreeMap, BTreeSet};

use crate::frac::Frac;
use crate::node::Idx;

pub type PointId<W> = Idx<PointData<W>>;
pub type LineId<W> = Idx<LineData<W>>;
pub type CircleId<W> = Idx<CircleData<W>>;
pub type TriangleId<W> = Idx<TriangleData<W>>;
pub type DirectionId<W> = Idx<DirectionData<W>>;
pub type LengthId<W> = Idx<LengthData<W>>;
pub type AngleId<W> = Idx<AngleData<W>>;
pub type RatioId<W> = Idx<RatioData<W>>;
pub type SegmentId<W> = Idx<SegmentData<W>>;
pub type MeasureId<W> = Idx<MeasureData<W>>;
pub type FractionId<W> = Idx<FractionData<W>>;
pub type DimensionId<W> = Idx<DimensionData<W>>;
pub type ShapeId<W> = Idx<ShapeData<W>>;

#[derive(Debug, Clone)]
pub struct PointData<W> {
    pub on_line: BTreeMap<LineId<W>, W>,
    pub on_circle: BTreeMap<CircleId<W>, W>,
}

impl<W> Default for PointData<W> {
    fn default() -> Self {
        PointData {
            on_line: BTreeMap::new(),
            on_circle: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineData<W> {
    pub points: BTreeMap<PointId<W>, W>,
    pub direction: Option<(DirectionId<W>, W)>,
}

impl<W> Default for LineData<W> {
    fn default() -> Self {
        LineData {
            points: BTreeMap::new(),
            direction: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircleData<W> {
    pub points: BTreeMap<PointId<W>, W>,
    pub center: Option<(PointId<W>, W)>,
}

impl<W> Default for CircleData<W> {
    fn default() -> Self {
        CircleData {
            points: BTreeMap::new(),
            center: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectionData<W> {
    pub root_lines: BTreeSet<LineId<W>>,
    pub perp: Option<DirectionId<W>>,
}

impl<W> Default for DirectionData<W> {
    fn default() -> Self {
        DirectionData {
            root_lines: BTreeSet::new(),
            perp: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LengthData<W> {
    pub root_segments: BTreeSet<SegmentId<W>>,
}

impl<W> Default for LengthData<W> {
    fn default() -> Self {
        LengthData {
            root_segments: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AngleData<W> {
    pub dir1: DirectionId<W>,
    pub dir2: DirectionId<W>,
    pub measure: Option<MeasureId<W>>,
}

#[derive(Debug, Clone, Copy)]
pub struct RatioData<W> {
    pub len1: LengthId<W>,
    pub len2: LengthId<W>,
    pub fraction: Option<FractionId<W>>,
}

/// Unordered pair of points with a `Length` back-reference once computed.
#[derive(Debug, Clone, Copy)]
pub struct SegmentData<W> {
    pub p1: PointId<W>,
    pub p2: PointId<W>,
    pub length: Option<LengthId<W>>,
}

#[derive(Debug, Clone)]
pub struct MeasureData<W> {
    pub root_angles: BTreeSet<AngleId<W>>,
    /// Set when this measure class corresponds to a rational multiple of a
    /// straight angle (constangle); `None` for a purely symbolic class.
    pub value: Option<Frac>,
}

impl<W> Default for MeasureData<W> {
    fn default() -> Self {
        MeasureData {
            root_angles: BTreeSet::new(),
            value: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FractionData<W> {
    pub root_ratios: BTreeSet<RatioId<W>>,
    pub value: Option<Frac>,
}

impl<W> Default for FractionData<W> {
    fn default() -> Self {
        FractionData {
            root_ratios: BTreeSet::new(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriangleData<W> {
    pub verts: [PointId<W>; 3],
    /// Bitmask over the 3 sides; bit `i` set means sides `i` and `i+1 mod 3`
    /// (opposite vertex `i`) are known equal (isosceles at that vertex).
    pub iso_mask: u8,
    pub dimension: Option<DimensionId<W>>,
}

impl<W: Copy> TriangleData<W> {
    /// Rewrites every occurrence of `from` to `to`; the caller is
    /// responsible for detecting degeneracy (two vertices coinciding)
    /// after calling this.
    pub fn replace_vertex(&mut self, from: PointId<W>, to: PointId<W>) {
        for v in self.verts.iter_mut() {
            if *v == from {
                *v = to;
            }
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.verts[0] == self.verts[1] || self.verts[1] == self.verts[2] || self.verts[0] == self.verts[2]
    }

    /// Rotates `(verts, iso_mask)` together by one vertex position, per
    /// the original's paired vertex/isosceles-mask permutation.
    pub fn rotate(&self) -> TriangleData<W> {
        TriangleData {
            verts: [self.verts[1], self.verts[2], self.verts[0]],
            iso_mask: self.iso_mask.rotate_left(1) & 0b111,
            dimension: self.dimension,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DimensionData<W> {
    pub root_triangles: BTreeSet<TriangleId<W>>,
    pub shape: Option<ShapeId<W>>,
}

impl<W> Default for DimensionData<W> {
    fn default() -> Self {
        DimensionData {
            root_triangles: BTreeSet::new(),
            shape: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShapeData<W> {
    pub root_dimensions: BTreeSet<DimensionId<W>>,
}

impl<W> Default for ShapeData<W> {
    fn default() -> Self {
        ShapeData {
            root_dimensions: BTreeSet::new(),
        }
    }
}
