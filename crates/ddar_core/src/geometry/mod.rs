//! Geometric graph (C6): points, lines, circles, triangles, and their
//! derived value nodes, with merge and incidence maintenance per spec §4.6.
//!
//! One [`Arena`] per entity kind holds root state; cross-references are
//! typed indices rather than pointers, per §9's stable-index
//! recommendation. `W` is the witness attached to every incidence record
//! and union (normally a predicate reference, supplied by the caller —
//! this module does not construct predicates itself, matching C7/C8's
//! separate responsibility for that).

pub mod entities;

use std::collections::BTreeMap;

use crate::error::{Contradiction, GGraphError};
use crate::frac::Frac;
use crate::node::{self, Arena};
use entities::*;

pub struct GeometricGraph<W: Clone> {
    points: Arena<PointData<W>, W>,
    lines: Arena<LineData<W>, W>,
    circles: Arena<CircleData<W>, W>,
    directions: Arena<DirectionData<W>, W>,
    lengths: Arena<LengthData<W>, W>,
    angles: Arena<AngleData<W>, W>,
    ratios: Arena<RatioData<W>, W>,
    segments: Arena<SegmentData<W>, W>,
    measures: Arena<MeasureData<W>, W>,
    fractions: Arena<FractionData<W>, W>,
    triangles: Arena<TriangleData<W>, W>,
    dimensions: Arena<DimensionData<W>, W>,
    shapes: Arena<ShapeData<W>, W>,
    segment_index: BTreeMap<(PointId<W>, PointId<W>), SegmentId<W>>,
    angle_index: BTreeMap<(DirectionId<W>, DirectionId<W>), AngleId<W>>,
    ratio_index: BTreeMap<(LengthId<W>, LengthId<W>), RatioId<W>>,
    name_to_point: BTreeMap<String, PointId<W>>,
}

impl<W: Clone> Default for GeometricGraph<W> {
    fn default() -> Self {
        GeometricGraph::new()
    }
}

fn sorted_pair<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl<W: Clone> GeometricGraph<W> {
    pub fn new() -> GeometricGraph<W> {
        GeometricGraph {
            points: Arena::new(),
            lines: Arena::new(),
            circles: Arena::new(),
            directions: Arena::new(),
            lengths: Arena::new(),
            angles: Arena::new(),
            ratios: Arena::new(),
            segments: Arena::new(),
            measures: Arena::new(),
            fractions: Arena::new(),
            triangles: Arena::new(),
            dimensions: Arena::new(),
            shapes: Arena::new(),
            segment_index: BTreeMap::new(),
            angle_index: BTreeMap::new(),
            ratio_index: BTreeMap::new(),
            name_to_point: BTreeMap::new(),
        }
    }

    // -- creation -----------------------------------------------------

    pub fn add_point(&mut self, name: impl Into<String>) -> PointId<W> {
        let name = name.into();
        let id = self.points.push(name.clone(), PointData::default());
        self.name_to_point.insert(name, id);
        id
    }

    pub fn point_by_name(&self, name: &str) -> Option<PointId<W>> {
        self.name_to_point.get(name).copied()
    }

    pub fn add_line(&mut self, name: impl Into<String>) -> LineId<W> {
        self.lines.push(name, LineData::default())
    }

    pub fn add_circle(&mut self, name: impl Into<String>) -> CircleId<W> {
        self.circles.push(name, CircleData::default())
    }

    pub fn add_direction(&mut self, name: impl Into<String>) -> DirectionId<W> {
        self.directions.push(name, DirectionData::default())
    }

    pub fn add_triangle(&mut self, name: impl Into<String>, verts: [PointId<W>; 3]) -> TriangleId<W> {
        self.triangles.push(
            name,
            TriangleData {
                verts,
                iso_mask: 0,
                dimension: None,
            },
        )
    }

    pub fn add_length(&mut self, name: impl Into<String>) -> LengthId<W> {
        self.lengths.push(name, LengthData::default())
    }

    /// Creates a measure class, optionally constant-valued (the AR engine
    /// uses this for `constangle` facts).
    pub fn add_measure(&mut self, name: impl Into<String>, value: Option<Frac>) -> MeasureId<W> {
        self.measures.push(name, MeasureData { root_angles: Default::default(), value })
    }

    /// Creates a fraction class, optionally constant-valued (`constratio`).
    pub fn add_fraction(&mut self, name: impl Into<String>, value: Option<Frac>) -> FractionId<W> {
        self.fractions.push(name, FractionData { root_ratios: Default::default(), value })
    }

    pub fn get_or_add_segment(&mut self, p1: PointId<W>, p2: PointId<W>) -> SegmentId<W> {
        let key = sorted_pair(self.points.root(p1), self.points.root(p2));
        if let Some(&id) = self.segment_index.get(&key) {
            return id;
        }
        let id = self.segments.push(
            format!("seg-{}-{}", self.points.name(p1), self.points.name(p2)),
            SegmentData {
                p1,
                p2,
                length: None,
            },
        );
        self.segment_index.insert(key, id);
        id
    }

    pub fn get_or_add_angle(&mut self, dir1: DirectionId<W>, dir2: DirectionId<W>) -> AngleId<W> {
        let (r1, r2) = (self.directions.root(dir1), self.directions.root(dir2));
        if let Some(&id) = self.angle_index.get(&(r1, r2)) {
            return id;
        }
        let id = self.angles.push(
            format!("ang-{}-{}", self.directions.name(dir1), self.directions.name(dir2)),
            AngleData {
                dir1,
                dir2,
                measure: None,
            },
        );
        self.angle_index.insert((r1, r2), id);
        id
    }

    pub fn get_or_add_ratio(&mut self, len1: LengthId<W>, len2: LengthId<W>) -> RatioId<W> {
        let (r1, r2) = (self.lengths.root(len1), self.lengths.root(len2));
        if let Some(&id) = self.ratio_index.get(&(r1, r2)) {
            return id;
        }
        let id = self.ratios.push(
            format!("rat-{}-{}", self.lengths.name(len1), self.lengths.name(len2)),
            RatioData {
                len1,
                len2,
                fraction: None,
            },
        );
        self.ratio_index.insert((r1, r2), id);
        id
    }

    // -- incidence ------------------------------------------------------

    /// If some root line contains both roots of `p1`/`p2`, returns it.
    pub fn try_get_line(&mut self, p1: PointId<W>, p2: PointId<W>) -> Option<LineId<W>> {
        let (r1, r2) = (self.points.root(p1), self.points.root(p2));
        self.lines.keys().find(|&l| {
            self.lines.is_root(l)
                && self.lines.get(l).points.contains_key(&r1)
                && self.lines.get(l).points.contains_key(&r2)
        })
    }

    /// Finds the line through `p1`,`p2`, creating one (with a base
    /// incidence witness `why` for both points) if none exists.
    pub fn get_or_add_line(&mut self, p1: PointId<W>, p2: PointId<W>, why: W) -> LineId<W> {
        if let Some(l) = self.try_get_line(p1, p2) {
            return l;
        }
        let name = format!("line-{}-{}", self.points.name(p1), self.points.name(p2));
        let line = self.lines.push(name, LineData::default());
        self.add_point_to_line(line, p1, why.clone());
        self.add_point_to_line(line, p2, why);
        line
    }

    fn add_point_to_line(&mut self, line: LineId<W>, p: PointId<W>, why: W) {
        let line_root = self.lines.root(line);
        let p_root = self.points.root(p);
        self.lines.get_mut(line_root).points.insert(p_root, why.clone());
        self.points.get_mut(p_root).on_line.insert(line_root, why);
    }

    pub fn check_coll(&mut self, a: PointId<W>, b: PointId<W>, c: PointId<W>) -> bool {
        match (self.try_get_line(a, b), self.try_get_line(a, c)) {
            (Some(l1), Some(l2)) => l1 == l2,
            _ => false,
        }
    }

    pub fn check_para(&mut self, l1: LineId<W>, l2: LineId<W>) -> bool {
        let (l1, l2) = (self.lines.root(l1), self.lines.root(l2));
        match (self.lines.get(l1).direction.clone(), self.lines.get(l2).direction.clone()) {
            (Some((d1, _)), Some((d2, _))) => self.directions.root(d1) == self.directions.root(d2),
            _ => false,
        }
    }

    pub fn check_perp(&mut self, l1: LineId<W>, l2: LineId<W>) -> bool {
        let (l1, l2) = (self.lines.root(l1), self.lines.root(l2));
        let (d1, d2) = match (self.lines.get(l1).direction.clone(), self.lines.get(l2).direction.clone()) {
            (Some((d1, _)), Some((d2, _))) => (d1, d2),
            _ => return false,
        };
        let d1_root = self.directions.root(d1);
        match self.directions.get(d1_root).perp {
            Some(perp) => self.directions.root(perp) == self.directions.root(d2),
            None => false,
        }
    }

    pub fn check_cyclic(&mut self, pts: [PointId<W>; 4]) -> bool {
        let roots: Vec<PointId<W>> = pts.iter().map(|&p| self.points.root(p)).collect();
        self.circles.keys().any(|c| {
            self.circles.is_root(c) && roots.iter().all(|r| self.circles.get(c).points.contains_key(r))
        })
    }

    pub fn check_cong(&mut self, a: PointId<W>, b: PointId<W>, c: PointId<W>, d: PointId<W>) -> bool {
        let s1 = self.get_or_add_segment(a, b);
        let s2 = self.get_or_add_segment(c, d);
        match (self.segments.get(s1).length, self.segments.get(s2).length) {
            (Some(l1), Some(l2)) => self.lengths.root(l1) == self.lengths.root(l2),
            _ => false,
        }
    }

    pub fn check_eqangle(&mut self, a1: AngleId<W>, a2: AngleId<W>) -> bool {
        match (self.angles.get(a1).measure, self.angles.get(a2).measure) {
            (Some(m1), Some(m2)) => self.measures.root(m1) == self.measures.root(m2),
            _ => false,
        }
    }

    pub fn check_eqratio(&mut self, r1: RatioId<W>, r2: RatioId<W>) -> bool {
        match (self.ratios.get(r1).fraction, self.ratios.get(r2).fraction) {
            (Some(f1), Some(f2)) => self.fractions.root(f1) == self.fractions.root(f2),
            _ => false,
        }
    }

    // -- derived-value setters -------------------------------------------

    /// Sets `line`'s direction. If it already has a different one, merges
    /// them (§4.6.4). Returns the pair of prior directions when a merge
    /// happened, so AR can post the implied equality.
    pub fn set_line_direction(
        &mut self,
        line: LineId<W>,
        dir: DirectionId<W>,
        why: W,
    ) -> Option<(DirectionId<W>, DirectionId<W>)> {
        let line_root = self.lines.root(line);
        match self.lines.get(line_root).direction.clone() {
            None => {
                self.lines.get_mut(line_root).direction = Some((dir, why.clone()));
                let dir_root = self.directions.root(dir);
                self.directions.get_mut(dir_root).root_lines.insert(line_root);
                None
            }
            Some((existing, _)) => {
                let (er, dr) = (self.directions.root(existing), self.directions.root(dir));
                if er == dr {
                    None
                } else {
                    self.merge_directions(existing, dir, why);
                    Some((existing, dir))
                }
            }
        }
    }

    /// Sets `angle`'s measure, merging with any existing one. Returns the
    /// pair of prior measures when a merge happened.
    pub fn set_angle_measure(
        &mut self,
        angle: AngleId<W>,
        measure: MeasureId<W>,
        why: W,
    ) -> Option<(MeasureId<W>, MeasureId<W>)> {
        match self.angles.get(angle).measure {
            None => {
                self.angles.get_mut(angle).measure = Some(measure);
                let mr = self.measures.root(measure);
                self.measures.get_mut(mr).root_angles.insert(angle);
                None
            }
            Some(existing) => {
                let (er, mr) = (self.measures.root(existing), self.measures.root(measure));
                if er == mr {
                    None
                } else {
                    self.merge_measures(existing, measure, why);
                    Some((existing, measure))
                }
            }
        }
    }

    /// Sets `ratio`'s fraction, merging with any existing one. Returns the
    /// pair of prior fractions when a merge happened.
    pub fn set_ratio_fraction(
        &mut self,
        ratio: RatioId<W>,
        fraction: FractionId<W>,
        why: W,
    ) -> Option<(FractionId<W>, FractionId<W>)> {
        match self.ratios.get(ratio).fraction {
            None => {
                self.ratios.get_mut(ratio).fraction = Some(fraction);
                let fr = self.fractions.root(fraction);
                self.fractions.get_mut(fr).root_ratios.insert(ratio);
                None
            }
            Some(existing) => {
                let (er, fr) = (self.fractions.root(existing), self.fractions.root(fraction));
                if er == fr {
                    None
                } else {
                    self.merge_fractions(existing, fraction, why);
                    Some((existing, fraction))
                }
            }
        }
    }

    pub fn set_triangle_dimension(&mut self, tri: TriangleId<W>, dim: DimensionId<W>, why: W) {
        match self.triangles.get(tri).dimension {
            None => {
                self.triangles.get_mut(tri).dimension = Some(dim);
                let dr = self.dimensions.root(dim);
                self.dimensions.get_mut(dr).root_triangles.insert(tri);
            }
            Some(existing) => {
                if self.dimensions.root(existing) != self.dimensions.root(dim) {
                    self.merge_dimensions(existing, dim, why);
                }
            }
        }
    }

    pub fn set_dimension_shape(&mut self, dim: DimensionId<W>, shape: ShapeId<W>, why: W) {
        match self.dimensions.get(dim).shape {
            None => {
                self.dimensions.get_mut(dim).shape = Some(shape);
                let sr = self.shapes.root(shape);
                self.shapes.get_mut(sr).root_dimensions.insert(dim);
            }
            Some(existing) => {
                if self.shapes.root(existing) != self.shapes.root(shape) {
                    self.merge_shapes(existing, shape, why);
                }
            }
        }
    }

    // -- merges -----------------------------------------------------------

    /// Merges `src` into `dest`, per §4.6.1. Re-scans `dest`'s lines/circles
    /// pairwise afterward to trigger any line/circle merges a shared pair
    /// of points now implies.
    pub fn merge_points(&mut self, dest: PointId<W>, src: PointId<W>, why: W) -> Result<(), GGraphError> {
        let Some((dest_root, src_root)) = self.points.merge(dest, src, why.clone()) else {
            return Ok(());
        };

        let src_lines: Vec<(LineId<W>, W)> = self
            .points
            .get(src_root)
            .on_line
            .iter()
            .map(|(&l, w)| (l, w.clone()))
            .collect();
        for (l, w) in src_lines {
            let l_root = self.lines.root(l);
            self.lines.get_mut(l_root).points.remove(&src_root);
            self.lines.get_mut(l_root).points.insert(dest_root, w.clone());
            self.points.get_mut(dest_root).on_line.insert(l_root, w);
        }

        let src_circles: Vec<(CircleId<W>, W)> = self
            .points
            .get(src_root)
            .on_circle
            .iter()
            .map(|(&c, w)| (c, w.clone()))
            .collect();
        for (c, w) in src_circles {
            let c_root = self.circles.root(c);
            self.circles.get_mut(c_root).points.remove(&src_root);
            self.circles.get_mut(c_root).points.insert(dest_root, w.clone());
            self.points.get_mut(dest_root).on_circle.insert(c_root, w);
        }

        self.retrigger_line_merges(dest_root, why.clone())?;
        self.retrigger_circle_merges(dest_root, why.clone())?;
        self.fix_degenerate_triangles(src_root, dest_root)?;
        Ok(())
    }

    fn retrigger_line_merges(&mut self, p: PointId<W>, why: W) -> Result<(), GGraphError> {
        let lines: Vec<LineId<W>> = self.points.get(p).on_line.keys().copied().collect();
        for (l1, l2) in node::pairs(&lines) {
            if self.lines.root(l1) == self.lines.root(l2) {
                continue;
            }
            let shared = self.lines.get(self.lines.root(l1)).points.keys().filter(|k| {
                self.lines.get(self.lines.root(l2)).points.contains_key(k)
            }).count();
            if shared >= 2 {
                self.merge_lines(l1, l2, why.clone())?;
            }
        }
        Ok(())
    }

    fn retrigger_circle_merges(&mut self, p: PointId<W>, why: W) -> Result<(), GGraphError> {
        let circles: Vec<CircleId<W>> = self.points.get(p).on_circle.keys().copied().collect();
        for (c1, c2) in node::pairs(&circles) {
            if self.circles.root(c1) == self.circles.root(c2) {
                continue;
            }
            let shared = self.circles.get(self.circles.root(c1)).points.keys().filter(|k| {
                self.circles.get(self.circles.root(c2)).points.contains_key(k)
            }).count();
            if shared >= 3 {
                self.merge_circles(c1, c2, why.clone())?;
            }
        }
        Ok(())
    }

    fn fix_degenerate_triangles(&mut self, src: PointId<W>, dest: PointId<W>) -> Result<(), GGraphError> {
        let affected: Vec<TriangleId<W>> = self
            .triangles
            .keys()
            .filter(|&t| self.triangles.get(t).verts.contains(&src))
            .collect();
        for t in affected {
            self.triangles.get_mut(t).replace_vertex(src, dest);
            if self.triangles.get(t).is_degenerate() {
                return Err(GGraphError::DegenerateTriangle {
                    triangle: self.triangles.name(t).to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn merge_lines(&mut self, dest: LineId<W>, src: LineId<W>, why: W) -> Result<(), GGraphError> {
        let Some((dest_root, src_root)) = self.lines.merge(dest, src, why.clone()) else {
            return Ok(());
        };

        let src_points: Vec<(PointId<W>, W)> = self
            .lines
            .get(src_root)
            .points
            .iter()
            .map(|(&p, w)| (p, w.clone()))
            .collect();
        for (p, w) in src_points {
            let p_root = self.points.root(p);
            self.points.get_mut(p_root).on_line.remove(&src_root);
            self.points.get_mut(p_root).on_line.insert(dest_root, w.clone());
            self.lines.get_mut(dest_root).points.insert(p_root, w);
        }

        let src_dir = self.lines.get(src_root).direction.clone();
        let dest_dir = self.lines.get(dest_root).direction.clone();
        match (dest_dir, src_dir) {
            (Some((dd, _)), Some((sd, _))) => {
                self.merge_directions(dd, sd, why);
            }
            (None, Some((sd, sw))) => {
                self.lines.get_mut(dest_root).direction = Some((sd, sw));
                let dr = self.directions.root(sd);
                self.directions.get_mut(dr).root_lines.insert(dest_root);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn merge_circles(&mut self, dest: CircleId<W>, src: CircleId<W>, why: W) -> Result<(), GGraphError> {
        let Some((dest_root, src_root)) = self.circles.merge(dest, src, why.clone()) else {
            return Ok(());
        };
        let src_points: Vec<(PointId<W>, W)> = self
            .circles
            .get(src_root)
            .points
            .iter()
            .map(|(&p, w)| (p, w.clone()))
            .collect();
        for (p, w) in src_points {
            let p_root = self.points.root(p);
            self.points.get_mut(p_root).on_circle.remove(&src_root);
            self.points.get_mut(p_root).on_circle.insert(dest_root, w.clone());
            self.circles.get_mut(dest_root).points.insert(p_root, w);
        }
        if self.circles.get(dest_root).center.is_none() {
            self.circles.get_mut(dest_root).center = self.circles.get(src_root).center.clone();
        }
        Ok(())
    }

    /// Merges two direction classes; if both sides have a `perp`, merges
    /// those too. Terminates in one recursive step since perpendicular is
    /// an involution (§4.6.3).
    pub fn merge_directions(&mut self, dest: DirectionId<W>, src: DirectionId<W>, why: W) {
        let Some((dest_root, src_root)) = self.directions.merge(dest, src, why.clone()) else {
            return;
        };
        let src_lines: Vec<LineId<W>> = self.directions.get(src_root).root_lines.iter().copied().collect();
        for l in src_lines {
            self.directions.get_mut(dest_root).root_lines.insert(l);
        }

        let dest_perp = self.directions.get(dest_root).perp;
        let src_perp = self.directions.get(src_root).perp;
        match (dest_perp, src_perp) {
            (Some(dp), Some(sp)) if self.directions.root(dp) != self.directions.root(sp) => {
                self.merge_directions(dp, sp, why);
            }
            (None, Some(sp)) => {
                self.directions.get_mut(dest_root).perp = Some(sp);
            }
            _ => {}
        }
    }

    /// Records that `d1` and `d2` are perpendicular, mutually (§4.6.3). If
    /// either side already has a different perp partner, merges that
    /// partner with the other side instead of overwriting it. Errors if
    /// `d1` and `d2` are already the same direction (i.e. already known
    /// parallel) — a direction cannot be perpendicular to itself (§4.6.3's
    /// `d.perp ≠ d` invariant), so asserting this is a contradiction,
    /// seed scenario S5.
    pub fn set_perp(&mut self, d1: DirectionId<W>, d2: DirectionId<W>, why: W) -> Result<(), Contradiction> {
        let (r1, r2) = (self.directions.root(d1), self.directions.root(d2));
        if r1 == r2 {
            return Err(Contradiction {
                message: format!("{} cannot be perpendicular to itself: already known parallel", self.directions.name(r1)),
            });
        }
        if let Some(existing) = self.directions.get(r1).perp {
            if self.directions.root(existing) != r2 {
                self.merge_directions(existing, d2, why);
            }
            return Ok(());
        }
        if let Some(existing) = self.directions.get(r2).perp {
            if self.directions.root(existing) != r1 {
                self.merge_directions(existing, d1, why);
            }
            return Ok(());
        }
        self.directions.get_mut(r1).perp = Some(r2);
        self.directions.get_mut(r2).perp = Some(r1);
        Ok(())
    }

    pub fn merge_lengths(&mut self, dest: LengthId<W>, src: LengthId<W>, why: W) {
        let Some((dest_root, src_root)) = self.lengths.merge(dest, src, why) else {
            return;
        };
        let moved: Vec<SegmentId<W>> = self.lengths.get(src_root).root_segments.iter().copied().collect();
        self.lengths.get_mut(dest_root).root_segments.extend(moved);
    }

    pub fn merge_measures(&mut self, dest: MeasureId<W>, src: MeasureId<W>, why: W) {
        let Some((dest_root, src_root)) = self.measures.merge(dest, src, why) else {
            return;
        };
        let moved: Vec<AngleId<W>> = self.measures.get(src_root).root_angles.iter().copied().collect();
        self.measures.get_mut(dest_root).root_angles.extend(moved);
        if self.measures.get(dest_root).value.is_none() {
            self.measures.get_mut(dest_root).value = self.measures.get(src_root).value;
        }
    }

    pub fn merge_fractions(&mut self, dest: FractionId<W>, src: FractionId<W>, why: W) {
        let Some((dest_root, src_root)) = self.fractions.merge(dest, src, why) else {
            return;
        };
        let moved: Vec<RatioId<W>> = self.fractions.get(src_root).root_ratios.iter().copied().collect();
        self.fractions.get_mut(dest_root).root_ratios.extend(moved);
        if self.fractions.get(dest_root).value.is_none() {
            self.fractions.get_mut(dest_root).value = self.fractions.get(src_root).value;
        }
    }

    pub fn merge_dimensions(&mut self, dest: DimensionId<W>, src: DimensionId<W>, why: W) {
        let Some((dest_root, src_root)) = self.dimensions.merge(dest, src, why) else {
            return;
        };
        let moved: Vec<TriangleId<W>> = self.dimensions.get(src_root).root_triangles.iter().copied().collect();
        self.dimensions.get_mut(dest_root).root_triangles.extend(moved);
    }

    pub fn merge_shapes(&mut self, dest: ShapeId<W>, src: ShapeId<W>, why: W) {
        let Some((dest_root, src_root)) = self.shapes.merge(dest, src, why) else {
            return;
        };
        let moved: Vec<DimensionId<W>> = self.shapes.get(src_root).root_dimensions.iter().copied().collect();
        self.shapes.get_mut(dest_root).root_dimensions.extend(moved);
    }

    // -- accessors used by the driver/DD matchers -------------------------

    pub fn point_name(&self, p: PointId<W>) -> &str {
        self.points.name(p)
    }

    pub fn root_point(&mut self, p: PointId<W>) -> PointId<W> {
        self.points.root(p)
    }

    pub fn root_line(&mut self, l: LineId<W>) -> LineId<W> {
        self.lines.root(l)
    }

    pub fn root_direction(&mut self, d: DirectionId<W>) -> DirectionId<W> {
        self.directions.root(d)
    }

    pub fn root_length(&mut self, l: LengthId<W>) -> LengthId<W> {
        self.lengths.root(l)
    }

    pub fn root_angle(&mut self, a: AngleId<W>) -> AngleId<W> {
        self.angles.root(a)
    }

    pub fn root_ratio(&mut self, r: RatioId<W>) -> RatioId<W> {
        self.ratios.root(r)
    }

    pub fn root_measure(&mut self, m: MeasureId<W>) -> MeasureId<W> {
        self.measures.root(m)
    }

    pub fn root_fraction(&mut self, f: FractionId<W>) -> FractionId<W> {
        self.fractions.root(f)
    }

    pub fn root_dimension(&mut self, d: DimensionId<W>) -> DimensionId<W> {
        self.dimensions.root(d)
    }

    pub fn root_shape(&mut self, s: ShapeId<W>) -> ShapeId<W> {
        self.shapes.root(s)
    }

    pub fn root_circle(&mut self, c: CircleId<W>) -> CircleId<W> {
        self.circles.root(c)
    }

    pub fn angle_dirs(&self, a: AngleId<W>) -> (DirectionId<W>, DirectionId<W>) {
        let data = self.angles.get(a);
        (data.dir1, data.dir2)
    }

    pub fn angle_measure(&self, a: AngleId<W>) -> Option<MeasureId<W>> {
        self.angles.get(a).measure
    }

    pub fn ratio_lens(&self, r: RatioId<W>) -> (LengthId<W>, LengthId<W>) {
        let data = self.ratios.get(r);
        (data.len1, data.len2)
    }

    pub fn ratio_fraction(&self, r: RatioId<W>) -> Option<FractionId<W>> {
        self.ratios.get(r).fraction
    }

    pub fn measure_value(&self, m: MeasureId<W>) -> Option<Frac> {
        self.measures.get(m).value
    }

    pub fn fraction_value(&self, f: FractionId<W>) -> Option<Frac> {
        self.fractions.get(f).value
    }

    pub fn direction_name(&self, d: DirectionId<W>) -> &str {
        self.directions.name(d)
    }

    pub fn length_name(&self, l: LengthId<W>) -> &str {
        self.lengths.name(l)
    }

    pub fn measure_name(&self, m: MeasureId<W>) -> &str {
        self.measures.name(m)
    }

    pub fn fraction_name(&self, f: FractionId<W>) -> &str {
        self.fractions.name(f)
    }

    pub fn line_direction(&mut self, l: LineId<W>) -> Option<DirectionId<W>> {
        let root = self.lines.root(l);
        self.lines.get(root).direction.as_ref().map(|(d, _)| *d)
    }

    /// Looks up an existing segment without creating one.
    pub fn try_get_segment(&mut self, p1: PointId<W>, p2: PointId<W>) -> Option<SegmentId<W>> {
        let key = sorted_pair(self.points.root(p1), self.points.root(p2));
        self.segment_index.get(&key).copied()
    }

    pub fn segment_length(&self, s: SegmentId<W>) -> Option<LengthId<W>> {
        self.segments.get(s).length
    }

    pub fn set_segment_length(
        &mut self,
        s: SegmentId<W>,
        length: LengthId<W>,
        why: W,
    ) -> Option<(LengthId<W>, LengthId<W>)> {
        match self.segments.get(s).length {
            None => {
                self.segments.get_mut(s).length = Some(length);
                let lr = self.lengths.root(length);
                self.lengths.get_mut(lr).root_segments.insert(s);
                None
            }
            Some(existing) => {
                if self.lengths.root(existing) == self.lengths.root(length) {
                    None
                } else {
                    self.merge_lengths(existing, length, why);
                    Some((existing, length))
                }
            }
        }
    }

    pub fn triangle_by_verts(&mut self, verts: [PointId<W>; 3]) -> Option<TriangleId<W>> {
        let mut roots: [PointId<W>; 3] = [
            self.points.root(verts[0]),
            self.points.root(verts[1]),
            self.points.root(verts[2]),
        ];
        roots.sort();
        self.triangles.keys().find(|&t| {
            let mut tv = self.triangles.get(t).verts;
            for v in tv.iter_mut() {
                *v = self.points.root(*v);
            }
            tv.sort();
            tv == roots
        })
    }

    pub fn all_points(&self) -> Vec<PointId<W>> {
        self.points.keys().collect()
    }

    pub fn all_root_lines(&mut self) -> Vec<LineId<W>> {
        let keys: Vec<LineId<W>> = self.lines.keys().collect();
        self.lines.dedup_roots(keys)
    }

    pub fn line_length(&mut self, l: LineId<W>) -> usize {
        let root = self.lines.root(l);
        self.lines.get(root).points.len()
    }

    // -- bulk accessors for the DD matchers (C8) -------------------------

    pub fn all_root_directions(&mut self) -> Vec<DirectionId<W>> {
        let keys: Vec<DirectionId<W>> = self.directions.keys().collect();
        self.directions.dedup_roots(keys)
    }

    pub fn all_root_circles(&mut self) -> Vec<CircleId<W>> {
        let keys: Vec<CircleId<W>> = self.circles.keys().collect();
        self.circles.dedup_roots(keys)
    }

    pub fn all_root_lengths(&mut self) -> Vec<LengthId<W>> {
        let keys: Vec<LengthId<W>> = self.lengths.keys().collect();
        self.lengths.dedup_roots(keys)
    }

    pub fn all_root_measures(&mut self) -> Vec<MeasureId<W>> {
        let keys: Vec<MeasureId<W>> = self.measures.keys().collect();
        self.measures.dedup_roots(keys)
    }

    pub fn all_root_fractions(&mut self) -> Vec<FractionId<W>> {
        let keys: Vec<FractionId<W>> = self.fractions.keys().collect();
        self.fractions.dedup_roots(keys)
    }

    pub fn all_root_dimensions(&mut self) -> Vec<DimensionId<W>> {
        let keys: Vec<DimensionId<W>> = self.dimensions.keys().collect();
        self.dimensions.dedup_roots(keys)
    }

    pub fn all_root_shapes(&mut self) -> Vec<ShapeId<W>> {
        let keys: Vec<ShapeId<W>> = self.shapes.keys().collect();
        self.shapes.dedup_roots(keys)
    }

    pub fn all_root_triangles(&mut self) -> Vec<TriangleId<W>> {
        let keys: Vec<TriangleId<W>> = self.triangles.keys().collect();
        self.triangles.dedup_roots(keys)
    }

    /// Root lines carrying direction `d` (§4.6.3's `root_lines` set).
    pub fn direction_lines(&mut self, d: DirectionId<W>) -> Vec<LineId<W>> {
        let root = self.directions.root(d);
        self.directions.get(root).root_lines.iter().copied().collect()
    }

    /// Points on a (root) line, in a deterministic (sorted-index) order.
    pub fn line_points(&mut self, l: LineId<W>) -> Vec<PointId<W>> {
        let root = self.lines.root(l);
        let mut pts: Vec<PointId<W>> = self.lines.get(root).points.keys().copied().collect();
        pts.sort();
        pts
    }

    /// Points on a (root) circle, in a deterministic order.
    pub fn circle_points(&mut self, c: CircleId<W>) -> Vec<PointId<W>> {
        let root = self.circles.root(c);
        let mut pts: Vec<PointId<W>> = self.circles.get(root).points.keys().copied().collect();
        pts.sort();
        pts
    }

    /// Angles sharing a (root) measure class.
    pub fn measure_angles(&mut self, m: MeasureId<W>) -> Vec<AngleId<W>> {
        let root = self.measures.root(m);
        self.measures.get(root).root_angles.iter().copied().collect()
    }

    /// Ratios sharing a (root) fraction class.
    pub fn fraction_ratios(&mut self, f: FractionId<W>) -> Vec<RatioId<W>> {
        let root = self.fractions.root(f);
        self.fractions.get(root).root_ratios.iter().copied().collect()
    }

    /// Segments sharing a (root) length class.
    pub fn length_segments(&mut self, l: LengthId<W>) -> Vec<SegmentId<W>> {
        let root = self.lengths.root(l);
        self.lengths.get(root).root_segments.iter().copied().collect()
    }

    /// Triangles sharing a (root) dimension class.
    pub fn dimension_triangles(&mut self, d: DimensionId<W>) -> Vec<TriangleId<W>> {
        let root = self.dimensions.root(d);
        self.dimensions.get(root).root_triangles.iter().copied().collect()
    }

    /// Dimensions sharing a (root) shape class.
    pub fn shape_dimensions(&mut self, s: ShapeId<W>) -> Vec<DimensionId<W>> {
        let root = self.shapes.root(s);
        self.shapes.get(root).root_dimensions.iter().copied().collect()
    }

    pub fn segment_points(&self, s: SegmentId<W>) -> (PointId<W>, PointId<W>) {
        let data = self.segments.get(s);
        (data.p1, data.p2)
    }

    pub fn triangle_verts(&self, t: TriangleId<W>) -> [PointId<W>; 3] {
        self.triangles.get(t).verts
    }

    pub fn triangle_dimension(&self, t: TriangleId<W>) -> Option<DimensionId<W>> {
        self.triangles.get(t).dimension
    }

    pub fn dimension_shape(&self, d: DimensionId<W>) -> Option<ShapeId<W>> {
        self.dimensions.get(d).shape
    }

    pub fn circle_center(&mut self, c: CircleId<W>) -> Option<PointId<W>> {
        let root = self.circles.root(c);
        self.circles.get(root).center.as_ref().map(|(p, _)| *p)
    }

    pub fn set_circle_center(&mut self, c: CircleId<W>, p: PointId<W>, why: W) {
        let root = self.circles.root(c);
        if self.circles.get(root).center.is_none() {
            self.circles.get_mut(root).center = Some((p, why));
        }
    }

    // -- fresh-node creation for predicate synthesis (C10) ----------------

    /// Finds or creates a circle through `pts`: reuses any existing root
    /// circle sharing at least 3 of them (so two known-cyclic triples merge
    /// into one circle rather than creating duplicates), else starts a new
    /// one.
    pub fn get_or_add_circle(&mut self, pts: &[PointId<W>], why: W) -> CircleId<W> {
        let roots: Vec<PointId<W>> = pts.iter().map(|&p| self.points.root(p)).collect();
        let threshold = 3.min(roots.len());
        let existing = self.circles.keys().find(|&c| {
            self.circles.is_root(c)
                && roots.iter().filter(|r| self.circles.get(c).points.contains_key(r)).count() >= threshold
        });
        let circle = existing.unwrap_or_else(|| {
            let name = format!("circle-{}", self.circles.len());
            self.circles.push(name, CircleData::default())
        });
        for &p in &roots {
            self.add_point_to_circle(circle, p, why.clone());
        }
        circle
    }

    fn add_point_to_circle(&mut self, circle: CircleId<W>, p: PointId<W>, why: W) {
        let c_root = self.circles.root(circle);
        let p_root = self.points.root(p);
        self.circles.get_mut(c_root).points.insert(p_root, why.clone());
        self.points.get_mut(p_root).on_circle.insert(c_root, why);
    }

    /// Allocates a fresh, as-yet-unconstrained direction (used when a line
    /// gains a direction for the first time during synthesis).
    pub fn new_direction(&mut self) -> DirectionId<W> {
        let name = format!("dir-{}", self.directions.len());
        self.add_direction(name)
    }

    pub fn new_length(&mut self) -> LengthId<W> {
        let name = format!("len-{}", self.lengths.len());
        self.add_length(name)
    }

    pub fn new_measure(&mut self, value: Option<Frac>) -> MeasureId<W> {
        let name = format!("meas-{}", self.measures.len());
        self.add_measure(name, value)
    }

    pub fn new_fraction(&mut self, value: Option<Frac>) -> FractionId<W> {
        let name = format!("frac-{}", self.fractions.len());
        self.add_fraction(name, value)
    }

    pub fn new_dimension(&mut self) -> DimensionId<W> {
        let name = format!("dim-{}", self.dimensions.len());
        self.dimensions.push(name, DimensionData::default())
    }

    pub fn new_shape(&mut self) -> ShapeId<W> {
        let name = format!("shape-{}", self.shapes.len());
        self.shapes.push(name, ShapeData::default())
    }

    /// A plain dump of each root point's name and the lines/circles it is
    /// on, for debugging (§2 of SPEC_FULL.md's supplemented `__print_*`).
    pub fn describe_points(&mut self) -> String {
        let mut out = String::new();
        let keys: Vec<PointId<W>> = self.points.keys().collect();
        let roots = self.points.dedup_roots(keys);
        for p in roots {
            let data = self.points.get(p);
            let lines: Vec<&str> = data.on_line.keys().map(|&l| self.lines.name(l)).collect();
            out.push_str(&format!("{}: on {} line(s)\n", self.points.name(p), lines.len()));
        }
        out
    }
}
