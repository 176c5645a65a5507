//! Incremental 3D Delaunay triangulation.
//!
//! Tetrahedra live in an arena and are addressed by [`TetHandle`]. Handles stay valid until
//! the tetrahedron they name is removed, after which the slot may be reused. A reverse index
//! from vertex to handles is kept in lockstep with the arena. Every ordering this type exposes
//! (tetrahedra, vertices, neighbours) comes from the arena or insertion order, so two
//! triangulations built by the same sequence of calls are identical.

use crate::bounds::BoundingBox;
use crate::cavity::CavityBoundary;
use crate::error::{Error, Result};
use crate::face::Face;
use crate::tetrahedron::Tetrahedron;
use crate::vector::Vec3;
use log::{debug, error, warn};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Tag carried by construction-only vertices.
pub const BOUND_TAG: &str = "bound";

/// How much larger than the link's bounding sphere the scaffold tetrahedron is when a hole
/// left by a removed vertex is re-triangulated.
const REMOVAL_SCALE: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TetHandle(u32);

impl TetHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Delaunay {
    tolerance: f64,
    check_invariants: bool,
    initialised: bool,
    tets: Vec<Option<Tetrahedron>>,
    free: Vec<TetHandle>,
    live: usize,
    vert_tets: HashMap<Vec3, Vec<TetHandle>>,
    verts: Vec<Vec3>,
    tags: HashMap<Vec3, Vec<String>>,
    bound_verts: Vec<Vec3>,
}

impl Delaunay {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            check_invariants: false,
            initialised: false,
            tets: Vec::new(),
            free: Vec::new(),
            live: 0,
            vert_tets: HashMap::new(),
            verts: Vec::new(),
            tags: HashMap::new(),
            bound_verts: Vec::new(),
        }
    }

    /// Run [`Delaunay::validate`] after every mutation, rolling back and failing on a violation.
    pub fn with_invariant_checks(mut self, check: bool) -> Self {
        self.check_invariants = check;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// The regular tetrahedron whose insphere encloses the bounding box of `points`, grown by
    /// `tolerance` on every side.
    pub fn enclosing_tet(points: &[Vec3], tolerance: f64) -> Result<[Vec3; 4]> {
        let bounds = BoundingBox::from_points(points).expanded(tolerance);
        Self::enclosing_tet_for_box(&bounds, 1.0)
    }

    /// The regular tetrahedron whose insphere is the bounding sphere of `bounds` scaled by
    /// `scale`, centred on the box.
    pub fn enclosing_tet_for_box(bounds: &BoundingBox, scale: f64) -> Result<[Vec3; 4]> {
        let radius = bounds.size().length() / 2.0 * scale;
        if bounds.is_empty() || !(radius > 0.0) || !radius.is_finite() {
            return Err(Error::DegenerateGeometry(format!(
                "cannot enclose {bounds:?} in a tetrahedron"
            )));
        }

        // inradius of a regular tetrahedron with unit edges
        let q = 1.0 / 6.0 / (2.0f64 / 3.0).sqrt();
        let h = (3.0f64 / 4.0).sqrt();
        let edge = radius / q;

        // unit tetrahedron with its centroid on the origin, base face in the plane y = -q
        let unit = [
            Vec3::new(-0.5, -q, -h / 3.0),
            Vec3::new(0.5, -q, -h / 3.0),
            Vec3::new(0.0, -q, 2.0 * h / 3.0),
            Vec3::new(0.0, (2.0f64 / 3.0).sqrt() - q, 0.0),
        ];

        let centre = bounds.centre();
        Ok(unit.map(|c| c * edge + centre))
    }

    /// Seeds the triangulation with one tetrahedron whose corners are tagged [`BOUND_TAG`].
    pub fn initialise_with_tet(&mut self, corners: [Vec3; 4]) -> Result<()> {
        if self.initialised {
            return Err(Error::AlreadyInitialised);
        }

        let [a, b, c, d] = corners;
        let tet = Tetrahedron::new(a, b, c, d);
        if !tet.valid() {
            return Err(Error::DegenerateGeometry(format!(
                "initial tetrahedron {corners:?} is flat"
            )));
        }

        self.add_tet(tet);
        for c in corners {
            self.tag_vert(c, BOUND_TAG);
        }
        self.bound_verts = corners.to_vec();
        self.initialised = true;
        Ok(())
    }

    /// Triangulates `points` inside a temporary enclosing tetrahedron, then drops every
    /// tetrahedron touching that scaffold. The result need not be convex.
    ///
    /// Points that duplicate an earlier point, or cannot be inserted, are skipped with a warning.
    pub fn initialise_with_verts(&mut self, points: &[Vec3]) -> Result<()> {
        if self.initialised {
            return Err(Error::AlreadyInitialised);
        }

        let [a, b, c, d] = Self::enclosing_tet(points, self.tolerance)?;
        let scaffold = Tetrahedron::new(a, b, c, d);
        if !scaffold.valid() {
            return Err(Error::DegenerateGeometry("enclosing tetrahedron is flat".to_string()));
        }

        let mut work = Delaunay::new(self.tolerance);
        work.add_tet(scaffold);
        work.initialised = true;

        for p in points {
            match work.add_vert(*p) {
                Ok(()) => {}
                Err(e @ (Error::DuplicateVertex(_) | Error::NotEnclosed(_) | Error::DegenerateGeometry(_))) => {
                    warn!("skipping {p:?}: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        let mut seen = HashSet::new();
        let doomed: Vec<TetHandle> = [a, b, c, d]
            .iter()
            .flat_map(|corner| work.tets_for_vert(*corner).to_vec())
            .filter(|h| seen.insert(*h))
            .collect();
        for h in doomed {
            work.remove_tet(h);
        }

        work.tags = std::mem::take(&mut self.tags);
        work.check_invariants = self.check_invariants;

        if work.check_invariants {
            if let Err(e) = work.validate() {
                self.tags = work.tags;
                return Err(e);
            }
        }

        debug!(
            "initialised with {} points: {} tetrahedra, {} vertices",
            points.len(),
            work.live,
            work.verts.len()
        );

        *self = work;
        Ok(())
    }

    /// Bowyer-Watson insertion of `v`.
    ///
    /// The cavity starts as the tetrahedra whose circumsphere contains `v` and grows until it
    /// is star-shaped around `v`. Fails without changing anything if `v` is within tolerance of
    /// an existing vertex, lies in no circumsphere or outside the hull, or the cavity would
    /// swallow a vertex.
    pub fn add_vert(&mut self, v: Vec3) -> Result<()> {
        if !self.initialised {
            return Err(Error::NotEnclosed(v));
        }
        if self.vert_tets.contains_key(&v) {
            return Err(Error::DuplicateVertex(v));
        }

        let tolerance = self.tolerance;
        let bad: Vec<TetHandle> = self
            .tets
            .par_iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(tet) if tet.sphere().contains(v, tolerance) => Some(TetHandle(i as u32)),
                _ => None,
            })
            .collect();

        if bad.is_empty() {
            return Err(Error::NotEnclosed(v));
        }

        let (bad, boundary) = self.grow_cavity(v, bad)?;

        let near = bad
            .iter()
            .filter_map(|h| self.tet(*h))
            .flat_map(|t| t.verts().iter())
            .any(|x| (*x - v).length() < tolerance);
        if near {
            return Err(Error::DuplicateVertex(v));
        }

        let mut new_tets = Vec::with_capacity(boundary.len());
        let mut kept_verts = HashSet::new();
        for tri in boundary.triangles() {
            let [a, b, c] = tri.verts;
            kept_verts.extend(tri.verts);
            new_tets.push(Tetrahedron::new(v, a, b, c));
        }

        let orphaned = bad
            .iter()
            .filter_map(|h| self.tet(*h))
            .flat_map(|t| t.verts().iter())
            .any(|x| !kept_verts.contains(x));
        if orphaned {
            return Err(Error::DegenerateGeometry(format!(
                "inserting {v:?} would swallow an existing vertex"
            )));
        }

        let backup = self.check_invariants.then(|| self.clone());

        let added = new_tets.len();
        for tet in new_tets {
            self.add_tet(tet);
        }
        for h in &bad {
            self.remove_tet(*h);
        }

        debug!("add_vert {v:?}: replaced {} tetrahedra with {added}", bad.len());

        self.finish_mutation(backup)
    }

    /// Removes an interior vertex and re-triangulates the hole it leaves.
    ///
    /// The hole is filled with the tetrahedra of a local triangulation of the vertices
    /// around it. Hull vertices cannot be removed.
    pub fn remove_vert(&mut self, v: Vec3) -> Result<()> {
        let handles = self.tets_for_vert(v).to_vec();
        if handles.is_empty() {
            return Err(Error::UnknownVertex(v));
        }

        let removed: Vec<&Tetrahedron> = handles.iter().filter_map(|h| self.tet(*h)).collect();
        let hole = CavityBoundary::from_tets(removed.iter().copied());
        if hole.triangles().any(|tri| tri.verts.contains(&v)) {
            return Err(Error::NotEnclosed(v));
        }

        let link: Vec<Vec3> = hole.verts().iter().copied().filter(|x| *x != v).collect();

        let bounds = BoundingBox::from_points(&link).expanded(self.tolerance);
        let scaffold = Self::enclosing_tet_for_box(&bounds, REMOVAL_SCALE)?;
        let mut local = Delaunay::new(self.tolerance);
        local.initialise_with_tet(scaffold)?;
        for p in &link {
            local.add_vert(*p).map_err(|e| {
                Error::DegenerateGeometry(format!("cannot re-triangulate around {v:?}: {e}"))
            })?;
        }

        let eps = self.tolerance * 1e-3;
        let fill: Vec<Tetrahedron> = local
            .tets()
            .map(|(_, tet)| tet)
            .filter(|tet| !scaffold.iter().any(|c| tet.uses_vert(*c)))
            .filter(|tet| {
                let c = tet.centroid();
                removed.iter().any(|r| r.contains_point(c, eps))
            })
            .cloned()
            .collect();

        let filled = CavityBoundary::from_tets(&fill);
        if filled.len() != hole.len() || !hole.triangles().all(|tri| filled.contains(tri)) {
            let msg = format!(
                "re-triangulated hole around {v:?} has {} faces, expected {}",
                filled.len(),
                hole.len()
            );
            error!("Delaunay invariant violated: {msg}");
            return Err(Error::InvariantViolation(msg));
        }

        let backup = self.check_invariants.then(|| self.clone());

        let added = fill.len();
        for tet in fill {
            self.add_tet(tet);
        }
        for h in &handles {
            self.remove_tet(*h);
        }
        self.tags.remove(&v);

        debug!("remove_vert {v:?}: replaced {} tetrahedra with {added}", handles.len());

        self.finish_mutation(backup)
    }

    /// Checks every tetrahedron is non-degenerate and has no vertex inside its circumsphere.
    pub fn validate(&self) -> Result<()> {
        let tolerance = self.tolerance;
        let verts = &self.verts;

        let failure = self
            .tets
            .par_iter()
            .filter_map(Option::as_ref)
            .find_map_first(|tet| {
                if !tet.valid() {
                    return Some(format!("tetrahedron {:?} is flat", tet.verts()));
                }
                verts
                    .iter()
                    .find(|v| !tet.uses_vert(**v) && tet.sphere().contains(**v, tolerance))
                    .map(|v| format!("{v:?} lies inside the circumsphere of {:?}", tet.verts()))
            });

        match failure {
            Some(msg) => {
                error!("Delaunay invariant violated: {msg}");
                Err(Error::InvariantViolation(msg))
            }
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The faces of the whole triangulation's boundary, each wound outward.
    pub fn outer_surface(&self) -> Vec<Face> {
        let boundary = CavityBoundary::from_tets(self.tets().map(|(_, tet)| tet));
        boundary
            .triangles()
            .filter_map(|tri| match Face::new(tri.verts.to_vec(), tri.normal()) {
                Ok(face) => Some(face),
                Err(e) => {
                    warn!("skipping outer face {:?}: {e}", tri.verts);
                    None
                }
            })
            .collect()
    }

    pub fn tets(&self) -> impl Iterator<Item = (TetHandle, &Tetrahedron)> {
        self.tets
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|t| (TetHandle(i as u32), t)))
    }

    pub fn tet(&self, handle: TetHandle) -> Option<&Tetrahedron> {
        self.tets.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn tet_count(&self) -> usize {
        self.live
    }

    /// Vertices of the live tetrahedra, in the order they first appeared.
    pub fn verts(&self) -> &[Vec3] {
        &self.verts
    }

    pub fn contains_vert(&self, v: Vec3) -> bool {
        self.vert_tets.contains_key(&v)
    }

    /// Tetrahedra using `v`, empty for a vertex that is not in the triangulation.
    pub fn tets_for_vert(&self, v: Vec3) -> &[TetHandle] {
        self.vert_tets.get(&v).map_or(&[], Vec::as_slice)
    }

    /// Tetrahedra using both `a` and `b`.
    pub fn tets_for_edge(&self, a: Vec3, b: Vec3) -> Vec<TetHandle> {
        self.tets_for_vert(a)
            .iter()
            .copied()
            .filter(|h| self.tet(*h).is_some_and(|t| t.uses_vert(b)))
            .collect()
    }

    /// Vertices sharing an edge with `v`.
    pub fn vert_neighbours(&self, v: Vec3) -> Vec<Vec3> {
        let mut seen = HashSet::new();
        self.tets_for_vert(v)
            .iter()
            .filter_map(|h| self.tet(*h))
            .flat_map(|t| t.verts().iter().copied())
            .filter(|x| *x != v && seen.insert(*x))
            .collect()
    }

    pub fn tag_vert(&mut self, v: Vec3, tag: impl Into<String>) {
        self.tags.entry(v).or_default().push(tag.into());
    }

    pub fn vert_tags(&self, v: Vec3) -> &[String] {
        self.tags.get(&v).map_or(&[], Vec::as_slice)
    }

    pub fn has_tag(&self, v: Vec3, tag: &str) -> bool {
        self.vert_tags(v).iter().any(|t| t == tag)
    }

    /// Corners passed to [`Delaunay::initialise_with_tet`].
    pub fn bound_verts(&self) -> &[Vec3] {
        &self.bound_verts
    }

    fn add_tet(&mut self, tet: Tetrahedron) -> TetHandle {
        let verts = *tet.verts();
        let handle = match self.free.pop() {
            Some(h) => {
                self.tets[h.index()] = Some(tet);
                h
            }
            None => {
                self.tets.push(Some(tet));
                TetHandle((self.tets.len() - 1) as u32)
            }
        };
        self.live += 1;

        for v in verts {
            self.vert_tets
                .entry(v)
                .or_insert_with(|| {
                    self.verts.push(v);
                    Vec::new()
                })
                .push(handle);
        }
        handle
    }

    fn remove_tet(&mut self, handle: TetHandle) -> Option<Tetrahedron> {
        let tet = self.tets.get_mut(handle.index())?.take()?;
        self.live -= 1;
        self.free.push(handle);

        for v in tet.verts() {
            if let Some(list) = self.vert_tets.get_mut(v) {
                list.retain(|h| *h != handle);
                if list.is_empty() {
                    self.vert_tets.remove(v);
                    self.verts.retain(|x| x != v);
                }
            }
        }
        Some(tet)
    }

    /// Grows the cavity of tetrahedra replaced by inserting `v` until every boundary face can
    /// be joined to `v`.
    ///
    /// A face is crossed when `v` is not strictly behind it, when joining it to `v` would give
    /// a flat tetrahedron, or when the vertex beyond it would lie inside the new tetrahedron's
    /// circumsphere. Only hull faces cannot be crossed.
    fn grow_cavity(&self, v: Vec3, bad: Vec<TetHandle>) -> Result<(Vec<TetHandle>, CavityBoundary)> {
        let tolerance = self.tolerance;
        let mut in_cavity: HashSet<TetHandle> = bad.iter().copied().collect();
        let mut cavity = bad;

        loop {
            let boundary = CavityBoundary::from_tets(cavity.iter().filter_map(|h| self.tet(*h)));

            let mut grown = Vec::new();
            for tri in boundary.triangles() {
                let [a, b, c] = tri.verts;
                let behind = tri.normal().dot(v - a) < 0.0;
                let joined = Tetrahedron::new(v, a, b, c);
                let across = self.tet_across(tri.verts, &in_cavity);

                let cross = !behind
                    || !joined.valid()
                    || across.is_some_and(|(_, far)| joined.sphere().contains(far, tolerance));
                if !cross {
                    continue;
                }

                match across {
                    Some((h, _)) => grown.push(h),
                    None if !behind => return Err(self.cavity_error(v, &cavity)),
                    None => {
                        return Err(Error::DegenerateGeometry(format!(
                            "inserting {v:?} would create a flat tetrahedron on the hull"
                        )));
                    }
                }
            }

            grown.retain(|h| in_cavity.insert(*h));
            if grown.is_empty() {
                return Ok((cavity, boundary));
            }
            debug!("add_vert {v:?}: cavity grown by {}", grown.len());
            cavity.extend(grown);
        }
    }

    /// The tetrahedron outside the cavity sharing face `tri`, with its vertex opposite that face.
    fn tet_across(&self, tri: [Vec3; 3], in_cavity: &HashSet<TetHandle>) -> Option<(TetHandle, Vec3)> {
        let [a, b, c] = tri;
        self.tets_for_vert(a).iter().find_map(|h| {
            let tet = self.tet(*h)?;
            if in_cavity.contains(h) || !tet.uses_vert(b) || !tet.uses_vert(c) {
                return None;
            }
            let far = tet.verts().iter().copied().find(|x| !tri.contains(x))?;
            Some((*h, far))
        })
    }

    fn cavity_error(&self, v: Vec3, bad: &[TetHandle]) -> Error {
        let inside = bad
            .iter()
            .filter_map(|h| self.tet(*h))
            .any(|t| t.contains_point(v, 0.0));
        if inside {
            Error::DegenerateGeometry(format!("cavity around {v:?} is not star-shaped"))
        } else {
            Error::NotEnclosed(v)
        }
    }

    fn finish_mutation(&mut self, backup: Option<Delaunay>) -> Result<()> {
        if let Some(backup) = backup {
            if let Err(e) = self.validate() {
                *self = backup;
                return Err(e);
            }
        }
        Ok(())
    }
}
