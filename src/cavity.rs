use crate::tetrahedron::{Tetrahedron, Triangle};
use crate::vector::Vec3;
use std::collections::HashMap;

/// Order-independent identity of a triangle: its vertex indices, sorted.
type TriKey = [usize; 3];

/// Boundary of a union of tetrahedra.
///
/// Every face of every added tetrahedron is toggled into the set: a face seen once is on the
/// boundary, a face seen a second time is shared by two tetrahedra and drops out. Surviving
/// triangles keep the outward winding of the tetrahedron they came from, so they face out of
/// the union, and are reported in the order they were first added.
#[derive(Debug, Default)]
pub struct CavityBoundary {
    verts: Vec<Vec3>,
    vert_index: HashMap<Vec3, usize>,
    slots: Vec<Option<(TriKey, Triangle)>>,
    lookup: HashMap<TriKey, usize>,
    live: usize,
}

impl CavityBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tets<'a>(tets: impl IntoIterator<Item = &'a Tetrahedron>) -> Self {
        let mut ret = Self::new();
        for tet in tets {
            ret.add_tet(tet);
        }
        ret
    }

    pub fn add_tet(&mut self, tet: &Tetrahedron) {
        for tri in tet.triangles() {
            self.toggle(tri);
        }
    }

    /// Adds `tri` if it is not present, otherwise removes it.
    pub fn toggle(&mut self, tri: Triangle) {
        let key = self.key_for(&tri);

        match self.lookup.remove(&key) {
            Some(slot) => {
                self.slots[slot] = None;
                self.live -= 1;
            }
            None => {
                self.lookup.insert(key, self.slots.len());
                self.slots.push(Some((key, tri)));
                self.live += 1;
            }
        }
    }

    pub fn contains(&self, tri: &Triangle) -> bool {
        let mut key = [0; 3];
        for (k, v) in key.iter_mut().zip(tri.verts.iter()) {
            match self.vert_index.get(v) {
                Some(&i) => *k = i,
                None => return false,
            }
        }
        key.sort_unstable();
        self.lookup.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.slots.iter().flatten().map(|(_, tri)| tri)
    }

    /// Every vertex seen so far, including those of faces that have since dropped out.
    pub fn verts(&self) -> &[Vec3] {
        &self.verts
    }

    fn key_for(&mut self, tri: &Triangle) -> TriKey {
        let mut key = [0; 3];
        for (k, v) in key.iter_mut().zip(tri.verts.iter()) {
            *k = self.add_find_vert(*v);
        }
        key.sort_unstable();
        key
    }

    fn add_find_vert(&mut self, v: Vec3) -> usize {
        if let Some(&idx) = self.vert_index.get(&v) {
            return idx;
        }
        let idx = self.verts.len();
        self.verts.push(v);
        self.vert_index.insert(v, idx);
        idx
    }
}
