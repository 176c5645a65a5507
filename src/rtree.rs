//! Arena-backed R-tree.
//!
//! Nodes live in a `Vec` and refer to each other by index, so parent back-references do not
//! need shared ownership. Level 0 nodes are leaves holding exactly one item; every internal node
//! sits one level above its children, which keeps all leaves at the same depth.

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::vector::Vec3;

pub const MAX_CHILDREN: usize = 7;
pub const MIN_CHILDREN: usize = (MAX_CHILDREN + 1) / 2;

/// Anything that can report an axis-aligned extent.
pub trait Bounded {
    fn bounds(&self) -> BoundingBox;
}

impl Bounded for Vec3 {
    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_point(*self)
    }
}

impl Bounded for BoundingBox {
    fn bounds(&self) -> BoundingBox {
        *self
    }
}

type NodeId = usize;

#[derive(Clone, Debug)]
struct Node<T> {
    level: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    item: Option<T>,
    bounds: BoundingBox,
    dirty: bool,
}

impl<T> Node<T> {
    fn internal(level: usize) -> Self {
        Self {
            level,
            parent: None,
            children: Vec::with_capacity(MAX_CHILDREN + 1),
            item: None,
            bounds: BoundingBox::EMPTY,
            dirty: true,
        }
    }

    fn leaf(item: T, bounds: BoundingBox) -> Self {
        Self {
            level: 0,
            parent: None,
            children: Vec::new(),
            item: Some(item),
            bounds,
            dirty: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RTree<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    count: usize,
}

impl<T> Default for RTree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            count: 0,
        }
    }
}

impl<T: Bounded + PartialEq> RTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Union of all item bounds, [`BoundingBox::EMPTY`] for an empty tree.
    pub fn bounds(&self) -> BoundingBox {
        match self.root {
            Some(r) => self.nodes[r].bounds,
            None => BoundingBox::EMPTY,
        }
    }

    /// Number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.root.map_or(0, |r| self.nodes[r].level)
    }

    pub fn insert(&mut self, item: T) {
        let bounds = item.bounds();
        let leaf = self.alloc(Node::leaf(item, bounds));
        self.count += 1;
        self.insert_node(leaf);
        self.clean_root();
    }

    /// Removes one item equal to `item`, returning false if there is none.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(leaf) = self.find_leaf(item) else {
            return false;
        };

        let parent = self.nodes[leaf].parent;
        if let Some(p) = parent {
            self.detach(p, leaf);
        }
        self.release(leaf);
        self.count -= 1;

        if let Some(p) = parent {
            self.condense(p);
        }

        if self.count == 0 {
            self.clear();
        } else {
            self.clean_root();
        }
        true
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.count = 0;
    }

    /// Items whose bounds overlap `query`, touching included.
    pub fn search(&self, query: BoundingBox) -> Search<'_, T> {
        Search {
            tree: self,
            stack: self.root.into_iter().collect(),
            query,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().filter_map(|n| n.item.as_ref())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks fanout, levels, parent links, cached bounds and the item count.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            return if self.count == 0 {
                Ok(())
            } else {
                Err(violation(format!("no root but count is {}", self.count)))
            };
        };

        if self.nodes[root].parent.is_some() {
            return Err(violation("root has a parent".to_string()));
        }
        if self.nodes[root].level == 0 {
            return Err(violation("root is a leaf".to_string()));
        }

        let mut leaves = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];

            if node.dirty {
                return Err(violation(format!("node {id} has stale bounds")));
            }

            if node.level == 0 {
                let Some(item) = &node.item else {
                    return Err(violation(format!("leaf {id} has no item")));
                };
                if !node.children.is_empty() {
                    return Err(violation(format!("leaf {id} has children")));
                }
                if node.bounds != item.bounds() {
                    return Err(violation(format!("leaf {id} bounds differ from its item")));
                }
                leaves += 1;
                continue;
            }

            if node.item.is_some() {
                return Err(violation(format!("internal node {id} holds an item")));
            }

            let n = node.children.len();
            let min = if id == root {
                if node.level > 1 { 2 } else { 0 }
            } else {
                MIN_CHILDREN
            };
            if n < min || n > MAX_CHILDREN {
                return Err(violation(format!(
                    "node {id} at level {} has {n} children",
                    node.level
                )));
            }

            let mut union = BoundingBox::EMPTY;
            for &c in &node.children {
                let child = &self.nodes[c];
                if child.parent != Some(id) {
                    return Err(violation(format!("node {c} does not point back to {id}")));
                }
                if child.level + 1 != node.level {
                    return Err(violation(format!(
                        "node {c} at level {} under level {}",
                        child.level, node.level
                    )));
                }
                union = union.union(&child.bounds);
                stack.push(c);
            }

            if union != node.bounds {
                return Err(violation(format!("node {id} bounds differ from its children")));
            }
        }

        if leaves != self.count {
            return Err(violation(format!("found {leaves} items, count is {}", self.count)));
        }

        Ok(())
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id] = Node::internal(0);
        self.nodes[id].dirty = false;
        self.free.push(id);
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.mark_dirty(parent);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent].children;
        if let Some(pos) = children.iter().position(|&c| c == child) {
            children.remove(pos);
        }
        self.nodes[child].parent = None;
        self.mark_dirty(parent);
    }

    // a dirty node always has dirty ancestors, so the walk can stop at the first one
    fn mark_dirty(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if self.nodes[c].dirty && c != id {
                break;
            }
            self.nodes[c].dirty = true;
            cur = self.nodes[c].parent;
        }
    }

    fn node_bounds(&mut self, id: NodeId) -> BoundingBox {
        if !self.nodes[id].dirty {
            return self.nodes[id].bounds;
        }
        let mut b = BoundingBox::EMPTY;
        for i in 0..self.nodes[id].children.len() {
            let c = self.nodes[id].children[i];
            b = b.union(&self.node_bounds(c));
        }
        let node = &mut self.nodes[id];
        node.bounds = b;
        node.dirty = false;
        b
    }

    fn clean_root(&mut self) {
        if let Some(r) = self.root {
            self.node_bounds(r);
        }
    }

    /// Places a detached node (a new leaf, or an orphaned subtree) back at its own level.
    fn insert_node(&mut self, id: NodeId) {
        let level = self.nodes[id].level;
        let bounds = self.node_bounds(id);

        let root = match self.root {
            Some(r) => r,
            None => {
                let r = self.alloc(Node::internal(level + 1));
                self.root = Some(r);
                r
            }
        };
        debug_assert!(self.nodes[root].level > level, "reinserting above the root");

        let target = self.choose_node(root, level + 1, &bounds);
        self.attach(target, id);
        self.split_upwards(target);
    }

    fn choose_node(&mut self, start: NodeId, target_level: usize, bounds: &BoundingBox) -> NodeId {
        let mut id = start;
        while self.nodes[id].level > target_level {
            let mut best: Option<(f64, f64, f64, NodeId)> = None;
            for i in 0..self.nodes[id].children.len() {
                let c = self.nodes[id].children[i];
                let cb = self.node_bounds(c);
                let grown = cb.union(bounds);
                let score = (
                    grown.volume() - cb.volume(),
                    grown.volume(),
                    grown.margin() - cb.margin(),
                    c,
                );
                let better = match best {
                    None => true,
                    Some(b) => (score.0, score.1, score.2) < (b.0, b.1, b.2),
                };
                if better {
                    best = Some(score);
                }
            }
            match best {
                Some((.., c)) => id = c,
                None => break,
            }
        }
        id
    }

    fn split_upwards(&mut self, start: NodeId) {
        let mut id = start;
        while self.nodes[id].children.len() > MAX_CHILDREN {
            let sibling = self.split(id);
            match self.nodes[id].parent {
                Some(p) => {
                    self.attach(p, sibling);
                    id = p;
                }
                None => {
                    let root = self.alloc(Node::internal(self.nodes[id].level + 1));
                    self.attach(root, id);
                    self.attach(root, sibling);
                    self.root = Some(root);
                    break;
                }
            }
        }
    }

    /// Moves roughly half the children of `id` into a new sibling node, which is returned
    /// unattached.
    fn split(&mut self, id: NodeId) -> NodeId {
        let children = std::mem::take(&mut self.nodes[id].children);
        let boxes: Vec<BoundingBox> = children.iter().map(|&c| self.node_bounds(c)).collect();
        let (s1, s2) = pick_seeds(&boxes);

        let mut groups = [vec![s1], vec![s2]];
        let mut group_bounds = [boxes[s1], boxes[s2]];
        let rest: Vec<usize> = (0..boxes.len()).filter(|&i| i != s1 && i != s2).collect();

        for (k, &i) in rest.iter().enumerate() {
            let remaining = rest.len() - k;
            let g = if groups[0].len() + remaining <= MIN_CHILDREN {
                0
            } else if groups[1].len() + remaining <= MIN_CHILDREN {
                1
            } else {
                let grow = |g: usize| {
                    let u = group_bounds[g].union(&boxes[i]);
                    (u.volume() - group_bounds[g].volume(), u.volume(), u.margin() - group_bounds[g].margin())
                };
                let (a, b) = (grow(0), grow(1));
                if b < a || (b == a && groups[1].len() < groups[0].len()) { 1 } else { 0 }
            };
            groups[g].push(i);
            group_bounds[g] = group_bounds[g].union(&boxes[i]);
        }

        let level = self.nodes[id].level;
        let sibling = self.alloc(Node::internal(level));
        for &i in &groups[0] {
            self.attach(id, children[i]);
        }
        for &i in &groups[1] {
            self.attach(sibling, children[i]);
        }
        sibling
    }

    fn find_leaf(&self, item: &T) -> Option<NodeId> {
        let query = item.bounds();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.bounds.overlaps(&query) {
                continue;
            }
            if node.item.as_ref() == Some(item) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Walks from `start` to the root detaching underfull nodes, then reinserts their children
    /// at their own levels and drops redundant root levels.
    fn condense(&mut self, start: NodeId) {
        let mut orphans = Vec::new();
        let mut id = start;
        while let Some(p) = self.nodes[id].parent {
            if self.nodes[id].children.len() < MIN_CHILDREN {
                self.detach(p, id);
                let children = std::mem::take(&mut self.nodes[id].children);
                for c in children {
                    self.nodes[c].parent = None;
                    orphans.push(c);
                }
                self.release(id);
            }
            id = p;
        }

        for orphan in orphans {
            self.insert_node(orphan);
        }

        while let Some(r) = self.root {
            let node = &self.nodes[r];
            if node.level <= 1 || node.children.len() != 1 {
                break;
            }
            let child = node.children[0];
            self.nodes[child].parent = None;
            self.release(r);
            self.root = Some(child);
        }
    }
}

/// Iterator over the items overlapping a query box, produced by [`RTree::search`].
pub struct Search<'a, T> {
    tree: &'a RTree<T>,
    stack: Vec<NodeId>,
    query: BoundingBox,
}

impl<'a, T> Iterator for Search<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while let Some(id) = self.stack.pop() {
            let node = &self.tree.nodes[id];
            if !node.bounds.overlaps(&self.query) {
                continue;
            }
            if let Some(item) = &node.item {
                return Some(item);
            }
            self.stack.extend(node.children.iter().rev());
        }
        None
    }
}

/// The two boxes furthest apart along the axis where they are most separated relative to the
/// spread of the whole set.
fn pick_seeds(boxes: &[BoundingBox]) -> (usize, usize) {
    let mut best: Option<(f64, usize, usize)> = None;

    for axis in 0..3 {
        let lo = |b: &BoundingBox| b.min.to_array()[axis];
        let hi = |b: &BoundingBox| b.max.to_array()[axis];

        let mut highest_min = 0;
        let mut lowest_max = 0;
        let mut spread_lo = f64::INFINITY;
        let mut spread_hi = f64::NEG_INFINITY;
        for (i, b) in boxes.iter().enumerate() {
            if lo(b) > lo(&boxes[highest_min]) {
                highest_min = i;
            }
            if hi(b) < hi(&boxes[lowest_max]) {
                lowest_max = i;
            }
            spread_lo = spread_lo.min(lo(b));
            spread_hi = spread_hi.max(hi(b));
        }

        if highest_min == lowest_max {
            continue;
        }

        let width = spread_hi - spread_lo;
        let separation = lo(&boxes[highest_min]) - hi(&boxes[lowest_max]);
        let normalised = if width > 0.0 { separation / width } else { separation };

        if best.is_none_or(|(s, ..)| normalised > s) {
            best = Some((normalised, lowest_max, highest_min));
        }
    }

    match best {
        Some((_, a, b)) => (a, b),
        None => (0, 1),
    }
}

fn violation(msg: String) -> Error {
    log::error!("R-tree invariant violated: {msg}");
    Error::InvariantViolation(msg)
}
