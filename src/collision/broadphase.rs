use std::collections::BTreeSet;

use crate::{
    core::{
        rigidbody::RigidBody,
        types::{Aabb, BodyId},
    },
    utils::allocator::Arena,
};

#[derive(Debug)]
enum QuadtreeNode {
    Leaf { entries: Vec<(BodyId, Aabb)> },
    Internal { children: Box<[QuadtreeNode; 4]> },
}

impl QuadtreeNode {
    fn empty_leaf() -> Self {
        QuadtreeNode::Leaf {
            entries: Vec::new(),
        }
    }
}

/// Region quadtree over body bounding boxes.
///
/// A box straddling a split is registered in every quadrant it touches, so two
/// overlapping boxes always share at least one leaf. The tree shape depends
/// only on the set of boxes, never on insertion order.
#[derive(Debug)]
pub struct Quadtree {
    root: QuadtreeNode,
    bounds: Aabb,
    capacity: usize,
    max_depth: usize,
    len: usize,
}

impl Quadtree {
    pub fn new(bounds: Aabb, capacity: usize, max_depth: usize) -> Self {
        Self {
            root: QuadtreeNode::empty_leaf(),
            bounds,
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of distinct boxes inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every entry and re-roots the tree at `bounds`.
    pub fn reset(&mut self, bounds: Aabb) {
        self.root = QuadtreeNode::empty_leaf();
        self.bounds = bounds;
        self.len = 0;
    }

    /// Returns `false` if the box lies entirely outside the root region.
    pub fn insert(&mut self, id: BodyId, aabb: Aabb) -> bool {
        if !self.bounds.intersects(&aabb) {
            return false;
        }
        Self::insert_recursive(
            &mut self.root,
            self.bounds,
            (id, aabb),
            0,
            self.max_depth,
            self.capacity,
        );
        self.len += 1;
        true
    }

    fn insert_recursive(
        node: &mut QuadtreeNode,
        bounds: Aabb,
        entry: (BodyId, Aabb),
        depth: usize,
        max_depth: usize,
        capacity: usize,
    ) {
        match node {
            QuadtreeNode::Leaf { entries } => {
                entries.push(entry);

                if entries.len() > capacity && depth < max_depth {
                    let quadrants = bounds.quadrants();
                    let old_entries = std::mem::take(entries);
                    let mut children: [QuadtreeNode; 4] = [
                        QuadtreeNode::empty_leaf(),
                        QuadtreeNode::empty_leaf(),
                        QuadtreeNode::empty_leaf(),
                        QuadtreeNode::empty_leaf(),
                    ];

                    for e in old_entries {
                        for (i, quadrant) in quadrants.iter().enumerate() {
                            if quadrant.intersects(&e.1) {
                                Self::insert_recursive(
                                    &mut children[i],
                                    *quadrant,
                                    e,
                                    depth + 1,
                                    max_depth,
                                    capacity,
                                );
                            }
                        }
                    }

                    *node = QuadtreeNode::Internal {
                        children: Box::new(children),
                    };
                }
            }
            QuadtreeNode::Internal { children } => {
                let quadrants = bounds.quadrants();
                for (i, quadrant) in quadrants.iter().enumerate() {
                    if quadrant.intersects(&entry.1) {
                        Self::insert_recursive(
                            &mut children[i],
                            *quadrant,
                            entry,
                            depth + 1,
                            max_depth,
                            capacity,
                        );
                    }
                }
            }
        }
    }

    /// Ids whose boxes share a leaf with `region` and overlap it.
    ///
    /// Sorted and free of duplicates. Box overlap is coarser than the shapes,
    /// so callers still run an exact test.
    pub fn query(&self, region: &Aabb) -> Vec<BodyId> {
        let mut results = Vec::new();
        Self::query_recursive(&self.root, self.bounds, region, &mut results);
        results.sort();
        results.dedup();
        results
    }

    fn query_recursive(node: &QuadtreeNode, bounds: Aabb, region: &Aabb, results: &mut Vec<BodyId>) {
        if !bounds.intersects(region) {
            return;
        }

        match node {
            QuadtreeNode::Leaf { entries } => {
                results.extend(
                    entries
                        .iter()
                        .filter(|(_, aabb)| aabb.intersects(region))
                        .map(|(id, _)| *id),
                );
            }
            QuadtreeNode::Internal { children } => {
                let quadrants = bounds.quadrants();
                for (i, child) in children.iter().enumerate() {
                    Self::query_recursive(child, quadrants[i], region, results);
                }
            }
        }
    }

    /// Deepest level reached by any leaf.
    pub fn depth(&self) -> usize {
        fn walk(node: &QuadtreeNode) -> usize {
            match node {
                QuadtreeNode::Leaf { .. } => 0,
                QuadtreeNode::Internal { children } => 1 + children.iter().map(walk).max().unwrap_or(0),
            }
        }
        walk(&self.root)
    }
}

/// Candidate pair discovery, through the quadtree or exhaustively.
#[derive(Debug)]
pub struct BroadPhase {
    tree: Quadtree,
}

impl BroadPhase {
    pub fn new(canvas: Aabb, capacity: usize, max_depth: usize) -> Self {
        Self {
            tree: Quadtree::new(canvas, capacity, max_depth),
        }
    }

    pub fn tree(&self) -> &Quadtree {
        &self.tree
    }

    /// Rebuilds the index from scratch over every collidable body.
    ///
    /// The root covers the canvas and grows to include bodies that have left it.
    pub fn build(&mut self, bodies: &Arena<RigidBody>, canvas: Aabb) {
        let boxes: Vec<(BodyId, Aabb)> = collidable(bodies).map(|b| (b.id(), b.aabb())).collect();
        let root = boxes.iter().fold(canvas, |acc, (_, aabb)| acc.union(aabb));
        self.tree.reset(root);
        for (id, aabb) in boxes {
            self.tree.insert(id, aabb);
        }
    }

    pub fn query(&self, region: &Aabb) -> Vec<BodyId> {
        self.tree.query(region)
    }

    /// Unordered candidate pairs from the last build, as `(lower, higher)` ids in ascending order.
    pub fn candidate_pairs(&self, bodies: &Arena<RigidBody>) -> Vec<(BodyId, BodyId)> {
        let mut pairs = BTreeSet::new();
        for body in collidable(bodies) {
            let id = body.id();
            for other in self.tree.query(&body.aabb()) {
                if other != id {
                    pairs.insert(if id < other { (id, other) } else { (other, id) });
                }
            }
        }
        pairs.into_iter().collect()
    }

    /// Every pair of collidable bodies, in ascending id order.
    pub fn all_pairs(bodies: &Arena<RigidBody>) -> Vec<(BodyId, BodyId)> {
        let ids: Vec<BodyId> = collidable(bodies).map(RigidBody::id).collect();
        let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                pairs.push((*a, *b));
            }
        }
        pairs
    }
}

fn collidable(bodies: &Arena<RigidBody>) -> impl Iterator<Item = &RigidBody> + '_ {
    bodies
        .values()
        .filter(|body| body.is_collidable() && !body.is_destroyed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::EntityId;
    use glam::Vec2;

    fn boxed(x: f32, y: f32, size: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(x + size, y + size))
    }

    #[test]
    fn splits_past_capacity_and_registers_straddlers_everywhere() {
        let mut tree = Quadtree::new(boxed(0.0, 0.0, 100.0), 2, 4);
        for i in 0..3 {
            tree.insert(EntityId::new(i, 0), boxed(5.0 + i as f32, 5.0, 2.0));
        }
        let straddler = EntityId::new(9, 0);
        tree.insert(straddler, boxed(45.0, 45.0, 10.0));
        assert!(tree.depth() >= 1);

        // One probe per quadrant the straddler reaches into.
        for probe in [
            boxed(40.0, 40.0, 8.0),
            boxed(52.0, 40.0, 8.0),
            boxed(40.0, 52.0, 8.0),
            boxed(52.0, 52.0, 8.0),
        ] {
            assert!(tree.query(&probe).contains(&straddler));
        }
    }

    #[test]
    fn query_ignores_far_boxes() {
        let mut tree = Quadtree::new(boxed(0.0, 0.0, 100.0), 1, 6);
        tree.insert(EntityId::new(0, 0), boxed(1.0, 1.0, 2.0));
        tree.insert(EntityId::new(1, 0), boxed(90.0, 90.0, 2.0));
        let hits = tree.query(&boxed(0.0, 0.0, 10.0));
        assert_eq!(hits, vec![EntityId::new(0, 0)]);
    }

    #[test]
    fn depth_is_bounded() {
        let mut tree = Quadtree::new(boxed(0.0, 0.0, 100.0), 1, 3);
        for i in 0..50 {
            tree.insert(EntityId::new(i, 0), boxed(10.0, 10.0, 1.0));
        }
        assert!(tree.depth() <= 3);
        assert_eq!(tree.query(&boxed(10.0, 10.0, 1.0)).len(), 50);
    }

    #[test]
    fn rejects_boxes_outside_root() {
        let mut tree = Quadtree::new(boxed(0.0, 0.0, 10.0), 4, 4);
        assert!(!tree.insert(EntityId::new(0, 0), boxed(50.0, 50.0, 1.0)));
        assert!(tree.is_empty());
    }
}
