//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree over the bounding boxes of the items it owns. Each level
//! partitions its range around the median lower bound on one axis, cycling
//! x, y, z with depth. Nodes live in a flat arena and reference items by
//! index, so the finished tree is immutable and shared across render threads
//! without locks.

use crate::{Aabb, HitRecord, Hittable, Interval, Ray};

/// BVH node - either a branch with two children or a leaf with one item.
#[derive(Debug, Clone, Copy)]
enum BvhNode {
    /// Internal node; children are arena indices.
    Branch { left: usize, right: usize, bbox: Aabb },
    /// Leaf holding the index of one item.
    Leaf { item: usize, bbox: Aabb },
}

impl BvhNode {
    fn bbox(&self) -> Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => *bbox,
        }
    }
}

/// A BVH that owns its items.
pub struct Bvh<P: Hittable> {
    items: Vec<P>,
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl<P: Hittable> Bvh<P> {
    /// Build the hierarchy. An empty item list gives a tree without a root
    /// that never reports a hit.
    pub fn new(items: Vec<P>) -> Self {
        let boxes: Vec<Aabb> = items.iter().map(|item| item.bounding_box()).collect();
        let mut order: Vec<usize> = (0..items.len()).collect();
        let mut nodes = Vec::with_capacity(items.len().saturating_mul(2));

        let root = if order.is_empty() {
            None
        } else {
            Some(Self::build(&mut nodes, &boxes, &mut order, 0))
        };

        Self { items, nodes, root }
    }

    /// Recursive median split. Returns the arena index of the new node.
    fn build(nodes: &mut Vec<BvhNode>, boxes: &[Aabb], order: &mut [usize], axis: usize) -> usize {
        if let [item] = *order {
            nodes.push(BvhNode::Leaf {
                item,
                bbox: boxes[item],
            });
            return nodes.len() - 1;
        }

        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            let a_min = boxes[a].axis_interval(axis).min;
            let b_min = boxes[b].axis_interval(axis).min;
            a_min.total_cmp(&b_min)
        });

        let next_axis = (axis + 1) % 3;
        let (lower, upper) = order.split_at_mut(mid);
        let left = Self::build(nodes, boxes, lower, next_axis);
        let right = Self::build(nodes, boxes, upper, next_axis);
        let bbox = Aabb::surrounding(&nodes[left].bbox(), &nodes[right].bbox());

        nodes.push(BvhNode::Branch { left, right, bbox });
        nodes.len() - 1
    }

    pub fn items(&self) -> &[P] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of levels from the root down to the deepest leaf.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[BvhNode], node: usize) -> usize {
            match nodes[node] {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Branch { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        self.root.map_or(0, |root| walk(&self.nodes, root))
    }

    /// Closest hit together with the index of the item that produced it.
    pub fn hit_item<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<(usize, HitRecord<'a>)> {
        self.root.and_then(|root| self.hit_node(root, ray, ray_t))
    }

    fn hit_node<'a>(&'a self, node: usize, ray: &Ray, ray_t: Interval) -> Option<(usize, HitRecord<'a>)> {
        match self.nodes[node] {
            BvhNode::Leaf { item, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                self.items[item]
                    .hit(ray, ray_t)
                    .filter(|rec| rec.t.is_finite())
                    .map(|rec| (item, rec))
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = self.hit_node(left, ray, ray_t);

                // Only check right up to closest hit
                let right_max = hit_left.as_ref().map_or(ray_t.max, |(_, rec)| rec.t);
                let hit_right = self.hit_node(right, ray, Interval::new(ray_t.min, right_max));

                hit_right.or(hit_left)
            }
        }
    }
}

impl<P: Hittable> Hittable for Bvh<P> {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        self.hit_item(ray, ray_t).map(|(_, rec)| rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.root.map_or(Aabb::EMPTY, |root| self.nodes[root].bbox())
    }
}
