//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in one contiguous arena and refer to each other by index,
//! leaves refer to a range of a reordered primitive index list. Built once
//! per `init` and read-only afterwards, so every worker can traverse it
//! without synchronization.

use atrous_core::Primitive;
use atrous_math::{Aabb, Interval, Ray};
use std::cmp::Ordering;

use crate::intersect::{intersect_shape, Intersection, T_MIN};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Traversal stack depth; median splits keep the tree far shallower.
const STACK_SIZE: usize = 64;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy)]
enum BvhNode {
    Branch { bbox: Aabb, left: u32, right: u32 },
    Leaf { bbox: Aabb, start: u32, count: u32 },
}

impl BvhNode {
    fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Flattened BVH over the scene's primitives.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<usize>,
}

impl Bvh {
    /// Build a BVH from a list of primitives.
    ///
    /// Simple median-split approach: sort by centroid on the longest centroid
    /// axis, split in half, recurse.
    pub fn build(primitives: &[Primitive]) -> Self {
        let boxes: Vec<Aabb> = primitives.iter().map(|p| p.shape.bounding_box()).collect();
        let mut indices: Vec<usize> = (0..primitives.len()).collect();
        let mut nodes = Vec::with_capacity(2 * primitives.len().div_ceil(LEAF_MAX_SIZE));

        if !indices.is_empty() {
            build_node(&boxes, &mut indices, 0, &mut nodes);
        }

        Self { nodes, indices }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest hit along `ray`, or `None` on a miss.
    ///
    /// Ties in `t` go to the lowest primitive index.
    pub fn intersect(&self, primitives: &[Primitive], ray: &Ray) -> Option<Intersection> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut closest = f32::INFINITY;
        let mut best = None;

        let mut stack = [0u32; STACK_SIZE];
        let mut stack_len = 1;

        while stack_len > 0 {
            stack_len -= 1;
            let node = &self.nodes[stack[stack_len] as usize];
            let ray_t = Interval::new(T_MIN, closest);

            if node.bbox().hit(ray, ray_t).is_none() {
                continue;
            }

            match *node {
                BvhNode::Leaf { start, count, .. } => {
                    let range = start as usize..(start + count) as usize;
                    for &index in &self.indices[range] {
                        let primitive = &primitives[index];
                        let Some(hit) = intersect_shape(&primitive.shape, ray, ray_t) else {
                            continue;
                        };

                        let better = match &best {
                            None => true,
                            Some(current) => is_closer(hit.t, index, current),
                        };
                        if better {
                            closest = hit.t;
                            best = Some(Intersection::new(ray, hit, index, primitive.material));
                        }
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    debug_assert!(stack_len + 2 <= STACK_SIZE);
                    stack[stack_len] = right;
                    stack[stack_len + 1] = left;
                    stack_len += 2;
                }
            }
        }

        best
    }
}

#[inline]
fn is_closer(t: f32, primitive: usize, current: &Intersection) -> bool {
    t < current.t || (t == current.t && primitive < current.primitive)
}

fn centroid_on(bbox: &Aabb, axis: usize) -> f32 {
    bbox.centroid()[axis]
}

/// Recursive construction; returns the index of the created node.
fn build_node(boxes: &[Aabb], indices: &mut [usize], offset: usize, nodes: &mut Vec<BvhNode>) -> u32 {
    let bbox = indices
        .iter()
        .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &boxes[i]));
    let node_index = nodes.len() as u32;

    if indices.len() <= LEAF_MAX_SIZE {
        nodes.push(BvhNode::Leaf {
            bbox,
            start: offset as u32,
            count: indices.len() as u32,
        });
        return node_index;
    }

    let centroid_bounds = indices
        .iter()
        .fold(Aabb::EMPTY, |acc, &i| acc.include_point(boxes[i].centroid()));
    let axis = centroid_bounds.longest_axis();

    indices.sort_unstable_by(|&a, &b| {
        centroid_on(&boxes[a], axis)
            .partial_cmp(&centroid_on(&boxes[b], axis))
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    // Reserve the slot, children are appended after it
    nodes.push(BvhNode::Leaf {
        bbox,
        start: 0,
        count: 0,
    });

    let mid = indices.len() / 2;
    let (left_indices, right_indices) = indices.split_at_mut(mid);
    let left = build_node(boxes, left_indices, offset, nodes);
    let right = build_node(boxes, right_indices, offset + mid, nodes);

    nodes[node_index as usize] = BvhNode::Branch { bbox, left, right };
    node_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrous_core::{MaterialId, Shape};
    use atrous_math::Vec3;

    fn sphere(center: Vec3, radius: f32, material: usize) -> Primitive {
        Primitive {
            shape: Shape::sphere(center, radius),
            material: MaterialId(material),
        }
    }

    /// Reference: test every primitive in order.
    fn brute_force(primitives: &[Primitive], ray: &Ray) -> Option<(f32, usize)> {
        let mut best: Option<(f32, usize)> = None;
        for (index, p) in primitives.iter().enumerate() {
            if let Some(hit) = intersect_shape(&p.shape, ray, Interval::new(T_MIN, f32::INFINITY)) {
                if best.map_or(true, |(t, _)| hit.t < t) {
                    best = Some((hit.t, index));
                }
            }
        }
        best
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());
        assert!(bvh.intersect(&[], &Ray::new(Vec3::ZERO, Vec3::X)).is_none());
    }

    #[test]
    fn test_bvh_single_sphere() {
        let prims = vec![sphere(Vec3::new(0.0, 0.0, -1.0), 0.5, 0)];
        let bvh = Bvh::build(&prims);
        assert_eq!(bvh.node_count(), 1);

        let hit = bvh.intersect(&prims, &Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
        assert_eq!(hit.primitive, 0);
        assert!((hit.t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_matches_brute_force() {
        let prims: Vec<Primitive> = (0..40)
            .map(|i| {
                let x = (i % 8) as f32 * 1.5 - 6.0;
                let y = (i / 8) as f32 * 1.5 - 3.0;
                let z = -5.0 - (i % 3) as f32;
                sphere(Vec3::new(x, y, z), 0.6, i)
            })
            .collect();
        let bvh = Bvh::build(&prims);
        assert!(bvh.node_count() > 1);

        for sx in -10..=10 {
            for sy in -6..=6 {
                let dir = Vec3::new(sx as f32 * 0.06, sy as f32 * 0.06, -1.0).normalize();
                let ray = Ray::new(Vec3::ZERO, dir);
                let expected = brute_force(&prims, &ray);
                let actual = bvh.intersect(&prims, &ray).map(|h| (h.t, h.primitive));
                assert_eq!(actual, expected, "ray {:?}", dir);
            }
        }
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        // Primitives 3 and 8 coincide exactly, so every hit is a tie.
        let mut prims: Vec<Primitive> = (0..12)
            .map(|i| sphere(Vec3::new(i as f32 * 3.0, 0.0, -5.0), 0.5, i))
            .collect();
        prims[8] = sphere(Vec3::new(9.0, 0.0, -5.0), 0.5, 8);
        let bvh = Bvh::build(&prims);

        let ray = Ray::new(Vec3::new(9.0, 0.0, 0.0), Vec3::NEG_Z);
        let hit = bvh.intersect(&prims, &ray).unwrap();
        assert_eq!(hit.primitive, 3);
        assert_eq!(hit.material, MaterialId(3));
    }
}
