//! Octree spatial partitioning structure
//!
//! A static, "loose bucket" octree over collider bounding boxes. Each node
//! subdivides into 8 octants once it holds more than the configured number of
//! items; an item descends into a child only when the child's bounds contain
//! the item's whole AABB, otherwise it stays in the bucket of the current node.
//! Every item is therefore stored in exactly one node.
//!
//! The tree is filled once after all colliders are known and is read-only for
//! the rest of the session. There is no removal or update; a changed collider
//! set means building a new tree.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::physics::collider::ColliderId;
use crate::spatial::AABB;

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum items per leaf before subdivision
    pub max_items_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_items_per_node: 32,
            max_depth: 10,
            min_node_size: 0.005,
        }
    }
}

/// Collider reference stored in the octree
#[derive(Debug, Clone, Copy)]
pub struct OctreeItem {
    /// Collider id (the octree never sees collider geometry)
    pub id: ColliderId,
    /// Bounds the item was inserted with
    pub bounds: AABB,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: AABB,

    /// Items that do not fit entirely into a single child
    items: Vec<OctreeItem>,

    /// Child nodes (8 octants), None if this is a leaf
    children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Items stored directly in this node
    pub fn items(&self) -> &[OctreeItem] {
        &self.items
    }

    /// Child nodes, if subdivided
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    /// Get the octant index (0-7) for a position within this node's bounds
    fn octant_index(&self, position: Vec3) -> usize {
        let center = self.bounds.center();
        let x_bit = usize::from(position.x >= center.x);
        let y_bit = usize::from(position.y >= center.y);
        let z_bit = usize::from(position.z >= center.z);

        // Octant layout:
        // 0: -X, -Y, -Z   1: +X, -Y, -Z   2: -X, +Y, -Z   3: +X, +Y, -Z
        // 4: -X, -Y, +Z   5: +X, -Y, +Z   6: -X, +Y, +Z   7: +X, +Y, +Z
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    /// Index of the child that fully contains `bounds`, if any
    fn child_for(&self, bounds: &AABB) -> Option<usize> {
        let children = self.children.as_ref()?;
        let octant = self.octant_index(bounds.center());
        children[octant].bounds.contains(bounds).then_some(octant)
    }

    fn can_subdivide(&self, config: &OctreeConfig) -> bool {
        let size = self.bounds.extents() * 2.0;
        self.depth < config.max_depth
            && size.x.min(size.y).min(size.z) > config.min_node_size
    }

    /// Subdivide this node into 8 children and push down every item that fits
    fn subdivide(&mut self, config: &OctreeConfig) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        self.children = Some(Box::new(std::array::from_fn(|octant| {
            let x_sign = if octant & 1 != 0 { 1.0 } else { -1.0 };
            let y_sign = if octant & 2 != 0 { 1.0 } else { -1.0 };
            let z_sign = if octant & 4 != 0 { 1.0 } else { -1.0 };

            let child_center = Vec3::new(
                center.x + quarter_extents.x * x_sign,
                center.y + quarter_extents.y * y_sign,
                center.z + quarter_extents.z * z_sign,
            );
            OctreeNode::new(AABB::from_center_extents(child_center, quarter_extents), depth)
        })));

        let to_distribute = std::mem::take(&mut self.items);
        for item in to_distribute {
            match self.child_for(&item.bounds) {
                Some(octant) => {
                    if let Some(children) = self.children.as_mut() {
                        children[octant].insert(item, config);
                    }
                }
                None => self.items.push(item),
            }
        }
    }

    /// Insert an item into this node or the child that contains it
    fn insert(&mut self, item: OctreeItem, config: &OctreeConfig) {
        if let Some(octant) = self.child_for(&item.bounds) {
            if let Some(children) = self.children.as_mut() {
                children[octant].insert(item, config);
                return;
            }
        }

        self.items.push(item);

        if self.is_leaf() && self.items.len() > config.max_items_per_node && self.can_subdivide(config) {
            self.subdivide(config);
        }
    }

    /// Collect every item whose bounds intersect `region`
    fn query(&self, region: &AABB, results: &mut Vec<ColliderId>) {
        results.extend(
            self.items
                .iter()
                .filter(|item| item.bounds.intersects(region))
                .map(|item| item.id),
        );

        // Items below a child are contained in the child's bounds, so a child
        // that misses the region cannot hold a match.
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(region) {
                    child.query(region, results);
                }
            }
        }
    }

    /// Visit this node and all descendants, depth first
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a OctreeNode)) {
        f(self);
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.visit(f);
            }
        }
    }
}

/// Octree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node containing the entire playfield
    root: OctreeNode,

    /// Configuration
    config: OctreeConfig,

    /// Number of inserted items
    item_count: usize,
}

impl Octree {
    /// Create an empty octree with given bounds
    pub fn new(bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(bounds, 0),
            config,
            item_count: 0,
        }
    }

    /// Build an octree from all items at once
    pub fn build(
        bounds: AABB,
        config: OctreeConfig,
        items: impl IntoIterator<Item = (ColliderId, AABB)>,
    ) -> Self {
        let mut octree = Self::new(bounds, config);
        for (id, aabb) in items {
            octree.insert(id, aabb);
        }
        octree
    }

    /// Insert an item. Only meant to be used while building the tree.
    ///
    /// Items outside the root bounds are kept in the root bucket so they are
    /// still found by queries.
    pub fn insert(&mut self, id: ColliderId, bounds: AABB) {
        if !self.root.bounds.contains(&bounds) {
            log::debug!("Collider {id} lies (partly) outside the octree bounds, keeping it at the root");
        }
        self.root.insert(OctreeItem { id, bounds }, &self.config);
        self.item_count += 1;
    }

    /// All collider ids whose bounds intersect `region`, in no particular order
    pub fn query(&self, region: &AABB) -> Vec<ColliderId> {
        let mut results = Vec::new();
        self.query_into(region, &mut results);
        results
    }

    /// Like [`Octree::query`] but appends to an existing buffer
    pub fn query_into(&self, region: &AABB, results: &mut Vec<ColliderId>) {
        self.root.query(region, results);
    }

    /// Root node (for inspection)
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Bounds of the root node
    pub fn bounds(&self) -> AABB {
        self.root.bounds
    }

    /// Get total item count
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |_| count += 1);
        count
    }

    /// Deepest level that holds a node
    pub fn depth(&self) -> u32 {
        let mut depth = 0;
        self.root.visit(&mut |node| depth = depth.max(node.depth));
        depth
    }
}
