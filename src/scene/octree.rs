/// Dynamic loose octree — spatial index for frustum-culled visibility.
///
/// The tree is **dynamic**: it has no fixed world bounds. Inserting an
/// object outside the root grows the tree upward (a new root of double
/// width is created on the side the object protrudes toward) until the
/// root encompasses it, and removing objects prunes empty nodes and
/// collapses unnecessary root shells. A scene drifting through space
/// therefore drags the tree along with it.
///
/// The tree is **loose**: each node carries a loose bounding box of twice
/// its strict width (same centre). Containment tests use the loose bounds,
/// so an object straddling a strict boundary does not thrash between
/// siblings when it moves slightly.
///
/// Placement policy (single-node): an object lives in exactly one node —
/// the deepest node whose candidate child (by centre octant) would no
/// longer fully contain it in loose bounds. Straddling objects stay at the
/// parent, never split or duplicated, so query results need no dedup pass.
///
/// Nodes live in a slotmap arena; parent/child links are stable keys, not
/// pointers. A reverse index maps each tracked object to its owning node,
/// making removal and relocation O(1) in locating the node.
///
/// Single-threaded by design: the embedding engine must not interleave
/// mutation and traversal from different threads (frame-staging
/// discipline). The tree itself performs no locking.

use glam::Vec3;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, SlotMap};

use crate::camera::{Frustum, FrustumTest};
use crate::error::{Error, Result};
use super::bounds::AABB;

/// Nodes are never subdivided below this strict width.
///
/// Without a floor, a point-sized object would descend forever (it fits
/// every child's loose bounds).
pub const MIN_NODE_WIDTH: f32 = 1.0;

new_key_type! {
    /// Stable key for a node in the octree arena.
    ///
    /// Remains valid until that node is pruned; a stale key degrades to a
    /// lookup failure, never a dangling reference.
    pub struct OctreeNodeKey;
}

// ===== OCTANT =====

/// One of the 8 subdivisions of a node's volume, identified by the sign
/// of each axis relative to the node centre.
///
/// Bit layout: bit0 = X, bit1 = Y, bit2 = Z; a set bit is the positive
/// side of the centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Octant(u8);

impl Octant {
    /// Number of octants per node.
    pub const COUNT: usize = 8;

    /// Iterate all 8 octants.
    pub fn all() -> impl Iterator<Item = Octant> {
        (0..Self::COUNT as u8).map(Octant)
    }

    /// Build an octant from the sign of each axis (`true` = positive side).
    pub fn from_signs(pos_x: bool, pos_y: bool, pos_z: bool) -> Self {
        Octant((pos_x as u8) | ((pos_y as u8) << 1) | ((pos_z as u8) << 2))
    }

    /// The octant of `point` relative to `centre`.
    ///
    /// Points exactly on a boundary plane go to the positive side.
    pub fn containing(centre: Vec3, point: Vec3) -> Self {
        Self::from_signs(point.x >= centre.x, point.y >= centre.y, point.z >= centre.z)
    }

    /// Index in a node's child array (0–7).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The octant mirrored through the centre on all three axes.
    pub fn opposite(self) -> Octant {
        Octant(self.0 ^ 0b111)
    }

    /// Unit-step direction of this octant (±1 per axis).
    fn direction(self) -> Vec3 {
        Vec3::new(
            if self.0 & 1 != 0 { 1.0 } else { -1.0 },
            if self.0 & 2 != 0 { 1.0 } else { -1.0 },
            if self.0 & 4 != 0 { 1.0 } else { -1.0 },
        )
    }
}

// ===== OCTREE NODE =====

/// A single cell of space in the octree.
///
/// Holds strict bounds (the canonical, non-overlapping region), loose
/// bounds (strict expanded 2×, used for containment tests), links to
/// parent and up to 8 lazily-created children, and the set of objects
/// resident at this level.
pub struct OctreeNode<K: Key> {
    /// World-space centre, fixed at creation
    centre: Vec3,
    /// Canonical region; siblings never overlap in strict bounds
    strict_bounds: AABB,
    /// Strict bounds expanded to twice the width, same centre
    loose_bounds: AABB,
    /// Back-reference; None for the root
    parent: Option<OctreeNodeKey>,
    /// Children by octant index; absence is the common (sparse) state
    children: [Option<OctreeNodeKey>; Octant::COUNT],
    /// Objects resident at this node (fit here, but straddle all children)
    objects: Vec<K>,
    /// Custom-sink placements pinning this node against pruning
    sink_deposits: u32,
}

impl<K: Key> OctreeNode<K> {
    /// Create a node from its centre and strict width.
    ///
    /// Rejects non-positive widths (`InvalidConfiguration`).
    fn new(parent: Option<OctreeNodeKey>, strict_width: f32, centre: Vec3) -> Result<Self> {
        if !(strict_width > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "octree node strict width must be positive, got {}",
                strict_width
            )));
        }

        Ok(Self {
            centre,
            strict_bounds: AABB::cube(centre, strict_width),
            loose_bounds: AABB::cube(centre, strict_width * 2.0),
            parent,
            children: [None; Octant::COUNT],
            objects: Vec::new(),
            sink_deposits: 0,
        })
    }

    /// World-space centre of the node.
    pub fn centre(&self) -> Vec3 {
        self.centre
    }

    /// Strict width (edge length of the strict bounds).
    pub fn width(&self) -> f32 {
        self.strict_bounds.max.x - self.strict_bounds.min.x
    }

    /// Diameter of the strict bounds. Any dimension will do — nodes are cubes.
    pub fn strict_diameter(&self) -> f32 {
        self.width()
    }

    /// Diameter of the loose bounds (2× the strict diameter).
    pub fn loose_diameter(&self) -> f32 {
        self.loose_bounds.max.x - self.loose_bounds.min.x
    }

    /// Canonical, non-overlapping bounds.
    pub fn strict_bounds(&self) -> &AABB {
        &self.strict_bounds
    }

    /// Expanded bounds used for containment and visibility tests.
    pub fn loose_bounds(&self) -> &AABB {
        &self.loose_bounds
    }

    /// `true` for the root node.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// `true` if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.child_count() == 0
    }

    /// Parent key, None for the root.
    pub fn parent(&self) -> Option<OctreeNodeKey> {
        self.parent
    }

    /// Number of materialized children (0–8).
    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    /// Existence check for a child at the given octant.
    pub fn has_child(&self, octant: Octant) -> bool {
        self.children[octant.index()].is_some()
    }

    /// Key of the child at the given octant, if it exists.
    pub fn child_key(&self, octant: Octant) -> Option<OctreeNodeKey> {
        self.children[octant.index()]
    }

    /// Objects resident at this node.
    pub fn objects(&self) -> &[K] {
        &self.objects
    }

    /// Number of objects resident at this node.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// `true` if any object is resident at this node.
    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    /// A node with no residents, no children and no sink deposits is
    /// eligible for pruning.
    fn is_prunable(&self) -> bool {
        self.objects.is_empty() && self.is_leaf() && self.sink_deposits == 0
    }
}

// ===== INSERTION STRATEGY =====

/// Receiver for custom-sink insertions.
///
/// The octree finds the destination node exactly as for a resident
/// insertion, then hands the object to the sink instead of storing it.
/// Used by the partitioner to batch static geometry into per-node chunks.
pub trait InsertionSink<K> {
    /// Accept an object routed to `node`.
    fn deposit(&mut self, object: K, node: OctreeNodeKey);
}

/// How `grow_with` places an object once its destination node is found.
pub enum InsertionStrategy<'a, K> {
    /// Store in the node's resident set and register in the reverse index
    /// (the default — what `grow` does).
    Resident,
    /// Hand to a custom sink. The object is not registered in the reverse
    /// index; the destination node is pinned against pruning until the
    /// deposit is released via `release_sink_deposit`.
    CustomSink(&'a mut dyn InsertionSink<K>),
}

// ===== OCTREE =====

/// A dynamic, loose octree tracking objects of key type `K`.
///
/// `K` is any slotmap key identifying objects owned by the caller (the
/// partitioner tracks scene entities this way). The tree stores keys and
/// AABB snapshots only — never references into the scene layer — so a
/// destroyed entity degrades to `NotFound`, not a dangling pointer. It is
/// still the caller's contract to `shrink` an object before dropping it.
pub struct Octree<K: Key> {
    /// Node arena; parent/child links index into this
    nodes: SlotMap<OctreeNodeKey, OctreeNode<K>>,
    /// Root node; None until the first insertion
    root: Option<OctreeNodeKey>,
    /// Incremental node count — diagnostics only, never correctness
    node_count: u32,
    /// Reverse index: object → (owning node, AABB snapshot).
    /// Exactly one entry per resident object, and vice versa.
    object_locations: FxHashMap<K, (OctreeNodeKey, AABB)>,
}

impl<K: Key> Default for Octree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Octree<K> {
    /// Create an empty tree. No nodes exist until the first `grow`.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            node_count: 0,
            object_locations: FxHashMap::default(),
        }
    }

    // ===== ACCESSORS =====

    /// `true` once any object has been inserted.
    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    /// The root node, or `UninitializedTree` before the first insertion.
    pub fn root(&self) -> Result<&OctreeNode<K>> {
        let key = self.root.ok_or(Error::UninitializedTree)?;
        self.nodes
            .get(key)
            .ok_or_else(|| Error::StructuralViolation("root key points at a destroyed node".to_string()))
    }

    /// Key of the root node, or `UninitializedTree`.
    pub fn root_key(&self) -> Result<OctreeNodeKey> {
        self.root.ok_or(Error::UninitializedTree)
    }

    /// Look up a node by key. None if the node has been pruned.
    pub fn node(&self, key: OctreeNodeKey) -> Option<&OctreeNode<K>> {
        self.nodes.get(key)
    }

    /// Direct child access.
    ///
    /// Requesting a child that does not exist is a programmer error
    /// (`StructuralViolation`), not a recoverable state — check
    /// `has_child` first when absence is expected.
    pub fn child_of(&self, parent: OctreeNodeKey, octant: Octant) -> Result<&OctreeNode<K>> {
        let parent_node = self.nodes.get(parent).ok_or_else(|| {
            Error::StructuralViolation("parent key points at a destroyed node".to_string())
        })?;
        let child_key = parent_node.child_key(octant).ok_or_else(|| {
            Error::StructuralViolation("attempted to access a child node that does not exist".to_string())
        })?;
        self.nodes
            .get(child_key)
            .ok_or_else(|| Error::StructuralViolation("child key points at a destroyed node".to_string()))
    }

    /// Current number of live nodes. Diagnostic only.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Number of tracked (resident) objects.
    pub fn object_count(&self) -> usize {
        self.object_locations.len()
    }

    /// Iterate all live nodes. Diagnostic/debug use (dump the arena).
    pub fn nodes(&self) -> impl Iterator<Item = (OctreeNodeKey, &OctreeNode<K>)> {
        self.nodes.iter()
    }

    /// O(1) lookup of the node owning a tracked object.
    pub fn find(&self, object: K) -> Result<OctreeNodeKey> {
        self.object_locations
            .get(&object)
            .map(|(node, _)| *node)
            .ok_or(Error::NotFound)
    }

    // ===== GROW =====

    /// Insert a new object, growing the tree as needed.
    ///
    /// Creates the root (centred on the object) on first use; grows the
    /// tree upward while the object lies outside the root's strict bounds;
    /// then descends to the deepest node that still loosely contains the
    /// object. Returns the key of the node the object was placed in.
    ///
    /// Growing an already-tracked object is rejected (`AlreadyTracked`);
    /// use `relocate` for objects whose bounds changed.
    pub fn grow(&mut self, object: K, bounds: &AABB) -> Result<OctreeNodeKey> {
        self.grow_with(object, bounds, InsertionStrategy::Resident)
    }

    /// Insert with an explicit placement strategy.
    ///
    /// See `InsertionStrategy`. The destination node is determined the
    /// same way for both variants.
    pub fn grow_with(
        &mut self,
        object: K,
        bounds: &AABB,
        strategy: InsertionStrategy<'_, K>,
    ) -> Result<OctreeNodeKey> {
        if !bounds.is_valid() {
            return Err(Error::InvalidConfiguration(
                "object bounds must satisfy min <= max".to_string(),
            ));
        }
        if matches!(strategy, InsertionStrategy::Resident)
            && self.object_locations.contains_key(&object)
        {
            return Err(Error::AlreadyTracked);
        }

        let root_key = self.ensure_root_contains(bounds)?;
        let node_key = self.insert_into_subtree(root_key, bounds)?;

        match strategy {
            InsertionStrategy::Resident => {
                self.nodes[node_key].objects.push(object);
                self.object_locations.insert(object, (node_key, *bounds));
            }
            InsertionStrategy::CustomSink(sink) => {
                self.nodes[node_key].sink_deposits += 1;
                sink.deposit(object, node_key);
            }
        }

        Ok(node_key)
    }

    /// Create the root if absent, then grow upward until the root's strict
    /// bounds contain `bounds`. Returns the (possibly new) root key.
    fn ensure_root_contains(&mut self, bounds: &AABB) -> Result<OctreeNodeKey> {
        let mut root_key = match self.root {
            Some(key) => key,
            None => {
                let width = Self::initial_root_width(bounds);
                let node = OctreeNode::new(None, width, bounds.centre())?;
                let key = self.alloc_node(node);
                self.root = Some(key);
                key
            }
        };

        // Doubling width each step bounds this loop by
        // O(log(distance / width)).
        while !self.nodes[root_key].strict_bounds.contains(bounds) {
            root_key = self.grow_upward(root_key, bounds)?;
        }

        Ok(root_key)
    }

    /// Strict width for a root created around the first object: twice the
    /// object's largest dimension, so the root strictly contains it.
    fn initial_root_width(bounds: &AABB) -> f32 {
        (2.0 * bounds.size().max_element()).max(MIN_NODE_WIDTH)
    }

    /// Grow one level upward: a new root of double width, shifted toward
    /// the object so the old root sits exactly on one of its child centres.
    fn grow_upward(&mut self, old_root: OctreeNodeKey, bounds: &AABB) -> Result<OctreeNodeKey> {
        let (old_centre, old_width) = {
            let node = &self.nodes[old_root];
            (node.centre, node.width())
        };

        // Shift half the old width toward the object on each axis; the old
        // root then occupies the opposite octant of the new root.
        let toward = Octant::containing(old_centre, bounds.centre());
        let new_centre = old_centre + toward.direction() * (old_width * 0.5);

        let new_root = OctreeNode::new(None, old_width * 2.0, new_centre)?;
        let new_key = self.alloc_node(new_root);

        // The old root sits exactly opposite the growth direction; derive
        // the octant from `toward` rather than re-comparing float centres
        let old_octant = toward.opposite();
        self.nodes[new_key].children[old_octant.index()] = Some(old_root);
        self.nodes[old_root].parent = Some(new_key);
        self.root = Some(new_key);

        Ok(new_key)
    }

    /// Descend from `start` to the deepest node whose candidate child (by
    /// centre octant) would still loosely contain the object, creating
    /// children lazily. An object straddling the candidate child's loose
    /// bounds stays at the current level.
    ///
    /// Precondition: `start`'s loose bounds contain `bounds`.
    fn insert_into_subtree(&mut self, start: OctreeNodeKey, bounds: &AABB) -> Result<OctreeNodeKey> {
        let object_centre = bounds.centre();
        let mut current = start;

        loop {
            let (node_centre, node_width) = {
                let node = &self.nodes[current];
                (node.centre, node.width())
            };

            let child_width = node_width * 0.5;
            if child_width < MIN_NODE_WIDTH {
                return Ok(current);
            }

            let octant = Octant::containing(node_centre, object_centre);
            let child_centre = node_centre + octant.direction() * (node_width * 0.25);
            let child_loose = AABB::cube(child_centre, child_width * 2.0);

            if !child_loose.contains(bounds) {
                // Straddles the child boundary — the parent keeps it
                return Ok(current);
            }

            current = match self.nodes[current].children[octant.index()] {
                Some(child) => child,
                None => self.create_child(current, octant)?,
            };
        }
    }

    /// Allocate a child node at the given octant: centre offset a quarter
    /// of the parent's strict width per axis, strict width halved.
    fn create_child(&mut self, parent: OctreeNodeKey, octant: Octant) -> Result<OctreeNodeKey> {
        let (parent_centre, parent_width) = {
            let node = &self.nodes[parent];
            (node.centre, node.width())
        };

        let child_centre = parent_centre + octant.direction() * (parent_width * 0.25);
        let child = OctreeNode::new(Some(parent), parent_width * 0.5, child_centre)?;
        let child_key = self.alloc_node(child);
        self.nodes[parent].children[octant.index()] = Some(child_key);

        Ok(child_key)
    }

    // ===== SHRINK =====

    /// Remove a tracked object, pruning nodes left empty.
    ///
    /// Empty ancestors are deleted up to the first non-empty one; if the
    /// root ends up with no residents and a single child, the child
    /// becomes the new root (repeatedly). Removing the last object returns
    /// the tree to the uninitialized state (no root, zero nodes).
    pub fn shrink(&mut self, object: K) -> Result<()> {
        let (node_key, _) = self.object_locations.remove(&object).ok_or(Error::NotFound)?;

        self.remove_resident(node_key, object)?;
        self.prune_upward(node_key);
        self.collapse_root();

        Ok(())
    }

    /// Remove an object from a node's resident set.
    fn remove_resident(&mut self, node_key: OctreeNodeKey, object: K) -> Result<()> {
        let node = self.nodes.get_mut(node_key).ok_or_else(|| {
            Error::StructuralViolation("object index points at a destroyed node".to_string())
        })?;

        match node.objects.iter().position(|&k| k == object) {
            Some(pos) => {
                node.objects.swap_remove(pos);
                Ok(())
            }
            None => Err(Error::StructuralViolation(
                "object index and resident set disagree".to_string(),
            )),
        }
    }

    /// Delete empty nodes from `start` up the ancestor chain, stopping at
    /// the first non-empty node or at the root.
    fn prune_upward(&mut self, start: OctreeNodeKey) {
        let mut current = start;

        loop {
            let parent_key = match self.nodes.get(current) {
                Some(node) if node.is_prunable() => match node.parent {
                    Some(parent) => parent,
                    None => return, // the root is never pruned here
                },
                _ => return,
            };

            if let Some(parent) = self.nodes.get_mut(parent_key) {
                for slot in parent.children.iter_mut() {
                    if *slot == Some(current) {
                        *slot = None;
                        break;
                    }
                }
            }
            self.free_node(current);

            current = parent_key;
        }
    }

    /// Discard unnecessary root shells: while the root has no residents
    /// and exactly one child, the child becomes the new root. A root left
    /// with nothing at all is deleted entirely.
    fn collapse_root(&mut self) {
        while let Some(root_key) = self.root {
            let root = match self.nodes.get(root_key) {
                Some(node) => node,
                None => return,
            };
            if root.has_objects() || root.sink_deposits != 0 {
                return;
            }

            match root.child_count() {
                0 => {
                    self.free_node(root_key);
                    self.root = None;
                    return;
                }
                1 => {
                    let child_key = match root.children.iter().copied().flatten().next() {
                        Some(child) => child,
                        None => return,
                    };
                    self.free_node(root_key);
                    self.nodes[child_key].parent = None;
                    self.root = Some(child_key);
                    // Loop: the promoted child may itself qualify
                }
                _ => return,
            }
        }
    }

    // ===== RELOCATE =====

    /// Move a tracked object to match its new bounds.
    ///
    /// Fast path: if the object still belongs to its current node (fits
    /// the loose bounds and no child would take it), only the stored AABB
    /// is updated — no structural change. Otherwise the object is removed
    /// and re-inserted from the nearest ancestor whose strict bounds
    /// contain the new AABB, escalating to upward tree growth only when
    /// not even the root contains it. Moving a small distance is cheap;
    /// moving across the map costs proportional to the distance.
    pub fn relocate(&mut self, object: K, bounds: &AABB) -> Result<()> {
        if !bounds.is_valid() {
            return Err(Error::InvalidConfiguration(
                "object bounds must satisfy min <= max".to_string(),
            ));
        }

        let (node_key, _) = *self.object_locations.get(&object).ok_or(Error::NotFound)?;

        if self.placement_unchanged(node_key, bounds) {
            if let Some(entry) = self.object_locations.get_mut(&object) {
                entry.1 = *bounds;
            }
            return Ok(());
        }

        // Ancestor-first search: nearest ancestor strictly containing the
        // new bounds is the re-insertion point.
        let mut search = Some(node_key);
        let mut reinsert_from = None;
        while let Some(key) = search {
            let node = &self.nodes[key];
            if node.strict_bounds.contains(bounds) {
                reinsert_from = Some(key);
                break;
            }
            search = node.parent;
        }

        self.remove_resident(node_key, object)?;

        let destination = match reinsert_from {
            Some(start) => self.insert_into_subtree(start, bounds)?,
            None => {
                // Not even the root contains it: grow upward as needed
                let root_key = self.ensure_root_contains(bounds)?;
                self.insert_into_subtree(root_key, bounds)?
            }
        };

        self.nodes[destination].objects.push(object);
        self.object_locations.insert(object, (destination, *bounds));

        // Prune the vacated chain only after re-insertion, so ancestors
        // shared with the destination are seen as non-empty.
        self.prune_upward(node_key);
        self.collapse_root();

        Ok(())
    }

    /// `true` if `bounds` still belongs exactly at `node_key`: inside the
    /// node's loose bounds, and the candidate child would not contain it.
    fn placement_unchanged(&self, node_key: OctreeNodeKey, bounds: &AABB) -> bool {
        let node = match self.nodes.get(node_key) {
            Some(node) => node,
            None => return false,
        };

        if !node.loose_bounds.contains(bounds) {
            return false;
        }

        let child_width = node.width() * 0.5;
        if child_width < MIN_NODE_WIDTH {
            return true;
        }

        let octant = Octant::containing(node.centre, bounds.centre());
        let child_centre = node.centre + octant.direction() * (node.width() * 0.25);
        let child_loose = AABB::cube(child_centre, child_width * 2.0);

        !child_loose.contains(bounds)
    }

    // ===== SINK DEPOSITS =====

    /// Release one custom-sink deposit from a node, pruning it if that
    /// left the node empty.
    ///
    /// Callers that inserted through `InsertionStrategy::CustomSink` must
    /// release each deposit when the sink-held data is removed.
    pub fn release_sink_deposit(&mut self, node_key: OctreeNodeKey) -> Result<()> {
        let node = self.nodes.get_mut(node_key).ok_or_else(|| {
            Error::StructuralViolation("sink deposit points at a destroyed node".to_string())
        })?;
        if node.sink_deposits == 0 {
            return Err(Error::StructuralViolation(
                "released more sink deposits than were made".to_string(),
            ));
        }
        node.sink_deposits -= 1;

        self.prune_upward(node_key);
        self.collapse_root();

        Ok(())
    }

    // ===== VISIBILITY =====

    /// Collect the keys of every node whose **loose** bounds intersect the
    /// frustum, depth-first. Sibling order is unspecified.
    ///
    /// Loose bounds are always >= strict bounds, so this is conservative:
    /// it never misses a visible node, and the occasional false positive
    /// is culled downstream. A subtree classified `Outside` is skipped in
    /// O(1); one classified `Inside` is collected without further tests
    /// (a child's loose bounds always lie within its parent's).
    pub fn nodes_visible_from(
        &self,
        frustum: &Frustum,
        results: &mut Vec<OctreeNodeKey>,
    ) -> Result<()> {
        let root_key = self.root.ok_or(Error::UninitializedTree)?;
        let root = self
            .nodes
            .get(root_key)
            .ok_or_else(|| Error::StructuralViolation("root key points at a destroyed node".to_string()))?;

        let classification = frustum.classify_aabb(&root.loose_bounds);
        self.visit_visible(root_key, frustum, classification, results);

        Ok(())
    }

    fn visit_visible(
        &self,
        node_key: OctreeNodeKey,
        frustum: &Frustum,
        classification: FrustumTest,
        results: &mut Vec<OctreeNodeKey>,
    ) {
        match classification {
            FrustumTest::Outside => {}

            FrustumTest::Inside => {
                self.collect_subtree(node_key, results);
            }

            FrustumTest::Partial => {
                results.push(node_key);

                let node = &self.nodes[node_key];
                for child_key in node.children.iter().copied().flatten() {
                    let child = &self.nodes[child_key];
                    let child_class = frustum.classify_aabb(&child.loose_bounds);
                    self.visit_visible(child_key, frustum, child_class, results);
                }
            }
        }
    }

    /// Collect a node and its entire subtree without further frustum tests.
    fn collect_subtree(&self, node_key: OctreeNodeKey, results: &mut Vec<OctreeNodeKey>) {
        results.push(node_key);

        let node = &self.nodes[node_key];
        for child_key in node.children.iter().copied().flatten() {
            self.collect_subtree(child_key, results);
        }
    }

    // ===== NODE BOOKKEEPING =====

    fn alloc_node(&mut self, node: OctreeNode<K>) -> OctreeNodeKey {
        self.node_count += 1;
        self.nodes.insert(node)
    }

    fn free_node(&mut self, key: OctreeNodeKey) {
        if self.nodes.remove(key).is_some() {
            self.node_count -= 1;
        }
    }
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
