/// Scene partitioners — bridge scene lifecycle events to the spatial
/// index and answer per-frame visibility queries.
///
/// The embedding engine calls the event methods synchronously when an
/// entity is added, removed or changed, and asks `geometry_visible_from`
/// / `lights_visible_from` once per frame. Event handlers absorb
/// non-fatal races (a change event arriving after removal) with a warning
/// so the frame loop stays resilient; structural errors still propagate.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_warn};
use super::bounds::Boundable;
use super::octree::{InsertionSink, InsertionStrategy, Octree, OctreeNodeKey};

const SOURCE: &str = "meridian3d::OctreePartitioner";

// ===== SCENE-LAYER IDS =====

/// Id of an actor in the scene layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(pub u32);

/// Id of a light in the scene layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub u32);

/// Id of a particle system in the scene layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleSystemId(pub u32);

/// Id of a static geometry batch in the scene layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeomId(pub u32);

/// Handle to a renderable (actor sub-mesh, particle system batch, static
/// geometry piece) as known to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableId(pub u64);

new_key_type! {
    /// Key for an entity tracked by a partitioner.
    pub struct TrackedKey;
}

/// What a tracked octree entry resolves to at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisibilityTarget {
    Geometry(RenderableId),
    Light(LightId),
}

// ===== PARTITIONER TRAIT =====

/// Strategy for spatially partitioning a stage's entities.
///
/// Event methods are driven by the scene layer; query methods are driven
/// by the render pipeline once per frame. Query results are unordered,
/// with one entry per tracked registration — callers must not rely on any
/// traversal order, and must keep `RenderableId`s unique across entities
/// if they need set semantics (an id registered under two entities, or as
/// both a resident and a static piece, is reported once per registration).
pub trait Partitioner {
    /// Track an actor's boundable sub-meshes.
    fn add_actor(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()>;

    /// Stop tracking an actor and all of its sub-meshes.
    fn remove_actor(&mut self, actor: ActorId) -> Result<()>;

    /// The actor's geometry was replaced (mesh swapped): re-register it.
    fn actor_changed(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()>;

    /// The actor moved (bounds-only change): relocate its sub-meshes.
    fn actor_moved(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()>;

    /// Track a light.
    fn add_light(&mut self, light: LightId, boundable: &dyn Boundable) -> Result<()>;

    /// Stop tracking a light.
    fn remove_light(&mut self, light: LightId) -> Result<()>;

    /// The light moved: relocate it.
    fn light_moved(&mut self, light: LightId, boundable: &dyn Boundable) -> Result<()>;

    /// Track a particle system as a single renderable.
    fn add_particle_system(
        &mut self,
        system: ParticleSystemId,
        renderable: RenderableId,
        boundable: &dyn Boundable,
    ) -> Result<()>;

    /// Stop tracking a particle system.
    fn remove_particle_system(&mut self, system: ParticleSystemId) -> Result<()>;

    /// Track a static geometry batch, chunking its pieces spatially.
    fn add_static_geometry(&mut self, geom: GeomId, pieces: &[(RenderableId, &dyn Boundable)]) -> Result<()>;

    /// Remove a static geometry batch and its chunks.
    fn remove_static_geometry(&mut self, geom: GeomId) -> Result<()>;

    /// All renderables potentially visible from the camera.
    /// Unordered, one entry per tracked registration; empty before
    /// anything is tracked.
    fn geometry_visible_from(&self, camera: &Camera) -> Vec<RenderableId>;

    /// All lights potentially visible from the camera.
    fn lights_visible_from(&self, camera: &Camera) -> Vec<LightId>;
}

// ===== STATIC CHUNKS =====

/// A batch of static geometry pieces resident at one octree node.
///
/// Pieces deposited through the custom insertion sink are grouped per
/// node so the renderer can draw a whole region in one go.
#[derive(Debug, Default)]
pub struct StaticChunk {
    pieces: Vec<RenderableId>,
}

impl StaticChunk {
    /// Renderable pieces in this chunk.
    pub fn pieces(&self) -> &[RenderableId] {
        &self.pieces
    }
}

/// Per-node storage for static chunks, keyed by source geometry batch.
#[derive(Debug, Default)]
struct StaticChunkHolder {
    chunks: FxHashMap<GeomId, StaticChunk>,
}

/// Insertion sink that records where each static piece landed.
struct ChunkSink {
    deposits: Vec<(TrackedKey, OctreeNodeKey)>,
}

impl InsertionSink<TrackedKey> for ChunkSink {
    fn deposit(&mut self, object: TrackedKey, node: OctreeNodeKey) {
        self.deposits.push((object, node));
    }
}

// ===== OCTREE PARTITIONER =====

/// Partitioner backed by the dynamic loose octree.
///
/// Tracks one octree entry per boundable (actor sub-mesh, light, particle
/// system), and batches static geometry into per-node chunks through the
/// custom insertion sink.
pub struct OctreePartitioner {
    tree: Octree<TrackedKey>,
    /// Identity of every tracked entry
    tracked: SlotMap<TrackedKey, VisibilityTarget>,
    /// Actor → tracked sub-mesh entries, in registration order
    actor_objects: FxHashMap<ActorId, Vec<(RenderableId, TrackedKey)>>,
    light_objects: FxHashMap<LightId, TrackedKey>,
    particle_objects: FxHashMap<ParticleSystemId, TrackedKey>,
    /// Static chunks grouped by the octree node they are resident at
    static_chunks: FxHashMap<OctreeNodeKey, StaticChunkHolder>,
    /// Per-geom deposits, kept for removal
    geom_deposits: FxHashMap<GeomId, Vec<(TrackedKey, OctreeNodeKey)>>,
}

impl Default for OctreePartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl OctreePartitioner {
    /// Create an empty partitioner. The tree grows with the first entity.
    pub fn new() -> Self {
        Self {
            tree: Octree::new(),
            tracked: SlotMap::with_key(),
            actor_objects: FxHashMap::default(),
            light_objects: FxHashMap::default(),
            particle_objects: FxHashMap::default(),
            static_chunks: FxHashMap::default(),
            geom_deposits: FxHashMap::default(),
        }
    }

    /// Number of live octree nodes. Diagnostic/telemetry only.
    pub fn node_count(&self) -> u32 {
        self.tree.node_count()
    }

    /// Number of tracked entries (sub-meshes, lights, particle systems,
    /// static pieces).
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Collect the visible node set, treating an uninitialized tree as
    /// simply empty.
    fn visible_nodes(&self, camera: &Camera) -> Vec<OctreeNodeKey> {
        let mut nodes = Vec::new();
        match self.tree.nodes_visible_from(camera.frustum(), &mut nodes) {
            Ok(()) => {}
            Err(Error::UninitializedTree) => {}
            Err(err) => {
                engine_warn!(SOURCE, "Visibility query failed: {}", err);
                nodes.clear();
            }
        }
        nodes
    }

    /// Track one boundable as a geometry entry.
    fn track_geometry(&mut self, renderable: RenderableId, boundable: &dyn Boundable) -> Result<TrackedKey> {
        let key = self.tracked.insert(VisibilityTarget::Geometry(renderable));
        if let Err(err) = self.tree.grow(key, &boundable.absolute_bounds()) {
            self.tracked.remove(key);
            return Err(err);
        }
        Ok(key)
    }

    /// Untrack one entry, shrinking the tree.
    fn untrack(&mut self, key: TrackedKey) -> Result<()> {
        self.tree.shrink(key)?;
        self.tracked.remove(key);
        Ok(())
    }
}

impl Partitioner for OctreePartitioner {
    fn add_actor(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        engine_debug!(SOURCE, "Adding actor {:?} to the partitioner", actor);

        if self.actor_objects.contains_key(&actor) {
            return Err(Error::AlreadyTracked);
        }

        let mut entries = Vec::with_capacity(sub_meshes.len());
        for &(renderable, boundable) in sub_meshes {
            match self.track_geometry(renderable, boundable) {
                Ok(key) => entries.push((renderable, key)),
                Err(err) => {
                    // Roll back the sub-meshes grown so far; a failed add
                    // must leave nothing tracked under an unregistered actor
                    for (_, key) in entries {
                        if let Err(rollback_err) = self.untrack(key) {
                            engine_warn!(
                                SOURCE,
                                "Rollback of partially added actor {:?} failed: {}",
                                actor,
                                rollback_err
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        self.actor_objects.insert(actor, entries);

        Ok(())
    }

    fn remove_actor(&mut self, actor: ActorId) -> Result<()> {
        engine_debug!(SOURCE, "Removing actor {:?} from the partitioner", actor);

        let entries = self.actor_objects.remove(&actor).ok_or(Error::NotFound)?;
        for (_, key) in entries {
            self.untrack(key)?;
        }

        Ok(())
    }

    fn actor_changed(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        engine_debug!(SOURCE, "Actor {:?} changed, updating partitioner", actor);

        match self.remove_actor(actor) {
            Ok(()) => {}
            Err(Error::NotFound) => {
                // Change event raced the removal; treat as a fresh add
                engine_warn!(SOURCE, "Change event for untracked actor {:?}; re-adding", actor);
            }
            Err(err) => return Err(err),
        }

        self.add_actor(actor, sub_meshes)
    }

    fn actor_moved(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        let entries = self.actor_objects.get(&actor).ok_or(Error::NotFound)?.clone();

        for &(renderable, boundable) in sub_meshes {
            match entries.iter().find(|(r, _)| *r == renderable) {
                Some(&(_, key)) => {
                    self.tree.relocate(key, &boundable.absolute_bounds())?;
                }
                None => {
                    engine_warn!(
                        SOURCE,
                        "Move event for unknown renderable {:?} on actor {:?}; ignoring",
                        renderable,
                        actor
                    );
                }
            }
        }

        Ok(())
    }

    fn add_light(&mut self, light: LightId, boundable: &dyn Boundable) -> Result<()> {
        engine_debug!(SOURCE, "Adding light {:?} to the partitioner", light);

        if self.light_objects.contains_key(&light) {
            return Err(Error::AlreadyTracked);
        }

        let key = self.tracked.insert(VisibilityTarget::Light(light));
        if let Err(err) = self.tree.grow(key, &boundable.absolute_bounds()) {
            self.tracked.remove(key);
            return Err(err);
        }
        self.light_objects.insert(light, key);

        Ok(())
    }

    fn remove_light(&mut self, light: LightId) -> Result<()> {
        engine_debug!(SOURCE, "Removing light {:?} from the partitioner", light);

        let key = self.light_objects.remove(&light).ok_or(Error::NotFound)?;
        self.untrack(key)
    }

    fn light_moved(&mut self, light: LightId, boundable: &dyn Boundable) -> Result<()> {
        let key = *self.light_objects.get(&light).ok_or(Error::NotFound)?;
        self.tree.relocate(key, &boundable.absolute_bounds())
    }

    fn add_particle_system(
        &mut self,
        system: ParticleSystemId,
        renderable: RenderableId,
        boundable: &dyn Boundable,
    ) -> Result<()> {
        engine_debug!(SOURCE, "Adding particle system {:?} to the partitioner", system);

        if self.particle_objects.contains_key(&system) {
            return Err(Error::AlreadyTracked);
        }

        let key = self.track_geometry(renderable, boundable)?;
        self.particle_objects.insert(system, key);

        Ok(())
    }

    fn remove_particle_system(&mut self, system: ParticleSystemId) -> Result<()> {
        engine_debug!(SOURCE, "Removing particle system {:?} from the partitioner", system);

        let key = self.particle_objects.remove(&system).ok_or(Error::NotFound)?;
        self.untrack(key)
    }

    fn add_static_geometry(&mut self, geom: GeomId, pieces: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        engine_debug!(SOURCE, "Adding static geometry {:?} ({} pieces)", geom, pieces.len());

        if self.geom_deposits.contains_key(&geom) {
            return Err(Error::AlreadyTracked);
        }

        let mut sink = ChunkSink {
            deposits: Vec::with_capacity(pieces.len()),
        };
        for &(renderable, boundable) in pieces {
            let key = self.tracked.insert(VisibilityTarget::Geometry(renderable));
            if let Err(err) = self.tree.grow_with(
                key,
                &boundable.absolute_bounds(),
                InsertionStrategy::CustomSink(&mut sink),
            ) {
                // Roll back the deposits made so far, or their nodes stay
                // pinned forever with no geom registered to release them
                self.tracked.remove(key);
                for (key, node) in sink.deposits {
                    self.tracked.remove(key);
                    if let Err(rollback_err) = self.tree.release_sink_deposit(node) {
                        engine_warn!(
                            SOURCE,
                            "Rollback of partially added geometry {:?} failed: {}",
                            geom,
                            rollback_err
                        );
                    }
                }
                return Err(err);
            }
        }

        // Group the deposits into per-node chunks
        for &(key, node) in &sink.deposits {
            let renderable = match self.tracked.get(key) {
                Some(VisibilityTarget::Geometry(renderable)) => *renderable,
                _ => continue,
            };
            let holder = self.static_chunks.entry(node).or_default();
            holder.chunks.entry(geom).or_default().pieces.push(renderable);
        }
        self.geom_deposits.insert(geom, sink.deposits);

        Ok(())
    }

    fn remove_static_geometry(&mut self, geom: GeomId) -> Result<()> {
        engine_debug!(SOURCE, "Removing static geometry {:?}", geom);

        let deposits = self.geom_deposits.remove(&geom).ok_or(Error::NotFound)?;
        for (key, node) in deposits {
            self.tracked.remove(key);

            let now_empty = match self.static_chunks.get_mut(&node) {
                Some(holder) => {
                    holder.chunks.remove(&geom);
                    holder.chunks.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.static_chunks.remove(&node);
            }

            self.tree.release_sink_deposit(node)?;
        }

        Ok(())
    }

    fn geometry_visible_from(&self, camera: &Camera) -> Vec<RenderableId> {
        let mut results = Vec::new();

        for node_key in self.visible_nodes(camera) {
            if let Some(node) = self.tree.node(node_key) {
                for &key in node.objects() {
                    if let Some(VisibilityTarget::Geometry(renderable)) = self.tracked.get(key) {
                        results.push(*renderable);
                    }
                }
            }

            if let Some(holder) = self.static_chunks.get(&node_key) {
                for chunk in holder.chunks.values() {
                    results.extend_from_slice(&chunk.pieces);
                }
            }
        }

        results
    }

    fn lights_visible_from(&self, camera: &Camera) -> Vec<LightId> {
        let mut results = Vec::new();

        for node_key in self.visible_nodes(camera) {
            if let Some(node) = self.tree.node(node_key) {
                for &key in node.objects() {
                    if let Some(VisibilityTarget::Light(light)) = self.tracked.get(key) {
                        results.push(*light);
                    }
                }
            }
        }

        results
    }
}

// ===== NULL PARTITIONER =====

/// Partitioner that performs no spatial partitioning at all.
///
/// Every query returns everything that is tracked. A baseline for
/// comparison and a sane fallback for very small stages where octree
/// maintenance costs more than it saves.
#[derive(Default)]
pub struct NullPartitioner {
    actor_objects: FxHashMap<ActorId, Vec<RenderableId>>,
    light_objects: FxHashSet<LightId>,
    particle_objects: FxHashMap<ParticleSystemId, RenderableId>,
    geom_objects: FxHashMap<GeomId, Vec<RenderableId>>,
}

impl NullPartitioner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioner for NullPartitioner {
    fn add_actor(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        if self.actor_objects.contains_key(&actor) {
            return Err(Error::AlreadyTracked);
        }
        let renderables = sub_meshes.iter().map(|&(renderable, _)| renderable).collect();
        self.actor_objects.insert(actor, renderables);
        Ok(())
    }

    fn remove_actor(&mut self, actor: ActorId) -> Result<()> {
        self.actor_objects.remove(&actor).map(|_| ()).ok_or(Error::NotFound)
    }

    fn actor_changed(&mut self, actor: ActorId, sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        self.actor_objects.remove(&actor);
        self.add_actor(actor, sub_meshes)
    }

    fn actor_moved(&mut self, actor: ActorId, _sub_meshes: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        // No spatial structure to maintain
        if self.actor_objects.contains_key(&actor) {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    fn add_light(&mut self, light: LightId, _boundable: &dyn Boundable) -> Result<()> {
        if !self.light_objects.insert(light) {
            return Err(Error::AlreadyTracked);
        }
        Ok(())
    }

    fn remove_light(&mut self, light: LightId) -> Result<()> {
        if self.light_objects.remove(&light) {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    fn light_moved(&mut self, light: LightId, _boundable: &dyn Boundable) -> Result<()> {
        if self.light_objects.contains(&light) {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    fn add_particle_system(
        &mut self,
        system: ParticleSystemId,
        renderable: RenderableId,
        _boundable: &dyn Boundable,
    ) -> Result<()> {
        if self.particle_objects.contains_key(&system) {
            return Err(Error::AlreadyTracked);
        }
        self.particle_objects.insert(system, renderable);
        Ok(())
    }

    fn remove_particle_system(&mut self, system: ParticleSystemId) -> Result<()> {
        self.particle_objects.remove(&system).map(|_| ()).ok_or(Error::NotFound)
    }

    fn add_static_geometry(&mut self, geom: GeomId, pieces: &[(RenderableId, &dyn Boundable)]) -> Result<()> {
        if self.geom_objects.contains_key(&geom) {
            return Err(Error::AlreadyTracked);
        }
        let renderables = pieces.iter().map(|&(renderable, _)| renderable).collect();
        self.geom_objects.insert(geom, renderables);
        Ok(())
    }

    fn remove_static_geometry(&mut self, geom: GeomId) -> Result<()> {
        self.geom_objects.remove(&geom).map(|_| ()).ok_or(Error::NotFound)
    }

    fn geometry_visible_from(&self, _camera: &Camera) -> Vec<RenderableId> {
        let mut results = Vec::new();
        for renderables in self.actor_objects.values() {
            results.extend_from_slice(renderables);
        }
        results.extend(self.particle_objects.values().copied());
        for renderables in self.geom_objects.values() {
            results.extend_from_slice(renderables);
        }
        results
    }

    fn lights_visible_from(&self, _camera: &Camera) -> Vec<LightId> {
        self.light_objects.iter().copied().collect()
    }
}

#[cfg(test)]
#[path = "partitioner_tests.rs"]
mod tests;
