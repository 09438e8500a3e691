//! Scene spatial-visibility module
//!
//! Provides the Boundable capability, the dynamic loose octree, and the
//! partitioners that translate scene events into octree operations.

mod bounds;
mod octree;
mod partitioner;

pub use bounds::{Boundable, AABB};
pub use octree::{
    InsertionSink, InsertionStrategy, Octant, Octree, OctreeNode, OctreeNodeKey,
    MIN_NODE_WIDTH,
};
pub use partitioner::{
    ActorId, GeomId, LightId, NullPartitioner, OctreePartitioner, ParticleSystemId,
    Partitioner, RenderableId, StaticChunk, TrackedKey,
};
