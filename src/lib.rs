/*!
# Meridian 3D Engine — spatial-visibility core

Dynamic loose octree and scene partitioners for frustum-culled visibility
queries, driven by the per-frame render pipeline.

## Architecture

- **Boundable**: capability any scene entity implements to be tracked
  (AABB + centre point)
- **Octree**: dynamic loose octree — grows upward toward out-of-bounds
  objects, prunes and collapses as objects leave
- **Partitioner**: translates scene lifecycle events (actor/light/particle
  system added, removed, changed) into octree operations and answers
  "what is visible from this camera" queries
- **Camera / Frustum**: passive containers supplied by the embedding
  engine; the frustum provides the AABB intersection tests

The renderer, scene-graph object model, asset loading and windowing are
external collaborators; this crate is an in-process data structure with
no wire or file format.

Single-threaded by design: all mutations and queries must run on the
frame-loop thread (apply pending writes, then one query pass, per frame).
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod scene;

// Main meridian3d namespace module
pub mod meridian3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade (logging)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are exported at the crate root
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene sub-module (octree + partitioners)
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
