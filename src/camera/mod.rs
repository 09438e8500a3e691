//! Camera module — passive camera container and view frustum.
//!
//! The core does not own or drive cameras; the embedding engine computes
//! view/projection matrices and supplies the frustum used for visibility
//! queries against the octree.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{Frustum, FrustumTest};
