/// Camera — passive data container.
///
/// The camera computes nothing. The embedding engine is responsible for
/// computing and setting the view matrix, projection matrix, and frustum;
/// the partitioner only reads the frustum for visibility queries.

use glam::Mat4;
use super::frustum::Frustum;

/// Low-level camera holding view/projection matrices and the derived frustum.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
}

impl Camera {
    /// Create a camera from explicit matrices and frustum.
    pub fn new(view: Mat4, projection: Mat4, frustum: Frustum) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            frustum,
        }
    }

    /// Create a camera from view/projection matrices, deriving the frustum.
    pub fn from_matrices(view: Mat4, projection: Mat4) -> Self {
        let frustum = Frustum::from_view_projection(&(projection * view));
        Self::new(view, projection, frustum)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    // ===== SETTERS — store, compute nothing =====

    /// Set the view matrix. Does not recompute the frustum.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    /// Set the projection matrix. Does not recompute the frustum.
    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    /// Set the frustum.
    pub fn set_frustum(&mut self, frustum: Frustum) {
        self.frustum = frustum;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
