//! Mesh template for one particle's visual footprint.
//!
//! The template is replicated once per pool slot by the buffer packer, so a
//! pool of `n` particles draws `n * vertex_count` vertices in one call.

use serde::{Deserialize, Serialize};

use crate::error::{ParticleError, Result};

/// Flat vertex data for a single particle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshTemplate {
    /// Vertex positions, 3 floats per vertex.
    positions: Vec<f32>,
    /// Texture coordinates, 2 floats per vertex.
    uvs: Vec<f32>,
    /// Triangle list indices into this template's vertices.
    indices: Vec<u32>,
}

impl MeshTemplate {
    /// Build a template, checking that the arrays describe the same vertices.
    pub fn new(positions: Vec<f32>, uvs: Vec<f32>, indices: Vec<u32>) -> Result<Self> {
        let mesh = Self { positions, uvs, indices };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check array lengths and index ranges.
    ///
    /// Deserialized templates skip [`MeshTemplate::new`], so configuration
    /// validation calls this again.
    pub fn validate(&self) -> Result<()> {
        if self.positions.is_empty() || self.positions.len() % 3 != 0 {
            return Err(ParticleError::invalid(format!(
                "mesh positions must be a non-empty multiple of 3 floats, got {}",
                self.positions.len()
            )));
        }
        let vertex_count = self.vertex_count();
        if self.uvs.len() != vertex_count * 2 {
            return Err(ParticleError::invalid(format!(
                "mesh has {vertex_count} vertices but {} uv floats",
                self.uvs.len()
            )));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ParticleError::invalid(format!(
                "mesh index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(())
    }

    /// Axis-aligned quad in the XY plane centered on the origin.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                -hw, -hh, 0.0, //
                -hw, hh, 0.0, //
                hw, hh, 0.0, //
                hw, -hh, 0.0,
            ],
            uvs: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            indices: vec![0, 3, 1, 1, 3, 2],
        }
    }

    /// Number of vertices per particle.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of indices per particle.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl Default for MeshTemplate {
    fn default() -> Self {
        Self::quad(1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_quad() {
        let quad = MeshTemplate::default();
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.index_count(), 6);
        assert_eq!(quad.uvs().len(), 8);
        assert!(quad.positions().iter().all(|v| v.abs() <= 0.5));
    }

    #[test]
    fn test_new_validates_lengths() {
        assert!(MeshTemplate::new(vec![0.0; 9], vec![0.0; 6], vec![0, 1, 2]).is_ok());
        assert!(MeshTemplate::new(vec![0.0; 8], vec![0.0; 6], vec![0, 1, 2]).is_err());
        assert!(MeshTemplate::new(vec![0.0; 9], vec![0.0; 4], vec![0, 1, 2]).is_err());
        assert!(MeshTemplate::new(vec![0.0; 9], vec![0.0; 6], vec![0, 1, 3]).is_err());
        assert!(MeshTemplate::new(Vec::new(), Vec::new(), Vec::new()).is_err());
    }
}
